//! Entry point for Veles3D.
//! Logging + CLI flags, then hand off to the platform layer.

use anyhow::Result;
use platform::{DemoConfig, DemoKind};
use wgpu;

fn parse_backend_arg() -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all(); // default = auto
    for arg in std::env::args() {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    eprintln!("[warn] Unknown backend '{}', falling back to auto.", other);
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

fn parse_demo_arg() -> DemoKind {
    // Accept: --demo=cube|model, default cube
    for arg in std::env::args() {
        if let Some(val) = arg.strip_prefix("--demo=") {
            return match val.to_ascii_lowercase().as_str() {
                "cube" | "flat" => DemoKind::Cube,
                "model" | "lit" => DemoKind::Model,
                other => {
                    eprintln!("[warn] Unknown demo '{}', falling back to cube.", other);
                    DemoKind::Cube
                }
            };
        }
    }
    DemoKind::Cube
}

fn parse_model_arg() -> String {
    // Accept: --model=path/to/file.obj
    for arg in std::env::args() {
        if let Some(val) = arg.strip_prefix("--model=") {
            if !val.is_empty() {
                return val.to_string();
            }
        }
    }
    "assets/models/cube.obj".to_string()
}

fn parse_show_fps_arg() -> bool {
    // --show-fps[=on|off], default off
    for arg in std::env::args() {
        if arg == "--show-fps" {
            return true;
        }
        if let Some(val) = arg.strip_prefix("--show-fps=") {
            return matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
    }
    false
}

fn parse_size_args() -> (u32, u32) {
    let mut w: Option<u32> = None;
    let mut h: Option<u32> = None;

    for arg in std::env::args() {
        if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                    w = Some(pw);
                    h = Some(ph);
                }
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            if let Ok(pw) = v.parse::<u32>() {
                w = Some(pw);
            }
        } else if let Some(v) = arg.strip_prefix("--height=") {
            if let Ok(ph) = v.parse::<u32>() {
                h = Some(ph);
            }
        }
    }

    let ww = w.unwrap_or(1280).max(1);
    let hh = h.unwrap_or(720).max(1);
    (ww, hh)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let demo = parse_demo_arg();
    let model_path = parse_model_arg();
    let backends = parse_backend_arg();
    let show_fps = parse_show_fps_arg();
    let (width, height) = parse_size_args();
    log::info!(
        "Starting Veles3D. Demo: {:?}, model: {}, backend: {:?}, show_fps={}, window_size={}x{}",
        demo,
        model_path,
        backends,
        show_fps,
        width,
        height
    );

    platform::run_demo(DemoConfig {
        demo,
        model_path,
        width,
        height,
        show_fps,
        backends,
    })?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
