//! Platform layer: windowing, keyboard mapping, and the demo event loop.
//!
//! Design goals:
//! - Held keys apply one transform step per frame, independent of key repeat.
//! - Light toggles fire once per press, never on repeat.
//! - Proper handling of resize/surface-loss/close.
//! - Clear log messages to help future debugging.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

use asset::model::LoadOptions;
use asset::obj;
use asset::texture;
use corelib::camera::Camera;
use corelib::controls::{ModelController, TransformCommand};
use corelib::lighting::{LightRig, LightRole, PhongMaterial};
use corelib::{vec3, Vec3};
use renderer::{GpuState, SceneDesc, ShadingMode};

/// Which demo scene to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemoKind {
    /// Textured model with keyboard transform controls, flat coloring.
    Cube,
    /// Lit model under a three-point rig with per-light toggles.
    Model,
}

/// Everything `run_demo` needs, parsed upstream from the CLI.
#[derive(Clone, Debug)]
pub struct DemoConfig {
    pub demo: DemoKind,
    pub model_path: String,
    pub width: u32,
    pub height: u32,
    pub show_fps: bool,
    pub backends: wgpu::Backends,
}

/// Map a held key to its per-frame transform step.
fn key_command(code: KeyCode) -> Option<TransformCommand> {
    match code {
        KeyCode::KeyW => Some(TransformCommand::MoveForward),
        KeyCode::KeyS => Some(TransformCommand::MoveBack),
        KeyCode::KeyA => Some(TransformCommand::MoveLeft),
        KeyCode::KeyD => Some(TransformCommand::MoveRight),
        KeyCode::KeyI => Some(TransformCommand::MoveUp),
        KeyCode::KeyJ => Some(TransformCommand::MoveDown),
        KeyCode::BracketLeft => Some(TransformCommand::ScaleDown),
        KeyCode::BracketRight => Some(TransformCommand::ScaleUp),
        KeyCode::KeyX => Some(TransformCommand::SpinX),
        KeyCode::KeyY => Some(TransformCommand::SpinY),
        KeyCode::KeyZ => Some(TransformCommand::SpinZ),
        _ => None,
    }
}

/// Digits 1/2/3 address the key/fill/back lights.
fn key_light_role(code: KeyCode) -> Option<LightRole> {
    match code {
        KeyCode::Digit1 => Some(LightRole::Key),
        KeyCode::Digit2 => Some(LightRole::Fill),
        KeyCode::Digit3 => Some(LightRole::Back),
        _ => None,
    }
}

/// Load the scene, open a window, and run the event loop until close.
pub fn run_demo(config: DemoConfig) -> Result<()> {
    let (options, shading, eye, title) = match config.demo {
        DemoKind::Cube => (
            LoadOptions::flat_color(),
            ShadingMode::FlatColor,
            vec3(0.0, 0.0, 8.0),
            "Veles3D - Cube",
        ),
        DemoKind::Model => (
            LoadOptions::lit(),
            ShadingMode::Lit,
            vec3(0.0, 0.0, 3.0),
            "Veles3D - Lit Model",
        ),
    };

    let model = obj::load_obj_from_path(&config.model_path, options)?;
    log::info!(
        "Loaded {} ({} vertices)",
        config.model_path,
        model.vertex_count()
    );
    let texture = texture::load_or_checkerboard(model.texture_path.as_deref());

    let width = config.width.max(1);
    let height = config.height.max(1);
    let camera = Camera::looking_at_origin(eye, width as f32 / height as f32);

    let mut rig = match config.demo {
        DemoKind::Cube => None,
        DemoKind::Model => Some(LightRig::three_point(Vec3::ZERO, 1.0)),
    };
    let material = PhongMaterial::default();
    let mut controller = ModelController::new();

    // Create event loop (new API with Result return).
    let event_loop: EventLoop<()> = EventLoop::new().expect("Failed to create event loop");

    let window = Arc::new(
        WindowBuilder::new()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(width, height))
            .build(&event_loop)
            .expect("Failed to create window"),
    );
    log::info!(
        "Window created: {}x{}",
        window.inner_size().width,
        window.inner_size().height
    );

    let scene = SceneDesc {
        model,
        texture,
        shading,
    };
    let mut gpu = pollster::block_on(GpuState::new(
        window.clone(),
        scene,
        config.backends,
        camera,
    ));

    let mut held: HashSet<KeyCode> = HashSet::new();
    let show_fps = config.show_fps;
    let mut frames = 0u32;
    let mut fps_mark = Instant::now();

    event_loop
        .run(move |event, window_target| {
            window_target.set_control_flow(ControlFlow::Poll);
            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        log::info!("Close requested. Exiting event loop.");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        log::info!("Resized: {}x{}", new_size.width, new_size.height);
                        gpu.resize(new_size.width, new_size.height);
                    }
                    WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                        // The surface follows the Resized event that comes with it.
                        log::info!("Scale factor changed: {:.3}", scale_factor);
                    }
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                physical_key: PhysicalKey::Code(code),
                                state,
                                repeat,
                                ..
                            },
                        ..
                    } => match state {
                        ElementState::Pressed => {
                            if code == KeyCode::Escape {
                                log::info!("Escape pressed. Exiting event loop.");
                                window_target.exit();
                                return;
                            }
                            if !repeat {
                                if let (Some(role), Some(rig)) =
                                    (key_light_role(code), rig.as_mut())
                                {
                                    let enabled = rig.toggle(role);
                                    log::info!(
                                        "{:?} light {}",
                                        role,
                                        if enabled { "on" } else { "off" }
                                    );
                                }
                            }
                            held.insert(code);
                        }
                        ElementState::Released => {
                            held.remove(&code);
                        }
                    },
                    WindowEvent::RedrawRequested => {
                        for code in held.iter() {
                            if let Some(command) = key_command(*code) {
                                controller.apply(command);
                            }
                        }
                        match gpu.render(controller.matrix(), rig.as_ref(), &material) {
                            Ok(()) => {
                                frames += 1;
                                if show_fps && fps_mark.elapsed().as_secs_f32() >= 1.0 {
                                    log::info!("FPS: {}", frames);
                                    frames = 0;
                                    fps_mark = Instant::now();
                                }
                            }
                            Err(err) if GpuState::is_surface_lost(&err) => {
                                log::warn!("Surface lost/outdated. Recreating.");
                                gpu.recreate_surface();
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("Out of GPU memory. Exiting.");
                                window_target.exit();
                            }
                            Err(err) => {
                                log::warn!("Frame skipped: {err:?}");
                            }
                        }
                    }
                    _ => {}
                },
                Event::AboutToWait => {
                    window.request_redraw();
                }
                _ => {}
            }
        })
        .map_err(|e| anyhow::anyhow!("Event loop error: {e:?}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasd_maps_to_xz_moves() {
        assert_eq!(key_command(KeyCode::KeyW), Some(TransformCommand::MoveForward));
        assert_eq!(key_command(KeyCode::KeyS), Some(TransformCommand::MoveBack));
        assert_eq!(key_command(KeyCode::KeyA), Some(TransformCommand::MoveLeft));
        assert_eq!(key_command(KeyCode::KeyD), Some(TransformCommand::MoveRight));
    }

    #[test]
    fn brackets_scale_and_xyz_spin() {
        assert_eq!(
            key_command(KeyCode::BracketLeft),
            Some(TransformCommand::ScaleDown)
        );
        assert_eq!(
            key_command(KeyCode::BracketRight),
            Some(TransformCommand::ScaleUp)
        );
        assert_eq!(key_command(KeyCode::KeyX), Some(TransformCommand::SpinX));
        assert_eq!(key_command(KeyCode::KeyY), Some(TransformCommand::SpinY));
        assert_eq!(key_command(KeyCode::KeyZ), Some(TransformCommand::SpinZ));
        assert_eq!(key_command(KeyCode::KeyQ), None);
    }

    #[test]
    fn digits_address_rig_lights() {
        assert_eq!(key_light_role(KeyCode::Digit1), Some(LightRole::Key));
        assert_eq!(key_light_role(KeyCode::Digit2), Some(LightRole::Fill));
        assert_eq!(key_light_role(KeyCode::Digit3), Some(LightRole::Back));
        assert_eq!(key_light_role(KeyCode::Digit4), None);
    }
}
