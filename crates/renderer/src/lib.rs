//! Renderer: wgpu init + depth + interleaved model buffer + texture/light
//! bind groups. wgpu = 26.x, winit = 0.30.x

use std::num::NonZeroU64;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::{
    util::DeviceExt,
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    CommandEncoderDescriptor, DepthBiasState, DepthStencilState, Device, DeviceDescriptor,
    Extent3d, Features, FragmentState, Instance, InstanceDescriptor, Limits, LoadOp, Operations,
    Origin3d, PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, RenderPipelineDescriptor, RenderPipeline,
    SamplerDescriptor, ShaderModuleDescriptor, ShaderSource, ShaderStages, StoreOp, Surface,
    SurfaceConfiguration, SurfaceError, TexelCopyBufferLayout, TexelCopyTextureInfo,
    TextureAspect, TextureDescriptor, TextureDimension, TextureFormat, TextureSampleType,
    TextureUsages, TextureView, TextureViewDescriptor, TextureViewDimension, VertexAttribute,
    VertexBufferLayout, VertexFormat, VertexState, VertexStepMode,
};

use winit::{dpi::PhysicalSize, window::Window};

use asset::model::{ModelData, VertexLayout};
use asset::texture::TextureData;
use corelib::camera::Camera;
use corelib::lighting::{Light, LightRig, PhongMaterial};

/// How the fragment stage shades the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadingMode {
    /// Texture modulated by the packed per-vertex color; no lights.
    FlatColor,
    /// Phong point lights against the packed per-vertex normal.
    Lit,
}

/// Everything the GPU needs for one demo scene, assembled on the CPU side.
pub struct SceneDesc {
    pub model: ModelData,
    pub texture: TextureData,
    pub shading: ShadingMode,
}

/// Per-frame UBO (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SceneUniform {
    model: [[f32; 4]; 4],
    view_proj: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    view_pos: [f32; 4],
}

/// One point light, laid out to match the WGSL `Light` struct (32 bytes).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct LightUniform {
    position: [f32; 3],
    intensity: f32,
    color: [f32; 3],
    enabled: f32,
}

impl LightUniform {
    fn from_light(light: &Light) -> Self {
        Self {
            position: light.position.to_array(),
            intensity: light.intensity,
            color: light.color.to_array(),
            enabled: if light.enabled { 1.0 } else { 0.0 },
        }
    }
}

/// Rig + material UBO for the lit pipeline (112 bytes).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct LightsUniform {
    lights: [LightUniform; 3],
    ambient: f32,
    diffuse: f32,
    specular: f32,
    shininess: f32,
}

impl LightsUniform {
    fn new(rig: &LightRig, material: &PhongMaterial) -> Self {
        Self {
            lights: [
                LightUniform::from_light(&rig.key),
                LightUniform::from_light(&rig.fill),
                LightUniform::from_light(&rig.back),
            ],
            ambient: material.ambient,
            diffuse: material.diffuse,
            specular: material.specular,
            shininess: material.shininess,
        }
    }
}

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    #[allow(dead_code)]
    surface_format: TextureFormat,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Pipeline & geometry
    pipeline: RenderPipeline,
    vertex_buf: Buffer,
    vertex_count: u32,
    clear_color: wgpu::Color,

    // Bind groups
    scene_bg: BindGroup,
    scene_buf: Buffer,
    texture_bg: BindGroup,
    /// Present only in [`ShadingMode::Lit`].
    lights: Option<(Buffer, BindGroup)>,

    // Camera
    camera: Camera,

    // Depth
    depth_view: TextureView,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an Arc<Window> and upload the scene.
    pub async fn new(
        window: Arc<Window>,
        desc: SceneDesc,
        backends: wgpu::Backends,
        camera: Camera,
    ) -> Self {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance
            .create_surface(window.clone())
            .expect("create_surface failed");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("No suitable GPU adapter");

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Veles3D Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .expect("request_device failed");

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);

        // Configure surface
        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        // Depth texture
        let depth_view = create_depth_view(&device, &surface_config);

        // ==== Shaders ====
        let shader_src: &str = match desc.shading {
            ShadingMode::FlatColor => include_str!("shaders/flat.wgsl"),
            ShadingMode::Lit => include_str!("shaders/lit.wgsl"),
        };
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Scene WGSL"),
            source: ShaderSource::Wgsl(shader_src.into()),
        });

        // ==== Scene BGL/BG ====
        let scene_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Scene BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(
                        NonZeroU64::new(std::mem::size_of::<SceneUniform>() as u64).unwrap(),
                    ),
                },
                count: None,
            }],
        });

        // Identity matrices until the first render() writes real ones.
        let scene_init = SceneUniform {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            normal_matrix: Mat4::IDENTITY.to_cols_array_2d(),
            view_pos: [camera.eye.x, camera.eye.y, camera.eye.z, 1.0],
        };
        let scene_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene UBO"),
            contents: bytemuck::bytes_of(&scene_init),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let scene_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene BG"),
            layout: &scene_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buf.as_entire_binding(),
            }],
        });

        // ==== Diffuse texture BGL/BG ====
        let (texture_bgl, texture_bg) =
            upload_diffuse_texture(&device, &queue, &desc.texture);

        // ==== Lights BGL/BG (lit mode only) ====
        let lights_bgl;
        let lights = match desc.shading {
            ShadingMode::FlatColor => {
                lights_bgl = None;
                None
            }
            ShadingMode::Lit => {
                let bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
                    label: Some("Lights BGL"),
                    entries: &[BindGroupLayoutEntry {
                        binding: 0,
                        visibility: ShaderStages::FRAGMENT,
                        ty: BindingType::Buffer {
                            ty: BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: Some(
                                NonZeroU64::new(std::mem::size_of::<LightsUniform>() as u64)
                                    .unwrap(),
                            ),
                        },
                        count: None,
                    }],
                });
                let buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Lights UBO"),
                    contents: bytemuck::bytes_of(&LightsUniform::zeroed()),
                    usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                });
                let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Lights BG"),
                    layout: &bgl,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buf.as_entire_binding(),
                    }],
                });
                lights_bgl = Some(bgl);
                Some((buf, bg))
            }
        };

        // ==== Pipeline ====
        let mut bind_group_layouts: Vec<&BindGroupLayout> = vec![&scene_bgl, &texture_bgl];
        if let Some(bgl) = lights_bgl.as_ref() {
            bind_group_layouts.push(bgl);
        }
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Scene PipelineLayout"),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let attributes = vertex_attributes(&desc.model.layout);
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[VertexBufferLayout {
                    array_stride: desc.model.layout.stride_bytes() as u64,
                    step_mode: VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                // Model files carry no winding guarantee; draw both sides.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // ==== Geometry: interleaved, non-indexed ====
        let vertex_count = desc.model.vertex_count() as u32;
        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model VB"),
            contents: bytemuck::cast_slice(&desc.model.buffer),
            usage: BufferUsages::VERTEX,
        });
        log::info!(
            "Uploaded {} vertices ({} floats per vertex), shading {:?}",
            vertex_count,
            desc.model.layout.stride,
            desc.shading
        );

        let clear_color = match desc.shading {
            ShadingMode::FlatColor => wgpu::Color {
                r: 0.10,
                g: 0.10,
                b: 0.10,
                a: 1.0,
            },
            ShadingMode::Lit => wgpu::Color {
                r: 0.08,
                g: 0.08,
                b: 0.08,
                a: 1.0,
            },
        };

        Self {
            surface,
            surface_format,
            surface_config,
            device,
            queue,
            pipeline,
            vertex_buf,
            vertex_count,
            clear_color,
            scene_bg,
            scene_buf,
            texture_bg,
            lights,
            camera,
            depth_view,
            width,
            height,
        }
    }

    /// Resize: reconfigure surface & recreate depth view.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }

    /// Render one frame with the given model matrix. `rig` is ignored by the
    /// flat pipeline; the lit pipeline reads it every frame so toggles show
    /// up immediately.
    pub fn render(
        &mut self,
        model_matrix: Mat4,
        rig: Option<&LightRig>,
        material: &PhongMaterial,
    ) -> Result<(), SurfaceError> {
        // --- update uniforms
        let aspect = self.width as f32 / self.height as f32;
        let camera = self.camera.with_aspect(aspect);
        let scene = SceneUniform {
            model: model_matrix.to_cols_array_2d(),
            view_proj: camera.proj_view().to_cols_array_2d(),
            normal_matrix: model_matrix.inverse().transpose().to_cols_array_2d(),
            view_pos: [camera.eye.x, camera.eye.y, camera.eye.z, 1.0],
        };
        self.queue
            .write_buffer(&self.scene_buf, 0, bytemuck::bytes_of(&scene));

        if let (Some(rig), Some((lights_buf, _))) = (rig, self.lights.as_ref()) {
            let uniform = LightsUniform::new(rig, material);
            self.queue
                .write_buffer(lights_buf, 0, bytemuck::bytes_of(&uniform));
        }

        // --- frame & pass
        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None, // required in 26.x
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(self.clear_color),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.scene_bg, &[]);
            rpass.set_bind_group(1, &self.texture_bg, &[]);
            if let Some((_, lights_bg)) = self.lights.as_ref() {
                rpass.set_bind_group(2, lights_bg, &[]);
            }
            rpass.set_vertex_buffer(0, self.vertex_buf.slice(..));
            rpass.draw(0..self.vertex_count, 0..1);
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

/// Upload RGBA8 pixels and build the texture/sampler bind group.
fn upload_diffuse_texture(
    device: &Device,
    queue: &Queue,
    texture: &TextureData,
) -> (BindGroupLayout, BindGroup) {
    let size = Extent3d {
        width: texture.width,
        height: texture.height,
        depth_or_array_layers: 1,
    };
    let gpu_texture = device.create_texture(&TextureDescriptor {
        label: Some("DiffuseTex"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: TextureFormat::Rgba8UnormSrgb,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        TexelCopyTextureInfo {
            texture: &gpu_texture,
            mip_level: 0,
            origin: Origin3d::ZERO,
            aspect: TextureAspect::All,
        },
        &texture.data,
        TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * texture.width),
            rows_per_image: Some(texture.height),
        },
        size,
    );
    let view = gpu_texture.create_view(&TextureViewDescriptor::default());
    let sampler = device.create_sampler(&SamplerDescriptor {
        label: Some("DiffuseSampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    let bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("Diffuse BGL"),
        entries: &[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });
    let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Diffuse BG"),
        layout: &bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    });
    (bgl, bg)
}

/// Map the loader's float-offset layout to shader locations. Position is
/// always location 0 and texcoord location 1; normal and color take 2 and 3
/// when packed.
fn vertex_attributes(layout: &VertexLayout) -> Vec<VertexAttribute> {
    let mut attributes = vec![
        VertexAttribute {
            format: VertexFormat::Float32x3,
            offset: VertexLayout::byte_offset(layout.position_offset) as u64,
            shader_location: 0,
        },
        VertexAttribute {
            format: VertexFormat::Float32x2,
            offset: VertexLayout::byte_offset(layout.texcoord_offset) as u64,
            shader_location: 1,
        },
    ];
    if let Some(offset) = layout.normal_offset {
        attributes.push(VertexAttribute {
            format: VertexFormat::Float32x3,
            offset: VertexLayout::byte_offset(offset) as u64,
            shader_location: 2,
        });
    }
    if let Some(offset) = layout.color_offset {
        attributes.push(VertexAttribute {
            format: VertexFormat::Float32x3,
            offset: VertexLayout::byte_offset(offset) as u64,
            shader_location: 3,
        });
    }
    attributes
}
