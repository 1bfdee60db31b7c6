//! SDF-based WebGPU render pipeline
//!
//! Renders the entire scene in fragment shader using signed distance fields.
//! The ball sprite is a texture sampled inside the shader.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::sprite::SpriteImage;
use crate::consts::{MAX_BALLS, MAX_PINS, MAX_WALLS};
use crate::settings::SceneSettings;
use crate::sim::{Obstacle, Simulation};

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Globals {
    resolution: [f32; 2],  // offset 0
    pixel_ratio: f32,      // offset 8
    ball_count: u32,       // offset 12
    pin_count: u32,        // offset 16
    wall_count: u32,       // offset 20
    sprite_size: [f32; 2], // offset 24
    sprite_scale: [f32; 2], // offset 32
    has_sprite: u32,       // offset 40
    _pad: u32,             // offset 44
    ball_color: [f32; 4],  // offset 48 (16-byte aligned vec4)
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Shapes {
    balls: [[f32; 4]; MAX_BALLS],
    pins: [[f32; 4]; MAX_PINS],
    pin_colors: [[f32; 4]; MAX_PINS],
    walls: [[f32; 4]; MAX_WALLS],
    wall_colors: [[f32; 4]; MAX_WALLS],
}

/// Build both uniform blocks for one frame
///
/// `sprite` is the pixel size of the loaded sprite, if any.
pub(crate) fn frame_uniforms(
    sim: &Simulation,
    resolution: [f32; 2],
    pixel_ratio: f32,
    sprite: Option<[f32; 2]>,
) -> (Globals, Shapes) {
    let settings: &SceneSettings = sim.settings();
    let mut shapes = Shapes::zeroed();

    let mut ball_count = 0;
    if settings.ball.options.render.is_drawn() {
        for (slot, ball) in shapes.balls.iter_mut().zip(sim.snapshot()) {
            *slot = [ball.pos.x, ball.pos.y, ball.radius, ball.angle];
            ball_count += 1;
        }
    }

    let mut pin_count = 0;
    let mut wall_count = 0;
    for obstacle in sim.obstacles() {
        match *obstacle {
            Obstacle::Pin { center, radius } => {
                let style = &settings.pin.options.render;
                if style.is_drawn() && pin_count < MAX_PINS {
                    shapes.pins[pin_count] = [center.x, center.y, radius, 0.0];
                    shapes.pin_colors[pin_count] = style.fill_rgba();
                    pin_count += 1;
                }
            }
            Obstacle::Wall { center, size } => {
                let style = &settings.wall.options.render;
                if style.is_drawn() && wall_count < MAX_WALLS {
                    shapes.walls[wall_count] = [center.x, center.y, size.x / 2.0, size.y / 2.0];
                    shapes.wall_colors[wall_count] = style.fill_rgba();
                    wall_count += 1;
                }
            }
        }
    }

    let ball_style = &settings.ball.options.render;
    let sprite_scale = ball_style
        .sprite
        .as_ref()
        .map(|s| [s.x_scale, s.y_scale])
        .unwrap_or([1.0, 1.0]);
    let has_sprite = sprite.is_some() && ball_style.sprite.is_some();

    let globals = Globals {
        resolution,
        pixel_ratio,
        ball_count: ball_count as u32,
        pin_count: pin_count as u32,
        wall_count: wall_count as u32,
        sprite_size: sprite.unwrap_or([1.0, 1.0]),
        sprite_scale,
        has_sprite: u32::from(has_sprite),
        _pad: 0,
        ball_color: ball_style.fill_rgba(),
    };

    (globals, shapes)
}

// ============================================================================
// SDF RENDER STATE
// ============================================================================

pub struct SdfRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    // Uniform buffers
    globals_buffer: wgpu::Buffer,
    shapes_buffer: wgpu::Buffer,

    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    bind_group: wgpu::BindGroup,
    /// Pixel size of the loaded sprite
    sprite_size: Option<[f32; 2]>,

    /// Surface size in physical pixels
    pub size: (u32, u32),
    pixel_ratio: f32,
}

impl SdfRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
        pixel_ratio: f32,
    ) -> Self {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sdf-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .expect("Failed to create device");

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);
        log::info!("Surface alpha modes: {:?}", surface_caps.alpha_modes);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        // Page background shows through where nothing is drawn
        let alpha_mode = if surface_caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            surface_caps.alpha_modes[0]
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        log::info!(
            "Surface config: {}x{} @{}x, format: {:?}, alpha: {:?}",
            width,
            height,
            pixel_ratio,
            surface_format,
            alpha_mode
        );
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sdf_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sdf_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let shapes_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("shapes"),
            contents: bytemuck::bytes_of(&Shapes::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf_bind_group_layout"),
            entries: &[
                uniform_entry(0),
                uniform_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let placeholder = upload_sprite(&device, &queue, &SpriteImage::placeholder());
        let bind_group = create_bind_group(
            &device,
            &bind_group_layout,
            &globals_buffer,
            &shapes_buffer,
            &placeholder,
            &sampler,
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sdf_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // No vertex buffers - fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            shapes_buffer,
            bind_group_layout,
            sampler,
            bind_group,
            sprite_size: None,
            size: (width, height),
            pixel_ratio,
        }
    }

    /// Upload the ball sprite and start drawing it
    pub fn set_sprite(&mut self, image: &SpriteImage) {
        let view = upload_sprite(&self.device, &self.queue, image);
        self.bind_group = create_bind_group(
            &self.device,
            &self.bind_group_layout,
            &self.globals_buffer,
            &self.shapes_buffer,
            &view,
            &self.sampler,
        );
        self.sprite_size = Some(image.size());
        log::info!("Sprite uploaded ({}x{})", image.width, image.height);
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32, pixel_ratio: f32) {
        self.pixel_ratio = pixel_ratio;
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Update GPU buffers from the simulation and render
    pub fn render(&mut self, sim: &Simulation) -> Result<(), wgpu::SurfaceError> {
        let resolution = [self.size.0 as f32, self.size.1 as f32];
        let (globals, shapes) = frame_uniforms(sim, resolution, self.pixel_ratio, self.sprite_size);
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
        self.queue
            .write_buffer(&self.shapes_buffer, 0, bytemuck::bytes_of(&shapes));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sdf_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sdf_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn upload_sprite(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &SpriteImage,
) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("sprite"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &image.rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * image.width),
            rows_per_image: Some(image.height),
        },
        size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    globals: &wgpu::Buffer,
    shapes: &wgpu::Buffer,
    sprite: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("sdf_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: globals.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: shapes.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(sprite),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Viewport;

    #[test]
    fn test_uniform_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<Globals>(), 64);
        assert_eq!(std::mem::size_of::<Shapes>(), 576);
    }

    #[test]
    fn test_default_scene_draws_balls_and_pins_only() {
        let sim = Simulation::new(SceneSettings::default(), Viewport::new(800.0, 600.0));
        let (globals, shapes) = frame_uniforms(&sim, [1600.0, 1200.0], 2.0, Some([200.0, 200.0]));

        assert_eq!(globals.ball_count, 2);
        assert_eq!(globals.pin_count, 2);
        // Walls have zero opacity
        assert_eq!(globals.wall_count, 0);
        assert_eq!(globals.has_sprite, 1);
        assert_eq!(globals.sprite_scale, [0.5, 0.5]);

        assert_eq!(shapes.balls[0], [400.0, 150.0, 50.0, 0.0]);
        assert_eq!(shapes.pins[1], [600.0, 300.0, 30.0, 0.0]);
        assert_eq!(shapes.pin_colors[0], [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_missing_sprite_falls_back_to_disk() {
        let sim = Simulation::new(SceneSettings::default(), Viewport::new(800.0, 600.0));
        let (globals, _) = frame_uniforms(&sim, [800.0, 600.0], 1.0, None);
        assert_eq!(globals.has_sprite, 0);
    }
}
