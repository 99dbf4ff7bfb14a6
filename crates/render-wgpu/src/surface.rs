use crate::context::GpuContext;
use crate::gpu::{
    self, BlitUniforms, InstanceData, Pipelines, SceneUniforms, ShadowUniforms, CUBE_INDICES,
    DEPTH_FORMAT, MAX_INSTANCES, PLANE_BASE_VERTEX, PLANE_INDICES, TARGET_FORMAT,
};
use mirrorworld_common::SurfaceSize;
use mirrorworld_render::{Frame, FrameCapture, RenderError, RenderSurface, RendererOptions};
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// What an overlay painter draws with, after the frame is composed.
pub struct PaintContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub target: &'a wgpu::TextureView,
    pub size: SurfaceSize,
}

/// Hook for host UI (diagnostics panels) drawn on top of a surface.
pub trait OverlayPainter {
    fn paint(&mut self, ctx: PaintContext<'_>);
}

/// Offscreen targets sized to the surface and pixel granularity.
struct Targets {
    width: u32,
    height: u32,
    granularity: u32,
    live: wgpu::Texture,
    live_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
    depth_view: wgpu::TextureView,
    live_bind_group: wgpu::BindGroup,
}

struct Freeze {
    capture: FrameCapture,
    bind_group: wgpu::BindGroup,
    _texture: wgpu::Texture,
}

/// A window surface rendered with wgpu.
pub struct WgpuSurface {
    ctx: GpuContext,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    options: RendererOptions,
    samples: u32,
    size: SurfaceSize,
    pipelines: Pipelines,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    scene_uniforms: wgpu::Buffer,
    shadow_uniforms: wgpu::Buffer,
    blit_uniforms: wgpu::Buffer,
    shadow_bind_group: wgpu::BindGroup,
    scene_bind_group: wgpu::BindGroup,
    shadow_map: (u32, u32, wgpu::TextureView),
    shadow_sampler: wgpu::Sampler,
    blit_sampler: wgpu::Sampler,
    targets: Targets,
    freeze: Option<Freeze>,
    overlay_shown: bool,
    frames: u64,
    painter: Option<Box<dyn OverlayPainter>>,
}

impl WgpuSurface {
    pub fn new(
        ctx: &GpuContext,
        surface: wgpu::Surface<'static>,
        size: SurfaceSize,
        options: RendererOptions,
    ) -> Result<Self, RenderError> {
        let device = ctx.device.clone();
        let caps = surface.get_capabilities(&ctx.adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| RenderError::Backend("surface reports no formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let samples = if options.antialias { 4 } else { 1 };
        let pipelines = Pipelines::new(&device, format, samples);

        let (vertices, indices) = gpu::geometry_mesh();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("geometry_vertex_buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("geometry_index_buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: (MAX_INSTANCES * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform = |label: &str, len: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: len as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let scene_uniforms = uniform("scene_uniforms", std::mem::size_of::<SceneUniforms>());
        let shadow_uniforms = uniform("shadow_uniforms", std::mem::size_of::<ShadowUniforms>());
        let blit_uniforms = uniform("blit_uniforms", std::mem::size_of::<BlitUniforms>());

        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_bind_group"),
            layout: &pipelines.shadow_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: shadow_uniforms.as_entire_binding(),
            }],
        });

        let shadow_filter = match options.shadow_map.filter {
            mirrorworld_render::ShadowFilter::Basic => wgpu::FilterMode::Nearest,
            _ => wgpu::FilterMode::Linear,
        };
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            mag_filter: shadow_filter,
            min_filter: shadow_filter,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("blit_sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let shadow_map = Self::create_shadow_map(&device, 1, 1);
        let scene_bind_group =
            Self::create_scene_bind_group(&device, &pipelines, &scene_uniforms, &shadow_map.2, &shadow_sampler);
        let targets = Self::create_targets(
            &device,
            &pipelines,
            &blit_uniforms,
            &blit_sampler,
            size,
            1,
            samples,
        );

        tracing::debug!(%size, ?format, samples, "wgpu surface created");

        Ok(Self {
            ctx: ctx.clone(),
            surface,
            config,
            options,
            samples,
            size,
            pipelines,
            vertex_buffer,
            index_buffer,
            instance_buffer,
            scene_uniforms,
            shadow_uniforms,
            blit_uniforms,
            shadow_bind_group,
            scene_bind_group,
            shadow_map,
            shadow_sampler,
            blit_sampler,
            targets,
            freeze: None,
            overlay_shown: false,
            frames: 0,
            painter: None,
        })
    }

    /// Install a painter invoked after every composed frame.
    pub fn set_overlay_painter(&mut self, painter: Box<dyn OverlayPainter>) {
        self.painter = Some(painter);
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn device(&self) -> Arc<wgpu::Device> {
        self.ctx.device.clone()
    }

    fn create_shadow_map(device: &wgpu::Device, width: u32, height: u32) -> (u32, u32, wgpu::TextureView) {
        let texture = gpu::create_texture(
            device,
            "shadow_map",
            width,
            height,
            DEPTH_FORMAT,
            1,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        (width, height, texture.create_view(&Default::default()))
    }

    fn create_scene_bind_group(
        device: &wgpu::Device,
        pipelines: &Pipelines,
        uniforms: &wgpu::Buffer,
        shadow_view: &wgpu::TextureView,
        shadow_sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &pipelines.scene_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(shadow_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(shadow_sampler),
                },
            ],
        })
    }

    fn create_blit_bind_group(
        device: &wgpu::Device,
        pipelines: &Pipelines,
        uniforms: &wgpu::Buffer,
        source: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blit_bind_group"),
            layout: &pipelines.blit_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn create_targets(
        device: &wgpu::Device,
        pipelines: &Pipelines,
        blit_uniforms: &wgpu::Buffer,
        blit_sampler: &wgpu::Sampler,
        size: SurfaceSize,
        granularity: u32,
        samples: u32,
    ) -> Targets {
        let width = (size.width / granularity).max(1);
        let height = (size.height / granularity).max(1);
        let live = gpu::create_texture(
            device,
            "live_target",
            width,
            height,
            TARGET_FORMAT,
            1,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        );
        let live_view = live.create_view(&Default::default());
        let msaa_view = (samples > 1).then(|| {
            gpu::create_texture(
                device,
                "msaa_target",
                width,
                height,
                TARGET_FORMAT,
                samples,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            )
            .create_view(&Default::default())
        });
        let depth_view = gpu::create_texture(
            device,
            "depth_target",
            width,
            height,
            DEPTH_FORMAT,
            samples,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        )
        .create_view(&Default::default());
        let live_bind_group =
            Self::create_blit_bind_group(device, pipelines, blit_uniforms, &live_view, blit_sampler);

        Targets {
            width,
            height,
            granularity,
            live,
            live_view,
            msaa_view,
            depth_view,
            live_bind_group,
        }
    }

    fn ensure_targets(&mut self, granularity: u32) {
        let width = (self.size.width / granularity).max(1);
        let height = (self.size.height / granularity).max(1);
        let t = &self.targets;
        if t.granularity == granularity && t.width == width && t.height == height {
            return;
        }
        let device = self.device();
        self.targets = Self::create_targets(
            &device,
            &self.pipelines,
            &self.blit_uniforms,
            &self.blit_sampler,
            self.size,
            granularity,
            self.samples,
        );
    }

    fn ensure_shadow_map(&mut self, width: u32, height: u32) {
        if self.shadow_map.0 == width && self.shadow_map.1 == height {
            return;
        }
        let device = self.device();
        self.shadow_map = Self::create_shadow_map(&device, width, height);
        self.scene_bind_group = Self::create_scene_bind_group(
            &device,
            &self.pipelines,
            &self.scene_uniforms,
            &self.shadow_map.2,
            &self.shadow_sampler,
        );
    }

    fn acquire(&mut self) -> Result<wgpu::SurfaceTexture, RenderError> {
        match self.surface.get_current_texture() {
            Ok(t) => Ok(t),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.ctx.device, &self.config);
                Err(RenderError::SurfaceLost)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(RenderError::OutOfMemory),
            Err(e) => Err(RenderError::Backend(e.to_string())),
        }
    }
}

impl RenderSurface for WgpuSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn set_size(&mut self, size: SurfaceSize) {
        self.size = size;
        if size.is_degenerate() {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.ctx.device, &self.config);
        self.ensure_targets(self.targets.granularity);
    }

    fn render(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        if self.size.is_degenerate() {
            return Err(RenderError::ZeroSize(self.size));
        }
        self.ensure_targets(gpu::pixel_granularity(frame.passes));

        let shadow = gpu::light_view_proj(frame.scene).filter(|_| self.options.shadow_map.enabled);
        if let Some((_, w, h)) = shadow {
            self.ensure_shadow_map(w, h);
        }

        let instances = gpu::collect_instances(frame.scene);
        let queue = self.ctx.queue.clone();
        queue.write_buffer(
            &self.scene_uniforms,
            0,
            bytemuck::bytes_of(&gpu::scene_uniforms(frame.scene, frame.camera, self.options.shadow_map)),
        );
        queue.write_buffer(
            &self.blit_uniforms,
            0,
            bytemuck::bytes_of(&gpu::blit_uniforms(gpu::bloom_settings(frame.passes))),
        );
        if !instances.data.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances.data));
        }

        let output = self.acquire()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let device = self.device();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });

        if let Some((light, _, _)) = shadow {
            queue.write_buffer(
                &self.shadow_uniforms,
                0,
                bytemuck::bytes_of(&ShadowUniforms {
                    light_view_proj: light.to_cols_array_2d(),
                }),
            );
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow_pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.2,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            if instances.casters > 0 {
                pass.set_pipeline(&self.pipelines.shadow);
                pass.set_bind_group(0, &self.shadow_bind_group, &[]);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(CUBE_INDICES, 0, 0..instances.casters);
            }
        }

        {
            let (color_view, resolve_target) = match &self.targets.msaa_view {
                Some(msaa) => (msaa, Some(&self.targets.live_view)),
                None => (&self.targets.live_view, None),
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(gpu::clear_color(frame)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            if !instances.data.is_empty() {
                pass.set_pipeline(&self.pipelines.scene);
                pass.set_bind_group(0, &self.scene_bind_group, &[]);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                if instances.boxes > 0 {
                    pass.draw_indexed(CUBE_INDICES, 0, 0..instances.boxes);
                }
                if instances.planes > 0 {
                    let first = instances.boxes;
                    pass.draw_indexed(PLANE_INDICES, PLANE_BASE_VERTEX, first..first + instances.planes);
                }
            }
        }

        {
            let source = match (&self.freeze, self.overlay_shown) {
                (Some(freeze), true) => &freeze.bind_group,
                _ => &self.targets.live_bind_group,
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("blit_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(gpu::clear_color(frame)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
            pass.set_pipeline(&self.pipelines.blit);
            pass.set_bind_group(0, source, &[]);
            pass.draw(0..3, 0..1);
        }

        if let Some(painter) = &mut self.painter {
            painter.paint(PaintContext {
                device: &device,
                queue: &queue,
                encoder: &mut encoder,
                target: &view,
                size: self.size,
            });
        }

        queue.submit(std::iter::once(encoder.finish()));
        output.present();
        self.frames += 1;
        Ok(())
    }

    fn capture(&mut self) -> Result<FrameCapture, RenderError> {
        if self.frames == 0 {
            return Err(RenderError::NothingToCapture);
        }
        let device = self.device();
        let (width, height) = (self.targets.width, self.targets.height);
        let texture = gpu::create_texture(
            &device,
            "freeze_frame",
            width,
            height,
            TARGET_FORMAT,
            1,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("capture_encoder"),
        });
        encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.targets.live,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.ctx.queue.submit(std::iter::once(encoder.finish()));

        let view = texture.create_view(&Default::default());
        let bind_group = Self::create_blit_bind_group(
            &device,
            &self.pipelines,
            &self.blit_uniforms,
            &view,
            &self.blit_sampler,
        );
        let capture = FrameCapture {
            size: self.size,
            frame_index: self.frames,
        };
        tracing::debug!(frame = self.frames, size = %self.size, "frame captured");
        self.freeze = Some(Freeze {
            capture,
            bind_group,
            _texture: texture,
        });
        Ok(capture)
    }

    fn show_overlay(&mut self, capture: FrameCapture) {
        match &self.freeze {
            Some(freeze) if freeze.capture == capture => self.overlay_shown = true,
            _ => tracing::warn!(frame = capture.frame_index, "overlay requested for unknown capture"),
        }
    }

    fn hide_overlay(&mut self) {
        self.overlay_shown = false;
        self.freeze = None;
    }

    fn overlay_visible(&self) -> bool {
        self.overlay_shown && self.freeze.is_some()
    }
}
