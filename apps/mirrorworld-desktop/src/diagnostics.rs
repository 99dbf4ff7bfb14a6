use mirrorworld_render_wgpu::{OverlayPainter, PaintContext};
use mirrorworld_tools::FrameStats;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use winit::event::WindowEvent;
use winit::window::Window;

/// egui panel with frame rate and frame time, drawn over the primary view.
pub struct Diagnostics {
    window: Arc<Window>,
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    stats: Option<Rc<RefCell<FrameStats>>>,
    caption: String,
    visible: bool,
}

impl Diagnostics {
    pub fn new(window: Arc<Window>, device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(device, format, None, 1, false);
        Self {
            window,
            ctx,
            state,
            renderer,
            stats: None,
            caption: String::new(),
            visible: true,
        }
    }

    /// Start showing `stats`, with `caption` underneath.
    pub fn attach(&mut self, stats: Rc<RefCell<FrameStats>>, caption: String) {
        self.stats = Some(stats);
        self.caption = caption;
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        tracing::debug!(visible = self.visible, "diagnostics toggled");
    }

    /// Feed a window event to egui. Returns true when egui consumed it.
    pub fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        self.state.on_window_event(&self.window, event).consumed
    }

    fn paint(&mut self, mut target: PaintContext<'_>) {
        if !self.visible {
            return;
        }
        let Some(stats) = &self.stats else {
            return;
        };
        let summary = stats.borrow().summary();
        let caption = &self.caption;

        let raw_input = self.state.take_egui_input(&self.window);
        let full_output = self.ctx.run(raw_input, |ctx| {
            egui::Window::new("Diagnostics")
                .title_bar(false)
                .resizable(false)
                .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
                .show(ctx, |ui| {
                    ui.label(format!("{:.0} FPS", summary.fps));
                    ui.label(format!(
                        "{:.1} ms  (min {:.1} / max {:.1})",
                        summary.frame_ms, summary.min_ms, summary.max_ms
                    ));
                    ui.small(caption.as_str());
                    ui.small("F1: hide");
                });
        });
        self.state
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [target.size.width, target.size.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer
                .update_texture(target.device, target.queue, *id, image_delta);
        }
        self.renderer.update_buffers(
            target.device,
            target.queue,
            target.encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = target
                .encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("diagnostics_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target.target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

/// Painter handle installed on the surface while the app keeps feeding events.
pub struct SharedDiagnostics(pub Rc<RefCell<Diagnostics>>);

impl OverlayPainter for SharedDiagnostics {
    fn paint(&mut self, ctx: PaintContext<'_>) {
        self.0.borrow_mut().paint(ctx);
    }
}
