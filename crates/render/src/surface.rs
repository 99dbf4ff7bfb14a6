use crate::camera::Camera;
use crate::composer::Pass;
use crate::scene::Scene;
use glam::Mat4;
use mirrorworld_common::SurfaceSize;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface lost")]
    SurfaceLost,
    #[error("surface out of memory")]
    OutOfMemory,
    #[error("surface has zero size ({0})")]
    ZeroSize(SurfaceSize),
    #[error("post-processing chain must start with a render pass")]
    MissingRenderPass,
    #[error("nothing has been rendered yet")]
    NothingToCapture,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Everything a surface needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub scene: &'a Scene,
    pub camera: &'a Camera,
    pub passes: &'a [Pass],
}

/// Token for a snapshot of a surface's last presented image.
///
/// The pixels stay with the surface; the token only says which frame was
/// captured and at what size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCapture {
    pub size: SurfaceSize,
    pub frame_index: u64,
}

/// A drawable target owned by one view.
///
/// Surfaces read the frame they are given and never mutate scene or camera.
pub trait RenderSurface {
    fn size(&self) -> SurfaceSize;

    /// Resize the drawing buffer. Takes effect on the next `render`.
    fn set_size(&mut self, size: SurfaceSize);

    fn render(&mut self, frame: &Frame<'_>) -> Result<(), RenderError>;

    /// Snapshot the last presented image.
    fn capture(&mut self) -> Result<FrameCapture, RenderError>;

    /// Cover the live output with a previously captured image.
    fn show_overlay(&mut self, capture: FrameCapture);

    fn hide_overlay(&mut self);

    fn overlay_visible(&self) -> bool;
}

/// What a `HeadlessSurface` was last asked to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub node_count: usize,
    pub view_projection: Mat4,
    pub passes: Vec<Pass>,
    pub size: SurfaceSize,
    pub overlay_visible: bool,
}

/// In-memory surface that records calls instead of drawing pixels.
#[derive(Debug)]
pub struct HeadlessSurface {
    size: SurfaceSize,
    frames: u64,
    resizes: u32,
    last: Option<FrameRecord>,
    overlay: Option<FrameCapture>,
}

impl HeadlessSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            frames: 0,
            resizes: 0,
            last: None,
            overlay: None,
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn resize_count(&self) -> u32 {
        self.resizes
    }

    pub fn last_frame(&self) -> Option<&FrameRecord> {
        self.last.as_ref()
    }

    pub fn overlay(&self) -> Option<FrameCapture> {
        self.overlay
    }
}

impl RenderSurface for HeadlessSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn set_size(&mut self, size: SurfaceSize) {
        if size != self.size {
            self.resizes += 1;
        }
        self.size = size;
    }

    fn render(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        if self.size.is_degenerate() {
            return Err(RenderError::ZeroSize(self.size));
        }
        self.frames += 1;
        self.last = Some(FrameRecord {
            node_count: frame.scene.len(),
            view_projection: frame.camera.view_projection(),
            passes: frame.passes.to_vec(),
            size: self.size,
            overlay_visible: self.overlay.is_some(),
        });
        Ok(())
    }

    fn capture(&mut self) -> Result<FrameCapture, RenderError> {
        let Some(last) = &self.last else {
            return Err(RenderError::NothingToCapture);
        };
        Ok(FrameCapture {
            size: last.size,
            frame_index: self.frames,
        })
    }

    fn show_overlay(&mut self, capture: FrameCapture) {
        self.overlay = Some(capture);
    }

    fn hide_overlay(&mut self) {
        self.overlay = None;
    }

    fn overlay_visible(&self) -> bool {
        self.overlay.is_some()
    }
}
