//! Seams between the surface manager and whatever hosts it.
//!
//! The manager never talks to a window system or GPU API directly. A host
//! (the winit window in `window`, or a recording fake in tests)
//! supplies surfaces, frame callbacks, and graphics contexts through these
//! traits.

use siteconfig::FallbackStyle;

use crate::types::{FrameHandle, ShaderStage, Size, UniformValue};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphicsError {
    #[error("{stage} shader failed to compile: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("shader program failed to link: {log}")]
    Link { log: String },
    #[error("graphics context lost")]
    ContextLost,
    #[error("draw failed: {0}")]
    Draw(String),
}

/// The environment a surface manager runs inside.
pub trait SurfaceHost {
    type Surface: Surface;

    /// Looks up a drawable surface by identifier.
    fn find_surface(&mut self, id: &str) -> Option<Self::Surface>;
    /// Current size of the visible viewport in physical pixels.
    fn viewport_size(&self) -> Size;
    fn prefers_reduced_motion(&self) -> bool;
    /// Asks for one callback at the next display refresh.
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// A drawable target such as a window or canvas.
pub trait Surface {
    type Context: GraphicsContext;

    fn backing_size(&self) -> Size;
    fn set_backing_size(&mut self, size: Size);
    /// Returns `None` when no graphics context can be created for this surface.
    fn acquire_context(&mut self) -> Option<Self::Context>;
    fn apply_fallback(&mut self, fallback: &FallbackStyle);
}

/// The small slice of a GL-style API the wave renderer needs.
pub trait GraphicsContext {
    type Shader;
    type Program;
    type Location: Copy;

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<Self::Shader, GraphicsError>;
    fn link_program(
        &mut self,
        vertex: Self::Shader,
        fragment: Self::Shader,
    ) -> Result<Self::Program, GraphicsError>;
    fn use_program(&mut self, program: &Self::Program);
    /// Uploads the triangle-strip quad bound to the program's first attribute.
    fn upload_quad(&mut self, program: &Self::Program, vertices: &[f32]);
    fn uniform_location(&self, program: &Self::Program, name: &str) -> Option<Self::Location>;
    fn set_viewport(&mut self, size: Size);
    fn set_uniform(&mut self, location: Self::Location, value: UniformValue);
    fn draw_quad(&mut self) -> Result<(), GraphicsError>;
    fn delete_program(&mut self, program: Self::Program);
}
