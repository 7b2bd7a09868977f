//! Animated wave background for the Tidewave site shell.
//!
//! The crate splits into a portable lifecycle core and a native host:
//!
//! ```text
//!   WaveConfig ──▶ SurfaceManager ──▶ SurfaceHost / Surface / GraphicsContext
//!                      ▲                          │
//!      SurfaceEvent ───┘                          ├─▶ WindowHost (winit + wgpu)
//!      on_frame(handle, elapsed)                  └─▶ recording fakes in tests
//! ```
//!
//! [`SurfaceManager`] decides when to compile, draw, pause, recover, or fall
//! back to a static gradient. It never touches a window system directly; the
//! winit host in `window` feeds it environment signals and frame callbacks
//! and supplies a wgpu-backed context. The fragment shader is WebGL 1 GLSL,
//! translated on the fly so naga can compile it for wgpu.

mod backend;
mod gpu;
mod pointer;
mod session;
mod shader;
mod types;
mod window;

#[cfg(test)]
mod testing;

pub use backend::{GraphicsContext, GraphicsError, Surface, SurfaceHost};
pub use siteconfig::{ColorStop, FallbackParseError, FallbackStyle, DEFAULT_FALLBACK_GRADIENT};
pub use pointer::{PointerSmoother, POINTER_SMOOTHING};
pub use session::SurfaceManager;
pub use shader::{QUAD_VERTICES, WAVE_FRAGMENT_SHADER, WAVE_VERTEX_SHADER};
pub use types::{
    FrameHandle, Point, ShaderStage, Size, SurfaceEvent, SurfaceState, Uniform, UniformValue,
    WaveConfig,
};
pub use window::{run_window, WindowOptions, WINDOW_SURFACE_ID};
