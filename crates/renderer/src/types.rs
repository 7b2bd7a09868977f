use siteconfig::FallbackStyle;

/// Pixel dimensions of a viewport or backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Position in surface pixels with a bottom-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Per-frame shader inputs understood by the wave program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Uniform {
    Resolution,
    Time,
    Mouse,
    MouseInfluence,
}

impl Uniform {
    pub const ALL: [Uniform; 4] = [
        Uniform::Resolution,
        Uniform::Time,
        Uniform::Mouse,
        Uniform::MouseInfluence,
    ];

    /// Name of the uniform as declared in the shader source.
    pub fn name(self) -> &'static str {
        match self {
            Uniform::Resolution => "u_resolution",
            Uniform::Time => "u_time",
            Uniform::Mouse => "u_mouse",
            Uniform::MouseInfluence => "u_mouseInfluence",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|uniform| uniform.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(f32, f32),
}

/// Shader pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Opaque token for a pending display-refresh callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Lifecycle of a [`crate::SurfaceManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    /// No successful initialization yet, or waiting to re-run it after a restore.
    Uninitialized,
    /// Static fallback applied; terminal.
    FallbackActive,
    /// Redraw loop running.
    Active,
    /// Graphics alive but the loop is stopped.
    Paused,
    /// Graphics context lost; waiting for a restore signal.
    Lost,
    /// Program released by `destroy`; terminal.
    Destroyed,
}

/// Environment signals the surface manager reacts to.
///
/// Pointer and touch coordinates use the window's top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    Resized,
    PointerMoved { x: f32, y: f32 },
    TouchStarted { x: f32, y: f32 },
    TouchMoved { x: f32, y: f32 },
    ContextLost,
    ContextRestored,
    VisibilityChanged { hidden: bool },
}

/// Behaviour switches for the animated background.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveConfig {
    /// When false the static fallback is applied immediately.
    pub enabled: bool,
    pub fallback: FallbackStyle,
    /// Strength of the pointer light, 0.0-1.0.
    pub mouse_influence: f32,
    pub enable_touch: bool,
    pub respect_reduced_motion: bool,
    pub vertex_source: String,
    pub fragment_source: String,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fallback: FallbackStyle::default(),
            mouse_influence: 1.0,
            enable_touch: true,
            respect_reduced_motion: true,
            vertex_source: crate::shader::WAVE_VERTEX_SHADER.to_string(),
            fragment_source: crate::shader::WAVE_FRAGMENT_SHADER.to_string(),
        }
    }
}
