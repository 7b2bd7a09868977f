use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use tracing::{debug, info, trace, warn};
use winit::dpi::PhysicalSize;
use winit::event::{Event, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use siteconfig::FallbackStyle;
use winit::window::{Window, WindowBuilder};

use crate::backend::{Surface, SurfaceHost};
use crate::gpu::{GpuContext, WgpuContext};
use crate::session::SurfaceManager;
use crate::types::{FrameHandle, Size, SurfaceEvent, SurfaceState, WaveConfig};

/// Identifier the window host answers to in [`SurfaceHost::find_surface`].
pub const WINDOW_SURFACE_ID: &str = "wave-canvas";

#[derive(Debug, Clone)]
pub struct WindowOptions {
    pub title: String,
    pub size: Size,
    /// Stands in for the platform's reduced-motion accessibility setting.
    pub reduced_motion: bool,
    pub wave: WaveConfig,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: "Tidewave".to_string(),
            size: Size::new(1280, 720),
            reduced_motion: false,
            wave: WaveConfig::default(),
        }
    }
}

/// Hosts a [`SurfaceManager`] inside a single winit window.
pub(crate) struct WindowHost {
    window: Arc<Window>,
    reduced_motion: bool,
    next_frame: u64,
    surface_taken: bool,
}

impl WindowHost {
    fn new(window: Arc<Window>, reduced_motion: bool) -> Self {
        Self {
            window,
            reduced_motion,
            next_frame: 0,
            surface_taken: false,
        }
    }
}

impl SurfaceHost for WindowHost {
    type Surface = WindowSurface;

    fn find_surface(&mut self, id: &str) -> Option<Self::Surface> {
        if id != WINDOW_SURFACE_ID || self.surface_taken {
            return None;
        }
        self.surface_taken = true;
        Some(WindowSurface {
            window: self.window.clone(),
            backing: Size::default(),
            fallback: None,
        })
    }

    fn viewport_size(&self) -> Size {
        let size = self.window.inner_size();
        Size::new(size.width, size.height)
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn request_frame(&mut self) -> FrameHandle {
        self.next_frame += 1;
        self.window.request_redraw();
        FrameHandle(self.next_frame)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        // winit cannot retract a redraw request; the manager drops the stale handle.
        trace!(handle = handle.0, "frame request cancelled");
    }
}

/// Static fill painted when the wave cannot or should not animate.
struct FallbackPainter {
    gpu: Option<GpuContext>,
    color: [f32; 3],
}

pub(crate) struct WindowSurface {
    window: Arc<Window>,
    backing: Size,
    fallback: Option<FallbackPainter>,
}

impl WindowSurface {
    fn paint_fallback(&mut self) {
        let Some(painter) = self.fallback.as_mut() else {
            return;
        };
        let Some(gpu) = painter.gpu.as_mut() else {
            return;
        };
        if gpu.size != self.backing {
            gpu.resize(self.backing);
        }
        match gpu.paint_solid(painter.color) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu.reconfigure(),
            Err(err) => debug!(%err, "fallback paint skipped"),
        }
    }
}

impl Surface for WindowSurface {
    type Context = WgpuContext;

    fn backing_size(&self) -> Size {
        self.backing
    }

    fn set_backing_size(&mut self, size: Size) {
        self.backing = size;
    }

    fn acquire_context(&mut self) -> Option<Self::Context> {
        let size = Size::new(
            self.window.inner_size().width,
            self.window.inner_size().height,
        );
        match GpuContext::new(self.window.as_ref(), size) {
            Ok(gpu) => Some(WgpuContext::new(gpu)),
            Err(err) => {
                warn!("failed to create GPU context: {err:#}");
                None
            }
        }
    }

    fn apply_fallback(&mut self, fallback: &FallbackStyle) {
        let color = fallback.mean_color();
        let size = Size::new(
            self.window.inner_size().width,
            self.window.inner_size().height,
        );
        self.backing = size;
        let gpu = match GpuContext::new(self.window.as_ref(), size) {
            Ok(gpu) => Some(gpu),
            Err(err) => {
                warn!("no GPU available for the static fallback; window stays blank: {err:#}");
                None
            }
        };
        self.fallback = Some(FallbackPainter { gpu, color });
        self.window.request_redraw();
    }
}

/// Opens a window and runs the wave background until it is closed.
pub fn run_window(options: WindowOptions) -> Result<()> {
    let event_loop = EventLoopBuilder::new()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let window = WindowBuilder::new()
        .with_title(options.title.as_str())
        .with_inner_size(PhysicalSize::new(
            options.size.width.max(1),
            options.size.height.max(1),
        ))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);
    let window_id = window.id();

    let host = WindowHost::new(window.clone(), options.reduced_motion);
    let mut manager = SurfaceManager::initialize(host, WINDOW_SURFACE_ID, options.wave);
    info!(state = ?manager.state(), "window ready");

    let origin = Instant::now();
    let mut suspended = false;
    let run_result = event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Wait);
        match event {
            Event::WindowEvent {
                window_id: id,
                event,
            } if id == window_id => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    manager.destroy();
                    elwt.exit();
                }
                WindowEvent::Resized(_) => {
                    manager.handle_event(SurfaceEvent::Resized);
                    window.request_redraw();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    manager.handle_event(SurfaceEvent::PointerMoved {
                        x: position.x as f32,
                        y: position.y as f32,
                    });
                }
                WindowEvent::Touch(touch) => {
                    let (x, y) = (touch.location.x as f32, touch.location.y as f32);
                    match touch.phase {
                        TouchPhase::Started => {
                            manager.handle_event(SurfaceEvent::TouchStarted { x, y })
                        }
                        TouchPhase::Moved => {
                            manager.handle_event(SurfaceEvent::TouchMoved { x, y })
                        }
                        TouchPhase::Ended | TouchPhase::Cancelled => {}
                    }
                }
                WindowEvent::Occluded(hidden) => {
                    manager.handle_event(SurfaceEvent::VisibilityChanged { hidden });
                }
                WindowEvent::RedrawRequested => match manager.state() {
                    SurfaceState::FallbackActive => {
                        let viewport = manager.host().viewport_size();
                        if let Some(surface) = manager.surface_mut() {
                            surface.set_backing_size(viewport);
                            surface.paint_fallback();
                        }
                    }
                    _ => {
                        if let Some(handle) = manager.pending_frame() {
                            manager.on_frame(handle, origin.elapsed());
                        }
                    }
                },
                _ => {}
            },
            Event::Suspended => {
                suspended = true;
                manager.handle_event(SurfaceEvent::ContextLost);
            }
            Event::Resumed => {
                suspended = false;
                manager.handle_event(SurfaceEvent::ContextRestored);
            }
            Event::AboutToWait => {
                // A device loss reported by the GPU recovers on the next idle turn.
                if manager.state() == SurfaceState::Lost && !suspended {
                    manager.handle_event(SurfaceEvent::ContextRestored);
                }
            }
            _ => {}
        }
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}
