//! Lifecycle of one animated wave surface.
//!
//! [`SurfaceManager`] owns the surface, the compiled program, and the
//! per-frame uniform state. Frames are driven by the host: the manager asks
//! for one callback through [`SurfaceHost::request_frame`] and re-submits
//! itself from [`SurfaceManager::on_frame`] while it is running. Stopping only
//! prevents the next submission; a frame already delivered still runs.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use crate::backend::{GraphicsContext, GraphicsError, Surface, SurfaceHost};
use crate::pointer::PointerSmoother;
use crate::shader::QUAD_VERTICES;
use crate::types::{
    FrameHandle, Point, ShaderStage, Size, SurfaceEvent, SurfaceState, Uniform, UniformValue,
    WaveConfig,
};

type ContextOf<H> = <<H as SurfaceHost>::Surface as Surface>::Context;

/// Live graphics resources; present only while `Active` or `Paused`.
struct Graphics<C: GraphicsContext> {
    context: C,
    program: Option<C::Program>,
    uniforms: BTreeMap<Uniform, C::Location>,
}

impl<C: GraphicsContext> Graphics<C> {
    fn write(&mut self, uniform: Uniform, value: UniformValue) {
        if let Some(location) = self.uniforms.get(&uniform).copied() {
            self.context.set_uniform(location, value);
        }
    }

    fn release(mut self) {
        self.uniforms.clear();
        if let Some(program) = self.program.take() {
            self.context.delete_program(program);
        }
    }
}

pub struct SurfaceManager<H: SurfaceHost> {
    host: H,
    surface_id: String,
    config: WaveConfig,
    surface: Option<H::Surface>,
    graphics: Option<Graphics<ContextOf<H>>>,
    state: SurfaceState,
    running: bool,
    frame: Option<FrameHandle>,
    pointer: PointerSmoother,
    listening: bool,
}

impl<H: SurfaceHost> SurfaceManager<H> {
    /// Looks up `surface_id` on the host and brings the background up.
    ///
    /// Never fails: a missing surface leaves the manager `Uninitialized`, and
    /// every other problem resolves to the static fallback.
    pub fn initialize(mut host: H, surface_id: impl Into<String>, config: WaveConfig) -> Self {
        let surface_id = surface_id.into();
        let surface = host.find_surface(&surface_id);
        let mut manager = Self {
            host,
            surface_id,
            config,
            surface,
            graphics: None,
            state: SurfaceState::Uninitialized,
            running: false,
            frame: None,
            pointer: PointerSmoother::default(),
            listening: false,
        };

        if manager.surface.is_none() {
            error!(surface = %manager.surface_id, "surface not found; wave background disabled");
            return manager;
        }
        manager.run_initialization();
        manager
    }

    fn run_initialization(&mut self) {
        if self.surface.is_none() {
            return;
        }

        let skip_reason = if !self.config.enabled {
            Some("wave background disabled in configuration")
        } else if self.config.respect_reduced_motion && self.host.prefers_reduced_motion() {
            Some("reduced motion preferred")
        } else {
            None
        };
        if let Some(reason) = skip_reason {
            info!(surface = %self.surface_id, "{reason}; using static fallback");
            self.enter_fallback();
            return;
        }

        let context = self
            .surface
            .as_mut()
            .and_then(|surface| surface.acquire_context());
        let Some(mut context) = context else {
            warn!(surface = %self.surface_id, "graphics context unavailable; using static fallback");
            self.enter_fallback();
            return;
        };

        let program = match build_program(&mut context, &self.config) {
            Ok(program) => program,
            Err(err) => {
                error!(surface = %self.surface_id, %err, "wave shader program failed");
                // The fallback may claim the surface for itself.
                drop(context);
                self.enter_fallback();
                return;
            }
        };
        context.upload_quad(&program, &QUAD_VERTICES);

        let mut uniforms = BTreeMap::new();
        for uniform in Uniform::ALL {
            match context.uniform_location(&program, uniform.name()) {
                Some(location) => {
                    uniforms.insert(uniform, location);
                }
                None => debug!(uniform = uniform.name(), "uniform not active in program"),
            }
        }

        self.graphics = Some(Graphics {
            context,
            program: Some(program),
            uniforms,
        });
        self.listening = true;
        self.state = SurfaceState::Paused;

        // A fresh context has never seen the resolution, even if the size is unchanged.
        self.apply_viewport(true);

        let size = self.backing_size();
        self.pointer.reset(Point::new(
            size.width as f32 / 2.0,
            size.height as f32 / 2.0,
        ));
        self.start();
        info!(
            surface = %self.surface_id,
            width = size.width,
            height = size.height,
            "wave background running"
        );
    }

    fn enter_fallback(&mut self) {
        self.state = SurfaceState::FallbackActive;
        if let Some(surface) = self.surface.as_mut() {
            surface.apply_fallback(&self.config.fallback);
        }
    }

    /// Begins the redraw loop. No-op when already running or without graphics.
    pub fn start(&mut self) {
        if self.running || self.graphics.is_none() {
            return;
        }
        self.running = true;
        self.frame = Some(self.host.request_frame());
        self.state = SurfaceState::Active;
        debug!(surface = %self.surface_id, "wave loop started");
    }

    /// Cancels the pending frame. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.running = false;
        if let Some(handle) = self.frame.take() {
            self.host.cancel_frame(handle);
            debug!(surface = %self.surface_id, "wave loop stopped");
        }
        if self.state == SurfaceState::Active {
            self.state = SurfaceState::Paused;
        }
    }

    /// Matches the backing store to the viewport; writes resolution only on change.
    pub fn resize(&mut self) {
        if self.state == SurfaceState::Destroyed {
            return;
        }
        self.apply_viewport(false);
    }

    fn apply_viewport(&mut self, force: bool) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let viewport = self.host.viewport_size();
        if !force && surface.backing_size() == viewport {
            return;
        }
        surface.set_backing_size(viewport);
        if let Some(graphics) = self.graphics.as_mut() {
            graphics.context.set_viewport(viewport);
            graphics.write(
                Uniform::Resolution,
                UniformValue::Vec2(viewport.width as f32, viewport.height as f32),
            );
        }
        debug!(
            width = viewport.width,
            height = viewport.height,
            "wave surface resized"
        );
    }

    /// Stops the loop and releases the program. The surface itself is left alone.
    pub fn destroy(&mut self) {
        if matches!(
            self.state,
            SurfaceState::Destroyed | SurfaceState::FallbackActive
        ) {
            return;
        }
        self.stop();
        if let Some(graphics) = self.graphics.take() {
            graphics.release();
        }
        self.listening = false;
        self.state = SurfaceState::Destroyed;
        info!(surface = %self.surface_id, "wave background destroyed");
    }

    /// Runs one redraw step for the frame the host just delivered.
    ///
    /// `elapsed` is measured from the host's loop origin. Handles that do not
    /// match the pending request are ignored.
    pub fn on_frame(&mut self, handle: FrameHandle, elapsed: Duration) {
        if !self.running || self.frame != Some(handle) {
            trace!(handle = handle.0, "ignoring stale frame");
            return;
        }
        self.frame = None;

        let size = self.backing_size();
        let pointer = self.pointer.step();
        let Some(graphics) = self.graphics.as_mut() else {
            self.running = false;
            return;
        };
        graphics.write(Uniform::Time, UniformValue::Float(elapsed.as_secs_f32()));
        graphics.write(
            Uniform::Resolution,
            UniformValue::Vec2(size.width as f32, size.height as f32),
        );
        graphics.write(Uniform::Mouse, UniformValue::Vec2(pointer.x, pointer.y));
        graphics.write(
            Uniform::MouseInfluence,
            UniformValue::Float(self.config.mouse_influence),
        );
        let outcome = graphics.context.draw_quad();

        match outcome {
            Ok(()) => {}
            Err(GraphicsError::ContextLost) => {
                self.lose_context();
                return;
            }
            Err(err) => warn!(%err, "wave frame failed"),
        }

        if self.running {
            self.frame = Some(self.host.request_frame());
        }
    }

    /// Reacts to one environment signal.
    pub fn handle_event(&mut self, event: SurfaceEvent) {
        if !self.listening {
            return;
        }
        match event {
            SurfaceEvent::Resized => self.resize(),
            SurfaceEvent::PointerMoved { x, y } => self.track_pointer(x, y),
            SurfaceEvent::TouchStarted { x, y } | SurfaceEvent::TouchMoved { x, y } => {
                if self.config.enable_touch {
                    self.track_pointer(x, y);
                }
            }
            SurfaceEvent::ContextLost => self.lose_context(),
            SurfaceEvent::ContextRestored => self.restore_context(),
            SurfaceEvent::VisibilityChanged { hidden: true } => self.stop(),
            SurfaceEvent::VisibilityChanged { hidden: false } => self.start(),
        }
    }

    fn track_pointer(&mut self, x: f32, y: f32) {
        let height = self.backing_size().height as f32;
        self.pointer.set_target(Point::new(x, height - y));
    }

    fn lose_context(&mut self) {
        if !matches!(self.state, SurfaceState::Active | SurfaceState::Paused) {
            return;
        }
        warn!(surface = %self.surface_id, "graphics context lost; pausing wave background");
        self.stop();
        // The program died with the context; nothing to delete.
        self.graphics = None;
        self.state = SurfaceState::Lost;
    }

    fn restore_context(&mut self) {
        if self.state != SurfaceState::Lost {
            return;
        }
        info!(surface = %self.surface_id, "graphics context restored; reinitializing");
        self.state = SurfaceState::Uninitialized;
        self.run_initialization();
    }

    fn backing_size(&self) -> Size {
        self.surface
            .as_ref()
            .map(|surface| surface.backing_size())
            .unwrap_or_default()
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The frame request currently in flight, if any.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.frame
    }

    pub fn pointer(&self) -> &PointerSmoother {
        &self.pointer
    }

    pub fn config(&self) -> &WaveConfig {
        &self.config
    }

    pub fn surface_id(&self) -> &str {
        &self.surface_id
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn surface(&self) -> Option<&H::Surface> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut H::Surface> {
        self.surface.as_mut()
    }
}

fn build_program<C: GraphicsContext>(
    context: &mut C,
    config: &WaveConfig,
) -> Result<C::Program, GraphicsError> {
    let vertex = context.compile_shader(ShaderStage::Vertex, &config.vertex_source)?;
    let fragment = context.compile_shader(ShaderStage::Fragment, &config.fragment_source)?;
    let program = context.link_program(vertex, fragment)?;
    context.use_program(&program);
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeHost, Scenario};

    fn manager_with(scenario: Scenario) -> (FakeHost, SurfaceManager<FakeHost>) {
        manager_with_config(scenario, WaveConfig::default())
    }

    fn manager_with_config(
        scenario: Scenario,
        config: WaveConfig,
    ) -> (FakeHost, SurfaceManager<FakeHost>) {
        let host = FakeHost::new(scenario);
        let manager = SurfaceManager::initialize(host.clone(), "wave-canvas", config);
        (host, manager)
    }

    fn assert_frame_invariant(manager: &SurfaceManager<FakeHost>) {
        assert_eq!(manager.pending_frame().is_some(), manager.is_running());
    }

    #[test]
    fn reduced_motion_never_acquires_a_context() {
        let (host, manager) = manager_with(Scenario {
            reduced_motion: true,
            ..Scenario::default()
        });

        assert_eq!(manager.state(), SurfaceState::FallbackActive);
        let recorder = host.recorder();
        assert_eq!(recorder.acquire_attempts, 0);
        assert_eq!(recorder.fallbacks.len(), 1);
        assert!(recorder.requested.is_empty());
    }

    #[test]
    fn reduced_motion_is_ignored_when_not_respected() {
        let config = WaveConfig {
            respect_reduced_motion: false,
            ..WaveConfig::default()
        };
        let (host, manager) = manager_with_config(
            Scenario {
                reduced_motion: true,
                ..Scenario::default()
            },
            config,
        );

        assert_eq!(manager.state(), SurfaceState::Active);
        assert_eq!(host.recorder().acquire_attempts, 1);
    }

    #[test]
    fn disabled_config_goes_straight_to_fallback() {
        let config = WaveConfig {
            enabled: false,
            ..WaveConfig::default()
        };
        let (host, manager) = manager_with_config(Scenario::default(), config);

        assert_eq!(manager.state(), SurfaceState::FallbackActive);
        assert_eq!(host.recorder().acquire_attempts, 0);
    }

    #[test]
    fn missing_context_falls_back() {
        let (host, manager) = manager_with(Scenario {
            context_available: false,
            ..Scenario::default()
        });

        assert_eq!(manager.state(), SurfaceState::FallbackActive);
        assert_eq!(host.recorder().acquire_attempts, 1);
        assert_eq!(host.recorder().fallbacks.len(), 1);
        assert_frame_invariant(&manager);
    }

    #[test]
    fn compile_or_link_failure_falls_back_without_retry() {
        for scenario in [
            Scenario {
                fail_compile: Some(ShaderStage::Fragment),
                ..Scenario::default()
            },
            Scenario {
                fail_link: true,
                ..Scenario::default()
            },
        ] {
            let (host, mut manager) = manager_with(scenario);
            assert_eq!(manager.state(), SurfaceState::FallbackActive);

            manager.start();
            manager.handle_event(SurfaceEvent::ContextRestored);
            assert_eq!(manager.state(), SurfaceState::FallbackActive);
            assert_eq!(host.recorder().acquire_attempts, 1);
            assert!(host.recorder().requested.is_empty());
        }
    }

    #[test]
    fn failed_program_releases_context_before_fallback() {
        let (host, manager) = manager_with(Scenario {
            fail_compile: Some(ShaderStage::Fragment),
            ..Scenario::default()
        });

        assert_eq!(manager.state(), SurfaceState::FallbackActive);
        let recorder = host.recorder();
        assert_eq!(recorder.live_contexts_at_fallback, vec![0]);
        assert_eq!(recorder.live_contexts, 0);
    }

    #[test]
    fn missing_surface_stays_uninitialized() {
        let (host, mut manager) = manager_with(Scenario {
            has_surface: false,
            ..Scenario::default()
        });

        assert_eq!(manager.state(), SurfaceState::Uninitialized);
        manager.start();
        manager.resize();
        manager.handle_event(SurfaceEvent::PointerMoved { x: 1.0, y: 1.0 });
        assert!(!manager.is_running());
        assert_eq!(host.recorder().acquire_attempts, 0);
        assert!(host.recorder().fallbacks.is_empty());
    }

    #[test]
    fn successful_initialization_starts_the_loop() {
        let (host, manager) = manager_with(Scenario::default());

        assert_eq!(manager.state(), SurfaceState::Active);
        assert_frame_invariant(&manager);
        assert_eq!(host.pending_frame(), manager.pending_frame());

        let recorder = host.recorder();
        assert_eq!(
            recorder.compiled,
            vec![ShaderStage::Vertex, ShaderStage::Fragment]
        );
        assert_eq!(recorder.quads, vec![(1, QUAD_VERTICES.to_vec())]);
        assert_eq!(recorder.viewports, vec![Size::new(800, 600)]);
        assert_eq!(
            recorder.writes_of(Uniform::Resolution),
            vec![UniformValue::Vec2(800.0, 600.0)]
        );
        assert_eq!(manager.pointer().current(), Point::new(400.0, 300.0));
    }

    #[test]
    fn repeated_resize_with_same_viewport_writes_resolution_once() {
        let (host, mut manager) = manager_with(Scenario::default());
        for _ in 0..5 {
            manager.resize();
            manager.handle_event(SurfaceEvent::Resized);
        }
        assert_eq!(host.recorder().writes_of(Uniform::Resolution).len(), 1);

        host.scenario_mut().viewport = Size::new(1024, 768);
        manager.resize();
        manager.resize();
        let writes = host.recorder().writes_of(Uniform::Resolution);
        assert_eq!(
            writes,
            vec![
                UniformValue::Vec2(800.0, 600.0),
                UniformValue::Vec2(1024.0, 768.0)
            ]
        );
        assert_eq!(
            manager.surface().map(|surface| surface.backing_size()),
            Some(Size::new(1024, 768))
        );
    }

    #[test]
    fn frame_pushes_uniforms_draws_and_reschedules() {
        let (host, mut manager) = manager_with(Scenario::default());
        let first = manager.pending_frame().unwrap();

        manager.on_frame(first, Duration::from_millis(1500));

        let recorder = host.recorder();
        assert_eq!(recorder.draws, 1);
        assert_eq!(
            recorder.writes_of(Uniform::Time),
            vec![UniformValue::Float(1.5)]
        );
        assert_eq!(
            recorder.writes_of(Uniform::MouseInfluence),
            vec![UniformValue::Float(1.0)]
        );
        assert_eq!(
            recorder.writes_of(Uniform::Mouse),
            vec![UniformValue::Vec2(400.0, 300.0)]
        );
        assert_eq!(recorder.requested.len(), 2);
        drop(recorder);

        let second = manager.pending_frame().unwrap();
        assert_ne!(first, second);
        assert_frame_invariant(&manager);
    }

    #[test]
    fn inactive_uniforms_are_never_written() {
        let (host, mut manager) = manager_with(Scenario {
            inactive: vec![Uniform::MouseInfluence],
            ..Scenario::default()
        });
        let handle = manager.pending_frame().unwrap();
        manager.on_frame(handle, Duration::from_millis(16));

        let recorder = host.recorder();
        assert_eq!(recorder.draws, 1);
        assert!(recorder.writes_of(Uniform::MouseInfluence).is_empty());
        assert_eq!(recorder.writes_of(Uniform::Time).len(), 1);
    }

    #[test]
    fn stale_frames_are_ignored() {
        let (host, mut manager) = manager_with(Scenario::default());
        let first = manager.pending_frame().unwrap();
        manager.on_frame(first, Duration::from_millis(16));
        manager.on_frame(first, Duration::from_millis(32));
        manager.on_frame(FrameHandle(999), Duration::from_millis(48));

        assert_eq!(host.recorder().draws, 1);
        assert_eq!(host.recorder().requested.len(), 2);
    }

    #[test]
    fn frame_delivered_after_stop_draws_nothing() {
        let (host, mut manager) = manager_with(Scenario::default());
        let pending = manager.pending_frame().unwrap();
        manager.stop();
        manager.on_frame(pending, Duration::from_millis(16));

        assert_eq!(host.recorder().draws, 0);
        assert_eq!(manager.pending_frame(), None);
    }

    #[test]
    fn pointer_target_is_flipped_and_eased() {
        let (_host, mut manager) = manager_with(Scenario::default());
        manager.handle_event(SurfaceEvent::PointerMoved { x: 100.0, y: 50.0 });
        assert_eq!(manager.pointer().target(), Point::new(100.0, 550.0));

        for step in 0..400 {
            let handle = manager.pending_frame().unwrap();
            manager.on_frame(handle, Duration::from_millis(16 * step));
        }
        let current = manager.pointer().current();
        assert!((current.x - 100.0).abs() < 1e-2);
        assert!((current.y - 550.0).abs() < 1e-2);
    }

    #[test]
    fn touch_is_ignored_when_disabled() {
        let config = WaveConfig {
            enable_touch: false,
            ..WaveConfig::default()
        };
        let (_host, mut manager) = manager_with_config(Scenario::default(), config);
        let before = manager.pointer().target();
        manager.handle_event(SurfaceEvent::TouchStarted { x: 10.0, y: 10.0 });
        manager.handle_event(SurfaceEvent::TouchMoved { x: 20.0, y: 20.0 });
        assert_eq!(manager.pointer().target(), before);
    }

    #[test]
    fn touch_moves_pointer_when_enabled() {
        let (_host, mut manager) = manager_with(Scenario::default());
        manager.handle_event(SurfaceEvent::TouchMoved { x: 20.0, y: 100.0 });
        assert_eq!(manager.pointer().target(), Point::new(20.0, 500.0));
    }

    #[test]
    fn stop_twice_cancels_once_and_start_resumes() {
        let (host, mut manager) = manager_with(Scenario::default());
        manager.stop();
        manager.stop();

        assert_eq!(manager.state(), SurfaceState::Paused);
        assert_eq!(host.recorder().cancelled.len(), 1);
        assert_frame_invariant(&manager);

        manager.start();
        manager.start();
        assert_eq!(manager.state(), SurfaceState::Active);
        assert_eq!(host.recorder().requested.len(), 2);
        assert_frame_invariant(&manager);
    }

    #[test]
    fn visibility_pauses_and_resumes() {
        let (host, mut manager) = manager_with(Scenario::default());
        manager.handle_event(SurfaceEvent::VisibilityChanged { hidden: true });
        assert_eq!(manager.state(), SurfaceState::Paused);
        assert_eq!(host.pending_frame(), None);

        manager.handle_event(SurfaceEvent::VisibilityChanged { hidden: false });
        assert_eq!(manager.state(), SurfaceState::Active);
        assert!(host.pending_frame().is_some());
    }

    #[test]
    fn start_after_destroy_does_not_resurrect() {
        let (host, mut manager) = manager_with(Scenario::default());
        manager.destroy();

        assert_eq!(manager.state(), SurfaceState::Destroyed);
        assert_eq!(host.recorder().deleted_programs, vec![1]);

        manager.start();
        manager.handle_event(SurfaceEvent::VisibilityChanged { hidden: false });
        manager.handle_event(SurfaceEvent::ContextRestored);
        manager.destroy();

        assert_eq!(manager.state(), SurfaceState::Destroyed);
        assert!(!manager.is_running());
        let recorder = host.recorder();
        assert_eq!(recorder.requested.len(), 1);
        assert_eq!(recorder.deleted_programs, vec![1]);
        assert_eq!(recorder.acquire_attempts, 1);
    }

    #[test]
    fn context_loss_pauses_and_restore_reinitializes() {
        let (host, mut manager) = manager_with(Scenario::default());
        manager.handle_event(SurfaceEvent::ContextLost);

        assert_eq!(manager.state(), SurfaceState::Lost);
        assert_frame_invariant(&manager);
        manager.start();
        assert!(!manager.is_running());
        assert!(host.recorder().deleted_programs.is_empty());

        manager.handle_event(SurfaceEvent::ContextRestored);
        assert_eq!(manager.state(), SurfaceState::Active);
        assert_frame_invariant(&manager);
        let recorder = host.recorder();
        assert_eq!(recorder.acquire_attempts, 2);
        assert_eq!(recorder.linked, vec![1, 2]);
        assert_eq!(recorder.writes_of(Uniform::Resolution).len(), 2);
    }

    #[test]
    fn restore_without_loss_is_ignored() {
        let (host, mut manager) = manager_with(Scenario::default());
        manager.handle_event(SurfaceEvent::ContextRestored);
        assert_eq!(host.recorder().acquire_attempts, 1);
        assert_eq!(manager.state(), SurfaceState::Active);
    }

    #[test]
    fn draw_reporting_loss_moves_to_lost() {
        let (host, mut manager) = manager_with(Scenario::default());
        host.scenario_mut().lose_on_draw = true;
        let handle = manager.pending_frame().unwrap();
        manager.on_frame(handle, Duration::from_millis(16));

        assert_eq!(manager.state(), SurfaceState::Lost);
        assert!(!manager.is_running());
        assert_eq!(host.recorder().requested.len(), 1);
    }

    #[test]
    fn restore_after_loss_can_still_fall_back() {
        let (host, mut manager) = manager_with(Scenario::default());
        manager.handle_event(SurfaceEvent::ContextLost);
        host.scenario_mut().context_available = false;
        manager.handle_event(SurfaceEvent::ContextRestored);

        assert_eq!(manager.state(), SurfaceState::FallbackActive);
        assert_eq!(host.recorder().fallbacks.len(), 1);
    }
}
