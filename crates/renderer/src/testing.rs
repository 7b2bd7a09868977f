//! Recording fakes for the backend traits.

use std::cell::RefCell;
use std::rc::Rc;

use siteconfig::FallbackStyle;

use crate::backend::{GraphicsContext, GraphicsError, Surface, SurfaceHost};
use crate::types::{FrameHandle, ShaderStage, Size, Uniform, UniformValue};

#[derive(Debug, Clone)]
pub(crate) struct Scenario {
    pub has_surface: bool,
    pub reduced_motion: bool,
    pub context_available: bool,
    pub fail_compile: Option<ShaderStage>,
    pub fail_link: bool,
    pub lose_on_draw: bool,
    /// Uniforms the fake program reports as inactive.
    pub inactive: Vec<Uniform>,
    pub viewport: Size,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            has_surface: true,
            reduced_motion: false,
            context_available: true,
            fail_compile: None,
            fail_link: false,
            lose_on_draw: false,
            inactive: Vec::new(),
            viewport: Size::new(800, 600),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub acquire_attempts: usize,
    /// Contexts handed out and not yet dropped.
    pub live_contexts: usize,
    pub fallbacks: Vec<FallbackStyle>,
    /// `live_contexts` observed by each `apply_fallback` call.
    pub live_contexts_at_fallback: Vec<usize>,
    pub compiled: Vec<ShaderStage>,
    pub linked: Vec<u32>,
    pub used: Vec<u32>,
    pub quads: Vec<(u32, Vec<f32>)>,
    pub viewports: Vec<Size>,
    pub uniform_writes: Vec<(Uniform, UniformValue)>,
    pub draws: usize,
    pub deleted_programs: Vec<u32>,
    pub requested: Vec<FrameHandle>,
    pub cancelled: Vec<FrameHandle>,
}

impl Recorder {
    pub fn writes_of(&self, uniform: Uniform) -> Vec<UniformValue> {
        self.uniform_writes
            .iter()
            .filter(|(written, _)| *written == uniform)
            .map(|(_, value)| *value)
            .collect()
    }
}

#[derive(Debug, Default)]
struct Shared {
    scenario: Scenario,
    recorder: Recorder,
    next_frame: u64,
    next_program: u32,
}

/// Host whose surfaces and contexts report into one shared [`Recorder`].
#[derive(Debug, Clone)]
pub(crate) struct FakeHost {
    shared: Rc<RefCell<Shared>>,
}

impl FakeHost {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                scenario,
                ..Shared::default()
            })),
        }
    }

    pub fn recorder(&self) -> std::cell::Ref<'_, Recorder> {
        std::cell::Ref::map(self.shared.borrow(), |shared| &shared.recorder)
    }

    pub fn scenario_mut(&self) -> std::cell::RefMut<'_, Scenario> {
        std::cell::RefMut::map(self.shared.borrow_mut(), |shared| &mut shared.scenario)
    }

    /// Most recent frame request that was not cancelled.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        let shared = self.shared.borrow();
        shared
            .recorder
            .requested
            .last()
            .copied()
            .filter(|handle| !shared.recorder.cancelled.contains(handle))
    }
}

impl SurfaceHost for FakeHost {
    type Surface = FakeSurface;

    fn find_surface(&mut self, _id: &str) -> Option<Self::Surface> {
        if !self.shared.borrow().scenario.has_surface {
            return None;
        }
        Some(FakeSurface {
            shared: self.shared.clone(),
            backing: Size::default(),
        })
    }

    fn viewport_size(&self) -> Size {
        self.shared.borrow().scenario.viewport
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.shared.borrow().scenario.reduced_motion
    }

    fn request_frame(&mut self) -> FrameHandle {
        let mut shared = self.shared.borrow_mut();
        shared.next_frame += 1;
        let handle = FrameHandle(shared.next_frame);
        shared.recorder.requested.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.shared.borrow_mut().recorder.cancelled.push(handle);
    }
}

#[derive(Debug)]
pub(crate) struct FakeSurface {
    shared: Rc<RefCell<Shared>>,
    backing: Size,
}

impl Surface for FakeSurface {
    type Context = FakeContext;

    fn backing_size(&self) -> Size {
        self.backing
    }

    fn set_backing_size(&mut self, size: Size) {
        self.backing = size;
    }

    fn acquire_context(&mut self) -> Option<Self::Context> {
        let mut shared = self.shared.borrow_mut();
        shared.recorder.acquire_attempts += 1;
        if !shared.scenario.context_available {
            return None;
        }
        shared.recorder.live_contexts += 1;
        Some(FakeContext {
            shared: self.shared.clone(),
        })
    }

    fn apply_fallback(&mut self, fallback: &FallbackStyle) {
        let mut shared = self.shared.borrow_mut();
        let live = shared.recorder.live_contexts;
        shared.recorder.live_contexts_at_fallback.push(live);
        shared.recorder.fallbacks.push(fallback.clone());
    }
}

#[derive(Debug)]
pub(crate) struct FakeContext {
    shared: Rc<RefCell<Shared>>,
}

impl Drop for FakeContext {
    fn drop(&mut self) {
        self.shared.borrow_mut().recorder.live_contexts -= 1;
    }
}

impl GraphicsContext for FakeContext {
    type Shader = ShaderStage;
    type Program = u32;
    type Location = Uniform;

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        _source: &str,
    ) -> Result<Self::Shader, GraphicsError> {
        let mut shared = self.shared.borrow_mut();
        shared.recorder.compiled.push(stage);
        if shared.scenario.fail_compile == Some(stage) {
            return Err(GraphicsError::Compile {
                stage,
                log: "syntax error".into(),
            });
        }
        Ok(stage)
    }

    fn link_program(
        &mut self,
        _vertex: Self::Shader,
        _fragment: Self::Shader,
    ) -> Result<Self::Program, GraphicsError> {
        let mut shared = self.shared.borrow_mut();
        if shared.scenario.fail_link {
            return Err(GraphicsError::Link {
                log: "varying mismatch".into(),
            });
        }
        shared.next_program += 1;
        let program = shared.next_program;
        shared.recorder.linked.push(program);
        Ok(program)
    }

    fn use_program(&mut self, program: &Self::Program) {
        self.shared.borrow_mut().recorder.used.push(*program);
    }

    fn upload_quad(&mut self, program: &Self::Program, vertices: &[f32]) {
        self.shared
            .borrow_mut()
            .recorder
            .quads
            .push((*program, vertices.to_vec()));
    }

    fn uniform_location(&self, _program: &Self::Program, name: &str) -> Option<Self::Location> {
        let shared = self.shared.borrow();
        Uniform::from_name(name).filter(|uniform| !shared.scenario.inactive.contains(uniform))
    }

    fn set_viewport(&mut self, size: Size) {
        self.shared.borrow_mut().recorder.viewports.push(size);
    }

    fn set_uniform(&mut self, location: Self::Location, value: UniformValue) {
        self.shared
            .borrow_mut()
            .recorder
            .uniform_writes
            .push((location, value));
    }

    fn draw_quad(&mut self) -> Result<(), GraphicsError> {
        let mut shared = self.shared.borrow_mut();
        if shared.scenario.lose_on_draw {
            return Err(GraphicsError::ContextLost);
        }
        shared.recorder.draws += 1;
        Ok(())
    }

    fn delete_program(&mut self, program: Self::Program) {
        self.shared
            .borrow_mut()
            .recorder
            .deleted_programs
            .push(program);
    }
}
