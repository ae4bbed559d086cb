// Shared host-side doubles: a surface that records what the core asks of it
// and a frame host that only advances when a test pumps it.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use fnv::FnvHashMap;
use halo_core::{
    Camera, FrameCallback, FrameHost, FrameId, RenderError, RenderSurface, SceneGraph,
    SurfaceSize,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    Resize(SurfaceSize),
    Draw,
    Release,
    Detach,
}

/// What a [`HeadlessSurface`] saw, readable after the surface moved into the stage.
#[derive(Clone, Default)]
pub struct SurfaceLog {
    calls: Rc<RefCell<Vec<Call>>>,
    last_aspect: Rc<Cell<f32>>,
    last_nodes: Rc<Cell<usize>>,
    transparent: Rc<Cell<Option<bool>>>,
}

impl SurfaceLog {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn draws(&self) -> usize {
        self.calls.borrow().iter().filter(|c| **c == Call::Draw).count()
    }

    pub fn teardown(&self) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .copied()
            .filter(|c| matches!(c, Call::Release | Call::Detach))
            .collect()
    }

    pub fn last_size(&self) -> Option<SurfaceSize> {
        self.calls.borrow().iter().rev().find_map(|c| match c {
            Call::Resize(s) => Some(*s),
            _ => None,
        })
    }

    pub fn last_aspect(&self) -> f32 {
        self.last_aspect.get()
    }

    pub fn last_node_count(&self) -> usize {
        self.last_nodes.get()
    }

    pub fn transparent(&self) -> Option<bool> {
        self.transparent.get()
    }
}

pub struct HeadlessSurface {
    log: SurfaceLog,
    pub fail_draws: bool,
    /// Runs after every successful draw, while the instance is mid-frame.
    pub on_draw: Option<Box<dyn FnMut()>>,
}

impl HeadlessSurface {
    pub fn new() -> (Self, SurfaceLog) {
        let log = SurfaceLog::default();
        (
            Self {
                log: log.clone(),
                fail_draws: false,
                on_draw: None,
            },
            log,
        )
    }
}

impl RenderSurface for HeadlessSurface {
    fn set_transparent(&mut self, transparent: bool) {
        self.log.transparent.set(Some(transparent));
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.log.calls.borrow_mut().push(Call::Resize(size));
    }

    fn draw(&mut self, camera: &Camera, scene: &SceneGraph) -> Result<(), RenderError> {
        if self.fail_draws {
            return Err(RenderError::SurfaceLost);
        }
        self.log.calls.borrow_mut().push(Call::Draw);
        self.log.last_aspect.set(camera.aspect);
        self.log.last_nodes.set(scene.nodes().len());
        if let Some(hook) = self.on_draw.as_mut() {
            hook();
        }
        Ok(())
    }

    fn release(&mut self) -> Result<(), RenderError> {
        self.log.calls.borrow_mut().push(Call::Release);
        Ok(())
    }

    fn detach(&mut self) -> Result<(), RenderError> {
        self.log.calls.borrow_mut().push(Call::Detach);
        Ok(())
    }
}

/// Frame host driven by [`ManualFrameHost::pump`]; one pump is one display refresh.
#[derive(Default)]
pub struct ManualFrameHost {
    queue: RefCell<FnvHashMap<u64, FrameCallback>>,
    next: Cell<u64>,
    clock_ms: Cell<f64>,
    cancelled: Cell<usize>,
}

impl ManualFrameHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Advance the clock by `dt_ms` and run every queued callback once.
    pub fn pump(&self, dt_ms: f64) -> usize {
        self.clock_ms.set(self.clock_ms.get() + dt_ms);
        let due: Vec<_> = self.queue.borrow_mut().drain().collect();
        let n = due.len();
        for (_, cb) in due {
            cb(self.clock_ms.get());
        }
        n
    }

    pub fn pump_n(&self, frames: usize, dt_ms: f64) {
        for _ in 0..frames {
            self.pump(dt_ms);
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.get()
    }
}

impl FrameHost for ManualFrameHost {
    fn request_frame(&self, callback: FrameCallback) -> FrameId {
        let id = self.next.get();
        self.next.set(id + 1);
        self.queue.borrow_mut().insert(id, callback);
        FrameId(id)
    }

    fn cancel_frame(&self, id: FrameId) {
        if self.queue.borrow_mut().remove(&id.0).is_some() {
            self.cancelled.set(self.cancelled.get() + 1);
        }
    }

    fn now(&self) -> f64 {
        self.clock_ms.get()
    }
}
