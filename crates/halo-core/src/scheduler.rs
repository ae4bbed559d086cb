//! Per-instance animation scheduler driven by the host's next-frame primitive.
//!
//! Lifecycle: `Stopped -> Running -> Disposing -> Stopped`. While running,
//! every frame callback checks liveness, runs one tick of its target and
//! requests the next frame. `stop` flips the state and cancels the pending
//! frame; a callback the host already queued sees the state and bails out
//! before touching the target.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use instant::Instant;

use crate::constants::{FRAME_BUDGET_WARN_MS, SLOW_TICK_LOG_INTERVAL};
use crate::error::SceneError;

/// Callback invoked by the host with its frame timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameId(pub u64);

/// The host's "run this on the next display refresh" primitive.
pub trait FrameHost {
    fn request_frame(&self, callback: FrameCallback) -> FrameId;
    fn cancel_frame(&self, id: FrameId);
    /// Current host time in milliseconds, same clock as frame timestamps.
    fn now(&self) -> f64;
}

/// Something updated and drawn once per frame.
pub trait FrameTarget {
    /// `elapsed` is seconds since the scheduler started. An error skips the
    /// frame; the loop keeps going.
    fn frame(&mut self, elapsed: f32) -> Result<(), SceneError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
    Disposing,
}

struct Inner {
    host: Rc<dyn FrameHost>,
    state: Cell<SchedulerState>,
    pending: Cell<Option<FrameId>>,
    run_id: Cell<u64>,
    started_at: Cell<f64>,
    elapsed: Cell<f32>,
    frames: Cell<u64>,
    skipped: Cell<u64>,
    last_slow_warn: Cell<Option<u64>>,
}

/// Cheap to clone; clones share one loop.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<Inner>,
}

impl Scheduler {
    pub fn new(host: Rc<dyn FrameHost>) -> Self {
        Self {
            inner: Rc::new(Inner {
                host,
                state: Cell::new(SchedulerState::Stopped),
                pending: Cell::new(None),
                run_id: Cell::new(0),
                started_at: Cell::new(0.0),
                elapsed: Cell::new(0.0),
                frames: Cell::new(0),
                skipped: Cell::new(0),
                last_slow_warn: Cell::new(None),
            }),
        }
    }

    #[inline]
    pub fn state(&self) -> SchedulerState {
        self.inner.state.get()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// Seconds since start as of the last tick.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.inner.elapsed.get()
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.inner.frames.get()
    }

    #[inline]
    pub fn skipped_frames(&self) -> u64 {
        self.inner.skipped.get()
    }

    #[inline]
    pub fn has_pending_frame(&self) -> bool {
        self.inner.pending.get().is_some()
    }

    /// Begin issuing one tick per display refresh. The clock restarts at 0.
    ///
    /// The scheduler only keeps a weak reference to `target`; dropping the
    /// target ends the loop at its next frame.
    pub fn start(&self, target: Rc<RefCell<dyn FrameTarget>>) -> Result<(), SceneError> {
        let inner = &self.inner;
        if inner.state.get() != SchedulerState::Stopped {
            return Err(SceneError::AlreadyRunning);
        }
        let run_id = inner.run_id.get() + 1;
        inner.run_id.set(run_id);
        inner.started_at.set(inner.host.now());
        inner.elapsed.set(0.0);
        inner.frames.set(0);
        inner.skipped.set(0);
        inner.last_slow_warn.set(None);
        inner.state.set(SchedulerState::Running);
        schedule(inner, Rc::downgrade(&target), run_id);
        log::debug!("[scheduler] started run {}", run_id);
        Ok(())
    }

    /// Stop the loop and cancel the pending frame. Stopping twice is a no-op.
    pub fn stop(&self) {
        let inner = &self.inner;
        if inner.state.get() != SchedulerState::Running {
            return;
        }
        inner.state.set(SchedulerState::Disposing);
        if let Some(id) = inner.pending.take() {
            inner.host.cancel_frame(id);
        }
        inner.state.set(SchedulerState::Stopped);
        log::debug!(
            "[scheduler] stopped after {} frames ({} skipped)",
            inner.frames.get(),
            inner.skipped.get()
        );
    }
}

fn schedule(inner: &Rc<Inner>, target: Weak<RefCell<dyn FrameTarget>>, run_id: u64) {
    let me = inner.clone();
    let id = inner.host.request_frame(Box::new(move |now| {
        if me.run_id.get() != run_id || me.state.get() != SchedulerState::Running {
            return;
        }
        me.pending.set(None);
        let Some(strong) = target.upgrade() else {
            me.state.set(SchedulerState::Stopped);
            log::debug!("[scheduler] target dropped; loop ended");
            return;
        };
        me.tick(&strong, now);
        if me.run_id.get() == run_id && me.state.get() == SchedulerState::Running {
            schedule(&me, target, run_id);
        }
    }));
    inner.pending.set(Some(id));
}

impl Inner {
    fn tick(&self, target: &RefCell<dyn FrameTarget>, now: f64) {
        let since_start = ((now - self.started_at.get()) / 1000.0) as f32;
        let elapsed = if since_start.is_finite() {
            since_start.max(self.elapsed.get())
        } else {
            self.elapsed.get()
        };
        self.elapsed.set(elapsed);

        let t0 = Instant::now();
        match target.try_borrow_mut() {
            Ok(mut t) => match t.frame(elapsed) {
                Ok(()) => self.frames.set(self.frames.get() + 1),
                Err(e) => {
                    self.skipped.set(self.skipped.get() + 1);
                    log::warn!("[scheduler] frame skipped: {}", e);
                }
            },
            Err(_) => {
                self.skipped.set(self.skipped.get() + 1);
                log::warn!("[scheduler] target busy; frame skipped");
            }
        }
        let spent_ms = t0.elapsed().as_secs_f64() * 1000.0;
        if spent_ms > FRAME_BUDGET_WARN_MS {
            let frame = self.frames.get() + self.skipped.get();
            let due = match self.last_slow_warn.get() {
                Some(last) => frame.saturating_sub(last) >= SLOW_TICK_LOG_INTERVAL,
                None => true,
            };
            if due {
                self.last_slow_warn.set(Some(frame));
                log::warn!("[scheduler] slow tick: {:.1} ms", spent_ms);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fnv::FnvHashMap;

    #[derive(Default)]
    struct TestHost {
        queue: RefCell<FnvHashMap<u64, FrameCallback>>,
        next: Cell<u64>,
        clock: Cell<f64>,
    }

    impl TestHost {
        fn pump(&self, dt_ms: f64) -> usize {
            self.clock.set(self.clock.get() + dt_ms);
            let due: Vec<_> = self.queue.borrow_mut().drain().collect();
            let n = due.len();
            for (_, cb) in due {
                cb(self.clock.get());
            }
            n
        }
    }

    impl FrameHost for TestHost {
        fn request_frame(&self, callback: FrameCallback) -> FrameId {
            let id = self.next.get();
            self.next.set(id + 1);
            self.queue.borrow_mut().insert(id, callback);
            FrameId(id)
        }
        fn cancel_frame(&self, id: FrameId) {
            self.queue.borrow_mut().remove(&id.0);
        }
        fn now(&self) -> f64 {
            self.clock.get()
        }
    }

    struct Counter {
        ticks: Vec<f32>,
        fail_on: Option<usize>,
    }

    impl FrameTarget for Counter {
        fn frame(&mut self, elapsed: f32) -> Result<(), SceneError> {
            let n = self.ticks.len();
            self.ticks.push(elapsed);
            if Some(n) == self.fail_on {
                return Err(SceneError::InstanceBusy);
            }
            Ok(())
        }
    }

    fn setup(fail_on: Option<usize>) -> (Rc<TestHost>, Scheduler, Rc<RefCell<Counter>>) {
        let host = Rc::new(TestHost::default());
        let sched = Scheduler::new(host.clone());
        let target = Rc::new(RefCell::new(Counter {
            ticks: Vec::new(),
            fail_on,
        }));
        (host, sched, target)
    }

    #[test]
    fn runs_one_tick_per_frame_with_monotonic_clock() {
        let (host, sched, target) = setup(None);
        sched.start(target.clone()).unwrap();
        for _ in 0..3 {
            assert_eq!(host.pump(16.0), 1);
        }
        let ticks = &target.borrow().ticks;
        assert_eq!(ticks.len(), 3);
        assert!(ticks.windows(2).all(|w| w[1] >= w[0]));
        assert!((ticks[2] - 0.048).abs() < 1e-4);
    }

    #[test]
    fn stop_cancels_pending_frame_and_is_idempotent() {
        let (host, sched, target) = setup(None);
        sched.start(target.clone()).unwrap();
        host.pump(16.0);
        sched.stop();
        sched.stop();
        assert_eq!(sched.state(), SchedulerState::Stopped);
        assert!(!sched.has_pending_frame());
        assert_eq!(host.pump(16.0), 0);
        assert_eq!(target.borrow().ticks.len(), 1);
    }

    #[test]
    fn double_start_is_rejected() {
        let (_host, sched, target) = setup(None);
        sched.start(target.clone()).unwrap();
        assert_eq!(sched.start(target), Err(SceneError::AlreadyRunning));
    }

    #[test]
    fn failing_frame_is_skipped_and_loop_recovers() {
        let (host, sched, target) = setup(Some(1));
        sched.start(target.clone()).unwrap();
        for _ in 0..4 {
            host.pump(16.0);
        }
        assert_eq!(target.borrow().ticks.len(), 4);
        assert_eq!(sched.skipped_frames(), 1);
        assert_eq!(sched.frames(), 3);
        assert!(sched.is_running());
    }

    #[test]
    fn dropped_target_ends_the_loop() {
        let (host, sched, target) = setup(None);
        sched.start(target.clone()).unwrap();
        drop(target);
        assert_eq!(host.pump(16.0), 1);
        assert_eq!(sched.state(), SchedulerState::Stopped);
        assert_eq!(host.pump(16.0), 0);
    }

    #[test]
    fn restart_resets_the_clock() {
        let (host, sched, target) = setup(None);
        sched.start(target.clone()).unwrap();
        host.pump(500.0);
        sched.stop();
        sched.start(target.clone()).unwrap();
        host.pump(16.0);
        let last = *target.borrow().ticks.last().unwrap();
        assert!((last - 0.016).abs() < 1e-4);
    }
}
