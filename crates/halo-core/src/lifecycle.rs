//! Instance lifecycle: one render context + scene graph + scheduler per mount
//! point, created on mount and released on unmount.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use fnv::FnvHashMap;

use crate::camera::ContextKind;
use crate::config::{BackgroundParams, IconParams};
use crate::error::SceneError;
use crate::input::{InputState, PointerTracker};
use crate::motion::{self, AnimationProfile, MotionState};
use crate::render::{ContextId, ContextLedger, ContextOptions, RenderContext, RenderSurface};
use crate::scene::{build_background, build_icon, SceneGraph, SceneRig};
use crate::scheduler::{FrameHost, FrameTarget, Scheduler, SchedulerState};
use crate::viewport::{ListenerId, SurfaceSize, ViewportAdapter, ViewportState};

/// Identity of a host mount point (the element a canvas is attached to).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MountId(pub u64);

/// Returned by [`Stage::mount`]; only good for `set_profile` and `unmount`.
///
/// A handle goes stale once its mount point is remounted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceHandle {
    mount: MountId,
    generation: u64,
}

impl InstanceHandle {
    #[inline]
    pub fn mount_id(self) -> MountId {
        self.mount
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SceneSpec {
    Background(BackgroundParams),
    Icon {
        identifier: String,
        params: IconParams,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct MountSpec {
    pub scene: SceneSpec,
    pub profile: AnimationProfile,
}

impl MountSpec {
    pub fn background() -> Self {
        Self::background_with(BackgroundParams::default())
    }

    pub fn background_with(params: BackgroundParams) -> Self {
        Self {
            scene: SceneSpec::Background(params),
            profile: AnimationProfile::Ambient,
        }
    }

    pub fn icon(identifier: impl Into<String>) -> Self {
        Self::icon_with(identifier, IconParams::default())
    }

    pub fn icon_with(identifier: impl Into<String>, params: IconParams) -> Self {
        Self {
            scene: SceneSpec::Icon {
                identifier: identifier.into(),
                params,
            },
            profile: AnimationProfile::Ambient,
        }
    }

    pub fn with_profile(mut self, profile: AnimationProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn context_kind(&self) -> ContextKind {
        match self.scene {
            SceneSpec::Background(_) => ContextKind::Background,
            SceneSpec::Icon { .. } => ContextKind::Icon,
        }
    }
}

/// Snapshot of a live instance, for diagnostics and tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstanceInfo {
    pub context: ContextId,
    pub kind: ContextKind,
    pub surface: SurfaceSize,
    pub aspect: f32,
    pub profile: AnimationProfile,
    pub scheduler: SchedulerState,
    pub elapsed: f32,
    pub frames: u64,
    pub spin_phase: f32,
}

/// State the stage writes without borrowing the record.
#[derive(Default)]
struct Controls {
    profile: Cell<AnimationProfile>,
    resize: Cell<Option<ViewportState>>,
}

struct InstanceRecord<S: RenderSurface> {
    mount: MountId,
    context: RenderContext<S>,
    scene: SceneGraph,
    rig: SceneRig,
    input: InputState,
    motion: MotionState,
    /// Icons keep their CSS edge across viewport changes; `None` follows the viewport.
    css_size: Option<f32>,
    pointer: Rc<RefCell<PointerTracker>>,
    controls: Rc<Controls>,
}

impl<S: RenderSurface> InstanceRecord<S> {
    fn surface_size_for(&self, vp: ViewportState) -> SurfaceSize {
        target_size(self.css_size, vp)
    }
}

impl<S: RenderSurface> FrameTarget for InstanceRecord<S> {
    fn frame(&mut self, elapsed: f32) -> Result<(), SceneError> {
        if self.context.is_disposed() {
            return Ok(());
        }
        if let Some(vp) = self.controls.resize.take() {
            let size = self.surface_size_for(vp);
            self.context.resize(size);
        }
        {
            let pointer = self
                .pointer
                .try_borrow()
                .map_err(|_| SceneError::InstanceBusy)?;
            self.input.tick(&pointer, elapsed);
        }
        let profile = self.controls.profile.get();
        motion::apply(&mut self.scene, &self.rig, &self.input, profile, &mut self.motion)?;
        self.context.draw(&self.scene)?;
        Ok(())
    }
}

fn target_size(css_size: Option<f32>, vp: ViewportState) -> SurfaceSize {
    match css_size {
        Some(edge) => SurfaceSize::from_css(edge, edge, vp.pixel_density),
        None => vp.surface_size(),
    }
}

struct Entry<S: RenderSurface> {
    generation: u64,
    record: Rc<RefCell<InstanceRecord<S>>>,
    scheduler: Scheduler,
    controls: Rc<Controls>,
}

type Records<S> = Rc<RefCell<FnvHashMap<MountId, Entry<S>>>>;

/// Owns every live instance on the page.
pub struct Stage<S: RenderSurface + 'static> {
    host: Rc<dyn FrameHost>,
    viewport: ViewportAdapter,
    pointer: Rc<RefCell<PointerTracker>>,
    ledger: ContextLedger,
    records: Records<S>,
    next_generation: u64,
}

impl<S: RenderSurface + 'static> Stage<S> {
    pub fn new(host: Rc<dyn FrameHost>, viewport: ViewportState) -> Self {
        let records: Records<S> = Rc::new(RefCell::new(FnvHashMap::default()));
        let mut adapter = ViewportAdapter::new(viewport);
        let fan_out = records.clone();
        adapter.on_resize(move |vp| {
            for entry in fan_out.borrow().values() {
                entry.controls.resize.set(Some(vp));
            }
        });
        Self {
            host,
            viewport: adapter,
            pointer: Rc::new(RefCell::new(PointerTracker::default())),
            ledger: ContextLedger::default(),
            records,
            next_generation: 1,
        }
    }

    /// Build context, scene and scheduler for `mount` and start animating.
    ///
    /// An existing instance on the same mount point is torn down first.
    pub fn mount(
        &mut self,
        mount: MountId,
        surface: S,
        spec: MountSpec,
    ) -> Result<InstanceHandle, SceneError> {
        let previous = self.records.borrow_mut().remove(&mount);
        if let Some(old) = previous {
            log::info!("[stage] remounting {:?}", mount);
            teardown(mount, old);
        }

        let vp = self.viewport.current_size();
        let kind = spec.context_kind();
        let (scene, rig, css_size) = match &spec.scene {
            SceneSpec::Background(params) => {
                let (scene, rig) = build_background(params);
                (scene, rig, None)
            }
            SceneSpec::Icon { identifier, params } => {
                let (scene, rig) = build_icon(identifier, params);
                (scene, rig, Some(params.css_size))
            }
        };
        let context = RenderContext::create(
            surface,
            target_size(css_size, vp),
            ContextOptions {
                kind,
                transparent_background: true,
            },
            &self.ledger,
        );

        let controls = Rc::new(Controls::default());
        controls.profile.set(spec.profile);
        let record = Rc::new(RefCell::new(InstanceRecord {
            mount,
            context,
            scene,
            rig,
            input: InputState::default(),
            motion: MotionState::with_float_offset(float_offset(mount)),
            css_size,
            pointer: self.pointer.clone(),
            controls: controls.clone(),
        }));

        let scheduler = Scheduler::new(self.host.clone());
        scheduler.start(record.clone())?;

        let generation = self.next_generation;
        self.next_generation += 1;
        self.records.borrow_mut().insert(
            mount,
            Entry {
                generation,
                record,
                scheduler,
                controls,
            },
        );
        log::info!("[stage] mounted {:?} as {:?} ({:?})", mount, kind, spec.profile);
        Ok(InstanceHandle { mount, generation })
    }

    /// Stop and release an instance. Idempotent; stale handles are ignored.
    pub fn unmount(&mut self, handle: InstanceHandle) -> bool {
        let entry = {
            let mut records = self.records.borrow_mut();
            match records.get(&handle.mount) {
                Some(e) if e.generation == handle.generation => records.remove(&handle.mount),
                _ => None,
            }
        };
        match entry {
            Some(entry) => {
                teardown(handle.mount, entry);
                log::info!("[stage] unmounted {:?}", handle.mount);
                true
            }
            None => false,
        }
    }

    pub fn unmount_all(&mut self) {
        let drained: Vec<_> = self.records.borrow_mut().drain().collect();
        for (mount, entry) in drained {
            teardown(mount, entry);
        }
    }

    /// Switch motion coefficients in place. Nothing is recreated.
    pub fn set_profile(&mut self, handle: InstanceHandle, profile: AnimationProfile) -> bool {
        let records = self.records.borrow();
        match records.get(&handle.mount) {
            Some(e) if e.generation == handle.generation => {
                if e.controls.profile.replace(profile) != profile {
                    log::debug!("[stage] {:?} -> {:?}", handle.mount, profile);
                }
                true
            }
            _ => false,
        }
    }

    pub fn pointer_moved(&mut self, client_x: f32, client_y: f32) {
        let vp = self.viewport.current_size();
        self.pointer.borrow_mut().set_pointer(client_x, client_y, &vp);
    }

    pub fn scrolled(&mut self, offset_y: f32) {
        self.pointer.borrow_mut().set_scroll(offset_y);
    }

    /// Record a host resize; delivered on the next [`flush_viewport`](Self::flush_viewport).
    pub fn resize(&mut self, state: ViewportState) {
        self.viewport.notify_resize(state);
    }

    /// Call once per animation frame. Queues the latest size on every
    /// instance; each applies it at the start of its next tick.
    pub fn flush_viewport(&mut self) -> bool {
        self.viewport.flush()
    }

    pub fn on_resize(&mut self, callback: impl FnMut(ViewportState) + 'static) -> ListenerId {
        self.viewport.on_resize(callback)
    }

    #[inline]
    pub fn viewport(&self) -> ViewportState {
        self.viewport.current_size()
    }

    pub fn live_instances(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn active_schedulers(&self) -> usize {
        self.records
            .borrow()
            .values()
            .filter(|e| e.scheduler.is_running())
            .count()
    }

    /// Contexts created and not yet disposed, across all mounts.
    #[inline]
    pub fn live_contexts(&self) -> usize {
        self.ledger.live()
    }

    pub fn is_live(&self, handle: InstanceHandle) -> bool {
        matches!(
            self.records.borrow().get(&handle.mount),
            Some(e) if e.generation == handle.generation
        )
    }

    pub fn info(&self, handle: InstanceHandle) -> Option<InstanceInfo> {
        let records = self.records.borrow();
        let entry = records.get(&handle.mount)?;
        if entry.generation != handle.generation {
            return None;
        }
        let record = entry.record.try_borrow().ok()?;
        Some(InstanceInfo {
            context: record.context.id(),
            kind: record.context.kind(),
            surface: record.context.size(),
            aspect: record.context.camera().aspect,
            profile: entry.controls.profile.get(),
            scheduler: entry.scheduler.state(),
            elapsed: record.input.elapsed,
            frames: entry.scheduler.frames(),
            spin_phase: record.motion.spin_phase,
        })
    }
}

impl<S: RenderSurface + 'static> Drop for Stage<S> {
    fn drop(&mut self) {
        self.unmount_all();
    }
}

/// Scheduler stop, then device release, then surface detach.
fn teardown<S: RenderSurface>(mount: MountId, entry: Entry<S>) {
    entry.scheduler.stop();
    match entry.record.try_borrow_mut() {
        Ok(mut record) => {
            debug_assert_eq!(record.mount, mount);
            record.context.dispose();
        }
        // Torn down from inside its own frame; the context is disposed when
        // the frame drops its last reference.
        Err(_) => log::warn!("[stage] {:?} busy during unmount; deferring release", mount),
    }
}

/// Stable per-mount phase offset so icons on one page don't bob in unison.
fn float_offset(mount: MountId) -> f32 {
    let mix = mount.0.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    (mix >> 40) as f32 / (1u64 << 24) as f32 * 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::error::RenderError;
    use crate::scheduler::{FrameCallback, FrameId};

    #[derive(Default)]
    struct NullHost {
        next: Cell<u64>,
        queued: RefCell<Vec<(u64, FrameCallback)>>,
    }

    impl FrameHost for NullHost {
        fn request_frame(&self, callback: FrameCallback) -> FrameId {
            let id = self.next.get();
            self.next.set(id + 1);
            self.queued.borrow_mut().push((id, callback));
            FrameId(id)
        }
        fn cancel_frame(&self, id: FrameId) {
            self.queued.borrow_mut().retain(|(q, _)| *q != id.0);
        }
        fn now(&self) -> f64 {
            0.0
        }
    }

    struct Nop;

    impl RenderSurface for Nop {
        fn set_transparent(&mut self, _: bool) {}
        fn resize(&mut self, _: SurfaceSize) {}
        fn draw(&mut self, _: &Camera, _: &SceneGraph) -> Result<(), RenderError> {
            Ok(())
        }
        fn release(&mut self) -> Result<(), RenderError> {
            Ok(())
        }
        fn detach(&mut self) -> Result<(), RenderError> {
            Ok(())
        }
    }

    #[test]
    fn float_offsets_differ_per_mount_and_stay_bounded() {
        let a = float_offset(MountId(1));
        let b = float_offset(MountId(2));
        assert_ne!(a, b);
        for id in 0..64 {
            let o = float_offset(MountId(id));
            assert!((0.0..10.0).contains(&o));
        }
    }

    #[test]
    fn remount_replaces_and_stales_the_old_handle() {
        let host = Rc::new(NullHost::default());
        let mut stage: Stage<Nop> = Stage::new(host.clone(), ViewportState::new(800.0, 600.0, 1.0));
        let first = stage.mount(MountId(7), Nop, MountSpec::icon("react")).unwrap();
        let second = stage.mount(MountId(7), Nop, MountSpec::icon("css")).unwrap();

        assert_eq!(stage.live_instances(), 1);
        assert_eq!(stage.live_contexts(), 1);
        assert_eq!(host.queued.borrow().len(), 1);
        assert!(!stage.is_live(first));
        assert!(!stage.unmount(first));
        assert!(!stage.set_profile(first, AnimationProfile::Expanded));
        assert!(stage.unmount(second));
        assert_eq!(stage.live_contexts(), 0);
        assert!(host.queued.borrow().is_empty());
    }

    #[test]
    fn icons_keep_css_size_and_track_density() {
        let vp = ViewportState::new(1000.0, 500.0, 3.0);
        assert_eq!(target_size(Some(120.0), vp), SurfaceSize { width: 240, height: 240 });
        assert_eq!(target_size(None, vp), SurfaceSize { width: 2000, height: 1000 });
    }
}
