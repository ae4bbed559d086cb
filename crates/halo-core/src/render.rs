//! Render context: a camera plus one exclusively owned device surface.
//!
//! Platforms implement [`RenderSurface`]; [`RenderContext`] enforces the
//! contract around it (pixel-density cap, in-place resize, draw after
//! dispose as a logged no-op, release-then-detach exactly once).

use std::cell::Cell;
use std::rc::Rc;

use crate::camera::{Camera, ContextKind};
use crate::error::RenderError;
use crate::scene::SceneGraph;
use crate::viewport::SurfaceSize;

/// Device-backed drawing surface provided by the platform layer.
pub trait RenderSurface {
    /// Clear to transparent so the page shows through, or to opaque black.
    fn set_transparent(&mut self, transparent: bool);
    /// Resize the output in place. Must not reallocate the device.
    fn resize(&mut self, size: SurfaceSize);
    /// Submit every drawable of `scene` for one frame.
    fn draw(&mut self, camera: &Camera, scene: &SceneGraph) -> Result<(), RenderError>;
    /// Release GPU resources.
    fn release(&mut self) -> Result<(), RenderError>;
    /// Remove the output from its mount point.
    fn detach(&mut self) -> Result<(), RenderError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

/// Counts live render contexts so leaks can be observed.
#[derive(Clone, Default)]
pub struct ContextLedger {
    live: Rc<Cell<usize>>,
    next_id: Rc<Cell<u64>>,
}

impl ContextLedger {
    #[inline]
    pub fn live(&self) -> usize {
        self.live.get()
    }

    fn open(&self) -> ContextId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.live.set(self.live.get() + 1);
        ContextId(id)
    }

    fn close(&self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

/// Options fixed at context creation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContextOptions {
    pub kind: ContextKind,
    pub transparent_background: bool,
}

pub struct RenderContext<S: RenderSurface> {
    id: ContextId,
    kind: ContextKind,
    transparent_background: bool,
    camera: Camera,
    size: SurfaceSize,
    surface: S,
    disposed: bool,
    ledger: ContextLedger,
}

impl<S: RenderSurface> RenderContext<S> {
    /// Wrap an allocated surface. `size` is already density-scaled (see
    /// [`SurfaceSize::from_css`]).
    pub fn create(
        mut surface: S,
        size: SurfaceSize,
        options: ContextOptions,
        ledger: &ContextLedger,
    ) -> Self {
        surface.set_transparent(options.transparent_background);
        surface.resize(size);
        let id = ledger.open();
        log::debug!(
            "[render] context {:?} ({:?}) {}x{}",
            id,
            options.kind,
            size.width,
            size.height
        );
        Self {
            id,
            kind: options.kind,
            transparent_background: options.transparent_background,
            camera: Camera::for_kind(options.kind, size.aspect()),
            size,
            surface,
            disposed: false,
            ledger: ledger.clone(),
        }
    }

    #[inline]
    pub fn id(&self) -> ContextId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    #[inline]
    pub fn transparent_background(&self) -> bool {
        self.transparent_background
    }

    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[inline]
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    #[inline]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Update aspect ratio and surface dimensions in place.
    pub fn resize(&mut self, size: SurfaceSize) {
        if self.disposed || size == self.size {
            return;
        }
        self.size = size;
        self.camera.set_aspect(size.aspect());
        self.surface.resize(size);
    }

    pub fn draw(&mut self, scene: &SceneGraph) -> Result<(), RenderError> {
        if self.disposed {
            log::warn!("[render] draw on disposed context {:?} ignored", self.id);
            return Ok(());
        }
        self.surface.draw(&self.camera, scene)
    }

    /// Release the device, then detach the output. Runs once; both steps
    /// always run.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Err(e) = self.surface.release() {
            log::warn!("[render] release failed for {:?}: {}", self.id, e);
        }
        if let Err(e) = self.surface.detach() {
            log::warn!("[render] detach failed for {:?}: {}", self.id, e);
        }
        self.ledger.close();
        log::debug!("[render] context {:?} disposed", self.id);
    }
}

impl<S: RenderSurface> Drop for RenderContext<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IconParams;
    use crate::scene::build_icon;

    #[derive(Default)]
    struct Probe {
        calls: Vec<&'static str>,
        size: Option<SurfaceSize>,
        transparent: Option<bool>,
        fail_release: bool,
    }

    impl RenderSurface for Probe {
        fn set_transparent(&mut self, transparent: bool) {
            self.transparent = Some(transparent);
        }
        fn resize(&mut self, size: SurfaceSize) {
            self.calls.push("resize");
            self.size = Some(size);
        }
        fn draw(&mut self, _: &Camera, _: &SceneGraph) -> Result<(), RenderError> {
            self.calls.push("draw");
            Ok(())
        }
        fn release(&mut self) -> Result<(), RenderError> {
            self.calls.push("release");
            if self.fail_release {
                return Err(RenderError::Backend("boom".into()));
            }
            Ok(())
        }
        fn detach(&mut self) -> Result<(), RenderError> {
            self.calls.push("detach");
            Ok(())
        }
    }

    fn icon_opts() -> ContextOptions {
        ContextOptions {
            kind: ContextKind::Icon,
            transparent_background: true,
        }
    }

    #[test]
    fn dispose_runs_once_and_detaches_even_if_release_fails() {
        let ledger = ContextLedger::default();
        let probe = Probe {
            fail_release: true,
            ..Probe::default()
        };
        let size = SurfaceSize { width: 10, height: 10 };
        let mut ctx = RenderContext::create(probe, size, icon_opts(), &ledger);
        assert_eq!(ledger.live(), 1);
        ctx.dispose();
        ctx.dispose();
        assert_eq!(ledger.live(), 0);
        assert_eq!(ctx.surface().calls, vec!["resize", "release", "detach"]);
    }

    #[test]
    fn draw_after_dispose_is_a_no_op() {
        let ledger = ContextLedger::default();
        let (scene, _) = build_icon("html", &IconParams::default());
        let size = SurfaceSize { width: 4, height: 4 };
        let mut ctx = RenderContext::create(Probe::default(), size, icon_opts(), &ledger);
        ctx.draw(&scene).unwrap();
        ctx.dispose();
        assert!(ctx.draw(&scene).is_ok());
        let draws = ctx.surface().calls.iter().filter(|c| **c == "draw").count();
        assert_eq!(draws, 1);
    }

    #[test]
    fn resize_keeps_identity_and_updates_aspect() {
        let ledger = ContextLedger::default();
        let mut ctx = RenderContext::create(
            Probe::default(),
            SurfaceSize { width: 100, height: 100 },
            ContextOptions {
                kind: ContextKind::Background,
                transparent_background: false,
            },
            &ledger,
        );
        assert_eq!(ctx.surface().transparent, Some(false));
        assert!(!ctx.transparent_background());
        let id = ctx.id();
        ctx.resize(SurfaceSize { width: 200, height: 100 });
        assert_eq!(ctx.id(), id);
        assert!((ctx.camera().aspect - 2.0).abs() < 1e-6);
        assert_eq!(ctx.surface().size, Some(SurfaceSize { width: 200, height: 100 }));
    }

    #[test]
    fn transparency_reaches_the_surface_before_first_resize() {
        let ledger = ContextLedger::default();
        let size = SurfaceSize { width: 8, height: 8 };
        let ctx = RenderContext::create(Probe::default(), size, icon_opts(), &ledger);
        assert_eq!(ctx.surface().transparent, Some(true));
        assert!(ctx.transparent_background());
        assert_eq!(ctx.surface().calls, vec!["resize"]);
    }

    #[test]
    fn dropping_a_context_releases_it() {
        let ledger = ContextLedger::default();
        {
            let size = SurfaceSize { width: 1, height: 1 };
            let _ctx = RenderContext::create(Probe::default(), size, icon_opts(), &ledger);
            assert_eq!(ledger.live(), 1);
        }
        assert_eq!(ledger.live(), 0);
    }
}
