//! Numeric handles handed to the host page, covering mounts whose device is
//! still being created as well as live instances.
//!
//! `C` is whatever the platform attached to the mount point before the device
//! arrived (a canvas on the web). Every operation that needs the [`Stage`]
//! tolerates it being borrowed and leaves the table unchanged when it is.

use std::cell::{Cell, RefCell};

use fnv::FnvHashMap;

use crate::error::SceneError;
use crate::lifecycle::{InstanceHandle, MountId, MountSpec, Stage};
use crate::motion::AnimationProfile;
use crate::render::RenderSurface;

enum Slot<C> {
    /// Output attached, device still on its way.
    Pending {
        mount: MountId,
        output: C,
        profile: AnimationProfile,
    },
    Live(InstanceHandle),
}

/// How [`MountTable::complete`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum MountOutcome {
    Live(InstanceHandle),
    /// Unmounted while pending; the surface was released and detached.
    Cancelled,
    /// The stage was busy or refused the mount; the surface was released and detached.
    Failed(SceneError),
}

pub struct MountTable<C> {
    slots: RefCell<FnvHashMap<u32, Slot<C>>>,
    next_handle: Cell<u32>,
}

impl<C> Default for MountTable<C> {
    fn default() -> Self {
        Self {
            slots: RefCell::new(FnvHashMap::default()),
            next_handle: Cell::new(1),
        }
    }
}

impl<C> MountTable<C> {
    /// Register a mount awaiting its device. Handles are never 0.
    pub fn reserve(&self, mount: MountId, output: C, profile: AnimationProfile) -> u32 {
        let handle = self.next_handle.get();
        self.next_handle.set(handle.wrapping_add(1).max(1));
        self.slots.borrow_mut().insert(
            handle,
            Slot::Pending {
                mount,
                output,
                profile,
            },
        );
        handle
    }

    /// Every handle, pending or live, bound to `mount`.
    pub fn handles_for(&self, mount: MountId) -> Vec<u32> {
        let mut handles: Vec<u32> = self
            .slots
            .borrow()
            .iter()
            .filter(|(_, slot)| match slot {
                Slot::Pending { mount: m, .. } => *m == mount,
                Slot::Live(instance) => instance.mount_id() == mount,
            })
            .map(|(handle, _)| *handle)
            .collect();
        handles.sort_unstable();
        handles
    }

    pub fn is_pending(&self, handle: u32) -> bool {
        matches!(self.slots.borrow().get(&handle), Some(Slot::Pending { .. }))
    }

    pub fn live_handle(&self, handle: u32) -> Option<InstanceHandle> {
        match self.slots.borrow().get(&handle) {
            Some(Slot::Live(instance)) => Some(*instance),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop a pending mount whose device could not be created, returning
    /// its output so the caller can remove it. Live handles are untouched.
    pub fn abandon(&self, handle: u32) -> Option<C> {
        let mut slots = self.slots.borrow_mut();
        if !matches!(slots.get(&handle), Some(Slot::Pending { .. })) {
            return None;
        }
        match slots.remove(&handle) {
            Some(Slot::Pending { output, .. }) => Some(output),
            _ => None,
        }
    }

    /// The device for `handle` arrived: mount it, or release it if the
    /// handle was unmounted in the meantime.
    pub fn complete<S: RenderSurface + 'static>(
        &self,
        stage: &RefCell<Stage<S>>,
        handle: u32,
        mut surface: S,
        spec: MountSpec,
    ) -> MountOutcome {
        let pending = match self.slots.borrow().get(&handle) {
            Some(Slot::Pending { mount, profile, .. }) => Some((*mount, *profile)),
            _ => None,
        };
        let Some((mount, profile)) = pending else {
            discard(&mut surface);
            log::debug!("[mounts] {} cancelled before its device arrived", handle);
            return MountOutcome::Cancelled;
        };

        let mounted = match stage.try_borrow_mut() {
            Ok(mut stage) => stage.mount(mount, surface, spec.with_profile(profile)),
            Err(_) => {
                self.slots.borrow_mut().remove(&handle);
                discard(&mut surface);
                log::error!("[mounts] stage busy; mount {} dropped", handle);
                return MountOutcome::Failed(SceneError::InstanceBusy);
            }
        };
        match mounted {
            Ok(instance) => {
                self.slots.borrow_mut().insert(handle, Slot::Live(instance));
                MountOutcome::Live(instance)
            }
            Err(e) => {
                self.slots.borrow_mut().remove(&handle);
                log::error!("[mounts] mount {:?} failed: {}", mount, e);
                MountOutcome::Failed(e)
            }
        }
    }

    /// Unmount `handle`. A pending output is handed to `remove_output`.
    ///
    /// Returns false for unknown handles, and for live handles while the
    /// stage is busy, in which case the handle stays valid for a retry.
    pub fn unmount<S: RenderSurface + 'static>(
        &self,
        stage: &RefCell<Stage<S>>,
        handle: u32,
        remove_output: impl FnOnce(C),
    ) -> bool {
        let slot = self.slots.borrow_mut().remove(&handle);
        match slot {
            Some(Slot::Pending { output, .. }) => {
                remove_output(output);
                true
            }
            Some(Slot::Live(instance)) => match stage.try_borrow_mut() {
                Ok(mut stage) => stage.unmount(instance),
                Err(_) => {
                    self.slots.borrow_mut().insert(handle, Slot::Live(instance));
                    log::warn!("[mounts] stage busy; unmount {} deferred to caller", handle);
                    false
                }
            },
            None => false,
        }
    }

    /// Remembered for pending handles, applied in place for live ones.
    pub fn set_profile<S: RenderSurface + 'static>(
        &self,
        stage: &RefCell<Stage<S>>,
        handle: u32,
        profile: AnimationProfile,
    ) -> bool {
        let live = {
            let mut slots = self.slots.borrow_mut();
            match slots.get_mut(&handle) {
                Some(Slot::Pending { profile: p, .. }) => {
                    *p = profile;
                    return true;
                }
                Some(Slot::Live(instance)) => *instance,
                None => return false,
            }
        };
        stage
            .try_borrow_mut()
            .map(|mut stage| stage.set_profile(live, profile))
            .unwrap_or(false)
    }
}

fn discard<S: RenderSurface>(surface: &mut S) {
    if let Err(e) = surface.release() {
        log::warn!("[mounts] release failed: {}", e);
    }
    if let Err(e) = surface.detach() {
        log::warn!("[mounts] detach failed: {}", e);
    }
}
