//! Host viewport tracking with per-frame debounced resize notifications.

use crate::constants::MAX_PIXEL_DENSITY;

/// Host window drawable area in CSS pixels plus the device pixel ratio.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportState {
    pub width: f32,
    pub height: f32,
    pub pixel_density: f32,
}

impl ViewportState {
    #[inline]
    pub const fn new(width: f32, height: f32, pixel_density: f32) -> Self {
        Self {
            width,
            height,
            pixel_density,
        }
    }

    #[inline]
    pub fn aspect(self) -> f32 {
        self.width.max(1.0) / self.height.max(1.0)
    }

    /// Physical surface size for the whole viewport.
    #[inline]
    pub fn surface_size(self) -> SurfaceSize {
        SurfaceSize::from_css(self.width, self.height, self.pixel_density)
    }
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

/// Physical pixel size of a device surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    /// Scale a CSS size by the pixel density, capped at [`MAX_PIXEL_DENSITY`].
    ///
    /// A density that is not a positive finite number counts as 1.0. The
    /// result is never zero in either dimension.
    pub fn from_css(css_width: f32, css_height: f32, pixel_density: f32) -> Self {
        let density = clamp_pixel_density(pixel_density);
        let px = |css: f32| -> u32 {
            if css.is_finite() && css > 0.0 {
                ((css * density).round() as u32).max(1)
            } else {
                1
            }
        };
        Self {
            width: px(css_width),
            height: px(css_height),
        }
    }

    #[inline]
    pub fn aspect(self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

#[inline]
pub fn clamp_pixel_density(pixel_density: f32) -> f32 {
    if pixel_density.is_finite() && pixel_density > 0.0 {
        pixel_density.min(MAX_PIXEL_DENSITY)
    } else {
        1.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ResizeListener = Box<dyn FnMut(ViewportState)>;

/// Owns the current [`ViewportState`] and fans resize notifications out to
/// listeners at most once per animation frame.
///
/// The host calls [`notify_resize`](Self::notify_resize) from its resize
/// event and [`flush`](Self::flush) once per animation frame.
pub struct ViewportAdapter {
    current: ViewportState,
    pending: Option<ViewportState>,
    listeners: Vec<(ListenerId, ResizeListener)>,
    next_listener: u64,
}

impl ViewportAdapter {
    pub fn new(initial: ViewportState) -> Self {
        Self {
            current: initial,
            pending: None,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    #[inline]
    pub fn current_size(&self) -> ViewportState {
        self.current
    }

    pub fn on_resize(&mut self, callback: impl FnMut(ViewportState) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(callback)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Record the latest host size. Last value wins until the next flush.
    pub fn notify_resize(&mut self, state: ViewportState) {
        self.pending = Some(state);
    }

    #[inline]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Deliver the pending size (if any and if it differs) to all listeners.
    pub fn flush(&mut self) -> bool {
        let Some(next) = self.pending.take() else {
            return false;
        };
        if next == self.current {
            return false;
        }
        self.current = next;
        log::debug!(
            "[viewport] {}x{} @{:.2}",
            next.width,
            next.height,
            next.pixel_density
        );
        for (_, listener) in self.listeners.iter_mut() {
            listener(next);
        }
        true
    }
}
