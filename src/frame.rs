use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use fnv::FnvHashMap;
use halo_core::{FrameCallback, FrameHost, FrameId, Stage};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

use crate::render::GpuSurface;

type RafClosure = Closure<dyn FnMut(f64)>;

struct RafInner {
    next_key: Cell<u64>,
    /// Requested and not yet fired: raf id plus the closure JS will call.
    live: RefCell<FnvHashMap<u64, (i32, RafClosure)>>,
    /// Fired closures. A closure cannot be dropped while it runs, so the
    /// one that just fired parks here until the next one fires.
    retired: RefCell<Vec<RafClosure>>,
}

impl RafInner {
    fn retire(&self, key: u64) {
        let fired = self.live.borrow_mut().remove(&key);
        let mut retired = self.retired.borrow_mut();
        retired.clear();
        if let Some((_, closure)) = fired {
            retired.push(closure);
        }
    }
}

impl Drop for RafInner {
    fn drop(&mut self) {
        let live = std::mem::take(self.live.get_mut());
        if let Some(w) = web::window() {
            for (raf_id, _) in live.values() {
                _ = w.cancel_animation_frame(*raf_id);
            }
        }
    }
}

/// `FrameHost` over `requestAnimationFrame`.
pub struct RafFrameHost {
    inner: Rc<RafInner>,
}

impl RafFrameHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            inner: Rc::new(RafInner {
                next_key: Cell::new(1),
                live: RefCell::new(FnvHashMap::default()),
                retired: RefCell::new(Vec::new()),
            }),
        })
    }
}

impl FrameHost for RafFrameHost {
    fn request_frame(&self, callback: FrameCallback) -> FrameId {
        let key = self.inner.next_key.get();
        self.inner.next_key.set(key + 1);

        let weak: Weak<RafInner> = Rc::downgrade(&self.inner);
        let closure: RafClosure = Closure::once(move |timestamp: f64| {
            if let Some(inner) = weak.upgrade() {
                inner.retire(key);
            }
            callback(timestamp);
        });

        let requested = web::window()
            .ok_or_else(|| wasm_bindgen::JsValue::from_str("no window"))
            .and_then(|w| w.request_animation_frame(closure.as_ref().unchecked_ref()));
        match requested {
            Ok(raf_id) => {
                self.inner.live.borrow_mut().insert(key, (raf_id, closure));
            }
            Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
        }
        FrameId(key)
    }

    fn cancel_frame(&self, id: FrameId) {
        let entry = self.inner.live.borrow_mut().remove(&id.0);
        if let Some((raf_id, _closure)) = entry {
            if let Some(w) = web::window() {
                _ = w.cancel_animation_frame(raf_id);
            }
        }
    }

    fn now(&self) -> f64 {
        web::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }
}

/// Page-level loop that delivers debounced resizes once per frame.
pub fn start_viewport_loop(stage: Rc<RefCell<Stage<GpuSurface>>>) {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        match stage.try_borrow_mut() {
            Ok(mut stage) => {
                if stage.flush_viewport() {
                    log::debug!("[viewport] {:?}", stage.viewport());
                }
            }
            Err(_) => log::warn!("stage busy; viewport flush deferred"),
        }
        request_tick(&tick_clone);
    }) as Box<dyn FnMut()>));
    request_tick(&tick);
}

fn request_tick(tick: &Rc<RefCell<Option<Closure<dyn FnMut()>>>>) {
    if let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref()) {
        _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}
