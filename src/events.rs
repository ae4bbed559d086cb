use std::cell::RefCell;
use std::rc::Rc;

use halo_core::Stage;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

use crate::dom;
use crate::render::GpuSurface;

type SharedStage = Rc<RefCell<Stage<GpuSurface>>>;

/// Forward window pointer, scroll and resize events to the stage.
pub fn wire_window_events(stage: &SharedStage) {
    let Some(window) = web::window() else {
        log::warn!("no window; input events not wired");
        return;
    };
    wire_pointermove(&window, stage);
    wire_scroll(&window, stage);
    wire_resize(&window, stage);
}

fn wire_pointermove(window: &web::Window, stage: &SharedStage) {
    let stage = stage.clone();
    let closure = Closure::wrap(Box::new(move |ev: web::PointerEvent| {
        if let Ok(mut stage) = stage.try_borrow_mut() {
            stage.pointer_moved(ev.client_x() as f32, ev.client_y() as f32);
        }
    }) as Box<dyn FnMut(web::PointerEvent)>);
    _ = window.add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn wire_scroll(window: &web::Window, stage: &SharedStage) {
    let stage = stage.clone();
    let closure = Closure::wrap(Box::new(move || {
        let Some(w) = web::window() else { return };
        let offset = w.scroll_y().unwrap_or(0.0);
        if let Ok(mut stage) = stage.try_borrow_mut() {
            stage.scrolled(offset as f32);
        }
    }) as Box<dyn FnMut()>);
    _ = window.add_event_listener_with_callback("scroll", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn wire_resize(window: &web::Window, stage: &SharedStage) {
    let stage = stage.clone();
    let closure = Closure::wrap(Box::new(move || {
        let state = dom::viewport_state();
        match stage.try_borrow_mut() {
            Ok(mut stage) => stage.resize(state),
            Err(_) => log::warn!("stage busy; resize to {}x{} dropped", state.width, state.height),
        }
    }) as Box<dyn FnMut()>);
    _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
    closure.forget();
}
