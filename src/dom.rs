use std::cell::Cell;

use halo_core::{MountId, SurfaceSize, ViewportState};
use wasm_bindgen::JsCast;
use web_sys as web;

const MOUNT_ATTR: &str = "data-halo-mount";

thread_local! {
    static NEXT_MOUNT: Cell<u64> = const { Cell::new(1) };
}

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

/// Window inner size in CSS pixels plus the device pixel ratio.
pub fn viewport_state() -> ViewportState {
    match web::window() {
        Some(w) => {
            let width = w.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1.0);
            let height = w.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(1.0);
            ViewportState::new(width as f32, height as f32, w.device_pixel_ratio() as f32)
        }
        None => ViewportState::default(),
    }
}

/// Stable identity of a container, tagged on first use.
pub fn mount_id(container: &web::Element) -> MountId {
    if let Some(id) = container
        .get_attribute(MOUNT_ATTR)
        .and_then(|v| v.parse::<u64>().ok())
    {
        return MountId(id);
    }
    let id = NEXT_MOUNT.with(|n| {
        let id = n.get();
        n.set(id + 1);
        id
    });
    _ = container.set_attribute(MOUNT_ATTR, &id.to_string());
    MountId(id)
}

/// Append a fresh canvas to `container`. `css_size` fixes a square edge;
/// `None` fills the container.
pub fn attach_canvas(
    container: &web::Element,
    css_size: Option<f32>,
) -> anyhow::Result<web::HtmlCanvasElement> {
    let document = window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let canvas: web::HtmlCanvasElement = document
        .create_element("canvas")
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;

    let edge = match css_size {
        Some(px) => format!("{px}px"),
        None => "100%".to_string(),
    };
    let style = canvas.style();
    _ = style.set_property("width", &edge);
    _ = style.set_property("height", &edge);
    _ = style.set_property("display", "block");
    _ = style.set_property("pointer-events", "none");

    container
        .append_child(&canvas)
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
    Ok(canvas)
}

pub fn set_backing_size(canvas: &web::HtmlCanvasElement, size: SurfaceSize) {
    if canvas.width() != size.width {
        canvas.set_width(size.width.max(1));
    }
    if canvas.height() != size.height {
        canvas.set_height(size.height.max(1));
    }
}

#[inline]
pub fn detach_canvas(canvas: &web::HtmlCanvasElement) {
    canvas.remove();
}
