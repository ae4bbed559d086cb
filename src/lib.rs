#![cfg(target_arch = "wasm32")]
use std::cell::RefCell;
use std::rc::Rc;

use halo_core::{
    AnimationProfile, IconParams, MountId, MountOutcome, MountSpec, MountTable, SceneError, Stage,
    SurfaceSize,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod dom;
mod events;
mod frame;
mod render;

use render::GpuSurface;

struct Runtime {
    stage: Rc<RefCell<Stage<GpuSurface>>>,
    mounts: MountTable<web::HtmlCanvasElement>,
}

thread_local! {
    static RUNTIME: Rc<Runtime> = Rc::new(Runtime::new());
}

#[inline]
fn profile_for(expanded: bool) -> AnimationProfile {
    if expanded {
        AnimationProfile::Expanded
    } else {
        AnimationProfile::Ambient
    }
}

impl Runtime {
    fn new() -> Self {
        let host = frame::RafFrameHost::new();
        Self {
            stage: Rc::new(RefCell::new(Stage::new(host, dom::viewport_state()))),
            mounts: MountTable::default(),
        }
    }

    fn begin_mount(
        self: &Rc<Self>,
        container: &web::Element,
        spec: MountSpec,
        css_size: Option<f32>,
    ) -> Result<u32, SceneError> {
        let mount = dom::mount_id(container);
        self.release_mount_point(mount);

        let canvas = dom::attach_canvas(container, css_size).map_err(|e| {
            log::error!("cannot attach canvas to {:?}: {:?}", mount, e);
            SceneError::MissingSurface(mount.0)
        })?;
        let vp = self.stage.borrow().viewport();
        let size = match css_size {
            Some(edge) => SurfaceSize::from_css(edge, edge, vp.pixel_density),
            None => vp.surface_size(),
        };
        let handle = self.mounts.reserve(mount, canvas.clone(), spec.profile);

        let rt = self.clone();
        spawn_local(async move {
            match GpuSurface::new(canvas, size).await {
                Ok(surface) => {
                    if let MountOutcome::Live(instance) =
                        rt.mounts.complete(&rt.stage, handle, surface, spec)
                    {
                        log::debug!("handle {} live as {:?}", handle, instance);
                    }
                }
                Err(e) => {
                    log::error!("WebGPU init error: {:?}", e);
                    if let Some(canvas) = rt.mounts.abandon(handle) {
                        dom::detach_canvas(&canvas);
                    }
                }
            }
        });
        Ok(handle)
    }

    /// Drop every handle bound to `mount`, pending or live.
    fn release_mount_point(&self, mount: MountId) {
        for handle in self.mounts.handles_for(mount) {
            self.unmount(handle);
        }
    }

    fn unmount(&self, handle: u32) -> bool {
        self.mounts
            .unmount(&self.stage, handle, |canvas| dom::detach_canvas(&canvas))
    }

    fn set_profile(&self, handle: u32, profile: AnimationProfile) -> bool {
        self.mounts.set_profile(&self.stage, handle, profile)
    }
}

fn to_js(e: SceneError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("halo-web starting");

    RUNTIME.with(|rt| {
        events::wire_window_events(&rt.stage);
        frame::start_viewport_loop(rt.stage.clone());
    });
    Ok(())
}

/// Mount the full-viewport background scene into `container`.
#[wasm_bindgen(js_name = mountBackground)]
pub fn mount_background(container: Option<web::Element>) -> Result<u32, JsValue> {
    let container = container.ok_or_else(|| to_js(SceneError::MissingSurface(0)))?;
    RUNTIME
        .with(|rt| rt.begin_mount(&container, MountSpec::background(), None))
        .map_err(to_js)
}

/// Mount a skill icon of `css_size` CSS pixels into `container`.
#[wasm_bindgen(js_name = mountIcon)]
pub fn mount_icon(
    container: Option<web::Element>,
    identifier: &str,
    css_size: f32,
    expanded: bool,
) -> Result<u32, JsValue> {
    let container = container.ok_or_else(|| to_js(SceneError::MissingSurface(0)))?;
    let params = IconParams {
        css_size,
        ..IconParams::default()
    };
    let spec = MountSpec::icon_with(identifier, params).with_profile(profile_for(expanded));
    RUNTIME
        .with(|rt| rt.begin_mount(&container, spec, Some(css_size)))
        .map_err(to_js)
}

#[wasm_bindgen(js_name = setProfile)]
pub fn set_profile(handle: u32, expanded: bool) -> bool {
    RUNTIME.with(|rt| rt.set_profile(handle, profile_for(expanded)))
}

#[wasm_bindgen]
pub fn unmount(handle: u32) -> bool {
    RUNTIME.with(|rt| rt.unmount(handle))
}

#[wasm_bindgen(js_name = liveInstances)]
pub fn live_instances() -> u32 {
    RUNTIME.with(|rt| {
        rt.stage
            .try_borrow()
            .map(|stage| stage.live_instances() as u32)
            .unwrap_or(0)
    })
}
