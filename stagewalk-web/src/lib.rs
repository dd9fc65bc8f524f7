//! Stagewalk WASM Web Runtime
//!
//! Builds a stage inside the browser and steps it from
//! requestAnimationFrame. The page draws the exported snapshot; this crate
//! owns input, physics, emitters and WebAudio notes.

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod audio;
mod clock;
mod input;
#[cfg(target_arch = "wasm32")]
mod loader;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Entry point, called when the WASM module loads.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
    log::info!("Stagewalk Web Runtime initialized");
}

/// Create a new application instance.
///
/// `stage` is a built-in stage name (`stage1`, `stage2`, `test`) or the
/// text of a stage TOML file the page fetched itself.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn create_app(canvas_id: String, stage: String) -> Result<app::App, JsValue> {
    app::App::new(&canvas_id, &stage)
}

/// Number of floats per instance in `App::snapshot`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn instance_floats() -> usize {
    stagewalk_core::INSTANCE_FLOATS
}
