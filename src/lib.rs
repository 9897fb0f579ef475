mod api;
mod app;
mod builder;
mod components;
mod logging;
mod models;
mod pages;
mod render;
mod schema;
mod session;
mod state;
mod storage;
mod tree;

use app::App;
use leptos::prelude::*;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    logging::init();
    mount_to_body(App);
}
