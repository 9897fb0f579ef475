pub(crate) const TOKEN_KEY: &str = "renderer_builder_token";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(crate) fn load_token() -> Option<String> {
    local_storage()?.get_item(TOKEN_KEY).ok().flatten()
}
