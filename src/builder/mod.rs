//! The page-builder editing surface.

mod attributes;
mod canvas;
mod create_dialog;
mod fields;
mod table_editor;

use crate::api::ApiClient;
use crate::components::ui::ErrorAlert;
use crate::models::Tree;
use crate::render::render;
use crate::session::{Edit, EditorSession};
use attributes::AttributesDrawer;
use canvas::CanvasNode;
use create_dialog::CreateNodeDialog;
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use table_editor::TableEditor;
use wasm_bindgen::JsCast;

/// Shared by every part of one builder instance.
#[derive(Clone, Copy)]
pub(crate) struct BuilderContext {
    pub session: RwSignal<EditorSession>,
    pub api_client: RwSignal<ApiClient>,
    /// Last rejected or failed edit, shown next to the open panel.
    pub edit_error: RwSignal<Option<String>>,
}

impl BuilderContext {
    pub fn saving(&self) -> Signal<bool> {
        let session = self.session;
        Signal::derive(move || session.with(EditorSession::is_saving))
    }

    /// Run `edit` through the session: compute now, save, then commit.
    pub fn submit(&self, edit: Edit) {
        let session = self.session;
        let edit_error = self.edit_error;

        let Some(begun) = session.try_update(|s| s.begin(edit)) else {
            return;
        };
        let pending = match begun {
            Ok(p) => p,
            Err(e) => {
                edit_error.set(Some(e.to_string()));
                return;
            }
        };
        edit_error.set(None);

        let api_client = self.api_client.get_untracked();
        spawn_local(async move {
            let saved = pending.save(&api_client).await;
            // The builder may have been unmounted while the save ran.
            if let Some(Err(e)) = session.try_update(|s| s.finish(pending, saved)) {
                let _ = edit_error.try_set(Some(e.to_string()));
            }
        });
    }
}

/// Write `text` to the system clipboard. Returns false when the API is
/// unavailable (e.g. an insecure context).
pub(crate) fn copy_to_clipboard(text: &str) -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let navigator = window.navigator();
    let Ok(clipboard) = js_sys::Reflect::get(&navigator, &"clipboard".into()) else {
        return false;
    };
    if clipboard.is_undefined() {
        return false;
    }
    let Ok(write_text) = js_sys::Reflect::get(&clipboard, &"writeText".into()) else {
        return false;
    };
    match write_text.dyn_ref::<js_sys::Function>() {
        Some(f) => f.call1(&clipboard, &text.into()).is_ok(),
        None => false,
    }
}

#[component]
pub(crate) fn RendererBuilder(tree: Tree, #[prop(into)] api_client: RwSignal<ApiClient>) -> impl IntoView {
    tracing::info!(renderer_id = %tree.id, nodes = tree.len(), "opening builder");

    let ctx = BuilderContext {
        session: RwSignal::new(EditorSession::new(tree)),
        api_client,
        edit_error: RwSignal::new(None),
    };
    provide_context(ctx);

    // Esc closes whatever panel is open.
    let key_handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        if ev.key() != "Escape" {
            return;
        }
        if ctx.session.try_update(EditorSession::dismiss_panels) == Some(true) {
            let _ = ctx.edit_error.try_set(None);
        }
    });
    on_cleanup(move || key_handle.remove());

    let canvas = move || {
        let view = ctx.session.with(|s| render(s.tree(), &s.tree().root_id));
        view! { <CanvasNode node=view /> }
    };

    view! {
        <div class="flex h-full w-full flex-col gap-3 p-4">
            <Show
                when=move || {
                    !ctx.session.with(|s| {
                        s.registers.create.is_open()
                            || s.registers.attributes.is_open()
                            || s.registers.table_editor.is_open()
                    })
                }
                fallback=|| ().into_view()
            >
                <ErrorAlert message=ctx.edit_error />
            </Show>
            <div class="min-h-64 rounded-md border border-border bg-background p-3">{canvas}</div>
            <CreateNodeDialog />
            <AttributesDrawer />
            <TableEditor />
        </div>
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::models::{Attributes, Node, NodeKind};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn press_escape() {
        let init = web_sys::KeyboardEventInit::new();
        init.set_key("Escape");
        let ev = web_sys::KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init)
            .expect("keyboard event");
        web_sys::window()
            .expect("window")
            .dispatch_event(&ev)
            .expect("dispatch");
    }

    #[wasm_bindgen_test]
    fn test_escape_after_builder_is_dropped() {
        let owner = Owner::new();
        owner.with(|| {
            let tree = Tree::with_root("r-1", Node::with_id("root", NodeKind::Container, Attributes::new()));
            let api_client = RwSignal::new(ApiClient {
                base_url: "http://localhost:3333".to_string(),
                token: None,
            });
            let _ = view! { <RendererBuilder tree=tree api_client=api_client /> };
        });
        press_escape();
        owner.cleanup();

        // A second builder replacing the first must not see the old listener.
        let next = Owner::new();
        next.with(|| {
            let tree = Tree::with_root("r-2", Node::with_id("root", NodeKind::Container, Attributes::new()));
            let api_client = RwSignal::new(ApiClient {
                base_url: "http://localhost:3333".to_string(),
                token: None,
            });
            let _ = view! { <RendererBuilder tree=tree api_client=api_client /> };
        });
        press_escape();
        next.cleanup();
        press_escape();
    }
}
