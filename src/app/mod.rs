use crate::pages::{HomePage, LayoutBuilderPage, RendererBuilderPage, RouteBuilderPage};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new()));

    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("layouts/:layout_id") view=LayoutBuilderPage />
                <Route path=path!("routes/:route_id") view=RouteBuilderPage />
                <Route path=path!("renderers/:renderer_id") view=RendererBuilderPage />
                <Route path=path!("") view=HomePage />
            </Routes>
        </Router>
    }
}
