use crate::api::{ApiClient, ApiErrorKind, ApiResult, TreeStore};
use crate::builder::RendererBuilder;
use crate::components::ui::{Alert, AlertDescription, Button, ButtonSize, Input, Label, Spinner};
use crate::models::Tree;
use crate::state::AppContext;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::{use_navigate, use_params};
use leptos_router::params::Params;

/// What owns the renderer being edited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum BuilderSource {
    Layout(String),
    Route(String),
    Renderer(String),
}

impl BuilderSource {
    fn what(&self) -> &'static str {
        match self {
            BuilderSource::Layout(_) => "Layout",
            BuilderSource::Route(_) => "Route",
            BuilderSource::Renderer(_) => "Renderer",
        }
    }

    /// Page title and the tree to edit.
    async fn load(&self, client: &ApiClient) -> ApiResult<(String, Tree)> {
        match self {
            BuilderSource::Layout(id) => {
                let layout = client.get_layout(id).await?;
                Ok((format!("Layout: {}", layout.label), layout.renderer))
            }
            BuilderSource::Route(id) => {
                let route = client.get_route(id).await?;
                Ok((format!("Route: {} ({})", route.label, route.route), route.renderer))
            }
            BuilderSource::Renderer(id) => {
                let tree = client.load_tree(id).await?;
                Ok((format!("Renderer {id}"), tree))
            }
        }
    }
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct LayoutRouteParams {
    pub layout_id: Option<String>,
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct RouteRouteParams {
    pub route_id: Option<String>,
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct RendererRouteParams {
    pub renderer_id: Option<String>,
}

#[component]
fn BuilderPage(#[prop(into)] source: Signal<Option<BuilderSource>>) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;

    let title: RwSignal<String> = RwSignal::new(String::new());
    let tree: RwSignal<Option<Tree>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    // Ignore responses for a source the user already navigated away from.
    let request_id: RwSignal<u64> = RwSignal::new(0);

    Effect::new(move |_| {
        let Some(src) = source.get() else {
            error.set(Some("Missing id in URL".to_string()));
            return;
        };

        let rid = request_id.get_untracked().wrapping_add(1);
        request_id.set(rid);
        loading.set(true);
        error.set(None);
        tree.set(None);

        let client = api_client.get_untracked();
        spawn_local(async move {
            let result = src.load(&client).await;
            if request_id.get_untracked() != rid {
                return;
            }
            match result {
                Ok((t, loaded)) => {
                    title.set(t);
                    tree.set(Some(loaded));
                }
                Err(e) => {
                    tracing::warn!(source = ?src, error = %e, "failed to load renderer");
                    let message = match e.kind {
                        ApiErrorKind::NotFound => format!("{} not found", src.what()),
                        ApiErrorKind::Unauthorized => "Unauthorized. Check the API token.".to_string(),
                        _ => e.to_string(),
                    };
                    error.set(Some(message));
                }
            }
            loading.set(false);
        });
    });

    view! {
        <div class="flex min-h-screen flex-col">
            <header class="flex items-center gap-2 border-b border-border px-4 py-2">
                <a href="/" class="text-xs text-muted-foreground hover:text-foreground">"Builder"</a>
                <span class="text-xs text-muted-foreground">"/"</span>
                <span class="text-sm font-medium">{move || title.get()}</span>
            </header>

            <Show when=move || loading.get() fallback=|| ().into_view()>
                <div class="flex items-center gap-2 px-4 py-8 text-xs text-muted-foreground">
                    <Spinner />
                    "Loading..."
                </div>
            </Show>

            <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                {move || error.get().map(|e| view! {
                    <div class="px-4 py-4">
                        <Alert class="border-destructive/30">
                            <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                        </Alert>
                    </div>
                })}
            </Show>

            {move || tree.get().map(|t| view! { <RendererBuilder tree=t api_client=api_client /> })}
        </div>
    }
}

#[component]
pub fn LayoutBuilderPage() -> impl IntoView {
    let params = use_params::<LayoutRouteParams>();
    let source = Signal::derive(move || {
        params
            .get()
            .ok()
            .and_then(|p| p.layout_id)
            .filter(|id| !id.trim().is_empty())
            .map(BuilderSource::Layout)
    });
    view! { <BuilderPage source=source /> }
}

#[component]
pub fn RouteBuilderPage() -> impl IntoView {
    let params = use_params::<RouteRouteParams>();
    let source = Signal::derive(move || {
        params
            .get()
            .ok()
            .and_then(|p| p.route_id)
            .filter(|id| !id.trim().is_empty())
            .map(BuilderSource::Route)
    });
    view! { <BuilderPage source=source /> }
}

#[component]
pub fn RendererBuilderPage() -> impl IntoView {
    let params = use_params::<RendererRouteParams>();
    let source = Signal::derive(move || {
        params
            .get()
            .ok()
            .and_then(|p| p.renderer_id)
            .filter(|id| !id.trim().is_empty())
            .map(BuilderSource::Renderer)
    });
    view! { <BuilderPage source=source /> }
}

#[component]
pub fn HomePage() -> impl IntoView {
    let navigate = StoredValue::new(use_navigate());
    let renderer_id: RwSignal<String> = RwSignal::new(String::new());

    let open = move |_| {
        let id = renderer_id.get_untracked();
        let id = id.trim();
        if id.is_empty() {
            return;
        }
        navigate.with_value(|nav| {
            nav(&format!("/renderers/{}", urlencoding::encode(id)), Default::default())
        });
    };

    view! {
        <div class="mx-auto max-w-sm space-y-3 px-4 py-16">
            <div class="text-sm font-medium">"Open a renderer"</div>
            <div class="space-y-1">
                <Label class="text-xs" html_for="renderer-id">"Renderer id"</Label>
                <Input
                    id="renderer-id"
                    value=renderer_id
                    on_change=Callback::new(move |s: String| renderer_id.set(s))
                />
            </div>
            <Button size=ButtonSize::Sm attr:disabled=move || renderer_id.with(|s| s.trim().is_empty()) on:click=open>
                "Open"
            </Button>
        </div>
    }
}
