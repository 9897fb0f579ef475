use super::BuilderContext;
use crate::components::ui::{Button, ButtonSize, ButtonVariant};
use crate::render::{RenderKind, RenderNode};
use crate::session::Edit;
use icons::{Pencil, Plus, Table, Trash2};
use leptos::prelude::*;

/// "Add" affordance. Without `after` the new node goes to the front.
#[component]
fn AddButton(parent_id: String, after: Option<String>) -> impl IntoView {
    let ctx = expect_context::<BuilderContext>();
    let saving = ctx.saving();

    let on_click = move |_| {
        let result = ctx
            .session
            .try_update(|s| s.registers.request_create(Some(&parent_id), after.as_deref()));
        if let Some(Err(e)) = result {
            tracing::warn!(error = %e, "create request rejected");
        }
    };

    view! {
        <Button
            variant=ButtonVariant::Insert
            size=ButtonSize::Xs
            attr:title="Add node here"
            attr:disabled=move || saving.get()
            on:click=on_click
        >
            <Plus />
        </Button>
    }
}

#[component]
fn NodeToolbar(id: String, is_table: bool, deletable: bool) -> impl IntoView {
    let ctx = expect_context::<BuilderContext>();
    let saving = ctx.saving();
    let id = StoredValue::new(id);

    let open_attributes = move |_| {
        let node = ctx.session.with_untracked(|s| s.tree().get(&id.get_value()).cloned());
        if let Some(node) = node {
            ctx.edit_error.set(None);
            ctx.session.update(|s| s.registers.attributes.open(node));
        }
    };
    let open_table = move |_| {
        ctx.edit_error.set(None);
        ctx.session.update(|s| s.registers.table_editor.open(id.get_value()));
    };
    let on_delete = move |_| ctx.submit(Edit::Delete(id.get_value()));

    view! {
        <div class="absolute right-1 top-1 z-10 hidden items-center gap-0.5 rounded-md bg-background/90 shadow-sm group-hover/node:flex">
            <Button variant=ButtonVariant::Ghost size=ButtonSize::Icon attr:title="Attributes" on:click=open_attributes>
                <Pencil />
            </Button>
            <Show when=move || is_table fallback=|| ().into_view()>
                <Button variant=ButtonVariant::Ghost size=ButtonSize::Icon attr:title="Edit table" on:click=open_table>
                    <Table />
                </Button>
            </Show>
            <Show when=move || deletable fallback=|| ().into_view()>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Icon
                    attr:title="Delete"
                    attr:disabled=move || saving.get()
                    on:click=on_delete
                >
                    <Trash2 class="text-destructive" />
                </Button>
            </Show>
        </div>
    }
}

/// One rendered node and, for containers, its children with insertion points.
#[component]
pub(crate) fn CanvasNode(node: RenderNode) -> impl IntoView {
    let RenderNode { id, deletable, kind } = node;
    let is_table = matches!(kind, RenderKind::Table { .. });
    let toolbar = (!matches!(kind, RenderKind::Placeholder(_)) || deletable)
        .then(|| view! { <NodeToolbar id=id.clone() is_table=is_table deletable=deletable /> });

    let body = match kind {
        RenderKind::Container { style, children } => {
            let css = style.to_css();
            view! {
                <div class="min-h-12 rounded-sm border border-dashed border-border p-1" style=css>
                    {children_with_insert_points(&id, children)}
                </div>
            }
            .into_any()
        }
        RenderKind::Form { reference_id, flex, children } => {
            let style = if flex { "flex:1" } else { "" };
            view! {
                <form
                    class="flex min-h-12 flex-col gap-1 rounded-sm border border-dashed border-primary/40 p-1"
                    style=style
                    data-reference-id=reference_id
                    on:submit=|ev| ev.prevent_default()
                >
                    {children_with_insert_points(&id, children)}
                </form>
            }
            .into_any()
        }
        RenderKind::Text { text } => view! { <p class="whitespace-pre-wrap text-sm">{text}</p> }.into_any(),
        RenderKind::Heading { text } => {
            view! { <h2 class="text-xl font-semibold">{text}</h2> }.into_any()
        }
        RenderKind::Button { label, alternative_label, submit, route, external } => {
            let title = route
                .map(|r| if external { format!("{r} (external)") } else { r })
                .unwrap_or_default();
            let button_kind = if submit { "submit" } else { "button" };
            view! {
                <Button size=ButtonSize::Sm attr:title=title attr:data-button-kind=button_kind>
                    {label}
                    {alternative_label.map(|alt| view! { <span class="text-xs opacity-70">{format!("/ {alt}")}</span> })}
                </Button>
            }
            .into_any()
        }
        RenderKind::Table { route, search, headers, buttons, actions } => view! {
            <div class="space-y-2 rounded-sm border border-border p-2 text-sm">
                <div class="flex items-center gap-2">
                    {search.then(|| view! { <input class="h-7 rounded-md border px-2 text-xs" placeholder="Search" disabled=true /> })}
                    {buttons
                        .into_iter()
                        .map(|b| view! { <span class="rounded-md border px-2 py-0.5 text-xs">{b}</span> })
                        .collect_view()}
                </div>
                <table class="w-full text-left">
                    <thead>
                        <tr>
                            {headers.into_iter().map(|h| view! { <th class="px-2 py-1 font-medium">{h}</th> }).collect_view()}
                            {(!actions.is_empty()).then(|| view! { <th class="px-2 py-1 font-medium">"Actions"</th> })}
                        </tr>
                    </thead>
                </table>
                <div class="text-xs text-muted-foreground">{format!("GET {route}")}</div>
            </div>
        }
        .into_any(),
        RenderKind::TextInput { name, label, placeholder } => view! {
            <label class="flex flex-col gap-1 text-sm">
                <span>{label}</span>
                <input class="h-8 rounded-md border px-2" name=name placeholder=placeholder disabled=true />
            </label>
        }
        .into_any(),
        RenderKind::Outlet => view! {
            <div class="rounded-sm border border-dashed border-muted-foreground/60 p-4 text-center text-xs text-muted-foreground">
                "Outlet"
            </div>
        }
        .into_any(),
        RenderKind::Placeholder(reason) => view! {
            <div class="rounded-sm border border-dashed border-destructive/60 p-2 text-xs text-destructive">
                {reason.message()}
            </div>
        }
        .into_any(),
    };

    view! {
        <div class="group/node relative" data-node-id=id>
            {toolbar}
            {body}
        </div>
    }
    .into_any()
}

fn children_with_insert_points(parent_id: &str, children: Vec<RenderNode>) -> AnyView {
    let front = view! { <AddButton parent_id=parent_id.to_string() after=None /> };
    let rest = children
        .into_iter()
        .map(|child| {
            let child_id = child.id.clone();
            view! {
                <CanvasNode node=child />
                <AddButton parent_id=parent_id.to_string() after=Some(child_id) />
            }
            .into_any()
        })
        .collect_view();

    view! {
        {front}
        {rest}
    }
    .into_any()
}
