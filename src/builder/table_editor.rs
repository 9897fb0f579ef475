use super::fields::SchemaForm;
use super::{copy_to_clipboard, BuilderContext};
use crate::components::ui::{Button, ButtonSize, ButtonVariant, ErrorAlert, Input, Label, Spinner};
use crate::models::{Node, NodeKind};
use crate::schema::{hydrate, merge_attributes, resolve_schema, FormValues, TableTab, ValidationErrors};
use crate::session::Edit;
use icons::{Check, Copy, X};
use leptos::prelude::*;
use strum::IntoEnumIterator;

#[component]
fn NodeReference(#[prop(into)] id: Signal<String>) -> impl IntoView {
    let copied: RwSignal<bool> = RwSignal::new(false);

    let on_copy = move |_| {
        let ok = copy_to_clipboard(&id.get_untracked());
        if !ok {
            tracing::warn!("clipboard is not available");
        }
        copied.set(ok);
    };

    view! {
        <div class="space-y-1">
            <Label class="text-xs">"Reference id"</Label>
            <div class="flex items-center gap-2">
                <Input value=id readonly=true class="font-mono text-xs" />
                <Button variant=ButtonVariant::Outline size=ButtonSize::Sm attr:title="Copy reference id" on:click=on_copy>
                    {move || if copied.get() { view! { <Check /> }.into_any() } else { view! { <Copy /> }.into_any() }}
                </Button>
            </div>
        </div>
    }
}

/// Tabbed editor for a table node's details and its button, header and
/// action rows.
#[component]
pub(super) fn TableEditor() -> impl IntoView {
    let ctx = expect_context::<BuilderContext>();
    let saving = ctx.saving();

    let target = Memo::new(move |_| {
        ctx.session.with(|s| {
            s.registers
                .table_editor
                .current()
                .and_then(|id| s.tree().get(id))
                .filter(|n| n.kind == NodeKind::Table)
                .cloned()
        })
    });

    let tab: RwSignal<TableTab> = RwSignal::new(TableTab::Details);
    let values: RwSignal<FormValues> = RwSignal::new(FormValues::new());
    let errors: RwSignal<ValidationErrors> = RwSignal::new(ValidationErrors::default());

    Effect::new(move |prev: Option<Option<String>>| {
        let node = target.get();
        let id = node.as_ref().map(|n| n.id.clone());
        // Re-hydrate only when a different table is opened.
        if prev.as_ref() != Some(&id) {
            if let Some(node) = node {
                values.set(hydrate(resolve_schema(&node.kind), &node.attributes));
                errors.set(ValidationErrors::default());
                tab.set(TableTab::Details);
            }
        }
        id
    });

    let close = move |_| {
        ctx.edit_error.set(None);
        ctx.session.update(|s| s.registers.table_editor.close());
    };

    let submit = move |_| {
        let Some(node) = target.get_untracked() else {
            return;
        };
        match merge_attributes(&node.attributes, resolve_schema(&node.kind), &values.get_untracked()) {
            Ok(attributes) => {
                errors.set(ValidationErrors::default());
                ctx.submit(Edit::Update(Node { attributes, ..node }));
            }
            Err(e) => {
                let on_details = TableTab::Details
                    .fields()
                    .iter()
                    .any(|f| e.for_field(f.name).is_some());
                if on_details {
                    tab.set(TableTab::Details);
                }
                errors.set(e);
            }
        }
    };

    let node_id = Signal::derive(move || target.with(|t| t.as_ref().map(|n| n.id.clone()).unwrap_or_default()));

    let tabs = move || {
        TableTab::iter()
            .map(|t| {
                let class = move || {
                    if tab.get() == t {
                        "border-b-2 border-primary px-3 py-1.5 text-sm font-medium"
                    } else {
                        "border-b-2 border-transparent px-3 py-1.5 text-sm text-muted-foreground hover:text-foreground"
                    }
                };
                view! {
                    <button type="button" class=class on:click=move |_| tab.set(t)>
                        {t.to_string()}
                    </button>
                }
            })
            .collect_view()
    };

    let body = move || {
        let current = tab.get();
        let form = view! {
            <SchemaForm
                fields=current.fields()
                values=values
                on_change=Callback::new(move |v: FormValues| values.set(v))
                errors=errors
            />
        };
        if current == TableTab::Details {
            view! {
                <div class="space-y-3">
                    <NodeReference id=node_id />
                    {form}
                </div>
            }
            .into_any()
        } else {
            form.into_any()
        }
    };

    view! {
        <Show when=move || target.with(Option::is_some) fallback=|| ().into_view()>
            <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4">
                <div class="flex max-h-[90vh] w-full max-w-2xl flex-col rounded-md border border-border bg-background shadow-lg">
                    <div class="flex items-center justify-between px-4 pt-3">
                        <div class="text-sm font-medium">"Table"</div>
                        <Button variant=ButtonVariant::Ghost size=ButtonSize::Icon attr:title="Close" on:click=close>
                            <X />
                        </Button>
                    </div>
                    <div class="flex gap-1 border-b border-border px-4">{tabs}</div>

                    <div class="flex-1 overflow-y-auto px-4 py-3">{body}</div>

                    <div class="space-y-2 border-t border-border px-4 py-3">
                        <ErrorAlert message=ctx.edit_error />
                        <div class="flex items-center justify-end gap-2">
                            <Button
                                variant=ButtonVariant::Outline
                                size=ButtonSize::Sm
                                attr:disabled=move || saving.get()
                                on:click=close
                            >
                                "Cancel"
                            </Button>
                            <Button size=ButtonSize::Sm attr:disabled=move || saving.get() on:click=submit>
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || saving.get() fallback=|| ().into_view()>
                                        <Spinner />
                                    </Show>
                                    {move || if saving.get() { "Saving..." } else { "Save" }}
                                </span>
                            </Button>
                        </div>
                    </div>
                </div>
            </div>
        </Show>
    }
}
