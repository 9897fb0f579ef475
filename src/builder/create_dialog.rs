use super::fields::SchemaForm;
use super::BuilderContext;
use crate::components::ui::{Button, ButtonSize, ButtonVariant, ErrorAlert, Label, NativeSelect, SelectItem, Spinner};
use crate::models::{Node, NodeKind};
use crate::schema::{blank, normalize, resolve_schema, FormValues, ValidationErrors};
use crate::session::Edit;
use leptos::prelude::*;

fn selected_kind(raw: &str) -> Option<NodeKind> {
    (!raw.is_empty()).then(|| NodeKind::parse(raw))
}

#[component]
pub(super) fn CreateNodeDialog() -> impl IntoView {
    let ctx = expect_context::<BuilderContext>();
    let saving = ctx.saving();
    let open = Signal::derive(move || ctx.session.with(|s| s.registers.create.is_open()));

    let kind_value: RwSignal<String> = RwSignal::new(String::new());
    let values: RwSignal<FormValues> = RwSignal::new(FormValues::new());
    let errors: RwSignal<ValidationErrors> = RwSignal::new(ValidationErrors::default());
    let type_error: RwSignal<Option<String>> = RwSignal::new(None);

    // Start from a clean form every time the dialog opens.
    Effect::new(move |_| {
        if open.get() {
            kind_value.set(String::new());
            values.set(FormValues::new());
            errors.set(ValidationErrors::default());
            type_error.set(None);
        }
    });

    let kind_items = Signal::derive(|| {
        NodeKind::CREATABLE
            .iter()
            .map(|k| SelectItem {
                value: k.as_str().to_string(),
                label: k.as_str().to_string(),
            })
            .collect::<Vec<_>>()
    });

    let on_kind = Callback::new(move |raw: String| {
        let fields = selected_kind(&raw).map(|k| resolve_schema(&k)).unwrap_or(&[]);
        values.set(blank(fields));
        errors.set(ValidationErrors::default());
        type_error.set(None);
        kind_value.set(raw);
    });

    let close = move |_| {
        ctx.edit_error.set(None);
        ctx.session.update(|s| s.registers.create.close());
    };

    let submit = move |_| {
        let Some(kind) = selected_kind(&kind_value.get_untracked()) else {
            type_error.set(Some("Type is required".to_string()));
            return;
        };
        let attributes = match normalize(resolve_schema(&kind), &values.get_untracked()) {
            Ok(a) => a,
            Err(e) => {
                errors.set(e);
                return;
            }
        };
        errors.set(ValidationErrors::default());

        let Some(request) = ctx.session.with_untracked(|s| s.registers.create.current().cloned()) else {
            return;
        };
        ctx.submit(Edit::Insert {
            node: Node::new(kind, attributes),
            parent_id: request.parent_id().to_string(),
            after: request.after().map(str::to_string),
        });
    };

    let form = move || {
        let fields = selected_kind(&kind_value.get()).map(|k| resolve_schema(&k)).unwrap_or(&[]);
        (!fields.is_empty()).then(|| {
            view! {
                <SchemaForm
                    fields=fields
                    values=values
                    on_change=Callback::new(move |v: FormValues| values.set(v))
                    errors=errors
                />
            }
        })
    };

    view! {
        <Show when=move || open.get() fallback=|| ().into_view()>
            <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4">
                <div class="max-h-[90vh] w-full max-w-md overflow-y-auto rounded-md border border-border bg-background p-4 shadow-lg">
                    <div class="mb-3 space-y-1">
                        <div class="text-sm font-medium">"New node"</div>
                    </div>

                    <div class="space-y-3">
                        <div class="space-y-1">
                            <Label class="text-xs" html_for="create-node-type" required=true>"Type"</Label>
                            <NativeSelect
                                id="create-node-type"
                                placeholder="Select a type"
                                items=kind_items
                                value=kind_value
                                invalid=Signal::derive(move || type_error.with(Option::is_some))
                                on_change=on_kind
                            />
                            <Show when=move || type_error.with(Option::is_some) fallback=|| ().into_view()>
                                <p class="text-destructive text-xs">{move || type_error.get().unwrap_or_default()}</p>
                            </Show>
                        </div>

                        {form}

                        <ErrorAlert message=ctx.edit_error />

                        <div class="flex items-center justify-end gap-2 pt-2">
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
                                    {move || if saving.get() { "Creating..." } else { "Create" }}
                                </span>
                            </Button>
                        </div>
                    </div>
                </div>
            </div>
        </Show>
    }
}
