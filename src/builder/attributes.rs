use super::fields::SchemaForm;
use super::BuilderContext;
use crate::components::ui::{Button, ButtonSize, ButtonVariant, ErrorAlert, Spinner};
use crate::models::Node;
use crate::schema::{hydrate, merge_attributes, resolve_schema, FormValues, ValidationErrors};
use crate::session::Edit;
use icons::X;
use leptos::prelude::*;

/// Side drawer editing the attributes of the node in the attributes register.
#[component]
pub(super) fn AttributesDrawer() -> impl IntoView {
    let ctx = expect_context::<BuilderContext>();
    let saving = ctx.saving();
    let target = Memo::new(move |_| ctx.session.with(|s| s.registers.attributes.current().cloned()));

    let values: RwSignal<FormValues> = RwSignal::new(FormValues::new());
    let errors: RwSignal<ValidationErrors> = RwSignal::new(ValidationErrors::default());

    Effect::new(move |_| {
        if let Some(node) = target.get() {
            values.set(hydrate(resolve_schema(&node.kind), &node.attributes));
            errors.set(ValidationErrors::default());
        }
    });

    let close = move |_| {
        ctx.edit_error.set(None);
        ctx.session.update(|s| s.registers.attributes.close());
    };

    let submit = move |_| {
        let Some(node) = target.get_untracked() else {
            return;
        };
        let fields = resolve_schema(&node.kind);
        match merge_attributes(&node.attributes, fields, &values.get_untracked()) {
            Ok(attributes) => {
                errors.set(ValidationErrors::default());
                ctx.submit(Edit::Update(Node { attributes, ..node }));
            }
            Err(e) => errors.set(e),
        }
    };

    let body = move || {
        let Some(node) = target.get() else {
            return ().into_any();
        };
        let fields = resolve_schema(&node.kind);
        if fields.is_empty() {
            return view! {
                <div class="text-xs text-muted-foreground">"This node has no editable attributes."</div>
            }
            .into_any();
        }
        view! {
            <SchemaForm
                fields=fields
                values=values
                on_change=Callback::new(move |v: FormValues| values.set(v))
                errors=errors
            />
        }
        .into_any()
    };

    view! {
        <Show when=move || target.with(Option::is_some) fallback=|| ().into_view()>
            <div class="fixed inset-y-0 right-0 z-40 flex w-full max-w-sm flex-col border-l border-border bg-background shadow-lg">
                <div class="flex items-center justify-between border-b border-border px-4 py-3">
                    <div class="space-y-0.5">
                        <div class="text-sm font-medium">"Attributes"</div>
                        <div class="text-xs text-muted-foreground">
                            {move || target.get().map(|n| n.kind.to_string()).unwrap_or_default()}
                        </div>
                    </div>
                    <Button variant=ButtonVariant::Ghost size=ButtonSize::Icon attr:title="Close" on:click=close>
                        <X />
                    </Button>
                </div>

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
        </Show>
    }
}
