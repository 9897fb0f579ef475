use crate::components::ui::{Button, ButtonSize, ButtonVariant, Input, Label, NativeSelect, SelectItem, Switch, Textarea};
use crate::schema::{
    hydrate_choice, Choice, FieldDescriptor, FieldKind, FieldValue, FormValues, RowSet, SelectOption,
    ValidationErrors,
};
use icons::{Plus, Trash2};
use leptos::prelude::*;

/// Editing surface for a list of field descriptors. `path` prefixes every
/// field name when looking up validation errors.
#[component]
pub(crate) fn SchemaForm(
    fields: &'static [FieldDescriptor],
    #[prop(into)] values: Signal<FormValues>,
    on_change: Callback<FormValues>,
    #[prop(into)] errors: Signal<ValidationErrors>,
    #[prop(optional, into)] path: String,
    #[prop(optional)] inline: bool,
) -> impl IntoView {
    let class = if inline {
        "grid grid-cols-[repeat(auto-fit,minmax(7rem,1fr))] gap-2"
    } else {
        "space-y-3"
    };

    let editors = fields
        .iter()
        .map(|field| {
            let name = field.name;
            let value = Signal::derive(move || {
                values.with(|v| v.get(name).cloned().unwrap_or_else(|| field.empty_value()))
            });
            let on_field = Callback::new(move |next: FieldValue| {
                let mut all = values.get_untracked();
                all.insert(name.to_string(), next);
                on_change.run(all);
            });

            view! {
                <FieldEditor
                    field=field
                    value=value
                    on_change=on_field
                    errors=errors
                    path=format!("{path}{name}")
                />
            }
        })
        .collect_view();

    view! { <div class=class>{editors}</div> }
}

#[component]
fn FieldEditor(
    field: &'static FieldDescriptor,
    value: Signal<FieldValue>,
    on_change: Callback<FieldValue>,
    errors: Signal<ValidationErrors>,
    path: String,
) -> impl IntoView {
    let error_path = path.clone();
    let error = Signal::derive(move || {
        errors.with(|e| e.for_field(&error_path).map(|e| e.to_string()))
    });
    let invalid = Signal::derive(move || error.with(Option::is_some));
    let input_id = format!("field-{path}");

    let editor = match field.kind {
        FieldKind::Text => {
            let text = Signal::derive(move || match value.get() {
                FieldValue::Text(s) => s,
                _ => String::new(),
            });
            view! {
                <Input
                    id=input_id.clone()
                    value=text
                    invalid=invalid
                    on_change=Callback::new(move |s: String| on_change.run(FieldValue::Text(s)))
                />
            }
            .into_any()
        }
        FieldKind::MultilineText => {
            let text = Signal::derive(move || match value.get() {
                FieldValue::Text(s) => s,
                _ => String::new(),
            });
            view! {
                <Textarea
                    id=input_id.clone()
                    value=text
                    invalid=invalid
                    on_change=Callback::new(move |s: String| on_change.run(FieldValue::Text(s)))
                />
            }
            .into_any()
        }
        FieldKind::Boolean => {
            let checked = Signal::derive(move || matches!(value.get(), FieldValue::Flag(true)));
            view! {
                <Switch
                    id=input_id.clone()
                    checked=checked
                    on_change=Callback::new(move |b: bool| on_change.run(FieldValue::Flag(b)))
                />
            }
            .into_any()
        }
        FieldKind::Select(options) => choice_editor(options, value, on_change, invalid, input_id.clone()),
        FieldKind::Group(fields) => {
            let inner = Signal::derive(move || match value.get() {
                FieldValue::Group(v) => v,
                _ => FormValues::new(),
            });
            view! {
                <div class="rounded-md border border-border p-3">
                    <SchemaForm
                        fields=fields
                        values=inner
                        on_change=Callback::new(move |v: FormValues| on_change.run(FieldValue::Group(v)))
                        errors=errors
                        path=format!("{path}.")
                    />
                </div>
            }
            .into_any()
        }
        FieldKind::List(fields) => rows_editor(fields, value, on_change, errors, path.clone()),
    };

    view! {
        <div class="space-y-1">
            <Label class="text-xs" html_for=input_id required=field.required>
                {field.label}
            </Label>
            {editor}
            <Show when=move || invalid.get() fallback=|| ().into_view()>
                <p class="text-destructive text-xs">{move || error.get().unwrap_or_default()}</p>
            </Show>
        </div>
    }
    .into_any()
}

fn choice_editor(
    options: &'static [SelectOption],
    value: Signal<FieldValue>,
    on_change: Callback<FieldValue>,
    invalid: Signal<bool>,
    id: String,
) -> AnyView {
    let current = Signal::derive(move || match value.get() {
        FieldValue::Choice(Some(c)) => c.value().to_string(),
        _ => String::new(),
    });
    let items = Signal::derive(move || {
        let mut items: Vec<SelectItem> = options
            .iter()
            .map(|o| SelectItem {
                value: o.value.to_string(),
                label: o.label.to_string(),
            })
            .collect();
        // Keep an unrecognized stored value selectable instead of dropping it.
        if let FieldValue::Choice(Some(Choice::Raw(raw))) = value.get() {
            items.push(SelectItem {
                value: raw.clone(),
                label: raw,
            });
        }
        items
    });

    view! {
        <NativeSelect
            id=id
            items=items
            value=current
            invalid=invalid
            on_change=Callback::new(move |s: String| {
                let next = (!s.is_empty()).then(|| hydrate_choice(options, &s));
                on_change.run(FieldValue::Choice(next));
            })
        />
    }
    .into_any()
}

fn rows_editor(
    fields: &'static [FieldDescriptor],
    value: Signal<FieldValue>,
    on_change: Callback<FieldValue>,
    errors: Signal<ValidationErrors>,
    path: String,
) -> AnyView {
    let rows = Signal::derive(move || match value.get() {
        FieldValue::Rows(r) => r,
        _ => RowSet::default(),
    });
    let path = StoredValue::new(path);

    let on_add = move |_| {
        let mut next = rows.get_untracked();
        next.add_row(fields);
        on_change.run(FieldValue::Rows(next));
    };

    view! {
        <div class="space-y-2">
            <Show when=move || rows.with(|r| r.rows().is_empty()) fallback=|| ().into_view()>
                <div class="text-xs text-muted-foreground">"No rows yet"</div>
            </Show>
            <For
                each=move || rows.with(|r| r.rows().iter().map(|row| row.key.clone()).collect::<Vec<_>>())
                key=|k| k.clone()
                children=move |key: String| {
                    let row_key = StoredValue::new(key.clone());
                    let row_values = Signal::derive(move || {
                        let key = row_key.get_value();
                        rows.with(|r| {
                            r.rows()
                                .iter()
                                .find(|row| row.key == key)
                                .map(|row| row.values.clone())
                                .unwrap_or_default()
                        })
                    });
                    let on_row = Callback::new(move |values: FormValues| {
                        let key = row_key.get_value();
                        let mut next = rows.get_untracked();
                        for (name, v) in values {
                            next.set_field(&key, &name, v);
                        }
                        on_change.run(FieldValue::Rows(next));
                    });
                    let on_remove = move |_| {
                        let mut next = rows.get_untracked();
                        next.remove_row(&row_key.get_value());
                        on_change.run(FieldValue::Rows(next));
                    };

                    view! {
                        <div class="flex items-start gap-2 rounded-md border border-border p-2">
                            <div class="flex-1">
                                <SchemaForm
                                    fields=fields
                                    values=row_values
                                    on_change=on_row
                                    errors=errors
                                    path=format!("{}.{}.", path.get_value(), key)
                                    inline=true
                                />
                            </div>
                            <Button
                                variant=ButtonVariant::Ghost
                                size=ButtonSize::Icon
                                attr:title="Remove row"
                                on:click=on_remove
                            >
                                <Trash2 />
                            </Button>
                        </div>
                    }
                    .into_any()
                }
            />
            <Button variant=ButtonVariant::Outline size=ButtonSize::Xs on:click=on_add>
                <Plus />
                "Add"
            </Button>
        </div>
    }
    .into_any()
}
