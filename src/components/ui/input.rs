use leptos::prelude::*;
use tw_merge::tw_merge;

const FIELD_CLASS: &str = "placeholder:text-muted-foreground selection:bg-primary selection:text-primary-foreground border-input flex w-full min-w-0 rounded-md border bg-transparent px-3 py-1 text-sm shadow-xs transition-[color,box-shadow] outline-none focus-visible:border-ring focus-visible:ring-ring/50 focus-visible:ring-2 aria-invalid:border-destructive aria-invalid:ring-destructive/20 disabled:cursor-not-allowed disabled:opacity-50 read-only:bg-muted";

// Values flow in through a signal and out through a callback so the same
// input can edit a nested form value, not only a standalone `RwSignal`.
#[component]
pub fn Input(
    #[prop(into, optional)] class: String,
    #[prop(into, optional)] placeholder: String,
    #[prop(into, optional)] id: String,
    #[prop(optional)] readonly: bool,
    #[prop(into, optional)] invalid: MaybeProp<bool>,
    #[prop(into)] value: Signal<String>,
    #[prop(into, optional)] on_change: Option<Callback<String>>,
) -> impl IntoView {
    let merged_class = tw_merge!(FIELD_CLASS, "h-8", class);

    view! {
        <input
            data-name="Input"
            type="text"
            class=merged_class
            placeholder=placeholder
            id=id
            readonly=readonly
            aria-invalid=move || invalid.get().unwrap_or(false).to_string()
            prop:value=move || value.get()
            on:input=move |ev| {
                if let Some(cb) = on_change {
                    cb.run(event_target_value(&ev));
                }
            }
        />
    }
}

#[component]
pub fn Textarea(
    #[prop(into, optional)] class: String,
    #[prop(into, optional)] id: String,
    #[prop(into, optional)] invalid: MaybeProp<bool>,
    #[prop(into)] value: Signal<String>,
    #[prop(into)] on_change: Callback<String>,
) -> impl IntoView {
    let merged_class = tw_merge!(FIELD_CLASS, "min-h-20 py-2", class);

    view! {
        <textarea
            data-name="Textarea"
            class=merged_class
            id=id
            aria-invalid=move || invalid.get().unwrap_or(false).to_string()
            prop:value=move || value.get()
            on:input=move |ev| on_change.run(event_target_value(&ev))
        ></textarea>
    }
}
