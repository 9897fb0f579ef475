use leptos::prelude::*;
use tw_merge::tw_merge;

/// One `<option>` of a [`NativeSelect`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectItem {
    pub value: String,
    pub label: String,
}

/// Plain `<select>`. An empty value is the "nothing chosen" state.
#[component]
pub fn NativeSelect(
    #[prop(into, optional)] class: String,
    #[prop(into, optional)] id: String,
    #[prop(into, default = "Select...".to_string())] placeholder: String,
    #[prop(into, optional)] invalid: MaybeProp<bool>,
    #[prop(into)] items: Signal<Vec<SelectItem>>,
    #[prop(into)] value: Signal<String>,
    #[prop(into)] on_change: Callback<String>,
) -> impl IntoView {
    let merged_class = tw_merge!(
        "border-input h-8 w-full rounded-md border bg-transparent px-2 text-sm shadow-xs outline-none focus-visible:border-ring focus-visible:ring-2 focus-visible:ring-ring/50 aria-invalid:border-destructive",
        class
    );

    view! {
        <select
            data-name="NativeSelect"
            class=merged_class
            id=id
            aria-invalid=move || invalid.get().unwrap_or(false).to_string()
            prop:value=move || value.get()
            on:change=move |ev| on_change.run(event_target_value(&ev))
        >
            <option value="">{placeholder}</option>
            {move || {
                let current = value.get();
                items
                    .get()
                    .into_iter()
                    .map(|item| {
                        let selected = item.value == current;
                        view! {
                            <option value=item.value selected=selected>
                                {item.label}
                            </option>
                        }
                    })
                    .collect_view()
            }}
        </select>
    }
}
