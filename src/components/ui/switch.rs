use leptos::prelude::*;
use tw_merge::tw_merge;

#[component]
pub fn Switch(
    #[prop(into, optional)] class: String,
    #[prop(into, optional)] id: String,
    #[prop(into)] checked: Signal<bool>,
    #[prop(into)] on_change: Callback<bool>,
) -> impl IntoView {
    let track_class = move || {
        tw_merge!(
            "relative inline-flex h-5 w-9 shrink-0 items-center rounded-full border border-transparent transition-colors",
            if checked.get() { "bg-primary" } else { "bg-input" },
            class.clone()
        )
    };
    let thumb_class = move || {
        if checked.get() {
            "pointer-events-none block size-4 rounded-full bg-background shadow-sm transition-transform translate-x-4"
        } else {
            "pointer-events-none block size-4 rounded-full bg-background shadow-sm transition-transform translate-x-0"
        }
    };

    view! {
        <button
            data-name="Switch"
            type="button"
            role="switch"
            id=id
            aria-checked=move || checked.get().to_string()
            class=track_class
            on:click=move |_| on_change.run(!checked.get_untracked())
        >
            <span class=thumb_class></span>
        </button>
    }
}
