use leptos::prelude::*;
use leptos_ui::clx;
use tw_merge::tw_merge;

mod components {
    use super::*;
    clx! {Alert, div, "relative w-full rounded-lg border px-4 py-3 text-sm"}
    clx! {AlertDescription, p, "text-sm [&_p]:leading-relaxed"}
}

pub use components::*;

/// Red banner for a failed request or a rejected edit.
#[component]
pub fn ErrorAlert(#[prop(into)] message: Signal<Option<String>>, #[prop(optional, into)] class: String) -> impl IntoView {
    let merged_class = tw_merge!("border-destructive/30", class);

    view! {
        <Show when=move || message.get().is_some() fallback=|| ().into_view()>
            <Alert class=merged_class.clone()>
                <AlertDescription class="text-destructive text-xs">
                    {move || message.get().unwrap_or_default()}
                </AlertDescription>
            </Alert>
        </Show>
    }
}
