use leptos::prelude::*;
use log::warn;
use web_sys::HtmlElement;

use super::scene::{self, SceneHandle};

/// Fixed, decorative network drawn behind the page content.
#[component]
pub fn LivingNetwork() -> impl IntoView {
	let container = NodeRef::<leptos::html::Div>::new();
	let handle = StoredValue::new_local(None::<SceneHandle>);

	Effect::new(move |_| {
		let Some(div) = container.get() else {
			return;
		};
		if handle.with_value(Option::is_some) {
			return;
		}
		let element: HtmlElement = div.into();
		match scene::init(&element) {
			Ok(scene) => handle.set_value(Some(scene)),
			Err(err) => warn!("living network unavailable: {err:?}"),
		}
	});

	on_cleanup(move || {
		if let Some(Some(scene)) = handle.try_update_value(Option::take) {
			scene.teardown();
		}
	});

	view! {
		<div
			node_ref=container
			class="living-network"
			aria-hidden="true"
			style="position: fixed; inset: 0; z-index: -1; pointer-events: none;"
		/>
	}
}
