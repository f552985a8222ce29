use leptos::prelude::*;

const SECTIONS: [(&str, &str); 4] = [
	(
		"Clusters",
		"Three communities drift slowly across the page. Each keeps its own members close while \
		 its centre wanders.",
	),
	(
		"Bridges",
		"A few brokers sit between the communities and hold fixed links into each side.",
	),
	(
		"Churn",
		"Nodes are born near the quieter clusters and the oldest fade away. Scroll further and \
		 the network rewires faster.",
	),
	(
		"Fleeting links",
		"Now and then two strangers from different clusters connect for a few seconds, pull \
		 toward each other, then let go.",
	),
];

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let (dark, set_dark) = signal(false);
	let toggle_theme = move |_| {
		let next = !dark.get_untracked();
		set_dark.set(next);
		if let Some(root) = document().document_element() {
			let _ = root.set_attribute("data-theme", if next { "dark" } else { "light" });
		}
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<main class="page">
				<header class="hero">
					<h1>"Living Network"</h1>
					<p class="subtitle">"A graph that never holds still. Scroll to stir it up."</p>
					<button on:click=toggle_theme>
						{move || if dark.get() { "Light theme" } else { "Dark theme" }}
					</button>
				</header>
				{SECTIONS
					.iter()
					.map(|(title, body)| {
						view! {
							<section class="panel">
								<h2>{*title}</h2>
								<p>{*body}</p>
							</section>
						}
					})
					.collect_view()}
			</main>
		</ErrorBoundary>
	}
}
