//! Browser mount: owns one running network behind a container element and
//! wires it to frames, resizes, theme flips and the pointer.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	HtmlCanvasElement, HtmlElement, MouseEvent, MutationObserver, MutationObserverInit,
	ResizeObserver, Window,
};

use super::config::SceneConfig;
use super::palette::Theme;
use super::render::{CanvasSink, DrawSink};
use super::state::NetworkState;

const THEME_ATTRIBUTE: &str = "data-theme";

thread_local! {
	static SCENES: RefCell<Vec<Weak<Scene>>> = const { RefCell::new(Vec::new()) };
}

struct Scene {
	alive: Cell<bool>,
	window: Window,
	container: HtmlElement,
	state: RefCell<NetworkState>,
	sink: RefCell<CanvasSink>,
	frame_id: Cell<Option<i32>>,
	animate: RefCell<Option<Closure<dyn FnMut(f64)>>>,
	on_pointer: RefCell<Option<Closure<dyn FnMut(MouseEvent)>>>,
	on_resize: RefCell<Option<Closure<dyn FnMut()>>>,
	on_theme: RefCell<Option<Closure<dyn FnMut()>>>,
	resize_observer: RefCell<Option<ResizeObserver>>,
	theme_observer: RefCell<Option<MutationObserver>>,
}

/// Keeps a mounted scene running. Dropping it tears the scene down.
pub struct SceneHandle {
	scene: Rc<Scene>,
}

impl SceneHandle {
	/// Stops the scene and removes its canvas. Safe to call more than once.
	pub fn teardown(&self) {
		if self.scene.shutdown() {
			debug!("living network torn down");
		}
		SCENES.with(|scenes| {
			scenes
				.borrow_mut()
				.retain(|w| w.upgrade().is_some_and(|s| s.alive.get()));
		});
	}
}

/// Mounts a network inside `container` and starts it.
///
/// The canvas fills the container. When the user prefers reduced motion only
/// one static frame is drawn.
pub fn init(container: &HtmlElement) -> Result<SceneHandle, JsValue> {
	let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
	let document = window
		.document()
		.ok_or_else(|| JsValue::from_str("no document"))?;

	let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
	canvas.set_attribute("aria-hidden", "true")?;
	canvas.style().set_property("display", "block")?;
	container.append_child(&canvas)?;
	let sink = match CanvasSink::new(canvas.clone()) {
		Ok(sink) => sink,
		Err(err) => {
			canvas.remove();
			return Err(err);
		}
	};

	let (width, height) = container_size(&window, container);
	let theme = current_theme(&window);
	let state = NetworkState::new(SceneConfig::default(), theme, width, height);

	let scene = Rc::new(Scene {
		alive: Cell::new(true),
		window: window.clone(),
		container: container.clone(),
		state: RefCell::new(state),
		sink: RefCell::new(sink),
		frame_id: Cell::new(None),
		animate: RefCell::new(None),
		on_pointer: RefCell::new(None),
		on_resize: RefCell::new(None),
		on_theme: RefCell::new(None),
		resize_observer: RefCell::new(None),
		theme_observer: RefCell::new(None),
	});
	// From here on a failure drops `scene`, which removes the canvas again.
	scene.resize();
	scene.apply_opacity();
	scene.install_observers()?;
	scene.install_pointer()?;

	if media_matches(&window, "(prefers-reduced-motion: reduce)") {
		debug!("reduced motion preferred, drawing a single static frame");
	} else {
		scene.install_animation();
		scene.schedule();
	}

	SCENES.with(|scenes| {
		let mut scenes = scenes.borrow_mut();
		scenes.retain(|w| w.strong_count() > 0);
		scenes.push(Rc::downgrade(&scene));
	});
	debug!("living network mounted at {width}x{height} ({theme:?})");
	Ok(SceneHandle { scene })
}

/// Halts every mounted scene and releases its canvas, whoever holds the
/// handles. Returns how many scenes were still running.
pub fn destroy_all() -> usize {
	let scenes = SCENES.with(|scenes| std::mem::take(&mut *scenes.borrow_mut()));
	let mut stopped = 0;
	for scene in scenes.iter().filter_map(Weak::upgrade) {
		if scene.shutdown() {
			stopped += 1;
		}
	}
	if stopped > 0 {
		debug!("destroy_all stopped {stopped} scene(s)");
	}
	stopped
}

impl Scene {
	fn install_animation(self: &Rc<Self>) {
		let weak = Rc::downgrade(self);
		*self.animate.borrow_mut() = Some(Closure::new(move |time_ms: f64| {
			if let Some(scene) = weak.upgrade() {
				scene.tick(time_ms);
			}
		}));
	}

	fn install_observers(self: &Rc<Self>) -> Result<(), JsValue> {
		let weak = Rc::downgrade(self);
		let on_resize = Closure::<dyn FnMut()>::new(move || {
			if let Some(scene) = weak.upgrade() {
				scene.resize();
			}
		});
		let resize_observer = ResizeObserver::new(on_resize.as_ref().unchecked_ref())?;
		resize_observer.observe(&self.container);
		*self.resize_observer.borrow_mut() = Some(resize_observer);
		*self.on_resize.borrow_mut() = Some(on_resize);

		let Some(root) = self
			.window
			.document()
			.and_then(|d| d.document_element())
		else {
			warn!("no document element, theme changes will not be tracked");
			return Ok(());
		};
		let weak = Rc::downgrade(self);
		let on_theme = Closure::<dyn FnMut()>::new(move || {
			if let Some(scene) = weak.upgrade() {
				scene.retheme();
			}
		});
		let theme_observer = MutationObserver::new(on_theme.as_ref().unchecked_ref())?;
		let options = MutationObserverInit::new();
		options.set_attributes(true);
		options.set_attribute_filter(&js_sys::Array::of1(&JsValue::from_str(THEME_ATTRIBUTE)));
		theme_observer.observe_with_options(&root, &options)?;
		*self.theme_observer.borrow_mut() = Some(theme_observer);
		*self.on_theme.borrow_mut() = Some(on_theme);
		Ok(())
	}

	fn install_pointer(self: &Rc<Self>) -> Result<(), JsValue> {
		let weak = Rc::downgrade(self);
		let on_pointer = Closure::<dyn FnMut(MouseEvent)>::new(move |ev: MouseEvent| {
			if let Some(scene) = weak.upgrade() {
				scene.point(&ev);
			}
		});
		self.window
			.add_event_listener_with_callback("mousemove", on_pointer.as_ref().unchecked_ref())?;
		*self.on_pointer.borrow_mut() = Some(on_pointer);
		Ok(())
	}

	fn schedule(&self) {
		if !self.alive.get() {
			return;
		}
		let animate = self.animate.borrow();
		let Some(cb) = animate.as_ref() else {
			return;
		};
		match self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
			Ok(id) => self.frame_id.set(Some(id)),
			Err(err) => warn!("requestAnimationFrame failed, animation stopped: {err:?}"),
		}
	}

	fn tick(&self, time_ms: f64) {
		if !self.alive.get() {
			return;
		}
		self.frame_id.set(None);
		let scroll_y = self.window.scroll_y().unwrap_or(0.0);
		let viewport_height = window_size(&self.window).1;
		{
			let mut state = self.state.borrow_mut();
			state.set_scroll(scroll_y, viewport_height);
			state.frame(time_ms, &mut *self.sink.borrow_mut());
		}
		self.apply_opacity();
		self.schedule();
	}

	fn resize(&self) {
		if !self.alive.get() {
			return;
		}
		let (width, height) = container_size(&self.window, &self.container);
		let max_ratio = self.state.borrow().config.driver.max_pixel_ratio;
		let pixel_ratio = self.window.device_pixel_ratio().clamp(1.0, max_ratio);

		let mut state = self.state.borrow_mut();
		let mut sink = self.sink.borrow_mut();
		state.resize(width, height);
		sink.resize(width, height, pixel_ratio);
		// Resizing clears the canvas; redraw so a paused scene stays visible.
		state.draw(&mut *sink);
	}

	fn retheme(&self) {
		if !self.alive.get() {
			return;
		}
		let theme = current_theme(&self.window);
		let mut state = self.state.borrow_mut();
		if state.set_theme(theme) {
			debug!("living network theme changed to {theme:?}");
			state.draw(&mut *self.sink.borrow_mut());
		}
	}

	fn point(&self, ev: &MouseEvent) {
		let (width, height) = window_size(&self.window);
		if width <= 0.0 || height <= 0.0 {
			return;
		}
		let x = f64::from(ev.client_x()) / width * 2.0 - 1.0;
		let y = 1.0 - f64::from(ev.client_y()) / height * 2.0;
		self.state.borrow_mut().set_pointer(x as f32, y as f32);
	}

	fn apply_opacity(&self) {
		let opacity = self.state.borrow().opacity();
		let _ = self
			.container
			.style()
			.set_property("opacity", &format!("{opacity:.3}"));
	}

	/// Returns false if the scene was already stopped.
	fn shutdown(&self) -> bool {
		if !self.alive.replace(false) {
			return false;
		}
		if let Some(id) = self.frame_id.take() {
			let _ = self.window.cancel_animation_frame(id);
		}
		if let Some(observer) = self.resize_observer.take() {
			observer.disconnect();
		}
		if let Some(observer) = self.theme_observer.take() {
			observer.disconnect();
		}
		if let Some(cb) = self.on_pointer.take() {
			let _ = self
				.window
				.remove_event_listener_with_callback("mousemove", cb.as_ref().unchecked_ref());
		}
		self.on_resize.take();
		self.on_theme.take();
		self.animate.take();
		match self.sink.try_borrow_mut() {
			Ok(mut sink) => sink.release(),
			Err(_) => warn!("canvas busy during shutdown, left in place"),
		}
		true
	}
}

impl Drop for Scene {
	fn drop(&mut self) {
		self.shutdown();
	}
}

fn window_size(window: &Window) -> (f64, f64) {
	let read = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
	(read(window.inner_width()), read(window.inner_height()))
}

/// Container size in CSS pixels, falling back to the viewport before layout.
fn container_size(window: &Window, container: &HtmlElement) -> (f64, f64) {
	let (w, h) = (container.client_width(), container.client_height());
	if w > 0 && h > 0 {
		(f64::from(w), f64::from(h))
	} else {
		window_size(window)
	}
}

fn media_matches(window: &Window, query: &str) -> bool {
	matches!(window.match_media(query), Ok(Some(list)) if list.matches())
}

fn current_theme(window: &Window) -> Theme {
	let attribute = window
		.document()
		.and_then(|d| d.document_element())
		.and_then(|root| root.get_attribute(THEME_ATTRIBUTE));
	Theme::resolve(
		attribute.as_deref(),
		media_matches(window, "(prefers-color-scheme: dark)"),
	)
}
