//! Leptos component mounting a particle field onto a canvas.
//!
//! The canvas fills a container `<div>` and never intercepts pointer events;
//! hover interaction tracks the pointer globally on `window`. Each run of the
//! mounting effect registers every browser hook it needs and hands back a
//! [`Teardown`] guard, dropped on configuration change or unmount.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{info, warn};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, MouseEvent, Window};

use super::color::{DomProbe, NoProbe, StyleProbe};
use super::driver::{FrameLoop, Listeners, LoopPolicy, Teardown};
use super::render;
use super::simulation::Pointer;
use super::sprite::DomRasterizer;
use super::state::FieldState;
use super::types::{FieldConfig, RenderTarget};
use super::viewport::logical_size;

/// Resolutions whose crossing changes `devicePixelRatio` enough to matter.
const DPR_BREAKPOINTS: [f64; 4] = [1.25, 1.5, 2.0, 3.0];

/// Canvas plus the field state it displays.
struct Surface {
	window: Window,
	container: HtmlElement,
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	field: Rc<RefCell<FieldState>>,
	rasterizer: RefCell<DomRasterizer>,
}

impl Surface {
	/// Sizes the backing store to the container and updates the field.
	fn fit(&self) {
		let rect = self.container.get_bounding_client_rect();
		let mut field = self.field.borrow_mut();
		let overrides = (field.config().width, field.config().height);
		let (width, height) = logical_size((rect.width(), rect.height()), overrides);
		let dpr = self.window.device_pixel_ratio();

		field.resize(width, height, dpr, &mut *self.rasterizer.borrow_mut());
		let (backing_w, backing_h) = field.viewport().backing_size();
		if self.canvas.width() != backing_w || self.canvas.height() != backing_h {
			self.canvas.set_width(backing_w);
			self.canvas.set_height(backing_h);
		}
	}

	fn frame(&self, now_ms: f64) {
		self.field.borrow_mut().tick(now_ms);
		render::render(&self.ctx, &self.field.borrow());
	}

	/// Draws a still frame at base opacity.
	fn draw_static(&self) {
		let mut field = self.field.borrow_mut();
		field.settle_static();
		field.refresh_sprites(&mut *self.rasterizer.borrow_mut());
		render::render(&self.ctx, &field);
	}

	/// Pointer position relative to the canvas; outside it counts as not hovering.
	fn pointer_at(&self, client_x: f64, client_y: f64) -> Pointer {
		let rect = self.canvas.get_bounding_client_rect();
		let (x, y) = (client_x - rect.left(), client_y - rect.top());
		if x >= 0.0 && y >= 0.0 && x <= rect.width() && y <= rect.height() {
			Pointer { x, y, hovering: true }
		} else {
			Pointer::outside()
		}
	}
}

/// Renders an animated particle field filling its parent.
///
/// `config` may change at any time; settings that do not affect the particle
/// population are applied without regenerating particles. `target` selects
/// whether the field animates (see [`RenderTarget`]).
#[component]
pub fn ParticleField(
	#[prop(into)] config: Signal<FieldConfig>,
	#[prop(default = RenderTarget::Live)] target: RenderTarget,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let field: Rc<RefCell<Option<Rc<RefCell<FieldState>>>>> = Rc::new(RefCell::new(None));
	let mounted: Rc<RefCell<Option<Teardown>>> = Rc::new(RefCell::new(None));

	let cleanup = SendWrapper::new(mounted.clone());
	on_cleanup(move || {
		cleanup.borrow_mut().take();
	});

	Effect::new(move |_| {
		let config = config.get();
		let (Some(container), Some(canvas)) = (container_ref.get(), canvas_ref.get()) else {
			return;
		};
		// Release the previous run before registering anything new.
		mounted.borrow_mut().take();

		let Some(window) = web_sys::window() else {
			warn!("particle-field: no window, nothing to draw");
			return;
		};
		let dom_probe = DomProbe::new();
		let probe: &dyn StyleProbe = match &dom_probe {
			Some(probe) => probe,
			None => &NoProbe,
		};

		let existing = field.borrow().clone();
		let state = match existing {
			Some(existing) => {
				if let Some(document) = window.document() {
					let mut rasterizer = DomRasterizer::new(document);
					existing.borrow_mut().set_config(config, probe, &mut rasterizer);
				}
				existing
			}
			None => {
				let seed = (js_sys::Math::random() * u64::MAX as f64) as u64;
				let created = Rc::new(RefCell::new(FieldState::new(config, probe, seed)));
				*field.borrow_mut() = Some(created.clone());
				created
			}
		};

		match mount(window, container.into(), canvas, state, target) {
			Ok(teardown) => *mounted.borrow_mut() = Some(teardown),
			Err(err) => warn!("particle-field: failed to mount: {:?}", err),
		}
	});

	view! {
		<div
			node_ref=container_ref
			class="particle-field"
			style="position: relative; width: 100%; height: 100%; overflow: hidden;"
		>
			<canvas
				node_ref=canvas_ref
				style="display: block; width: 100%; height: 100%; pointer-events: none;"
			/>
		</div>
	}
}

/// Wires `field` to the page. Optional observers that cannot be created are
/// logged and skipped.
fn mount(
	window: Window,
	container: HtmlElement,
	canvas: HtmlCanvasElement,
	field: Rc<RefCell<FieldState>>,
	target: RenderTarget,
) -> Result<Teardown, JsValue> {
	let document = window.document().ok_or_else(|| JsValue::from_str("window has no document"))?;
	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")?
		.ok_or_else(|| JsValue::from_str("2d context unavailable"))?
		.dyn_into()?;

	let config = field.borrow().config().clone();
	let policy = Rc::new(Cell::new(LoopPolicy {
		movement: config.movement.enable,
		visible: config.visible,
		target,
		preview_motion: config.preview_motion,
		on_screen: true,
	}));

	let surface = Rc::new(Surface {
		window: window.clone(),
		container: container.clone(),
		canvas,
		ctx,
		field,
		rasterizer: RefCell::new(DomRasterizer::new(document)),
	});

	let frame_loop = {
		let surface = surface.clone();
		FrameLoop::new(window.clone(), move |now| surface.frame(now))
	};

	let refit = {
		let (surface, frame_loop) = (surface.clone(), frame_loop.clone());
		Rc::new(move || {
			surface.fit();
			if !frame_loop.is_running() {
				surface.draw_static();
			}
		})
	};

	let mut listeners = Listeners::default();

	{
		let refit = refit.clone();
		listeners.listen(&window, "resize", move |_| refit())?;
	}

	{
		let refit = refit.clone();
		if let Err(err) = listeners.observe_resize(&container, move || refit()) {
			warn!("particle-field: ResizeObserver unavailable, tracking window size only: {:?}", err);
		}
	}

	for dppx in DPR_BREAKPOINTS {
		let query = format!("(min-resolution: {dppx}dppx)");
		match window.match_media(&query) {
			Ok(Some(media)) => {
				let refit = refit.clone();
				listeners.listen(&media, "change", move |_| refit())?;
			}
			Ok(None) => {}
			Err(err) => warn!("particle-field: matchMedia({query}) failed: {:?}", err),
		}
	}

	{
		let (surface, frame_loop, policy) = (surface.clone(), frame_loop.clone(), policy.clone());
		let on_visibility = move |on_screen: bool| {
			let mut current = policy.get();
			if current.on_screen == on_screen {
				return;
			}
			current.on_screen = on_screen;
			policy.set(current);
			if current.should_animate() {
				surface.field.borrow_mut().reset_clock();
				frame_loop.start();
			} else if current.allows_animation() {
				frame_loop.pause();
			}
		};
		if let Err(err) = listeners.observe_intersection(&container, on_visibility) {
			warn!("particle-field: IntersectionObserver unavailable, assuming visible: {:?}", err);
		}
	}

	if config.hover.enable {
		for name in ["pointermove", "pointerdown"] {
			let surface = surface.clone();
			listeners.listen(&window, name, move |event| {
				if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
					let pointer = surface.pointer_at(mouse.client_x() as f64, mouse.client_y() as f64);
					surface.field.borrow_mut().set_pointer(pointer);
				}
			})?;
		}
		let surface = surface.clone();
		listeners.listen(&window, "blur", move |_| {
			surface.field.borrow_mut().set_pointer(Pointer::outside());
		})?;
	}

	surface.fit();
	let initial = policy.get();
	if initial.should_animate() {
		surface.field.borrow_mut().reset_clock();
		frame_loop.start();
	} else {
		surface.draw_static();
	}
	info!(
		"particle-field: mounted {} particles, target {}, {}",
		surface.field.borrow().particles().len(),
		target.as_str(),
		if initial.should_animate() { "animating" } else { "static" }
	);

	Ok(Teardown::new(frame_loop, listeners))
}
