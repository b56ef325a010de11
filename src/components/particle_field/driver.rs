//! Frame loop, browser listeners and teardown for a mounted field.
//!
//! Everything a running field registers with the browser (the pending
//! animation frame, window and media-query listeners, resize and intersection
//! observers) is owned here, so dropping a single [`Teardown`] guard releases
//! all of it.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use js_sys::Array;
use wasm_bindgen::prelude::*;
use web_sys::{
	Element, Event, EventTarget, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit,
	ResizeObserver, Window,
};

use super::types::RenderTarget;

/// Visibility ratios at which the intersection observer reports.
const INTERSECTION_THRESHOLDS: [f64; 3] = [0.0, 0.01, 0.1];

/// Decides whether the frame loop should be running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopPolicy {
	pub movement: bool,
	/// Host-level switch; `false` freezes the field on a still frame.
	pub visible: bool,
	pub target: RenderTarget,
	pub preview_motion: bool,
	pub on_screen: bool,
}

impl LoopPolicy {
	/// Whether this field ever animates, regardless of visibility.
	pub fn allows_animation(&self) -> bool {
		let target_animates = match self.target {
			RenderTarget::Live | RenderTarget::Canvas => true,
			RenderTarget::Preview => self.preview_motion,
			RenderTarget::Export | RenderTarget::Thumbnail => false,
		};
		self.movement && self.visible && target_animates
	}

	pub fn should_animate(&self) -> bool {
		self.allows_animation() && self.on_screen
	}
}

/// Whether an intersection entry shows any part of the element.
fn on_screen(is_intersecting: bool, ratio: f64) -> bool {
	is_intersecting && ratio > 0.0
}

struct FrameLoopInner {
	window: Window,
	handle: Cell<Option<i32>>,
	alive: Cell<bool>,
	callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl FrameLoopInner {
	fn schedule(&self) {
		if self.handle.get().is_some() {
			return;
		}
		if let Some(cb) = self.callback.borrow().as_ref() {
			if let Ok(id) = self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
				self.handle.set(Some(id));
			}
		}
	}

	fn cancel_pending(&self) {
		if let Some(id) = self.handle.take() {
			let _ = self.window.cancel_animation_frame(id);
		}
	}
}

/// A `requestAnimationFrame` loop calling `body` with the frame timestamp.
///
/// The scheduled closure only holds a weak reference back to the loop, so the
/// loop is freed as soon as the last [`FrameLoop`] handle is dropped.
#[derive(Clone)]
pub struct FrameLoop {
	inner: Rc<FrameLoopInner>,
}

impl FrameLoop {
	pub fn new(window: Window, mut body: impl FnMut(f64) + 'static) -> Self {
		let inner = Rc::new(FrameLoopInner {
			window,
			handle: Cell::new(None),
			alive: Cell::new(false),
			callback: RefCell::new(None),
		});

		let weak: Weak<FrameLoopInner> = Rc::downgrade(&inner);
		let callback = Closure::<dyn FnMut(f64)>::new(move |now: f64| {
			let Some(inner) = weak.upgrade() else {
				return;
			};
			inner.handle.set(None);
			if !inner.alive.get() {
				return;
			}
			body(now);
			// body may have paused the loop
			if inner.alive.get() {
				inner.schedule();
			}
		});
		*inner.callback.borrow_mut() = Some(callback);

		Self { inner }
	}

	pub fn start(&self) {
		self.inner.alive.set(true);
		self.inner.schedule();
	}

	/// Cancels the pending frame; `start` resumes.
	pub fn pause(&self) {
		self.inner.alive.set(false);
		self.inner.cancel_pending();
	}

	/// Stops for good and releases the frame closure.
	pub fn cancel(&self) {
		self.pause();
		self.inner.callback.borrow_mut().take();
	}

	pub fn is_running(&self) -> bool {
		self.inner.alive.get()
	}
}

/// Owns every listener and observer registered by a mounted field.
#[derive(Default)]
pub struct Listeners {
	events: Vec<(EventTarget, &'static str, Closure<dyn FnMut(Event)>)>,
	resize: Option<(ResizeObserver, Closure<dyn FnMut(Array)>)>,
	intersection: Option<(IntersectionObserver, Closure<dyn FnMut(Array)>)>,
}

impl Listeners {
	pub fn listen(
		&mut self,
		target: &EventTarget,
		name: &'static str,
		handler: impl FnMut(Event) + 'static,
	) -> Result<(), JsValue> {
		let closure = Closure::<dyn FnMut(Event)>::new(handler);
		target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
		self.events.push((target.clone(), name, closure));
		Ok(())
	}

	/// Calls `on_resize` when `element`'s box changes.
	pub fn observe_resize(&mut self, element: &Element, mut on_resize: impl FnMut() + 'static) -> Result<(), JsValue> {
		let closure = Closure::<dyn FnMut(Array)>::new(move |_entries: Array| on_resize());
		let observer = ResizeObserver::new(closure.as_ref().unchecked_ref())?;
		observer.observe(element);
		if let Some((previous, _)) = self.resize.replace((observer, closure)) {
			previous.disconnect();
		}
		Ok(())
	}

	/// Calls `on_change` with whether `element` is on screen.
	pub fn observe_intersection(
		&mut self,
		element: &Element,
		mut on_change: impl FnMut(bool) + 'static,
	) -> Result<(), JsValue> {
		let closure = Closure::<dyn FnMut(Array)>::new(move |entries: Array| {
			let latest = entries.iter().last().map(|e| e.unchecked_into::<IntersectionObserverEntry>());
			if let Some(entry) = latest {
				on_change(on_screen(entry.is_intersecting(), entry.intersection_ratio()));
			}
		});
		let options = IntersectionObserverInit::new();
		let thresholds: Array = INTERSECTION_THRESHOLDS.iter().map(|&t| JsValue::from_f64(t)).collect();
		options.set_threshold(&thresholds);
		let observer = IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &options)?;
		observer.observe(element);
		if let Some((previous, _)) = self.intersection.replace((observer, closure)) {
			previous.disconnect();
		}
		Ok(())
	}

	/// Removes every listener and disconnects both observers.
	pub fn detach_all(&mut self) {
		for (target, name, closure) in self.events.drain(..) {
			let _ = target.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
		}
		if let Some((observer, _)) = self.resize.take() {
			observer.disconnect();
		}
		if let Some((observer, _)) = self.intersection.take() {
			observer.disconnect();
		}
	}
}

impl Drop for Listeners {
	fn drop(&mut self) {
		self.detach_all();
	}
}

/// Releases a mounted field when dropped: cancels the frame loop, then
/// detaches every listener.
pub struct Teardown {
	frame_loop: FrameLoop,
	listeners: Listeners,
}

impl Teardown {
	pub fn new(frame_loop: FrameLoop, listeners: Listeners) -> Self {
		Self { frame_loop, listeners }
	}
}

impl Drop for Teardown {
	fn drop(&mut self) {
		self.frame_loop.cancel();
		self.listeners.detach_all();
	}
}
