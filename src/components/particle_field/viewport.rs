//! Canvas extents and the proportional size scale.
//!
//! # Coordinate spaces
//!
//! - **Logical**: CSS pixels of the container. Particles live here and every
//!   drawing command is issued in logical units.
//! - **Backing**: device pixels of the canvas bitmap, `logical * dpr`. A
//!   `(dpr, 0, 0, dpr, 0, 0)` transform maps logical onto backing.
//!
//! Particle sizes, speeds and link distances are multiplied by a size scale
//! derived from how the container compares to the 800×600 intrinsic layout, so
//! a field looks alike in a thumbnail and on a full page.

use super::particles::Particle;

/// Intrinsic layout width the size scale is measured against.
pub const INTRINSIC_WIDTH: f64 = 800.0;
/// Intrinsic layout height the size scale is measured against.
pub const INTRINSIC_HEIGHT: f64 = 600.0;
/// Extents at or below this (either axis) mean layout has not happened yet.
pub const DEGENERATE_EXTENT: f64 = 10.0;

const MIN_SIZE_SCALE: f64 = 0.2;
const MAX_SIZE_SCALE: f64 = 2.0;

/// `clamp(min(w / 800, h / 600), 0.2, 2)`.
pub fn size_scale(width: f64, height: f64) -> f64 {
	(width / INTRINSIC_WIDTH)
		.min(height / INTRINSIC_HEIGHT)
		.clamp(MIN_SIZE_SCALE, MAX_SIZE_SCALE)
}

/// Logical size from an explicit override, the container box, or the
/// intrinsic size when the box reports nothing. Never below 1px.
pub fn logical_size(container: (f64, f64), overrides: (Option<f64>, Option<f64>)) -> (f64, f64) {
	let pick = |explicit: Option<f64>, measured: f64, intrinsic: f64| {
		let value = explicit.filter(|v| v.is_finite()).unwrap_or(measured);
		let value = if value.is_finite() && value > 0.0 { value } else { intrinsic };
		value.max(1.0)
	};
	(
		pick(overrides.0, container.0, INTRINSIC_WIDTH),
		pick(overrides.1, container.1, INTRINSIC_HEIGHT),
	)
}

/// What a resize requires of the particle set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResizeAction {
	/// Regenerate every particle from the configuration.
	Reseed,
	/// Multiply positions by `(sx, sy)` and velocity/size by `sf`.
	Rescale { sx: f64, sy: f64, sf: f64 },
	/// Logical size is unchanged.
	Unchanged,
}

/// Current canvas extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	/// Logical width; 0 before the first resize.
	pub width: f64,
	/// Logical height; 0 before the first resize.
	pub height: f64,
	/// Device pixel ratio, at least 1.
	pub dpr: f64,
	pub size_scale: f64,
}

impl Default for Viewport {
	fn default() -> Self {
		Self {
			width: 0.0,
			height: 0.0,
			dpr: 1.0,
			size_scale: 1.0,
		}
	}
}

impl Viewport {
	pub fn new(width: f64, height: f64, dpr: f64) -> Self {
		Self {
			width,
			height,
			dpr: dpr.max(1.0),
			size_scale: size_scale(width, height),
		}
	}

	/// Canvas bitmap size in device pixels.
	pub fn backing_size(&self) -> (u32, u32) {
		(
			(self.width * self.dpr).floor() as u32,
			(self.height * self.dpr).floor() as u32,
		)
	}

	/// Applies a new logical size and DPR, deciding how the particle set must
	/// follow.
	///
	/// The set is reseeded when it is empty or when the canvas grows out of a
	/// degenerate size (particles seeded before layout are all crammed into a
	/// few pixels). Any other change in logical size rescales in place.
	pub fn resize(&mut self, width: f64, height: f64, dpr: f64, has_particles: bool) -> ResizeAction {
		let prev_width = if self.width > 0.0 { self.width } else { width };
		let prev_height = if self.height > 0.0 { self.height } else { height };
		let prev_scale = self.size_scale;

		*self = Self::new(width, height, dpr);

		let was_tiny = prev_width <= DEGENERATE_EXTENT || prev_height <= DEGENERATE_EXTENT;
		let now_grown = width > DEGENERATE_EXTENT && height > DEGENERATE_EXTENT;

		if !has_particles || (was_tiny && now_grown) {
			ResizeAction::Reseed
		} else if prev_width != width || prev_height != height {
			ResizeAction::Rescale {
				sx: width / prev_width,
				sy: height / prev_height,
				sf: if prev_scale > 0.0 { self.size_scale / prev_scale } else { 1.0 },
			}
		} else {
			ResizeAction::Unchanged
		}
	}
}

/// Proportionally rescales particles after a resize. Glyph sprites are left to
/// the caller, which owns the rasterizer.
pub fn rescale_particles(particles: &mut [Particle], sx: f64, sy: f64, sf: f64) {
	for p in particles {
		p.x *= sx;
		p.y *= sy;
		p.vx *= sf;
		p.vy *= sf;
		p.size *= sf;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn size_scale_is_clamped() {
		assert_eq!(size_scale(800.0, 600.0), 1.0);
		assert_eq!(size_scale(400.0, 600.0), 0.5);
		assert_eq!(size_scale(10.0, 10.0), 0.2);
		assert_eq!(size_scale(4000.0, 3000.0), 2.0);
	}

	#[test]
	fn logical_size_prefers_overrides_and_falls_back() {
		assert_eq!(logical_size((300.0, 200.0), (None, None)), (300.0, 200.0));
		assert_eq!(logical_size((300.0, 200.0), (Some(640.0), None)), (640.0, 200.0));
		assert_eq!(logical_size((0.0, 0.0), (None, None)), (800.0, 600.0));
		assert_eq!(logical_size((0.4, 0.4), (None, None)), (1.0, 1.0));
	}

	#[test]
	fn backing_store_uses_device_pixels() {
		let vp = Viewport::new(300.5, 200.0, 2.0);
		assert_eq!(vp.backing_size(), (601, 400));
		assert_eq!(Viewport::new(10.0, 10.0, 0.5).dpr, 1.0);
	}

	#[test]
	fn first_resize_of_empty_set_reseeds() {
		let mut vp = Viewport::default();
		assert_eq!(vp.resize(800.0, 600.0, 1.0, false), ResizeAction::Reseed);
	}

	#[test]
	fn growing_out_of_degenerate_size_reseeds() {
		let mut vp = Viewport::new(1.0, 1.0, 1.0);
		assert_eq!(vp.resize(640.0, 480.0, 1.0, true), ResizeAction::Reseed);
	}

	#[test]
	fn ordinary_resize_rescales() {
		let mut vp = Viewport::new(400.0, 300.0, 1.0);
		let action = vp.resize(800.0, 600.0, 2.0, true);
		assert_eq!(
			action,
			ResizeAction::Rescale {
				sx: 2.0,
				sy: 2.0,
				sf: 2.0
			}
		);
		assert_eq!(vp.dpr, 2.0);
		assert_eq!(vp.resize(800.0, 600.0, 1.0, true), ResizeAction::Unchanged);
	}
}
