//! Canvas rendering for the particle field.
//!
//! Draw order is fixed so particles sit above their links:
//! 1. Clear (identity transform) and optional backdrop
//! 2. Connection lines
//! 3. Particles, with optional glow

use std::f64::consts::{PI, TAU};

use web_sys::CanvasRenderingContext2d;

use super::color::Color;
use super::particles::{Particle, ParticleBody, Primitive};
use super::state::FieldState;
use super::types::{ConnectionConfig, GlowConfig};

/// Link distance used when the configured one is not positive.
pub const DEFAULT_LINK_DISTANCE: f64 = 120.0;

/// A connection line between two particles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
	pub x1: f64,
	pub y1: f64,
	pub x2: f64,
	pub y2: f64,
	pub alpha: f64,
}

/// Renders one frame of `state` onto `ctx`.
pub fn render(ctx: &CanvasRenderingContext2d, state: &FieldState) {
	let viewport = state.viewport();
	let config = state.config();

	let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
	let (backing_w, backing_h) = viewport.backing_size();
	ctx.clear_rect(0.0, 0.0, backing_w as f64, backing_h as f64);
	let _ = ctx.set_transform(viewport.dpr, 0.0, 0.0, viewport.dpr, 0.0, 0.0);

	if let Some(backdrop) = state.backdrop().filter(|c| c.a > 0.0) {
		ctx.set_fill_style_str(&backdrop.with_opacity(1.0));
		ctx.fill_rect(0.0, 0.0, viewport.width, viewport.height);
	}

	if config.connections.enable {
		let segments = connection_segments(state.particles(), &config.connections, viewport.size_scale);
		draw_connections(ctx, &segments, state.link_color(), line_width(config.connections.width, viewport.size_scale));
	}

	for p in state.particles() {
		draw_particle(ctx, p, &config.glow);
	}
}

/// `opacity * (1 - d / max_distance)`, falling to zero at the cutoff.
pub fn connection_alpha(opacity: f64, distance: f64, max_distance: f64) -> f64 {
	if max_distance <= 0.0 || distance >= max_distance {
		return 0.0;
	}
	opacity.clamp(0.0, 1.0) * (1.0 - distance / max_distance)
}

/// Link cutoff in logical pixels after the proportional scale.
pub fn max_link_distance(connections: &ConnectionConfig, size_scale: f64) -> f64 {
	let distance = if connections.distance > 0.0 {
		connections.distance
	} else {
		DEFAULT_LINK_DISTANCE
	};
	distance * size_scale
}

pub fn line_width(width: f64, size_scale: f64) -> f64 {
	if width > 0.0 {
		(width * size_scale.clamp(0.75, 1.5)).max(0.25)
	} else {
		1.0
	}
}

/// Every unordered pair closer than the link cutoff, in pair order.
///
/// With `max_links > 0` a pair is skipped once either end already has that
/// many links. This is a plain O(n²) scan, fine for a few hundred particles.
pub fn connection_segments(particles: &[Particle], connections: &ConnectionConfig, size_scale: f64) -> Vec<Segment> {
	let max_distance = max_link_distance(connections, size_scale);
	let cap = connections.max_links as usize;
	let mut links = vec![0usize; particles.len()];
	let mut segments = Vec::new();

	for (i, a) in particles.iter().enumerate() {
		for (j, b) in particles.iter().enumerate().skip(i + 1) {
			if cap > 0 && (links[i] >= cap || links[j] >= cap) {
				continue;
			}
			let d = (b.x - a.x).hypot(b.y - a.y);
			let alpha = connection_alpha(connections.opacity, d, max_distance);
			if alpha <= 0.0 {
				continue;
			}
			links[i] += 1;
			links[j] += 1;
			segments.push(Segment {
				x1: a.x,
				y1: a.y,
				x2: b.x,
				y2: b.y,
				alpha,
			});
		}
	}

	segments
}

fn draw_connections(ctx: &CanvasRenderingContext2d, segments: &[Segment], color: Color, width: f64) {
	ctx.set_line_width(width);
	for s in segments {
		ctx.set_stroke_style_str(&color.with_opacity(s.alpha));
		ctx.begin_path();
		ctx.move_to(s.x1, s.y1);
		ctx.line_to(s.x2, s.y2);
		ctx.stroke();
	}
}

/// Five-point star outline: ten vertices alternating between `outer` and
/// `outer * 0.5`, starting straight up.
pub fn star_vertices(x: f64, y: f64, outer: f64) -> [(f64, f64); 10] {
	let inner = outer * 0.5;
	let step = PI / 5.0;
	let mut rotation = PI / 2.0 * 3.0;
	let mut vertices = [(0.0, 0.0); 10];
	for (i, v) in vertices.iter_mut().enumerate() {
		let r = if i % 2 == 0 { outer } else { inner };
		*v = (x + rotation.cos() * r, y + rotation.sin() * r);
		rotation += step;
	}
	vertices
}

fn draw_particle(ctx: &CanvasRenderingContext2d, p: &Particle, glow: &GlowConfig) {
	let size = p.size * p.hover_scale;
	let glow_alpha = glow.intensity * 0.5;

	ctx.save();
	if glow.enable {
		ctx.set_shadow_blur(glow.size * size * 0.5);
		ctx.set_shadow_color(&p.color.to_css());
	}

	match &p.body {
		ParticleBody::Shape(shape) => {
			ctx.set_global_alpha(if glow.enable { glow_alpha } else { 1.0 });
			ctx.set_fill_style_str(&p.color.with_opacity(p.opacity));
			trace_shape(ctx, *shape, p.x, p.y, size);
			ctx.fill();
		}
		ParticleBody::Glyph { sprite: Some(sprite), .. } => {
			let alpha = if glow.enable { p.opacity * glow_alpha } else { p.opacity };
			ctx.set_global_alpha(alpha.clamp(0.0, 1.0));
			ctx.set_image_smoothing_enabled(true);
			let side = size * 2.0;
			let _ = ctx.draw_image_with_html_canvas_element_and_dw_and_dh(
				&sprite.canvas,
				p.x - size,
				p.y - size,
				side,
				side,
			);
		}
		ParticleBody::Glyph { sprite: None, .. } => {}
	}
	ctx.restore();
}

fn trace_shape(ctx: &CanvasRenderingContext2d, shape: Primitive, x: f64, y: f64, size: f64) {
	ctx.begin_path();
	match shape {
		Primitive::Circle => {
			let _ = ctx.arc(x, y, size, 0.0, TAU);
		}
		Primitive::Square => ctx.rect(x - size, y - size, size * 2.0, size * 2.0),
		Primitive::Star => {
			let vertices = star_vertices(x, y, size);
			ctx.move_to(vertices[0].0, vertices[0].1);
			for &(vx, vy) in &vertices[1..] {
				ctx.line_to(vx, vy);
			}
			ctx.close_path();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn at(x: f64, y: f64) -> Particle {
		Particle {
			x,
			y,
			vx: 0.0,
			vy: 0.0,
			size: 1.0,
			color: Color::WHITE,
			base_opacity: 1.0,
			twinkle_phase: 0.0,
			body: ParticleBody::Shape(Primitive::Circle),
			opacity: 1.0,
			hover_scale: 1.0,
		}
	}

	fn links(distance: f64, max_links: u32) -> ConnectionConfig {
		ConnectionConfig {
			enable: true,
			distance,
			opacity: 0.5,
			max_links,
			..ConnectionConfig::default()
		}
	}

	#[test]
	fn alpha_falls_off_linearly_to_the_cutoff() {
		assert_eq!(connection_alpha(0.5, 0.0, 100.0), 0.5);
		assert_eq!(connection_alpha(0.5, 50.0, 100.0), 0.25);
		assert_eq!(connection_alpha(0.5, 100.0, 100.0), 0.0);
		assert_eq!(connection_alpha(0.5, 150.0, 100.0), 0.0);
		assert_eq!(connection_alpha(4.0, 0.0, 100.0), 1.0);
	}

	#[test]
	fn link_distance_scales_and_defaults() {
		assert_eq!(max_link_distance(&links(200.0, 0), 0.5), 100.0);
		assert_eq!(max_link_distance(&links(0.0, 0), 1.0), DEFAULT_LINK_DISTANCE);
		assert_eq!(max_link_distance(&links(-5.0, 0), 2.0), 240.0);
	}

	#[test]
	fn line_width_rule() {
		assert_eq!(line_width(1.0, 1.0), 1.0);
		assert_eq!(line_width(2.0, 0.2), 1.5);
		assert_eq!(line_width(2.0, 2.0), 3.0);
		assert_eq!(line_width(0.1, 1.0), 0.25);
		assert_eq!(line_width(0.0, 1.0), 1.0);
	}

	#[test]
	fn segments_cover_close_pairs_only() {
		let ps = [at(0.0, 0.0), at(30.0, 40.0), at(500.0, 500.0)];
		let segments = connection_segments(&ps, &links(100.0, 0), 1.0);
		assert_eq!(segments.len(), 1);
		assert_eq!((segments[0].x2, segments[0].y2), (30.0, 40.0));
		assert!((segments[0].alpha - 0.25).abs() < 1e-12);
	}

	#[test]
	fn link_cap_limits_links_per_particle() {
		let ps: Vec<_> = (0..5).map(|i| at(i as f64, 0.0)).collect();
		assert_eq!(connection_segments(&ps, &links(100.0, 0), 1.0).len(), 10);

		let capped = connection_segments(&ps, &links(100.0, 1), 1.0);
		assert_eq!(capped.len(), 2);
		assert_eq!((capped[0].x1, capped[0].x2), (0.0, 1.0));
		assert_eq!((capped[1].x1, capped[1].x2), (2.0, 3.0));
	}

	#[test]
	fn star_alternates_outer_and_inner_radius() {
		let v = star_vertices(0.0, 0.0, 10.0);
		assert!((v[0].0).abs() < 1e-9 && (v[0].1 + 10.0).abs() < 1e-9);
		for (i, (x, y)) in v.iter().enumerate() {
			let r = x.hypot(*y);
			let expected = if i % 2 == 0 { 10.0 } else { 5.0 };
			assert!((r - expected).abs() < 1e-9, "vertex {i}: {r}");
		}
	}
}
