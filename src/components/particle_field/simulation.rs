//! Per-frame particle update: motion, edges, twinkle and pointer hover.

use rand::Rng;

use super::particles::Particle;
use super::types::{BoundaryMode, FieldConfig, HoverMode, MoveDirection, TwinkleConfig};
use super::viewport::Viewport;

/// Nominal frame duration (60 Hz) in milliseconds.
pub const FRAME_MS: f64 = 16.666;

const MIN_STEP: f64 = 0.5;
const MAX_STEP: f64 = 2.5;
const BOUNCE_DAMPING: f64 = 0.98;
const TWINKLE_RATE: f64 = 0.02;

const MIN_HOVER_RADIUS: f64 = 10.0;
const MAX_HOVER_RADIUS: f64 = 60.0;
const HOVER_STRENGTH: f64 = 0.001;
/// Force used when the configured one is unset or non-positive.
const FALLBACK_HOVER_FORCE: f64 = 100.0;

/// Elapsed wall-clock time as a multiple of a nominal frame. Clamped so
/// jittery frames stay smooth and a stalled tab does not teleport particles.
pub fn step_multiplier(dt_ms: f64) -> f64 {
	if !dt_ms.is_finite() {
		return 1.0;
	}
	(dt_ms / FRAME_MS).clamp(MIN_STEP, MAX_STEP)
}

/// Pointer position in canvas-logical coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pointer {
	pub x: f64,
	pub y: f64,
	/// Whether the pointer is currently over the canvas.
	pub hovering: bool,
}

impl Pointer {
	pub fn outside() -> Self {
		Self {
			x: -1.0,
			y: -1.0,
			hovering: false,
		}
	}
}

/// Effective opacity at `phase`, oscillating between the twinkle bounds.
pub fn twinkle_opacity(twinkle: &TwinkleConfig, phase: f64) -> f64 {
	let m = (phase.sin() + 1.0) / 2.0;
	twinkle.min_opacity + (twinkle.max_opacity - twinkle.min_opacity) * m
}

/// Advances every particle by `dt_ms` of wall-clock time.
pub fn advance<R: Rng + ?Sized>(
	particles: &mut [Particle],
	dt_ms: f64,
	config: &FieldConfig,
	viewport: &Viewport,
	pointer: &Pointer,
	rng: &mut R,
) {
	let step = step_multiplier(dt_ms);
	let (width, height) = (viewport.width, viewport.height);
	let hover = (config.hover.enable && pointer.hovering).then(|| HoverField::new(config, pointer));

	for p in particles.iter_mut() {
		if config.movement.enable {
			p.x += p.vx * step;
			p.y += p.vy * step;
			match config.movement.boundary {
				BoundaryMode::Bounce => bounce(p, width, height),
				BoundaryMode::Out => respawn_if_outside(p, config.movement.direction, width, height, rng),
			}
		}

		p.opacity = if config.twinkle.enable {
			p.twinkle_phase += config.twinkle.speed * TWINKLE_RATE * step;
			twinkle_opacity(&config.twinkle, p.twinkle_phase)
		} else {
			p.base_opacity
		};

		p.hover_scale = 1.0;
		if let Some(field) = &hover {
			field.apply(p);
		}
	}
}

/// Resets per-frame state for a still frame: base opacity, no hover scaling.
pub fn settle(particles: &mut [Particle]) {
	for p in particles {
		p.opacity = p.base_opacity;
		p.hover_scale = 1.0;
	}
}

fn bounce(p: &mut Particle, width: f64, height: f64) {
	if p.x - p.size < 0.0 || p.x + p.size > width {
		p.vx = -p.vx * BOUNCE_DAMPING;
		p.x = p.x.min(width - p.size).max(p.size);
	}
	if p.y - p.size < 0.0 || p.y + p.size > height {
		p.vy = -p.vy * BOUNCE_DAMPING;
		p.y = p.y.min(height - p.size).max(p.size);
	}
}

/// Once a particle has fully left the canvas it re-enters from the edge its
/// direction of travel points away from. Undirected fields fall from the top.
fn respawn_if_outside<R: Rng + ?Sized>(p: &mut Particle, direction: MoveDirection, width: f64, height: f64, rng: &mut R) {
	let off_x = p.x < -p.size || p.x > width + p.size;
	let off_y = p.y < -p.size || p.y > height + p.size;
	if !(off_x || off_y) {
		return;
	}
	match direction {
		MoveDirection::Top => {
			p.x = rng.random::<f64>() * width;
			p.y = height + p.size;
		}
		MoveDirection::Left => {
			p.x = width + p.size;
			p.y = rng.random::<f64>() * height;
		}
		MoveDirection::Right => {
			p.x = -p.size;
			p.y = rng.random::<f64>() * height;
		}
		MoveDirection::Bottom | MoveDirection::Random | MoveDirection::None => {
			p.x = rng.random::<f64>() * width;
			p.y = -p.size;
		}
	}
}

/// Pointer influence for one frame.
struct HoverField {
	x: f64,
	y: f64,
	radius: f64,
	strength: f64,
	mode: HoverMode,
}

impl HoverField {
	fn new(config: &FieldConfig, pointer: &Pointer) -> Self {
		let force = if config.hover.force > 0.0 {
			config.hover.force
		} else {
			FALLBACK_HOVER_FORCE
		};
		Self {
			x: pointer.x,
			y: pointer.y,
			radius: force.clamp(MIN_HOVER_RADIUS, MAX_HOVER_RADIUS),
			strength: force.min(MAX_HOVER_RADIUS) * HOVER_STRENGTH,
			mode: config.hover.mode,
		}
	}

	fn apply(&self, p: &mut Particle) {
		let (dx, dy) = (self.x - p.x, self.y - p.y);
		let d = dx.hypot(dy);
		if d >= self.radius {
			return;
		}
		let t = (self.radius - d) / self.radius;
		match self.mode {
			HoverMode::Bubble => p.hover_scale = 1.0 + t,
			HoverMode::Attract => {
				p.x += dx * self.strength * t;
				p.y += dy * self.strength * t;
			}
			HoverMode::Repulse => {
				p.x -= dx * self.strength * t;
				p.y -= dy * self.strength * t;
			}
			// reserved, no physical effect
			HoverMode::Grab => {}
		}
	}
}
