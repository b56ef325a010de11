//! Particle entities and the initial jittered-grid population.

use std::f64::consts::TAU;

use rand::Rng;

use super::color::Color;
use super::sprite::{FALLBACK_GLYPHS, GlyphSprite, SpriteRasterizer};
use super::types::{FieldConfig, MoveDirection, ShapeKind};
use super::viewport::Viewport;

/// Speed setting to pixels per 1/60 s tick.
const SPEED_UNIT: f64 = 0.20;
/// Share of `speed` used by the undirected drift.
const DRIFT_FACTOR: f64 = 0.8;
/// Floor for sampled sizes so every particle stays drawable.
const MIN_SIZE: f64 = 0.01;

/// Outline drawn for a non-text particle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
	Circle,
	Square,
	Star,
}

/// What a particle looks like.
#[derive(Clone, Debug)]
pub enum ParticleBody {
	Shape(Primitive),
	Glyph {
		glyph: String,
		/// `None` until rasterization succeeds; the particle is not drawn meanwhile.
		sprite: Option<GlyphSprite>,
	},
}

/// A single floating particle.
#[derive(Clone, Debug)]
pub struct Particle {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Base radius in logical pixels.
	pub size: f64,
	pub color: Color,
	pub base_opacity: f64,
	pub twinkle_phase: f64,
	pub body: ParticleBody,
	/// Effective opacity of the current frame.
	pub opacity: f64,
	/// Render-time size multiplier from hover; never folded into `size`.
	pub hover_scale: f64,
}

impl Particle {
	/// Rebuilds the glyph sprite if it is missing or was rendered for another
	/// size or DPR. Returns whether a rasterization was attempted.
	pub fn refresh_sprite(&mut self, dpr: f64, rasterizer: &mut dyn SpriteRasterizer) -> bool {
		let size = self.size;
		let ParticleBody::Glyph { glyph, sprite } = &mut self.body else {
			return false;
		};
		if sprite.as_ref().is_some_and(|s| s.fits(size, dpr)) {
			return false;
		}
		*sprite = rasterizer.rasterize(glyph, size, dpr);
		true
	}
}

/// Initial velocity for a movement direction with speed setting `speed`.
pub fn initial_velocity<R: Rng + ?Sized>(direction: MoveDirection, speed: f64, rng: &mut R) -> (f64, f64) {
	let s = speed * SPEED_UNIT;
	let mut spread = |half_width: f64| (rng.random::<f64>() * 2.0 - 1.0) * half_width;
	match direction {
		MoveDirection::Top => (0.0, -s),
		MoveDirection::Bottom => (0.0, s),
		MoveDirection::Left => (-s, 0.0),
		MoveDirection::Right => (s, 0.0),
		MoveDirection::Random => (spread(s), spread(s)),
		MoveDirection::None => (spread(s * DRIFT_FACTOR), spread(s * DRIFT_FACTOR)),
	}
}

/// Creates `config.amount` particles spread over the viewport.
///
/// Placement uses a jittered grid: a near-square grid of
/// `round(sqrt(n * aspect))` columns covers the canvas and each particle lands
/// at a random point between 10% and 90% of its cell. This keeps coverage even
/// without visible rows. Trailing cells of the last row stay empty.
pub fn create_particles<R: Rng + ?Sized>(
	config: &FieldConfig,
	viewport: &Viewport,
	palette: &[Color],
	rng: &mut R,
	rasterizer: &mut dyn SpriteRasterizer,
) -> Vec<Particle> {
	let n = config.amount;
	let mut particles = Vec::with_capacity(n);
	if n == 0 {
		return particles;
	}

	let (width, height) = (viewport.width.max(1.0), viewport.height.max(1.0));
	let aspect = width / height;
	let columns = ((n as f64 * aspect).sqrt().round() as usize).max(1);
	let rows = n.div_ceil(columns).max(1);
	let (cell_w, cell_h) = (width / columns as f64, height / rows as f64);

	let glyphs = config.shape.glyphs();
	let primitive = match config.shape.kind {
		ShapeKind::Circle => Some(Primitive::Circle),
		ShapeKind::Square => Some(Primitive::Square),
		ShapeKind::Star => Some(Primitive::Star),
		ShapeKind::Text => None,
	};

	'grid: for row in 0..rows {
		for column in 0..columns {
			if particles.len() == n {
				break 'grid;
			}
			let index = particles.len();

			let color = if palette.is_empty() {
				Color::WHITE
			} else {
				palette[rng.random_range(0..palette.len())]
			};
			let (vx, vy) = if config.movement.enable {
				initial_velocity(config.movement.direction, config.movement.speed, rng)
			} else {
				(0.0, 0.0)
			};
			let size = sanitize_size(config.size.sample(rng) * viewport.size_scale);
			let base_opacity = sanitize_opacity(config.opacity.sample(rng));

			let body = match primitive {
				Some(shape) => ParticleBody::Shape(shape),
				None => {
					let glyph = if glyphs.is_empty() {
						FALLBACK_GLYPHS[rng.random_range(0..FALLBACK_GLYPHS.len())].to_string()
					} else {
						glyphs[index % glyphs.len()].clone()
					};
					let sprite = rasterizer.rasterize(&glyph, size, viewport.dpr);
					ParticleBody::Glyph { glyph, sprite }
				}
			};

			let x = (column as f64 + rng.random_range(0.1..0.9)) * cell_w;
			let y = (row as f64 + rng.random_range(0.1..0.9)) * cell_h;

			particles.push(Particle {
				x,
				y,
				vx,
				vy,
				size,
				color,
				base_opacity,
				twinkle_phase: rng.random::<f64>() * TAU,
				body,
				opacity: base_opacity,
				hover_scale: 1.0,
			});
		}
	}

	particles
}

fn sanitize_size(size: f64) -> f64 {
	if size.is_finite() { size.max(MIN_SIZE) } else { MIN_SIZE }
}

fn sanitize_opacity(opacity: f64) -> f64 {
	if opacity.is_finite() { opacity.clamp(0.0, 1.0) } else { 1.0 }
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand::rngs::SmallRng;

	use super::*;
	use crate::components::particle_field::types::{Distribution, ShapeConfig};

	/// Counts requests without producing bitmaps.
	#[derive(Default)]
	struct CountingRasterizer {
		requests: Vec<(String, f64)>,
	}

	impl SpriteRasterizer for CountingRasterizer {
		fn rasterize(&mut self, glyph: &str, size: f64, _dpr: f64) -> Option<GlyphSprite> {
			self.requests.push((glyph.to_string(), size));
			None
		}
	}

	fn glyph(p: &Particle) -> Option<&str> {
		match &p.body {
			ParticleBody::Glyph { glyph, .. } => Some(glyph),
			ParticleBody::Shape(_) => None,
		}
	}

	fn build(config: &FieldConfig, viewport: &Viewport, seed: u64) -> Vec<Particle> {
		let mut rng = SmallRng::seed_from_u64(seed);
		let palette = [Color::WHITE, Color::rgb(255, 0, 0)];
		create_particles(config, viewport, &palette, &mut rng, &mut CountingRasterizer::default())
	}

	#[test]
	fn count_matches_amount() {
		let viewport = Viewport::new(800.0, 600.0, 1.0);
		for amount in [0, 1, 2, 7, 50, 51, 299, 300] {
			let config = FieldConfig {
				amount,
				..FieldConfig::default()
			};
			assert_eq!(build(&config, &viewport, amount as u64).len(), amount);
		}
	}

	#[test]
	fn particles_cover_the_canvas_inside_their_cells() {
		let viewport = Viewport::new(1000.0, 250.0, 1.0);
		let config = FieldConfig {
			amount: 40,
			..FieldConfig::default()
		};
		let particles = build(&config, &viewport, 11);
		for p in &particles {
			assert!(p.x > 0.0 && p.x < 1000.0, "x {}", p.x);
			assert!(p.y > 0.0 && p.y < 250.0, "y {}", p.y);
		}
		// columns = round(sqrt(40 * 4)) = 13, so the first particle sits in the
		// first 1000/13 px wide cell.
		assert!(particles[0].x < 1000.0 / 13.0 * 0.9 + 1e-9);
		assert!(particles.iter().any(|p| p.x > 500.0));
		assert!(particles.iter().any(|p| p.y > 125.0));
	}

	#[test]
	fn sizes_and_opacities_respect_distributions() {
		let viewport = Viewport::new(400.0, 300.0, 1.0);
		let config = FieldConfig {
			amount: 200,
			size: Distribution::Range { min: 1.0, max: 5.0 },
			opacity: Distribution::Range { min: 0.2, max: 0.7 },
			..FieldConfig::default()
		};
		for p in build(&config, &viewport, 5) {
			// size_scale for 400x300 is 0.5
			assert!(p.size > 0.0 && (0.5..=2.5).contains(&p.size), "size {}", p.size);
			assert!((0.2..=0.7).contains(&p.base_opacity));
			assert_eq!(p.opacity, p.base_opacity);
			assert!((0.0..TAU).contains(&p.twinkle_phase));
		}
	}

	#[test]
	fn out_of_range_opacity_is_clamped() {
		let viewport = Viewport::new(800.0, 600.0, 1.0);
		let config = FieldConfig {
			amount: 10,
			opacity: Distribution::Value(3.0),
			size: Distribution::Value(-2.0),
			..FieldConfig::default()
		};
		for p in build(&config, &viewport, 1) {
			assert_eq!(p.base_opacity, 1.0);
			assert!(p.size > 0.0);
		}
	}

	#[test]
	fn direction_policy_sets_velocity() {
		let mut rng = SmallRng::seed_from_u64(9);
		let s = 2.0 * SPEED_UNIT;
		assert_eq!(initial_velocity(MoveDirection::Top, 2.0, &mut rng), (0.0, -s));
		assert_eq!(initial_velocity(MoveDirection::Bottom, 2.0, &mut rng), (0.0, s));
		assert_eq!(initial_velocity(MoveDirection::Left, 2.0, &mut rng), (-s, 0.0));
		assert_eq!(initial_velocity(MoveDirection::Right, 2.0, &mut rng), (s, 0.0));
		for _ in 0..500 {
			let (vx, vy) = initial_velocity(MoveDirection::Random, 2.0, &mut rng);
			assert!(vx.abs() <= s && vy.abs() <= s);
			let (vx, vy) = initial_velocity(MoveDirection::None, 2.0, &mut rng);
			assert!(vx.abs() <= s * 0.8 && vy.abs() <= s * 0.8);
		}
	}

	#[test]
	fn disabled_movement_creates_still_particles() {
		let viewport = Viewport::new(800.0, 600.0, 1.0);
		let mut config = FieldConfig::default();
		config.movement.enable = false;
		assert!(build(&config, &viewport, 2).iter().all(|p| p.vx == 0.0 && p.vy == 0.0));
	}

	#[test]
	fn text_particles_cycle_glyphs_and_request_sprites() {
		let viewport = Viewport::new(800.0, 600.0, 2.0);
		let config = FieldConfig {
			amount: 5,
			shape: ShapeConfig {
				kind: ShapeKind::Text,
				text: Some("ab".into()),
			},
			..FieldConfig::default()
		};
		let mut rng = SmallRng::seed_from_u64(4);
		let mut rasterizer = CountingRasterizer::default();
		let particles = create_particles(&config, &viewport, &[Color::WHITE], &mut rng, &mut rasterizer);

		let glyphs: Vec<_> = particles.iter().filter_map(glyph).collect();
		assert_eq!(glyphs, ["a", "b", "a", "b", "a"]);
		assert_eq!(rasterizer.requests.len(), 5);
		assert_eq!(rasterizer.requests[0].1, particles[0].size);
	}

	#[test]
	fn text_shape_without_text_uses_fallback_glyphs() {
		let viewport = Viewport::new(800.0, 600.0, 1.0);
		let config = FieldConfig {
			amount: 20,
			shape: ShapeConfig {
				kind: ShapeKind::Text,
				text: None,
			},
			..FieldConfig::default()
		};
		for p in build(&config, &viewport, 8) {
			assert!(FALLBACK_GLYPHS.contains(&glyph(&p).unwrap()));
		}
	}

	#[test]
	fn missing_sprites_are_retried_on_refresh() {
		let viewport = Viewport::new(800.0, 600.0, 1.0);
		let config = FieldConfig {
			amount: 3,
			shape: ShapeConfig {
				kind: ShapeKind::Text,
				text: Some("x".into()),
			},
			..FieldConfig::default()
		};
		let mut particles = build(&config, &viewport, 3);
		let mut rasterizer = CountingRasterizer::default();
		for p in &mut particles {
			assert!(p.refresh_sprite(1.0, &mut rasterizer));
		}
		assert_eq!(rasterizer.requests.len(), 3);

		let mut circle = build(&FieldConfig::default(), &viewport, 3).remove(0);
		assert!(!circle.refresh_sprite(1.0, &mut rasterizer));
	}
}
