//! Mutable state of one running particle field.
//!
//! [`FieldState`] owns the particles together with everything derived from
//! the configuration (resolved colors, viewport, RNG, frame clock). The
//! animation driver holds it behind a `RefCell` and drives it through
//! [`FieldState::tick`] and [`FieldState::resize`].

use log::debug;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use super::color::{Color, StyleProbe, resolve_color};
use super::particles::{Particle, create_particles, initial_velocity};
use super::simulation::{self, FRAME_MS, Pointer};
use super::sprite::SpriteRasterizer;
use super::types::FieldConfig;
use super::viewport::{ResizeAction, Viewport, rescale_particles};

/// Colors resolved from a configuration.
#[derive(Clone, Debug, PartialEq)]
struct Palette {
	particles: Vec<Color>,
	backdrop: Option<Color>,
	links: Color,
}

impl Palette {
	fn resolve(config: &FieldConfig, probe: &dyn StyleProbe) -> Self {
		Self {
			particles: config.palette().into_iter().map(|c| resolve_color(c, probe)).collect(),
			backdrop: config.backdrop.as_ref().map(|c| resolve_color(c, probe)),
			links: config
				.connections
				.color
				.as_ref()
				.map_or(Color::WHITE, |c| resolve_color(c, probe)),
		}
	}
}

pub struct FieldState {
	config: FieldConfig,
	viewport: Viewport,
	particles: Vec<Particle>,
	pointer: Pointer,
	palette: Palette,
	rng: SmallRng,
	/// Timestamp of the previous animated frame; `None` makes the next frame
	/// a nominal one.
	last_frame_ms: Option<f64>,
}

impl FieldState {
	/// Creates an empty field; particles are seeded on the first resize.
	pub fn new(config: FieldConfig, probe: &dyn StyleProbe, seed: u64) -> Self {
		let palette = Palette::resolve(&config, probe);
		Self {
			config,
			viewport: Viewport::default(),
			particles: Vec::new(),
			pointer: Pointer::outside(),
			palette,
			rng: SmallRng::seed_from_u64(seed),
			last_frame_ms: None,
		}
	}

	pub fn config(&self) -> &FieldConfig {
		&self.config
	}

	pub fn viewport(&self) -> &Viewport {
		&self.viewport
	}

	pub fn particles(&self) -> &[Particle] {
		&self.particles
	}

	pub fn backdrop(&self) -> Option<Color> {
		self.palette.backdrop
	}

	/// Stroke color for connection lines.
	pub fn link_color(&self) -> Color {
		self.palette.links
	}

	pub fn set_pointer(&mut self, pointer: Pointer) {
		self.pointer = pointer;
	}

	/// Applies a new configuration. The particle set is only regenerated when
	/// the population-defining settings changed; motion-only changes keep
	/// positions and re-roll velocities. Returns whether a reseed happened.
	pub fn set_config(&mut self, config: FieldConfig, probe: &dyn StyleProbe, rasterizer: &mut dyn SpriteRasterizer) -> bool {
		let reseed = config.seed_key() != self.config.seed_key();
		let motion_changed = config.movement.enable != self.config.movement.enable
			|| config.movement.speed != self.config.movement.speed
			|| config.movement.direction != self.config.movement.direction;

		self.palette = Palette::resolve(&config, probe);
		self.config = config;

		if reseed {
			self.reseed(rasterizer);
		} else if motion_changed {
			self.reroll_velocities();
		}
		reseed
	}

	/// Regenerates every particle for the current viewport.
	pub fn reseed(&mut self, rasterizer: &mut dyn SpriteRasterizer) {
		if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
			return;
		}
		self.particles = create_particles(
			&self.config,
			&self.viewport,
			&self.palette.particles,
			&mut self.rng,
			rasterizer,
		);
		debug!(
			"particle-field: seeded {} particles on {}x{}",
			self.particles.len(),
			self.viewport.width,
			self.viewport.height
		);
	}

	fn reroll_velocities(&mut self) {
		let movement = &self.config.movement;
		for p in &mut self.particles {
			(p.vx, p.vy) = if movement.enable {
				initial_velocity(movement.direction, movement.speed, &mut self.rng)
			} else {
				(0.0, 0.0)
			};
		}
	}

	/// Applies a new logical size and DPR, reseeding or rescaling the
	/// particle set as needed.
	pub fn resize(&mut self, width: f64, height: f64, dpr: f64, rasterizer: &mut dyn SpriteRasterizer) -> ResizeAction {
		let action = self.viewport.resize(width, height, dpr, !self.particles.is_empty());
		match action {
			ResizeAction::Reseed => self.reseed(rasterizer),
			ResizeAction::Rescale { sx, sy, sf } => {
				rescale_particles(&mut self.particles, sx, sy, sf);
				debug!("particle-field: rescaled by ({sx:.3}, {sy:.3}) size x{sf:.3}");
				self.refresh_sprites(rasterizer);
			}
			ResizeAction::Unchanged => {
				self.refresh_sprites(rasterizer);
			}
		}
		action
	}

	/// Rebuilds glyph sprites that are missing or stale for the current size
	/// and DPR. Returns how many were attempted.
	pub fn refresh_sprites(&mut self, rasterizer: &mut dyn SpriteRasterizer) -> usize {
		let dpr = self.viewport.dpr;
		self.particles
			.iter_mut()
			.map(|p| p.refresh_sprite(dpr, rasterizer))
			.filter(|&attempted| attempted)
			.count()
	}

	/// Advances the simulation to `now_ms`.
	pub fn tick(&mut self, now_ms: f64) {
		let dt = self.last_frame_ms.map_or(FRAME_MS, |last| now_ms - last);
		self.last_frame_ms = Some(now_ms);
		simulation::advance(
			&mut self.particles,
			dt,
			&self.config,
			&self.viewport,
			&self.pointer,
			&mut self.rng,
		);
	}

	/// Prepares a still frame: base opacity, no hover effects.
	pub fn settle_static(&mut self) {
		simulation::settle(&mut self.particles);
	}

	/// Forgets the previous frame time so a resumed loop does not jump.
	pub fn reset_clock(&mut self) {
		self.last_frame_ms = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::particle_field::color::{ColorInput, NoProbe};
	use crate::components::particle_field::sprite::GlyphSprite;
	use crate::components::particle_field::types::{MoveDirection, ShapeConfig, ShapeKind};

	#[derive(Default)]
	struct CountingRasterizer(usize);

	impl SpriteRasterizer for CountingRasterizer {
		fn rasterize(&mut self, _: &str, _: f64, _: f64) -> Option<GlyphSprite> {
			self.0 += 1;
			None
		}
	}

	fn seeded(config: FieldConfig, width: f64, height: f64) -> FieldState {
		let mut state = FieldState::new(config, &NoProbe, 17);
		state.resize(width, height, 1.0, &mut CountingRasterizer::default());
		state
	}

	#[test]
	fn first_resize_seeds_particles() {
		let mut state = FieldState::new(FieldConfig::default(), &NoProbe, 1);
		assert!(state.particles().is_empty());
		let action = state.resize(800.0, 600.0, 1.0, &mut CountingRasterizer::default());
		assert_eq!(action, ResizeAction::Reseed);
		assert_eq!(state.particles().len(), 50);
	}

	#[test]
	fn doubling_the_canvas_rescales_exactly() {
		let mut state = seeded(FieldConfig::default(), 400.0, 300.0);
		let before: Vec<_> = state.particles().iter().map(|p| (p.x, p.y, p.size)).collect();

		let action = state.resize(800.0, 600.0, 1.0, &mut CountingRasterizer::default());
		assert_eq!(
			action,
			ResizeAction::Rescale {
				sx: 2.0,
				sy: 2.0,
				sf: 2.0
			}
		);
		assert_eq!(state.particles().len(), 50);
		for (p, (x, y, size)) in state.particles().iter().zip(before) {
			assert_eq!(p.x, x * 2.0);
			assert_eq!(p.y, y * 2.0);
			assert_eq!(p.size, size * 2.0);
		}
	}

	#[test]
	fn growing_from_degenerate_size_reseeds() {
		let mut state = seeded(FieldConfig::default(), 4.0, 4.0);
		assert_eq!(state.particles().len(), 50);
		let action = state.resize(640.0, 480.0, 1.0, &mut CountingRasterizer::default());
		assert_eq!(action, ResizeAction::Reseed);
		assert!(state.particles().iter().any(|p| p.x > 100.0));
	}

	#[test]
	fn zero_amount_stays_empty_and_ticks() {
		let config = FieldConfig {
			amount: 0,
			..FieldConfig::default()
		};
		let mut state = seeded(config, 800.0, 600.0);
		state.tick(0.0);
		state.tick(16.0);
		assert!(state.particles().is_empty());
	}

	#[test]
	fn config_change_reseeds_only_when_population_changes() {
		let mut state = seeded(FieldConfig::default(), 800.0, 600.0);
		let first = state.particles()[0].x;
		let mut rasterizer = CountingRasterizer::default();

		let mut glowing = state.config().clone();
		glowing.glow.enable = true;
		assert!(!state.set_config(glowing, &NoProbe, &mut rasterizer));
		assert_eq!(state.particles()[0].x, first);

		let mut falling = state.config().clone();
		falling.movement.direction = MoveDirection::Bottom;
		assert!(!state.set_config(falling, &NoProbe, &mut rasterizer));
		assert!(state.particles().iter().all(|p| p.vx == 0.0 && p.vy > 0.0));

		let mut more = state.config().clone();
		more.amount = 80;
		assert!(state.set_config(more, &NoProbe, &mut rasterizer));
		assert_eq!(state.particles().len(), 80);
	}

	#[test]
	fn tick_uses_nominal_first_frame_and_clock_reset() {
		let mut config = FieldConfig::default();
		config.movement.direction = MoveDirection::Right;
		let mut state = seeded(config, 800.0, 600.0);
		let x0 = state.particles()[0].x;

		state.tick(10_000.0);
		let x1 = state.particles()[0].x;
		assert!((x1 - x0 - 0.4).abs() < 1e-9);

		// A long pause caps the step at 2.5 frames.
		state.tick(20_000.0);
		assert!((state.particles()[0].x - x1 - 1.0).abs() < 1e-9);

		state.reset_clock();
		let x2 = state.particles()[0].x;
		state.tick(90_000.0);
		assert!((state.particles()[0].x - x2 - 0.4).abs() < 1e-9);
	}

	#[test]
	fn colors_resolve_once_per_config() {
		let config = FieldConfig {
			colors: vec!["#ff000080".into(), "rgb(0, 0, 255)".into()],
			backdrop: Some(ColorInput::from("#000")),
			..FieldConfig::default()
		};
		let state = seeded(config, 800.0, 600.0);
		assert_eq!(state.backdrop(), Some(Color::rgb(0, 0, 0)));
		assert_eq!(state.link_color(), Color::WHITE);
		for p in state.particles() {
			assert!(p.color == Color::rgba(255, 0, 0, 128.0 / 255.0) || p.color == Color::rgb(0, 0, 255));
		}
	}

	#[test]
	fn sprites_are_requested_on_seed_and_retried_on_resize() {
		let config = FieldConfig {
			amount: 4,
			shape: ShapeConfig {
				kind: ShapeKind::Text,
				text: Some("🌙".into()),
			},
			..FieldConfig::default()
		};
		let mut state = FieldState::new(config, &NoProbe, 3);
		let mut rasterizer = CountingRasterizer::default();
		state.resize(800.0, 600.0, 1.0, &mut rasterizer);
		assert_eq!(rasterizer.0, 4);

		state.resize(800.0, 600.0, 2.0, &mut rasterizer);
		assert_eq!(rasterizer.0, 8);
		assert_eq!(state.refresh_sprites(&mut rasterizer), 4);
	}

	#[test]
	fn static_frames_drop_transient_effects() {
		let mut config = FieldConfig::default();
		config.twinkle.enable = true;
		let mut state = seeded(config, 800.0, 600.0);
		state.tick(0.0);
		state.settle_static();
		assert!(state.particles().iter().all(|p| p.opacity == p.base_opacity && p.hover_scale == 1.0));
	}
}
