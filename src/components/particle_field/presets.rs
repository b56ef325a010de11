//! Ready-made field configurations.
//!
//! Each preset is a complete [`FieldConfig`]; applying one never inherits
//! settings from whatever was shown before.

use super::color::ColorInput;
use super::types::{
	BoundaryMode, ConnectionConfig, Distribution, FieldConfig, GlowConfig, HoverConfig, HoverMode, MoveConfig,
	MoveDirection, ShapeConfig, ShapeKind, TwinkleConfig,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Preset {
	Emoji,
	BlackHole,
	Snow,
	Rainbow,
	Network,
	Bubbles,
	Lazer,
	Galaxy,
	Neon,
	#[default]
	LavaLamp,
}

fn range(min: f64, max: f64) -> Distribution {
	Distribution::Range { min, max }
}

fn palette(colors: &[&str]) -> Vec<ColorInput> {
	colors.iter().map(|&c| ColorInput::from(c)).collect()
}

fn shape(kind: ShapeKind) -> ShapeConfig {
	ShapeConfig { kind, text: None }
}

fn movement(speed: f64, direction: MoveDirection, boundary: BoundaryMode) -> MoveConfig {
	MoveConfig {
		enable: true,
		speed,
		direction,
		boundary,
	}
}

fn hover(mode: HoverMode, force: f64) -> HoverConfig {
	HoverConfig {
		enable: true,
		mode,
		force,
	}
}

fn no_hover() -> HoverConfig {
	HoverConfig {
		enable: false,
		..HoverConfig::default()
	}
}

fn twinkle(speed: f64, min_opacity: f64, max_opacity: f64) -> TwinkleConfig {
	TwinkleConfig {
		enable: true,
		speed,
		min_opacity,
		max_opacity,
	}
}

fn glow(size: f64, intensity: f64) -> GlowConfig {
	GlowConfig {
		enable: true,
		size,
		intensity,
	}
}

impl Preset {
	pub const ALL: [Preset; 10] = [
		Preset::Emoji,
		Preset::BlackHole,
		Preset::Snow,
		Preset::Rainbow,
		Preset::Network,
		Preset::Bubbles,
		Preset::Lazer,
		Preset::Galaxy,
		Preset::Neon,
		Preset::LavaLamp,
	];

	pub fn name(&self) -> &'static str {
		match self {
			Preset::Emoji => "emoji",
			Preset::BlackHole => "blackHole",
			Preset::Snow => "snow",
			Preset::Rainbow => "rainbow",
			Preset::Network => "network",
			Preset::Bubbles => "bubbles",
			Preset::Lazer => "lazer",
			Preset::Galaxy => "galaxy",
			Preset::Neon => "neon",
			Preset::LavaLamp => "lavaLamp",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		let name = name.trim();
		Self::ALL.into_iter().find(|p| p.name() == name)
	}

	pub fn config(&self) -> FieldConfig {
		let base = FieldConfig::default();

		match self {
			Preset::Emoji => FieldConfig {
				amount: 28,
				size: range(14.0, 28.0),
				opacity: Distribution::Value(1.0),
				color: "#ffffff".into(),
				backdrop: Some("#0d0d0f".into()),
				shape: ShapeConfig {
					kind: ShapeKind::Text,
					text: Some("⭐✨🌟💫🌙☀☾🪐".into()),
				},
				movement: movement(1.0, MoveDirection::None, BoundaryMode::Bounce),
				// hovering makes glyphs jitter
				hover: HoverConfig {
					enable: false,
					mode: HoverMode::Bubble,
					force: 40.0,
				},
				twinkle: twinkle(0.8, 0.6, 1.0),
				glow: glow(3.0, 0.5),
				..base
			},
			Preset::BlackHole => FieldConfig {
				amount: 50,
				size: range(2.0, 4.0),
				opacity: range(0.5, 1.0),
				color: "#ffffff".into(),
				backdrop: Some("#000000".into()),
				shape: shape(ShapeKind::Circle),
				movement: movement(1.0, MoveDirection::None, BoundaryMode::Out),
				hover: hover(HoverMode::Attract, 35.0),
				..base
			},
			Preset::Snow => FieldConfig {
				amount: 100,
				size: range(2.0, 8.0),
				opacity: range(0.6, 1.0),
				color: "#ffffff".into(),
				colors: palette(&["#ffffff", "#f8f9fa", "#e9ecef"]),
				backdrop: Some("#0d1b2a".into()),
				shape: shape(ShapeKind::Circle),
				movement: movement(1.0, MoveDirection::Bottom, BoundaryMode::Out),
				hover: no_hover(),
				twinkle: twinkle(0.2, 0.3, 0.8),
				..base
			},
			Preset::Rainbow => FieldConfig {
				amount: 110,
				size: range(4.0, 14.0),
				opacity: range(0.4, 0.9),
				color: "#ffffff".into(),
				colors: palette(&["#ff6b6b", "#4ecdc4", "#45b7d1", "#feca57", "#a29bfe", "#39ff14", "#ff00ff"]),
				backdrop: Some("#000000".into()),
				shape: shape(ShapeKind::Star),
				movement: movement(1.0, MoveDirection::None, BoundaryMode::Out),
				hover: hover(HoverMode::Bubble, 40.0),
				twinkle: twinkle(2.2, 0.2, 1.0),
				..base
			},
			Preset::Network => FieldConfig {
				amount: 15,
				size: range(2.0, 8.0),
				opacity: range(0.7, 1.0),
				color: "#4fc3f7".into(),
				colors: palette(&["#4fc3f7", "#29b6f6", "#03a9f4", "#039be5", "#0288d1"]),
				backdrop: Some("#0a0a0a".into()),
				shape: shape(ShapeKind::Circle),
				movement: movement(1.0, MoveDirection::None, BoundaryMode::Bounce),
				hover: hover(HoverMode::Attract, 30.0),
				glow: glow(2.0, 0.4),
				connections: ConnectionConfig {
					enable: true,
					distance: 200.0,
					opacity: 0.9,
					width: 1.0,
					color: Some("#ffffff".into()),
					max_links: 5,
				},
				..base
			},
			Preset::Bubbles => FieldConfig {
				amount: 100,
				size: range(8.0, 35.0),
				opacity: range(0.1, 0.5),
				color: "#66ccff".into(),
				colors: palette(&["#66ccff", "#99ddff", "#ccf0ff", "#ffffff"]),
				backdrop: Some("#001a33".into()),
				shape: shape(ShapeKind::Circle),
				movement: movement(1.0, MoveDirection::Top, BoundaryMode::Out),
				hover: hover(HoverMode::Bubble, 80.0),
				twinkle: twinkle(0.8, 0.1, 0.6),
				..base
			},
			Preset::Lazer => FieldConfig {
				amount: 20,
				size: range(15.0, 60.0),
				opacity: range(0.2, 0.9),
				color: "#ff0000".into(),
				colors: palette(&["#ff0000", "#ff4444", "#ff6666", "#ff8888", "#ffaaaa", "#ffcccc"]),
				backdrop: Some("#0a0a0a".into()),
				shape: shape(ShapeKind::Circle),
				movement: movement(2.0, MoveDirection::Random, BoundaryMode::Bounce),
				hover: hover(HoverMode::Bubble, 60.0),
				twinkle: twinkle(2.0, 0.3, 1.0),
				glow: glow(2.5, 0.4),
				..base
			},
			Preset::Galaxy => FieldConfig {
				amount: 90,
				size: range(1.5, 4.0),
				opacity: range(0.4, 1.0),
				color: "#cfe2ff".into(),
				colors: palette(&["#ffffff", "#cfe2ff", "#bcd4f6", "#9fb7e5"]),
				backdrop: Some("#0a0a1a".into()),
				shape: shape(ShapeKind::Circle),
				movement: movement(1.0, MoveDirection::None, BoundaryMode::Out),
				hover: no_hover(),
				twinkle: twinkle(0.9, 0.3, 1.0),
				glow: glow(2.5, 0.35),
				..base
			},
			Preset::Neon => FieldConfig {
				amount: 26,
				size: range(4.0, 14.0),
				opacity: range(0.7, 1.0),
				color: "#ff00ff".into(),
				colors: palette(&["#ff00ff", "#00ffff", "#ffff00", "#ff0080", "#39ff14", "#00ffea"]),
				backdrop: Some("#0a0a0a".into()),
				shape: shape(ShapeKind::Square),
				movement: movement(2.0, MoveDirection::None, BoundaryMode::Bounce),
				hover: hover(HoverMode::Bubble, 120.0),
				twinkle: twinkle(3.0, 0.3, 1.0),
				glow: glow(3.0, 0.7),
				..base
			},
			Preset::LavaLamp => FieldConfig {
				amount: 20,
				size: range(12.0, 45.0),
				opacity: range(0.6, 1.0),
				color: "#ff6b35".into(),
				colors: palette(&["#ff6b35", "#ff8c42", "#ffa726", "#ff7043", "#ff5722", "#e64a19"]),
				backdrop: Some("#1a0f0f".into()),
				shape: shape(ShapeKind::Circle),
				movement: movement(1.0, MoveDirection::Top, BoundaryMode::Bounce),
				hover: no_hover(),
				twinkle: twinkle(0.8, 0.3, 1.0),
				glow: glow(3.0, 0.6),
				..base
			},
		}
	}
}
