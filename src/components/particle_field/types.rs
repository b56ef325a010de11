//! Configuration consumed by the particle field.
//!
//! A [`FieldConfig`] is decoded once (from JSON or a preset) and then treated as
//! an immutable snapshot: the engine derives particle and render state from it
//! but never writes back. Loosely-shaped inputs (distributions that may be a
//! fixed value or a range, enum strings with unknown values, legacy key aliases)
//! are normalized here with explicit defaults so nothing is re-sniffed per frame.

use rand::Rng;
use serde::{Deserialize, Deserializer};

use super::color::ColorInput;
use super::sprite::split_glyphs;

/// A per-particle quantity sampled once at creation time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Distribution {
	Value(f64),
	/// Uniform between `min` and `max` (inclusive of `min`).
	Range { min: f64, max: f64 },
}

impl Distribution {
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
		match *self {
			Distribution::Value(value) => value,
			Distribution::Range { min, max } => {
				let (lo, hi) = self.bounds();
				if hi > lo {
					lo + rng.random::<f64>() * (hi - lo)
				} else {
					min.min(max)
				}
			}
		}
	}

	/// Smallest and largest value `sample` can return.
	pub fn bounds(&self) -> (f64, f64) {
		match *self {
			Distribution::Value(value) => (value, value),
			Distribution::Range { min, max } => (min.min(max), min.max(max)),
		}
	}
}

/// Wire shape of a distribution: `{"type": "Value", "value"}` or
/// `{"type": "Range", "min", "max"}`.
#[derive(Deserialize)]
struct RawDistribution {
	#[serde(rename = "type")]
	kind: Option<String>,
	value: Option<f64>,
	min: Option<f64>,
	max: Option<f64>,
}

struct DistributionDefaults {
	value: f64,
	min: f64,
	max: f64,
}

const SIZE_DEFAULTS: DistributionDefaults = DistributionDefaults {
	value: 3.0,
	min: 1.0,
	max: 5.0,
};

const OPACITY_DEFAULTS: DistributionDefaults = DistributionDefaults {
	value: 0.5,
	min: 0.1,
	max: 1.0,
};

impl RawDistribution {
	fn decode(self, defaults: DistributionDefaults) -> Distribution {
		let is_range = match self.kind.as_deref() {
			Some(kind) => kind.eq_ignore_ascii_case("range"),
			None => self.value.is_none(),
		};
		if is_range {
			Distribution::Range {
				min: self.min.unwrap_or(defaults.min),
				max: self.max.unwrap_or(defaults.max),
			}
		} else {
			Distribution::Value(self.value.unwrap_or(defaults.value))
		}
	}
}

fn size_distribution<'de, D: Deserializer<'de>>(d: D) -> Result<Distribution, D::Error> {
	RawDistribution::deserialize(d).map(|raw| raw.decode(SIZE_DEFAULTS))
}

fn opacity_distribution<'de, D: Deserializer<'de>>(d: D) -> Result<Distribution, D::Error> {
	RawDistribution::deserialize(d).map(|raw| raw.decode(OPACITY_DEFAULTS))
}

/// Accepts any number: fractions are truncated and negatives count as zero.
fn particle_amount<'de, D: Deserializer<'de>>(d: D) -> Result<usize, D::Error> {
	let amount = f64::deserialize(d)?;
	Ok(if amount.is_finite() { amount.max(0.0) as usize } else { 0 })
}

/// Declares a string-backed enum whose unknown values map to its default.
macro_rules! lenient_enum {
	(
		$(#[$meta:meta])*
		pub enum $name:ident { $default:ident => $default_str:literal $(, $variant:ident => $s:literal)* $(,)? }
	) => {
		$(#[$meta])*
		#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
		#[serde(from = "String")]
		pub enum $name {
			#[default]
			$default,
			$($variant,)*
		}

		impl From<String> for $name {
			fn from(s: String) -> Self {
				Self::parse(&s)
			}
		}

		impl $name {
			pub fn parse(s: &str) -> Self {
				match s.trim() {
					$($s => Self::$variant,)*
					_ => Self::$default,
				}
			}

			pub fn as_str(&self) -> &'static str {
				match self {
					Self::$default => $default_str,
					$(Self::$variant => $s,)*
				}
			}
		}
	};
}

lenient_enum! {
	/// Particle outline.
	pub enum ShapeKind { Circle => "circle", Square => "square", Star => "star", Text => "text" }
}

lenient_enum! {
	/// Initial velocity policy. `None` (and anything unknown) is a gentle drift.
	pub enum MoveDirection {
		None => "none",
		Top => "top",
		Bottom => "bottom",
		Left => "left",
		Right => "right",
		Random => "random",
	}
}

lenient_enum! {
	/// Pointer interaction. `Grab` has no effect on the simulation.
	pub enum HoverMode { Grab => "grab", Bubble => "bubble", Attract => "attract", Repulse => "repulse" }
}

lenient_enum! {
	/// Where the field is being displayed.
	///
	/// `Live` and `Canvas` animate; `Preview` animates only when the
	/// configuration allows preview motion; `Export` and `Thumbnail` always draw
	/// a single still frame.
	pub enum RenderTarget {
		Live => "live",
		Canvas => "canvas",
		Preview => "preview",
		Export => "export",
		Thumbnail => "thumbnail",
	}
}

/// What happens when a particle reaches the canvas edge.
///
/// Unset means `Bounce`; any given value other than `"bounce"` lets particles
/// leave and respawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum BoundaryMode {
	#[default]
	Bounce,
	Out,
}

impl From<String> for BoundaryMode {
	fn from(s: String) -> Self {
		if s.trim() == "bounce" {
			Self::Bounce
		} else {
			Self::Out
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeConfig {
	pub kind: ShapeKind,
	/// Glyphs for [`ShapeKind::Text`]; each grapheme becomes one glyph.
	pub text: Option<String>,
}

impl ShapeConfig {
	pub fn glyphs(&self) -> Vec<String> {
		match (self.kind, &self.text) {
			(ShapeKind::Text, Some(text)) => split_glyphs(text),
			_ => Vec::new(),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct MoveConfig {
	pub enable: bool,
	pub speed: f64,
	pub direction: MoveDirection,
	pub boundary: BoundaryMode,
}

impl Default for MoveConfig {
	fn default() -> Self {
		Self {
			enable: true,
			speed: 2.0,
			direction: MoveDirection::None,
			boundary: BoundaryMode::Bounce,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct HoverConfig {
	pub enable: bool,
	pub mode: HoverMode,
	pub force: f64,
}

impl Default for HoverConfig {
	fn default() -> Self {
		Self {
			enable: true,
			mode: HoverMode::Grab,
			force: 60.0,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TwinkleConfig {
	pub enable: bool,
	pub speed: f64,
	pub min_opacity: f64,
	pub max_opacity: f64,
}

impl Default for TwinkleConfig {
	fn default() -> Self {
		Self {
			enable: false,
			speed: 1.0,
			min_opacity: 0.1,
			max_opacity: 1.0,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlowConfig {
	pub enable: bool,
	pub size: f64,
	pub intensity: f64,
}

impl Default for GlowConfig {
	fn default() -> Self {
		Self {
			enable: false,
			size: 3.0,
			intensity: 0.6,
		}
	}
}

/// Lines between nearby particles. Accepts the legacy `connect*` key names.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionConfig {
	#[serde(alias = "connect")]
	pub enable: bool,
	/// Maximum link distance at scale 1; non-positive means 120.
	#[serde(alias = "connectDistance")]
	pub distance: f64,
	#[serde(alias = "connectOpacity")]
	pub opacity: f64,
	#[serde(alias = "connectWidth")]
	pub width: f64,
	#[serde(alias = "connectColor")]
	pub color: Option<ColorInput>,
	/// Links per particle; 0 means unlimited.
	pub max_links: u32,
}

impl Default for ConnectionConfig {
	fn default() -> Self {
		Self {
			enable: false,
			distance: 120.0,
			opacity: 0.2,
			width: 1.0,
			color: None,
			max_links: 0,
		}
	}
}

/// Complete, immutable configuration of one particle field.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "WireConfig")]
pub struct FieldConfig {
	pub amount: usize,
	pub size: Distribution,
	pub opacity: Distribution,
	/// Single color, used when `colors` is empty.
	pub color: ColorInput,
	pub colors: Vec<ColorInput>,
	pub backdrop: Option<ColorInput>,
	pub shape: ShapeConfig,
	pub movement: MoveConfig,
	pub hover: HoverConfig,
	pub twinkle: TwinkleConfig,
	pub glow: GlowConfig,
	pub connections: ConnectionConfig,
	/// Explicit logical width, overriding the container's box.
	pub width: Option<f64>,
	/// Explicit logical height, overriding the container's box.
	pub height: Option<f64>,
	/// Whether the preview render target animates.
	pub preview_motion: bool,
	/// `false` keeps the field on a still frame whatever the target.
	pub visible: bool,
}

impl Default for FieldConfig {
	fn default() -> Self {
		Self {
			amount: 50,
			size: Distribution::Range { min: 1.0, max: 5.0 },
			opacity: Distribution::Range { min: 0.1, max: 1.0 },
			color: ColorInput::default(),
			colors: Vec::new(),
			backdrop: None,
			shape: ShapeConfig::default(),
			movement: MoveConfig::default(),
			hover: HoverConfig::default(),
			twinkle: TwinkleConfig::default(),
			glow: GlowConfig::default(),
			connections: ConnectionConfig::default(),
			width: None,
			height: None,
			preview_motion: true,
			visible: true,
		}
	}
}

/// Wire shape of [`ShapeConfig`].
#[derive(Default, Deserialize)]
#[serde(default)]
struct WireShape {
	#[serde(rename = "type")]
	kind: Option<String>,
	text: Option<String>,
}

/// Wire shape of [`MoveConfig`]; the edge mode may arrive under three keys.
#[derive(Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct WireMove {
	enable: bool,
	speed: f64,
	direction: MoveDirection,
	out: Option<BoundaryMode>,
	boundary: Option<BoundaryMode>,
	out_mode: Option<BoundaryMode>,
}

impl Default for WireMove {
	fn default() -> Self {
		let base = MoveConfig::default();
		Self {
			enable: base.enable,
			speed: base.speed,
			direction: base.direction,
			out: None,
			boundary: None,
			out_mode: None,
		}
	}
}

/// Wire shape of [`FieldConfig`], including the flat keys older hosts send
/// beside the nested `shape` and `move` objects. Nested values win.
#[derive(Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct WireConfig {
	#[serde(deserialize_with = "particle_amount")]
	amount: usize,
	#[serde(deserialize_with = "size_distribution")]
	size: Distribution,
	#[serde(deserialize_with = "opacity_distribution")]
	opacity: Distribution,
	color: ColorInput,
	colors: Vec<ColorInput>,
	backdrop: Option<ColorInput>,
	shape: WireShape,
	#[serde(rename = "move")]
	movement: WireMove,
	hover: HoverConfig,
	twinkle: TwinkleConfig,
	glow: GlowConfig,
	#[serde(alias = "modes")]
	connections: ConnectionConfig,
	width: Option<f64>,
	height: Option<f64>,
	preview_motion: bool,
	visible: Option<bool>,
	shape_type: Option<String>,
	shape_text: Option<String>,
	out: Option<BoundaryMode>,
	out_mode: Option<BoundaryMode>,
	boundary: Option<BoundaryMode>,
}

impl Default for WireConfig {
	fn default() -> Self {
		let base = FieldConfig::default();
		Self {
			amount: base.amount,
			size: base.size,
			opacity: base.opacity,
			color: base.color,
			colors: base.colors,
			backdrop: base.backdrop,
			shape: WireShape::default(),
			movement: WireMove::default(),
			hover: base.hover,
			twinkle: base.twinkle,
			glow: base.glow,
			connections: base.connections,
			width: base.width,
			height: base.height,
			preview_motion: base.preview_motion,
			visible: None,
			shape_type: None,
			shape_text: None,
			out: None,
			out_mode: None,
			boundary: None,
		}
	}
}

fn non_empty(s: Option<String>) -> Option<String> {
	s.filter(|s| !s.is_empty())
}

impl From<WireConfig> for FieldConfig {
	fn from(wire: WireConfig) -> Self {
		let WireConfig { shape, movement, .. } = wire;
		let kind = non_empty(shape.kind)
			.or_else(|| non_empty(wire.shape_type))
			.map(ShapeKind::from)
			.unwrap_or_default();
		let text = non_empty(shape.text).or_else(|| non_empty(wire.shape_text));
		let boundary = movement
			.out
			.or(movement.boundary)
			.or(movement.out_mode)
			.or(wire.out)
			.or(wire.out_mode)
			.or(wire.boundary)
			.unwrap_or_default();

		Self {
			amount: wire.amount,
			size: wire.size,
			opacity: wire.opacity,
			color: wire.color,
			colors: wire.colors,
			backdrop: wire.backdrop,
			shape: ShapeConfig { kind, text },
			movement: MoveConfig {
				enable: movement.enable,
				speed: movement.speed,
				direction: movement.direction,
				boundary,
			},
			hover: wire.hover,
			twinkle: wire.twinkle,
			glow: wire.glow,
			connections: wire.connections,
			width: wire.width,
			height: wire.height,
			preview_motion: wire.preview_motion,
			visible: wire.visible != Some(false),
		}
	}
}

/// The part of a configuration that determines the particle population.
#[derive(Clone, Debug, PartialEq)]
pub struct SeedKey {
	amount: usize,
	size: Distribution,
	opacity: Distribution,
	palette: Vec<ColorInput>,
	shape: ShapeConfig,
}

impl FieldConfig {
	/// Colors particles are drawn from: `colors`, or `color` alone.
	pub fn palette(&self) -> Vec<&ColorInput> {
		if self.colors.is_empty() {
			vec![&self.color]
		} else {
			self.colors.iter().collect()
		}
	}

	/// Configurations with equal keys can keep each other's particles.
	pub fn seed_key(&self) -> SeedKey {
		SeedKey {
			amount: self.amount,
			size: self.size,
			opacity: self.opacity,
			palette: self.palette().into_iter().cloned().collect(),
			shape: self.shape.clone(),
		}
	}

	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}
}
