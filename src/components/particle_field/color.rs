//! Color resolution for particles, links and the backdrop.
//!
//! Inputs arrive in many shapes: hex strings of every length, functional
//! `rgb()`/`hsl()` notation, design-token `var(...)` references, named CSS
//! colors, or plain `{r, g, b, a}` objects handed over by the host. Everything
//! is normalized into a concrete [`Color`] once, when the configuration is
//! applied. Resolution never fails: anything unreadable becomes opaque white.

use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const WHITE: Color = Color::rgb(255, 255, 255);

	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Fill/stroke style combining the color's own alpha with an opacity factor.
	pub fn with_opacity(self, opacity: f64) -> String {
		let a = (self.a * opacity).clamp(0.0, 1.0);
		let a = if a.is_nan() { 0.0 } else { a };
		format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, a)
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// A color as written in the configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ColorInput {
	/// Any CSS color string: hex, `rgb()`, `hsl()`, `var(...)`, or a name.
	Css(String),
	/// Channel object from the host (`r`/`g`/`b` in 0..=255, `a` in 0..=1).
	Rgba {
		r: f64,
		g: f64,
		b: f64,
		#[serde(default = "opaque")]
		a: f64,
	},
}

fn opaque() -> f64 {
	1.0
}

impl Default for ColorInput {
	fn default() -> Self {
		Self::Css("#ffffff".into())
	}
}

impl From<&str> for ColorInput {
	fn from(css: &str) -> Self {
		Self::Css(css.to_string())
	}
}

/// Resolves colors the parser cannot read on its own (CSS variables, names).
pub trait StyleProbe {
	/// Returns the computed `rgb()`/`rgba()` string for `css`, if any.
	fn computed_color(&self, css: &str) -> Option<String>;
}

/// Probe for environments without a document.
pub struct NoProbe;

impl StyleProbe for NoProbe {
	fn computed_color(&self, _css: &str) -> Option<String> {
		None
	}
}

/// Resolves through `getComputedStyle` on a hidden probe element.
pub struct DomProbe {
	document: Document,
}

impl DomProbe {
	pub fn new() -> Option<Self> {
		let document = web_sys::window()?.document()?;
		Some(Self { document })
	}
}

impl StyleProbe for DomProbe {
	fn computed_color(&self, css: &str) -> Option<String> {
		let window = web_sys::window()?;
		let body = self.document.body()?;
		let probe: HtmlElement = self.document.create_element("span").ok()?.dyn_into().ok()?;
		let style = probe.style();
		let _ = style.set_property("position", "absolute");
		let _ = style.set_property("visibility", "hidden");
		let _ = style.set_property("pointer-events", "none");
		let _ = style.set_property("color", css);
		// Rejected values leave the property empty; the computed color would
		// then be inherited rather than resolved.
		if style.get_property_value("color").ok()?.is_empty() {
			return None;
		}

		body.append_child(&probe).ok()?;
		let resolved = window
			.get_computed_style(&probe)
			.ok()
			.flatten()
			.and_then(|computed| computed.get_property_value("color").ok());
		probe.remove();

		resolved.filter(|c| c.trim_start().to_ascii_lowercase().starts_with("rgb"))
	}
}

/// Resolves any configured color, falling back to opaque white.
pub fn resolve_color(input: &ColorInput, probe: &dyn StyleProbe) -> Color {
	let resolved = match input {
		ColorInput::Css(css) => resolve_css(css, probe),
		ColorInput::Rgba { r, g, b, a } => Some(Color::rgba(
			channel(*r),
			channel(*g),
			channel(*b),
			unit(*a),
		)),
	};
	resolved.unwrap_or(Color::WHITE)
}

fn resolve_css(css: &str, probe: &dyn StyleProbe) -> Option<Color> {
	let css = css.trim();
	if css.is_empty() {
		return None;
	}
	if let Some(hex) = css.strip_prefix('#') {
		return parse_hex(hex);
	}
	if let Some(color) = parse_functional(css) {
		return Some(color);
	}
	if has_prefix(css, "var(") {
		return probe
			.computed_color(css)
			.and_then(|computed| parse_functional(&computed))
			.or_else(|| var_fallback(css).and_then(|fallback| resolve_css(fallback, probe)));
	}
	probe
		.computed_color(css)
		.and_then(|computed| parse_functional(&computed))
}

fn has_prefix(s: &str, prefix: &str) -> bool {
	s.get(..prefix.len()).is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// The literal fallback of `var(--name, <fallback>)`.
fn var_fallback(css: &str) -> Option<&str> {
	let inner = css.get(4..)?.strip_suffix(')')?;
	let (_, fallback) = inner.split_once(',')?;
	let fallback = fallback.trim();
	(!fallback.is_empty()).then_some(fallback)
}

/// Parses the digits of `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
fn parse_hex(hex: &str) -> Option<Color> {
	if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
		return None;
	}
	let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
	let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

	match hex.len() {
		3 => Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
		4 => Some(Color::rgba(
			nibble(0)?,
			nibble(1)?,
			nibble(2)?,
			nibble(3)? as f64 / 255.0,
		)),
		6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
		8 => Some(Color::rgba(
			byte(0)?,
			byte(2)?,
			byte(4)?,
			byte(6)? as f64 / 255.0,
		)),
		_ => None,
	}
}

/// Parses `rgb()`, `rgba()`, `hsl()` and `hsla()` in comma or space syntax.
fn parse_functional(css: &str) -> Option<Color> {
	let css = css.trim();
	let open = css.find('(')?;
	let name = css[..open].trim().to_ascii_lowercase();
	let args = css[open + 1..].strip_suffix(')')?;
	let parts: Vec<&str> = args
		.split(|c: char| c == ',' || c == '/' || c.is_whitespace())
		.filter(|p| !p.is_empty())
		.collect();
	if parts.len() != 3 && parts.len() != 4 {
		return None;
	}
	let alpha = match parts.get(3) {
		Some(a) => parse_alpha(a)?,
		None => 1.0,
	};

	match name.as_str() {
		"rgb" | "rgba" => {
			let r = parse_rgb_channel(parts[0])?;
			let g = parse_rgb_channel(parts[1])?;
			let b = parse_rgb_channel(parts[2])?;
			// Plain rgb() is always treated as opaque.
			let a = if name == "rgba" { alpha } else { 1.0 };
			Some(Color::rgba(r, g, b, a))
		}
		"hsl" | "hsla" => {
			let h: f64 = parts[0].trim_end_matches("deg").parse().ok()?;
			let s = parse_percent(parts[1])?;
			let l = parse_percent(parts[2])?;
			let (r, g, b) = hsl_to_rgb(h, s, l);
			let a = if name == "hsla" { alpha } else { 1.0 };
			Some(Color::rgba(r, g, b, a))
		}
		_ => None,
	}
}

fn parse_rgb_channel(token: &str) -> Option<u8> {
	match token.strip_suffix('%') {
		Some(pct) => pct.parse::<f64>().ok().map(|v| channel(v * 2.55)),
		None => token.parse::<f64>().ok().map(channel),
	}
}

fn parse_alpha(token: &str) -> Option<f64> {
	match token.strip_suffix('%') {
		Some(pct) => pct.parse::<f64>().ok().map(|v| unit(v / 100.0)),
		None => token.parse::<f64>().ok().map(unit),
	}
}

fn parse_percent(token: &str) -> Option<f64> {
	let value: f64 = token.strip_suffix('%').unwrap_or(token).parse().ok()?;
	Some((value / 100.0).clamp(0.0, 1.0))
}

fn channel(v: f64) -> u8 {
	if v.is_nan() { 0 } else { v.round().clamp(0.0, 255.0) as u8 }
}

fn unit(v: f64) -> f64 {
	if v.is_nan() { 1.0 } else { v.clamp(0.0, 1.0) }
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
	let h = h.rem_euclid(360.0) / 360.0;
	if s == 0.0 {
		let v = channel(l * 255.0);
		return (v, v, v);
	}
	let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
	let p = 2.0 * l - q;
	let hue = |mut t: f64| {
		if t < 0.0 {
			t += 1.0;
		}
		if t > 1.0 {
			t -= 1.0;
		}
		let v = if t < 1.0 / 6.0 {
			p + (q - p) * 6.0 * t
		} else if t < 0.5 {
			q
		} else if t < 2.0 / 3.0 {
			p + (q - p) * (2.0 / 3.0 - t) * 6.0
		} else {
			p
		};
		channel(v * 255.0)
	};
	(hue(h + 1.0 / 3.0), hue(h), hue(h - 1.0 / 3.0))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn resolve(css: &str) -> Color {
		resolve_color(&ColorInput::from(css), &NoProbe)
	}

	struct FixedProbe(&'static str);

	impl StyleProbe for FixedProbe {
		fn computed_color(&self, _css: &str) -> Option<String> {
			Some(self.0.to_string())
		}
	}

	#[test]
	fn eight_digit_hex_carries_alpha() {
		let c = resolve("#11223380");
		assert_eq!((c.r, c.g, c.b), (0x11, 0x22, 0x33));
		assert!((c.a - 128.0 / 255.0).abs() < 1e-9);
	}

	#[test]
	fn six_and_three_digit_hex_are_opaque() {
		assert_eq!(resolve("#ffffff"), Color::WHITE);
		let short = resolve("#0f8");
		assert_eq!((short.r, short.g, short.b, short.a), (0, 255, 136, 1.0));
	}

	#[test]
	fn four_digit_hex_expands_alpha_nibble() {
		let c = resolve("#f008");
		assert_eq!((c.r, c.g, c.b), (255, 0, 0));
		assert!((c.a - 0x88 as f64 / 255.0).abs() < 1e-9);
	}

	#[test]
	fn rgba_keeps_alpha_and_rgb_is_opaque() {
		let c = resolve("rgba(10, 20, 30, 0.25)");
		assert_eq!((c.r, c.g, c.b), (10, 20, 30));
		assert!((c.a - 0.25).abs() < 1e-9);
		assert_eq!(resolve("rgb(10 20 30)").a, 1.0);
		assert_eq!(resolve("RGBA(0,0,0,7)").a, 1.0);
	}

	#[test]
	fn hsl_converts_to_rgb() {
		let red = resolve("hsl(0, 100%, 50%)");
		assert_eq!((red.r, red.g, red.b), (255, 0, 0));
		let c = resolve("hsla(120deg, 100%, 25%, 0.5)");
		assert_eq!((c.r, c.g, c.b), (0, 128, 0));
		assert!((c.a - 0.5).abs() < 1e-9);
	}

	#[test]
	fn css_variable_without_probe_uses_embedded_fallback() {
		let c = resolve("var(--token-1234, rgb(12, 34, 56))");
		assert_eq!((c.r, c.g, c.b, c.a), (12, 34, 56, 1.0));
	}

	#[test]
	fn css_variable_prefers_computed_style() {
		let probe = FixedProbe("rgba(1, 2, 3, 0.5)");
		let c = resolve_color(&ColorInput::from("var(--accent, #000)"), &probe);
		assert_eq!((c.r, c.g, c.b), (1, 2, 3));
		assert!((c.a - 0.5).abs() < 1e-9);
	}

	#[test]
	fn unreadable_inputs_fall_back_to_white() {
		for bad in ["", "#12", "#ggg", "rgb(1,2)", "not-a-color", "var(--missing)"] {
			assert_eq!(resolve(bad), Color::WHITE, "input {bad:?}");
		}
	}

	#[test]
	fn non_ascii_inputs_fall_back_to_white() {
		for bad in ["abc€", "röd", "🔥-accent", "vär(--x)", "#ff€"] {
			assert_eq!(resolve(bad), Color::WHITE, "input {bad:?}");
		}
	}

	#[test]
	fn named_colors_resolve_through_probe() {
		let c = resolve_color(&ColorInput::from("tomato"), &FixedProbe("rgb(255, 99, 71)"));
		assert_eq!((c.r, c.g, c.b), (255, 99, 71));
	}

	#[test]
	fn host_objects_are_clamped() {
		let input = ColorInput::Rgba {
			r: 300.0,
			g: -4.0,
			b: 127.6,
			a: 0.4,
		};
		let c = resolve_color(&input, &NoProbe);
		assert_eq!((c.r, c.g, c.b), (255, 0, 128));
		assert!((c.a - 0.4).abs() < 1e-9);
	}

	#[test]
	fn opacity_multiplies_color_alpha() {
		let c = Color::rgba(1, 2, 3, 0.5);
		assert_eq!(c.with_opacity(0.5), "rgba(1, 2, 3, 0.25)");
		assert_eq!(c.with_opacity(4.0), "rgba(1, 2, 3, 1)");
	}

	#[test]
	fn color_objects_deserialize() {
		let parsed: Vec<ColorInput> =
			serde_json::from_str(r##"["#fff", {"r": 1, "g": 2, "b": 3}]"##).unwrap();
		assert_eq!(parsed[0], ColorInput::from("#fff"));
		assert_eq!(
			parsed[1],
			ColorInput::Rgba {
				r: 1.0,
				g: 2.0,
				b: 3.0,
				a: 1.0
			}
		);
	}
}
