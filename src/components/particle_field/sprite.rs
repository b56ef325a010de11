//! Offscreen glyph sprites for text-shaped particles.
//!
//! Drawing text directly with `fillText` snaps glyphs to the pixel grid, which
//! makes slow-moving emoji visibly jitter. Each glyph is instead rasterized once
//! into a small canvas at device-pixel resolution and drawn as an image, which
//! positions smoothly at sub-pixel offsets.

use unicode_segmentation::UnicodeSegmentation;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

const FONT_STACK: &str = "Apple Color Emoji, Segoe UI Emoji, Noto Color Emoji, Arial";

/// Glyphs used when a text shape has no text of its own.
pub const FALLBACK_GLYPHS: [&str; 8] = ["⭐", "✨", "🌟", "💫", "🌙", "☀", "☾", "🪐"];

/// Splits text into user-perceived characters (flags, skin tones and joined
/// sequences stay whole). Spaces are kept and draw as blank particles.
pub fn split_glyphs(text: &str) -> Vec<String> {
	text.graphemes(true).map(String::from).collect()
}

/// Dimensions of a sprite rendered for a particle of a given size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteMetrics {
	/// Font size in logical pixels.
	pub font_size: f64,
	/// Side of the square sprite in logical pixels, padding included.
	pub side: f64,
	/// Side of the backing bitmap in device pixels.
	pub backing_side: u32,
	pub dpr: f64,
}

impl SpriteMetrics {
	pub fn new(draw_size: f64, dpr: f64) -> Self {
		let font_size = (draw_size * 2.0).floor().max(4.0);
		let padding = (font_size * 0.4).ceil();
		let side = font_size + padding * 2.0;
		let dpr = dpr.max(1.0);
		Self {
			font_size,
			side,
			backing_side: (side * dpr).ceil() as u32,
			dpr,
		}
	}
}

/// A rasterized glyph and the metrics it was rendered with.
#[derive(Clone, Debug)]
pub struct GlyphSprite {
	pub canvas: HtmlCanvasElement,
	pub metrics: SpriteMetrics,
}

impl GlyphSprite {
	/// Whether this sprite is still sharp for a particle of `size` at `dpr`.
	pub fn fits(&self, size: f64, dpr: f64) -> bool {
		self.metrics == SpriteMetrics::new(size, dpr)
	}
}

/// Produces glyph sprites. Returning `None` means the particle is skipped when
/// drawing until a later refresh succeeds.
pub trait SpriteRasterizer {
	fn rasterize(&mut self, glyph: &str, size: f64, dpr: f64) -> Option<GlyphSprite>;
}

/// Rasterizes into detached `<canvas>` elements.
pub struct DomRasterizer {
	document: Document,
}

impl DomRasterizer {
	pub fn new(document: Document) -> Self {
		Self { document }
	}
}

impl SpriteRasterizer for DomRasterizer {
	fn rasterize(&mut self, glyph: &str, size: f64, dpr: f64) -> Option<GlyphSprite> {
		let metrics = SpriteMetrics::new(size, dpr);
		if glyph.is_empty() || metrics.backing_side == 0 {
			return None;
		}

		let canvas: HtmlCanvasElement = self.document.create_element("canvas").ok()?.dyn_into().ok()?;
		canvas.set_width(metrics.backing_side);
		canvas.set_height(metrics.backing_side);

		let ctx: CanvasRenderingContext2d = canvas.get_context("2d").ok()??.dyn_into().ok()?;
		ctx.set_transform(metrics.dpr, 0.0, 0.0, metrics.dpr, 0.0, 0.0).ok()?;
		ctx.clear_rect(0.0, 0.0, metrics.side, metrics.side);
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		ctx.set_font(&format!("{}px {}", metrics.font_size, FONT_STACK));
		ctx.fill_text(glyph, metrics.side / 2.0, metrics.side / 2.0).ok()?;

		Some(GlyphSprite { canvas, metrics })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn metrics_follow_font_and_padding_rules() {
		let m = SpriteMetrics::new(10.0, 2.0);
		assert_eq!(m.font_size, 20.0);
		assert_eq!(m.side, 20.0 + 8.0 * 2.0);
		assert_eq!(m.backing_side, 72);

		let tiny = SpriteMetrics::new(0.5, 1.0);
		assert_eq!(tiny.font_size, 4.0);
		assert_eq!(tiny.side, 4.0 + 2.0 * 2.0);
	}

	#[test]
	fn fractional_dpr_rounds_backing_up() {
		let m = SpriteMetrics::new(3.0, 1.5);
		assert_eq!(m.font_size, 6.0);
		assert_eq!(m.side, 6.0 + 3.0 * 2.0);
		assert_eq!(m.backing_side, 18);
	}

	#[test]
	fn small_size_changes_keep_metrics() {
		assert_eq!(SpriteMetrics::new(10.0, 1.0), SpriteMetrics::new(10.2, 1.0));
		assert_ne!(SpriteMetrics::new(10.0, 1.0), SpriteMetrics::new(10.6, 1.0));
		assert_ne!(SpriteMetrics::new(10.0, 1.0), SpriteMetrics::new(10.0, 2.0));
	}

	#[test]
	fn grapheme_clusters_stay_whole() {
		let flags_and_families = "🇯🇵 👨‍👩‍👧 ✨";
		assert_eq!(
			split_glyphs(flags_and_families),
			["🇯🇵", " ", "👨‍👩‍👧", " ", "✨"].map(String::from).to_vec()
		);
		assert!(split_glyphs("").is_empty());
	}
}
