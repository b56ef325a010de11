//! particle-field: Configurable 2D particle animation on an HTML canvas.
//!
//! This crate provides a WASM-based particle field component with jittered
//! seeding, bounce/respawn edges, twinkle, glow, hover effects and connection
//! lines, plus a small app that mounts it from a page-embedded configuration.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::particle_field::{FieldConfig, ParticleField, Preset, RenderTarget};

/// Id of the script element holding the page configuration.
const CONFIG_ELEMENT_ID: &str = "particle-config";

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("particle-field: logging initialized");
}

/// Page configuration: what to draw and where it is shown.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageConfig {
	pub field: FieldConfig,
	pub target: RenderTarget,
}

/// Decodes the configuration script's contents.
///
/// `data-preset` selects the base configuration used when the body is empty
/// or invalid; a readable JSON body always wins. Unknown presets fall back to
/// the default preset.
pub fn parse_page_config(json: &str, preset: Option<&str>, target: Option<&str>) -> PageConfig {
	let preset = match preset {
		Some(name) => Preset::from_name(name).unwrap_or_else(|| {
			warn!("particle-field: unknown preset {:?}, using {}", name, Preset::default().name());
			Preset::default()
		}),
		None => Preset::default(),
	};
	let target = target.map(RenderTarget::parse).unwrap_or_default();

	let field = if json.trim().is_empty() {
		preset.config()
	} else {
		match FieldConfig::from_json(json) {
			Ok(config) => config,
			Err(e) => {
				warn!("particle-field: failed to parse configuration: {}", e);
				preset.config()
			}
		}
	};
	PageConfig { field, target }
}

/// Load the configuration from a script element with id="particle-config".
fn load_page_config() -> PageConfig {
	let Some(script) = find_config_script() else {
		info!("particle-field: no #{} element, using {} preset", CONFIG_ELEMENT_ID, Preset::default().name());
		return PageConfig {
			field: Preset::default().config(),
			target: RenderTarget::default(),
		};
	};

	let json = script.text().unwrap_or_default();
	let config = parse_page_config(
		&json,
		script.get_attribute("data-preset").as_deref(),
		script.get_attribute("data-target").as_deref(),
	);
	info!(
		"particle-field: loaded {} particles ({} shape), target {}",
		config.field.amount,
		config.field.shape.kind.as_str(),
		config.target.as_str()
	);
	config
}

fn find_config_script() -> Option<HtmlScriptElement> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(CONFIG_ELEMENT_ID)?;
	element.dyn_into().ok()
}

/// Main application component.
/// Loads the field configuration from the DOM and renders a full-page field.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let PageConfig { field, target } = load_page_config();
	let config = Signal::derive(move || field.clone());

	view! {
		<Html attr:lang="en" attr:dir="ltr" />
		<Title text="Particle Field" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-field" style="position: fixed; inset: 0;">
			<ParticleField config=config target=target />
		</div>
	}
}
