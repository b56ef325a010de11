//! Animated particle field component.
//!
//! Renders a configurable 2D particle animation on an HTML canvas with:
//! - Jittered-grid seeding that keeps coverage even at any aspect ratio
//! - Bounce or exit-and-respawn edges, twinkle and glow
//! - Pointer hover effects (bubble, attract, repulse)
//! - Distance-faded connection lines between nearby particles
//! - Proportional rescaling on resize and DPR changes
//!
//! # Example
//!
//! ```ignore
//! use particle_field::{FieldConfig, ParticleField, Preset, RenderTarget};
//!
//! let config = Signal::derive(|| Preset::Snow.config());
//! view! { <ParticleField config=config target=RenderTarget::Live /> }
//! ```

pub mod color;
mod component;
mod driver;
mod particles;
pub mod presets;
mod render;
mod simulation;
mod sprite;
mod state;
pub mod types;
mod viewport;

pub use component::ParticleField;
pub use presets::Preset;
pub use types::{FieldConfig, RenderTarget};
