//! Core types of the Vantage shader-variant program manager.
//!
//! - [`features`]: feature flags and variant keys
//! - [`settings`]: process-wide render settings
//! - [`stage`]: shader stages
//! - [`interner`]: binding-name interning
//! - [`errors`]: the error taxonomy shared by all crates

pub mod errors;
pub mod features;
pub mod interner;
pub mod settings;
pub mod stage;

pub use errors::{BindingKind, ProgramError, Result};
pub use features::{FEATURE_MACROS, FeatureFlags, KeyDescription, RESERVED_BITS, VariantKey};
pub use interner::Symbol;
pub use settings::RenderSettings;
pub use stage::ShaderStage;
