//! Error Types
//!
//! All fallible operations of the program manager return [`Result<T>`], an
//! alias for `std::result::Result<T, ProgramError>`.
//!
//! Errors raised while the variant matrix is being compiled are fatal: the
//! manager never stores a placeholder program, so a failure surfaces where
//! it happened instead of at the first draw call that touches the variant.

use thiserror::Error;

use crate::features::VariantKey;
use crate::stage::ShaderStage;

/// Which binding table a lookup failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Attribute,
    Uniform,
    UniformBlock,
}

impl std::fmt::Display for BindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Attribute => "attribute",
            Self::Uniform => "uniform",
            Self::UniformBlock => "uniform block",
        })
    }
}

/// The error type of the program manager.
#[derive(Error, Debug)]
pub enum ProgramError {
    // ========================================================================
    // Compilation
    // ========================================================================
    /// A shader stage failed to compile. Linking was not attempted.
    #[error("Failed to compile {stage} for variant {key}: {log}")]
    ShaderCompile {
        stage: ShaderStage,
        key: VariantKey,
        /// The full source handed to the driver, macros included.
        preprocessed: String,
        /// Compiler diagnostic.
        log: String,
    },

    /// Both stages compiled but the program failed to link.
    #[error("Failed to link program for variant {key}: {log}")]
    ProgramLink { key: VariantKey, log: String },

    /// A name from the setup descriptor is not exposed by the linked program.
    #[error("Missing {kind} '{name}' in program for variant {key}")]
    BindingNotFound {
        kind: BindingKind,
        name: String,
        key: VariantKey,
        /// Preprocessed vertex source of the offending program.
        vertex_source: String,
    },

    /// The graphics API refused to allocate a shader or program object.
    #[error("Failed to create {what}: {reason}")]
    ObjectCreation { what: &'static str, reason: String },

    // ========================================================================
    // Lookup & Lifecycle
    // ========================================================================
    /// The key was never part of the enumerated variant matrix.
    #[error("No program was compiled for variant {0}")]
    UnknownVariant(VariantKey),

    /// Raw key bits name no known feature flag.
    #[error("Unknown feature bits in variant key: {0:#x}")]
    UnknownFeatureBits(u32),

    /// `initialize()` was called on a manager that already holds programs.
    #[error("Program manager is already initialized")]
    AlreadyInitialized,

    // ========================================================================
    // Configuration
    // ========================================================================
    /// Render settings could not be parsed.
    #[error("Invalid render settings: {0}")]
    Settings(#[from] serde_json::Error),

    /// Render settings file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Alias for `Result<T, ProgramError>`.
pub type Result<T> = std::result::Result<T, ProgramError>;
