//! Shader program variants
//!
//! Compiles, introspects and caches the program family of the viewer:
//! - setup: binding descriptors and the per-key resolver
//! - shader_gen: macro prefixing of raw GLSL
//! - backend: the graphics API seam (OpenGL through `glow`)
//! - compiler: compile, link and introspect one variant
//! - record / cache: compiled programs keyed by variant
//! - manager: the initialization pipeline and render-time lookups

pub mod backend;
pub mod cache;
pub mod compiler;
pub mod manager;
pub mod record;
pub mod setup;
pub mod shader_gen;

pub use backend::GraphicsBackend;
pub use cache::ProgramCache;
pub use compiler::{CompletionPolling, PollPacer, UNIFORM_BLOCK_BINDING, compile_program};
pub use manager::ProgramManager;
pub use record::{BackendRecord, ProgramRecord};
pub use setup::{
    FamilySetups, LIGHT_DATA_BLOCK, ResolvedSetup, SetupDescriptor, line_setup, resolve_setup,
};
pub use shader_gen::{
    ProgramSources, SHADER_HEADER, ShaderFamily, SourcePair, build_source, source_hash,
};
