//! Vantage
//!
//! Shader-variant program manager for a WebGL2-class BIM viewer. One
//! vertex/fragment source pair is compiled into a small matrix of programs,
//! one per combination of rendering features (object vs. vertex colours,
//! quantized vertices/normals/colours, instancing, picking, line
//! primitives). The renderer looks programs up by [`VariantKey`] and binds
//! geometry to the locations reported in the [`ProgramRecord`].
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use vantage::{ProgramManager, ProgramSources, RenderSettings, SourcePair};
//!
//! let gl = Rc::new(gl);
//! let settings = RenderSettings::from_json_str(r#"{ "quantizeVertices": true }"#)?;
//! let sources = ProgramSources::shared(SourcePair::new(VERTEX_GLSL, FRAGMENT_GLSL));
//!
//! let mut programs = ProgramManager::new(gl, settings, sources);
//! pollster::block_on(programs.initialize())?;
//!
//! let key = programs.create_key(false, false);
//! let record = programs.get_program(key)?;
//! let position = record.attribute("vertexPosition");
//! ```

pub use vantage_core::{
    BindingKind, FeatureFlags, KeyDescription, ProgramError, RenderSettings, Result, ShaderStage,
    VariantKey, errors, features, interner, settings,
};
pub use vantage_render::program;
pub use vantage_render::{
    BackendRecord, CompletionPolling, FamilySetups, GraphicsBackend, PollPacer, ProgramCache,
    ProgramManager, ProgramRecord, ProgramSources, ResolvedSetup, SetupDescriptor, ShaderFamily,
    SourcePair, build_source, compile_program, line_setup, resolve_setup,
};
