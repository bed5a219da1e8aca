//! Program compilation and caching for the Vantage viewer.

pub mod program;

pub use program::{
    BackendRecord, CompletionPolling, FamilySetups, GraphicsBackend, PollPacer, ProgramCache,
    ProgramManager, ProgramRecord, ProgramSources, ResolvedSetup, SetupDescriptor, ShaderFamily,
    SourcePair, build_source, compile_program, line_setup, resolve_setup,
};
