//! Initialization Failure Tests
//!
//! Tests for:
//! - Compile errors carrying stage, key and preprocessed source
//! - Link errors
//! - Missing bindings
//! - All-or-nothing cache population and object cleanup

use std::rc::Rc;

use vantage::{
    BindingKind, FamilySetups, FeatureFlags, ProgramError, ProgramManager, ProgramSources,
    RenderSettings, SetupDescriptor, ShaderStage, SourcePair, VariantKey,
};
use vantage_dev_utils::{FRAGMENT_SOURCE, RecordingBackend, init_test_logging, npr_sources};

type Failed = (
    Rc<RecordingBackend>,
    ProgramManager<RecordingBackend>,
    ProgramError,
);

fn run(backend: RecordingBackend) -> Failed {
    init_test_logging();
    let backend = Rc::new(backend);
    let mut programs = ProgramManager::new(
        Rc::clone(&backend),
        RenderSettings::default(),
        npr_sources(),
    );
    let err = pollster::block_on(programs.initialize()).expect_err("initialization should fail");
    (backend, programs, err)
}

// ============================================================================
// Compile
// ============================================================================

#[test]
fn compile_failure_reports_stage_and_source() {
    let (backend, programs, err) =
        run(RecordingBackend::new().fail_compile_containing("#define WITH_PICKING"));

    match err {
        ProgramError::ShaderCompile {
            stage,
            key,
            preprocessed,
            log,
        } => {
            assert_eq!(stage, ShaderStage::Vertex);
            // Picking-instanced is the first picking unit in enumeration order.
            assert_eq!(
                key,
                VariantKey::from_flags(FeatureFlags::REUSE | FeatureFlags::PICKING)
            );
            assert!(preprocessed.starts_with("#version 300 es\n\n"));
            assert!(preprocessed.contains("#define WITH_PICKING\n"));
            assert!(log.contains("injected failure"));
        }
        other => panic!("expected ShaderCompile, got {other:?}"),
    }

    assert!(programs.is_empty());
    assert_eq!(backend.live_programs(), 0);
    assert_eq!(backend.live_shaders(), 0);
}

#[test]
fn every_unit_runs_before_failing() {
    let (backend, _programs, err) =
        run(RecordingBackend::new().fail_compile_containing("#define WITH_INSTANCING"));

    assert!(matches!(err, ProgramError::ShaderCompile { .. }));
    // Six variants, two stages each, even though the first unit failed.
    assert_eq!(backend.compile_count(), 12);
    assert_eq!(backend.link_count(), 4);
    assert_eq!(backend.live_programs(), 0);
}

#[test]
fn fragment_failure_names_the_fragment_stage() {
    let sources = ProgramSources::shared(SourcePair::new(
        vantage_dev_utils::VERTEX_SOURCE,
        "precision highp float;\n#ifdef WITH_LINEPRIMITIVES\nbroken\n",
    ));
    init_test_logging();
    let backend = Rc::new(RecordingBackend::new());
    let mut programs = ProgramManager::new(Rc::clone(&backend), RenderSettings::default(), sources);

    let err = pollster::block_on(programs.initialize()).unwrap_err();
    match err {
        ProgramError::ShaderCompile { stage, .. } => assert_eq!(stage, ShaderStage::Fragment),
        other => panic!("expected ShaderCompile, got {other:?}"),
    }
    assert_eq!(backend.live_programs(), 0);
}

#[test]
fn compile_error_message_names_variant() {
    let (_backend, _programs, err) =
        run(RecordingBackend::new().fail_compile_containing("#define WITH_LINEPRIMITIVES"));
    let message = err.to_string();
    assert!(message.contains("vertex shader"), "{message}");
    assert!(message.contains("LINE_PRIMITIVES"), "{message}");
}

// ============================================================================
// Link
// ============================================================================

#[test]
fn link_failure_is_reported_with_key() {
    let (backend, programs, err) =
        run(RecordingBackend::new().fail_link_containing("#define WITH_LINEPRIMITIVES"));

    match err {
        ProgramError::ProgramLink { key, log } => {
            assert!(key.is_line());
            assert!(key.contains(FeatureFlags::VERTEX_QUANTIZATION));
            assert!(log.contains("injected link failure"));
        }
        other => panic!("expected ProgramLink, got {other:?}"),
    }
    assert!(!programs.is_initialized());
    assert_eq!(backend.live_programs(), 0);
}

// ============================================================================
// Introspection
// ============================================================================

#[test]
fn missing_binding_is_reported() {
    init_test_logging();
    let mut setups = FamilySetups::default();
    setups.shading.push_uniform("ambientOcclusion");

    let backend = Rc::new(RecordingBackend::new());
    let mut programs = ProgramManager::new(
        Rc::clone(&backend),
        RenderSettings::default(),
        npr_sources(),
    )
    .with_family_setups(setups);

    let err = pollster::block_on(programs.initialize()).unwrap_err();
    match err {
        ProgramError::BindingNotFound {
            kind,
            name,
            key,
            vertex_source,
        } => {
            assert_eq!(kind, BindingKind::Uniform);
            assert_eq!(name, "ambientOcclusion");
            assert!(key.is_reuse());
            assert!(vertex_source.contains("#define WITH_INSTANCING"));
        }
        other => panic!("expected BindingNotFound, got {other:?}"),
    }
    assert_eq!(backend.live_programs(), 0);
}

#[test]
fn missing_uniform_block_is_reported() {
    init_test_logging();
    let setups = FamilySetups {
        picking: SetupDescriptor::new()
            .with_attributes(&["vertexPosition"])
            .with_uniform_blocks(&["LightData"]),
        ..FamilySetups::default()
    };
    let mut programs = ProgramManager::new(
        Rc::new(RecordingBackend::new()),
        RenderSettings::default(),
        npr_sources(),
    )
    .with_family_setups(setups);

    let err = pollster::block_on(programs.initialize()).unwrap_err();
    assert!(matches!(
        err,
        ProgramError::BindingNotFound {
            kind: BindingKind::UniformBlock,
            ..
        }
    ));
    assert!(programs.is_empty());
}

#[test]
fn shader_without_declarations_misses_attributes() {
    let sources = ProgramSources::shared(SourcePair::new(
        "precision highp float;\nvoid main() {}\n",
        FRAGMENT_SOURCE,
    ));
    init_test_logging();
    let mut programs = ProgramManager::new(
        Rc::new(RecordingBackend::new()),
        RenderSettings::default(),
        sources,
    );

    let err = pollster::block_on(programs.initialize()).unwrap_err();
    match err {
        ProgramError::BindingNotFound { kind, name, .. } => {
            assert_eq!(kind, BindingKind::Attribute);
            assert_eq!(name, "vertexPosition");
        }
        other => panic!("expected BindingNotFound, got {other:?}"),
    }
}

// ============================================================================
// Recovery
// ============================================================================

#[test]
fn failed_manager_still_rejects_lookups() {
    let (_backend, programs, _err) =
        run(RecordingBackend::new().fail_compile_containing("#define WITH_PICKING"));
    let key = programs.create_key(false, false);
    assert!(matches!(
        programs.get_program(key),
        Err(ProgramError::UnknownVariant(_))
    ));
}

#[test]
fn failed_manager_can_be_initialized_again() {
    let (backend, mut programs, err) =
        run(RecordingBackend::new().fail_compile_containing("#define WITH_PICKING"));
    assert!(matches!(err, ProgramError::ShaderCompile { .. }));
    assert!(!programs.is_initialized());

    backend.clear_failures();
    pollster::block_on(programs.initialize()).expect("second initialize should succeed");

    assert_eq!(programs.len(), 6);
    assert_eq!(backend.live_programs(), 6);
    assert_eq!(backend.live_shaders(), 0);
    assert!(programs.get_program(programs.create_key(true, true)).is_ok());
}

#[test]
fn fresh_manager_succeeds_after_failed_one() {
    init_test_logging();
    let sources = ProgramSources::shared(SourcePair::new("void main() {}\n", FRAGMENT_SOURCE));
    let backend = Rc::new(RecordingBackend::new());
    let mut failed =
        ProgramManager::new(Rc::clone(&backend), RenderSettings::default(), sources);
    assert!(pollster::block_on(failed.initialize()).is_err());
    drop(failed);

    let mut programs = ProgramManager::new(
        Rc::clone(&backend),
        RenderSettings::default(),
        npr_sources(),
    );
    pollster::block_on(programs.initialize()).unwrap();
    assert_eq!(backend.live_programs(), 6);
}
