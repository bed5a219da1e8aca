//! Program Compiler
//!
//! Compiles both stages of one variant, links them and introspects every
//! name of the merged setup descriptor. Any failure deletes the objects
//! created so far and is returned to the caller; nothing is logged and
//! dropped.
//!
//! Waiting for the driver is expressed as `await` points, so several
//! variants scheduled together interleave their compile and link latency
//! while all graphics calls stay on the calling thread. How those points
//! wait is chosen by [`CompletionPolling`].

use std::fmt;
use std::rc::Rc;
use std::task::Poll;

use futures::future::LocalBoxFuture;
use rustc_hash::FxHashMap;
use vantage_core::interner;
use vantage_core::{BindingKind, ProgramError, Result, ShaderStage, VariantKey};

use super::backend::GraphicsBackend;
use super::record::{BackendRecord, ProgramRecord};
use super::setup::SetupDescriptor;
use super::shader_gen::{SourcePair, build_source, source_hash};

/// Binding point every uniform block is attached to.
///
/// All variants share slot 0 so one `LightData` buffer serves them all.
pub const UNIFORM_BLOCK_BINDING: u32 = 0;

/// Produces the future awaited between two completion queries.
pub type PollPacer = Rc<dyn Fn() -> LocalBoxFuture<'static, ()>>;

/// How the compiler waits for background compilation and linking.
#[derive(Clone, Default)]
pub enum CompletionPolling {
    /// Yield once so every scheduled variant submits its work, then rely on
    /// the status queries, which block in the driver until the result is
    /// known. Completion queries are never issued.
    #[default]
    Blocking,
    /// Query completion, awaiting the pacer's future between queries. On the
    /// web the pacer should resolve on the next animation frame or task so
    /// the browser can make progress.
    Paced(PollPacer),
}

impl fmt::Debug for CompletionPolling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocking => f.write_str("Blocking"),
            Self::Paced(_) => f.write_str("Paced"),
        }
    }
}

/// Returns `Pending` exactly once.
async fn yield_now() {
    let mut yielded = false;
    futures::future::poll_fn(|cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .await;
}

async fn wait_until(polling: &CompletionPolling, mut ready: impl FnMut() -> bool) {
    match polling {
        CompletionPolling::Blocking => yield_now().await,
        CompletionPolling::Paced(pace) => {
            while !ready() {
                pace().await;
            }
        }
    }
}

fn start_stage<B: GraphicsBackend>(
    backend: &B,
    stage: ShaderStage,
    source: &str,
) -> Result<B::Shader> {
    let shader = backend
        .create_shader(stage)
        .map_err(|reason| ProgramError::ObjectCreation {
            what: stage.label(),
            reason,
        })?;
    backend.shader_source(shader, source);
    backend.compile_shader(shader);
    Ok(shader)
}

/// Compiles, links and introspects the variant `key`.
///
/// `default_setup` and `specific_setup` are applied in that order.
pub async fn compile_program<B: GraphicsBackend>(
    backend: &B,
    polling: &CompletionPolling,
    sources: &SourcePair,
    default_setup: &SetupDescriptor,
    specific_setup: &SetupDescriptor,
    key: VariantKey,
) -> Result<BackendRecord<B>> {
    let vertex_source = build_source(&sources.vertex, key);
    let fragment_source = build_source(&sources.fragment, key);

    let vertex = start_stage(backend, ShaderStage::Vertex, &vertex_source)?;
    let fragment = match start_stage(backend, ShaderStage::Fragment, &fragment_source) {
        Ok(shader) => shader,
        Err(err) => {
            backend.delete_shader(vertex);
            return Err(err);
        }
    };
    let stages = [
        (ShaderStage::Vertex, vertex, &vertex_source),
        (ShaderStage::Fragment, fragment, &fragment_source),
    ];
    let delete_shaders = || {
        for &(_, shader, _) in &stages {
            backend.delete_shader(shader);
        }
    };

    wait_until(polling, || {
        stages
            .iter()
            .all(|&(_, shader, _)| backend.shader_completion_status(shader))
    })
    .await;

    for &(stage, shader, source) in &stages {
        if !backend.shader_compile_status(shader) {
            let log = backend.shader_info_log(shader);
            delete_shaders();
            return Err(ProgramError::ShaderCompile {
                stage,
                key,
                preprocessed: source.clone(),
                log,
            });
        }
    }

    let program = match backend.create_program() {
        Ok(program) => program,
        Err(reason) => {
            delete_shaders();
            return Err(ProgramError::ObjectCreation {
                what: "program",
                reason,
            });
        }
    };
    for &(_, shader, _) in &stages {
        backend.attach_shader(program, shader);
    }
    backend.link_program(program);

    wait_until(polling, || backend.program_completion_status(program)).await;

    for &(_, shader, _) in &stages {
        backend.detach_shader(program, shader);
    }
    delete_shaders();

    if !backend.program_link_status(program) {
        let log = backend.program_info_log(program);
        backend.delete_program(program);
        return Err(ProgramError::ProgramLink { key, log });
    }

    let setup = default_setup.merged_with(specific_setup);
    match introspect(backend, program, &setup, key, &vertex_source) {
        Ok(mut record) => {
            record.source_hash = source_hash(&vertex_source, &fragment_source);
            log::debug!(
                "Compiled program {key}: {} attributes, {} uniforms, {} blocks",
                record.attributes.len(),
                record.uniforms.len(),
                record.uniform_blocks.len()
            );
            Ok(record)
        }
        Err(err) => {
            backend.delete_program(program);
            Err(err)
        }
    }
}

fn introspect<B: GraphicsBackend>(
    backend: &B,
    program: B::Program,
    setup: &SetupDescriptor,
    key: VariantKey,
    vertex_source: &str,
) -> Result<BackendRecord<B>> {
    let missing = |kind, sym| ProgramError::BindingNotFound {
        kind,
        name: interner::resolve(sym).to_owned(),
        key,
        vertex_source: vertex_source.to_owned(),
    };

    let mut attributes = FxHashMap::default();
    for &sym in &setup.attributes {
        let location = backend
            .attrib_location(program, interner::resolve(sym))
            .ok_or_else(|| missing(BindingKind::Attribute, sym))?;
        attributes.insert(sym, location);
    }

    let mut uniforms = FxHashMap::default();
    for &sym in &setup.uniforms {
        let location = backend
            .uniform_location(program, interner::resolve(sym))
            .ok_or_else(|| missing(BindingKind::Uniform, sym))?;
        uniforms.insert(sym, location);
    }

    let mut uniform_blocks = FxHashMap::default();
    for &sym in &setup.uniform_blocks {
        let index = backend
            .uniform_block_index(program, interner::resolve(sym))
            .ok_or_else(|| missing(BindingKind::UniformBlock, sym))?;
        backend.uniform_block_binding(program, index, UNIFORM_BLOCK_BINDING);
        uniform_blocks.insert(sym, index);
    }

    Ok(ProgramRecord {
        key,
        program,
        attributes,
        uniforms,
        uniform_blocks,
        source_hash: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting_pacer(calls: &Rc<Cell<u32>>) -> CompletionPolling {
        let calls = Rc::clone(calls);
        CompletionPolling::Paced(Rc::new(move || -> LocalBoxFuture<'static, ()> {
            calls.set(calls.get() + 1);
            Box::pin(yield_now())
        }))
    }

    #[test]
    fn paced_wait_queries_until_ready() {
        let queries = Cell::new(0);
        let paces = Rc::new(Cell::new(0));
        pollster::block_on(wait_until(&counting_pacer(&paces), || {
            queries.set(queries.get() + 1);
            queries.get() >= 3
        }));
        assert_eq!(queries.get(), 3);
        // One pause between each pair of queries.
        assert_eq!(paces.get(), 2);
    }

    #[test]
    fn paced_wait_skips_pacer_when_ready() {
        let paces = Rc::new(Cell::new(0));
        pollster::block_on(wait_until(&counting_pacer(&paces), || true));
        assert_eq!(paces.get(), 0);
    }

    #[test]
    fn blocking_wait_never_queries_completion() {
        let queries = Cell::new(0);
        pollster::block_on(wait_until(&CompletionPolling::Blocking, || {
            queries.set(queries.get() + 1);
            false
        }));
        assert_eq!(queries.get(), 0);
    }
}
