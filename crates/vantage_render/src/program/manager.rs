//! Program Manager
//!
//! Owns every program variant the viewer renders with. [`ProgramManager::initialize`]
//! compiles the fixed variant matrix, in this order:
//!
//! | Family  | Variants                         | Default descriptor        |
//! |---------|----------------------------------|---------------------------|
//! | Shading | instanced, non-instanced         | [`FamilySetups::shading`] |
//! | Line    | quantized, unquantized           | [`line_setup`]            |
//! | Picking | instanced, non-instanced         | [`FamilySetups::picking`] |
//!
//! Each variant is an independent unit of work. All units run to completion
//! and are joined; if any of them failed, every program already linked is
//! deleted and the first error (in the order above) is returned, leaving the
//! cache empty. A renderer never starts with a partial program set.
//!
//! By default the pipeline never spins on the driver: see
//! [`CompletionPolling`] for pacing completion queries on a single-threaded
//! web executor.

use std::rc::Rc;

use vantage_core::{ProgramError, RenderSettings, Result, VariantKey};

use super::backend::GraphicsBackend;
use super::cache::ProgramCache;
use super::compiler::{CompletionPolling, compile_program};
use super::record::BackendRecord;
use super::setup::{FamilySetups, SetupDescriptor, line_setup, resolve_setup};
use super::shader_gen::{ProgramSources, ShaderFamily};

/// One scheduled compilation.
#[derive(Debug, Clone)]
struct VariantJob {
    family: ShaderFamily,
    key: VariantKey,
    default_setup: SetupDescriptor,
    specific_setup: SetupDescriptor,
}

/// Compiles, owns and hands out the program variants.
///
/// The backend is shared through an `Rc`, which pins the manager to the
/// thread that owns the graphics context.
pub struct ProgramManager<B: GraphicsBackend> {
    backend: Rc<B>,
    settings: RenderSettings,
    sources: ProgramSources,
    setups: FamilySetups,
    polling: CompletionPolling,
    cache: ProgramCache<B::Program, B::UniformLocation>,
}

impl<B: GraphicsBackend> ProgramManager<B> {
    #[must_use]
    pub fn new(backend: Rc<B>, settings: RenderSettings, sources: ProgramSources) -> Self {
        Self {
            backend,
            settings,
            sources,
            setups: FamilySetups::default(),
            polling: CompletionPolling::default(),
            cache: ProgramCache::new(),
        }
    }

    /// Replaces the default shading/picking descriptors.
    #[must_use]
    pub fn with_family_setups(mut self, setups: FamilySetups) -> Self {
        self.setups = setups;
        self
    }

    /// Selects how the pipeline waits for background compilation.
    #[must_use]
    pub fn with_completion_polling(mut self, polling: CompletionPolling) -> Self {
        self.polling = polling;
        self
    }

    #[must_use]
    pub fn backend(&self) -> &Rc<B> {
        &self.backend
    }

    /// Key of a shading or picking variant under this manager's settings.
    #[must_use]
    pub fn create_key(&self, reuse: bool, picking: bool) -> VariantKey {
        VariantKey::new(reuse, picking, &self.settings)
    }

    /// Keys of the variant matrix, in compilation order.
    #[must_use]
    pub fn variant_keys(&self) -> Vec<VariantKey> {
        self.plan().into_iter().map(|job| job.key).collect()
    }

    fn plan(&self) -> Vec<VariantJob> {
        let mut jobs = Vec::with_capacity(6);

        for reuse in [true, false] {
            let key = self.create_key(reuse, false);
            jobs.push(VariantJob {
                family: ShaderFamily::Shading,
                key,
                default_setup: self.setups.shading.clone(),
                specific_setup: resolve_setup(key).into_descriptor(),
            });
        }

        // Some line renderers draw few segments and skip quantization, others
        // copy already-quantized geometry; both variants are needed.
        for quantized in [true, false] {
            let key = VariantKey::line(quantized);
            jobs.push(VariantJob {
                family: ShaderFamily::Line,
                key,
                default_setup: line_setup(quantized),
                specific_setup: resolve_setup(key).into_descriptor(),
            });
        }

        for reuse in [true, false] {
            let key = self.create_key(reuse, true);
            jobs.push(VariantJob {
                family: ShaderFamily::Picking,
                key,
                default_setup: self.setups.picking.clone(),
                specific_setup: resolve_setup(key).into_descriptor(),
            });
        }

        jobs
    }

    /// Compiles the whole variant matrix.
    ///
    /// Resolves once every variant has finished. On error the cache stays
    /// empty and no program object is left behind.
    pub async fn initialize(&mut self) -> Result<()> {
        if !self.cache.is_empty() {
            return Err(ProgramError::AlreadyInitialized);
        }

        let jobs = self.plan();
        log::info!("Compiling {} program variants", jobs.len());

        let backend = &*self.backend;
        let sources = &self.sources;
        let polling = &self.polling;
        let units = jobs.iter().map(|job| {
            compile_program(
                backend,
                polling,
                sources.family(job.family),
                &job.default_setup,
                &job.specific_setup,
                job.key,
            )
        });
        let results = futures::future::join_all(units).await;

        let mut records = Vec::with_capacity(results.len());
        let mut first_error = None;
        for (job, result) in jobs.iter().zip(results) {
            match result {
                Ok(record) => records.push(record),
                Err(err) => {
                    log::error!(
                        "{:?} variant {} failed: {err} ({:?})",
                        job.family,
                        job.key,
                        job.key.describe()
                    );
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        if let Some(err) = first_error {
            release(backend, records);
            return Err(err);
        }

        if let Err(records) = self.cache.fill(records) {
            release(backend, records);
            return Err(ProgramError::AlreadyInitialized);
        }

        log::info!("Program variants ready: {}", self.cache.len());
        Ok(())
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !self.cache.is_empty()
    }

    /// Number of cached programs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// The record for `key`, or `None` if it was never compiled.
    #[inline]
    #[must_use]
    pub fn program(&self, key: VariantKey) -> Option<&BackendRecord<B>> {
        self.cache.get(key)
    }

    /// The record for `key`.
    ///
    /// A key outside the enumerated matrix is a caller bug and is reported as
    /// [`ProgramError::UnknownVariant`].
    pub fn get_program(&self, key: VariantKey) -> Result<&BackendRecord<B>> {
        self.cache
            .get(key)
            .ok_or(ProgramError::UnknownVariant(key))
    }
}

fn release<B: GraphicsBackend>(backend: &B, records: Vec<BackendRecord<B>>) {
    for record in records {
        backend.delete_program(record.program);
    }
}

impl<B: GraphicsBackend> Drop for ProgramManager<B> {
    fn drop(&mut self) {
        let records = self.cache.drain();
        if !records.is_empty() {
            log::debug!("Deleting {} program variants", records.len());
        }
        release(&*self.backend, records);
    }
}
