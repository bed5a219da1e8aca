//! Program Records
//!
//! A [`ProgramRecord`] is the immutable result of compiling one variant: the
//! linked program handle plus the binding locations the renderer uploads to.

use rustc_hash::FxHashMap;
use vantage_core::VariantKey;
use vantage_core::interner::{self, Symbol};

use super::backend::GraphicsBackend;

/// The record type produced by backend `B`.
pub type BackendRecord<B> =
    ProgramRecord<<B as GraphicsBackend>::Program, <B as GraphicsBackend>::UniformLocation>;

/// Linked program and its introspected binding tables.
#[derive(Debug, Clone)]
pub struct ProgramRecord<P, U> {
    pub(crate) key: VariantKey,
    pub(crate) program: P,
    pub(crate) attributes: FxHashMap<Symbol, u32>,
    pub(crate) uniforms: FxHashMap<Symbol, U>,
    pub(crate) uniform_blocks: FxHashMap<Symbol, u32>,
    pub(crate) source_hash: u128,
}

impl<P: Copy, U> ProgramRecord<P, U> {
    #[inline]
    #[must_use]
    pub fn key(&self) -> VariantKey {
        self.key
    }

    #[inline]
    #[must_use]
    pub fn program(&self) -> P {
        self.program
    }

    /// xxh3-128 of the preprocessed vertex and fragment sources.
    #[inline]
    #[must_use]
    pub fn source_hash(&self) -> u128 {
        self.source_hash
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<u32> {
        interner::get(name).and_then(|sym| self.attributes.get(&sym).copied())
    }

    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<&U> {
        interner::get(name).and_then(|sym| self.uniforms.get(&sym))
    }

    #[must_use]
    pub fn uniform_block(&self, name: &str) -> Option<u32> {
        interner::get(name).and_then(|sym| self.uniform_blocks.get(&sym).copied())
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    #[must_use]
    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniform(name).is_some()
    }

    /// Attribute names with their locations, in no particular order.
    pub fn attributes(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        self.attributes
            .iter()
            .map(|(&sym, &loc)| (interner::resolve(sym), loc))
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&'static str, &U)> + '_ {
        self.uniforms
            .iter()
            .map(|(&sym, loc)| (interner::resolve(sym), loc))
    }

    pub fn uniform_blocks(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        self.uniform_blocks
            .iter()
            .map(|(&sym, &index)| (interner::resolve(sym), index))
    }
}
