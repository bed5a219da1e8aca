//! Shader Source Generation
//!
//! Raw GLSL bodies are supplied from outside and never parsed. A variant's
//! final source is the fixed version header, one `#define` per set feature
//! flag in [`vantage_core::FEATURE_MACROS`] order, then the raw text. The
//! output depends on nothing but `(raw, key)`, so it is reproducible and
//! cacheable by key.

use std::borrow::Cow;

use vantage_core::{FeatureFlags, VariantKey};
use xxhash_rust::xxh3::xxh3_128;

/// Version/profile line every generated source starts with.
pub const SHADER_HEADER: &str = "#version 300 es\n\n";

/// Prepends the version header and feature macros to `raw`.
///
/// Flags iterate in bit order, which is [`vantage_core::FEATURE_MACROS`] order.
#[must_use]
pub fn build_source(raw: &str, key: VariantKey) -> String {
    let mut source = String::with_capacity(SHADER_HEADER.len() + 7 * 32 + raw.len() + 1);
    source.push_str(SHADER_HEADER);
    for name in key.flags().iter().filter_map(FeatureFlags::macro_name) {
        source.push_str("#define ");
        source.push_str(name);
        source.push('\n');
    }
    source.push('\n');
    source.push_str(raw);
    source
}

/// xxh3-128 over both preprocessed stages.
#[must_use]
pub fn source_hash(vertex: &str, fragment: &str) -> u128 {
    let mut bytes = Vec::with_capacity(vertex.len() + fragment.len() + 1);
    bytes.extend_from_slice(vertex.as_bytes());
    bytes.push(0);
    bytes.extend_from_slice(fragment.as_bytes());
    xxh3_128(&bytes)
}

/// Raw vertex and fragment text of one program family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePair {
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
}

impl SourcePair {
    pub fn new(vertex: impl Into<Cow<'static, str>>, fragment: impl Into<Cow<'static, str>>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }
}

/// The program families enumerated at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderFamily {
    Shading,
    Line,
    Picking,
}

/// Raw sources for every family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSources {
    pub shading: SourcePair,
    pub line: SourcePair,
    pub picking: SourcePair,
}

impl ProgramSources {
    /// One uber-shader pair for all families, selected purely by macros.
    #[must_use]
    pub fn shared(pair: SourcePair) -> Self {
        Self {
            shading: pair.clone(),
            line: pair.clone(),
            picking: pair,
        }
    }

    #[must_use]
    pub fn family(&self, family: ShaderFamily) -> &SourcePair {
        match family {
            ShaderFamily::Shading => &self.shading,
            ShaderFamily::Line => &self.line,
            ShaderFamily::Picking => &self.picking,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "void main() {}\n";

    #[test]
    fn empty_key_only_adds_header() {
        let source = build_source(RAW, VariantKey::default());
        assert_eq!(source, "#version 300 es\n\n\nvoid main() {}\n");
    }

    #[test]
    fn macros_follow_flag_order_not_insertion_order() {
        let a = VariantKey::from_flags(FeatureFlags::PICKING | FeatureFlags::OBJECT_COLORS);
        let b = VariantKey::from_flags(FeatureFlags::OBJECT_COLORS)
            .with(FeatureFlags::PICKING);
        let source = build_source(RAW, a);
        assert_eq!(source, build_source(RAW, b));
        assert_eq!(
            source,
            "#version 300 es\n\n#define WITH_USEOBJECTCOLORS\n#define WITH_PICKING\n\nvoid main() {}\n"
        );
    }

    #[test]
    fn every_macro_is_emitted_in_table_order() {
        let source = build_source(RAW, VariantKey::from_flags(FeatureFlags::all()));
        let mut last = 0;
        for (_, name) in vantage_core::FEATURE_MACROS {
            let at = source
                .find(&format!("#define {name}\n"))
                .unwrap_or_else(|| panic!("{name} missing"));
            assert!(at > last, "{name} out of order");
            last = at;
        }
    }

    #[test]
    fn output_is_repeatable_and_distinct_per_key() {
        let keys: Vec<_> = (0..(1u32 << 7))
            .map(|bits| VariantKey::from_bits(bits).unwrap())
            .collect();
        let sources: Vec<_> = keys.iter().map(|&k| build_source(RAW, k)).collect();
        for (i, &k) in keys.iter().enumerate() {
            assert_eq!(sources[i], build_source(RAW, k));
            for j in (i + 1)..keys.len() {
                assert_ne!(sources[i], sources[j], "{} vs {}", keys[i], keys[j]);
            }
        }
    }

    #[test]
    fn source_hash_separates_stages() {
        assert_ne!(source_hash("ab", "c"), source_hash("a", "bc"));
        assert_eq!(source_hash("a", "b"), source_hash("a", "b"));
    }

    #[test]
    fn shared_sources_serve_every_family() {
        let sources = ProgramSources::shared(SourcePair::new("v", "f"));
        for family in [ShaderFamily::Shading, ShaderFamily::Line, ShaderFamily::Picking] {
            assert_eq!(sources.family(family).vertex, "v");
        }
    }
}
