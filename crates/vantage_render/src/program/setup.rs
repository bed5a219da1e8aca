//! Setup Descriptors
//!
//! A [`SetupDescriptor`] names the attributes, uniforms and uniform blocks a
//! linked program must expose. Each program is introspected against two
//! descriptors, applied in order:
//!
//! 1. the family-wide default (see [`FamilySetups`] and [`line_setup`])
//! 2. the key-specific descriptor produced by [`resolve_setup`]
//!
//! Duplicates between the two are harmless; re-binding a name yields the
//! same location.

use std::fmt;

use vantage_core::interner::{self, Symbol};
use vantage_core::{FeatureFlags, VariantKey};

/// Named bindings a program must expose.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SetupDescriptor {
    pub attributes: Vec<Symbol>,
    pub uniforms: Vec<Symbol>,
    pub uniform_blocks: Vec<Symbol>,
}

impl SetupDescriptor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_attributes(mut self, names: &[&str]) -> Self {
        self.attributes.extend(interner::intern_all(names));
        self
    }

    #[must_use]
    pub fn with_uniforms(mut self, names: &[&str]) -> Self {
        self.uniforms.extend(interner::intern_all(names));
        self
    }

    #[must_use]
    pub fn with_uniform_blocks(mut self, names: &[&str]) -> Self {
        self.uniform_blocks.extend(interner::intern_all(names));
        self
    }

    pub fn push_attribute(&mut self, name: &str) {
        self.attributes.push(interner::intern(name));
    }

    pub fn push_uniform(&mut self, name: &str) {
        self.uniforms.push(interner::intern(name));
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        interner::get(name).is_some_and(|sym| self.attributes.contains(&sym))
    }

    #[must_use]
    pub fn has_uniform(&self, name: &str) -> bool {
        interner::get(name).is_some_and(|sym| self.uniforms.contains(&sym))
    }

    #[must_use]
    pub fn has_uniform_block(&self, name: &str) -> bool {
        interner::get(name).is_some_and(|sym| self.uniform_blocks.contains(&sym))
    }

    /// Appends `other` after `self`. Duplicates are kept.
    #[must_use]
    pub fn merged_with(&self, other: &SetupDescriptor) -> SetupDescriptor {
        let mut result = self.clone();
        result.attributes.extend_from_slice(&other.attributes);
        result.uniforms.extend_from_slice(&other.uniforms);
        result.uniform_blocks.extend_from_slice(&other.uniform_blocks);
        result
    }
}

impl fmt::Debug for SetupDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupDescriptor")
            .field("attributes", &interner::resolve_all(&self.attributes))
            .field("uniforms", &interner::resolve_all(&self.uniforms))
            .field("uniform_blocks", &interner::resolve_all(&self.uniform_blocks))
            .finish()
    }
}

/// Outcome of [`resolve_setup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSetup {
    /// Line programs carry their own hand-written descriptor; see [`line_setup`].
    Line,
    /// Bindings required on top of the family default.
    Specific(SetupDescriptor),
}

impl ResolvedSetup {
    /// The key-specific descriptor, empty for line programs.
    #[must_use]
    pub fn into_descriptor(self) -> SetupDescriptor {
        match self {
            Self::Line => SetupDescriptor::default(),
            Self::Specific(setup) => setup,
        }
    }
}

/// Computes the bindings a variant needs beyond its family default.
#[must_use]
pub fn resolve_setup(key: VariantKey) -> ResolvedSetup {
    if key.is_line() {
        return ResolvedSetup::Line;
    }

    let picking = key.is_picking();
    let reuse = key.is_reuse();
    let mut setup = SetupDescriptor::new();

    if picking {
        setup.push_attribute(if reuse {
            "instancePickColors"
        } else {
            "vertexPickColor"
        });
    }

    if reuse {
        setup.push_attribute("instanceMatrices");
        setup.push_uniform("numContainedInstances");
        setup.push_uniform("containedInstances");
        setup.push_uniform("containedMeansHidden");
        if !picking {
            setup.push_attribute("instanceNormalMatrices");
        }
    }

    if !picking {
        if key.contains(FeatureFlags::OBJECT_COLORS) {
            setup.push_uniform("objectColor");
        } else {
            setup.push_attribute("vertexColor");
        }
    }

    // Normal quantization changes only the shader body, never the bindings.

    if key.contains(FeatureFlags::VERTEX_QUANTIZATION) {
        setup.push_uniform("vertexQuantizationMatrix");
    }

    ResolvedSetup::Specific(setup)
}

/// Descriptor of the line-primitive programs.
#[must_use]
pub fn line_setup(quantized: bool) -> SetupDescriptor {
    let mut setup = SetupDescriptor::new()
        .with_attributes(&["vertexPosition", "nextVertexPosition", "direction"])
        .with_uniforms(&[
            "matrix",
            "inputColor",
            "projectionMatrix",
            "postProcessingTranslation",
            "viewMatrix",
            "aspect",
            "thickness",
        ]);
    if quantized {
        setup.push_uniform("vertexQuantizationMatrix");
    }
    setup
}

/// Family-wide default descriptors for the shading and picking programs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilySetups {
    pub shading: SetupDescriptor,
    pub picking: SetupDescriptor,
}

/// Name of the lighting uniform block shared by every shading variant.
pub const LIGHT_DATA_BLOCK: &str = "LightData";

impl Default for FamilySetups {
    fn default() -> Self {
        Self {
            shading: SetupDescriptor::new()
                .with_attributes(&["vertexPosition", "vertexNormal"])
                .with_uniforms(&[
                    "projectionMatrix",
                    "viewNormalMatrix",
                    "postProcessingTranslation",
                    "viewMatrix",
                    "sectionPlane",
                ])
                .with_uniform_blocks(&[LIGHT_DATA_BLOCK]),
            picking: SetupDescriptor::new()
                .with_attributes(&["vertexPosition"])
                .with_uniforms(&[
                    "projectionMatrix",
                    "postProcessingTranslation",
                    "viewMatrix",
                    "sectionPlane",
                ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(flags: FeatureFlags) -> VariantKey {
        VariantKey::from_flags(flags)
    }

    fn specific(flags: FeatureFlags) -> SetupDescriptor {
        match resolve_setup(key(flags)) {
            ResolvedSetup::Specific(setup) => setup,
            ResolvedSetup::Line => panic!("unexpected line branch for {flags:?}"),
        }
    }

    #[test]
    fn line_bit_short_circuits_for_every_combination() {
        for bits in 0..(1u32 << 7) {
            let k = VariantKey::from_bits(bits)
                .unwrap()
                .with(FeatureFlags::LINE_PRIMITIVES);
            assert_eq!(resolve_setup(k), ResolvedSetup::Line);
        }
    }

    #[test]
    fn debug_output_names_bindings() {
        let rendered = format!("{:?}", FamilySetups::default().shading);
        assert!(rendered.contains("\"vertexPosition\""), "{rendered}");
        assert!(rendered.contains("\"LightData\""), "{rendered}");
    }

    #[test]
    fn resolution_is_deterministic() {
        for bits in 0..(1u32 << 6) {
            let k = VariantKey::from_bits(bits).unwrap();
            assert_eq!(resolve_setup(k), resolve_setup(k));
        }
    }

    #[test]
    fn plain_shading_uses_vertex_colors() {
        let setup = specific(FeatureFlags::empty());
        assert!(setup.has_attribute("vertexColor"));
        assert!(!setup.has_uniform("objectColor"));
        assert_eq!(setup.attributes.len(), 1);
        assert!(setup.uniforms.is_empty());
    }

    #[test]
    fn object_colors_replace_vertex_colors() {
        let setup = specific(FeatureFlags::OBJECT_COLORS);
        assert!(setup.has_uniform("objectColor"));
        assert!(!setup.has_attribute("vertexColor"));
    }

    #[test]
    fn picking_ignores_color_sources() {
        let setup = specific(FeatureFlags::PICKING | FeatureFlags::OBJECT_COLORS);
        assert!(setup.has_attribute("vertexPickColor"));
        assert!(!setup.has_uniform("objectColor"));
        assert!(!setup.has_attribute("vertexColor"));
    }

    #[test]
    fn instanced_picking_uses_instance_pick_colors_without_normals() {
        let setup = specific(FeatureFlags::PICKING | FeatureFlags::REUSE);
        assert!(setup.has_attribute("instancePickColors"));
        assert!(!setup.has_attribute("vertexPickColor"));
        assert!(setup.has_attribute("instanceMatrices"));
        assert!(!setup.has_attribute("instanceNormalMatrices"));
        for uniform in [
            "numContainedInstances",
            "containedInstances",
            "containedMeansHidden",
        ] {
            assert!(setup.has_uniform(uniform), "missing {uniform}");
        }
    }

    #[test]
    fn instanced_shading_needs_normal_matrices() {
        let setup = specific(FeatureFlags::REUSE);
        assert!(setup.has_attribute("instanceMatrices"));
        assert!(setup.has_attribute("instanceNormalMatrices"));
        assert!(setup.has_attribute("vertexColor"));
    }

    #[test]
    fn quantization_bindings() {
        let setup = specific(FeatureFlags::VERTEX_QUANTIZATION);
        assert!(setup.has_uniform("vertexQuantizationMatrix"));

        let normals_only = specific(FeatureFlags::NORMAL_QUANTIZATION);
        assert_eq!(normals_only, specific(FeatureFlags::empty()));
    }

    #[test]
    fn line_setup_adds_quantization_matrix_only_when_quantized() {
        assert!(line_setup(true).has_uniform("vertexQuantizationMatrix"));
        assert!(!line_setup(false).has_uniform("vertexQuantizationMatrix"));
        assert!(line_setup(false).has_attribute("nextVertexPosition"));
    }

    #[test]
    fn merge_keeps_default_first_and_tolerates_duplicates() {
        let defaults = FamilySetups::default();
        let extra = SetupDescriptor::new().with_attributes(&["vertexPosition", "vertexColor"]);
        let merged = defaults.shading.merged_with(&extra);
        assert_eq!(merged.attributes[0], interner::intern("vertexPosition"));
        assert_eq!(merged.attributes.len(), 4);
        assert!(merged.has_uniform_block(LIGHT_DATA_BLOCK));
    }
}
