//! Feature Flags and Variant Keys
//!
//! Every compiled program is identified by the set of rendering features it
//! was built for. [`FeatureFlags`] is the closed set of those features and
//! [`VariantKey`] wraps one combination of them.
//!
//! # Key construction
//!
//! Keys are normally built from the process-wide [`RenderSettings`] plus the
//! two per-draw choices the renderer makes (instancing and picking):
//!
//! ```rust,ignore
//! use vantage_core::{RenderSettings, VariantKey};
//!
//! let settings = RenderSettings { quantize_vertices: true, ..Default::default() };
//! let key = VariantKey::new(false, true, &settings);
//! assert!(key.is_picking());
//! ```

use std::fmt;

use bitflags::bitflags;
use serde::Serialize;

use crate::errors::{ProgramError, Result};
use crate::settings::RenderSettings;

bitflags! {
    /// Independent rendering features that select a shader variant.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
    pub struct FeatureFlags: u32 {
        /// Colour comes from a per-object uniform instead of a vertex attribute.
        const OBJECT_COLORS       = 1 << 0;
        /// Positions are stored as integers and dequantized in the shader.
        const VERTEX_QUANTIZATION = 1 << 1;
        /// Normals are stored as packed integers.
        const NORMAL_QUANTIZATION = 1 << 2;
        /// Vertex colours are stored as packed integers.
        const COLOR_QUANTIZATION  = 1 << 3;
        /// Geometry is reused through hardware instancing.
        const REUSE               = 1 << 4;
        /// The program renders object ids for picking.
        const PICKING             = 1 << 5;
        /// The program renders screen-space line quads.
        const LINE_PRIMITIVES     = 1 << 6;
    }
}

/// Bits that no feature flag may ever occupy.
pub const RESERVED_BITS: u32 = 0xFFFF_0000;

/// Preprocessor token emitted for each flag, in emission order.
///
/// The order here is the order the macros appear in generated source, and
/// matches ascending bit order.
pub const FEATURE_MACROS: [(FeatureFlags, &str); 7] = [
    (FeatureFlags::OBJECT_COLORS, "WITH_USEOBJECTCOLORS"),
    (FeatureFlags::VERTEX_QUANTIZATION, "WITH_QUANTIZEVERTICES"),
    (FeatureFlags::NORMAL_QUANTIZATION, "WITH_QUANTIZENORMALS"),
    (FeatureFlags::COLOR_QUANTIZATION, "WITH_QUANTIZECOLORS"),
    (FeatureFlags::REUSE, "WITH_INSTANCING"),
    (FeatureFlags::PICKING, "WITH_PICKING"),
    (FeatureFlags::LINE_PRIMITIVES, "WITH_LINEPRIMITIVES"),
];

const _: () = {
    assert!(FeatureFlags::all().bits() & RESERVED_BITS == 0);

    // Every flag must have exactly one macro, listed in bit order.
    let mut covered = 0u32;
    let mut i = 0;
    while i < FEATURE_MACROS.len() {
        let bits = FEATURE_MACROS[i].0.bits();
        assert!(bits.is_power_of_two());
        assert!(bits > covered);
        covered |= bits;
        i += 1;
    }
    assert!(covered == FeatureFlags::all().bits());
};

impl FeatureFlags {
    /// Macro token for a single flag. Returns `None` for empty or composite values.
    #[must_use]
    pub fn macro_name(self) -> Option<&'static str> {
        FEATURE_MACROS
            .iter()
            .find(|(flag, _)| *flag == self)
            .map(|&(_, name)| name)
    }
}

// ─── VariantKey ──────────────────────────────────────────────────────────────

/// Identity of one compiled program variant.
///
/// A thin wrapper around [`FeatureFlags`] so raw integers cannot be mixed
/// into key arithmetic by accident. Two keys are equal exactly when their
/// flag sets are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct VariantKey(FeatureFlags);

impl VariantKey {
    /// Combines the per-draw `reuse` / `picking` choices with the global settings.
    ///
    /// Normal and colour quantization never apply to picking programs: the
    /// picking pass neither shades nor reads vertex colours.
    #[must_use]
    pub fn new(reuse: bool, picking: bool, settings: &RenderSettings) -> Self {
        let mut flags = FeatureFlags::empty();
        flags.set(FeatureFlags::OBJECT_COLORS, settings.use_object_colors);
        flags.set(FeatureFlags::VERTEX_QUANTIZATION, settings.quantize_vertices);
        flags.set(
            FeatureFlags::NORMAL_QUANTIZATION,
            !picking && settings.quantize_normals,
        );
        flags.set(
            FeatureFlags::COLOR_QUANTIZATION,
            !picking && settings.quantize_colors,
        );
        flags.set(FeatureFlags::REUSE, reuse);
        flags.set(FeatureFlags::PICKING, picking);
        Self(flags)
    }

    /// Key of a line-primitive program.
    #[must_use]
    pub fn line(quantized: bool) -> Self {
        let mut flags = FeatureFlags::LINE_PRIMITIVES;
        flags.set(FeatureFlags::VERTEX_QUANTIZATION, quantized);
        Self(flags)
    }

    #[inline]
    #[must_use]
    pub const fn from_flags(flags: FeatureFlags) -> Self {
        Self(flags)
    }

    /// Builds a key from raw bits, rejecting bits that name no known flag.
    pub fn from_bits(bits: u32) -> Result<Self> {
        FeatureFlags::from_bits(bits)
            .map(Self)
            .ok_or(ProgramError::UnknownFeatureBits(bits))
    }

    #[inline]
    #[must_use]
    pub const fn flags(self) -> FeatureFlags {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0.bits()
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, flag: FeatureFlags) -> bool {
        self.0.contains(flag)
    }

    /// Returns a copy of this key with `flag` added.
    #[inline]
    #[must_use]
    pub const fn with(self, flag: FeatureFlags) -> Self {
        Self(self.0.union(flag))
    }

    #[inline]
    #[must_use]
    pub const fn is_picking(self) -> bool {
        self.0.contains(FeatureFlags::PICKING)
    }

    #[inline]
    #[must_use]
    pub const fn is_reuse(self) -> bool {
        self.0.contains(FeatureFlags::REUSE)
    }

    #[inline]
    #[must_use]
    pub const fn is_line(self) -> bool {
        self.0.contains(FeatureFlags::LINE_PRIMITIVES)
    }

    /// Per-flag breakdown, used in logs and diagnostics.
    #[must_use]
    pub fn describe(self) -> KeyDescription {
        KeyDescription {
            use_object_colors: self.contains(FeatureFlags::OBJECT_COLORS),
            quantize_vertices: self.contains(FeatureFlags::VERTEX_QUANTIZATION),
            quantize_normals: self.contains(FeatureFlags::NORMAL_QUANTIZATION),
            quantize_colors: self.contains(FeatureFlags::COLOR_QUANTIZATION),
            reuse: self.contains(FeatureFlags::REUSE),
            picking: self.contains(FeatureFlags::PICKING),
            line_primitives: self.contains(FeatureFlags::LINE_PRIMITIVES),
        }
    }
}

impl From<FeatureFlags> for VariantKey {
    fn from(flags: FeatureFlags) -> Self {
        Self(flags)
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "0x{:02x} (none)", self.bits());
        }
        write!(f, "0x{:02x} (", self.bits())?;
        for (i, (name, _)) in self.0.iter_names().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
        }
        f.write_str(")")
    }
}

/// Serialisable view of a [`VariantKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDescription {
    pub use_object_colors: bool,
    pub quantize_vertices: bool,
    pub quantize_normals: bool,
    pub quantize_colors: bool,
    pub reuse: bool,
    pub picking: bool,
    pub line_primitives: bool,
}
