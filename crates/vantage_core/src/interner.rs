//! Binding-name interner.
//!
//! Attribute, uniform and uniform-block names are interned into [`Symbol`]s
//! so descriptors compare and merge as integers and program records can be
//! queried by name without allocating.

use lasso::{Spur, ThreadedRodeo};
use once_cell::sync::Lazy;

static INTERNER: Lazy<ThreadedRodeo> = Lazy::new(ThreadedRodeo::new);

/// Compact identifier of an interned binding name.
pub type Symbol = Spur;

#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Looks up a name without interning it.
#[inline]
#[must_use]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

#[inline]
#[must_use]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

/// Interns a list of binding names, preserving order.
pub fn intern_all<'a>(names: &'a [&'a str]) -> impl Iterator<Item = Symbol> + 'a {
    names.iter().map(|name| intern(name))
}

/// Names behind `symbols`, for logs and debug output.
#[must_use]
pub fn resolve_all(symbols: &[Symbol]) -> Vec<&'static str> {
    symbols.iter().map(|&sym| resolve(sym)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let a = intern("vertexPosition");
        let b = intern("vertexPosition");
        assert_eq!(a, b);
        assert_eq!(resolve(a), "vertexPosition");
    }

    #[test]
    fn bulk_intern_keeps_order() {
        let symbols: Vec<_> = intern_all(&["viewMatrix", "sectionPlane", "viewMatrix"]).collect();
        assert_eq!(symbols[0], symbols[2]);
        assert_eq!(
            resolve_all(&symbols),
            vec!["viewMatrix", "sectionPlane", "viewMatrix"]
        );
    }

    #[test]
    fn get_does_not_intern() {
        assert!(get("neverInternedBindingName").is_none());
        let sym = intern("internedOnce");
        assert_eq!(get("internedOnce"), Some(sym));
    }
}
