//! Opaque code-unit identifiers.
//!
//! A [`CodeUnit`] names a class or method as the analyzer understands it.
//! The core never parses or interprets these beyond splitting the short
//! name off the fully-qualified one for display.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a class or method, owned by the analyzer.
///
/// `Ord` so that source sets (`BTreeSet<CodeUnit>`) iterate
/// deterministically regardless of insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeUnit(String);

impl CodeUnit {
    /// Create a code unit from a fully-qualified name.
    #[must_use]
    pub fn new(fq_name: impl Into<String>) -> Self {
        Self(fq_name.into())
    }

    /// The fully-qualified name.
    #[must_use]
    pub fn fq_name(&self) -> &str {
        &self.0
    }

    /// The short name: everything after the last `.`, or the whole
    /// name when there is no package prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit_once('.').map_or(self.0.as_str(), |(_, n)| n)
    }

    /// The package prefix: everything before the last `.`, or `None`
    /// when there is no package prefix.
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(p, _)| p)
    }
}

impl fmt::Display for CodeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_strips_package() {
        let unit = CodeUnit::new("app.service.UserService");
        assert_eq!(unit.name(), "UserService");
        assert_eq!(unit.package(), Some("app.service"));
    }

    #[test]
    fn bare_name_has_no_package() {
        let unit = CodeUnit::new("Main");
        assert_eq!(unit.name(), "Main");
        assert_eq!(unit.package(), None);
    }

    #[test]
    fn ordering_is_lexicographic_on_fq_name() {
        let a = CodeUnit::new("a.B");
        let b = CodeUnit::new("a.C");
        assert!(a < b);
    }
}
