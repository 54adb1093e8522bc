#![forbid(unsafe_code)]

//! Transform capability probing.
//!
//! Older engines only expose the transform style under a vendor prefix. The
//! probe tries the unprefixed name first, then each prefix in turn, and
//! reports the first name the host's style object accepts.

use core::fmt;

/// Vendor prefixes tried after the standard property, in order.
pub const VENDOR_PREFIXES: [&str; 4] = ["Webkit", "Moz", "ms", "O"];

/// Host-specific name of the transform style property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformProperty(String);

impl TransformProperty {
    /// The standard unprefixed property.
    #[must_use]
    pub fn standard() -> Self {
        Self("transform".to_owned())
    }

    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a vendor-prefixed variant.
    #[must_use]
    pub fn is_prefixed(&self) -> bool {
        self.0 != "transform"
    }
}

impl fmt::Display for TransformProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Candidate property names for `property`, standard name first.
///
/// Prefixed names capitalize the first letter of the property
/// (`transform` becomes `WebkitTransform`).
#[must_use]
pub fn prefixed_candidates(property: &str) -> Vec<String> {
    let mut candidates = Vec::with_capacity(VENDOR_PREFIXES.len() + 1);
    candidates.push(property.to_owned());
    let mut chars = property.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => return candidates,
    };
    candidates.extend(
        VENDOR_PREFIXES
            .iter()
            .map(|prefix| format!("{prefix}{capitalized}")),
    );
    candidates
}

/// Find the first transform property name accepted by `supports`.
pub fn probe_transform(supports: impl Fn(&str) -> bool) -> Option<TransformProperty> {
    prefixed_candidates("transform")
        .into_iter()
        .find(|name| supports(name))
        .map(TransformProperty)
}
