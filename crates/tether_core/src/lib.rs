//! Tether Core
//!
//! Engine-independent building blocks for the host/script bridge:
//! - Number conversions with script semantics (ToString, ToIntegerOrInfinity)
//! - Relative index clamping used by every Array method
//! - Locale-aware number formatting for `toLocaleString`

pub mod locale;
pub mod number;

/// Bridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
