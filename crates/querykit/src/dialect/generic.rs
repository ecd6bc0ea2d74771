//! ANSI SQL dialect.
//!
//! Used when the target engine is unknown. Only the SQL:2003 window and
//! ordering features are advertised; builders take their portable fallbacks
//! for everything else.

use super::Dialect;

/// ANSI SQL dialect with `?` placeholders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenericDialect;

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn supports_nulls_ordering(&self) -> bool {
        true
    }

    fn supports_groups_frame(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        let d = GenericDialect;
        assert_eq!(d.placeholder(3), "?");
        assert!(!d.supports_ilike());
        assert!(!d.supports_returning());
        assert!(!d.supports_upsert());
        assert!(d.supports_nulls_ordering());
        assert_eq!(d.max_params(), None);
    }
}
