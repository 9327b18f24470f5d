//! Field default values.

/// Whether a default is a literal or a raw SQL expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultKind {
    #[default]
    Value,
    Expression,
}

const TIMESTAMP_EQUIVALENTS: [&str; 2] = ["CURRENT_TIMESTAMP", "NOW()"];

/// A default value tagged as literal or expression.
///
/// Equality is dialect-aware: `CURRENT_TIMESTAMP` and `NOW()` compare equal
/// (case-insensitively) so they never show up as a spurious change.
#[derive(Debug, Clone, Eq)]
pub struct FieldDefaultValue {
    value: String,
    kind: DefaultKind,
}

impl FieldDefaultValue {
    /// A literal default.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: DefaultKind::Value,
        }
    }

    /// A raw SQL expression default, rendered unquoted.
    pub fn expression(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: DefaultKind::Expression,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> DefaultKind {
        self.kind
    }

    pub fn is_expression(&self) -> bool {
        self.kind == DefaultKind::Expression
    }
}

impl PartialEq for FieldDefaultValue {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind {
            return false;
        }
        if self.value == other.value {
            return true;
        }
        let is_now = |v: &str| TIMESTAMP_EQUIVALENTS.contains(&v.to_uppercase().as_str());
        is_now(&self.value) && is_now(&other.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_equivalence() {
        assert_eq!(
            FieldDefaultValue::new("CURRENT_TIMESTAMP"),
            FieldDefaultValue::new("now()")
        );
        assert_eq!(
            FieldDefaultValue::expression("NOW()"),
            FieldDefaultValue::expression("current_timestamp")
        );
    }

    #[test]
    fn test_kind_must_match() {
        assert_ne!(
            FieldDefaultValue::new("CURRENT_TIMESTAMP"),
            FieldDefaultValue::expression("CURRENT_TIMESTAMP")
        );
        assert_ne!(FieldDefaultValue::new("1"), FieldDefaultValue::new("2"));
    }
}
