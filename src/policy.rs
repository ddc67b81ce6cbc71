use serde::{Deserialize, Serialize};

/// What happens when a single field cannot be bound or extracted.
///
/// Covers setter failures and malformed mapping payloads during
/// [`set_object`](crate::QueryBuilder::set_object) and row materialization.
/// Driver errors are never subject to the policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldPolicy {
    /// Log a warning and leave the field out.
    #[default]
    Lenient,
    /// Abort the surrounding operation with the field's error.
    Strict,
}

impl FieldPolicy {
    pub(crate) fn handle(self, field: &str, error: crate::Error) -> crate::Result<()> {
        match self {
            FieldPolicy::Lenient => {
                tracing::warn!(field, %error, "skipping field");
                Ok(())
            }
            FieldPolicy::Strict => Err(error),
        }
    }

    pub(crate) fn check(self, field: &str, result: crate::Result<()>) -> crate::Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(error) => self.handle(field, error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_lenient_swallows_field_errors() {
        let result = FieldPolicy::Lenient.handle("attributes", Error::Instantiate("x".into()));
        assert!(result.is_ok());
    }

    #[test]
    fn test_strict_propagates_field_errors() {
        let result = FieldPolicy::Strict.check("attributes", Err(Error::Config("bad".into())));
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(FieldPolicy::Strict.check("attributes", Ok(())).is_ok());
    }
}
