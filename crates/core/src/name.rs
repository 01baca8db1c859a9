//! Name rules shared by stores and products.

use crate::error::{DomainError, DomainResult};

/// Validate a catalog name and return it owned.
///
/// Names are single console tokens: non-empty and free of whitespace. `kind` is
/// only used in the error message ("store", "product").
pub fn validate_name(kind: &str, name: &str) -> DomainResult<String> {
    if name.is_empty() {
        return Err(DomainError::validation(format!("{kind} name cannot be empty")));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(DomainError::validation(format!(
            "{kind} name cannot contain whitespace: {name:?}"
        )));
    }
    Ok(name.to_string())
}
