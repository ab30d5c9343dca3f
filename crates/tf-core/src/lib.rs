//! Shared primitives used across Threadfold crates.

/// Result alias used across the workspace.
pub type FoldResult<T> = Result<T, FoldError>;

/// Workspace error: a stable machine-readable code plus a human message.
///
/// Codes are dotted and scoped by the crate that raises them
/// (`dom.unknown_node`, `config.invalid_namespace`, ...).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct FoldError {
    pub code: &'static str,
    pub message: String,
}

impl FoldError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// True when the error was raised under the given code scope, e.g. `"dom"`.
    pub fn is_in_scope(&self, scope: &str) -> bool {
        self.code
            .split_once('.')
            .is_some_and(|(prefix, _)| prefix == scope)
    }
}

#[cfg(test)]
mod tests {
    use super::FoldError;

    #[test]
    fn displays_code_and_message() {
        let error = FoldError::new("dom.unknown_node", "node 42 does not exist");
        assert_eq!(error.to_string(), "dom.unknown_node: node 42 does not exist");
    }

    #[test]
    fn matches_code_scope() {
        let error = FoldError::new("config.invalid_namespace", "empty");
        assert!(error.is_in_scope("config"));
        assert!(!error.is_in_scope("dom"));
        assert!(!FoldError::new("bare", "x").is_in_scope("bare"));
    }
}
