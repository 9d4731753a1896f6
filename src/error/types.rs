use thiserror::Error;

use crate::dom::DomError;

/// Unified result type for the portal crate.
pub type Result<T> = std::result::Result<T, PortalError>;

/// Errors surfaced from a portal render, patch or teardown pass.
///
/// None of these are retried or logged inside the crate; they abort the
/// current pass and return to whoever drove it.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("portal target `{selector}` did not match any element in the document")]
    TargetNotFound { selector: String },
    #[error("portal content must contain exactly one element or component node, found {count}")]
    InvalidContentArity { count: usize },
    #[error("portal has been destroyed")]
    Destroyed,
    #[error("dom error: {0}")]
    Dom(#[from] DomError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_diagnostics() {
        let err = PortalError::TargetNotFound {
            selector: "#outside".to_string(),
        };
        assert!(err.to_string().contains("#outside"));

        let err = PortalError::InvalidContentArity { count: 2 };
        let message = err.to_string();
        assert!(message.contains("exactly one"));
        assert!(message.contains("found 2"));
    }
}
