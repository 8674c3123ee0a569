//! Wire-level error shape returned by the API

use serde::{Deserialize, Serialize};

/// Error body returned by the REST API on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    /// Stable machine-readable code, e.g. `ticket_not_found`.
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wire_shape() {
        let err: ApiError =
            serde_json::from_str(r#"{"code":"ticket_not_found","message":"no such ticket"}"#)
                .expect("decode");
        assert_eq!(err.code, "ticket_not_found");
        assert_eq!(err.to_string(), "ticket_not_found: no such ticket");
    }
}
