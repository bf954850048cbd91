use thiserror::Error;

/// Errors surfaced by the tessellator and its draw backends.
///
/// None of these are retried. Protocol violations mean the caller has a bug;
/// the current session should be abandoned and a fresh one started next frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TessError {
    /// `begin` was called while a session was already open.
    #[error("already tessellating")]
    AlreadyDrawing,

    /// A flush was requested with no open session.
    #[error("not tessellating")]
    NotDrawing,

    /// The requested configuration cannot be served at this point of use.
    #[error("unsupported configuration: {0}")]
    Unsupported(String),

    /// The draw backend failed to issue a call.
    #[error("draw backend failure: {0}")]
    Backend(String),
}

impl TessError {
    /// Returns `true` for begin/flush ordering mistakes.
    #[inline]
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, TessError::AlreadyDrawing | TessError::NotDrawing)
    }

    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        TessError::Unsupported(what.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_violations_are_classified() {
        assert!(TessError::AlreadyDrawing.is_protocol_violation());
        assert!(TessError::NotDrawing.is_protocol_violation());
        assert!(!TessError::unsupported("vbo").is_protocol_violation());
        assert!(!TessError::Backend("lost".into()).is_protocol_violation());
    }

    #[test]
    fn messages_name_the_condition() {
        assert_eq!(TessError::NotDrawing.to_string(), "not tessellating");
        assert_eq!(
            TessError::unsupported("quad strips").to_string(),
            "unsupported configuration: quad strips"
        );
    }
}
