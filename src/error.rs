#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EventError {
    #[error("Expected event to be instance of {expected}, got {actual}.")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Listener for `{event}` failed: {source}")]
    ListenerFailed {
        event: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {msg}")]
    Configuration { msg: String },
}
