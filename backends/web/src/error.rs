use thiserror::Error;
use wasm_bindgen::JsValue;

/// Error type produced by the web backend.
#[derive(Debug, Error)]
pub enum WebError {
    /// The DOM APIs are not accessible (e.g., when executed outside of a browser).
    #[error("DOM is not available")]
    DomUnavailable,
    /// The requested mounting node cannot be located.
    #[error("failed to find DOM element with id `{0}`")]
    RootNotFound(String),
    /// Wrapper around JavaScript exceptions.
    #[error("JavaScript error: {0}")]
    Js(String),
    /// The runtime rejected or failed an operation.
    #[error(transparent)]
    Engine(#[from] trellis_core::Error),
}

impl From<JsValue> for WebError {
    fn from(value: JsValue) -> Self {
        value
            .as_string()
            .map_or_else(|| Self::Js(format!("{value:?}")), Self::Js)
    }
}

impl From<WebError> for JsValue {
    fn from(value: WebError) -> Self {
        match value {
            WebError::Js(message) => Self::from(message),
            other => Self::from(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_keep_their_message() {
        let error = WebError::from(trellis_core::Error::Poisoned);
        assert_eq!(error.to_string(), trellis_core::Error::Poisoned.to_string());
        assert_eq!(
            WebError::RootNotFound("app".into()).to_string(),
            "failed to find DOM element with id `app`"
        );
    }
}
