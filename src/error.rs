//! Internal fault type for extraction steps

use thiserror::Error;

/// Fault raised inside an extraction step
///
/// Never escapes the crate: the parse front door converts any `NluError`
/// into a `parse_error` result record.
#[derive(Debug, Error)]
pub enum NluError {
    #[error("pattern produced no usable capture: {0}")]
    BadCapture(&'static str),
}
