//! todo-nlu - natural-language understanding for chat task commands
//!
//! Converts free-form chat text (mixed Japanese/English, informal date
//! expressions, embedded mentions and tags) into a structured
//! task-management command: intent classification, slot extraction,
//! relative date resolution, and confidence scoring. Transport,
//! persistence, and response formatting live with the caller.

pub mod classifier;
pub mod dates;
pub mod error;
pub mod extract;
pub mod indices;
pub mod parser;
pub mod types;

pub use classifier::*;
pub use dates::*;
pub use error::*;
pub use extract::*;
pub use indices::*;
pub use parser::*;
pub use types::*;
