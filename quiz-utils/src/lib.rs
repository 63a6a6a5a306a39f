//! Quiz Utility Functions
//!
//! ## Current API
//!
//! - Validate a quiz attempt against its questions
//! - Find incorrectly answered questions
//! - Build explanation, feedback and connection-test prompts
//!
pub mod attempt;
pub mod error;
pub mod prompt;
