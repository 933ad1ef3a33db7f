//! Well-known status labels.
//!
//! Status is free text on the wire; these are the labels the built-in
//! adapters and the engine emit.

pub const ACCEPTED: &str = "Accepted";
pub const WRONG_ANSWER: &str = "Wrong Answer";
pub const TIME_LIMIT_EXCEED: &str = "Time Limit Exceed";
pub const MEMORY_LIMIT_EXCEED: &str = "Memory Limit Exceed";
pub const OUTPUT_LIMIT_EXCEED: &str = "Output Limit Exceed";
pub const RUNTIME_ERROR: &str = "Runtime Error";
pub const COMPILE_ERROR: &str = "Compile Error";
pub const JUDGE_ERROR: &str = "Judge Error";

/// Engine progress labels.
pub const RUNNING: &str = "Running";
pub const QUEUED: &str = "Queued";
