//! Error types for the S-language emulator.

use thiserror::Error;

use crate::model::{Label, Variable};

/// Errors that can occur while validating, expanding, executing or debugging
/// a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmulatorError {
    /// A jump references a label that no instruction of the same sequence
    /// carries.
    #[error("Unknown label {label} referenced in {scope}")]
    UnknownLabel { label: Label, scope: String },

    /// An instruction reads a variable missing from the execution context.
    #[error("Unknown variable {0}")]
    UnknownVariable(Variable),

    /// The same label is attached to more than one instruction.
    #[error("Label {label} is defined more than once in {scope}")]
    DuplicateLabel { label: Label, scope: String },

    /// The requested expansion level is outside `[0, max]`.
    #[error("Invalid expansion level {requested}: expected a level in [0, {max}]")]
    InvalidExpandLevel { requested: i64, max: usize },

    /// An input value is negative.
    #[error("Invalid argument x{position}: {value} is negative")]
    InvalidArgument { position: usize, value: i64 },

    /// A function call references a callee absent from the function table.
    #[error("Function {0} not found")]
    FunctionNotFound(String),

    /// A function reaches itself through calls, so it cannot be inlined.
    #[error("Function {0} is recursive and cannot be fully expanded")]
    RecursiveFunction(String),

    /// A textual variable or label name could not be parsed.
    #[error("Bad name: {0}")]
    BadName(String),

    /// A debug operation was issued before the session was started.
    #[error("Debug session has not been started")]
    SessionNotStarted,

    /// `start` was issued on a running session.
    #[error("Debug session is already started")]
    SessionAlreadyStarted,

    /// A forward step was requested after the program terminated.
    #[error("Debug session has already finished")]
    SessionFinished,
}

/// Result type for the emulator.
pub type Result<T> = std::result::Result<T, EmulatorError>;
