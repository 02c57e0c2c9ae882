use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("Unknown parameter type '{0}'")]
    UnknownType(String),

    #[error("Invalid declaration '{0}'")]
    InvalidDeclaration(String),

    #[error("Wrong number of arguments: expected {expected}, got {got}")]
    ArgumentCount { expected: usize, got: usize },

    #[error("Argument {index} does not match parameter type {expected}")]
    TypeMismatch { index: usize, expected: String },

    #[error("Data too short: need {need} bytes, have {have}")]
    DataTooShort { need: usize, have: usize },

    #[error("Invalid offset {0} in encoded data")]
    InvalidOffset(usize),

    #[error("Value out of range for {0}")]
    OutOfRange(String),

    #[error("Encoded string is not valid UTF-8")]
    InvalidUtf8,

    #[error("No function named '{0}'")]
    UnknownFunction(String),

    #[error("No event named '{0}'")]
    UnknownEvent(String),

    #[error("No function with selector 0x{}", hex::encode(.0))]
    UnknownSelector([u8; 4]),

    #[error("Log does not match event {0}")]
    LogMismatch(String),
}
