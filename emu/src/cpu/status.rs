use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Externally visible run state of an [`Interpreter`](super::interpreter::Interpreter).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Ready to execute the next instruction.
    #[default]
    Ready,

    /// The program returned from its outermost frame.
    Return,

    /// The program executed a halt instruction.
    Halt,

    /// A breakpoint instruction was executed. The interpreter is ready to
    /// continue right after it.
    Break,

    /// The program asked the embedder for a service. Execution continues
    /// after [`resume`](super::interpreter::Interpreter::resume).
    Callout,

    /// Execution stopped; see [`ErrorKind`].
    Error,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ready => "ready",
            Self::Return => "return",
            Self::Halt => "halt",
            Self::Break => "break",
            Self::Callout => "callout",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Why the interpreter is in [`Status::Error`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ErrorKind {
    #[default]
    #[error("no error")]
    None,

    #[error("unallocated instruction")]
    UnallocatedInstruction,

    #[error("stack overflow")]
    StackOverflow,

    #[error("client error")]
    ClientError,

    #[error("instruction not yet implemented")]
    NotYetImplemented,

    #[error("memory exception")]
    MemoryException,
}

/// Outcome of one instruction executor.
pub type ExecResult = Result<Status, ErrorKind>;
