//! Errors returned by the parser's public APIs.
//!
//! Malformed markup is never an error: every tree construction state has a
//! recovery action. These errors describe misuse of the incremental API.

use crate::input::InputCheckpoint;
use thiserror::Error;

/// An error that occurs when the input stream is rewound to a checkpoint
/// that can't be restored anymore.
#[derive(Error, Debug, Eq, PartialEq, Copy, Clone)]
pub enum CheckpointError {
    /// The checkpoint was released by `invalidate_checkpoints_before`.
    #[error("Checkpoint {checkpoint} has been invalidated (first valid checkpoint is {first_valid}).")]
    Invalidated {
        checkpoint: InputCheckpoint,
        first_valid: InputCheckpoint,
    },

    /// The checkpoint was never created.
    #[error("Unknown checkpoint {checkpoint}.")]
    Unknown { checkpoint: InputCheckpoint },

    /// The input was asked to rewind to the last resumption point before
    /// the background parser ever resumed.
    #[error("The background parser hasn't resumed yet.")]
    NotResumed,
}

/// An error that occurs when the document parser is driven incorrectly.
#[derive(Error, Debug, Eq, PartialEq, Copy, Clone)]
pub enum ParserError {
    /// The parser has been stopped and can't accept more input.
    #[error("The parser has been stopped.")]
    Stopped,

    /// Input was written after the end of the document was signaled.
    #[error("Input can't be written after the end of the document.")]
    AlreadyFinished,

    /// The background parsing thread went away unexpectedly.
    #[error("The background parser thread has disconnected.")]
    WorkerDisconnected,

    /// The speculative input couldn't be rewound.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}
