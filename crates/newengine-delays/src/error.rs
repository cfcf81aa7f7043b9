use std::error::Error;
use std::fmt;

use crate::slot::DelayKindId;

/// Delay scheduling error.
///
/// None of these are fatal. The request that produced them is dropped and
/// the frame loop keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayError {
    /// Every slot of the requested kind is active.
    PoolExhausted { kind: DelayKindId, capacity: usize },

    /// No scheduler is installed on this thread.
    NotInstalled,
}

impl fmt::Display for DelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelayError::PoolExhausted { kind, capacity } => {
                write!(f, "can't schedule '{}': all {capacity} slots are in use", kind.as_str())
            }
            DelayError::NotInstalled => write!(f, "no delay scheduler installed"),
        }
    }
}

impl Error for DelayError {}

pub type DelayResult<T> = Result<T, DelayError>;
