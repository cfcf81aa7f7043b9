use serde::{Deserialize, Serialize};

use crate::slot::DelayKindId;

/// Slot capacity per delay kind.
///
/// Pools are allocated once from these values and never grow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelaysConfig {
    #[serde(default = "default_capacity")]
    pub next_frame_capacity: usize,
    #[serde(default = "default_capacity")]
    pub for_frames_capacity: usize,
    #[serde(default = "default_capacity")]
    pub in_seconds_capacity: usize,
    #[serde(default = "default_capacity")]
    pub for_seconds_capacity: usize,
}

pub const DEFAULT_CAPACITY: usize = 50;

fn default_capacity() -> usize { DEFAULT_CAPACITY }

impl Default for DelaysConfig {
    fn default() -> Self {
        Self::uniform(DEFAULT_CAPACITY)
    }
}

impl DelaysConfig {
    /// Same capacity for all four kinds.
    #[inline]
    pub fn uniform(capacity: usize) -> Self {
        Self {
            next_frame_capacity: capacity,
            for_frames_capacity: capacity,
            in_seconds_capacity: capacity,
            for_seconds_capacity: capacity,
        }
    }

    #[inline]
    pub fn capacity(&self, kind: DelayKindId) -> usize {
        match kind {
            DelayKindId::NextFrame => self.next_frame_capacity,
            DelayKindId::ForFrames => self.for_frames_capacity,
            DelayKindId::InSeconds => self.in_seconds_capacity,
            DelayKindId::ForSeconds => self.for_seconds_capacity,
        }
    }

    #[inline]
    pub fn total_capacity(&self) -> usize {
        DelayKindId::ALL.iter().map(|&k| self.capacity(k)).sum()
    }
}
