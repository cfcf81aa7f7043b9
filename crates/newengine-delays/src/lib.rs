//! Frame-driven delayed callbacks over fixed-capacity slot pools.
//!
//! Four delay kinds are supported: run in N frames, run for N frames,
//! run in N seconds, run for N seconds. Each kind has its own pool sized at
//! construction; when a pool is full the request is dropped with an error
//! log instead of allocating.

pub mod config;
pub mod error;
pub mod global;
pub mod pool;
pub mod scheduler;
pub mod slot;

pub use config::DelaysConfig;
pub use error::{DelayError, DelayResult};
pub use pool::{SlotHandle, SlotPool};
pub use scheduler::{Delay, DelayScheduler};
pub use slot::{
    Callback, DelayKind, DelayKindId, DelaySlot, ForFrames, ForSeconds, InSeconds, NextFrame,
};
