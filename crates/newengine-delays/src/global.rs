//! Thread-local "current scheduler" for call sites that have no handle.
//!
//! The host installs its scheduler once at startup and may re-install a fresh
//! one if it tears down and rebuilds its persistent objects. The free functions
//! here forward to whichever instance is installed on the calling thread.

use std::cell::RefCell;
use std::rc::Rc;

use log::error;

use crate::error::{DelayError, DelayResult};
use crate::pool::SlotHandle;
use crate::scheduler::DelayScheduler;

thread_local! {
    static CURRENT: RefCell<Option<Rc<DelayScheduler>>> = const { RefCell::new(None) };
}

/// Bind `scheduler` as the current instance. Returns the previous one, if any.
pub fn install(scheduler: Rc<DelayScheduler>) -> Option<Rc<DelayScheduler>> {
    CURRENT.with(|c| c.borrow_mut().replace(scheduler))
}

/// Unbind the current instance.
pub fn uninstall() -> Option<Rc<DelayScheduler>> {
    CURRENT.with(|c| c.borrow_mut().take())
}

#[inline]
pub fn current() -> Option<Rc<DelayScheduler>> {
    CURRENT.with(|c| c.borrow().clone())
}

#[inline]
pub fn is_installed() -> bool {
    CURRENT.with(|c| c.borrow().is_some())
}

fn with_current<R>(f: impl FnOnce(&DelayScheduler) -> DelayResult<R>) -> DelayResult<R> {
    // Clone out of the cell first: callbacks run by `f` may re-enter.
    let Some(sched) = current() else {
        error!("{}", DelayError::NotInstalled);
        return Err(DelayError::NotInstalled);
    };
    f(&sched)
}

/// See [`DelayScheduler::run_in_next_frame`].
pub fn run_in_next_frame<F>(f: F, frames: i32, persist: bool) -> DelayResult<SlotHandle>
where
    F: FnMut() + 'static,
{
    with_current(|s| s.run_in_next_frame(f, frames, persist))
}

/// See [`DelayScheduler::run_for_frames`].
pub fn run_for_frames<F>(f: F, frames: i32, persist: bool) -> DelayResult<SlotHandle>
where
    F: FnMut() + 'static,
{
    with_current(|s| s.run_for_frames(f, frames, persist))
}

/// See [`DelayScheduler::run_in_seconds`].
pub fn run_in_seconds<F>(f: F, seconds: f32, persist: bool) -> DelayResult<SlotHandle>
where
    F: FnMut() + 'static,
{
    with_current(|s| s.run_in_seconds(f, seconds, persist))
}

/// See [`DelayScheduler::run_for_seconds`].
pub fn run_for_seconds<F>(f: F, seconds: f32, persist: bool) -> DelayResult<SlotHandle>
where
    F: FnMut() + 'static,
{
    with_current(|s| s.run_for_seconds(f, seconds, persist))
}
