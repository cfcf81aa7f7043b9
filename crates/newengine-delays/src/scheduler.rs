use std::cell::{Cell, RefCell};
use std::fmt;
use std::time::Duration;

use log::{debug, error, trace, warn};

use crate::config::DelaysConfig;
use crate::error::DelayResult;
use crate::pool::{SlotHandle, SlotPool};
use crate::slot::{Callback, DelayKind, DelayKindId, ForFrames, ForSeconds, InSeconds, NextFrame};

/// What to wait for, and how long.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delay {
    /// Invoke once after `frames` advances. Values <= 1 fire on the first advance.
    NextFrame { frames: i32 },
    /// Invoke on each advance, `frames` times. Values <= 0 still invoke once.
    ForFrames { frames: i32 },
    /// Invoke once when accumulated `dt` reaches `seconds`.
    InSeconds { seconds: f32 },
    /// Invoke on every advance until accumulated `dt` reaches `seconds`, inclusive.
    ForSeconds { seconds: f32 },
}

impl Delay {
    #[inline]
    pub fn kind(&self) -> DelayKindId {
        match self {
            Delay::NextFrame { .. } => DelayKindId::NextFrame,
            Delay::ForFrames { .. } => DelayKindId::ForFrames,
            Delay::InSeconds { .. } => DelayKindId::InSeconds,
            Delay::ForSeconds { .. } => DelayKindId::ForSeconds,
        }
    }
}

struct Pools {
    next_frame: SlotPool<NextFrame>,
    for_frames: SlotPool<ForFrames>,
    in_seconds: SlotPool<InSeconds>,
    for_seconds: SlotPool<ForSeconds>,
}

impl Pools {
    fn new(cfg: &DelaysConfig) -> Self {
        Self {
            next_frame: SlotPool::with_capacity(cfg.next_frame_capacity),
            for_frames: SlotPool::with_capacity(cfg.for_frames_capacity),
            in_seconds: SlotPool::with_capacity(cfg.in_seconds_capacity),
            for_seconds: SlotPool::with_capacity(cfg.for_seconds_capacity),
        }
    }

    fn release_with(&mut self, spare_persistent: bool, sink: &mut impl FnMut(Callback)) -> usize {
        self.next_frame.release_with(spare_persistent, sink)
            + self.for_frames.release_with(spare_persistent, sink)
            + self.in_seconds.release_with(spare_persistent, sink)
            + self.for_seconds.release_with(spare_persistent, sink)
    }

    fn active_count(&self, kind: DelayKindId) -> usize {
        match kind {
            DelayKindId::NextFrame => self.next_frame.active_count(),
            DelayKindId::ForFrames => self.for_frames.active_count(),
            DelayKindId::InSeconds => self.in_seconds.active_count(),
            DelayKindId::ForSeconds => self.for_seconds.active_count(),
        }
    }

    fn capacity(&self, kind: DelayKindId) -> usize {
        match kind {
            DelayKindId::NextFrame => self.next_frame.capacity(),
            DelayKindId::ForFrames => self.for_frames.capacity(),
            DelayKindId::InSeconds => self.in_seconds.capacity(),
            DelayKindId::ForSeconds => self.for_seconds.capacity(),
        }
    }

    fn is_live(&self, handle: SlotHandle) -> bool {
        match handle.kind {
            DelayKindId::NextFrame => self.next_frame.is_live(handle),
            DelayKindId::ForFrames => self.for_frames.is_live(handle),
            DelayKindId::InSeconds => self.in_seconds.is_live(handle),
            DelayKindId::ForSeconds => self.for_seconds.is_live(handle),
        }
    }
}

/// Maps a kind to its pool inside `Pools`.
trait Pooled: DelayKind + Sized {
    fn pool(pools: &Pools) -> &SlotPool<Self>;
    fn pool_mut(pools: &mut Pools) -> &mut SlotPool<Self>;
}

macro_rules! pooled {
    ($kind:ty, $field:ident) => {
        impl Pooled for $kind {
            #[inline]
            fn pool(pools: &Pools) -> &SlotPool<Self> {
                &pools.$field
            }
            #[inline]
            fn pool_mut(pools: &mut Pools) -> &mut SlotPool<Self> {
                &mut pools.$field
            }
        }
    };
}

pooled!(NextFrame, next_frame);
pooled!(ForFrames, for_frames);
pooled!(InSeconds, in_seconds);
pooled!(ForSeconds, for_seconds);

/// Bounded, allocation-free dispatcher of delayed callbacks.
///
/// Owns one fixed-size pool per delay kind. The host calls [`advance`] once per
/// frame and [`on_context_changed`] whenever the surrounding scene/world is
/// replaced. Everything runs on the engine thread.
///
/// All methods take `&self`: no pool borrow is held while a callback runs, so a
/// callback that captures an `Rc<DelayScheduler>` may schedule new delays. Such
/// delays are not ticked until the next advance.
///
/// Callbacks are never dropped under a pool borrow either, so values they
/// capture may schedule delays from their `Drop`.
///
/// [`advance`]: DelayScheduler::advance
/// [`on_context_changed`]: DelayScheduler::on_context_changed
pub struct DelayScheduler {
    cfg: DelaysConfig,
    pools: RefCell<Pools>,
    pass: Cell<u64>,
    advancing: Cell<bool>,
    /// Reused buffer for callbacks released by a context change or shutdown.
    spent: Cell<Vec<Callback>>,
}

impl DelayScheduler {
    pub fn new(cfg: DelaysConfig) -> Self {
        let pools = RefCell::new(Pools::new(&cfg));
        let total = cfg.total_capacity();
        debug!("delay pools allocated: {total} slots");
        Self {
            cfg,
            pools,
            pass: Cell::new(0),
            advancing: Cell::new(false),
            spent: Cell::new(Vec::with_capacity(total)),
        }
    }

    #[inline]
    pub fn with_default_capacity() -> Self {
        Self::new(DelaysConfig::default())
    }

    #[inline]
    pub fn config(&self) -> &DelaysConfig {
        &self.cfg
    }

    /* ============================
       Scheduling
       ============================ */

    /// Schedule `callback` according to `delay`.
    ///
    /// A `None` callback is accepted and expires as a no-op.
    ///
    /// `persist = true` keeps the delay alive across [`on_context_changed`].
    /// Only set it when everything the callback captures outlives the current
    /// context; the scheduler cannot check this.
    ///
    /// On `PoolExhausted` the request is dropped and an error is logged.
    ///
    /// [`on_context_changed`]: DelayScheduler::on_context_changed
    pub fn schedule(
        &self,
        delay: Delay,
        callback: Option<Callback>,
        persist: bool,
    ) -> DelayResult<SlotHandle> {
        let res = match delay {
            Delay::NextFrame { frames } => self.acquire::<NextFrame>(callback, frames, persist),
            Delay::ForFrames { frames } => self.acquire::<ForFrames>(callback, frames, persist),
            Delay::InSeconds { seconds } => {
                self.acquire::<InSeconds>(callback, sanitize_seconds(seconds), persist)
            }
            Delay::ForSeconds { seconds } => {
                self.acquire::<ForSeconds>(callback, sanitize_seconds(seconds), persist)
            }
        };

        if let Err(e) = &res {
            error!("{e}");
        }
        res
    }

    /// Run once after `frames` advances.
    pub fn run_in_next_frame<F>(&self, f: F, frames: i32, persist: bool) -> DelayResult<SlotHandle>
    where
        F: FnMut() + 'static,
    {
        self.schedule(Delay::NextFrame { frames }, Some(Box::new(f)), persist)
    }

    /// Run once on the next advance.
    #[inline]
    pub fn next_frame<F>(&self, f: F) -> DelayResult<SlotHandle>
    where
        F: FnMut() + 'static,
    {
        self.run_in_next_frame(f, 1, false)
    }

    /// Run on each of the next `frames` advances.
    pub fn run_for_frames<F>(&self, f: F, frames: i32, persist: bool) -> DelayResult<SlotHandle>
    where
        F: FnMut() + 'static,
    {
        self.schedule(Delay::ForFrames { frames }, Some(Box::new(f)), persist)
    }

    /// Run once after `seconds` of accumulated frame time.
    pub fn run_in_seconds<F>(&self, f: F, seconds: f32, persist: bool) -> DelayResult<SlotHandle>
    where
        F: FnMut() + 'static,
    {
        self.schedule(Delay::InSeconds { seconds }, Some(Box::new(f)), persist)
    }

    /// Run on every advance for `seconds` of accumulated frame time.
    pub fn run_for_seconds<F>(&self, f: F, seconds: f32, persist: bool) -> DelayResult<SlotHandle>
    where
        F: FnMut() + 'static,
    {
        self.schedule(Delay::ForSeconds { seconds }, Some(Box::new(f)), persist)
    }

    fn acquire<K: Pooled>(
        &self,
        callback: Option<Callback>,
        remaining: K::Remaining,
        persist: bool,
    ) -> DelayResult<SlotHandle> {
        let pass = self.pass.get();
        let mut pools = self.pools.borrow_mut();
        K::pool_mut(&mut pools).acquire(callback, remaining, persist, pass)
    }

    /* ============================
       Host hooks
       ============================ */

    /// One frame tick. Frame kinds count this as exactly one frame regardless
    /// of `dt`; seconds kinds subtract `dt`.
    ///
    /// Returns the number of callbacks invoked.
    pub fn advance(&self, dt: f32) -> usize {
        if self.advancing.get() {
            error!("advance called from inside a delay callback; ignored");
            return 0;
        }

        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            warn!("invalid frame dt {dt}; treated as 0");
            0.0
        };

        let pass = self.pass.get().wrapping_add(1);
        self.pass.set(pass);
        self.advancing.set(true);

        let fired = self.sweep::<NextFrame>(pass, dt)
            + self.sweep::<ForFrames>(pass, dt)
            + self.sweep::<InSeconds>(pass, dt)
            + self.sweep::<ForSeconds>(pass, dt);

        self.advancing.set(false);

        if fired > 0 {
            trace!("pass {pass}: {fired} delay callbacks fired");
        }
        fired
    }

    #[inline]
    pub fn advance_duration(&self, dt: Duration) -> usize {
        self.advance(dt.as_secs_f32())
    }

    fn sweep<K: Pooled>(&self, pass: u64, dt: f32) -> usize {
        let capacity = K::pool(&self.pools.borrow()).capacity();
        let mut fired = 0;

        for index in 0..capacity {
            let armed = K::pool_mut(&mut self.pools.borrow_mut()).begin_tick(index, pass, dt);
            let Some(mut armed) = armed else {
                continue;
            };

            armed.invoke();
            fired += 1;

            let spent = K::pool_mut(&mut self.pools.borrow_mut()).finish_tick(index, armed, dt);
            drop(spent);
        }

        fired
    }

    /// The ambient context was torn down. Every non-persistent delay is
    /// dropped without running. Returns how many were dropped.
    pub fn on_context_changed(&self) -> usize {
        let dropped = self.release(true);
        debug!("context changed: {dropped} pending delays dropped");
        dropped
    }

    /// Drop every pending delay, persistent ones included.
    pub fn shutdown(&self) -> usize {
        let dropped = self.release(false);
        if dropped > 0 {
            debug!("delay scheduler shutdown: {dropped} pending delays dropped");
        }
        dropped
    }

    /// Deactivates slots under the pool borrow, then drops their callbacks
    /// after it is released. Delays scheduled from those destructors survive.
    fn release(&self, spare_persistent: bool) -> usize {
        let mut spent = self.spent.take();
        let freed = self
            .pools
            .borrow_mut()
            .release_with(spare_persistent, &mut |cb| spent.push(cb));

        spent.clear();
        self.spent.set(spent);
        freed
    }

    /* ============================
       Introspection
       ============================ */

    #[inline]
    pub fn active_count(&self, kind: DelayKindId) -> usize {
        self.pools.borrow().active_count(kind)
    }

    pub fn total_active(&self) -> usize {
        let pools = self.pools.borrow();
        DelayKindId::ALL.iter().map(|&k| pools.active_count(k)).sum()
    }

    #[inline]
    pub fn capacity(&self, kind: DelayKindId) -> usize {
        self.pools.borrow().capacity(kind)
    }

    /// `false` once the activation behind `handle` expired or was reset.
    #[inline]
    pub fn is_scheduled(&self, handle: SlotHandle) -> bool {
        self.pools.borrow().is_live(handle)
    }

    /// Number of completed (or in-progress) advance passes.
    #[inline]
    pub fn passes(&self) -> u64 {
        self.pass.get()
    }
}

impl Default for DelayScheduler {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl fmt::Debug for DelayScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("DelayScheduler");
        d.field("passes", &self.pass.get());
        if let Ok(pools) = self.pools.try_borrow() {
            for kind in DelayKindId::ALL {
                d.field(kind.as_str(), &(pools.active_count(kind), pools.capacity(kind)));
            }
        }
        d.finish()
    }
}

fn sanitize_seconds(seconds: f32) -> f32 {
    if seconds.is_nan() {
        warn!("NaN delay duration; treated as 0");
        0.0
    } else {
        seconds
    }
}
