use std::fmt;
use std::marker::PhantomData;

/// Deferred action owned by a slot while it is active.
pub type Callback = Box<dyn FnMut() + 'static>;

/// Runtime tag of a delay kind. Used for diagnostics, handles and config lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelayKindId {
    NextFrame,
    ForFrames,
    InSeconds,
    ForSeconds,
}

impl DelayKindId {
    pub const ALL: [DelayKindId; 4] = [
        DelayKindId::NextFrame,
        DelayKindId::ForFrames,
        DelayKindId::InSeconds,
        DelayKindId::ForSeconds,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DelayKindId::NextFrame => "RunInNextFrame",
            DelayKindId::ForFrames => "RunForFrames",
            DelayKindId::InSeconds => "RunInSeconds",
            DelayKindId::ForSeconds => "RunForSeconds",
        }
    }
}

impl fmt::Display for DelayKindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compile-time description of one delay kind.
///
/// A kind decides the countdown unit and whether the callback fires once at
/// expiry or on every tick up to and including the expiring one.
pub trait DelayKind: 'static {
    type Remaining: Copy + Default + PartialOrd + fmt::Debug;

    const ID: DelayKindId;

    /// `true`: invoke every tick, then count down.
    /// `false`: count down, invoke only on expiry.
    const REPEATS: bool;

    /// Apply one tick. Returns `true` once the countdown reached zero or below.
    fn count_down(remaining: &mut Self::Remaining, dt: f32) -> bool;
}

/// Fires once after N advances (default 1).
#[derive(Debug, Clone, Copy)]
pub struct NextFrame;

/// Fires on each of the next N advances.
#[derive(Debug, Clone, Copy)]
pub struct ForFrames;

/// Fires once when the accumulated `dt` reaches the duration.
#[derive(Debug, Clone, Copy)]
pub struct InSeconds;

/// Fires on every advance until the accumulated `dt` reaches the duration,
/// including the advance that crosses it.
#[derive(Debug, Clone, Copy)]
pub struct ForSeconds;

#[inline]
fn count_down_frames(frames: &mut i32) -> bool {
    *frames = frames.saturating_sub(1);
    *frames <= 0
}

#[inline]
fn count_down_seconds(seconds: &mut f32, dt: f32) -> bool {
    *seconds -= dt;
    *seconds <= 0.0
}

impl DelayKind for NextFrame {
    type Remaining = i32;
    const ID: DelayKindId = DelayKindId::NextFrame;
    const REPEATS: bool = false;

    #[inline]
    fn count_down(remaining: &mut i32, _dt: f32) -> bool {
        count_down_frames(remaining)
    }
}

impl DelayKind for ForFrames {
    type Remaining = i32;
    const ID: DelayKindId = DelayKindId::ForFrames;
    const REPEATS: bool = true;

    #[inline]
    fn count_down(remaining: &mut i32, _dt: f32) -> bool {
        count_down_frames(remaining)
    }
}

impl DelayKind for InSeconds {
    type Remaining = f32;
    const ID: DelayKindId = DelayKindId::InSeconds;
    const REPEATS: bool = false;

    #[inline]
    fn count_down(remaining: &mut f32, dt: f32) -> bool {
        count_down_seconds(remaining, dt)
    }
}

impl DelayKind for ForSeconds {
    type Remaining = f32;
    const ID: DelayKindId = DelayKindId::ForSeconds;
    const REPEATS: bool = true;

    #[inline]
    fn count_down(remaining: &mut f32, dt: f32) -> bool {
        count_down_seconds(remaining, dt)
    }
}

/// Callback taken out of a slot for the duration of its invocation.
///
/// The slot stays active while the callback runs, so the callback can never
/// be handed its own slot if it schedules another delay of the same kind.
pub(crate) struct Armed {
    generation: u32,
    callback: Option<Callback>,
}

impl Armed {
    #[inline]
    pub(crate) fn invoke(&mut self) {
        if let Some(cb) = self.callback.as_mut() {
            cb();
        }
    }
}

/// One reusable unit of delayed-callback state.
///
/// Lifecycle: `Free -> Active` on activation, `Active -> Free` on expiry or
/// on a forced reset. The callback is held only while active.
pub struct DelaySlot<K: DelayKind> {
    callback: Option<Callback>,
    remaining: K::Remaining,
    persist: bool,
    active: bool,

    /// Bumped on every activation; tells activations of the same slot apart.
    generation: u32,
    /// Advance pass during which the slot was activated.
    armed_pass: u64,

    _kind: PhantomData<fn() -> K>,
}

impl<K: DelayKind> Default for DelaySlot<K> {
    fn default() -> Self {
        Self {
            callback: None,
            remaining: K::Remaining::default(),
            persist: false,
            active: false,
            generation: 0,
            armed_pass: 0,
            _kind: PhantomData,
        }
    }
}

impl<K: DelayKind> fmt::Debug for DelaySlot<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelaySlot")
            .field("kind", &K::ID)
            .field("active", &self.active)
            .field("remaining", &self.remaining)
            .field("persist", &self.persist)
            .field("has_callback", &self.callback.is_some())
            .field("generation", &self.generation)
            .finish()
    }
}

impl<K: DelayKind> DelaySlot<K> {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn is_persistent(&self) -> bool {
        self.persist
    }

    #[inline]
    pub fn remaining(&self) -> K::Remaining {
        self.remaining
    }

    #[inline]
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Configure and activate a free slot. Returns the new generation.
    pub(crate) fn activate(
        &mut self,
        callback: Option<Callback>,
        remaining: K::Remaining,
        persist: bool,
        pass: u64,
    ) -> u32 {
        debug_assert!(!self.active, "activating a slot that is already active");

        self.generation = self.generation.wrapping_add(1);
        self.callback = callback;
        self.remaining = remaining;
        self.persist = persist;
        self.armed_pass = pass;
        self.active = true;
        self.generation
    }

    /// Every path out of the active state goes through here.
    ///
    /// The callback is handed back rather than dropped so the caller can drop
    /// it once no pool borrow is held; its captures may schedule new delays.
    #[inline]
    #[must_use = "the released callback should be dropped outside any pool borrow"]
    pub(crate) fn deactivate(&mut self) -> Option<Callback> {
        self.active = false;
        self.callback.take()
    }

    /// First half of a tick. Returns the callback to invoke, if this tick fires.
    ///
    /// Slots activated during `pass` are left for the next pass.
    pub(crate) fn begin_tick(&mut self, pass: u64, dt: f32) -> Option<Armed> {
        if !self.active || self.armed_pass == pass {
            return None;
        }

        if !K::REPEATS && !K::count_down(&mut self.remaining, dt) {
            return None;
        }

        Some(Armed {
            generation: self.generation,
            callback: self.callback.take(),
        })
    }

    /// Second half of a tick, after the armed callback has been invoked.
    ///
    /// If the slot was reset (and maybe re-acquired) while the callback ran,
    /// the slot is left alone. Returns the callback once it is spent.
    pub(crate) fn finish_tick(&mut self, armed: Armed, dt: f32) -> Option<Callback> {
        if !self.active || self.generation != armed.generation {
            return armed.callback;
        }

        if !K::REPEATS {
            let taken = self.deactivate();
            debug_assert!(taken.is_none());
            return armed.callback;
        }

        self.callback = armed.callback;
        if K::count_down(&mut self.remaining, dt) {
            self.deactivate()
        } else {
            None
        }
    }

    /// Full tick for callers that hold the slot exclusively.
    /// Returns `true` if the callback was invoked.
    pub(crate) fn tick(&mut self, pass: u64, dt: f32) -> bool {
        let Some(mut armed) = self.begin_tick(pass, dt) else {
            return false;
        };
        armed.invoke();
        drop(self.finish_tick(armed, dt));
        true
    }
}
