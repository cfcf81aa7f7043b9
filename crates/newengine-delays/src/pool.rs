use crate::error::{DelayError, DelayResult};
use crate::slot::{Armed, Callback, DelayKind, DelayKindId, DelaySlot};

/// Identifies one activation of one slot.
///
/// A handle goes stale as soon as the slot deactivates; re-activations of the
/// same slot carry a different generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle {
    pub kind: DelayKindId,
    pub index: usize,
    pub generation: u32,
}

/// Fixed-capacity pool of slots of one kind.
///
/// A slot is free iff it is inactive; there is no separate free list.
/// Acquisition is a linear scan for the first free slot.
pub struct SlotPool<K: DelayKind> {
    slots: Box<[DelaySlot<K>]>,
}

impl<K: DelayKind> SlotPool<K> {
    pub fn with_capacity(capacity: usize) -> Self {
        let slots: Vec<DelaySlot<K>> = (0..capacity).map(|_| DelaySlot::default()).collect();
        Self { slots: slots.into_boxed_slice() }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_active()).count()
    }

    #[inline]
    pub fn slot(&self, index: usize) -> Option<&DelaySlot<K>> {
        self.slots.get(index)
    }

    #[inline]
    pub fn is_active(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(DelaySlot::is_active)
    }

    /// True while the activation named by `handle` has not yet deactivated.
    pub fn is_live(&self, handle: SlotHandle) -> bool {
        handle.kind == K::ID
            && self
                .slots
                .get(handle.index)
                .is_some_and(|s| s.is_active() && s.generation() == handle.generation)
    }

    /// Activate the first free slot.
    ///
    /// `pass` is the advance pass in progress (or the last finished one);
    /// the slot is not ticked until the next pass.
    pub fn acquire(
        &mut self,
        callback: Option<Callback>,
        remaining: K::Remaining,
        persist: bool,
        pass: u64,
    ) -> DelayResult<SlotHandle> {
        let Some(index) = self.slots.iter().position(|s| !s.is_active()) else {
            return Err(DelayError::PoolExhausted {
                kind: K::ID,
                capacity: self.capacity(),
            });
        };

        let generation = self.slots[index].activate(callback, remaining, persist, pass);
        Ok(SlotHandle { kind: K::ID, index, generation })
    }

    /// Deactivate every active slot that is not marked persistent.
    /// Callbacks are dropped, never invoked. Returns how many slots were freed.
    pub fn reset_non_persistent(&mut self) -> usize {
        self.release_with(true, &mut drop)
    }

    /// Deactivate every active slot, persistent ones included.
    pub fn clear(&mut self) -> usize {
        self.release_with(false, &mut drop)
    }

    /// Deactivate active slots (sparing persistent ones if asked) and pass
    /// each released callback to `sink` instead of dropping it in place.
    pub(crate) fn release_with(
        &mut self,
        spare_persistent: bool,
        sink: &mut impl FnMut(Callback),
    ) -> usize {
        let mut freed = 0;
        for slot in self.slots.iter_mut().filter(|s| s.is_active()) {
            if spare_persistent && slot.is_persistent() {
                continue;
            }
            if let Some(cb) = slot.deactivate() {
                sink(cb);
            }
            freed += 1;
        }
        freed
    }

    /// Tick every active slot once. Returns the number of callbacks invoked.
    pub fn advance_all(&mut self, pass: u64, dt: f32) -> usize {
        self.slots
            .iter_mut()
            .map(|s| s.tick(pass, dt))
            .filter(|&fired| fired)
            .count()
    }

    #[inline]
    pub(crate) fn begin_tick(&mut self, index: usize, pass: u64, dt: f32) -> Option<Armed> {
        self.slots.get_mut(index)?.begin_tick(pass, dt)
    }

    /// Returns the spent callback, if any, for the caller to drop.
    #[inline]
    pub(crate) fn finish_tick(&mut self, index: usize, armed: Armed, dt: f32) -> Option<Callback> {
        self.slots.get_mut(index)?.finish_tick(armed, dt)
    }
}
