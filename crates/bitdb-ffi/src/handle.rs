//! Slot+generation handle table for objects owned across the C boundary.
//!
//! Destroyed handles carry a stale generation and resolve to `None`, so
//! use-after-destroy and double-destroy are checked failures rather than
//! UB. Generations start at 1, which keeps `0` free as a null handle.

/// Handle encoding: upper 32 bits = slot index, lower 32 bits = generation.
fn encode(slot: u32, generation: u32) -> u64 {
    ((slot as u64) << 32) | (generation as u64)
}

fn decode(handle: u64) -> (u32, u32) {
    ((handle >> 32) as u32, handle as u32)
}

const FIRST_GENERATION: u32 = 1;

struct Slot<T> {
    generation: u32,
    data: Option<T>,
}

/// Maps `u64` handles to owned values.
pub(crate) struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
}

impl<T> HandleTable<T> {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Take ownership of `value` and return its handle.
    pub fn insert(&mut self, value: T) -> u64 {
        if let Some(slot_idx) = self.free_list.pop() {
            let slot = &mut self.slots[slot_idx as usize];
            slot.data = Some(value);
            encode(slot_idx, slot.generation)
        } else {
            let slot_idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: FIRST_GENERATION,
                data: Some(value),
            });
            encode(slot_idx, FIRST_GENERATION)
        }
    }

    fn slot(&self, handle: u64) -> Option<&Slot<T>> {
        let (slot_idx, generation) = decode(handle);
        let slot = self.slots.get(slot_idx as usize)?;
        (slot.generation == generation).then_some(slot)
    }

    fn slot_mut(&mut self, handle: u64) -> Option<&mut Slot<T>> {
        let (slot_idx, generation) = decode(handle);
        let slot = self.slots.get_mut(slot_idx as usize)?;
        (slot.generation == generation).then_some(slot)
    }

    pub fn get(&self, handle: u64) -> Option<&T> {
        self.slot(handle)?.data.as_ref()
    }

    pub fn get_mut(&mut self, handle: u64) -> Option<&mut T> {
        self.slot_mut(handle)?.data.as_mut()
    }

    /// Remove and return the value behind `handle`. Stale handles return
    /// `None`.
    ///
    /// A slot whose generation would wrap to 0 is retired for good, so a
    /// handle from its first epoch can never resolve again.
    pub fn remove(&mut self, handle: u64) -> Option<T> {
        let slot = self.slot_mut(handle)?;
        let value = slot.data.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        if slot.generation != 0 {
            self.free_list.push(decode(handle).0);
        }
        Some(value)
    }

    /// Number of live values.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.data.is_some()).count()
    }
}
