// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font handle table

use log::warn;

/// Number of handle slots
pub const MAX_FONT_HANDLES: usize = 256;
/// Slot index encoded by the first handle
const FIRST_HANDLE: u32 = 1;

/// A realized-font handle
///
/// The low 16 bits hold the slot index (offset by one, so that no handle is
/// zero), the high 16 bits the slot generation. A handle with generation
/// zero is a *weak* handle which matches any generation of its slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontHandle(u32);

impl FontHandle {
    /// Reconstruct from a raw value
    pub fn from_raw(raw: u32) -> Self {
        FontHandle(raw)
    }

    /// Get the raw value
    pub fn get(self) -> u32 {
        self.0
    }

    /// The generation-less form of this handle
    pub fn weak(self) -> Self {
        FontHandle(self.0 & 0xffff)
    }

    fn slot(self) -> Option<usize> {
        let low = self.0 & 0xffff;
        low.checked_sub(FIRST_HANDLE).map(|i| i as usize)
    }

    fn generation(self) -> u16 {
        (self.0 >> 16) as u16
    }
}

enum SlotState<T> {
    Used(T),
    /// Next free slot
    Free(Option<usize>),
}

struct Slot<T> {
    generation: u16,
    state: SlotState<T>,
}

/// A fixed-capacity table mapping handles to values
pub struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<usize>,
    capacity: usize,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        HandleTable::with_capacity(MAX_FONT_HANDLES)
    }
}

impl<T> HandleTable<T> {
    /// Construct with `capacity` slots (at most 65535)
    pub fn with_capacity(capacity: usize) -> Self {
        HandleTable {
            slots: Vec::new(),
            free_head: None,
            capacity: capacity.min(0xffff),
        }
    }

    /// Number of values stored
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s.state, SlotState::Used(_)))
            .count()
    }

    /// Store `value`, returning its handle
    ///
    /// Fails (returning the value) when every slot is in use.
    pub fn alloc(&mut self, value: T) -> Result<FontHandle, T> {
        let index = if let Some(index) = self.free_head {
            self.free_head = match self.slots[index].state {
                SlotState::Free(next) => next,
                SlotState::Used(_) => None,
            };
            index
        } else if self.slots.len() < self.capacity {
            self.slots.push(Slot {
                generation: 0,
                state: SlotState::Free(None),
            });
            self.slots.len() - 1
        } else {
            warn!("out of font handles");
            return Err(value);
        };

        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        if slot.generation == 0xffff {
            slot.generation = 1;
        }
        slot.state = SlotState::Used(value);
        let low = index as u32 + FIRST_HANDLE;
        Ok(FontHandle(low | (u32::from(slot.generation) << 16)))
    }

    fn slot_index(&self, handle: FontHandle) -> Option<usize> {
        let index = handle.slot()?;
        let slot = self.slots.get(index)?;
        let generation = handle.generation();
        if generation != 0 && generation != slot.generation {
            return None;
        }
        match slot.state {
            SlotState::Used(_) => Some(index),
            SlotState::Free(_) => None,
        }
    }

    /// Resolve a handle
    pub fn get(&self, handle: FontHandle) -> Option<&T> {
        let index = self.slot_index(handle)?;
        match &self.slots[index].state {
            SlotState::Used(value) => Some(value),
            SlotState::Free(_) => None,
        }
    }

    /// Resolve a handle mutably
    pub fn get_mut(&mut self, handle: FontHandle) -> Option<&mut T> {
        let index = self.slot_index(handle)?;
        match &mut self.slots[index].state {
            SlotState::Used(value) => Some(value),
            SlotState::Free(_) => None,
        }
    }

    /// The full (generation-qualified) handle for a possibly weak one
    pub fn full_handle(&self, handle: FontHandle) -> Option<FontHandle> {
        let index = self.slot_index(handle)?;
        let low = index as u32 + FIRST_HANDLE;
        Some(FontHandle(
            low | (u32::from(self.slots[index].generation) << 16),
        ))
    }

    /// Free a slot, returning its value
    pub fn free(&mut self, handle: FontHandle) -> Option<T> {
        let index = self.slot_index(handle)?;
        let state = std::mem::replace(&mut self.slots[index].state, SlotState::Free(self.free_head));
        self.free_head = Some(index);
        match state {
            SlotState::Used(value) => Some(value),
            SlotState::Free(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_reject_stale_handles() {
        let mut table = HandleTable::default();
        let a = table.alloc("a").unwrap();
        assert_eq!(a.get(), 0x0001_0001);
        assert_eq!(table.get(a), Some(&"a"));
        assert_eq!(table.free(a), Some("a"));
        assert!(table.get(a).is_none());

        // the free slot is reused with a new generation
        let b = table.alloc("b").unwrap();
        assert_eq!(b.get(), 0x0002_0001);
        assert!(table.get(a).is_none());
        // a weak handle matches any generation
        assert_eq!(table.get(a.weak()), Some(&"b"));
        assert_eq!(table.full_handle(a.weak()), Some(b));
        assert!(table.get(FontHandle::from_raw(0)).is_none());
        assert!(table.get(FontHandle::from_raw(0x0001_0002)).is_none());
    }

    #[test]
    fn exhaustion() {
        let mut table = HandleTable::with_capacity(2);
        let a = table.alloc(1).unwrap();
        table.alloc(2).unwrap();
        assert_eq!(table.alloc(3), Err(3));
        table.free(a);
        let c = table.alloc(3).unwrap();
        assert_eq!(c.weak(), a.weak());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn generation_skips_sentinel() {
        let mut table = HandleTable::with_capacity(1);
        let mut handle = table.alloc(0).unwrap();
        for _ in 0..0xfffe {
            table.free(handle);
            handle = table.alloc(0).unwrap();
        }
        assert_eq!(handle.get() >> 16, 1);
    }
}
