//! Session registry: a fixed-capacity arena addressed by tagged handles.

use std::sync::Arc;

use serial::{Handle, SerialError};

use crate::session::Session;

/// One occupied slot: the session plus the driver's socket once the
/// connect call has returned it.
pub(crate) struct Entry<S> {
    pub(crate) session: Arc<Session>,
    pub(crate) socket: Option<S>,
}

struct Slot<S> {
    generation: u32,
    entry: Option<Entry<S>>,
}

/// Owning arena of sessions.
///
/// Handles carry the generation their slot had at allocation; releasing a
/// slot bumps the generation, so a stale handle fails lookup instead of
/// aliasing the slot's next occupant. Lookup is pure indexing — only
/// allocation scans.
pub(crate) struct SessionTable<S> {
    slots: Vec<Slot<S>>,
}

impl<S> SessionTable<S> {
    pub(crate) fn new(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                generation: 0,
                entry: None,
            })
            .collect();
        Self { slots }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Claim a free slot for a fresh session, or `None` when every slot is
    /// occupied.
    pub(crate) fn allocate(&mut self) -> Option<(Handle, Arc<Session>)> {
        let index = self.slots.iter().position(|slot| slot.entry.is_none())?;
        let session = Session::new();
        let slot = &mut self.slots[index];
        slot.entry = Some(Entry {
            session: Arc::clone(&session),
            socket: None,
        });
        Some((Handle::new(index as u32, slot.generation), session))
    }

    pub(crate) fn lookup(&self, handle: Handle) -> Result<&Entry<S>, SerialError> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(SerialError::InvalidHandle(handle))
    }

    pub(crate) fn lookup_mut(&mut self, handle: Handle) -> Result<&mut Entry<S>, SerialError> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.entry.as_mut())
            .ok_or(SerialError::InvalidHandle(handle))
    }

    /// Free the slot, returning its entry so the caller can release the
    /// driver socket. Already-free and stale handles are a no-op.
    pub(crate) fn release(&mut self, handle: Handle) -> Option<Entry<S>> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.generation != handle.generation() || slot.entry.is_none() {
            return None;
        }
        slot.generation += 1;
        slot.entry.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_stops_at_capacity_and_resumes_after_release() {
        let mut table: SessionTable<()> = SessionTable::new(2);
        let (first, _) = table.allocate().unwrap();
        let (_second, _) = table.allocate().unwrap();
        assert!(table.allocate().is_none());

        table.release(first);
        let (reused, _) = table.allocate().unwrap();
        assert_eq!(reused.index(), first.index());
        assert_ne!(reused.generation(), first.generation());
    }

    #[test]
    fn a_released_handle_is_rejected_even_after_slot_reuse() {
        let mut table: SessionTable<()> = SessionTable::new(1);
        let (stale, _) = table.allocate().unwrap();
        table.release(stale);
        let (_fresh, _) = table.allocate().unwrap();

        assert!(matches!(
            table.lookup(stale),
            Err(SerialError::InvalidHandle(h)) if h == stale
        ));
        // releasing through the stale handle must not evict the new session
        assert!(table.release(stale).is_none());
        assert!(table.allocate().is_none());
    }

    #[test]
    fn out_of_range_handles_are_rejected() {
        let table: SessionTable<()> = SessionTable::new(1);
        assert!(matches!(
            table.lookup(Handle::new(7, 0)),
            Err(SerialError::InvalidHandle(_))
        ));
    }

    #[test]
    fn release_is_idempotent() {
        let mut table: SessionTable<()> = SessionTable::new(1);
        let (handle, _) = table.allocate().unwrap();
        assert!(table.release(handle).is_some());
        assert!(table.release(handle).is_none());
    }
}
