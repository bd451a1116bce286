/*!
 * Entry storage for the combiner.
 *
 * Entries live in slots addressed by stable handles. The temporal order is a
 * separate list of handles, so removing an absorbed entry never moves the
 * storage of the others.
 */

use crate::subtitle_processor::SubtitleEntry;

/// Stable reference to an entry slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryHandle(usize);

#[derive(Debug, Clone, Default)]
pub struct EntryArena {
    slots: Vec<Option<SubtitleEntry>>,
    order: Vec<EntryHandle>,
}

impl EntryArena {
    pub fn from_entries(entries: Vec<SubtitleEntry>) -> Self {
        let order = (0..entries.len()).map(EntryHandle).collect();
        let slots = entries.into_iter().map(Some).collect();
        EntryArena { slots, order }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Handles in temporal order
    pub fn handles(&self) -> &[EntryHandle] {
        &self.order
    }

    pub fn get(&self, handle: EntryHandle) -> Option<&SubtitleEntry> {
        self.slots.get(handle.0).and_then(Option::as_ref)
    }

    /// Merge `absorbed` into `survivor`, which must directly precede it.
    ///
    /// The absorbed entry is removed from the order and its slot emptied.
    /// Returns `false`, leaving the arena untouched, when the two handles are
    /// not live neighbors in that order.
    pub fn merge_pair(&mut self, survivor: EntryHandle, absorbed: EntryHandle) -> bool {
        let Some(position) = self.order.iter().position(|&h| h == survivor) else {
            return false;
        };
        if self.order.get(position + 1) != Some(&absorbed) || self.get(survivor).is_none() {
            return false;
        }
        let Some(absorbed_entry) = self.slots.get_mut(absorbed.0).and_then(Option::take) else {
            return false;
        };

        if let Some(entry) = self.slots[survivor.0].as_mut() {
            entry.absorb(absorbed_entry);
        }
        self.order.remove(position + 1);
        true
    }

    /// Live entries in temporal order, consuming the arena
    pub fn into_entries(mut self) -> Vec<SubtitleEntry> {
        self.order
            .iter()
            .filter_map(|h| self.slots.get_mut(h.0).and_then(Option::take))
            .collect()
    }
}
