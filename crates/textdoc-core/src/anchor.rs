//! Stable positions that follow edits.
//!
//! Anchors live in a slab owned by the document. The line hosting an anchor
//! keeps a back-reference list of [`AnchorId`]s, so a line never keeps an
//! anchor alive and dropping a line does not require a sweep of the whole
//! document.

use crate::error::{DocumentError, Result};
use crate::line_index::LineId;

/// Handle to an anchor created by [`Document::create_anchor`](crate::Document::create_anchor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorId {
    index: u32,
    generation: u32,
}

/// Where an anchor goes when text is inserted exactly at its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorMovement {
    /// The anchor stays in front of the inserted text.
    #[default]
    BeforeInsertion,
    /// The anchor moves behind the inserted text.
    AfterInsertion,
}

/// Current state of a live anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextAnchor {
    /// Hosting line.
    pub line: LineId,
    /// Column within the hosting line.
    pub column: usize,
    /// Behavior for insertions at the anchor.
    pub movement: AnchorMovement,
}

impl TextAnchor {
    /// Where the anchor lands after `[offset, offset + removed)` was replaced by
    /// `inserted` characters, given its absolute `position` before the edit.
    ///
    /// `None` means the character range the anchor marks was removed.
    pub fn relocate(
        &self,
        position: usize,
        offset: usize,
        removed: usize,
        inserted: usize,
    ) -> Option<usize> {
        let end = offset + removed;
        if position < offset {
            Some(position)
        } else if position == offset {
            match self.movement {
                AnchorMovement::BeforeInsertion => Some(position),
                AnchorMovement::AfterInsertion => Some(position + inserted),
            }
        } else if position < end {
            None
        } else {
            Some(position - removed + inserted)
        }
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Free,
    Live(TextAnchor),
    Deleted,
}

#[derive(Debug, Clone)]
struct Entry {
    generation: u32,
    slot: Slot,
}

/// Slab of anchors keyed by [`AnchorId`].
#[derive(Debug, Clone, Default)]
pub struct AnchorSet {
    entries: Vec<Entry>,
    free: Vec<usize>,
    live: usize,
}

impl AnchorSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of anchors that still track a position.
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Register a new anchor.
    pub fn insert(&mut self, anchor: TextAnchor) -> AnchorId {
        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                let entry = &mut self.entries[index];
                entry.slot = Slot::Live(anchor);
                AnchorId {
                    index: index as u32,
                    generation: entry.generation,
                }
            }
            None => {
                self.entries.push(Entry {
                    generation: 0,
                    slot: Slot::Live(anchor),
                });
                AnchorId {
                    index: (self.entries.len() - 1) as u32,
                    generation: 0,
                }
            }
        }
    }

    /// Current state of `id`.
    pub fn get(&self, id: AnchorId) -> Result<&TextAnchor> {
        match &self.entry(id)?.slot {
            Slot::Live(anchor) => Ok(anchor),
            Slot::Deleted => Err(DocumentError::AnchorDeleted),
            Slot::Free => Err(DocumentError::UnknownAnchor),
        }
    }

    /// Whether the anchor's range was deleted. Unknown handles report an error.
    pub fn is_deleted(&self, id: AnchorId) -> Result<bool> {
        match &self.entry(id)?.slot {
            Slot::Live(_) => Ok(false),
            Slot::Deleted => Ok(true),
            Slot::Free => Err(DocumentError::UnknownAnchor),
        }
    }

    /// Move a live anchor to a new host.
    pub(crate) fn rehome(&mut self, id: AnchorId, line: LineId, column: usize) {
        if let Ok(index) = self.index_of(id)
            && let Slot::Live(anchor) = &mut self.entries[index].slot
        {
            anchor.line = line;
            anchor.column = column;
        }
    }

    /// Put a live anchor into the permanently deleted state.
    pub(crate) fn mark_deleted(&mut self, id: AnchorId) {
        if let Ok(index) = self.index_of(id)
            && matches!(self.entries[index].slot, Slot::Live(_))
        {
            self.entries[index].slot = Slot::Deleted;
            self.live -= 1;
        }
    }

    /// Mark every live anchor deleted (used when the whole text is replaced).
    pub(crate) fn delete_all(&mut self) {
        for entry in &mut self.entries {
            if matches!(entry.slot, Slot::Live(_)) {
                entry.slot = Slot::Deleted;
            }
        }
        self.live = 0;
    }

    /// Forget `id`. Returns the hosting line if the anchor was still live.
    pub fn release(&mut self, id: AnchorId) -> Result<Option<LineId>> {
        let index = self.index_of(id)?;
        let entry = &mut self.entries[index];
        let host = match std::mem::replace(&mut entry.slot, Slot::Free) {
            Slot::Live(anchor) => {
                self.live -= 1;
                Some(anchor.line)
            }
            Slot::Deleted => None,
            Slot::Free => return Err(DocumentError::UnknownAnchor),
        };
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(index);
        Ok(host)
    }

    fn entry(&self, id: AnchorId) -> Result<&Entry> {
        self.index_of(id).map(|index| &self.entries[index])
    }

    fn index_of(&self, id: AnchorId) -> Result<usize> {
        let index = id.index as usize;
        match self.entries.get(index) {
            Some(entry) if entry.generation == id.generation => Ok(index),
            _ => Err(DocumentError::UnknownAnchor),
        }
    }
}
