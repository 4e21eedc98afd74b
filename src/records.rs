//! Source text for each stored vector

use std::collections::BTreeMap;

use crate::error::{Result, VectorStoreError};
use crate::VectorId;

/// Maps a vector id to the text it was embedded from.
///
/// Records are append-only: `put` refuses to overwrite an existing id.
#[derive(Debug, Clone, Default)]
pub struct VectorRecordStore {
    texts: BTreeMap<VectorId, String>,
}

impl VectorRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the text for `id`.
    pub fn put(&mut self, id: VectorId, text: impl Into<String>) -> Result<()> {
        use std::collections::btree_map::Entry;

        match self.texts.entry(id) {
            Entry::Occupied(_) => Err(VectorStoreError::DuplicateId { id }),
            Entry::Vacant(slot) => {
                slot.insert(text.into());
                Ok(())
            }
        }
    }

    pub fn get(&self, id: VectorId) -> Option<&str> {
        self.texts.get(&id).map(String::as_str)
    }

    /// Remove a record. Only used to undo a failed insert.
    pub(crate) fn remove(&mut self, id: VectorId) -> Option<String> {
        self.texts.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Iterate over records in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (VectorId, &str)> {
        self.texts.iter().map(|(&id, text)| (id, text.as_str()))
    }
}
