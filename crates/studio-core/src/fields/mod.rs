//! Field accumulator: block → tunable → latest value.
//!
//! Repeated edits to the same tunable collapse to the last value written.
//! Entries survive until a flush is acknowledged by the gateway.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tunables of a single block, ordered by name.
pub type BlockFields = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap {
    blocks: BTreeMap<String, BlockFields>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the latest value for `(block, tunable)`.
    pub fn set(
        &mut self,
        block: impl Into<String>,
        tunable: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.blocks
            .entry(block.into())
            .or_default()
            .insert(tunable.into(), value.into());
    }

    pub fn get(&self, block: &str, tunable: &str) -> Option<&str> {
        self.blocks
            .get(block)
            .and_then(|fields| fields.get(tunable))
            .map(String::as_str)
    }

    /// Iterates blocks in name order.
    pub fn blocks(&self) -> impl Iterator<Item = (&str, &BlockFields)> {
        self.blocks.iter().map(|(name, fields)| (name.as_str(), fields))
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of tunables across all blocks.
    pub fn len(&self) -> usize {
        self.blocks.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Removes entries that were flushed in `snapshot`.
    ///
    /// A tunable overwritten after the snapshot was taken keeps its newer
    /// value so it goes out with the next flush.
    pub fn remove_flushed(&mut self, snapshot: &FieldMap) {
        for (block, flushed) in &snapshot.blocks {
            let Some(current) = self.blocks.get_mut(block) else {
                continue;
            };
            current.retain(|tunable, value| flushed.get(tunable) != Some(value));
            if current.is_empty() {
                self.blocks.remove(block);
            }
        }
    }
}
