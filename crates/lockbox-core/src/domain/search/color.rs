//! Display colors for search rows
//!
//! Colors are drawn at random the first time an entity is seen and then
//! stay fixed for the lifetime of the map, which lives as long as the
//! user's session. The map is never pruned.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Palette colors, as hex without the leading `#`
pub const PALETTE: [&str; 17] = [
    "2196F3", "03A9F4", "00BCD4", "009688", "4CAF50", "8BC34A", "CDDC39", "FFC107", "795548",
    "607D8B", "9E9E9E", "FF5722", "F44336", "E91E63", "9C27B0", "673AB7", "3F51B5",
];

/// Colors already handed out, keyed by entity id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountColorMap {
    colors: HashMap<i64, String>,
}

impl AccountColorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored hex value for the entity, if any
    pub fn get(&self, entity_id: i64) -> Option<&str> {
        self.colors.get(&entity_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Hands out session-stable colors
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorAssigner;

impl ColorAssigner {
    /// `#RRGGBB` color for the entity
    pub fn color_for(&self, map: &mut AccountColorMap, entity_id: i64) -> String {
        self.color_for_with_rng(map, entity_id, &mut rand::thread_rng())
    }

    /// Same as [`Self::color_for`] with a caller-supplied generator
    pub fn color_for_with_rng<R: Rng + ?Sized>(
        &self,
        map: &mut AccountColorMap,
        entity_id: i64,
        rng: &mut R,
    ) -> String {
        let hex = map.colors.entry(entity_id).or_insert_with(|| {
            PALETTE
                .choose(rng)
                .copied()
                .unwrap_or(PALETTE[0])
                .to_string()
        });
        format!("#{}", hex)
    }
}
