use crate::items::Item;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// An item the player paid a trader to insure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuredItemRef {
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "tid")]
    pub trader_id: String,
}

impl InsuredItemRef {
    pub fn new(item_id: impl Into<String>, trader_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            trader_id: trader_id.into(),
        }
    }
}

/// Per-item state captured by the client when the raid ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceRecord {
    pub id: String,
    #[serde(rename = "usedInQuest", default)]
    pub used_in_quest: bool,
    #[serde(default)]
    pub durability: Option<f64>,
    #[serde(rename = "maxDurability", default)]
    pub max_durability: Option<f64>,
    #[serde(default)]
    pub hits: Option<u32>,
}

impl InsuranceRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            used_in_quest: false,
            durability: None,
            max_durability: None,
            hits: None,
        }
    }

    pub fn used_in_quest(mut self) -> Self {
        self.used_in_quest = true;
        self
    }
}

/// Everything the capture stage hands over once a raid is over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaidSnapshot {
    /// Map id the raid took place on
    pub location: String,
    pub player_died: bool,
    pub pre_raid_items: Vec<Item>,
    pub post_raid_items: Vec<Item>,
    #[serde(default)]
    pub insurance_records: Vec<InsuranceRecord>,
}

/// One insured item (or fused insert) that left the player during the raid.
#[derive(Debug, Clone, PartialEq)]
pub struct LostGear {
    pub item: Item,
    pub trader_id: String,
    /// Gone from the post-raid inventory, as opposed to lost with the body
    pub dropped: bool,
}

/// Side-table of raid-scoped drop status, keyed by item id.
///
/// `true` = left on the ground, `false` = lost with the player, absent =
/// unknown. Lives beside the package items so the item schema stays clean.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DropMarkers(HashMap<String, bool>);

impl DropMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, item_id: impl Into<String>, dropped: bool) {
        self.0.insert(item_id.into(), dropped);
    }

    pub fn status(&self, item_id: &str) -> Option<bool> {
        self.0.get(item_id).copied()
    }

    pub fn is_dropped(&self, item_id: &str) -> bool {
        self.status(item_id) == Some(true)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemData {
    pub location: String,
    /// Unix seconds
    pub raid_end_time: i64,
}

/// One trader's pending insurance return for one player and one raid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsurancePackage {
    pub id: Uuid,
    pub trader_id: String,
    pub session_id: String,
    pub items: Vec<Item>,
    #[serde(default)]
    pub dropped: DropMarkers,
    /// Unix seconds after which the package may be processed
    pub scheduled_time: i64,
    /// Seconds the returned mail keeps its attachments
    pub max_storage_time: i64,
    pub system_data: SystemData,
}

impl InsurancePackage {
    pub fn is_due(&self, now: i64) -> bool {
        self.scheduled_time <= now
    }

    pub fn is_dropped(&self, item_id: &str) -> bool {
        self.dropped.is_dropped(item_id)
    }

    /// Remove every item whose id is in `ids`. Returns how many were removed.
    pub fn remove_items(&mut self, ids: &HashSet<String>) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !ids.contains(&item.id));
        before - self.items.len()
    }

    /// Drop markers are raid-scoped and never leave the pending package.
    pub fn strip_drop_markers(&mut self) {
        self.dropped.clear();
    }
}
