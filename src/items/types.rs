use crate::common::constants::{CONTAINER_GRID_SLOT_ID, EQUIPMENT_SLOT_IDS, HIDEOUT_SLOT_ID};
use serde::{Deserialize, Serialize};

/// Grid position inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLocation {
    pub x: i32,
    pub y: i32,
    pub r: u8,
    #[serde(rename = "isSearched", default)]
    pub is_searched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Repairable {
    #[serde(rename = "Durability")]
    pub durability: f64,
    #[serde(rename = "MaxDurability")]
    pub max_durability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceShield {
    #[serde(rename = "Hits")]
    pub hits: u32,
}

/// Mutable per-instance item state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemUpd {
    /// Found-in-raid flag
    #[serde(rename = "SpawnedInSession", default)]
    pub spawned_in_session: Option<bool>,
    #[serde(rename = "StackObjectsCount", default)]
    pub stack_objects_count: Option<u32>,
    #[serde(rename = "Repairable", default)]
    pub repairable: Option<Repairable>,
    #[serde(rename = "FaceShield", default)]
    pub face_shield: Option<FaceShield>,
}

/// One node of an item forest. Parent links are ids, never references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_tpl")]
    pub tpl: String,
    #[serde(rename = "parentId", default)]
    pub parent_id: Option<String>,
    #[serde(rename = "slotId", default)]
    pub slot_id: Option<String>,
    #[serde(default)]
    pub location: Option<ItemLocation>,
    #[serde(default)]
    pub upd: Option<ItemUpd>,
}

impl Item {
    pub fn new(id: impl Into<String>, tpl: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tpl: tpl.into(),
            parent_id: None,
            slot_id: None,
            location: None,
            upd: None,
        }
    }

    /// Seat this item in `slot` of `parent`.
    pub fn with_parent(mut self, parent: impl Into<String>, slot: impl Into<String>) -> Self {
        self.parent_id = Some(parent.into());
        self.slot_id = Some(slot.into());
        self
    }

    pub fn with_location(mut self, location: ItemLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn slot(&self) -> Option<&str> {
        self.slot_id.as_deref()
    }

    /// True when seated directly in a named equipment slot.
    pub fn is_in_equipment_slot(&self) -> bool {
        self.slot().is_some_and(is_equipment_slot)
    }

    /// True when this item is an attachment currently mounted on a parent.
    ///
    /// Hideout roots, container grids, equipment slots and numeric (cartridge
    /// index) slots are not attachment positions. An item with no slot is not
    /// attached.
    pub fn is_attached_attachment(&self) -> bool {
        match self.slot() {
            None => false,
            Some(slot) => {
                slot != HIDEOUT_SLOT_ID
                    && slot != CONTAINER_GRID_SLOT_ID
                    && !is_equipment_slot(slot)
                    && slot.parse::<u32>().is_err()
            }
        }
    }

    pub fn ensure_upd(&mut self) -> &mut ItemUpd {
        self.upd.get_or_insert_with(ItemUpd::default)
    }
}

pub fn is_equipment_slot(slot: &str) -> bool {
    EQUIPMENT_SLOT_IDS.contains(&slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mod_slot_is_attached() {
        let scope = Item::new("scope", "tpl_scope").with_parent("rifle", "mod_scope");
        assert!(scope.is_attached_attachment());
    }

    #[test]
    fn test_equipment_and_grid_slots_are_not_attached() {
        let rifle = Item::new("rifle", "tpl").with_parent("root", "FirstPrimaryWeapon");
        let in_bag = Item::new("ammo", "tpl").with_parent("bag", "main");
        let stash = Item::new("box", "tpl").with_parent("root", "hideout");
        assert!(!rifle.is_attached_attachment());
        assert!(!in_bag.is_attached_attachment());
        assert!(!stash.is_attached_attachment());
        assert!(rifle.is_in_equipment_slot());
        assert!(!in_bag.is_in_equipment_slot());
    }

    #[test]
    fn test_numeric_slot_is_not_attached() {
        let cartridge = Item::new("round", "tpl").with_parent("mag", "0");
        assert!(!cartridge.is_attached_attachment());
    }

    #[test]
    fn test_item_without_slot_is_not_attached() {
        assert!(!Item::new("loose", "tpl").is_attached_attachment());
    }

    #[test]
    fn test_item_json_uses_host_field_names() {
        let json = r#"{
            "_id": "a1",
            "_tpl": "t1",
            "parentId": "root",
            "slotId": "Backpack",
            "upd": {
                "SpawnedInSession": true,
                "Repairable": { "Durability": 40.0, "MaxDurability": 80.0 }
            }
        }"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, "a1");
        assert_eq!(item.parent(), Some("root"));
        assert_eq!(item.slot(), Some("Backpack"));
        assert!(item.location.is_none());
        let upd = item.upd.unwrap();
        assert_eq!(upd.spawned_in_session, Some(true));
        assert_eq!(upd.repairable.map(|r| r.max_durability), Some(80.0));
    }

    #[test]
    fn test_ensure_upd_creates_once() {
        let mut item = Item::new("a", "t");
        item.ensure_upd().stack_objects_count = Some(3);
        item.ensure_upd();
        assert_eq!(item.upd.and_then(|u| u.stack_objects_count), Some(3));
    }
}
