use crate::insurance::{InsurancePackage, InsuredItemRef};
use crate::items::Item;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    /// Id of the equipment root every equipped item hangs off
    pub equipment: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileBonuses {
    /// Percent shaved off every insurance return wait (hideout bonus)
    pub insurance_return_time_percent: f64,
}

/// The slice of a player profile insurance reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub session_id: String,
    pub inventory: Inventory,
    #[serde(default)]
    pub insured_items: Vec<InsuredItemRef>,
    /// Pending insurance packages
    #[serde(default)]
    pub insurance: Vec<InsurancePackage>,
    #[serde(default)]
    pub bonuses: ProfileBonuses,
}

impl Profile {
    pub fn new(session_id: impl Into<String>, equipment_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            inventory: Inventory {
                equipment: equipment_id.into(),
                items: Vec::new(),
            },
            insured_items: Vec::new(),
            insurance: Vec::new(),
            bonuses: ProfileBonuses::default(),
        }
    }

    /// Parent id given to returned and adopted items.
    pub fn root_item_id(&self) -> &str {
        &self.inventory.equipment
    }

    pub fn insure(&mut self, item_id: impl Into<String>, trader_id: impl Into<String>) {
        self.insured_items
            .push(InsuredItemRef::new(item_id, trader_id));
    }

    pub fn is_insured(&self, item_id: &str) -> bool {
        self.insured_items.iter().any(|r| r.item_id == item_id)
    }
}
