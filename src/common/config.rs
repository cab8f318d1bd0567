//! Read-only insurance policy: trader odds, slot rules and return timing.
//!
//! Every table loads from its own JSON file. Missing or unreadable files fall
//! back to the defaults below so a bare install still resolves insurance.

use super::constants::{DEFAULT_MAX_STORAGE_HOURS, PRAPOR_ID, THERAPIST_ID};
use crate::utils::persistence::load_json_file_or_default;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const INSURANCE_CONFIG_FILE: &str = "insurance.json";
pub const LOST_ON_DEATH_CONFIG_FILE: &str = "lost_on_death.json";
pub const TRADERS_CONFIG_FILE: &str = "traders.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsuranceConfig {
    /// Trader id -> chance (0-100) that an insured item comes back
    pub return_chance_percent: HashMap<String, f64>,
    /// Slots that are never part of an insurance return
    pub blacklisted_equipment: Vec<String>,
    /// When > 0, every package is due this many seconds after the raid
    pub return_time_override_seconds: i64,
    /// Map ids where insurance never returns anything
    pub disabled_locations: Vec<String>,
}

impl Default for InsuranceConfig {
    fn default() -> Self {
        Self {
            return_chance_percent: HashMap::from([
                (PRAPOR_ID.to_string(), 85.0),
                (THERAPIST_ID.to_string(), 95.0),
            ]),
            blacklisted_equipment: vec![
                "SpecialSlot1".to_string(),
                "SpecialSlot2".to_string(),
                "SpecialSlot3".to_string(),
            ],
            return_time_override_seconds: 0,
            disabled_locations: vec!["laboratory".to_string()],
        }
    }
}

/// Which equipment slots forfeit their contents when the player dies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LostOnDeathConfig {
    pub equipment: HashMap<String, bool>,
}

impl Default for LostOnDeathConfig {
    fn default() -> Self {
        let lost = [
            "ArmBand",
            "Headwear",
            "Earpiece",
            "FaceCover",
            "ArmorVest",
            "Eyewear",
            "TacticalVest",
            "PocketItems",
            "Backpack",
            "Holster",
            "FirstPrimaryWeapon",
            "SecondPrimaryWeapon",
        ];
        let kept = [
            "Scabbard",
            "Compass",
            "SecuredContainer",
            "SpecialSlot1",
            "SpecialSlot2",
            "SpecialSlot3",
        ];

        let equipment = lost
            .iter()
            .map(|slot| (slot.to_string(), true))
            .chain(kept.iter().map(|slot| (slot.to_string(), false)))
            .collect();

        Self { equipment }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraderInfo {
    pub name: String,
    pub min_return_hours: i64,
    pub max_return_hours: i64,
    #[serde(default = "default_max_storage_hours")]
    pub max_storage_hours: i64,
}

fn default_max_storage_hours() -> i64 {
    DEFAULT_MAX_STORAGE_HOURS
}

fn default_traders() -> HashMap<String, TraderInfo> {
    HashMap::from([
        (
            PRAPOR_ID.to_string(),
            TraderInfo {
                name: "Prapor".to_string(),
                min_return_hours: 24,
                max_return_hours: 36,
                max_storage_hours: DEFAULT_MAX_STORAGE_HOURS,
            },
        ),
        (
            THERAPIST_ID.to_string(),
            TraderInfo {
                name: "Therapist".to_string(),
                min_return_hours: 12,
                max_return_hours: 24,
                max_storage_hours: DEFAULT_MAX_STORAGE_HOURS,
            },
        ),
    ])
}

/// Everything the insurance stages read from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetentionPolicy {
    pub insurance: InsuranceConfig,
    pub lost_on_death: LostOnDeathConfig,
    pub traders: HashMap<String, TraderInfo>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            insurance: InsuranceConfig::default(),
            lost_on_death: LostOnDeathConfig::default(),
            traders: default_traders(),
        }
    }
}

impl RetentionPolicy {
    /// Load each table from `dir`, using defaults for any that are missing.
    pub fn load_from_dir(dir: &Path) -> Self {
        let traders: HashMap<String, TraderInfo> =
            load_json_file_or_default(&dir.join(TRADERS_CONFIG_FILE));
        Self {
            insurance: load_json_file_or_default(&dir.join(INSURANCE_CONFIG_FILE)),
            lost_on_death: load_json_file_or_default(&dir.join(LOST_ON_DEATH_CONFIG_FILE)),
            traders: if traders.is_empty() {
                default_traders()
            } else {
                traders
            },
        }
    }

    pub fn trader(&self, trader_id: &str) -> Option<&TraderInfo> {
        self.traders.get(trader_id)
    }

    /// Return chance for a trader, or `None` when the trader cannot be resolved.
    pub fn return_chance(&self, trader_id: &str) -> Option<f64> {
        self.trader(trader_id)?;
        self.insurance.return_chance_percent.get(trader_id).copied()
    }

    pub fn is_blacklisted_slot(&self, slot_id: Option<&str>) -> bool {
        slot_id.is_some_and(|slot| {
            self.insurance
                .blacklisted_equipment
                .iter()
                .any(|blacklisted| blacklisted == slot)
        })
    }

    /// Unlisted slots (and items with no equipment parent) are lost on death.
    pub fn lost_on_death(&self, equipment_slot: Option<&str>) -> bool {
        equipment_slot
            .and_then(|slot| self.lost_on_death.equipment.get(slot))
            .copied()
            .unwrap_or(true)
    }

    pub fn insurance_disabled_at(&self, location: &str) -> bool {
        self.insurance
            .disabled_locations
            .iter()
            .any(|disabled| disabled.eq_ignore_ascii_case(location))
    }
}
