//! Stage 1: decide which insured items left the player during a raid.

use super::types::{InsuranceRecord, InsuredItemRef, LostGear, RaidSnapshot};
use crate::common::constants::{HIDEOUT_SLOT_ID, POCKET_SLOT_IDS, SOFT_INSERT_SLOT_IDS};
use crate::common::{InsuranceError, Result, RetentionPolicy};
use crate::items::{FaceShield, Item, ItemArena, Repairable, TemplateDb};
use std::collections::HashMap;
use tracing::debug;

pub struct LossDetector<'a> {
    policy: &'a RetentionPolicy,
    templates: &'a TemplateDb,
}

impl<'a> LossDetector<'a> {
    pub fn new(policy: &'a RetentionPolicy, templates: &'a TemplateDb) -> Self {
        Self { policy, templates }
    }

    /// Collect every insured item that was lost or dropped during the raid.
    ///
    /// An item qualifies when it is missing from the post-raid inventory, or
    /// when the player died and the equipment slot it sat under forfeits its
    /// contents on death. Body armor drags its fused soft inserts along.
    ///
    /// Fails when a qualifying item has no insurance record from raid end.
    pub fn find_lost_gear(
        &self,
        root_id: &str,
        insured_items: &[InsuredItemRef],
        snapshot: &RaidSnapshot,
    ) -> Result<Vec<LostGear>> {
        let pre_raid = ItemArena::new(&snapshot.pre_raid_items);
        let post_raid = ItemArena::new(&snapshot.post_raid_items);

        let mut records: HashMap<&str, &InsuranceRecord> = HashMap::new();
        for record in &snapshot.insurance_records {
            records.entry(record.id.as_str()).or_insert(record);
        }

        let mut lost = Vec::new();
        for insured in insured_items {
            // Not carried into the raid
            let Some(pre_raid_item) = pre_raid.get(&insured.item_id) else {
                continue;
            };

            if self.policy.is_blacklisted_slot(pre_raid_item.slot()) {
                continue;
            }

            let equipment_slot = pre_raid
                .equipment_parent(&pre_raid_item.id)
                .and_then(|parent| parent.slot());

            let record = records.get(insured.item_id.as_str()).copied();
            if record.is_some_and(|r| r.used_in_quest) {
                debug!(item_id = %insured.item_id, "Skipping insured item handed in for a quest");
                continue;
            }

            let lost_on_death = self.policy.lost_on_death(equipment_slot);
            let on_player_post_raid = post_raid.contains(&insured.item_id);
            if on_player_post_raid && !(snapshot.player_died && lost_on_death) {
                continue;
            }

            let dropped = !on_player_post_raid;
            let record = record.ok_or_else(|| InsuranceError::MissingPostRaidRecord {
                item_id: insured.item_id.clone(),
            })?;

            debug!(
                item = self.templates.name(&pre_raid_item.tpl),
                item_id = %pre_raid_item.id,
                trader_id = %insured.trader_id,
                dropped,
                "Insured item lost in raid"
            );
            lost.push(LostGear {
                item: return_copy(pre_raid_item, record, root_id),
                trader_id: insured.trader_id.clone(),
                dropped,
            });

            // Soft inserts are fused to their armor and share its fate
            if self.templates.holds_fused_inserts(&pre_raid_item.tpl) {
                for insert in pre_raid
                    .children_of(&pre_raid_item.id)
                    .filter(|child| is_soft_insert_slot(child.slot()))
                {
                    let insert_record = records
                        .get(insert.id.as_str())
                        .copied()
                        .ok_or_else(|| InsuranceError::MissingPostRaidRecord {
                            item_id: insert.id.clone(),
                        })?;
                    lost.push(LostGear {
                        item: return_copy(insert, insert_record, root_id),
                        trader_id: insured.trader_id.clone(),
                        dropped,
                    });
                }
            }
        }

        Ok(lost)
    }
}

fn is_soft_insert_slot(slot: Option<&str>) -> bool {
    slot.is_some_and(|slot| SOFT_INSERT_SLOT_IDS.contains(&slot.to_lowercase().as_str()))
}

/// Detached copy of a pre-raid item, ready to sit in an insurance package.
///
/// Root-level and pocket items move to the hideout slot and lose their grid
/// position. The found-in-raid flag is cleared and end-of-raid durability and
/// face-shield hits replace the pre-raid values.
pub fn return_copy(pre_raid_item: &Item, record: &InsuranceRecord, root_id: &str) -> Item {
    let mut item = pre_raid_item.clone();

    let in_pocket = item
        .slot()
        .map_or(true, |slot| POCKET_SLOT_IDS.contains(&slot));
    if in_pocket || item.parent() == Some(root_id) {
        item.slot_id = Some(HIDEOUT_SLOT_ID.to_string());
    }
    if item.slot() == Some(HIDEOUT_SLOT_ID) {
        item.location = None;
    }

    let upd = item.ensure_upd();
    if upd.spawned_in_session == Some(true) {
        upd.spawned_in_session = Some(false);
    }

    if let Some(durability) = record.durability {
        let max_durability = record
            .max_durability
            .or(upd.repairable.map(|r| r.max_durability))
            .unwrap_or(durability);
        upd.repairable = Some(Repairable {
            durability,
            max_durability,
        });
    }

    if let Some(hits) = record.hits {
        upd.face_shield = Some(FaceShield { hits });
    }

    item
}
