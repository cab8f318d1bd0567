//! Stage 2: roll each packaged item against its trader's return chance.
//!
//! Regular items (anything not mounted as an attachment) roll first. A
//! deleted weapon takes its whole attachment tree with it, except parts that
//! were dropped on the ground. Attachments on surviving weapons then roll on
//! their own, unless they cannot be removed in raid, in which case they simply
//! follow their weapon.

use super::types::InsurancePackage;
use crate::common::constants::{ROLL_CONVERSION_FACTOR, ROLL_MAX};
use crate::common::RetentionPolicy;
use crate::items::{adopt_orphaned_items, Item, ItemArena, TemplateDb};
use rand::Rng;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Main-parent id -> attachments currently mounted on it (directly or through
/// other attachments).
pub type ParentAttachmentsMap<'a> = BTreeMap<&'a str, Vec<&'a Item>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollResult {
    Delete,
    Keep,
    /// The trader could not be resolved. Never deletes.
    Unknown,
}

impl RollResult {
    pub fn should_delete(self) -> bool {
        self == RollResult::Delete
    }

    pub fn name(&self) -> &'static str {
        match self {
            RollResult::Delete => "Delete",
            RollResult::Keep => "Keep",
            RollResult::Unknown => "Unknown",
        }
    }
}

/// Outcome of a single draw in `[0, ROLL_MAX]`.
///
/// The draw becomes a two-decimal percentage; it deletes when it reaches the
/// trader's return chance. Dropped items are always kept.
pub fn outcome_for_draw(draw: u32, trader_return_chance: f64, dropped: bool) -> RollResult {
    let drawn_percent = f64::from(draw) / ROLL_CONVERSION_FACTOR;
    if dropped || drawn_percent < trader_return_chance {
        RollResult::Keep
    } else {
        RollResult::Delete
    }
}

pub struct RetentionRoller<'a, R: Rng> {
    policy: &'a RetentionPolicy,
    templates: &'a TemplateDb,
    rng: R,
}

impl<'a, R: Rng> RetentionRoller<'a, R> {
    pub fn new(policy: &'a RetentionPolicy, templates: &'a TemplateDb, rng: R) -> Self {
        Self {
            policy,
            templates,
            rng,
        }
    }

    /// Weighted coin flip for one item.
    pub fn roll_for_delete(
        &mut self,
        trader_id: &str,
        item: &Item,
        dropped: bool,
    ) -> RollResult {
        let Some(return_chance) = self.policy.return_chance(trader_id) else {
            warn!(%trader_id, item_id = %item.id, "Unknown trader, keeping item");
            return RollResult::Unknown;
        };

        let draw = self.rng.gen_range(0..=ROLL_MAX);
        let result = outcome_for_draw(draw, return_chance, dropped);

        let trader = self
            .policy
            .trader(trader_id)
            .map_or(trader_id, |t| t.name.as_str());
        debug!(
            "Rolling \"{}\" with {} - Return {}% - Roll: {} - Status: {}",
            self.templates.name(&item.tpl),
            trader,
            return_chance,
            f64::from(draw) / ROLL_CONVERSION_FACTOR,
            result.name()
        );

        result
    }

    /// Ids of every item in `package` that the trader fails to recover.
    pub fn find_items_to_delete(
        &mut self,
        root_id: &str,
        package: &InsurancePackage,
    ) -> HashSet<String> {
        let mut to_delete = HashSet::new();
        let arena = ItemArena::new(&package.items);

        let mut parent_attachments =
            self.populate_parent_attachments_map(root_id, package, &arena);

        self.process_regular_items(package, &arena, &mut parent_attachments, &mut to_delete);

        if !parent_attachments.is_empty() {
            let moddable = self.remove_non_moddable_attachments(parent_attachments, &arena);
            self.process_attachments(&moddable, &package.trader_id, package, &mut to_delete);
        }

        if !to_delete.is_empty() {
            debug!(
                "Marked {} items for deletion from insurance.",
                to_delete.len()
            );
        }
        to_delete
    }

    /// Map each main parent (e.g. a rifle) to the attachments mounted on it.
    ///
    /// Dropped items never enter the map. Orphans, attachments with unknown
    /// templates and attachments whose main parent is missing are logged and
    /// left out, so `process_regular_items` rolls them instead.
    pub fn populate_parent_attachments_map<'p>(
        &self,
        root_id: &str,
        package: &'p InsurancePackage,
        arena: &ItemArena<'p>,
    ) -> ParentAttachmentsMap<'p> {
        let mut map: ParentAttachmentsMap<'p> = BTreeMap::new();

        for item in &package.items {
            let parent_found = item.parent().is_some_and(|parent| arena.contains(parent));
            if !parent_found && item.parent() != Some(root_id) {
                warn!(
                    item_id = %item.id,
                    tpl = %item.tpl,
                    parent_id = item.parent().unwrap_or("<none>"),
                    "Unable to find parent of insured item"
                );
                continue;
            }

            if package.is_dropped(&item.id) {
                continue;
            }

            if !item.is_attached_attachment() {
                continue;
            }

            if !self.templates.contains(&item.tpl) {
                warn!(
                    item_id = %item.id,
                    tpl = %item.tpl,
                    "Unable to find insured attachment in the item database"
                );
                continue;
            }

            let Some(main_parent) = arena.attachment_main_parent(&item.id) else {
                warn!(
                    item_id = %item.id,
                    tpl = %item.tpl,
                    parent_id = item.parent().unwrap_or("<none>"),
                    "Unable to find main parent of insured attachment"
                );
                continue;
            };

            map.entry(main_parent.id.as_str()).or_default().push(item);
        }

        map
    }

    /// Roll every item that is not in the attachment map.
    ///
    /// Attachments the map left out (orphans, unknown templates, no main
    /// parent) roll here like any other item. Items already taken by a
    /// deleted parent are not rolled again.
    pub fn process_regular_items<'p>(
        &mut self,
        package: &'p InsurancePackage,
        arena: &ItemArena<'p>,
        parent_attachments: &mut ParentAttachmentsMap<'p>,
        to_delete: &mut HashSet<String>,
    ) {
        let mapped: HashSet<&str> = parent_attachments
            .values()
            .flatten()
            .map(|&attachment| attachment.id.as_str())
            .collect();

        for item in &package.items {
            if mapped.contains(item.id.as_str()) || to_delete.contains(&item.id) {
                continue;
            }

            let dropped = package.is_dropped(&item.id);
            let roll = self.roll_for_delete(&package.trader_id, item, dropped);
            if !roll.should_delete() {
                continue;
            }

            if parent_attachments.remove(item.id.as_str()).is_some() {
                // The parent goes and takes its tree with it; dropped parts stay
                for member in arena.item_and_children(&item.id) {
                    if !package.is_dropped(&member.id) {
                        to_delete.insert(member.id.clone());
                    }
                }
            } else {
                to_delete.insert(item.id.clone());
            }
        }
    }

    /// Keep only attachments that can be taken off in raid.
    ///
    /// Each attachment is checked against its direct parent, which may itself
    /// be an attachment on the main parent. Parents left with nothing are
    /// removed from the map.
    pub fn remove_non_moddable_attachments<'p>(
        &self,
        parent_attachments: ParentAttachmentsMap<'p>,
        arena: &ItemArena<'p>,
    ) -> ParentAttachmentsMap<'p> {
        parent_attachments
            .into_iter()
            .filter_map(|(parent_id, attachments)| {
                let moddable: Vec<&'p Item> = attachments
                    .into_iter()
                    .filter(|attachment| {
                        let direct_parent = attachment.parent().and_then(|id| arena.get(id));
                        self.templates.is_raid_moddable(attachment, direct_parent)
                    })
                    .collect();
                (!moddable.is_empty()).then_some((parent_id, moddable))
            })
            .collect()
    }

    /// Roll every remaining attachment independently.
    pub fn process_attachments(
        &mut self,
        parent_attachments: &ParentAttachmentsMap<'_>,
        trader_id: &str,
        package: &InsurancePackage,
        to_delete: &mut HashSet<String>,
    ) {
        for (parent_id, attachments) in parent_attachments {
            debug!(parent_id = %parent_id, "Processing attachments of parent");
            for attachment in attachments {
                let dropped = package.is_dropped(&attachment.id);
                if self.roll_for_delete(trader_id, attachment, dropped).should_delete() {
                    to_delete.insert(attachment.id.clone());
                }
            }
        }
    }
}

/// Apply a deletion set and make the package ready to hand to the player.
///
/// Deleted items leave the list, anything left without a parent moves to the
/// root, and the drop markers are stripped.
pub fn finalize_package(
    root_id: &str,
    package: &mut InsurancePackage,
    to_delete: &HashSet<String>,
) {
    let removed = package.remove_items(to_delete);
    let adopted = adopt_orphaned_items(root_id, &mut package.items);
    package.strip_drop_markers();

    debug!(
        package_id = %package.id,
        removed,
        adopted,
        remaining = package.items.len(),
        "Finalized insurance package"
    );
}
