//! Item template table: what kind of thing a `_tpl` id is and how it mounts.

use super::types::Item;
use crate::utils::persistence::load_json_file_or_default;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const ITEM_TEMPLATES_FILE: &str = "items.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateKind {
    Armor,
    Vest,
    Headwear,
    Weapon,
    Mod,
    Container,
    Other,
}

impl TemplateKind {
    /// Armor-bearing kinds that can carry plates and soft inserts.
    pub fn can_hold_armor_mods(&self) -> bool {
        matches!(
            self,
            TemplateKind::Armor | TemplateKind::Vest | TemplateKind::Headwear
        )
    }
}

/// A named mount point on a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSpec {
    pub name: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTemplate {
    pub id: String,
    pub name: String,
    pub kind: TemplateKind,
    /// Whether the item can be detached while in a raid
    #[serde(default = "default_raid_moddable")]
    pub raid_moddable: bool,
    #[serde(default)]
    pub slots: Vec<SlotSpec>,
}

fn default_raid_moddable() -> bool {
    true
}

impl ItemTemplate {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: TemplateKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            raid_moddable: true,
            slots: Vec::new(),
        }
    }

    pub fn not_raid_moddable(mut self) -> Self {
        self.raid_moddable = false;
        self
    }

    pub fn with_slot(mut self, name: impl Into<String>, required: bool) -> Self {
        self.slots.push(SlotSpec {
            name: name.into(),
            required,
        });
        self
    }

    pub fn has_slots(&self) -> bool {
        !self.slots.is_empty()
    }

    pub fn slot_is_required(&self, slot_name: &str) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.required && slot.name == slot_name)
    }
}

/// Read-only template lookup keyed by template id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateDb {
    templates: HashMap<String, ItemTemplate>,
}

impl TemplateDb {
    pub fn new(templates: impl IntoIterator<Item = ItemTemplate>) -> Self {
        Self {
            templates: templates
                .into_iter()
                .map(|template| (template.id.clone(), template))
                .collect(),
        }
    }

    /// Load `items.json` (a JSON array of templates) from `dir`.
    pub fn load_from_dir(dir: &Path) -> Self {
        let templates: Vec<ItemTemplate> =
            load_json_file_or_default(&dir.join(ITEM_TEMPLATES_FILE));
        Self::new(templates)
    }

    pub fn get(&self, tpl: &str) -> Option<&ItemTemplate> {
        self.templates.get(tpl)
    }

    pub fn contains(&self, tpl: &str) -> bool {
        self.templates.contains_key(tpl)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Display name for logs, falling back to the raw template id.
    pub fn name<'a>(&'a self, tpl: &'a str) -> &'a str {
        self.get(tpl).map_or(tpl, |template| template.name.as_str())
    }

    /// Armor that holds fused soft inserts: an armor kind with mount slots.
    pub fn holds_fused_inserts(&self, tpl: &str) -> bool {
        self.get(tpl)
            .is_some_and(|template| template.kind.can_hold_armor_mods() && template.has_slots())
    }

    /// Whether `item` may be removed from `parent` during a raid.
    ///
    /// Unknown templates, slotless items, templates flagged not raid-moddable
    /// and items filling a slot the parent requires are all non-moddable.
    pub fn is_raid_moddable(&self, item: &Item, parent: Option<&Item>) -> bool {
        let Some(slot) = item.slot() else {
            return false;
        };
        let Some(template) = self.get(&item.tpl) else {
            return false;
        };
        let Some(parent_template) = parent.and_then(|p| self.get(&p.tpl)) else {
            return false;
        };

        template.raid_moddable && !parent_template.slot_is_required(slot)
    }
}
