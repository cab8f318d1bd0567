//! Id-indexed arena over a flat item list.
//!
//! Items reference their parent by id, so every walk is a lookup. Walks are
//! bounded by the arena size, which keeps malformed (cyclic) snapshots from
//! looping forever.

use super::types::Item;
use crate::common::constants::HIDEOUT_SLOT_ID;
use std::collections::{HashMap, HashSet};

pub struct ItemArena<'a> {
    items: &'a [Item],
    by_id: HashMap<&'a str, usize>,
    children: HashMap<&'a str, Vec<usize>>,
}

impl<'a> ItemArena<'a> {
    /// Index `items`. With duplicate ids the later item wins.
    pub fn new(items: &'a [Item]) -> Self {
        let mut by_id = HashMap::with_capacity(items.len());
        let mut children: HashMap<&'a str, Vec<usize>> = HashMap::new();

        for (index, item) in items.iter().enumerate() {
            by_id.insert(item.id.as_str(), index);
            if let Some(parent) = item.parent() {
                children.entry(parent).or_default().push(index);
            }
        }

        Self {
            items,
            by_id,
            children,
        }
    }

    pub fn get(&self, id: &str) -> Option<&'a Item> {
        self.by_id.get(id).map(|&index| &self.items[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of distinct ids.
    fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn parent_of(&self, item: &Item) -> Option<&'a Item> {
        self.get(item.parent()?)
    }

    /// Direct children of `id`, in list order.
    pub fn children_of(&self, id: &str) -> impl Iterator<Item = &'a Item> + '_ {
        self.children
            .get(id)
            .into_iter()
            .flatten()
            .map(|&index| &self.items[index])
    }

    /// Walk up from `id` (inclusive) to the first item matching `found`.
    fn walk_up_until(&self, id: &str, found: impl Fn(&Item) -> bool) -> Option<&'a Item> {
        let mut current = self.get(id)?;
        let mut steps = 0;
        while !found(current) {
            current = self.get(current.parent()?)?;
            steps += 1;
            if steps > self.len() {
                return None;
            }
        }
        Some(current)
    }

    /// The ancestor (or self) seated directly in an equipment slot.
    ///
    /// A grenade in a rig pocket resolves to the rig; an item stored loose in
    /// the stash resolves to nothing.
    pub fn equipment_parent(&self, id: &str) -> Option<&'a Item> {
        self.walk_up_until(id, Item::is_in_equipment_slot)
    }

    /// The top-level item an attachment is mounted to, skipping intermediate
    /// attachments but not crossing into containers.
    pub fn attachment_main_parent(&self, id: &str) -> Option<&'a Item> {
        self.walk_up_until(id, |item| !item.is_attached_attachment())
    }

    /// `id` followed by its whole subtree, depth first.
    pub fn item_and_children(&self, id: &str) -> Vec<&'a Item> {
        let mut found = Vec::new();
        let Some(root) = self.get(id) else {
            return found;
        };

        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(item) = stack.pop() {
            if !visited.insert(item.id.as_str()) {
                continue;
            }
            found.push(item);
            if let Some(kids) = self.children.get(item.id.as_str()) {
                stack.extend(kids.iter().rev().map(|&index| &self.items[index]));
            }
        }
        found
    }
}

/// Re-home items whose parent is neither in `items` nor the root id.
///
/// Adopted items land in the hideout slot of the root with no grid location.
/// Returns how many items were adopted.
pub fn adopt_orphaned_items(root_id: &str, items: &mut [Item]) -> usize {
    let ids: HashSet<String> = items.iter().map(|item| item.id.clone()).collect();
    let mut adopted = 0;

    for item in items.iter_mut() {
        let parent_known = item
            .parent()
            .is_some_and(|parent| parent == root_id || ids.contains(parent));
        if !parent_known {
            item.parent_id = Some(root_id.to_string());
            item.slot_id = Some(HIDEOUT_SLOT_ID.to_string());
            item.location = None;
            adopted += 1;
        }
    }
    adopted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::types::ItemLocation;

    fn loadout() -> Vec<Item> {
        vec![
            Item::new("rig", "tpl_rig").with_parent("equip", "TacticalVest"),
            Item::new("grenade", "tpl_grenade").with_parent("rig", "main"),
            Item::new("rifle", "tpl_rifle").with_parent("equip", "FirstPrimaryWeapon"),
            Item::new("handguard", "tpl_hg").with_parent("rifle", "mod_handguard"),
            Item::new("light", "tpl_light").with_parent("handguard", "mod_tactical"),
            Item::new("loose", "tpl_misc").with_parent("stash", "hideout"),
        ]
    }

    #[test]
    fn test_get_and_parent_lookup() {
        let items = loadout();
        let arena = ItemArena::new(&items);
        assert_eq!(arena.len(), 6);
        let light = arena.get("light").unwrap();
        assert_eq!(
            arena.parent_of(light).map(|p| p.id.as_str()),
            Some("handguard")
        );
        assert!(arena.get("nothing").is_none());
    }

    #[test]
    fn test_equipment_parent_walks_through_containers() {
        let items = loadout();
        let arena = ItemArena::new(&items);
        let parent_id = |id| arena.equipment_parent(id).map(|i| i.id.as_str());
        assert_eq!(parent_id("grenade"), Some("rig"));
        assert_eq!(parent_id("rig"), Some("rig"));
        assert_eq!(parent_id("light"), Some("rifle"));
        assert!(parent_id("loose").is_none());
    }

    #[test]
    fn test_attachment_main_parent_skips_nested_mods() {
        let items = loadout();
        let arena = ItemArena::new(&items);
        assert_eq!(
            arena.attachment_main_parent("light").map(|i| i.id.as_str()),
            Some("rifle")
        );
        assert_eq!(
            arena
                .attachment_main_parent("handguard")
                .map(|i| i.id.as_str()),
            Some("rifle")
        );
    }

    #[test]
    fn test_attachment_main_parent_missing_link() {
        let items = vec![Item::new("scope", "tpl").with_parent("gone", "mod_scope")];
        let arena = ItemArena::new(&items);
        assert!(arena.attachment_main_parent("scope").is_none());
    }

    #[test]
    fn test_cyclic_parents_terminate() {
        let items = vec![
            Item::new("a", "tpl").with_parent("b", "mod_a"),
            Item::new("b", "tpl").with_parent("a", "mod_b"),
        ];
        let arena = ItemArena::new(&items);
        assert!(arena.attachment_main_parent("a").is_none());
        assert!(arena.equipment_parent("a").is_none());
        assert_eq!(arena.item_and_children("a").len(), 2);
    }

    #[test]
    fn test_item_and_children_includes_whole_subtree() {
        let items = loadout();
        let arena = ItemArena::new(&items);
        let ids: Vec<&str> = arena
            .item_and_children("rifle")
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, vec!["rifle", "handguard", "light"]);
        assert!(arena.item_and_children("nothing").is_empty());
        assert_eq!(arena.children_of("rig").count(), 1);
    }

    #[test]
    fn test_adopt_orphans_reparents_to_root() {
        let mut items = vec![
            Item::new("bag", "tpl").with_parent("root", "hideout"),
            Item::new("in_bag", "tpl")
                .with_parent("bag", "main")
                .with_location(ItemLocation {
                    x: 1,
                    y: 0,
                    r: 0,
                    is_searched: true,
                }),
            Item::new("orphan", "tpl")
                .with_parent("deleted_rifle", "mod_scope")
                .with_location(ItemLocation {
                    x: 0,
                    y: 0,
                    r: 0,
                    is_searched: false,
                }),
            Item::new("parentless", "tpl"),
        ];

        let adopted = adopt_orphaned_items("root", &mut items);

        assert_eq!(adopted, 2);
        assert_eq!(items[1].parent(), Some("bag"));
        assert!(items[1].location.is_some());
        assert_eq!(items[2].parent(), Some("root"));
        assert_eq!(items[2].slot(), Some(HIDEOUT_SLOT_ID));
        assert!(items[2].location.is_none());
        assert_eq!(items[3].parent(), Some("root"));
    }
}
