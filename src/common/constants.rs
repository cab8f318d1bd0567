// Weighted roll: draws are integers in [0, ROLL_MAX], divided down to a percentage
pub const ROLL_MAX: u32 = 9999;
pub const ROLL_CONVERSION_FACTOR: f64 = 100.0;

// Slot ids with special meaning in the item forest
pub const HIDEOUT_SLOT_ID: &str = "hideout";
pub const CONTAINER_GRID_SLOT_ID: &str = "main";

/// Slots an item can be seated in directly on the player's equipment root.
pub const EQUIPMENT_SLOT_IDS: [&str; 14] = [
    "Headwear",
    "Earpiece",
    "FaceCover",
    "ArmorVest",
    "Eyewear",
    "ArmBand",
    "TacticalVest",
    "Pockets",
    "Backpack",
    "SecuredContainer",
    "FirstPrimaryWeapon",
    "SecondPrimaryWeapon",
    "Holster",
    "Scabbard",
];

/// Pocket cells. Items returned from here land in the hideout root.
pub const POCKET_SLOT_IDS: [&str; 4] = ["pocket1", "pocket2", "pocket3", "pocket4"];

/// Armor sub-slots that hold fused soft inserts (compared lower-case).
pub const SOFT_INSERT_SLOT_IDS: [&str; 14] = [
    "groin",
    "groin_back",
    "soft_armor_back",
    "soft_armor_front",
    "soft_armor_left",
    "soft_armor_right",
    "shoulder_l",
    "shoulder_r",
    "collar",
    "helmet_top",
    "helmet_back",
    "helmet_eyes",
    "helmet_jaw",
    "helmet_ears",
];

// Return scheduling
pub const SECONDS_PER_HOUR: i64 = 60 * 60;
pub const DEFAULT_MAX_STORAGE_HOURS: i64 = 96;

// Well-known traders shipped in the default config
pub const PRAPOR_ID: &str = "54cb50c76803fa8b248b4571";
pub const THERAPIST_ID: &str = "54cb57776803fa99248b456e";

// Profile save format
pub const PROFILE_VERSION_MAGIC: u64 = 0x5241_4944_494E_5331; // "RAIDINS1"
pub const PROFILE_FILE_EXTENSION: &str = "dat";
