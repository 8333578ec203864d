// Hero starting stats
pub const HERO_BASE_HP: i32 = 100;
pub const HERO_BASE_MAGIC_LEVEL: u32 = 3;
pub const HERO_BASE_STRENGTH_LEVEL: u32 = 3;
pub const HERO_BASE_SPEED: f64 = 0.1;
pub const HERO_BASE_COINS: u32 = 0;

// Hero action scaling
pub const DAMAGE_PER_LEVEL: i32 = 10;
pub const HEAL_PER_MAGIC_LEVEL: i32 = 10;
pub const DEFENSE_PER_STRENGTH_LEVEL: i32 = 2;

// Enemy scaling: base + (level - 1) * step, with a bonus every N levels
pub const ENEMY_BASE_HP: i32 = 80;
pub const ENEMY_HP_PER_LEVEL: i32 = 20;
pub const ENEMY_BASE_ATTACK: i32 = 15;
pub const ENEMY_ATTACK_PER_LEVEL: i32 = 8;
pub const ENEMY_MILESTONE_INTERVAL: u32 = 5;
pub const ENEMY_MILESTONE_HP_BONUS: i32 = 50;
pub const ENEMY_MILESTONE_ATTACK_BONUS: i32 = 15;

// Attack variance ranges (multiplier of attack power)
pub const ENEMY_ATTACK_VARIANCE_MIN: f64 = 0.8;
pub const ENEMY_ATTACK_VARIANCE_MAX: f64 = 1.2;
pub const BOSS_SPECIAL_VARIANCE_MIN: f64 = 1.5;
pub const BOSS_SPECIAL_VARIANCE_MAX: f64 = 2.5;

// Boss multipliers: (hp, attack)
pub const BOSS_HP_MULTIPLIER: i32 = 2;
pub const BOSS_ATTACK_MULTIPLIER: f64 = 1.5;
pub const BOSS_SPECIAL_CHANCE: f64 = 0.25;

// Progression
pub const VICTORY_COIN_REWARD: u32 = 20;
pub const UPGRADE_COIN_BONUS: u32 = 10;
pub const UPGRADE_STRENGTH_AMOUNT: u32 = 1;
pub const UPGRADE_MAGIC_AMOUNT: u32 = 1;
pub const UPGRADE_SPEED_AMOUNT: f64 = 0.1;
pub const UPGRADE_HEALTH_AMOUNT: i32 = 50;
pub const STARTING_FLOOR: u32 = 1;

// Shop
pub const POTION_HEAL_AMOUNT: i32 = 25;
pub const POTION_COST: u32 = 5;
pub const ATTACK_UPGRADE_COST: u32 = 10;
pub const WAND_UPGRADE_COST: u32 = 10;

// Telemetry
pub const DEFAULT_DATA_DIR: &str = "game_data";
pub const DEFAULT_EXPORT_DIR: &str = "graphs";
pub const LOG_FILE_NAME: &str = "spire.log";
pub const SESSION_ID_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const TELEMETRY_SCHEMA_VERSION: u32 = 1;

// UI pacing
pub const UI_POLL_MS: u64 = 50;
pub const TURN_MESSAGE_LIMIT: usize = 8;
