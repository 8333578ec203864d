//! The between-floors shop: a fixed price list paid for with coins.

use serde::Serialize;

use crate::combat::types::Hero;
use crate::core::constants::*;
use crate::error::ShopError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemEffect {
    /// Restores HP, capped at max HP.
    RestoreHp(i32),
    StrengthLevels(u32),
    MagicLevels(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShopItem {
    pub name: &'static str,
    pub cost: u32,
    pub effect: ItemEffect,
}

pub static SHOP_ITEMS: [ShopItem; 3] = [
    ShopItem {
        name: "Potion (+25 HP)",
        cost: POTION_COST,
        effect: ItemEffect::RestoreHp(POTION_HEAL_AMOUNT),
    },
    ShopItem {
        name: "Attack Upgrade (+10 ATK)",
        cost: ATTACK_UPGRADE_COST,
        effect: ItemEffect::StrengthLevels(1),
    },
    ShopItem {
        name: "Wand Upgrade (+10 Magic ATK)",
        cost: WAND_UPGRADE_COST,
        effect: ItemEffect::MagicLevels(1),
    },
];

pub fn item(slot: usize) -> Option<&'static ShopItem> {
    SHOP_ITEMS.get(slot)
}

impl ShopItem {
    pub fn affordable(&self, hero: &Hero) -> bool {
        hero.coins >= self.cost
    }

    fn apply(&self, hero: &mut Hero) {
        match self.effect {
            ItemEffect::RestoreHp(amount) => {
                hero.restore_hp(amount);
            }
            ItemEffect::StrengthLevels(levels) => hero.strength_level += levels,
            ItemEffect::MagicLevels(levels) => hero.magic_level += levels,
        }
    }
}

/// Pays for and applies the item in `slot`. Leaves the hero untouched on error.
pub fn buy(hero: &mut Hero, slot: usize) -> Result<&'static ShopItem, ShopError> {
    let item = item(slot).ok_or(ShopError::UnknownItem(slot))?;
    if !item.affordable(hero) {
        return Err(ShopError::NotEnoughCoins {
            item: item.name.to_string(),
            cost: item.cost,
            coins: hero.coins,
        });
    }

    hero.coins -= item.cost;
    item.apply(hero);
    Ok(item)
}
