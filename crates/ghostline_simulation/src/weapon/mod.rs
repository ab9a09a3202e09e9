//! Weapon domain
//!
//! - `data` — WeaponData (author-time таблица)
//! - `controller` — WeaponController (ammo, fire mode, equip, таймеры)
//!
//! Тикается и связывается с arbitration core в `character` (там есть
//! `GameplayTagState` для применения notices).

pub mod controller;
pub mod data;

#[cfg(test)]
mod controller_tests;

pub use controller::{
    AimProvider, EquipState, FireContext, ShotFired, WeaponController, WeaponOutput, WeaponVisual,
    RELOAD_COMPLETION_SECS,
};
pub use data::{FireMode, MuzzleSocket, WeaponData, WeaponId, MIN_FIRE_RATE};
