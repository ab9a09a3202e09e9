//! Character events
//!
//! **Input → core:** `CombatIntent` (player input или AI пишут одинаково)
//!
//! **Core → downstream:** `WeaponFired`, `HackExecuted`, `InteractExecuted`

use bevy::prelude::*;

use crate::pool::PoolHandle;

/// Действие, которое запрашивает управляющий агент
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatAction {
    FirePressed,
    FireReleased,
    AimPressed,
    AimReleased,
    Reload,
    /// Unarmed → equip, Armed → unequip
    ToggleWeapon,
    Hack,
    Interact,
    ToggleFocus,
    /// Очистить все таймеры персонажа (перед despawn / сменой уровня)
    Teardown,
}

/// Intent от input/AI
///
/// Gating по block tags делает core, отправитель ничего не проверяет.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatIntent {
    pub entity: Entity,
    pub action: CombatAction,
}

impl CombatIntent {
    pub fn new(entity: Entity, action: CombatAction) -> Self {
        Self { entity, action }
    }
}

/// Выстрел произошёл (projectile None → пул отказал)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct WeaponFired {
    pub shooter: Entity,
    pub projectile: Option<PoolHandle>,
    pub origin: Vec3,
    pub direction: Vec3,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HackExecuted {
    pub hacker: Entity,
    pub target: Entity,
    pub cost: u32,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractExecuted {
    pub interactor: Entity,
    pub target: Entity,
}
