//! Capability components — что можно сделать с целью
//!
//! Вместо "реализует ли actor интерфейс X" — явные компоненты на entity
//! (`Hackable`, `Interactable`) + `TargetCapabilities` для предикатов.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Цель для hack (терминал, камера, дверь с замком)
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hackable {
    pub powered: bool,
    pub hacked: bool,
    pub cost: u32,
    /// Максимальная дистанция исполнения hack (метры)
    pub range: f32,
    pub prompt: String,
}

impl Default for Hackable {
    fn default() -> Self {
        Self {
            powered: true,
            hacked: false,
            cost: 1,
            range: 12.0,
            prompt: "Hack".to_string(),
        }
    }
}

impl Hackable {
    /// Только состояние цели; дистанцию проверяет исполнитель
    pub fn can_hack(&self, _hacker: Entity) -> bool {
        self.powered && !self.hacked
    }

    /// true если hack применён
    pub fn execute_hack(&mut self, hacker: Entity) -> bool {
        if !self.can_hack(hacker) {
            return false;
        }

        self.hacked = true;
        true
    }
}

/// Цель для interact (дверь, пикап, консоль)
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interactable {
    pub enabled: bool,
    pub prompt: String,
    #[serde(default)]
    pub use_count: u32,
}

impl Default for Interactable {
    fn default() -> Self {
        Self {
            enabled: true,
            prompt: "Use".to_string(),
            use_count: 0,
        }
    }
}

impl Interactable {
    pub fn can_interact(&self, _interactor: Entity) -> bool {
        self.enabled
    }

    pub fn interact(&mut self, interactor: Entity) -> bool {
        if !self.can_interact(interactor) {
            return false;
        }

        self.use_count += 1;
        true
    }
}

/// Capability predicate service (полиморфно по типу цели)
pub trait TargetCapabilities {
    fn can_hack(&self, candidate: Entity, hacker: Entity) -> bool;
    fn can_interact(&self, candidate: Entity, interactor: Entity) -> bool;
}

/// Read-only доступ к capability компонентам в системах
pub type CapabilityQuery<'w, 's> = Query<'w, 's, (Option<&'static Hackable>, Option<&'static Interactable>)>;

impl TargetCapabilities for CapabilityQuery<'_, '_> {
    fn can_hack(&self, candidate: Entity, hacker: Entity) -> bool {
        matches!(self.get(candidate), Ok((Some(hackable), _)) if hackable.can_hack(hacker))
    }

    fn can_interact(&self, candidate: Entity, interactor: Entity) -> bool {
        matches!(self.get(candidate), Ok((_, Some(interactable))) if interactable.can_interact(interactor))
    }
}
