//! Character aggregate — компоненты + cancel dispatch
//!
//! Персонаж = entity с `GameplayTagState`, `WeaponController`, `AimState`,
//! `FocusMode` и двумя сканерами. Контроллеры не знают друг о друге:
//! связывает их `CombatCancelSink` (cancel handlers) и `apply_weapon_output`
//! (notices → tags).

use bevy::prelude::*;

use super::aim::AimState;
use super::focus::FocusMode;
use crate::config::GameplayConfig;
use crate::scanner::{CollisionChannel, HackScanner, InteractScanner, SphereCollider};
use crate::tags::{CancelAction, CancelSink, GameplayTag, GameplayTagState};
use crate::weapon::{WeaponController, WeaponOutput};

/// Радиус капсулы персонажа (sphere stand-in)
pub const CHARACTER_RADIUS: f32 = 0.4;

/// Marker: персонаж с боевым набором компонентов
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatCharacter {
    /// Object type капсулы — снаряды этого персонажа его игнорируют
    pub object_type: CollisionChannel,
}

impl Default for CombatCharacter {
    fn default() -> Self {
        Self {
            object_type: CollisionChannel::Pawn,
        }
    }
}

/// Cancel handlers персонажа (Firing → weapon, ADS → aim)
///
/// Заимствует контроллеры раздельно от `GameplayTagState`, поэтому handler
/// не может дотянуться до add/remove тегов.
pub struct CombatCancelSink<'a> {
    pub weapon: &'a mut WeaponController,
    pub aim: &'a mut AimState,
}

impl CancelSink for CombatCancelSink<'_> {
    fn on_cancel(&mut self, tag: GameplayTag, action: CancelAction) {
        match action {
            CancelAction::StopFiring => self.weapon.cancel_fire(),
            CancelAction::ReleaseAim => self.aim.cancel(),
        }
        crate::logger::log(&format!("🚫 {} cancelled → {:?}", tag, action));
    }
}

/// Применить notices контроллера к arbitration core (в порядке генерации)
pub fn apply_weapon_output(
    tags: &mut GameplayTagState,
    weapon: &mut WeaponController,
    aim: &mut AimState,
    output: &WeaponOutput,
) {
    let mut sink = CombatCancelSink { weapon, aim };
    for notice in &output.notices {
        tags.apply_notice(*notice, &mut sink);
    }
}

/// Полный набор компонентов боевого персонажа
#[derive(Bundle)]
pub struct CharacterBundle {
    pub character: CombatCharacter,
    pub transform: Transform,
    pub collider: SphereCollider,
    pub tags: GameplayTagState,
    pub weapon: WeaponController,
    pub aim: AimState,
    pub focus: FocusMode,
    pub hack_scanner: HackScanner,
    pub interact_scanner: InteractScanner,
}

impl CharacterBundle {
    /// Unarmed, primary weapon из конфига, сканеры с auto_start из конфига
    pub fn from_config(config: &GameplayConfig, transform: Transform) -> Self {
        let character = CombatCharacter::default();

        let mut tags = GameplayTagState::new(config.shared_tag_rules());
        tags.notify_weapon_armed(false, &mut ());

        Self {
            character,
            transform,
            collider: SphereCollider::new(CHARACTER_RADIUS, character.object_type),
            tags,
            weapon: WeaponController::new(config.primary_weapon_data().cloned()),
            aim: AimState::default(),
            focus: FocusMode::new(config.focus.clone()),
            hack_scanner: HackScanner::new(config.hack_scan.clone()),
            interact_scanner: InteractScanner::new(config.interact_scan.clone()),
        }
    }
}
