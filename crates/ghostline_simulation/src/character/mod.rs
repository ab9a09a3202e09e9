//! Character module — боевой персонаж (aggregate)
//!
//! # Architecture
//!
//! **Events → Systems flow:**
//! - Input/AI пишет `CombatIntent`
//! - Core проверяет block tags, дёргает контроллеры
//! - Контроллеры возвращают notices → `GameplayTagState` (тот же вызов)
//! - Cancel handlers (Firing, ADS) → `CombatCancelSink`
//!
//! **Timers:** weapon (auto-fire, reload), aim timeline, focus fade — все
//! внутри компонентов, `Teardown` intent или despawn их гасит.

use bevy::prelude::*;

pub mod aim;
pub mod components;
pub mod events;
pub mod focus;
pub mod systems;


// Re-exports
pub use aim::{AimState, WorldAim, ZOOM_IN_RATE, ZOOM_OUT_RATE};
pub use components::{apply_weapon_output, CharacterBundle, CombatCancelSink, CombatCharacter, CHARACTER_RADIUS};
pub use events::{CombatAction, CombatIntent, HackExecuted, InteractExecuted, WeaponFired};
pub use focus::{FocusMode, FocusSettings};
pub use systems::*;

/// Character plugin
///
/// FixedUpdate:
/// - Input: process_combat_intents → process_target_actions
/// - Weapons: tick_weapons → tick_aim_and_focus → apply_focus_time_dilation
pub struct CharacterPlugin;

impl Plugin for CharacterPlugin {
    fn build(&self, app: &mut App) {
        app
            // Events
            .add_event::<CombatIntent>()
            .add_event::<WeaponFired>()
            .add_event::<HackExecuted>()
            .add_event::<InteractExecuted>()
            // Systems
            .add_systems(
                FixedUpdate,
                (process_combat_intents, process_target_actions)
                    .chain()
                    .in_set(crate::GameplaySet::Input),
            )
            .add_systems(
                FixedUpdate,
                (tick_weapons, tick_aim_and_focus, apply_focus_time_dilation)
                    .chain()
                    .in_set(crate::GameplaySet::Weapons),
            );
    }
}
