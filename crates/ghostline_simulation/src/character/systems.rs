//! Character systems (FixedUpdate)
//!
//! # Systems
//!
//! **Input set:**
//! - `process_combat_intents` — gating по block tags → weapon/aim/focus
//! - `process_target_actions` — hack/interact по текущим целям сканеров
//!
//! **Weapons set:**
//! - `tick_weapons` — auto-fire cadence + reload completion
//! - `tick_aim_and_focus` — zoom timeline, focus blend fade
//! - `apply_focus_time_dilation` — `Time<Virtual>` relative speed

use bevy::prelude::*;

use super::aim::{AimState, WorldAim};
use super::components::{apply_weapon_output, CombatCancelSink, CombatCharacter};
use super::events::{CombatAction, CombatIntent, HackExecuted, InteractExecuted, WeaponFired};
use super::focus::FocusMode;
use crate::config::GameplayConfig;
use crate::projectile::ProjectilePool;
use crate::scanner::{
    view_transform, ColliderSnapshot, HackScanner, Hackable, InteractScanner, Interactable, SphereCollider, ViewPoint,
};
use crate::tags::{GameplayTag, GameplayTagState};
use crate::weapon::{FireContext, WeaponController, WeaponOutput};
use crate::{log, log_warning, DeterministicRng};

fn write_shots(shooter: Entity, output: &WeaponOutput, fired: &mut EventWriter<WeaponFired>) {
    for shot in &output.shots {
        fired.write(WeaponFired {
            shooter,
            projectile: shot.projectile,
            origin: shot.origin,
            direction: shot.direction,
        });
    }
}

// ============================================================================
// Intents
// ============================================================================

/// Process combat intents (fire / aim / reload / toggle / focus / teardown)
///
/// Hack и Interact обрабатывает `process_target_actions`.
pub fn process_combat_intents(
    mut intents: EventReader<CombatIntent>,
    mut characters: Query<(
        &Transform,
        Option<&ViewPoint>,
        &CombatCharacter,
        &mut GameplayTagState,
        &mut WeaponController,
        &mut AimState,
        &mut FocusMode,
        &mut HackScanner,
        &mut InteractScanner,
    )>,
    colliders: Query<(Entity, &Transform, &SphereCollider)>,
    mut pool: Option<ResMut<ProjectilePool>>,
    mut rng: ResMut<DeterministicRng>,
    config: Res<GameplayConfig>,
    mut fired: EventWriter<WeaponFired>,
) {
    if intents.is_empty() {
        return;
    }

    let world = ColliderSnapshot::from_colliders(colliders.iter());

    for intent in intents.read() {
        let Ok((transform, view, character, mut tags, mut weapon, mut aim, mut focus, mut hack, mut interact)) =
            characters.get_mut(intent.entity)
        else {
            log_warning(&format!("CombatIntent {:?}: entity {:?} is not a combat character", intent.action, intent.entity));
            continue;
        };

        let aim_trace = WorldAim {
            owner: intent.entity,
            view: view_transform(transform, view),
            world: &world,
        };
        let mut ctx = FireContext {
            owner: intent.entity,
            owner_channel: Some(character.object_type),
            origin: *transform,
            aim: &aim_trace,
            pool: pool.as_deref_mut(),
            fallback_class: config.fallback_projectile.as_ref(),
            rng: &mut rng.rng,
        };
        let mut out = WeaponOutput::default();

        match intent.action {
            CombatAction::FirePressed => {
                if tags.is_blocked_by(GameplayTag::BlockFire) {
                    weapon.note_fire_held();
                    log(&format!("⛔ Fire blocked for {:?}", intent.entity));
                } else {
                    weapon.request_fire_pressed(&mut ctx, &mut out);
                }
            }
            CombatAction::FireReleased => weapon.request_fire_released(&mut out),
            CombatAction::AimPressed => {
                if tags.is_blocked_by(GameplayTag::BlockAds) {
                    log(&format!("⛔ Aim blocked for {:?}", intent.entity));
                } else if aim.press() {
                    let mut sink = CombatCancelSink {
                        weapon: &mut *weapon,
                        aim: &mut *aim,
                    };
                    tags.add_state_tag(GameplayTag::Ads, &mut sink);
                }
            }
            CombatAction::AimReleased => {
                if aim.release() {
                    let mut sink = CombatCancelSink {
                        weapon: &mut *weapon,
                        aim: &mut *aim,
                    };
                    tags.remove_state_tag(GameplayTag::Ads, &mut sink);
                }
            }
            CombatAction::Reload => {
                if tags.is_blocked_by(GameplayTag::BlockReload) {
                    log(&format!("⛔ Reload blocked for {:?}", intent.entity));
                } else {
                    weapon.request_reload(&mut out);
                }
            }
            CombatAction::ToggleWeapon => {
                if tags.is_blocked_by(GameplayTag::BlockEquip) {
                    log(&format!("⛔ Weapon toggle blocked for {:?}", intent.entity));
                } else if weapon.is_armed() {
                    weapon.request_unequip(&mut out);
                } else {
                    weapon.request_equip_primary(&mut out);
                }
            }
            CombatAction::ToggleFocus => {
                focus.toggle();
            }
            CombatAction::Teardown => {
                weapon.teardown();
                aim.reset();
                focus.force_exit();
                hack.stop_scan();
                interact.stop_scan();
                let mut sink = CombatCancelSink {
                    weapon: &mut *weapon,
                    aim: &mut *aim,
                };
                tags.notify_teardown(&mut sink);
                log(&format!("🧹 Character {:?} torn down", intent.entity));
            }
            CombatAction::Hack | CombatAction::Interact => {}
        }

        apply_weapon_output(&mut tags, &mut weapon, &mut aim, &out);
        write_shots(intent.entity, &out, &mut fired);
    }
}

/// Process hack / interact intents по текущим целям сканеров
///
/// Предикат перепроверяется на момент исполнения; для hack ещё и дистанция.
pub fn process_target_actions(
    mut intents: EventReader<CombatIntent>,
    characters: Query<(&Transform, Option<&HackScanner>, Option<&InteractScanner>)>,
    mut hackables: Query<(&Transform, &mut Hackable)>,
    mut interactables: Query<&mut Interactable>,
    mut hacked: EventWriter<HackExecuted>,
    mut used: EventWriter<InteractExecuted>,
) {
    for intent in intents.read() {
        let Ok((transform, hack_scanner, interact_scanner)) = characters.get(intent.entity) else {
            continue;
        };

        match intent.action {
            CombatAction::Hack => {
                let Some(target) = hack_scanner.and_then(HackScanner::current_target) else {
                    continue;
                };
                let Ok((target_transform, mut hackable)) = hackables.get_mut(target) else {
                    continue;
                };

                let distance = transform.translation.distance(target_transform.translation);
                if distance > hackable.range {
                    log(&format!("💻 Hack {:?}: out of range ({:.1} > {:.1})", target, distance, hackable.range));
                    continue;
                }

                if hackable.execute_hack(intent.entity) {
                    log(&format!("💻 {:?} hacked {:?}", intent.entity, target));
                    hacked.write(HackExecuted {
                        hacker: intent.entity,
                        target,
                        cost: hackable.cost,
                    });
                }
            }
            CombatAction::Interact => {
                let Some(target) = interact_scanner.and_then(InteractScanner::current_target) else {
                    continue;
                };
                let Ok(mut interactable) = interactables.get_mut(target) else {
                    continue;
                };

                if interactable.interact(intent.entity) {
                    log(&format!("🤝 {:?} used {:?}", intent.entity, target));
                    used.write(InteractExecuted {
                        interactor: intent.entity,
                        target,
                    });
                }
            }
            _ => {}
        }
    }
}

// ============================================================================
// Timers
// ============================================================================

/// Тик таймеров оружия (auto-fire, reload) + применение notices
pub fn tick_weapons(
    time: Res<Time>,
    mut characters: Query<(
        Entity,
        &Transform,
        Option<&ViewPoint>,
        &CombatCharacter,
        &mut GameplayTagState,
        &mut WeaponController,
        &mut AimState,
    )>,
    colliders: Query<(Entity, &Transform, &SphereCollider)>,
    mut pool: Option<ResMut<ProjectilePool>>,
    mut rng: ResMut<DeterministicRng>,
    config: Res<GameplayConfig>,
    mut fired: EventWriter<WeaponFired>,
) {
    if !characters.iter().any(|(_, _, _, _, _, weapon, _)| weapon.has_pending_timers()) {
        return;
    }

    let world = ColliderSnapshot::from_colliders(colliders.iter());

    for (entity, transform, view, character, mut tags, mut weapon, mut aim) in characters.iter_mut() {
        if !weapon.has_pending_timers() {
            continue;
        }

        let aim_trace = WorldAim {
            owner: entity,
            view: view_transform(transform, view),
            world: &world,
        };
        let mut ctx = FireContext {
            owner: entity,
            owner_channel: Some(character.object_type),
            origin: *transform,
            aim: &aim_trace,
            pool: pool.as_deref_mut(),
            fallback_class: config.fallback_projectile.as_ref(),
            rng: &mut rng.rng,
        };
        let mut out = WeaponOutput::default();

        weapon.tick(time.delta(), &mut ctx, &mut out);

        apply_weapon_output(&mut tags, &mut weapon, &mut aim, &out);
        write_shots(entity, &out, &mut fired);
    }
}

/// Zoom timeline + focus blend (fixed delta)
pub fn tick_aim_and_focus(time: Res<Time>, mut characters: Query<(&mut AimState, &mut FocusMode)>) {
    let delta = time.delta_secs();

    for (mut aim, mut focus) in characters.iter_mut() {
        if aim.is_zooming() {
            aim.tick(delta);
        }
        if focus.is_fading() {
            focus.tick(delta);
        }
    }
}

/// Relative speed виртуального времени = самый сильный активный focus (иначе 1.0)
pub fn apply_focus_time_dilation(focus: Query<&FocusMode>, mut virtual_time: ResMut<Time<Virtual>>) {
    let speed = focus
        .iter()
        .map(FocusMode::time_dilation)
        .fold(1.0_f32, f32::min);

    if virtual_time.relative_speed() != speed {
        virtual_time.set_relative_speed(speed);
        log(&format!("🕰️ Virtual time speed → {:.2}", speed));
    }
}
