//! Unit tests для WeaponController

use super::*;
use crate::pool::{PoolBucketConfig, PoolClass, PoolId};
use crate::projectile::{Projectile, ProjectilePool, ProjectileSettings};
use crate::scanner::spatial::CollisionChannel;
use crate::tags::StateNotice;
use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// Aim stub: фиксированная точка попадания (или промах) + камера
struct FixedAim {
    hit: Option<Vec3>,
    view: Transform,
}

impl AimProvider for FixedAim {
    fn aim_hit_point(&self, _range: f32, _channel: CollisionChannel) -> Option<Vec3> {
        self.hit
    }

    fn view_point(&self) -> Transform {
        self.view
    }
}

/// Окружение одного теста: пул, aim, rng
struct Rig {
    pool: ProjectilePool,
    aim: FixedAim,
    rng: ChaCha8Rng,
    owner: Entity,
}

impl Rig {
    fn new() -> Self {
        let mut pool = ProjectilePool::new(PoolId(1), |_class: &PoolClass| {
            Some(Projectile::new(ProjectileSettings::default()))
        });
        pool.configure([PoolBucketConfig::new(PoolClass::new("projectile.rifle")).with_prewarm(4)]);
        pool.prewarm_all();

        Self {
            pool,
            aim: FixedAim {
                hit: Some(Vec3::new(0.0, 0.0, -50.0)),
                view: Transform::IDENTITY,
            },
            rng: ChaCha8Rng::seed_from_u64(42),
            owner: Entity::from_raw(7),
        }
    }

    fn ctx(&mut self) -> FireContext<'_> {
        FireContext {
            owner: self.owner,
            owner_channel: Some(CollisionChannel::Pawn),
            origin: Transform::IDENTITY,
            aim: &self.aim,
            pool: Some(&mut self.pool),
            fallback_class: None,
            rng: &mut self.rng,
        }
    }
}

fn rifle(fire_mode: FireMode) -> WeaponData {
    WeaponData::rifle()
        .with_fire_mode(fire_mode)
        .with_spread(0.0)
        .with_ammo(30, 160)
}

fn armed(fire_mode: FireMode) -> WeaponController {
    let mut weapon = WeaponController::new(Some(rifle(fire_mode)));
    weapon.request_equip_primary(&mut WeaponOutput::default());
    weapon
}

const TICK: f32 = 0.1;

fn tick(weapon: &mut WeaponController, rig: &mut Rig, out: &mut WeaponOutput) {
    let mut ctx = rig.ctx();
    weapon.tick(Duration::from_secs_f32(TICK), &mut ctx, out);
}

#[test]
fn test_equip_initializes_ammo_and_notifies() {
    let mut weapon = WeaponController::new(Some(rifle(FireMode::FullAuto)));
    let mut out = WeaponOutput::default();

    assert!(weapon.request_equip_primary(&mut out));
    assert_eq!(out.notices, vec![StateNotice::WeaponArmed(true)]);
    assert_eq!((weapon.ammo_in_mag(), weapon.reserve_ammo()), (30, 160));
    assert!(!weapon.visual().hidden);

    // Повторный equip — no-op
    let mut again = WeaponOutput::default();
    assert!(weapon.request_equip_primary(&mut again));
    assert!(again.is_empty());
}

#[test]
fn test_equip_without_data_is_rejected() {
    let mut weapon = WeaponController::new(None);
    let mut out = WeaponOutput::default();

    assert!(!weapon.request_equip_primary(&mut out));
    assert_eq!(weapon.equip_state(), EquipState::Unarmed);
    assert!(out.is_empty());
}

#[test]
fn test_fire_press_while_unarmed_equips_only() {
    let mut rig = Rig::new();
    let mut weapon = WeaponController::new(Some(rifle(FireMode::SemiAuto)));
    let mut out = WeaponOutput::default();

    weapon.request_fire_pressed(&mut rig.ctx(), &mut out);

    assert!(weapon.is_armed());
    assert!(weapon.wants_to_fire());
    assert!(out.shots.is_empty());
    assert_eq!(out.notices, vec![StateNotice::WeaponArmed(true)]);
    assert_eq!(weapon.ammo_in_mag(), 30);
}

#[test]
fn test_semi_auto_shot_launches_pooled_projectile() {
    let mut rig = Rig::new();
    let mut weapon = armed(FireMode::SemiAuto);
    let mut out = WeaponOutput::default();

    weapon.request_fire_pressed(&mut rig.ctx(), &mut out);

    assert_eq!(out.notices, vec![StateNotice::FirePressed]);
    assert_eq!(out.shots.len(), 1);
    assert_eq!(weapon.ammo_in_mag(), 29);
    assert!(!weapon.is_auto_firing());

    let shot = &out.shots[0];
    let handle = shot.projectile.unwrap();
    let projectile = rig.pool.get(handle).unwrap();

    assert_eq!(projectile.owner(), Some(rig.owner));
    assert_eq!(projectile.owning_pool(), Some(rig.pool.id()));
    assert_eq!(projectile.damage(), 20.0);

    // От дула к aim point
    let expected = (Vec3::new(0.0, 0.0, -50.0) - shot.origin).normalize();
    assert!((shot.direction - expected).length() < 1e-5);
    assert!(projectile.velocity().normalize().dot(expected) > 0.9999);
}

#[test]
fn test_aim_miss_falls_back_to_view_forward() {
    let mut rig = Rig::new();
    rig.aim.hit = None;
    rig.aim.view = Transform::from_xyz(0.0, 0.0, 0.0).looking_to(Vec3::X, Vec3::Y);

    let mut weapon = armed(FireMode::SemiAuto);
    let mut out = WeaponOutput::default();
    weapon.request_fire_pressed(&mut rig.ctx(), &mut out);

    // Aim point = камера + X * max_range (100м) → направление почти +X
    assert!(out.shots[0].direction.dot(Vec3::X) > 0.99);
}

#[test]
fn test_full_auto_cadence_and_release() {
    let mut rig = Rig::new();
    let mut weapon = armed(FireMode::FullAuto);
    let mut out = WeaponOutput::default();

    weapon.request_fire_pressed(&mut rig.ctx(), &mut out);
    assert_eq!(out.shots.len(), 1);
    assert!(weapon.is_auto_firing());

    for _ in 0..3 {
        tick(&mut weapon, &mut rig, &mut out);
    }
    assert_eq!(out.shots.len(), 4);
    assert_eq!(weapon.ammo_in_mag(), 26);

    let mut released = WeaponOutput::default();
    weapon.request_fire_released(&mut released);
    assert_eq!(released.notices, vec![StateNotice::FireReleased]);
    assert!(!weapon.is_auto_firing());
    assert!(!weapon.wants_to_fire());

    tick(&mut weapon, &mut rig, &mut out);
    assert_eq!(out.shots.len(), 4);
}

#[test]
fn test_ammo_conservation_through_auto_reload() {
    let mut rig = Rig::new();
    let mut weapon = armed(FireMode::FullAuto);
    let mut out = WeaponOutput::default();

    weapon.request_fire_pressed(&mut rig.ctx(), &mut out);
    for _ in 0..29 {
        tick(&mut weapon, &mut rig, &mut out);
    }
    assert_eq!(out.shots.len(), 30);
    assert_eq!(weapon.ammo_in_mag(), 0);

    // Следующий тик: CanFire = false → стоп + auto-reload
    tick(&mut weapon, &mut rig, &mut out);
    assert!(weapon.is_reloading());
    assert!(!weapon.is_auto_firing());
    assert!(out.notices.contains(&StateNotice::ReloadStarted));

    weapon.request_fire_released(&mut out);

    tick(&mut weapon, &mut rig, &mut out);
    assert!(!weapon.is_reloading());
    assert_eq!(out.notices.last(), Some(&StateNotice::ReloadFinished));

    let fired = out.shots.len() as u32;
    assert_eq!(fired, 30);
    assert_eq!(weapon.ammo_in_mag() + weapon.reserve_ammo(), 190 - fired);
    assert_eq!((weapon.ammo_in_mag(), weapon.reserve_ammo()), (30, 130));
}

#[test]
fn test_held_fire_resumes_full_auto_after_reload() {
    let mut rig = Rig::new();
    let mut weapon = WeaponController::new(Some(rifle(FireMode::FullAuto).with_ammo(3, 10)));
    let mut out = WeaponOutput::default();
    weapon.request_equip_primary(&mut out);

    weapon.request_fire_pressed(&mut rig.ctx(), &mut out);
    tick(&mut weapon, &mut rig, &mut out);
    tick(&mut weapon, &mut rig, &mut out);
    assert_eq!(weapon.ammo_in_mag(), 0);

    tick(&mut weapon, &mut rig, &mut out); // auto-reload
    assert!(weapon.is_reloading());

    let mut resumed = WeaponOutput::default();
    tick(&mut weapon, &mut rig, &mut resumed);

    assert_eq!(
        resumed.notices,
        vec![StateNotice::ReloadFinished, StateNotice::FirePressed]
    );
    assert_eq!(resumed.shots.len(), 1);
    assert!(weapon.is_auto_firing());
    assert_eq!((weapon.ammo_in_mag(), weapon.reserve_ammo()), (2, 7));
}

#[test]
fn test_fire_on_empty_mag_triggers_reload() {
    let mut rig = Rig::new();
    let mut weapon = WeaponController::new(Some(rifle(FireMode::SemiAuto).with_ammo(1, 5)));
    let mut out = WeaponOutput::default();
    weapon.request_equip_primary(&mut out);

    weapon.request_fire_pressed(&mut rig.ctx(), &mut out);
    assert_eq!(weapon.ammo_in_mag(), 0);

    let mut press = WeaponOutput::default();
    weapon.request_fire_pressed(&mut rig.ctx(), &mut press);
    assert_eq!(press.notices, vec![StateNotice::ReloadStarted]);
    assert!(press.shots.is_empty());

    // Во время reload fire press — no-op
    let mut during = WeaponOutput::default();
    weapon.request_fire_pressed(&mut rig.ctx(), &mut during);
    assert!(during.is_empty());
}

#[test]
fn test_reload_preconditions() {
    let mut weapon = armed(FireMode::SemiAuto);
    let mut out = WeaponOutput::default();

    // Полный магазин
    assert!(!weapon.request_reload(&mut out));

    let mut empty_reserve = WeaponController::new(Some(rifle(FireMode::SemiAuto).with_ammo(30, 0)));
    empty_reserve.request_equip_primary(&mut out);
    assert!(!empty_reserve.can_reload());

    let unarmed = WeaponController::new(Some(rifle(FireMode::SemiAuto)));
    assert!(!unarmed.can_reload());
}

#[test]
fn test_unequip_clears_all_timers() {
    let mut rig = Rig::new();
    let mut weapon = armed(FireMode::FullAuto);
    let mut out = WeaponOutput::default();

    weapon.request_fire_pressed(&mut rig.ctx(), &mut out);
    assert!(weapon.has_pending_timers());

    let mut unequip = WeaponOutput::default();
    weapon.request_unequip(&mut unequip);

    assert_eq!(unequip.notices, vec![StateNotice::WeaponArmed(false)]);
    assert!(!weapon.has_pending_timers());
    assert!(!weapon.wants_to_fire());
    assert!(!weapon.is_reloading());
    assert!(weapon.current_weapon().is_none());
    assert!(weapon.visual().hidden);
    assert_eq!(weapon.visual().attached_socket, None);

    // Unarmed → повторный unequip no-op
    let mut again = WeaponOutput::default();
    weapon.request_unequip(&mut again);
    assert!(again.is_empty());
}

#[test]
fn test_cancel_fire_keeps_held_input() {
    let mut rig = Rig::new();
    let mut weapon = armed(FireMode::FullAuto);
    let mut out = WeaponOutput::default();

    weapon.request_fire_pressed(&mut rig.ctx(), &mut out);
    weapon.cancel_fire();

    assert!(!weapon.is_auto_firing());
    assert!(weapon.wants_to_fire());
}

#[test]
fn test_missing_projectile_class_still_spends_ammo() {
    let mut rig = Rig::new();
    let mut weapon = WeaponController::new(Some(rifle(FireMode::SemiAuto).with_projectile_class(None)));
    let mut out = WeaponOutput::default();
    weapon.request_equip_primary(&mut out);

    weapon.request_fire_pressed(&mut rig.ctx(), &mut out);
    assert_eq!(out.shots.len(), 1);
    assert_eq!(out.shots[0].projectile, None);
    assert_eq!(weapon.ammo_in_mag(), 29);

    // Fallback класс персонажа
    let fallback = PoolClass::new("projectile.rifle");
    let mut ctx = rig.ctx();
    ctx.fallback_class = Some(&fallback);
    weapon.request_fire_pressed(&mut ctx, &mut out);
    assert!(out.shots[1].projectile.is_some());
}

#[test]
fn test_spread_is_seeded() {
    let spread = |seed: u64| {
        let mut rig = Rig::new();
        rig.rng = ChaCha8Rng::seed_from_u64(seed);
        let mut weapon = WeaponController::new(Some(rifle(FireMode::SemiAuto).with_spread(3.0)));
        let mut out = WeaponOutput::default();
        weapon.request_equip_primary(&mut out);
        weapon.request_fire_pressed(&mut rig.ctx(), &mut out);
        out.shots[0].direction
    };

    assert_eq!(spread(1), spread(1));

    let straight = (Vec3::new(0.0, 0.0, -50.0) - WeaponData::rifle().muzzle_socket.unwrap().offset()).normalize();
    let angle = spread(1).angle_between(straight).to_degrees();
    assert!(angle <= 3.0 * 1.5);
}
