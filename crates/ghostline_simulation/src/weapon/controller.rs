//! WeaponController — ammo, fire mode, equip state
//!
//! # Архитектура
//!
//! Контроллер не знает про arbitration core. Каждая операция пишет
//! `StateNotice` в `WeaponOutput`; character aggregate применяет их к
//! `GameplayTagState` сразу после вызова (тот же tick, синхронно).
//!
//! Таймеры (auto-fire cadence, reload completion) — `Option<Timer>` внутри
//! компонента, тикаются через `tick`. Cancel = `None`.
//!
//! # Flow выстрела
//!
//! fire_pressed → fire_once → aim point → direction от дула → ammo -1 →
//! Pool.acquire → Projectile.launch

use bevy::prelude::*;
use rand::{Rng, RngCore};
use std::time::Duration;

use super::data::{FireMode, WeaponData};
use crate::pool::{PoolClass, PoolHandle};
use crate::projectile::ProjectilePool;
use crate::scanner::spatial::CollisionChannel;
use crate::tags::StateNotice;

/// Stand-in для animation-driven завершения reload
pub const RELOAD_COMPLETION_SECS: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EquipState {
    #[default]
    Unarmed,
    Armed,
}

/// Состояние визуала оружия (mesh attach/detach — fire-and-forget для рендера)
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponVisual {
    pub mesh: Option<String>,
    pub attached_socket: Option<String>,
    pub hidden: bool,
}

impl Default for WeaponVisual {
    fn default() -> Self {
        Self {
            mesh: None,
            attached_socket: None,
            hidden: true,
        }
    }
}

/// View/aim service управляющего агента
pub trait AimProvider {
    /// Точка попадания forward-луча; None если луч ни во что не попал
    fn aim_hit_point(&self, range: f32, channel: CollisionChannel) -> Option<Vec3>;

    /// Камера (или pose владельца)
    fn view_point(&self) -> Transform;
}

/// Всё, что нужно для выстрела (заимствуется на время одного вызова)
pub struct FireContext<'a> {
    pub owner: Entity,
    /// Object type стрелка — снаряд на него не реагирует
    pub owner_channel: Option<CollisionChannel>,
    /// World transform оружия (origin для muzzle socket)
    pub origin: Transform,
    pub aim: &'a dyn AimProvider,
    pub pool: Option<&'a mut ProjectilePool>,
    pub fallback_class: Option<&'a PoolClass>,
    pub rng: &'a mut dyn RngCore,
}

/// Один выстрел (projectile None → пул не выдал экземпляр)
#[derive(Debug, Clone, PartialEq)]
pub struct ShotFired {
    pub projectile: Option<PoolHandle>,
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Результат операций контроллера за один вызов
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeaponOutput {
    pub notices: Vec<StateNotice>,
    pub shots: Vec<ShotFired>,
}

impl WeaponOutput {
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty() && self.shots.is_empty()
    }
}

/// Component: оружие персонажа
#[derive(Component, Debug, Clone, Default)]
pub struct WeaponController {
    primary: Option<WeaponData>,
    current: Option<WeaponData>,
    equip_state: EquipState,
    ammo_in_mag: u32,
    reserve_ammo: u32,
    is_reloading: bool,
    wants_to_fire: bool,
    auto_fire_timer: Option<Timer>,
    reload_timer: Option<Timer>,
    visual: WeaponVisual,
}

impl WeaponController {
    pub fn new(primary: Option<WeaponData>) -> Self {
        Self {
            primary,
            ..Default::default()
        }
    }

    pub fn equip_state(&self) -> EquipState {
        self.equip_state
    }

    pub fn is_armed(&self) -> bool {
        self.equip_state == EquipState::Armed
    }

    pub fn current_weapon(&self) -> Option<&WeaponData> {
        self.current.as_ref()
    }

    pub fn ammo_in_mag(&self) -> u32 {
        self.ammo_in_mag
    }

    pub fn reserve_ammo(&self) -> u32 {
        self.reserve_ammo
    }

    pub fn is_reloading(&self) -> bool {
        self.is_reloading
    }

    pub fn wants_to_fire(&self) -> bool {
        self.wants_to_fire
    }

    pub fn is_auto_firing(&self) -> bool {
        self.auto_fire_timer.is_some()
    }

    pub fn has_pending_timers(&self) -> bool {
        self.auto_fire_timer.is_some() || self.reload_timer.is_some()
    }

    pub fn visual(&self) -> &WeaponVisual {
        &self.visual
    }

    pub fn can_fire(&self) -> bool {
        self.is_armed() && self.current.is_some() && !self.is_reloading && self.ammo_in_mag > 0
    }

    pub fn can_reload(&self) -> bool {
        let Some(data) = self.current.as_ref() else {
            return false;
        };

        self.is_armed() && !self.is_reloading && self.reserve_ammo > 0 && self.ammo_in_mag < data.mag_capacity
    }

    /// No-op если уже Armed или нет primary weapon data
    pub fn request_equip_primary(&mut self, out: &mut WeaponOutput) -> bool {
        self.try_equip(out)
    }

    fn try_equip(&mut self, out: &mut WeaponOutput) -> bool {
        if self.is_armed() {
            return true;
        }

        let Some(data) = self.primary.clone() else {
            return false;
        };

        self.ammo_in_mag = data.mag_capacity;
        self.reserve_ammo = data.max_reserve_ammo;
        self.visual = WeaponVisual {
            mesh: data.mesh.clone(),
            attached_socket: Some(data.attach_socket.clone()),
            hidden: false,
        };

        crate::logger::log(&format!(
            "🔫 Equipped {} ({}/{})",
            data.id, self.ammo_in_mag, self.reserve_ammo
        ));

        self.current = Some(data);
        self.equip_state = EquipState::Armed;
        out.notices.push(StateNotice::WeaponArmed(true));
        true
    }

    /// Стоп всего + очистка всех таймеров, визуал снят и спрятан
    pub fn request_unequip(&mut self, out: &mut WeaponOutput) {
        if !self.is_armed() {
            return;
        }

        self.stop_auto_fire();
        self.auto_fire_timer = None;
        self.reload_timer = None;

        self.wants_to_fire = false;
        self.is_reloading = false;

        self.visual = WeaponVisual::default();

        if let Some(data) = self.current.take() {
            crate::logger::log(&format!("🔫 Unequipped {}", data.id));
        }
        self.equip_state = EquipState::Unarmed;
        out.notices.push(StateNotice::WeaponArmed(false));
    }

    /// Нажатие fire
    ///
    /// Unarmed → это триггер экипировки, а не выстрела.
    pub fn request_fire_pressed(&mut self, ctx: &mut FireContext, out: &mut WeaponOutput) {
        self.wants_to_fire = true;

        if !self.is_armed() {
            self.try_equip(out);
            return;
        }

        if self.is_reloading {
            return;
        }

        if self.ammo_in_mag == 0 {
            self.request_reload(out);
            return;
        }

        out.notices.push(StateNotice::FirePressed);

        let Some(fire_mode) = self.current.as_ref().map(|data| data.fire_mode) else {
            return;
        };

        match fire_mode {
            FireMode::SemiAuto => {
                self.fire_once(ctx, out);
            }
            FireMode::FullAuto => self.start_auto_fire(ctx, out),
        }
    }

    /// Fire input удерживается, но само нажатие заблокировано (Block.Fire)
    pub fn note_fire_held(&mut self) {
        self.wants_to_fire = true;
    }

    pub fn request_fire_released(&mut self, out: &mut WeaponOutput) {
        self.wants_to_fire = false;
        self.stop_auto_fire();
        out.notices.push(StateNotice::FireReleased);
    }

    /// Cancel handler для Firing: только останавливает cadence.
    /// `wants_to_fire` не трогаем — удержанный fire возобновит огонь после reload.
    pub fn cancel_fire(&mut self) {
        if self.auto_fire_timer.is_some() {
            crate::logger::log("🔫 Auto-fire cancelled");
        }
        self.stop_auto_fire();
    }

    fn start_auto_fire(&mut self, ctx: &mut FireContext, out: &mut WeaponOutput) {
        if !self.can_fire() {
            return;
        }

        self.fire_once(ctx, out);

        let Some(interval) = self.current.as_ref().map(WeaponData::fire_interval_secs) else {
            return;
        };
        self.auto_fire_timer = Some(Timer::from_seconds(interval, TimerMode::Repeating));
    }

    fn stop_auto_fire(&mut self) {
        self.auto_fire_timer = None;
    }

    /// Один выстрел (тело auto-fire тика и semi-auto)
    ///
    /// Невалидно → стоп auto-fire; пустой магазин → auto-reload (без gating).
    pub fn fire_once(&mut self, ctx: &mut FireContext, out: &mut WeaponOutput) -> bool {
        if !self.can_fire() {
            self.stop_auto_fire();

            if self.is_armed() && self.ammo_in_mag == 0 {
                self.request_reload(out);
            }
            return false;
        }

        let Some(data) = self.current.as_ref() else {
            return false;
        };

        let aim_point = ctx
            .aim
            .aim_hit_point(data.max_range, CollisionChannel::Visibility)
            .unwrap_or_else(|| {
                let view = ctx.aim.view_point();
                view.translation + *view.forward() * data.max_range
            });

        let muzzle = match &data.muzzle_socket {
            Some(socket) => ctx.origin.transform_point(socket.offset()),
            None => ctx.origin.translation,
        };

        let direction = apply_spread((aim_point - muzzle).normalize_or_zero(), data.spread_degrees, ctx.rng);

        self.ammo_in_mag -= 1;

        let spawn_rotation = if direction == Vec3::ZERO {
            ctx.origin.rotation
        } else {
            Transform::IDENTITY.looking_to(direction, Vec3::Y).rotation
        };
        let spawn = Transform::from_translation(muzzle).with_rotation(spawn_rotation);

        let projectile = spawn_and_launch_projectile(data, direction, spawn, ctx);
        out.shots.push(ShotFired {
            projectile,
            origin: muzzle,
            direction,
        });
        true
    }

    pub fn request_reload(&mut self, out: &mut WeaponOutput) -> bool {
        if !self.can_reload() {
            return false;
        }

        self.begin_reload(out);
        true
    }

    fn begin_reload(&mut self, out: &mut WeaponOutput) {
        self.is_reloading = true;
        out.notices.push(StateNotice::ReloadStarted);
        self.stop_auto_fire();

        self.reload_timer = Some(Timer::from_seconds(RELOAD_COMPLETION_SECS, TimerMode::Once));
        crate::logger::log(&format!(
            "🔄 Reload started ({}/{})",
            self.ammo_in_mag, self.reserve_ammo
        ));
    }

    /// Перенос `min(capacity - mag, reserve)`; удержанный fire + FullAuto → resume
    pub fn finish_reload(&mut self, ctx: &mut FireContext, out: &mut WeaponOutput) {
        self.reload_timer = None;

        let Some(data) = self.current.as_ref() else {
            self.is_reloading = false;
            return;
        };

        let load = data.mag_capacity.saturating_sub(self.ammo_in_mag).min(self.reserve_ammo);
        let resume = self.wants_to_fire && data.fire_mode == FireMode::FullAuto;

        self.ammo_in_mag += load;
        self.reserve_ammo -= load;
        self.is_reloading = false;
        out.notices.push(StateNotice::ReloadFinished);

        crate::logger::log(&format!(
            "🔄 Reload finished (+{} → {}/{})",
            load, self.ammo_in_mag, self.reserve_ammo
        ));

        if resume && self.can_fire() {
            out.notices.push(StateNotice::FirePressed);
            self.start_auto_fire(ctx, out);
        }
    }

    /// Тик таймеров (FixedUpdate)
    ///
    /// Сначала тикаются только таймеры, существовавшие до вызова: таймер,
    /// взведённый в этом же tick (auto-reload, resume после reload), ждёт следующего.
    pub fn tick(&mut self, delta: Duration, ctx: &mut FireContext, out: &mut WeaponOutput) {
        let fire_due = self.auto_fire_timer.as_mut().map_or(0, |timer| {
            timer.tick(delta);
            timer.times_finished_this_tick()
        });

        let reload_done = self
            .reload_timer
            .as_mut()
            .is_some_and(|timer| timer.tick(delta).just_finished());

        for _ in 0..fire_due {
            if self.auto_fire_timer.is_none() {
                break;
            }
            self.fire_once(ctx, out);
        }

        if reload_done {
            self.finish_reload(ctx, out);
        }
    }

    /// Teardown владельца: все таймеры и флаги сброшены, без notices
    pub fn teardown(&mut self) {
        self.auto_fire_timer = None;
        self.reload_timer = None;
        self.wants_to_fire = false;
        self.is_reloading = false;
    }
}

/// Acquire из пула + owner/pool back-reference + collision ignore + launch
fn spawn_and_launch_projectile(
    data: &WeaponData,
    direction: Vec3,
    spawn: Transform,
    ctx: &mut FireContext,
) -> Option<PoolHandle> {
    let class = data.projectile_class.as_ref().or(ctx.fallback_class)?;
    let pool = ctx.pool.as_deref_mut()?;

    let handle = pool.acquire(class, spawn)?;
    let pool_id = pool.id();

    let projectile = pool.get_mut(handle)?;
    projectile.set_owner(ctx.owner);
    projectile.bind_pool(pool_id);
    if let Some(channel) = ctx.owner_channel {
        projectile.ignore_object_type(channel);
    }
    projectile.set_damage(data.damage);
    projectile.launch(&spawn, direction, None);

    Some(handle)
}

/// Случайное отклонение в конусе `spread_degrees` (yaw/pitch независимо)
fn apply_spread<R: RngCore + ?Sized>(direction: Vec3, spread_degrees: f32, rng: &mut R) -> Vec3 {
    if spread_degrees <= 0.0 || direction == Vec3::ZERO {
        return direction;
    }

    let half_angle = spread_degrees.to_radians();
    let yaw = rng.gen_range(-half_angle..=half_angle);
    let pitch = rng.gen_range(-half_angle..=half_angle);

    let basis = Quat::from_rotation_arc(Vec3::NEG_Z, direction);
    (basis * Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0) * Vec3::NEG_Z).normalize()
}
