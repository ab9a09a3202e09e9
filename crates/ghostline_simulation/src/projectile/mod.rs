//! Projectile domain — pooled снаряды
//!
//! Lifecycle: Dormant (в пуле) → Active (launched) → Dormant.
//! Все termination triggers (hit, overlap, expiry) сходятся в `return_to_pool`.
//!
//! Снаряд живёт внутри `ObjectPool<Projectile>`; ссылка на пул — только
//! `PoolId` (weak), проверяется при каждом return.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::pool::{ObjectPool, PoolHandle, PoolId, Poolable};
use crate::scanner::spatial::{ChannelMask, CollisionChannel, QueryFilter};

pub mod systems;

#[cfg(test)]
mod projectile_tests;

pub use systems::{expire_projectiles, move_projectiles, process_projectile_collisions};

/// Пул снарядов (Resource)
pub type ProjectilePool = ObjectPool<Projectile>;

/// Author-time параметры класса снаряда (метры, секунды)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSettings {
    #[serde(default = "default_speed")]
    pub default_speed: f32,
    /// <= 0 → без expiry timer
    #[serde(default = "default_life_seconds")]
    pub life_seconds: f32,
    #[serde(default = "default_ignore_owner")]
    pub ignore_owner: bool,
    #[serde(default)]
    pub gravity_scale: f32,
}

fn default_speed() -> f32 {
    30.0
}

fn default_life_seconds() -> f32 {
    2.5
}

fn default_ignore_owner() -> bool {
    true
}

impl Default for ProjectileSettings {
    fn default() -> Self {
        Self {
            default_speed: default_speed(),
            life_seconds: default_life_seconds(),
            ignore_owner: default_ignore_owner(),
            gravity_scale: 0.0,
        }
    }
}

/// С чем столкнулся снаряд
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionOther {
    Actor(Entity),
    Projectile(PoolHandle),
    /// Статическая геометрия без entity
    World,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    Hit,
    OverlapBegin,
}

/// Event: физика сообщает о контакте снаряда (внешний collaborator)
#[derive(Event, Debug, Clone)]
pub struct ProjectileCollision {
    pub projectile: PoolHandle,
    pub other: CollisionOther,
    pub kind: CollisionKind,
    pub point: Vec3,
}

/// Event: снаряд попал и вернулся в пул (для downstream damage систем)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ProjectileImpact {
    pub shooter: Option<Entity>,
    pub target: Option<Entity>,
    pub point: Vec3,
    pub damage: f32,
}

/// Pooled снаряд
#[derive(Debug, Clone)]
pub struct Projectile {
    pub settings: ProjectileSettings,
    owner: Option<Entity>,
    owning_pool: Option<PoolId>,
    ignored_actor: Option<Entity>,
    ignored_object_types: ChannelMask,
    is_returning: bool,
    velocity: Vec3,
    gravity_scale: f32,
    damage: f32,
    life_timer: Option<Timer>,
}

impl Projectile {
    pub fn new(settings: ProjectileSettings) -> Self {
        Self {
            settings,
            owner: None,
            owning_pool: None,
            ignored_actor: None,
            ignored_object_types: ChannelMask::NONE,
            is_returning: false,
            velocity: Vec3::ZERO,
            gravity_scale: 0.0,
            damage: 0.0,
            life_timer: None,
        }
    }

    pub fn owner(&self) -> Option<Entity> {
        self.owner
    }

    pub fn owning_pool(&self) -> Option<PoolId> {
        self.owning_pool
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn gravity_scale(&self) -> f32 {
        self.gravity_scale
    }

    pub fn damage(&self) -> f32 {
        self.damage
    }

    pub fn is_returning(&self) -> bool {
        self.is_returning
    }

    pub fn has_life_timer(&self) -> bool {
        self.life_timer.is_some()
    }

    pub fn set_owner(&mut self, owner: Entity) {
        self.owner = Some(owner);
        self.ignored_actor = self.settings.ignore_owner.then_some(owner);
    }

    pub fn bind_pool(&mut self, pool: PoolId) {
        self.owning_pool = Some(pool);
    }

    pub fn set_damage(&mut self, damage: f32) {
        self.damage = damage;
    }

    /// Канал стрелка: снаряд не отвечает на коллайдеры этого object type
    pub fn ignore_object_type(&mut self, channel: CollisionChannel) {
        self.ignored_object_types = self.ignored_object_types.with(channel);
    }

    /// Velocity = normalize(direction) × (override или default speed)
    ///
    /// Вырожденное направление → forward самого снаряда.
    pub fn launch(&mut self, transform: &Transform, direction: Vec3, speed_override: Option<f32>) {
        let direction = if !direction.is_finite() || direction.length_squared() < 1e-8 {
            *transform.forward()
        } else {
            direction.normalize()
        };

        let speed = speed_override
            .filter(|speed| *speed > 0.0)
            .unwrap_or(self.settings.default_speed);

        self.velocity = direction * speed;
        self.gravity_scale = self.settings.gravity_scale;
    }

    /// Self-collision и (если настроено) owner-collision не считаются
    pub fn should_ignore(&self, self_handle: PoolHandle, other: CollisionOther) -> bool {
        match other {
            CollisionOther::Projectile(handle) => handle == self_handle,
            CollisionOther::Actor(entity) => self.ignored_actor == Some(entity),
            CollisionOther::World => false,
        }
    }

    /// Фильтр для sweep-теста движения
    pub fn query_filter(&self) -> QueryFilter {
        let filter =
            QueryFilter::new(CollisionChannel::Projectile).ignore_object_types(self.ignored_object_types);

        match self.ignored_actor {
            Some(owner) => filter.exclude(owner),
            None => filter,
        }
    }

    /// true когда expiry timer только что истёк
    pub fn tick_life(&mut self, delta: Duration) -> bool {
        match self.life_timer.as_mut() {
            Some(timer) => timer.tick(delta).just_finished(),
            None => false,
        }
    }

    /// Один шаг интегрирования; возвращает смещение
    pub fn integrate(&mut self, delta_secs: f32) -> Vec3 {
        self.velocity.y -= 9.81 * self.gravity_scale * delta_secs;
        self.velocity * delta_secs
    }
}

impl Poolable for Projectile {
    fn on_acquire_from_pool(&mut self) {
        self.is_returning = false;
        self.velocity = Vec3::ZERO;
        self.gravity_scale = 0.0;
        self.damage = 0.0;
        self.ignored_object_types = ChannelMask::NONE;
        self.ignored_actor = match self.owner {
            Some(owner) if self.settings.ignore_owner => Some(owner),
            _ => None,
        };

        self.life_timer = (self.settings.life_seconds > 0.0)
            .then(|| Timer::from_seconds(self.settings.life_seconds, TimerMode::Once));
    }

    fn on_release_to_pool(&mut self) {
        self.life_timer = None;
        self.velocity = Vec3::ZERO;
    }
}

/// Idempotent return (guard `is_returning`)
///
/// Пул совпадает с `owning_pool` → `release`. Иначе снаряд сам себя гасит
/// (dormant), чтобы не оставить активный экземпляр.
pub fn return_to_pool(pool: &mut ProjectilePool, handle: PoolHandle) -> bool {
    let pool_id = pool.id();

    let Some(projectile) = pool.get_mut(handle) else {
        return false;
    };

    if projectile.is_returning {
        return false;
    }

    projectile.is_returning = true;
    projectile.life_timer = None;

    if projectile.owning_pool == Some(pool_id) {
        return pool.release(handle);
    }

    projectile.velocity = Vec3::ZERO;
    crate::logger::log_warning(&format!("Projectile {:?}: no owning pool bound, self-disabling", handle));
    pool.set_dormant(handle)
}

/// Hit / overlap-begin: фильтр self/owner → return. None если контакт проигнорирован.
pub fn handle_contact(pool: &mut ProjectilePool, handle: PoolHandle, other: CollisionOther, point: Vec3) -> Option<ProjectileImpact> {
    let projectile = pool.get(handle)?;
    if projectile.should_ignore(handle, other) || projectile.is_returning {
        return None;
    }

    let impact = ProjectileImpact {
        shooter: projectile.owner,
        target: match other {
            CollisionOther::Actor(entity) => Some(entity),
            _ => None,
        },
        point,
        damage: projectile.damage,
    };

    return_to_pool(pool, handle).then_some(impact)
}

/// Projectile Plugin
///
/// Порядок в FixedUpdate:
/// 1. process_projectile_collisions — внешние контакты
/// 2. move_projectiles — интегрирование + sweep против коллайдеров
/// 3. expire_projectiles — life timer
pub struct ProjectilePlugin;

impl Plugin for ProjectilePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ProjectileCollision>()
            .add_event::<ProjectileImpact>();

        app.add_systems(
            FixedUpdate,
            (process_projectile_collisions, move_projectiles, expire_projectiles)
                .chain()
                .in_set(crate::GameplaySet::Projectiles),
        );
    }
}
