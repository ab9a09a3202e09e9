//! Unit tests для Projectile lifecycle

use super::*;
use crate::pool::{PoolBucketConfig, PoolClass, PoolStats};
use std::time::Duration;

fn rifle() -> PoolClass {
    PoolClass::new("projectile.rifle")
}

fn make_pool(settings: ProjectileSettings) -> ProjectilePool {
    let mut pool = ProjectilePool::new(PoolId(9), move |_class: &PoolClass| Some(Projectile::new(settings.clone())));
    pool.configure([PoolBucketConfig::new(rifle()).with_prewarm(2).with_max_count(4)]);
    pool.prewarm_all();
    pool
}

/// Acquire + bind (как делает оружие)
fn fire(pool: &mut ProjectilePool, owner: Entity) -> PoolHandle {
    let handle = pool.acquire(&rifle(), Transform::IDENTITY).unwrap();
    let pool_id = pool.id();
    let projectile = pool.get_mut(handle).unwrap();
    projectile.set_owner(owner);
    projectile.bind_pool(pool_id);
    handle
}

#[test]
fn test_launch_normalizes_direction() {
    let mut projectile = Projectile::new(ProjectileSettings::default());
    projectile.launch(&Transform::IDENTITY, Vec3::new(0.0, 0.0, -10.0), None);
    assert_eq!(projectile.velocity(), Vec3::new(0.0, 0.0, -30.0));

    projectile.launch(&Transform::IDENTITY, Vec3::X, Some(5.0));
    assert_eq!(projectile.velocity(), Vec3::new(5.0, 0.0, 0.0));
}

#[test]
fn test_degenerate_direction_falls_back_to_forward() {
    let mut projectile = Projectile::new(ProjectileSettings::default());
    let transform = Transform::IDENTITY.looking_to(Vec3::X, Vec3::Y);

    projectile.launch(&transform, Vec3::ZERO, Some(2.0));
    assert!((projectile.velocity() - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
}

#[test]
fn test_return_to_pool_is_idempotent() {
    let mut pool = make_pool(ProjectileSettings::default());
    let handle = fire(&mut pool, Entity::from_raw(1));

    assert!(return_to_pool(&mut pool, handle));
    assert!(!return_to_pool(&mut pool, handle));
    assert_eq!(pool.stats(&rifle()), PoolStats { total: 2, active: 0, inactive: 2 });
}

#[test]
fn test_unbound_projectile_self_disables() {
    let mut pool = make_pool(ProjectileSettings::default());
    let handle = pool.acquire(&rifle(), Transform::IDENTITY).unwrap();

    assert!(return_to_pool(&mut pool, handle));
    assert!(pool.activity(handle).unwrap().is_dormant());
    // Не освобождён — пул о возврате не знает
    assert!(pool.is_active(handle));
}

#[test]
fn test_contact_ignores_self_and_owner() {
    let owner = Entity::from_raw(1);
    let mut pool = make_pool(ProjectileSettings::default());
    let handle = fire(&mut pool, owner);

    assert!(handle_contact(&mut pool, handle, CollisionOther::Projectile(handle), Vec3::ZERO).is_none());
    assert!(handle_contact(&mut pool, handle, CollisionOther::Actor(owner), Vec3::ZERO).is_none());
    assert!(pool.is_active(handle));

    let target = Entity::from_raw(2);
    let impact = handle_contact(&mut pool, handle, CollisionOther::Actor(target), Vec3::ONE).unwrap();
    assert_eq!(impact.shooter, Some(owner));
    assert_eq!(impact.target, Some(target));
    assert!(!pool.is_active(handle));

    // Второй контакт в том же tick — уже возвращён
    assert!(handle_contact(&mut pool, handle, CollisionOther::World, Vec3::ZERO).is_none());
}

#[test]
fn test_owner_hit_counts_when_ignore_disabled() {
    let owner = Entity::from_raw(1);
    let settings = ProjectileSettings {
        ignore_owner: false,
        ..Default::default()
    };
    let mut pool = make_pool(settings);
    let handle = fire(&mut pool, owner);

    assert!(handle_contact(&mut pool, handle, CollisionOther::Actor(owner), Vec3::ZERO).is_some());
}

#[test]
fn test_expiry_timer_armed_on_acquire() {
    let mut pool = make_pool(ProjectileSettings::default());
    let handle = fire(&mut pool, Entity::from_raw(1));

    let projectile = pool.get_mut(handle).unwrap();
    assert!(projectile.has_life_timer());
    assert!(!projectile.tick_life(Duration::from_secs_f32(2.0)));
    assert!(projectile.tick_life(Duration::from_secs_f32(0.6)));

    assert!(return_to_pool(&mut pool, handle));
    assert!(!pool.get(handle).unwrap().has_life_timer());
}

#[test]
fn test_no_expiry_when_life_is_zero() {
    let settings = ProjectileSettings {
        life_seconds: 0.0,
        ..Default::default()
    };
    let mut pool = make_pool(settings);
    let handle = fire(&mut pool, Entity::from_raw(1));

    assert!(!pool.get(handle).unwrap().has_life_timer());
}

#[test]
fn test_reuse_clears_previous_flight() {
    let mut pool = make_pool(ProjectileSettings::default());
    let handle = fire(&mut pool, Entity::from_raw(1));
    {
        let projectile = pool.get_mut(handle).unwrap();
        projectile.launch(&Transform::IDENTITY, Vec3::NEG_Z, None);
        projectile.set_damage(20.0);
        projectile.ignore_object_type(CollisionChannel::Pawn);
    }
    assert!(return_to_pool(&mut pool, handle));

    // Пул отдаёт последний возвращённый экземпляр
    let again = pool.acquire(&rifle(), Transform::IDENTITY).unwrap();
    assert_eq!(again, handle);

    let projectile = pool.get(again).unwrap();
    assert!(!projectile.is_returning());
    assert_eq!(projectile.velocity(), Vec3::ZERO);
    assert_eq!(projectile.damage(), 0.0);
    assert!(!projectile.query_filter().ignore_object_types.contains(CollisionChannel::Pawn));
}

#[test]
fn test_pool_factory_uses_per_class_settings_from_config() {
    let pistol = PoolClass::new("projectile.pistol");
    let mut config = crate::config::GameplayConfig::default();
    config.pool_buckets.push(PoolBucketConfig::new(pistol.clone()).with_prewarm(1));
    config.projectiles.insert(
        pistol.clone(),
        ProjectileSettings {
            default_speed: 45.0,
            ..ProjectileSettings::default()
        },
    );

    let mut pool = crate::build_projectile_pool(&config);

    let fast = pool.acquire(&pistol, Transform::IDENTITY).unwrap();
    assert_eq!(pool.get(fast).unwrap().settings.default_speed, 45.0);

    // Класс без записи → дефолтные настройки
    let plain = pool.acquire(&rifle(), Transform::IDENTITY).unwrap();
    assert_eq!(pool.get(plain).unwrap().settings, ProjectileSettings::default());
}
