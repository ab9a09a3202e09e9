//! Ghostline Simulation Core
//!
//! Gameplay core TPS на Bevy 0.16 (headless ECS):
//! - `tags` — arbitration core (state tags → block/cancel)
//! - `pool` — object pool с generational handles
//! - `projectile` — pooled снаряды
//! - `weapon` — ammo / fire mode / equip
//! - `scanner` — hack / interact target scanners
//! - `character` — боевой персонаж, связывает всё вместе
//!
//! Рендер, анимация, физика — внешние collaborators (contracts only).

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod character;
pub mod config;
pub mod logger;
pub mod pool;
pub mod projectile;
pub mod scanner;
pub mod tags;
pub mod weapon;

// Re-exports для удобства
pub use character::{
    CharacterBundle, CharacterPlugin, CombatAction, CombatIntent, HackExecuted, InteractExecuted, WeaponFired,
};
pub use config::{ConfigError, GameplayConfig};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, log_with_level, set_log_level, set_logger,
    set_logger_if_needed, LogLevel, LogPrinter,
};
pub use pool::{ObjectPool, PoolBucketConfig, PoolClass, PoolHandle, PoolId, PoolStats, Poolable};
pub use projectile::{Projectile, ProjectileImpact, ProjectilePlugin, ProjectilePool, ProjectileSettings};
pub use scanner::{HackTargetChanged, Hackable, InteractTargetChanged, Interactable, ScannerPlugin};
pub use tags::{GameplayTag, GameplayTagState, TagRelationshipMap};
pub use weapon::{FireMode, WeaponController, WeaponData, WeaponId};

/// Fixed tick симуляции
pub const SIMULATION_HZ: f64 = 60.0;

/// Pool id снарядов (weak back-reference в `Projectile`)
pub const PROJECTILE_POOL_ID: PoolId = PoolId(1);

/// Порядок gameplay систем внутри FixedUpdate
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameplaySet {
    /// Intents → gating → контроллеры
    Input,
    /// Таймеры оружия, aim, focus
    Weapons,
    /// Контакты, движение, expiry снарядов
    Projectiles,
    /// Hack / interact samples
    Scanners,
}

/// Главный plugin (объединяет все подсистемы)
#[derive(Default)]
pub struct GhostlinePlugin {
    pub config: GameplayConfig,
}

impl GhostlinePlugin {
    pub fn new(config: GameplayConfig) -> Self {
        Self { config }
    }
}

impl Plugin for GhostlinePlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для всех таймеров
            .insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ))
            // Seed из create_headless_app не перетираем
            .init_resource::<DeterministicRng>()
            .insert_resource(self.config.clone())
            .insert_resource(build_projectile_pool(&self.config))
            .configure_sets(
                FixedUpdate,
                (
                    GameplaySet::Input,
                    GameplaySet::Weapons,
                    GameplaySet::Projectiles,
                    GameplaySet::Scanners,
                )
                    .chain(),
            )
            .add_plugins((CharacterPlugin, ProjectilePlugin, ScannerPlugin));
    }
}

/// Пул снарядов по конфигу: configure + prewarm
pub fn build_projectile_pool(config: &GameplayConfig) -> ProjectilePool {
    let data = config.clone();
    let mut pool = ProjectilePool::new(PROJECTILE_POOL_ID, move |class: &PoolClass| {
        Some(Projectile::new(data.projectile_settings(class)))
    });

    pool.configure(config.pool_buckets.iter().cloned());
    pool.prewarm_all();
    pool
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время шагает ровно на один fixed tick за `app.update()`.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / SIMULATION_HZ,
        )));

    app
}

/// Snapshot компонентов `T` для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}

/// Snapshot активных снарядов: handle + transform + velocity
pub fn projectile_snapshot(pool: &ProjectilePool) -> Vec<u8> {
    let mut snapshot = Vec::new();

    for handle in pool.active_handles() {
        let (Some(projectile), Some(transform)) = (pool.get(handle), pool.transform(handle)) else {
            continue;
        };
        snapshot.extend_from_slice(
            format!("{:?}:{:?}:{:?};", handle, transform.translation, projectile.velocity()).as_bytes(),
        );
    }

    snapshot
}
