//! ObjectPool — per-class buckets переиспользуемых экземпляров
//!
//! # Инварианты (после каждого acquire/release/prewarm)
//!
//! - `active(C) ∩ inactive(C) = ∅`
//! - `|active(C)| + |inactive(C)| ≤ max_count(C)`
//! - каждый выданный handle есть в reverse lookup ровно один раз (до destroy)
//!
//! Пул ничего не знает о позициях кроме `spawn_transform` на acquire.
//! Stale handle в `inactive` (экземпляр уничтожен снаружи) выкидывается
//! лениво в pop-цикле acquire.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use super::arena::{Arena, PoolHandle};

/// Ключ bucket'а (класс сущности: "projectile.rifle", "projectile.pistol")
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolClass(pub String);

impl PoolClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PoolClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolClass({})", self.0)
    }
}

impl fmt::Display for PoolClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Идентичность пула (weak back-reference для экземпляров)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(pub u32);

/// Author-time конфиг bucket'а
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolBucketConfig {
    pub class: PoolClass,
    #[serde(default = "default_prewarm_count")]
    pub prewarm_count: u32,
    #[serde(default = "default_allow_expand")]
    pub allow_expand: bool,
    #[serde(default = "default_expand_step")]
    pub expand_step: u32,
    #[serde(default = "default_max_count")]
    pub max_count: u32,
}

fn default_prewarm_count() -> u32 {
    10
}

fn default_allow_expand() -> bool {
    true
}

fn default_expand_step() -> u32 {
    5
}

fn default_max_count() -> u32 {
    200
}

impl PoolBucketConfig {
    pub fn new(class: PoolClass) -> Self {
        Self {
            class,
            prewarm_count: default_prewarm_count(),
            allow_expand: default_allow_expand(),
            expand_step: default_expand_step(),
            max_count: default_max_count(),
        }
    }

    pub fn with_prewarm(mut self, count: u32) -> Self {
        self.prewarm_count = count;
        self
    }

    pub fn with_expand(mut self, allow: bool, step: u32) -> Self {
        self.allow_expand = allow;
        self.expand_step = step;
        self
    }

    pub fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = max_count;
        self
    }
}

/// Runtime bucket: stack-like `inactive` + множество `active`
#[derive(Debug, Default, Clone)]
struct PoolBucketRuntime {
    inactive: Vec<PoolHandle>,
    active: BTreeSet<PoolHandle>,
}

impl PoolBucketRuntime {
    /// Считает stale handle'ы тоже (консервативно: headroom не завышается)
    fn total(&self) -> usize {
        self.inactive.len() + self.active.len()
    }
}

/// Dormant/active флаги экземпляра
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolActivity {
    pub hidden: bool,
    pub collision_enabled: bool,
    pub tick_enabled: bool,
}

impl PoolActivity {
    pub fn dormant() -> Self {
        Self {
            hidden: true,
            collision_enabled: false,
            tick_enabled: false,
        }
    }

    pub fn active() -> Self {
        Self {
            hidden: false,
            collision_enabled: true,
            tick_enabled: true,
        }
    }

    pub fn is_dormant(&self) -> bool {
        *self == Self::dormant()
    }
}

/// Read-only статистика bucket'а
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
}

/// Pool hooks экземпляра
///
/// `on_acquire_from_pool` вызывается на каждом reuse и обязан полностью
/// сбросить transient state прошлого использования.
/// `on_release_to_pool` — экземпляр гасит свои таймеры и движение.
pub trait Poolable {
    fn on_acquire_from_pool(&mut self);
    fn on_release_to_pool(&mut self);
}

/// Экземпляр + то, что пул о нём знает
#[derive(Debug)]
struct PooledInstance<T> {
    instance: T,
    transform: Transform,
    activity: PoolActivity,
}

/// Фабрика экземпляров (None = spawn failure, prewarm/expand останавливаются)
pub type PoolFactory<T> = Box<dyn Fn(&PoolClass) -> Option<T> + Send + Sync>;

/// Пул экземпляров `T` (Resource — единственный shared mutable ресурс)
#[derive(Resource)]
pub struct ObjectPool<T: Poolable + Send + Sync + 'static> {
    id: PoolId,
    factory: PoolFactory<T>,
    config_map: HashMap<PoolClass, PoolBucketConfig>,
    runtime_map: BTreeMap<PoolClass, PoolBucketRuntime>,
    reverse_lookup: HashMap<PoolHandle, PoolClass>,
    instances: Arena<PooledInstance<T>>,
}

impl<T: Poolable + Send + Sync + 'static> ObjectPool<T> {
    pub fn new(id: PoolId, factory: impl Fn(&PoolClass) -> Option<T> + Send + Sync + 'static) -> Self {
        Self {
            id,
            factory: Box::new(factory),
            config_map: HashMap::new(),
            runtime_map: BTreeMap::new(),
            reverse_lookup: HashMap::new(),
            instances: Arena::new(),
        }
    }

    pub fn id(&self) -> PoolId {
        self.id
    }

    /// Заменяет конфиг; существующие экземпляры и runtime bucket'ы сохраняются
    ///
    /// Дубликат класса → последняя запись побеждает.
    pub fn configure(&mut self, buckets: impl IntoIterator<Item = PoolBucketConfig>) {
        self.config_map.clear();

        for config in buckets {
            self.runtime_map.entry(config.class.clone()).or_default();
            self.config_map.insert(config.class.clone(), config);
        }

        crate::logger::log(&format!(
            "🎱 ObjectPool {:?} configured: {} bucket(s)",
            self.id,
            self.config_map.len()
        ));
    }

    /// Prewarm всех bucket'ов по их `prewarm_count` (в порядке класса)
    pub fn prewarm_all(&mut self) {
        let mut plan: Vec<(PoolClass, u32)> = self
            .config_map
            .values()
            .map(|config| (config.class.clone(), config.prewarm_count))
            .collect();
        plan.sort();

        for (class, count) in plan {
            self.prewarm_class(&class, count);
        }
    }

    /// Создаёт до `min(count, max_count - total)` dormant экземпляров
    ///
    /// Возвращает сколько реально создано. Неизвестный класс / count == 0 → 0.
    pub fn prewarm_class(&mut self, class: &PoolClass, count: u32) -> usize {
        if count == 0 {
            return 0;
        }

        let Some(max_count) = self.config_map.get(class).map(|config| config.max_count) else {
            return 0;
        };

        let total = self.runtime_map.get(class).map(|runtime| runtime.total()).unwrap_or(0);
        let headroom = (max_count as usize).saturating_sub(total);

        self.spawn_dormant(class, (count as usize).min(headroom))
    }

    /// Выдаёт экземпляр класса (None = нет bucket'а / исчерпан / spawn failure)
    pub fn acquire(&mut self, class: &PoolClass, spawn_transform: Transform) -> Option<PoolHandle> {
        let Some(config) = self.config_map.get(class).cloned() else {
            crate::logger::log_warning(&format!("ObjectPool: acquire for unconfigured class {}", class));
            return None;
        };

        let mut handle = self.pop_inactive(class);

        if handle.is_none() {
            let total = self.runtime_map.get(class).map(|runtime| runtime.total()).unwrap_or(0);
            let headroom = (config.max_count as usize).saturating_sub(total);

            if !config.allow_expand || headroom == 0 {
                crate::logger::log_warning(&format!(
                    "ObjectPool: {} exhausted ({}/{}, expand: {})",
                    class, total, config.max_count, config.allow_expand
                ));
                return None;
            }

            let created = self.spawn_dormant(class, (config.expand_step as usize).min(headroom));
            crate::logger::log(&format!("🎱 ObjectPool: expanded {} by {}", class, created));

            // Одна повторная попытка
            handle = self.pop_inactive(class);
        }

        let Some(handle) = handle else {
            crate::logger::log_warning(&format!("ObjectPool: {} has no instance after expand", class));
            return None;
        };

        if let Some(runtime) = self.runtime_map.get_mut(class) {
            runtime.active.insert(handle);
        }

        if let Some(pooled) = self.instances.get_mut(handle) {
            pooled.transform = spawn_transform;
            pooled.activity = PoolActivity::active();
            pooled.instance.on_acquire_from_pool();
        }

        Some(handle)
    }

    /// Возвращает экземпляр в пул
    ///
    /// false: handle неизвестен / без класса / не в active (double release).
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        let Some(class) = self.reverse_lookup.get(&handle) else {
            return false;
        };

        let Some(runtime) = self.runtime_map.get_mut(class) else {
            return false;
        };

        if !runtime.active.remove(&handle) {
            return false;
        }

        let Some(pooled) = self.instances.get_mut(handle) else {
            // Уничтожен снаружи, но остался в active — просто забываем
            self.reverse_lookup.remove(&handle);
            return false;
        };

        pooled.instance.on_release_to_pool();
        pooled.activity = PoolActivity::dormant();
        runtime.inactive.push(handle);
        true
    }

    /// Нули для неизвестного класса
    pub fn stats(&self, class: &PoolClass) -> PoolStats {
        self.runtime_map
            .get(class)
            .map(|runtime| PoolStats {
                total: runtime.total(),
                active: runtime.active.len(),
                inactive: runtime.inactive.len(),
            })
            .unwrap_or_default()
    }

    /// Внешнее уничтожение экземпляра (engine/teardown)
    ///
    /// Из `inactive` не вычищаем: acquire выкинет stale handle сам.
    pub fn destroy(&mut self, handle: PoolHandle) -> bool {
        if self.instances.remove(handle).is_none() {
            return false;
        }

        if let Some(class) = self.reverse_lookup.get(&handle) {
            if let Some(runtime) = self.runtime_map.get_mut(class) {
                if runtime.active.remove(&handle) {
                    // Активный экземпляр уничтожен — он больше не занимает место
                    self.reverse_lookup.remove(&handle);
                }
            }
        }

        true
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.instances.get(handle).map(|pooled| &pooled.instance)
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.instances.get_mut(handle).map(|pooled| &mut pooled.instance)
    }

    pub fn transform(&self, handle: PoolHandle) -> Option<&Transform> {
        self.instances.get(handle).map(|pooled| &pooled.transform)
    }

    pub fn transform_mut(&mut self, handle: PoolHandle) -> Option<&mut Transform> {
        self.instances.get_mut(handle).map(|pooled| &mut pooled.transform)
    }

    /// Экземпляр + его transform одним заимствованием
    pub fn instance_and_transform_mut(&mut self, handle: PoolHandle) -> Option<(&mut T, &mut Transform)> {
        self.instances
            .get_mut(handle)
            .map(|pooled| (&mut pooled.instance, &mut pooled.transform))
    }

    pub fn activity(&self, handle: PoolHandle) -> Option<PoolActivity> {
        self.instances.get(handle).map(|pooled| pooled.activity)
    }

    /// Принудительно dormant без возврата в пул (fallback для unbound экземпляров)
    pub fn set_dormant(&mut self, handle: PoolHandle) -> bool {
        match self.instances.get_mut(handle) {
            Some(pooled) => {
                pooled.activity = PoolActivity::dormant();
                true
            }
            None => false,
        }
    }

    pub fn class_of(&self, handle: PoolHandle) -> Option<&PoolClass> {
        self.reverse_lookup.get(&handle)
    }

    pub fn is_active(&self, handle: PoolHandle) -> bool {
        self.class_of(handle)
            .and_then(|class| self.runtime_map.get(class))
            .is_some_and(|runtime| runtime.active.contains(&handle))
    }

    /// Все активные handle'ы (по классу, затем по handle — стабильный порядок)
    pub fn active_handles(&self) -> Vec<PoolHandle> {
        self.runtime_map
            .values()
            .flat_map(|runtime| runtime.active.iter().copied())
            .collect()
    }

    /// Число живых экземпляров в арене (все классы)
    pub fn live_instances(&self) -> usize {
        self.instances.len()
    }

    /// Проверка partition/ceiling инвариантов (тесты, debug asserts)
    pub fn invariants_hold(&self) -> bool {
        self.runtime_map.iter().all(|(class, runtime)| {
            let disjoint = runtime.inactive.iter().all(|handle| !runtime.active.contains(handle));
            let no_duplicates = {
                let unique: BTreeSet<_> = runtime.inactive.iter().collect();
                unique.len() == runtime.inactive.len()
            };
            let within_ceiling = self
                .config_map
                .get(class)
                .map_or(true, |config| runtime.total() <= config.max_count as usize);

            disjoint && no_duplicates && within_ceiling
        })
    }

    /// Pop из `inactive`, пропуская уничтоженные экземпляры
    fn pop_inactive(&mut self, class: &PoolClass) -> Option<PoolHandle> {
        let runtime = self.runtime_map.get_mut(class)?;

        while let Some(handle) = runtime.inactive.pop() {
            if self.instances.contains(handle) {
                return Some(handle);
            }

            self.reverse_lookup.remove(&handle);
            crate::logger::log(&format!("🎱 ObjectPool: dropped stale handle {:?} ({})", handle, class));
        }

        None
    }

    /// Создаёт `count` dormant экземпляров в `inactive` (останавливается на spawn failure)
    fn spawn_dormant(&mut self, class: &PoolClass, count: usize) -> usize {
        let mut created = 0;

        for _ in 0..count {
            let Some(instance) = (self.factory)(class) else {
                crate::logger::log_warning(&format!("ObjectPool: factory failed for {}", class));
                break;
            };

            let handle = self.instances.insert(PooledInstance {
                instance,
                transform: Transform::IDENTITY,
                activity: PoolActivity::dormant(),
            });

            self.reverse_lookup.insert(handle, class.clone());
            self.runtime_map.entry(class.clone()).or_default().inactive.push(handle);
            created += 1;
        }

        created
    }
}
