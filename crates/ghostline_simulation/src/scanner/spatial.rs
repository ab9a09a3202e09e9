//! Spatial query contract + sphere-collider реализация
//!
//! Ядро потребляет только `SpatialQuery` (raycast / overlap sphere / position).
//! `ColliderSnapshot` — простая реализация поверх `SphereCollider` компонентов:
//! sphere checks без broadphase, результаты отсортированы по Entity.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Канал коллизий (trace channel и object type одновременно)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CollisionChannel {
    WorldStatic,
    Pawn,
    Visibility,
    Interactable,
    Projectile,
}

impl CollisionChannel {
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Битовая маска каналов
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChannelMask(u8);

impl ChannelMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u8::MAX);

    pub fn with(self, channel: CollisionChannel) -> Self {
        Self(self.0 | channel.bit())
    }

    pub fn without(self, channel: CollisionChannel) -> Self {
        Self(self.0 & !channel.bit())
    }

    pub fn contains(&self, channel: CollisionChannel) -> bool {
        self.0 & channel.bit() != 0
    }
}

impl<const N: usize> From<[CollisionChannel; N]> for ChannelMask {
    fn from(channels: [CollisionChannel; N]) -> Self {
        channels.into_iter().fold(Self::NONE, Self::with)
    }
}

/// Сферический коллайдер (stand-in для физического движка)
#[derive(Component, Debug, Clone, PartialEq)]
pub struct SphereCollider {
    pub radius: f32,
    /// Тип объекта (по нему projectile игнорирует канал стрелка)
    pub object_type: CollisionChannel,
    /// На какие trace channels отвечает
    pub responses: ChannelMask,
}

impl SphereCollider {
    pub fn new(radius: f32, object_type: CollisionChannel) -> Self {
        Self {
            radius,
            object_type,
            responses: ChannelMask::ALL,
        }
    }

    pub fn with_responses(mut self, responses: ChannelMask) -> Self {
        self.responses = responses;
        self
    }
}

/// Фильтр запроса
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFilter {
    pub channel: CollisionChannel,
    pub exclude: Vec<Entity>,
    pub ignore_object_types: ChannelMask,
}

impl QueryFilter {
    pub fn new(channel: CollisionChannel) -> Self {
        Self {
            channel,
            exclude: Vec::new(),
            ignore_object_types: ChannelMask::NONE,
        }
    }

    pub fn exclude(mut self, entity: Entity) -> Self {
        self.exclude.push(entity);
        self
    }

    pub fn ignore_object_types(mut self, mask: ChannelMask) -> Self {
        self.ignore_object_types = mask;
        self
    }

    fn accepts(&self, entity: Entity, collider: &SphereCollider) -> bool {
        collider.responses.contains(self.channel)
            && !self.ignore_object_types.contains(collider.object_type)
            && !self.exclude.contains(&entity)
    }
}

/// Ближайшее попадание луча
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: Entity,
    pub point: Vec3,
    pub distance: f32,
}

/// Black-box spatial service
pub trait SpatialQuery {
    /// Ближайший hit вдоль `direction` (нормализуется внутри) в пределах `max_distance`
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, filter: &QueryFilter) -> Option<RayHit>;

    /// Все entity, пересекающие сферу (стабильный порядок)
    fn overlap_sphere(&self, center: Vec3, radius: f32, filter: &QueryFilter) -> Vec<Entity>;

    fn position(&self, entity: Entity) -> Option<Vec3>;
}

#[derive(Debug, Clone)]
struct ColliderEntry {
    entity: Entity,
    center: Vec3,
    collider: SphereCollider,
}

/// Снимок коллайдеров мира на текущий tick
#[derive(Debug, Clone, Default)]
pub struct ColliderSnapshot {
    entries: Vec<ColliderEntry>,
}

impl ColliderSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_colliders<'a>(colliders: impl IntoIterator<Item = (Entity, &'a Transform, &'a SphereCollider)>) -> Self {
        let mut snapshot = Self::new();
        for (entity, transform, collider) in colliders {
            snapshot.insert(entity, transform.translation, collider.clone());
        }
        snapshot
    }

    pub fn insert(&mut self, entity: Entity, center: Vec3, collider: SphereCollider) {
        let entry = ColliderEntry { entity, center, collider };
        match self.entries.binary_search_by_key(&entity, |entry| entry.entity) {
            Ok(index) => self.entries[index] = entry,
            Err(index) => self.entries.insert(index, entry),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Пересечение луча со сферой: расстояние до входа (0 если origin внутри)
fn ray_sphere_distance(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(direction);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let far = -b + root;
    if far < 0.0 {
        return None;
    }

    Some((-b - root).max(0.0))
}

impl SpatialQuery for ColliderSnapshot {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, filter: &QueryFilter) -> Option<RayHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || max_distance <= 0.0 {
            return None;
        }

        // entries отсортированы по Entity → при равной дистанции выигрывает меньший
        self.entries
            .iter()
            .filter(|entry| filter.accepts(entry.entity, &entry.collider))
            .filter_map(|entry| {
                ray_sphere_distance(origin, direction, entry.center, entry.collider.radius)
                    .filter(|distance| *distance <= max_distance)
                    .map(|distance| RayHit {
                        entity: entry.entity,
                        point: origin + direction * distance,
                        distance,
                    })
            })
            .fold(None, |best: Option<RayHit>, hit| match best {
                Some(best) if best.distance <= hit.distance => Some(best),
                _ => Some(hit),
            })
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, filter: &QueryFilter) -> Vec<Entity> {
        self.entries
            .iter()
            .filter(|entry| filter.accepts(entry.entity, &entry.collider))
            .filter(|entry| {
                let reach = radius + entry.collider.radius;
                entry.center.distance_squared(center) <= reach * reach
            })
            .map(|entry| entry.entity)
            .collect()
    }

    fn position(&self, entity: Entity) -> Option<Vec3> {
        self.entries
            .binary_search_by_key(&entity, |entry| entry.entity)
            .ok()
            .map(|index| self.entries[index].center)
    }
}
