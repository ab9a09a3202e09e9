//! WeaponData — author-time таблица оружия (immutable после загрузки)
//!
//! Единицы: метры, секунды, градусы.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pool::PoolClass;

/// Минимальный fire rate для расчёта каденса (rounds/sec)
pub const MIN_FIRE_RATE: f32 = 0.1;

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeaponId(pub String);

impl WeaponId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Debug for WeaponId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeaponId({})", self.0)
    }
}

impl fmt::Display for WeaponId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FireMode {
    /// Один выстрел на нажатие
    #[default]
    SemiAuto,
    /// Repeating timer пока держат fire
    FullAuto,
}

/// Сокет дула: имя + локальный offset относительно origin оружия
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuzzleSocket {
    #[serde(default = "default_muzzle_name")]
    pub name: String,
    pub offset: [f32; 3],
}

fn default_muzzle_name() -> String {
    "Muzzle".to_string()
}

impl MuzzleSocket {
    pub fn new(offset: Vec3) -> Self {
        Self {
            name: default_muzzle_name(),
            offset: offset.to_array(),
        }
    }

    pub fn offset(&self) -> Vec3 {
        Vec3::from_array(self.offset)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponData {
    pub id: WeaponId,
    #[serde(default)]
    pub mesh: Option<String>,
    #[serde(default = "default_attach_socket")]
    pub attach_socket: String,
    #[serde(default)]
    pub muzzle_socket: Option<MuzzleSocket>,
    #[serde(default)]
    pub fire_mode: FireMode,
    /// Rounds/sec для FullAuto (10 rps = 600 RPM)
    #[serde(default = "default_fire_rate")]
    pub fire_rate: f32,
    #[serde(default = "default_damage")]
    pub damage: f32,
    /// Дальность aim trace
    #[serde(default = "default_max_range")]
    pub max_range: f32,
    /// Половина угла конуса разброса
    #[serde(default = "default_spread_degrees")]
    pub spread_degrees: f32,
    /// None → fallback класс персонажа
    #[serde(default)]
    pub projectile_class: Option<PoolClass>,
    #[serde(default = "default_mag_capacity")]
    pub mag_capacity: u32,
    #[serde(default = "default_max_reserve_ammo")]
    pub max_reserve_ammo: u32,
}

fn default_attach_socket() -> String {
    "WeaponSocket".to_string()
}

fn default_fire_rate() -> f32 {
    10.0
}

fn default_damage() -> f32 {
    20.0
}

fn default_max_range() -> f32 {
    100.0
}

fn default_spread_degrees() -> f32 {
    1.0
}

fn default_mag_capacity() -> u32 {
    30
}

fn default_max_reserve_ammo() -> u32 {
    160
}

impl WeaponData {
    pub fn new(id: WeaponId) -> Self {
        Self {
            id,
            mesh: None,
            attach_socket: default_attach_socket(),
            muzzle_socket: None,
            fire_mode: FireMode::default(),
            fire_rate: default_fire_rate(),
            damage: default_damage(),
            max_range: default_max_range(),
            spread_degrees: default_spread_degrees(),
            projectile_class: None,
            mag_capacity: default_mag_capacity(),
            max_reserve_ammo: default_max_reserve_ammo(),
        }
    }

    /// Автомат по умолчанию (demo / default config)
    pub fn rifle() -> Self {
        Self {
            mesh: Some("weapons/rifle".to_string()),
            muzzle_socket: Some(MuzzleSocket::new(Vec3::new(0.0, 0.05, -0.6))),
            fire_mode: FireMode::FullAuto,
            projectile_class: Some(PoolClass::new("projectile.rifle")),
            ..Self::new(WeaponId::new("rifle"))
        }
    }

    pub fn with_fire_mode(mut self, fire_mode: FireMode) -> Self {
        self.fire_mode = fire_mode;
        self
    }

    pub fn with_ammo(mut self, mag_capacity: u32, max_reserve_ammo: u32) -> Self {
        self.mag_capacity = mag_capacity;
        self.max_reserve_ammo = max_reserve_ammo;
        self
    }

    pub fn with_spread(mut self, spread_degrees: f32) -> Self {
        self.spread_degrees = spread_degrees;
        self
    }

    pub fn with_projectile_class(mut self, class: Option<PoolClass>) -> Self {
        self.projectile_class = class;
        self
    }

    /// Интервал auto-fire: 1 / max(0.1, fire_rate)
    pub fn fire_interval_secs(&self) -> f32 {
        1.0 / self.fire_rate.max(MIN_FIRE_RATE)
    }
}
