//! GameplayConfig — author-time данные (загружаются один раз на старте)
//!
//! JSON формат:
//! ```json
//! {
//!   "pool_buckets": [{ "class": "projectile.rifle", "prewarm_count": 10, "max_count": 200 }],
//!   "weapons": [{ "id": "rifle", "fire_mode": "FullAuto", "projectile_class": "projectile.rifle" }],
//!   "primary_weapon": "rifle",
//!   "tag_rules": { "rules": [...] }
//! }
//! ```
//!
//! Отсутствие `tag_rules` = permissive arbitration (ничего не блокируется).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::character::FocusSettings;
use crate::pool::{PoolBucketConfig, PoolClass};
use crate::projectile::ProjectileSettings;
use crate::scanner::{HackScanConfig, InteractScanConfig};
use crate::tags::TagRelationshipMap;
use crate::weapon::{WeaponData, WeaponId};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}

/// Resource: вся author-time конфигурация геймплея
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameplayConfig {
    #[serde(default)]
    pub pool_buckets: Vec<PoolBucketConfig>,
    /// Параметры снаряда по классу пула (нет записи → `ProjectileSettings::default()`)
    #[serde(default)]
    pub projectiles: BTreeMap<PoolClass, ProjectileSettings>,
    #[serde(default)]
    pub weapons: Vec<WeaponData>,
    /// None → первое оружие таблицы
    #[serde(default)]
    pub primary_weapon: Option<WeaponId>,
    #[serde(default)]
    pub tag_rules: Option<TagRelationshipMap>,
    /// Класс снаряда для оружия без `projectile_class`
    #[serde(default)]
    pub fallback_projectile: Option<PoolClass>,
    #[serde(default)]
    pub hack_scan: HackScanConfig,
    #[serde(default)]
    pub interact_scan: InteractScanConfig,
    #[serde(default)]
    pub focus: FocusSettings,
}

impl Default for GameplayConfig {
    /// Встроенный набор: один автомат, один bucket снарядов, правила R01–R04
    fn default() -> Self {
        let rifle = WeaponData::rifle();
        let bucket = rifle
            .projectile_class
            .clone()
            .unwrap_or_else(|| PoolClass::new("projectile.rifle"));

        Self {
            pool_buckets: vec![PoolBucketConfig::new(bucket)],
            projectiles: BTreeMap::new(),
            primary_weapon: Some(rifle.id.clone()),
            weapons: vec![rifle],
            tag_rules: Some(TagRelationshipMap::default_rules()),
            fallback_projectile: None,
            hack_scan: HackScanConfig::default(),
            interact_scan: InteractScanConfig::default(),
            focus: FocusSettings::default(),
        }
    }
}

impl GameplayConfig {
    /// Parse + validate
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_json_str(&json)?;
        crate::logger::log_info(&format!(
            "📦 Loaded config {}: {} buckets, {} weapons",
            path.display(),
            config.pool_buckets.len(),
            config.weapons.len()
        ));
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut classes = BTreeSet::new();
        for bucket in &self.pool_buckets {
            if bucket.max_count < 1 {
                return Err(ConfigError::Validation(format!("bucket {}: max_count must be >= 1", bucket.class)));
            }
            if bucket.expand_step < 1 {
                return Err(ConfigError::Validation(format!("bucket {}: expand_step must be >= 1", bucket.class)));
            }
            if !classes.insert(&bucket.class) {
                return Err(ConfigError::Validation(format!("duplicate bucket class {}", bucket.class)));
            }
        }

        let mut ids = BTreeSet::new();
        for weapon in &self.weapons {
            if weapon.mag_capacity < 1 {
                return Err(ConfigError::Validation(format!("weapon {}: mag_capacity must be >= 1", weapon.id)));
            }
            if weapon.fire_rate.is_nan() || weapon.fire_rate <= 0.0 {
                return Err(ConfigError::Validation(format!("weapon {}: fire_rate must be > 0", weapon.id)));
            }
            if !ids.insert(&weapon.id) {
                return Err(ConfigError::Validation(format!("duplicate weapon id {}", weapon.id)));
            }
        }

        if let Some(primary) = &self.primary_weapon {
            if !ids.contains(primary) {
                return Err(ConfigError::Validation(format!("unknown primary weapon {}", primary)));
            }
        }

        Ok(())
    }

    pub fn weapon(&self, id: &WeaponId) -> Option<&WeaponData> {
        self.weapons.iter().find(|weapon| &weapon.id == id)
    }

    pub fn primary_weapon_data(&self) -> Option<&WeaponData> {
        match &self.primary_weapon {
            Some(id) => self.weapon(id),
            None => self.weapons.first(),
        }
    }

    pub fn projectile_settings(&self, class: &PoolClass) -> ProjectileSettings {
        self.projectiles.get(class).cloned().unwrap_or_default()
    }

    pub fn shared_tag_rules(&self) -> Option<Arc<TagRelationshipMap>> {
        self.tag_rules.clone().map(Arc::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weapon::FireMode;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameplayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.primary_weapon_data().unwrap().id, WeaponId::new("rifle"));
        assert_eq!(config.tag_rules.as_ref().unwrap().rules.len(), 4);
    }

    #[test]
    fn test_parse_minimal_json() {
        let json = r#"{
            "pool_buckets": [{ "class": "projectile.pistol", "prewarm_count": 2, "max_count": 8 }],
            "projectiles": { "projectile.pistol": { "default_speed": 45.0 } },
            "weapons": [{ "id": "pistol", "projectile_class": "projectile.pistol", "mag_capacity": 12 }]
        }"#;

        let config = GameplayConfig::from_json_str(json).unwrap();
        assert_eq!(config.pool_buckets[0].expand_step, 5);
        assert!(config.tag_rules.is_none());

        let primary = config.primary_weapon_data().unwrap();
        assert_eq!(primary.fire_mode, FireMode::SemiAuto);
        assert_eq!(primary.mag_capacity, 12);

        let pistol = PoolClass::new("projectile.pistol");
        assert_eq!(config.projectile_settings(&pistol).default_speed, 45.0);
        assert_eq!(config.projectile_settings(&pistol).life_seconds, 2.5);
    }

    #[test]
    fn test_tag_rules_parse_by_dotted_names() {
        let json = r#"{
            "tag_rules": { "rules": [{
                "required_tags": ["Character.State.Action.Reloading"],
                "block_tags": ["Character.Block.Combat.Fire"],
                "cancel_tags": ["Character.State.Combat.Firing"]
            }] }
        }"#;

        let config = GameplayConfig::from_json_str(json).unwrap();
        let rules = config.tag_rules.unwrap();
        assert_eq!(rules.rules.len(), 1);
        assert_eq!(rules.rules[0].required_tags.len(), 1);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = GameplayConfig::default();
        config.pool_buckets[0].max_count = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = GameplayConfig::default();
        config.weapons.push(WeaponData::rifle());
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = GameplayConfig::default();
        config.primary_weapon = Some(WeaponId::new("railgun"));
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = GameplayConfig::default();
        config.weapons[0].fire_rate = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_parse_and_io_errors() {
        assert!(matches!(GameplayConfig::from_json_str("{ nope"), Err(ConfigError::Json(_))));
        assert!(matches!(
            GameplayConfig::load("/definitely/missing/ghostline.json"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_json_round_trip_of_defaults() {
        let config = GameplayConfig::default();
        let json = config.to_json_pretty().unwrap();
        assert_eq!(GameplayConfig::from_json_str(&json).unwrap(), config);
    }
}
