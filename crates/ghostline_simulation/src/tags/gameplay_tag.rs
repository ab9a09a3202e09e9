//! Gameplay tags — символьные состояния персонажа и блокировки действий
//!
//! Иерархия в имени (`Character.State.Combat.Firing`) только для читаемости
//! конфигов; matching всегда exact (parent tag не матчит child).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Каталог тегов
///
/// `State.*` — что персонаж делает сейчас (ActiveStateTags).
/// `Block.*` — какие действия сейчас запрещены (BlockTags, derived).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GameplayTag {
    #[serde(rename = "Character.State.Movement.Grounded")]
    MovementGrounded,
    #[serde(rename = "Character.State.Movement.InAir")]
    MovementInAir,
    #[serde(rename = "Character.State.Movement.Crouch")]
    MovementCrouch,
    #[serde(rename = "Character.State.Movement.Sprint")]
    MovementSprint,

    #[serde(rename = "Character.State.Weapon.Unarmed")]
    Unarmed,
    #[serde(rename = "Character.State.Weapon.Armed")]
    Armed,
    #[serde(rename = "Character.State.Weapon.Type.Pistol")]
    WeaponTypePistol,

    #[serde(rename = "Character.State.Combat.ADS")]
    Ads,
    #[serde(rename = "Character.State.Combat.Firing")]
    Firing,

    #[serde(rename = "Character.State.Action.Reloading")]
    Reloading,
    #[serde(rename = "Character.State.Action.Equipping")]
    Equipping,
    #[serde(rename = "Character.State.Action.Unequipping")]
    Unequipping,

    #[serde(rename = "Character.Block.Combat.Fire")]
    BlockFire,
    #[serde(rename = "Character.Block.Combat.ADS")]
    BlockAds,
    #[serde(rename = "Character.Block.Combat.Reload")]
    BlockReload,
    #[serde(rename = "Character.Block.Combat.Equip")]
    BlockEquip,
}

impl GameplayTag {
    pub fn name(&self) -> &'static str {
        match self {
            GameplayTag::MovementGrounded => "Character.State.Movement.Grounded",
            GameplayTag::MovementInAir => "Character.State.Movement.InAir",
            GameplayTag::MovementCrouch => "Character.State.Movement.Crouch",
            GameplayTag::MovementSprint => "Character.State.Movement.Sprint",
            GameplayTag::Unarmed => "Character.State.Weapon.Unarmed",
            GameplayTag::Armed => "Character.State.Weapon.Armed",
            GameplayTag::WeaponTypePistol => "Character.State.Weapon.Type.Pistol",
            GameplayTag::Ads => "Character.State.Combat.ADS",
            GameplayTag::Firing => "Character.State.Combat.Firing",
            GameplayTag::Reloading => "Character.State.Action.Reloading",
            GameplayTag::Equipping => "Character.State.Action.Equipping",
            GameplayTag::Unequipping => "Character.State.Action.Unequipping",
            GameplayTag::BlockFire => "Character.Block.Combat.Fire",
            GameplayTag::BlockAds => "Character.Block.Combat.ADS",
            GameplayTag::BlockReload => "Character.Block.Combat.Reload",
            GameplayTag::BlockEquip => "Character.Block.Combat.Equip",
        }
    }

    /// Это block-тег (а не state)?
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            GameplayTag::BlockFire | GameplayTag::BlockAds | GameplayTag::BlockReload | GameplayTag::BlockEquip
        )
    }
}

impl fmt::Display for GameplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Упорядоченное множество тегов
///
/// BTreeSet → итерация в стабильном порядке (cancel-обработчики вызываются
/// детерминированно, snapshot'ы сравнимы побайтно).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet {
    tags: BTreeSet<GameplayTag>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, tag: GameplayTag) -> bool {
        self.tags.contains(&tag)
    }

    /// Все теги `other` присутствуют (пустой `other` → true)
    pub fn has_all(&self, other: &TagSet) -> bool {
        other.tags.is_subset(&self.tags)
    }

    /// Хотя бы один тег `other` присутствует (пустой `other` → false)
    pub fn has_any(&self, other: &TagSet) -> bool {
        other.tags.iter().any(|tag| self.tags.contains(tag))
    }

    /// true если тег был добавлен
    pub fn insert(&mut self, tag: GameplayTag) -> bool {
        self.tags.insert(tag)
    }

    /// true если тег был удалён
    pub fn remove(&mut self, tag: GameplayTag) -> bool {
        self.tags.remove(&tag)
    }

    pub fn append(&mut self, other: &TagSet) {
        self.tags.extend(other.tags.iter().copied());
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = GameplayTag> + '_ {
        self.tags.iter().copied()
    }
}

impl FromIterator<GameplayTag> for TagSet {
    fn from_iter<I: IntoIterator<Item = GameplayTag>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[GameplayTag; N]> for TagSet {
    fn from(tags: [GameplayTag; N]) -> Self {
        tags.into_iter().collect()
    }
}
