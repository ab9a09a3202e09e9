//! Tag relationship rules — чистые данные: active state tags → block/cancel
//!
//! Никаких side effects: `evaluate` только считает множества. Кто и как
//! отменяет действия — решает `GameplayTagState` + cancel dispatch table.

use serde::{Deserialize, Serialize};

use super::gameplay_tag::{GameplayTag, TagSet};

/// Условие срабатывания правила
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchMode {
    /// Все required теги активны (AND)
    #[default]
    All,
    /// Хотя бы один required тег активен (OR)
    Any,
}

/// Одно правило таблицы
///
/// Пустой `required_tags` → правило никогда не срабатывает.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagRelationshipRule {
    pub required_tags: TagSet,
    #[serde(default)]
    pub match_mode: MatchMode,
    #[serde(default)]
    pub block_tags: TagSet,
    #[serde(default)]
    pub cancel_tags: TagSet,
}

impl TagRelationshipRule {
    pub fn all(required: TagSet, blocks: TagSet, cancels: TagSet) -> Self {
        Self {
            required_tags: required,
            match_mode: MatchMode::All,
            block_tags: blocks,
            cancel_tags: cancels,
        }
    }

    pub fn any(required: TagSet, blocks: TagSet, cancels: TagSet) -> Self {
        Self {
            required_tags: required,
            match_mode: MatchMode::Any,
            block_tags: blocks,
            cancel_tags: cancels,
        }
    }

    pub fn is_triggered(&self, active: &TagSet) -> bool {
        if self.required_tags.is_empty() {
            return false;
        }

        match self.match_mode {
            MatchMode::All => active.has_all(&self.required_tags),
            MatchMode::Any => active.has_any(&self.required_tags),
        }
    }
}

/// Результат одного прохода по таблице
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagEvaluation {
    pub block_tags: TagSet,
    pub cancel_tags: TagSet,
}

/// Упорядоченная таблица правил (author-time, immutable после загрузки)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagRelationshipMap {
    pub rules: Vec<TagRelationshipRule>,
}

impl TagRelationshipMap {
    pub fn new(rules: Vec<TagRelationshipRule>) -> Self {
        Self { rules }
    }

    /// Union block/cancel тегов всех сработавших правил
    ///
    /// Порядок правил на результат не влияет (чистые union'ы), каждое правило
    /// проверяется независимо против одного и того же `active`.
    pub fn evaluate(&self, active: &TagSet) -> TagEvaluation {
        let mut evaluation = TagEvaluation::default();

        for rule in self.rules.iter().filter(|rule| rule.is_triggered(active)) {
            evaluation.block_tags.append(&rule.block_tags);
            evaluation.cancel_tags.append(&rule.cancel_tags);
        }

        evaluation
    }

    /// Встроенная таблица R01–R04
    pub fn default_rules() -> Self {
        use GameplayTag::*;

        Self::new(vec![
            // R01: Unarmed — reload запрещён, зависший reload сбрасывается
            TagRelationshipRule::all(
                TagSet::from([Unarmed]),
                TagSet::from([BlockReload]),
                TagSet::from([Reloading]),
            ),
            // R02: Equipping | Unequipping — никакого боя во время смены оружия
            TagRelationshipRule::any(
                TagSet::from([Equipping, Unequipping]),
                TagSet::from([BlockFire, BlockAds, BlockReload]),
                TagSet::from([Firing, Ads, Reloading]),
            ),
            // R03: Reloading
            TagRelationshipRule::all(
                TagSet::from([Reloading]),
                TagSet::from([BlockFire, BlockAds, BlockEquip]),
                TagSet::from([Firing, Ads]),
            ),
            // R04: Firing — нельзя менять оружие и перезаряжаться вручную
            TagRelationshipRule::all(
                TagSet::from([Firing]),
                TagSet::from([BlockEquip, BlockReload]),
                TagSet::new(),
            ),
        ])
    }

    /// Пустая таблица → defaults (как editor auto-populate), иначе как есть
    pub fn or_defaults(self) -> Self {
        if self.rules.is_empty() {
            Self::default_rules()
        } else {
            self
        }
    }
}
