//! GameplayTagState — arbitration core персонажа
//!
//! # Архитектура
//!
//! - `ActiveStateTags` меняются только через add/remove/notify
//! - каждое изменение → `rebuild_blocks_and_apply_cancels` (синхронно)
//! - rule table = чистые данные (`TagRelationshipMap::evaluate`)
//! - side effects отмены = `CancelTable` (tag → `CancelAction`) + `CancelSink`,
//!   который реализует владелец контроллеров (character aggregate)
//!
//! # Reentrancy
//!
//! Во время rebuild `self` заимствован мутабельно, а `CancelSink` получает
//! только `CancelAction`. Обработчик физически не может вызвать
//! `add_state_tag`/`remove_state_tag` — рекурсия исключена borrow checker'ом.

use bevy::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::gameplay_tag::{GameplayTag, TagSet};
use super::relationship_map::TagRelationshipMap;

/// Что сделать с контроллером, когда его state tag принудительно снят
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelAction {
    /// Остановить стрельбу (auto-fire timer), без notify обратно в core
    StopFiring,
    /// Отпустить прицеливание (zoom-out), без notify обратно в core
    ReleaseAim,
}

/// Исполнитель cancel-действий (реализуется владельцем контроллеров)
pub trait CancelSink {
    fn on_cancel(&mut self, tag: GameplayTag, action: CancelAction);
}

/// Sink без side effects (тесты, персонажи без контроллеров)
impl CancelSink for () {
    fn on_cancel(&mut self, _tag: GameplayTag, _action: CancelAction) {}
}

/// Dispatch table: state tag → cancel action
///
/// Теги без записи (Reloading, Equipping, Unequipping) просто снимаются:
/// отдельного API отмены reload/equip у контроллеров нет.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelTable {
    handlers: BTreeMap<GameplayTag, CancelAction>,
}

impl Default for CancelTable {
    fn default() -> Self {
        let mut handlers = BTreeMap::new();
        handlers.insert(GameplayTag::Firing, CancelAction::StopFiring);
        handlers.insert(GameplayTag::Ads, CancelAction::ReleaseAim);
        Self { handlers }
    }
}

impl CancelTable {
    pub fn action_for(&self, tag: GameplayTag) -> Option<CancelAction> {
        self.handlers.get(&tag).copied()
    }
}

/// Семантические уведомления от контроллеров → мутации тегов
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateNotice {
    WeaponArmed(bool),
    FirePressed,
    FireReleased,
    ReloadStarted,
    ReloadFinished,
}

/// Component: активные state tags + derived block tags
#[derive(Component, Debug, Clone, Default)]
pub struct GameplayTagState {
    active: TagSet,
    blocked: TagSet,
    /// None → permissive arbitration (ничего никогда не заблокировано)
    rules: Option<Arc<TagRelationshipMap>>,
    cancel_table: CancelTable,
}

impl GameplayTagState {
    pub fn new(rules: Option<Arc<TagRelationshipMap>>) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    pub fn active_tags(&self) -> &TagSet {
        &self.active
    }

    pub fn block_tags(&self) -> &TagSet {
        &self.blocked
    }

    pub fn has_state_tag(&self, tag: GameplayTag) -> bool {
        self.active.has(tag)
    }

    pub fn is_blocked_by(&self, block_tag: GameplayTag) -> bool {
        self.blocked.has(block_tag)
    }

    /// No-op если тег уже активен. Возвращает true если состояние изменилось.
    pub fn add_state_tag(&mut self, tag: GameplayTag, sink: &mut dyn CancelSink) -> bool {
        if !self.active.insert(tag) {
            return false;
        }

        self.rebuild_blocks_and_apply_cancels(sink);
        true
    }

    /// No-op если тега нет. Возвращает true если состояние изменилось.
    pub fn remove_state_tag(&mut self, tag: GameplayTag, sink: &mut dyn CancelSink) -> bool {
        if !self.active.remove(tag) {
            return false;
        }

        self.rebuild_blocks_and_apply_cancels(sink);
        true
    }

    /// Armed/Unarmed взаимоисключающие: снимаем оба, ставим нужный, один rebuild
    pub fn notify_weapon_armed(&mut self, armed: bool, sink: &mut dyn CancelSink) {
        self.active.remove(GameplayTag::Armed);
        self.active.remove(GameplayTag::Unarmed);
        self.active.insert(if armed { GameplayTag::Armed } else { GameplayTag::Unarmed });
        self.rebuild_blocks_and_apply_cancels(sink);
    }

    pub fn notify_fire_pressed(&mut self, sink: &mut dyn CancelSink) {
        self.add_state_tag(GameplayTag::Firing, sink);
    }

    pub fn notify_fire_released(&mut self, sink: &mut dyn CancelSink) {
        self.remove_state_tag(GameplayTag::Firing, sink);
    }

    pub fn notify_reload_started(&mut self, sink: &mut dyn CancelSink) {
        self.add_state_tag(GameplayTag::Reloading, sink);
    }

    pub fn notify_reload_finished(&mut self, sink: &mut dyn CancelSink) {
        self.remove_state_tag(GameplayTag::Reloading, sink);
    }

    /// Контроллеры уже сброшены: снимаем все action/combat теги одним rebuild.
    /// Armed/Unarmed остаются (teardown не снимает оружие).
    pub fn notify_teardown(&mut self, sink: &mut dyn CancelSink) {
        let mut changed = false;
        for tag in [
            GameplayTag::Firing,
            GameplayTag::Ads,
            GameplayTag::Reloading,
            GameplayTag::Equipping,
            GameplayTag::Unequipping,
        ] {
            changed |= self.active.remove(tag);
        }

        if changed {
            self.rebuild_blocks_and_apply_cancels(sink);
        }
    }

    pub fn apply_notice(&mut self, notice: StateNotice, sink: &mut dyn CancelSink) {
        match notice {
            StateNotice::WeaponArmed(armed) => self.notify_weapon_armed(armed, sink),
            StateNotice::FirePressed => self.notify_fire_pressed(sink),
            StateNotice::FireReleased => self.notify_fire_released(sink),
            StateNotice::ReloadStarted => self.notify_reload_started(sink),
            StateNotice::ReloadFinished => self.notify_reload_finished(sink),
        }
    }

    /// 1. BlockTags/CancelTags из rule table
    /// 2. Активные cancel-теги: dispatch action → снять тег
    /// 3. Если что-то сняли — пересчитать BlockTags (без повторных cancel)
    ///
    /// Возвращает реально отменённые теги (в порядке отмены).
    pub fn rebuild_blocks_and_apply_cancels(&mut self, sink: &mut dyn CancelSink) -> Vec<GameplayTag> {
        self.blocked.clear();

        let Some(rules) = self.rules.clone() else {
            return Vec::new();
        };

        let evaluation = rules.evaluate(&self.active);
        self.blocked = evaluation.block_tags;

        let mut cancelled = Vec::new();
        for tag in evaluation.cancel_tags.iter() {
            if !self.active.has(tag) {
                continue;
            }

            if let Some(action) = self.cancel_table.action_for(tag) {
                sink.on_cancel(tag, action);
            }
            self.active.remove(tag);
            cancelled.push(tag);
        }

        if !cancelled.is_empty() {
            crate::logger::log(&format!("🚫 Cancelled state tags: {:?}", cancelled));
            self.blocked = rules.evaluate(&self.active).block_tags;
        }

        cancelled
    }
}
