//! Общая форма сканеров: Stopped ⇄ Scanning + hysteresis по identity цели

use bevy::prelude::*;
use std::time::Duration;

/// Смена цели: (old, new), любой из двух может быть None
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetChange {
    pub old: Option<Entity>,
    pub new: Option<Entity>,
}

#[derive(Debug, Clone)]
pub struct ScanLoop {
    interval_secs: f32,
    timer: Option<Timer>,
    current: Option<Entity>,
}

impl ScanLoop {
    pub fn new(interval_secs: f32) -> Self {
        Self {
            interval_secs,
            timer: None,
            current: None,
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.timer.is_some()
    }

    pub fn current_target(&self) -> Option<Entity> {
        self.current
    }

    /// Stopped → Scanning. false если уже сканирует (повторный start — no-op).
    /// true → вызывающий делает немедленный sample.
    pub fn start(&mut self) -> bool {
        if self.timer.is_some() {
            return false;
        }

        self.timer = Some(Timer::from_seconds(self.interval_secs, TimerMode::Repeating));
        true
    }

    /// Отменяет будущие samples; текущая цель сохраняется
    pub fn stop(&mut self) {
        self.timer = None;
    }

    /// Сколько samples пора сделать (0 в Stopped)
    pub fn tick(&mut self, delta: Duration) -> u32 {
        match self.timer.as_mut() {
            Some(timer) => {
                timer.tick(delta);
                timer.times_finished_this_tick()
            }
            None => 0,
        }
    }

    /// Событие только при смене identity
    pub fn apply_sample(&mut self, new: Option<Entity>) -> Option<TargetChange> {
        if new == self.current {
            return None;
        }

        let change = TargetChange { old: self.current, new };
        self.current = new;
        Some(change)
    }
}
