//! HackScanner — ray-based: луч вперёд из камеры, ближайший hit

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::capability::TargetCapabilities;
use super::scan_loop::{ScanLoop, TargetChange};
use super::spatial::{CollisionChannel, QueryFilter, SpatialQuery};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HackScanConfig {
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,
    /// Секунды, clamp 0.01..=1.0
    #[serde(default = "default_scan_interval")]
    pub scan_interval: f32,
    #[serde(default = "default_max_range")]
    pub max_range: f32,
    #[serde(default = "default_trace_channel")]
    pub trace_channel: CollisionChannel,
}

fn default_auto_start() -> bool {
    true
}

fn default_scan_interval() -> f32 {
    0.05
}

fn default_max_range() -> f32 {
    12.0
}

fn default_trace_channel() -> CollisionChannel {
    CollisionChannel::Visibility
}

impl Default for HackScanConfig {
    fn default() -> Self {
        Self {
            auto_start: default_auto_start(),
            scan_interval: default_scan_interval(),
            max_range: default_max_range(),
            trace_channel: default_trace_channel(),
        }
    }
}

/// Входные данные одного sample
pub struct HackSampleInput<'a> {
    pub owner: Entity,
    /// Камера, если есть, иначе pose владельца
    pub view: Transform,
    pub spatial: &'a dyn SpatialQuery,
    pub capabilities: &'a dyn TargetCapabilities,
}

/// Component: hack scanner персонажа
#[derive(Component, Debug, Clone)]
pub struct HackScanner {
    pub config: HackScanConfig,
    scan: ScanLoop,
}

impl Default for HackScanner {
    fn default() -> Self {
        Self::new(HackScanConfig::default())
    }
}

impl HackScanner {
    pub fn new(config: HackScanConfig) -> Self {
        let scan = ScanLoop::new(config.scan_interval.clamp(0.01, 1.0));
        Self { config, scan }
    }

    pub fn is_scanning(&self) -> bool {
        self.scan.is_scanning()
    }

    pub fn current_target(&self) -> Option<Entity> {
        self.scan.current_target()
    }

    /// Idempotent; немедленный sample при реальном старте
    pub fn start_scan(&mut self, input: &HackSampleInput) -> Option<TargetChange> {
        if !self.scan.start() {
            return None;
        }

        self.scan_once(input)
    }

    pub fn stop_scan(&mut self) {
        self.scan.stop();
    }

    /// Ближайший hit вдоль луча; валиден только если `can_hack(owner)`
    pub fn sample(&self, input: &HackSampleInput) -> Option<Entity> {
        let filter = QueryFilter::new(self.config.trace_channel).exclude(input.owner);
        let hit = input.spatial.raycast(
            input.view.translation,
            *input.view.forward(),
            self.config.max_range,
            &filter,
        )?;

        input
            .capabilities
            .can_hack(hit.entity, input.owner)
            .then_some(hit.entity)
    }

    pub fn scan_once(&mut self, input: &HackSampleInput) -> Option<TargetChange> {
        let target = self.sample(input);
        let change = self.scan.apply_sample(target);

        if let Some(change) = change {
            crate::logger::log(&format!("🎯 Hack target: {:?} → {:?}", change.old, change.new));
        }
        change
    }

    /// Samples по таймеру (может быть несколько при большом delta)
    pub fn tick(&mut self, delta: Duration, input: &HackSampleInput) -> Vec<TargetChange> {
        (0..self.scan.tick(delta))
            .filter_map(|_| self.scan_once(input))
            .collect()
    }
}
