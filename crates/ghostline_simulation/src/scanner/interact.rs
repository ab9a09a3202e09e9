//! InteractScanner — volume-based: overlap sphere вокруг владельца
//!
//! Кандидат: прошёл `can_interact(owner)` и в пределах `max_range`
//! (сравнение квадратов). Выбор — минимальный dist² ; равенство → меньший Entity.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::capability::TargetCapabilities;
use super::scan_loop::{ScanLoop, TargetChange};
use super::spatial::{CollisionChannel, QueryFilter, SpatialQuery};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractScanConfig {
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,
    #[serde(default = "default_scan_interval")]
    pub scan_interval: f32,
    #[serde(default = "default_max_range")]
    pub max_range: f32,
    #[serde(default = "default_sphere_radius")]
    pub sphere_radius: f32,
    #[serde(default = "default_detection_channel")]
    pub detection_channel: CollisionChannel,
}

fn default_auto_start() -> bool {
    true
}

fn default_scan_interval() -> f32 {
    0.05
}

fn default_max_range() -> f32 {
    2.5
}

fn default_sphere_radius() -> f32 {
    1.0
}

fn default_detection_channel() -> CollisionChannel {
    CollisionChannel::Interactable
}

impl Default for InteractScanConfig {
    fn default() -> Self {
        Self {
            auto_start: default_auto_start(),
            scan_interval: default_scan_interval(),
            max_range: default_max_range(),
            sphere_radius: default_sphere_radius(),
            detection_channel: default_detection_channel(),
        }
    }
}

pub struct InteractSampleInput<'a> {
    pub owner: Entity,
    pub origin: Vec3,
    pub spatial: &'a dyn SpatialQuery,
    pub capabilities: &'a dyn TargetCapabilities,
}

#[derive(Component, Debug, Clone)]
pub struct InteractScanner {
    pub config: InteractScanConfig,
    scan: ScanLoop,
}

impl Default for InteractScanner {
    fn default() -> Self {
        Self::new(InteractScanConfig::default())
    }
}

impl InteractScanner {
    pub fn new(config: InteractScanConfig) -> Self {
        let scan = ScanLoop::new(config.scan_interval.clamp(0.01, 1.0));
        Self { config, scan }
    }

    pub fn is_scanning(&self) -> bool {
        self.scan.is_scanning()
    }

    pub fn current_target(&self) -> Option<Entity> {
        self.scan.current_target()
    }

    pub fn start_scan(&mut self, input: &InteractSampleInput) -> Option<TargetChange> {
        if !self.scan.start() {
            return None;
        }

        self.scan_once(input)
    }

    pub fn stop_scan(&mut self) {
        self.scan.stop();
    }

    pub fn sample(&self, input: &InteractSampleInput) -> Option<Entity> {
        let filter = QueryFilter::new(self.config.detection_channel).exclude(input.owner);
        let max_range_sq = self.config.max_range * self.config.max_range;

        input
            .spatial
            .overlap_sphere(input.origin, self.config.sphere_radius, &filter)
            .into_iter()
            .filter(|candidate| input.capabilities.can_interact(*candidate, input.owner))
            .filter_map(|candidate| {
                let dist_sq = input.spatial.position(candidate)?.distance_squared(input.origin);
                (dist_sq <= max_range_sq).then_some((dist_sq, candidate))
            })
            .min_by(|a, b| {
                // Равная дистанция → меньший index, затем generation
                a.0.total_cmp(&b.0)
                    .then((a.1.index(), a.1.generation()).cmp(&(b.1.index(), b.1.generation())))
            })
            .map(|(_, candidate)| candidate)
    }

    pub fn scan_once(&mut self, input: &InteractSampleInput) -> Option<TargetChange> {
        let target = self.sample(input);
        let change = self.scan.apply_sample(target);

        if let Some(change) = change {
            crate::logger::log(&format!("🤝 Interact target: {:?} → {:?}", change.old, change.new));
        }
        change
    }

    pub fn tick(&mut self, delta: Duration, input: &InteractSampleInput) -> Vec<TargetChange> {
        (0..self.scan.tick(delta))
            .filter_map(|_| self.scan_once(input))
            .collect()
    }
}
