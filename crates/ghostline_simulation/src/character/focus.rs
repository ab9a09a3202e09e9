//! Focus mode — slow-motion + post-process blend
//!
//! Ядро только выставляет target: relative speed для `Time<Virtual>` и
//! blend weight. Сам post-process — рендер.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSettings {
    /// Relative speed виртуального времени в focus mode
    #[serde(default = "default_time_dilation")]
    pub time_dilation: f32,
    /// Время fade blend weight 0 ⇄ 1 (сек)
    #[serde(default = "default_blend_fade_secs")]
    pub blend_fade_secs: f32,
}

fn default_time_dilation() -> f32 {
    0.3
}

fn default_blend_fade_secs() -> f32 {
    0.25
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            time_dilation: default_time_dilation(),
            blend_fade_secs: default_blend_fade_secs(),
        }
    }
}

/// Component: focus mode персонажа
#[derive(Component, Debug, Clone, PartialEq)]
pub struct FocusMode {
    pub settings: FocusSettings,
    active: bool,
    blend_weight: f32,
}

impl Default for FocusMode {
    fn default() -> Self {
        Self::new(FocusSettings::default())
    }
}

impl FocusMode {
    pub fn new(settings: FocusSettings) -> Self {
        Self {
            settings,
            active: false,
            blend_weight: 0.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn blend_weight(&self) -> f32 {
        self.blend_weight
    }

    pub fn target_blend_weight(&self) -> f32 {
        if self.active {
            1.0
        } else {
            0.0
        }
    }

    /// Желаемая relative speed виртуального времени
    pub fn time_dilation(&self) -> f32 {
        if self.active {
            self.settings.time_dilation.clamp(0.01, 1.0)
        } else {
            1.0
        }
    }

    pub fn is_fading(&self) -> bool {
        self.blend_weight != self.target_blend_weight()
    }

    /// Возвращает новое состояние
    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        crate::logger::log(if self.active { "🕰️ Focus mode ON" } else { "🕰️ Focus mode OFF" });
        self.active
    }

    /// Teardown: мгновенный выход без fade
    pub fn force_exit(&mut self) {
        self.active = false;
        self.blend_weight = 0.0;
    }

    pub fn tick(&mut self, delta_secs: f32) {
        let target = self.target_blend_weight();
        if self.settings.blend_fade_secs <= 0.0 {
            self.blend_weight = target;
            return;
        }

        let step = delta_secs / self.settings.blend_fade_secs;
        self.blend_weight = if self.blend_weight < target {
            (self.blend_weight + step).min(target)
        } else {
            (self.blend_weight - step).max(target)
        };
    }
}
