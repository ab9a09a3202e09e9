//! Aim (ADS) — zoom timeline + world aim trace
//!
//! FOV/рендер вне ядра: наружу отдаётся только `alpha` (0 = hip, 1 = ADS).

use bevy::prelude::*;

use crate::scanner::spatial::{ColliderSnapshot, CollisionChannel, QueryFilter, SpatialQuery};
use crate::weapon::AimProvider;

/// Play rate zoom-in (alpha/сек)
pub const ZOOM_IN_RATE: f32 = 3.0;
/// Play rate zoom-out (alpha/сек)
pub const ZOOM_OUT_RATE: f32 = 1.0;

/// Component: прицеливание персонажа
#[derive(Component, Debug, Clone, PartialEq)]
pub struct AimState {
    wants_aim: bool,
    alpha: f32,
    zoom_in_rate: f32,
    zoom_out_rate: f32,
}

impl Default for AimState {
    fn default() -> Self {
        Self {
            wants_aim: false,
            alpha: 0.0,
            zoom_in_rate: ZOOM_IN_RATE,
            zoom_out_rate: ZOOM_OUT_RATE,
        }
    }
}

impl AimState {
    pub fn wants_aim(&self) -> bool {
        self.wants_aim
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Timeline ещё не дошёл до цели
    pub fn is_zooming(&self) -> bool {
        let target = if self.wants_aim { 1.0 } else { 0.0 };
        self.alpha != target
    }

    /// true если состояние изменилось (вызывающий ставит ADS tag)
    pub fn press(&mut self) -> bool {
        if self.wants_aim {
            return false;
        }

        self.wants_aim = true;
        true
    }

    /// true если состояние изменилось (вызывающий снимает ADS tag)
    pub fn release(&mut self) -> bool {
        if !self.wants_aim {
            return false;
        }

        self.wants_aim = false;
        true
    }

    /// Cancel handler для ADS: zoom-out без обратного notify в core
    pub fn cancel(&mut self) {
        if self.wants_aim {
            crate::logger::log("🎯 Aim cancelled");
        }
        self.wants_aim = false;
    }

    pub fn tick(&mut self, delta_secs: f32) {
        self.alpha = if self.wants_aim {
            (self.alpha + self.zoom_in_rate * delta_secs).min(1.0)
        } else {
            (self.alpha - self.zoom_out_rate * delta_secs).max(0.0)
        };
    }

    /// Teardown: timeline остановлен и сброшен
    pub fn reset(&mut self) {
        self.wants_aim = false;
        self.alpha = 0.0;
    }
}

/// Aim trace по снимку коллайдеров мира (камера или pose владельца)
pub struct WorldAim<'a> {
    pub owner: Entity,
    pub view: Transform,
    pub world: &'a ColliderSnapshot,
}

impl AimProvider for WorldAim<'_> {
    fn aim_hit_point(&self, range: f32, channel: CollisionChannel) -> Option<Vec3> {
        let filter = QueryFilter::new(channel).exclude(self.owner);
        self.world
            .raycast(self.view.translation, *self.view.forward(), range, &filter)
            .map(|hit| hit.point)
    }

    fn view_point(&self) -> Transform {
        self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::spatial::SphereCollider;

    #[test]
    fn test_zoom_rates_differ() {
        let mut aim = AimState::default();
        assert!(aim.press());
        assert!(!aim.press());

        aim.tick(0.2);
        assert!((aim.alpha() - 0.6).abs() < 1e-5);
        aim.tick(1.0);
        assert_eq!(aim.alpha(), 1.0);
        assert!(!aim.is_zooming());

        assert!(aim.release());
        aim.tick(0.5);
        assert!((aim.alpha() - 0.5).abs() < 1e-5);
        assert!(aim.is_zooming());
    }

    #[test]
    fn test_world_aim_excludes_owner() {
        let owner = Entity::from_raw(1);
        let wall = Entity::from_raw(2);

        let mut world = ColliderSnapshot::new();
        world.insert(owner, Vec3::ZERO, SphereCollider::new(0.5, CollisionChannel::Pawn));
        world.insert(wall, Vec3::new(0.0, 0.0, -10.0), SphereCollider::new(1.0, CollisionChannel::WorldStatic));

        let aim = WorldAim {
            owner,
            view: Transform::IDENTITY,
            world: &world,
        };

        let point = aim.aim_hit_point(100.0, CollisionChannel::Visibility).unwrap();
        assert!((point - Vec3::new(0.0, 0.0, -9.0)).length() < 1e-4);
        assert!(aim.aim_hit_point(5.0, CollisionChannel::Visibility).is_none());
    }
}
