//! Scanner domain — периодический поиск лучшей цели для hack / interact
//!
//! Два независимых сканера одной формы (`ScanLoop`):
//! - `HackScanner` — raycast вперёд из камеры (или pose владельца)
//! - `InteractScanner` — overlap sphere вокруг владельца, ближайший кандидат
//!
//! Физика — black box `SpatialQuery` (здесь `ColliderSnapshot` поверх
//! `SphereCollider`). Предикаты — capability компоненты.
//!
//! Таймеры живут внутри компонентов: despawn владельца = таймеров больше нет.

use bevy::prelude::*;

pub mod capability;
pub mod hack;
pub mod interact;
pub mod scan_loop;
pub mod spatial;

#[cfg(test)]
mod scanner_tests;

pub use capability::{CapabilityQuery, Hackable, Interactable, TargetCapabilities};
pub use hack::{HackSampleInput, HackScanConfig, HackScanner};
pub use interact::{InteractSampleInput, InteractScanConfig, InteractScanner};
pub use scan_loop::{ScanLoop, TargetChange};
pub use spatial::{
    ChannelMask, ColliderSnapshot, CollisionChannel, QueryFilter, RayHit, SpatialQuery, SphereCollider,
};

/// Component: world transform камеры персонажа (hack scan + aim)
///
/// Нет компонента → используется Transform владельца.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ViewPoint(pub Transform);

pub fn view_transform(owner: &Transform, view: Option<&ViewPoint>) -> Transform {
    view.map_or(*owner, |view| view.0)
}

/// Event: hack scanner сменил цель
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HackTargetChanged {
    pub owner: Entity,
    pub old: Option<Entity>,
    pub new: Option<Entity>,
}

/// Event: interact scanner сменил цель
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractTargetChanged {
    pub owner: Entity,
    pub old: Option<Entity>,
    pub new: Option<Entity>,
}

/// Система: auto_start сканеров на spawn (немедленный sample)
pub fn start_scanners_on_spawn(
    mut hack_scanners: Query<(Entity, &mut HackScanner, &Transform, Option<&ViewPoint>), Added<HackScanner>>,
    mut interact_scanners: Query<(Entity, &mut InteractScanner, &Transform), Added<InteractScanner>>,
    colliders: Query<(Entity, &Transform, &SphereCollider)>,
    capabilities: CapabilityQuery,
    mut hack_events: EventWriter<HackTargetChanged>,
    mut interact_events: EventWriter<InteractTargetChanged>,
) {
    if hack_scanners.is_empty() && interact_scanners.is_empty() {
        return;
    }

    let world = ColliderSnapshot::from_colliders(colliders.iter());

    for (owner, mut scanner, transform, view) in hack_scanners.iter_mut() {
        if !scanner.config.auto_start {
            continue;
        }

        let input = HackSampleInput {
            owner,
            view: view_transform(transform, view),
            spatial: &world,
            capabilities: &capabilities,
        };
        if let Some(change) = scanner.start_scan(&input) {
            hack_events.write(HackTargetChanged { owner, old: change.old, new: change.new });
        }
    }

    for (owner, mut scanner, transform) in interact_scanners.iter_mut() {
        if !scanner.config.auto_start {
            continue;
        }

        let input = InteractSampleInput {
            owner,
            origin: transform.translation,
            spatial: &world,
            capabilities: &capabilities,
        };
        if let Some(change) = scanner.start_scan(&input) {
            interact_events.write(InteractTargetChanged { owner, old: change.old, new: change.new });
        }
    }
}

/// Система: периодические hack samples
pub fn tick_hack_scanners(
    time: Res<Time>,
    mut scanners: Query<(Entity, &mut HackScanner, &Transform, Option<&ViewPoint>)>,
    colliders: Query<(Entity, &Transform, &SphereCollider)>,
    capabilities: CapabilityQuery,
    mut events: EventWriter<HackTargetChanged>,
) {
    let world = ColliderSnapshot::from_colliders(colliders.iter());

    for (owner, mut scanner, transform, view) in scanners.iter_mut() {
        if !scanner.is_scanning() {
            continue;
        }

        let input = HackSampleInput {
            owner,
            view: view_transform(transform, view),
            spatial: &world,
            capabilities: &capabilities,
        };
        for change in scanner.tick(time.delta(), &input) {
            events.write(HackTargetChanged { owner, old: change.old, new: change.new });
        }
    }
}

/// Система: периодические interact samples
pub fn tick_interact_scanners(
    time: Res<Time>,
    mut scanners: Query<(Entity, &mut InteractScanner, &Transform)>,
    colliders: Query<(Entity, &Transform, &SphereCollider)>,
    capabilities: CapabilityQuery,
    mut events: EventWriter<InteractTargetChanged>,
) {
    let world = ColliderSnapshot::from_colliders(colliders.iter());

    for (owner, mut scanner, transform) in scanners.iter_mut() {
        if !scanner.is_scanning() {
            continue;
        }

        let input = InteractSampleInput {
            owner,
            origin: transform.translation,
            spatial: &world,
            capabilities: &capabilities,
        };
        for change in scanner.tick(time.delta(), &input) {
            events.write(InteractTargetChanged { owner, old: change.old, new: change.new });
        }
    }
}

/// Scanner Plugin
///
/// FixedUpdate: start_scanners_on_spawn → tick_hack_scanners → tick_interact_scanners
pub struct ScannerPlugin;

impl Plugin for ScannerPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<HackTargetChanged>()
            .add_event::<InteractTargetChanged>();

        app.add_systems(
            FixedUpdate,
            (start_scanners_on_spawn, tick_hack_scanners, tick_interact_scanners)
                .chain()
                .in_set(crate::GameplaySet::Scanners),
        );
    }
}
