use super::*;
use bevy::prelude::*;
use std::time::Duration;

fn entity(index: u32) -> Entity {
    Entity::from_raw(index)
}

const OWNER: u32 = 1;

/// Stub capabilities: явные списки валидных целей
#[derive(Default)]
struct Caps {
    hackable: Vec<Entity>,
    interactable: Vec<Entity>,
}

impl TargetCapabilities for Caps {
    fn can_hack(&self, candidate: Entity, _hacker: Entity) -> bool {
        self.hackable.contains(&candidate)
    }

    fn can_interact(&self, candidate: Entity, _interactor: Entity) -> bool {
        self.interactable.contains(&candidate)
    }
}

/// Владелец в origin (со своим коллайдером), смотрит в -Z
fn world_with_owner() -> ColliderSnapshot {
    let mut world = ColliderSnapshot::new();
    world.insert(entity(OWNER), Vec3::ZERO, SphereCollider::new(0.5, CollisionChannel::Pawn));
    world
}

fn hack_input<'a>(world: &'a ColliderSnapshot, caps: &'a Caps) -> HackSampleInput<'a> {
    HackSampleInput {
        owner: entity(OWNER),
        view: Transform::IDENTITY,
        spatial: world,
        capabilities: caps,
    }
}

fn interact_input<'a>(world: &'a ColliderSnapshot, caps: &'a Caps) -> InteractSampleInput<'a> {
    InteractSampleInput {
        owner: entity(OWNER),
        origin: Vec3::ZERO,
        spatial: world,
        capabilities: caps,
    }
}

#[test]
fn test_hysteresis_emits_only_on_identity_change() {
    let mut scan = ScanLoop::new(0.05);
    let a = Some(entity(10));
    let b = Some(entity(11));

    let changes: Vec<TargetChange> = [a, a, b, b, None, a]
        .into_iter()
        .filter_map(|sample| scan.apply_sample(sample))
        .collect();

    assert_eq!(
        changes,
        vec![
            TargetChange { old: None, new: a },
            TargetChange { old: a, new: b },
            TargetChange { old: b, new: None },
            TargetChange { old: None, new: a },
        ]
    );
    assert_eq!(scan.current_target(), a);
}

#[test]
fn test_start_scan_samples_immediately_and_is_idempotent() {
    let mut world = world_with_owner();
    world.insert(entity(10), Vec3::new(0.0, 0.0, -5.0), SphereCollider::new(0.5, CollisionChannel::WorldStatic));
    let caps = Caps { hackable: vec![entity(10)], ..default() };

    let mut scanner = HackScanner::default();
    assert!(!scanner.is_scanning());

    let change = scanner.start_scan(&hack_input(&world, &caps));
    assert_eq!(change, Some(TargetChange { old: None, new: Some(entity(10)) }));
    assert!(scanner.is_scanning());

    // Повторный start — no-op, без второго события
    assert_eq!(scanner.start_scan(&hack_input(&world, &caps)), None);
    assert!(scanner.is_scanning());
    assert_eq!(scanner.current_target(), Some(entity(10)));
}

#[test]
fn test_tick_resamples_and_stop_cancels_future_samples() {
    let mut world = world_with_owner();
    world.insert(entity(10), Vec3::new(0.0, 0.0, -5.0), SphereCollider::new(0.5, CollisionChannel::WorldStatic));
    let caps = Caps { hackable: vec![entity(10)], ..default() };

    let mut scanner = HackScanner::default();
    scanner.start_scan(&hack_input(&world, &caps));

    // Меньше интервала — sample не было
    let empty = world_with_owner();
    assert!(scanner.tick(Duration::from_millis(20), &hack_input(&empty, &caps)).is_empty());

    // Цель исчезла → A → None
    let changes = scanner.tick(Duration::from_millis(40), &hack_input(&empty, &caps));
    assert_eq!(changes, vec![TargetChange { old: Some(entity(10)), new: None }]);

    scanner.start_scan(&hack_input(&empty, &caps));
    scanner.stop_scan();
    assert!(!scanner.is_scanning());
    assert!(scanner.tick(Duration::from_secs(1), &hack_input(&world, &caps)).is_empty());
    assert_eq!(scanner.current_target(), None);
}

#[test]
fn test_stop_keeps_current_target() {
    let mut world = world_with_owner();
    world.insert(entity(10), Vec3::new(0.0, 0.0, -5.0), SphereCollider::new(0.5, CollisionChannel::WorldStatic));
    let caps = Caps { hackable: vec![entity(10)], ..default() };

    let mut scanner = HackScanner::default();
    scanner.start_scan(&hack_input(&world, &caps));
    scanner.stop_scan();

    assert_eq!(scanner.current_target(), Some(entity(10)));
}

#[test]
fn test_hack_ray_skips_owner_and_requires_first_hit_hackable() {
    let mut world = world_with_owner();
    world.insert(entity(10), Vec3::new(0.0, 0.0, -8.0), SphereCollider::new(0.5, CollisionChannel::WorldStatic));
    let caps = Caps { hackable: vec![entity(10)], ..default() };
    let scanner = HackScanner::default();

    // Свой коллайдер в origin не блокирует луч
    assert_eq!(scanner.sample(&hack_input(&world, &caps)), Some(entity(10)));

    // Стена перед терминалом: первый hit не hackable → нет цели
    world.insert(entity(11), Vec3::new(0.0, 0.0, -4.0), SphereCollider::new(0.5, CollisionChannel::WorldStatic));
    assert_eq!(scanner.sample(&hack_input(&world, &caps)), None);
}

#[test]
fn test_hack_ray_respects_max_range() {
    let mut world = world_with_owner();
    world.insert(entity(10), Vec3::new(0.0, 0.0, -20.0), SphereCollider::new(0.5, CollisionChannel::WorldStatic));
    let caps = Caps { hackable: vec![entity(10)], ..default() };

    let scanner = HackScanner::default();
    assert_eq!(scanner.sample(&hack_input(&world, &caps)), None);

    let far_scanner = HackScanner::new(HackScanConfig { max_range: 25.0, ..default() });
    assert_eq!(far_scanner.sample(&hack_input(&world, &caps)), Some(entity(10)));
}

#[test]
fn test_interact_picks_nearest_with_lowest_entity_tie_break() {
    let mut world = world_with_owner();
    let collider = || SphereCollider::new(0.6, CollisionChannel::Interactable);
    world.insert(entity(5), Vec3::new(1.5, 0.0, 0.0), collider());
    world.insert(entity(3), Vec3::new(-1.5, 0.0, 0.0), collider());
    let mut caps = Caps { interactable: vec![entity(3), entity(5)], ..default() };

    let scanner = InteractScanner::default();
    assert_eq!(scanner.sample(&interact_input(&world, &caps)), Some(entity(3)));

    // Ближе, но не interactable → игнорируется
    world.insert(entity(9), Vec3::new(0.0, 0.0, 1.0), collider());
    assert_eq!(scanner.sample(&interact_input(&world, &caps)), Some(entity(3)));

    caps.interactable.push(entity(9));
    assert_eq!(scanner.sample(&interact_input(&world, &caps)), Some(entity(9)));
}

#[test]
fn test_interact_tie_break_compares_index_before_generation() {
    // index 7 / generation 1 против index 5 / generation 2:
    // по to_bits() первым был бы index 7, по index — index 5
    let old_slot = Entity::from_bits((1_u64 << 32) | 7);
    let reused_slot = Entity::from_bits((2_u64 << 32) | 5);
    assert!(old_slot < reused_slot);

    let mut world = world_with_owner();
    let collider = || SphereCollider::new(0.6, CollisionChannel::Interactable);
    world.insert(old_slot, Vec3::new(0.0, 0.0, 1.5), collider());
    world.insert(reused_slot, Vec3::new(0.0, 0.0, -1.5), collider());
    let caps = Caps { interactable: vec![old_slot, reused_slot], ..default() };

    let scanner = InteractScanner::default();
    assert_eq!(scanner.sample(&interact_input(&world, &caps)), Some(reused_slot));
}

#[test]
fn test_interact_filters_candidates_beyond_max_range() {
    let mut world = world_with_owner();
    // Большой коллайдер пересекает сферу, но центр дальше max_range (2.5)
    world.insert(entity(4), Vec3::new(3.0, 0.0, 0.0), SphereCollider::new(2.5, CollisionChannel::Interactable));
    let caps = Caps { interactable: vec![entity(4)], ..default() };

    let scanner = InteractScanner::default();
    assert_eq!(scanner.sample(&interact_input(&world, &caps)), None);
}

#[test]
fn test_scan_interval_is_clamped() {
    let mut world = world_with_owner();
    world.insert(entity(10), Vec3::new(0.0, 0.0, -5.0), SphereCollider::new(0.5, CollisionChannel::WorldStatic));
    let caps = Caps { hackable: vec![entity(10)], ..default() };

    // 5.0 → clamp 1.0: через 1.1 секунды sample уже был
    let mut scanner = HackScanner::new(HackScanConfig { scan_interval: 5.0, ..default() });
    let empty = world_with_owner();
    scanner.start_scan(&hack_input(&world, &caps));

    let changes = scanner.tick(Duration::from_millis(1100), &hack_input(&empty, &caps));
    assert_eq!(changes.len(), 1);
}

#[test]
fn test_scanner_plugin_emits_events_in_app() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .configure_sets(
            FixedUpdate,
            (
                crate::GameplaySet::Input,
                crate::GameplaySet::Weapons,
                crate::GameplaySet::Projectiles,
                crate::GameplaySet::Scanners,
            )
                .chain(),
        )
        .add_plugins(ScannerPlugin);

    let owner = app
        .world_mut()
        .spawn((Transform::IDENTITY, HackScanner::default(), InteractScanner::default()))
        .id();
    let terminal = app
        .world_mut()
        .spawn((
            Transform::from_xyz(0.0, 0.0, -6.0),
            SphereCollider::new(0.5, CollisionChannel::WorldStatic),
            Hackable::default(),
        ))
        .id();

    app.world_mut().run_schedule(FixedUpdate);

    let hack_events: Vec<HackTargetChanged> = app
        .world_mut()
        .resource_mut::<Events<HackTargetChanged>>()
        .drain()
        .collect();
    assert_eq!(
        hack_events,
        vec![HackTargetChanged { owner, old: None, new: Some(terminal) }]
    );

    let scanner = app.world().get::<InteractScanner>(owner).unwrap();
    assert!(scanner.is_scanning());
    assert_eq!(scanner.current_target(), None);
}
