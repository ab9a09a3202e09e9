//! Headless симуляция Ghostline
//!
//! Один персонаж: экипировка, зажатый огонь по стене, reload, hack терминала.
//! Опционально: путь к JSON конфигу первым аргументом.

use bevy::prelude::*;
use ghostline_simulation::scanner::{CollisionChannel, HackScanner, SphereCollider};
use ghostline_simulation::*;

fn main() {
    let seed = 42;
    println!("Starting Ghostline headless simulation (seed: {})", seed);

    let config = match std::env::args().nth(1) {
        Some(path) => match GameplayConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{}", err);
                std::process::exit(1);
            }
        },
        None => GameplayConfig::default(),
    };

    let mut app = create_headless_app(seed);
    app.add_plugins(GhostlinePlugin::new(config.clone()));

    let hero = app
        .world_mut()
        .spawn(CharacterBundle::from_config(&config, Transform::IDENTITY))
        .id();

    // Стена под огнём + терминал сбоку
    app.world_mut().spawn((
        Transform::from_xyz(0.0, 0.0, -20.0),
        SphereCollider::new(3.0, CollisionChannel::WorldStatic),
    ));
    app.world_mut().spawn((
        Transform::from_xyz(0.0, 0.0, -6.0).looking_at(Vec3::ZERO, Vec3::Y),
        SphereCollider::new(0.5, CollisionChannel::WorldStatic),
        Hackable::default(),
    ));

    let script = [
        (10, CombatAction::ToggleWeapon),
        (20, CombatAction::FirePressed),
        (300, CombatAction::FireReleased),
        (320, CombatAction::Hack),
        (400, CombatAction::ToggleFocus),
        (600, CombatAction::Teardown),
    ];

    let mut impacts = 0;
    for tick in 0..1000 {
        for (_, action) in script.iter().filter(|(at, _)| *at == tick) {
            app.world_mut().send_event(CombatIntent::new(hero, *action));
        }

        app.update();
        impacts += app
            .world_mut()
            .resource_mut::<Events<ProjectileImpact>>()
            .drain()
            .count();

        if tick % 100 == 0 {
            let world = app.world();
            let weapon = world.get::<WeaponController>(hero);
            let stats = config
                .pool_buckets
                .first()
                .map(|bucket| world.resource::<ProjectilePool>().stats(&bucket.class));
            let target = world.get::<HackScanner>(hero).and_then(HackScanner::current_target);

            println!(
                "Tick {}: ammo {:?}, pool {:?}, impacts {}, hack target {:?}",
                tick,
                weapon.map(|weapon| (weapon.ammo_in_mag(), weapon.reserve_ammo())),
                stats,
                impacts,
                target
            );
        }
    }

    println!("Simulation complete!");
}
