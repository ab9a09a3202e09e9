//! Projectile systems (FixedUpdate)

use bevy::prelude::*;

use super::{handle_contact, return_to_pool, CollisionOther, ProjectileCollision, ProjectileImpact, ProjectilePool};
use crate::scanner::spatial::{ColliderSnapshot, SphereCollider, SpatialQuery};

/// Система: внешние контакты (hit / overlap-begin) → return + impact
pub fn process_projectile_collisions(
    mut collisions: EventReader<ProjectileCollision>,
    pool: Option<ResMut<ProjectilePool>>,
    mut impacts: EventWriter<ProjectileImpact>,
) {
    let Some(mut pool) = pool else {
        collisions.clear();
        return;
    };

    for collision in collisions.read() {
        if let Some(impact) = handle_contact(&mut pool, collision.projectile, collision.other, collision.point) {
            impacts.write(impact);
        }
    }
}

/// Система: движение активных снарядов + sweep против `SphereCollider`
///
/// Sweep = raycast на длину шага. Первый hit → impact + return.
pub fn move_projectiles(
    time: Res<Time>,
    pool: Option<ResMut<ProjectilePool>>,
    colliders: Query<(Entity, &Transform, &SphereCollider)>,
    mut impacts: EventWriter<ProjectileImpact>,
) {
    let Some(mut pool) = pool else {
        return;
    };

    let delta = time.delta_secs();
    if delta <= 0.0 {
        return;
    }

    let world = ColliderSnapshot::from_colliders(colliders.iter());

    for handle in pool.active_handles() {
        if !pool.activity(handle).is_some_and(|activity| activity.tick_enabled) {
            continue;
        }

        let Some((projectile, transform)) = pool.instance_and_transform_mut(handle) else {
            continue;
        };

        let step = projectile.integrate(delta);
        let distance = step.length();
        if distance <= f32::EPSILON {
            continue;
        }

        let filter = projectile.query_filter();
        match world.raycast(transform.translation, step, distance, &filter) {
            Some(hit) => {
                transform.translation = hit.point;
                if let Some(impact) = handle_contact(&mut pool, handle, CollisionOther::Actor(hit.entity), hit.point) {
                    impacts.write(impact);
                }
            }
            None => {
                transform.translation += step;
            }
        }
    }
}

/// Система: life timer → return
pub fn expire_projectiles(time: Res<Time>, pool: Option<ResMut<ProjectilePool>>) {
    let Some(mut pool) = pool else {
        return;
    };

    let delta = time.delta();

    for handle in pool.active_handles() {
        let expired = pool.get_mut(handle).is_some_and(|projectile| projectile.tick_life(delta));
        if expired {
            crate::logger::log(&format!("⏱️ Projectile {:?} expired", handle));
            return_to_pool(&mut pool, handle);
        }
    }
}
