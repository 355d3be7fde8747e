//! Damage routing + death marking
//!
//! Урон по скриптовым акторам идёт в `DamageInbox` и обрабатывается в их
//! следующем `Process()` (`ActorClass::take_damage`). Остальные цели
//! (игроки, объекты без скрипта) получают урон сразу в Health.

use bevy::prelude::*;

use super::components::{ActorFlags, ActorStatus, DamageInbox, Dead, Health, Stalled};
use super::events::{ActorCue, DamageFlags, DamageRequest};
use super::SimulationClock;
use crate::logger::{log_info, log_warning};

/// Применяет урон к Health с учётом INVINCIBLE.
///
/// Возвращает true если этот удар убил.
pub fn apply_damage(health: &mut Health, status: Option<&mut ActorStatus>, request: &DamageRequest) -> bool {
    if let Some(status) = status {
        if status.flags.contains(ActorFlags::INVINCIBLE) && !request.flags.contains(DamageFlags::IGNORE_INVINCIBLE) {
            return false;
        }
        status.ticks_since_damage = 0;
    }
    if request.flags.contains(DamageFlags::KILL) {
        return health.take_damage(health.current);
    }
    health.take_damage(request.amount)
}

/// Система: DamageRequest → inbox скриптового актора или Health
#[allow(clippy::type_complexity)]
pub fn route_damage_requests(
    mut requests: EventReader<DamageRequest>,
    mut inboxes: Query<&mut DamageInbox, (Without<Dead>, Without<Stalled>)>,
    mut plain: Query<
        (&mut Health, Option<&mut ActorStatus>),
        (Or<(Without<DamageInbox>, With<Stalled>)>, Without<Dead>),
    >,
    dead: Query<(), With<Dead>>,
) {
    for request in requests.read() {
        if let Ok(mut inbox) = inboxes.get_mut(request.target) {
            inbox.push(*request);
            continue;
        }

        if let Ok((mut health, status)) = plain.get_mut(request.target) {
            let status = status.map(|s| s.into_inner());
            if apply_damage(&mut health, status, request) {
                log_info(&format!("💀 {:?} killed by {:?}", request.target, request.source));
            }
            continue;
        }

        // Урон по трупу: норма (несколько источников за тик)
        if !dead.contains(request.target) {
            log_warning(&format!(
                "DamageRequest: target {:?} has no Health (source {:?})",
                request.target, request.source
            ));
        }
    }
}

/// Система: Dead marker для health == 0 или DESTROYED
///
/// Деспавн не автоматический.
pub fn mark_dead_actors(
    mut commands: Commands,
    clock: Res<SimulationClock>,
    actors: Query<(Entity, &Health, Option<&ActorStatus>), Without<Dead>>,
    mut cues: EventWriter<ActorCue>,
) {
    let mut dying: Vec<Entity> = actors
        .iter()
        .filter(|(_, health, status)| !health.is_alive() || status.is_some_and(|s| s.is_destroyed()))
        .map(|(entity, ..)| entity)
        .collect();
    dying.sort();

    for entity in dying {
        commands.entity(entity).insert(Dead);
        cues.write(ActorCue::Died {
            entity,
            frame: clock.frame,
        });
        log_info(&format!("Actor {:?} died (frame {})", entity, clock.frame));
    }
}

/// Система: счётчик тиков с последнего урона
pub fn tick_damage_timers(mut statuses: Query<&mut ActorStatus, Without<Dead>>) {
    for mut status in statuses.iter_mut() {
        status.ticks_since_damage = status.ticks_since_damage.saturating_add(1);
    }
}
