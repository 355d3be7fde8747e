//! Actor Core
//!
//! Общая машинерия скриптовых акторов на Bevy 0.16 (headless):
//! - fsm: таблица состояний + first-true-wins dispatch subroutines
//! - collision / volume: геометрические запросы (sphere/cylinder/box, сегменты, sweeps)
//! - movement: интеграция скорости, blocking response, seek/move-to
//! - timing: конверсия авторских длительностей под удвоенный tick rate
//! - host: plugin, registry, damage routing, cues для внешних слоёв

use bevy::prelude::*;

pub mod collision;
pub mod config;
pub mod error;
pub mod fsm;
pub mod host;
pub mod logger;
pub mod movement;
pub mod rng;
pub mod timing;
pub mod volume;

pub use collision::{CollisionResult, ContactKind, GeometryIndex, Plane, StaticGeometry, Surface, SurfaceFlags, TestFlags};
pub use config::{load_values, KernelTuning, SimulationConfig};
pub use error::ConfigError;
pub use fsm::{
    no_action, run_state, ActorClass, ActorContext, ActorState, ProcessFlow, StateMachine, StateTable, StepOutcome,
    Subroutine,
};
pub use host::{
    actor_bundle, create_headless_app, drain_cues, player_bundle, step_tick, ActorClassAppExt, ActorCorePlugin,
    ActorCue, ActorFlags, ActorKind, ActorRegistry, ActorSet, ActorSnapshot, ActorStatus, DamageFlags, DamageRequest,
    Dead, Health, RejectedActorClasses, SimulationClock, Stalled,
};
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, LogLevel, LogPrinter};
pub use movement::{start_move_to, ActorMotion, ContactReport, MoveTo, SeekPlan};
pub use rng::{DeterministicRng, RngStream, RngStreamKind};
pub use timing::{per_tick, ticks, Countdown, RATE_FACTOR};
pub use volume::Volume;

/// Snapshot компонента `T` по всем entities (для сравнения детерминизма)
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
