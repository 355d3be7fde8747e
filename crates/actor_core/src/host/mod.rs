//! Actor host: Bevy plugin, который крутит `Process()` всех акторов
//!
//! Порядок тика (FixedUpdate, детерминированный):
//! 1. `ActorSet::Refresh`: пересборка ActorRegistry
//! 2. `ActorSet::Process`: классы в порядке регистрации, entities по возрастанию
//! 3. `ActorSet::Resolve`: damage routing, Dead marker
//! 4. `ActorSet::Advance`: счётчики, frame++
//!
//! Мутации мира (урон, смерть) только в Resolve: во время Process все
//! акторы видят один и тот же registry snapshot.

pub mod components;
pub mod damage;
pub mod events;
pub mod registry;

pub use components::{ActorFlags, ActorKind, ActorStatus, DamageInbox, Dead, Health, Stalled};
pub use damage::{apply_damage, mark_dead_actors, route_damage_requests, tick_damage_timers};
pub use events::{ActorCue, DamageFlags, DamageRequest};
pub use registry::{refresh_actor_registry, ActorRegistry, ActorSnapshot};

use bevy::prelude::*;

use crate::collision::StaticGeometry;
use crate::config::SimulationConfig;
use crate::fsm::{run_state, ActorClass, ActorContext, ActorState, ProcessFlow, StateMachine, StateTable};
use crate::logger::{init_logger, log, log_error, log_info, log_warning, set_log_level};
use crate::movement::ActorMotion;
use crate::rng::DeterministicRng;

/// Фазы тика
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorSet {
    Refresh,
    Process,
    Resolve,
    Advance,
}

/// Слот класса внутри `ActorSet::Process` (порядок регистрации)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorClassSlot(pub u32);

/// Глобальный frame counter
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationClock {
    pub frame: u64,
}

/// Load-time таблица класса, разделяется всеми инстансами
#[derive(Resource)]
pub struct ClassTable<A: ActorClass>(pub StateTable<A>);

/// Зарегистрированные классы в порядке регистрации
#[derive(Resource, Debug, Clone, Default)]
pub struct ActorClassRoster {
    names: Vec<&'static str>,
}

impl ActorClassRoster {
    fn register(&mut self, name: &'static str) -> u32 {
        self.names.push(name);
        (self.names.len() - 1) as u32
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name)
    }
}

/// Классы, отклонённые при загрузке (class name, причина)
#[derive(Resource, Debug, Clone, Default)]
pub struct RejectedActorClasses(pub Vec<(&'static str, String)>);

impl RejectedActorClasses {
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(rejected, _)| *rejected == name)
    }
}

pub trait ActorClassAppExt {
    /// Валидирует таблицу состояний и подключает dispatch системы класса.
    ///
    /// Невалидная таблица: класс отклоняется (лог + RejectedActorClasses),
    /// его инстансы стоят статично. Остальная симуляция не затронута.
    fn add_actor_class<A: ActorClass>(&mut self) -> &mut Self;
}

impl ActorClassAppExt for App {
    fn add_actor_class<A: ActorClass>(&mut self) -> &mut Self {
        self.init_resource::<ActorClassRoster>();
        self.init_resource::<RejectedActorClasses>();

        if self.world().contains_resource::<ClassTable<A>>() {
            log_warning(&format!("Actor class '{}' already registered", A::NAME));
            return self;
        }

        let table = match A::state_table() {
            Ok(table) => table,
            Err(error) => {
                log_error(&format!("Actor class '{}' rejected: {}", A::NAME, error));
                self.world_mut()
                    .resource_mut::<RejectedActorClasses>()
                    .0
                    .push((A::NAME, error.to_string()));
                return self;
            }
        };

        let states = table.len();
        let slot = self.world_mut().resource_mut::<ActorClassRoster>().register(A::NAME);
        self.insert_resource(ClassTable(table));
        self.configure_sets(FixedUpdate, ActorClassSlot(slot).in_set(ActorSet::Process));
        if slot > 0 {
            self.configure_sets(FixedUpdate, ActorClassSlot(slot).after(ActorClassSlot(slot - 1)));
        }
        self.add_systems(FixedUpdate, run_actor_class::<A>.in_set(ActorClassSlot(slot)));

        log_info(&format!(
            "Actor class '{}' registered (id {}, {} states, slot {})",
            A::NAME,
            A::CLASS_ID,
            states,
            slot
        ));
        self
    }
}

/// Система: `Process()` всех живых инстансов класса
///
/// 1. Входящий урон из inbox → `take_damage` (не поглощён → Health)
/// 2. Always-on часть (`process`)
/// 3. `run_state` + commit pending на границе state machine
/// 4. Буферы cues/damage → события
///
/// Инстанс с начальным состоянием вне таблицы получает `Stalled` и
/// больше не обрабатывается.
#[allow(clippy::type_complexity)]
pub fn run_actor_class<A: ActorClass>(
    mut commands: Commands,
    table: Option<Res<ClassTable<A>>>,
    clock: Res<SimulationClock>,
    geometry: Res<StaticGeometry>,
    registry: Res<ActorRegistry>,
    mut rng: ResMut<DeterministicRng>,
    mut actors: Query<
        (
            Entity,
            &mut A,
            &mut StateMachine<A::State>,
            &mut ActorMotion,
            &mut Health,
            &mut ActorStatus,
            Option<&mut DamageInbox>,
        ),
        (Without<Dead>, Without<Stalled>),
    >,
    mut cue_writer: EventWriter<ActorCue>,
    mut damage_writer: EventWriter<DamageRequest>,
) {
    let Some(table) = table else {
        return;
    };

    // Query order не гарантирован → сортируем (детерминизм)
    let mut entities: Vec<Entity> = actors.iter().map(|(entity, ..)| entity).collect();
    entities.sort();

    let mut cues: Vec<ActorCue> = Vec::new();
    let mut damage: Vec<DamageRequest> = Vec::new();

    for entity in entities {
        let Ok((_, mut actor, mut machine, mut motion, mut health, mut status, inbox)) = actors.get_mut(entity)
        else {
            continue;
        };
        // Актор уничтожен скриптом на прошлом тике, Dead ещё не виден
        if status.is_destroyed() || !health.is_alive() {
            continue;
        }
        if table.0.descriptor(machine.current()).is_none() {
            log_error(&format!(
                "{} {:?}: state {:?} is not in the state table, actor stalled",
                A::NAME,
                entity,
                machine.current()
            ));
            commands.entity(entity).insert(Stalled);
            continue;
        }

        let incoming: Vec<DamageRequest> = match inbox {
            Some(mut inbox) if !inbox.is_empty() => inbox.drain().collect(),
            _ => Vec::new(),
        };

        let mut cx = ActorContext::new(
            entity,
            clock.frame,
            &mut motion,
            &mut health,
            &mut status,
            &*geometry,
            &registry,
            &mut *rng,
            &mut cues,
            &mut damage,
        );
        cx.ticks_in_state = machine.ticks_in_state();

        for request in &incoming {
            if !actor.take_damage(request, &mut cx) {
                cx.apply_damage(request);
            }
        }
        // Убит входящим уроном: state machine больше не крутится
        if !cx.health.is_alive() || cx.status.is_destroyed() {
            continue;
        }

        if actor.process(&mut cx) == ProcessFlow::RunState {
            run_state(&mut *actor, &mut *machine, &table.0, &mut cx);
        }

        if let Some((from, to)) = machine.commit() {
            log(&format!(
                "{} {:?}: {} → {} (frame {})",
                A::NAME,
                entity,
                from.name(),
                to.name(),
                clock.frame
            ));
            cues.push(ActorCue::StateEntered {
                entity,
                class: A::NAME,
                from: from.name(),
                to: to.name(),
                frame: clock.frame,
            });
        }
    }

    cue_writer.write_batch(cues);
    damage_writer.write_batch(damage);
}

/// Система: frame++
pub fn advance_clock(mut clock: ResMut<SimulationClock>) {
    clock.frame += 1;
}

/// Всё, что нужно инстансу класса `A` для dispatch
pub fn actor_bundle<A: ActorClass>(actor: A, motion: ActorMotion, health: Health) -> impl Bundle {
    let machine = StateMachine::new(actor.initial_state());
    (
        actor,
        machine,
        motion,
        health,
        ActorStatus::default(),
        ActorKind::Enemy(A::CLASS_ID),
        DamageInbox::default(),
    )
}

/// Игрок: без state machine, урон сразу в Health
pub fn player_bundle(motion: ActorMotion, health: Health, radius: f32) -> impl Bundle {
    (motion, health, ActorStatus::with_radius(radius), ActorKind::Player)
}

/// Главный plugin ядра акторов
#[derive(Default)]
pub struct ActorCorePlugin {
    pub config: SimulationConfig,
}

impl ActorCorePlugin {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }
}

impl Plugin for ActorCorePlugin {
    fn build(&self, app: &mut App) {
        set_log_level(self.config.log_level);

        app.insert_resource(Time::<Fixed>::from_hz(self.config.tick_hz))
            .insert_resource(DeterministicRng::with_kind(self.config.seed, self.config.rng))
            .insert_resource(self.config.clone())
            .init_resource::<SimulationClock>()
            .init_resource::<ActorRegistry>()
            .init_resource::<StaticGeometry>()
            .init_resource::<ActorClassRoster>()
            .init_resource::<RejectedActorClasses>()
            .register_type::<ActorMotion>()
            .register_type::<Health>()
            .add_event::<ActorCue>()
            .add_event::<DamageRequest>()
            .configure_sets(
                FixedUpdate,
                (ActorSet::Refresh, ActorSet::Process, ActorSet::Resolve, ActorSet::Advance).chain(),
            )
            .add_systems(FixedUpdate, refresh_actor_registry.in_set(ActorSet::Refresh))
            .add_systems(
                FixedUpdate,
                (route_damage_requests, mark_dead_actors).chain().in_set(ActorSet::Resolve),
            )
            .add_systems(
                FixedUpdate,
                (tick_damage_timers, advance_clock).chain().in_set(ActorSet::Advance),
            );

        log_info(&format!(
            "ActorCorePlugin: {} Hz, seed {}, rng {:?}",
            self.config.tick_hz, self.config.seed, self.config.rng
        ));
    }
}

/// Headless app (без рендера): MinimalPlugins + ядро
pub fn create_headless_app(config: SimulationConfig) -> App {
    init_logger();
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(ActorCorePlugin::new(config));
    app
}

/// Ровно один fixed tick (без зависимости от wall clock)
pub fn step_tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
    // Damage events читаются в том же тике
    app.world_mut().resource_mut::<Events<DamageRequest>>().update();
}

/// Забрать накопленные cues (для внешнего слоя и тестов)
pub fn drain_cues(app: &mut App) -> Vec<ActorCue> {
    app.world_mut().resource_mut::<Events<ActorCue>>().drain().collect()
}
