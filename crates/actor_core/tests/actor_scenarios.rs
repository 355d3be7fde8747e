//! Integration tests: полный тик через ActorCorePlugin (dispatch, урон, смерть)

mod common;

use actor_core::*;
use approx::assert_relative_eq;
use bevy::prelude::*;
use common::*;

fn sentry_at(app: &mut App, position: Vec3) -> Entity {
    spawn_sentry(app, Sentry::new(SentryValues::default(), position), position)
}

fn kill_request(target: Entity) -> DamageRequest {
    DamageRequest {
        source: None,
        target,
        amount: 0,
        flags: DamageFlags::KILL,
        direction: Vec3::Z,
    }
}

#[test]
fn test_timer_of_three_transitions_on_fourth_tick() {
    let mut app = test_app(7, RngStreamKind::Chacha8);
    let home = Vec3::new(0.0, 0.75, 0.0);
    let sentry = Sentry {
        wait: Countdown::raw(3),
        ..Sentry::new(SentryValues::default(), home)
    };
    let entity = spawn_sentry(&mut app, sentry, home);

    let cues = run_ticks(&mut app, 3);
    assert!(state_entries(&cues, entity).is_empty(), "Переход раньше 4-го тика");

    let cues = run_ticks(&mut app, 1);
    assert_eq!(state_entries(&cues, entity), vec![("idle", "roam", 3)]);
    assert!(cues.contains(&ActorCue::Animation {
        entity,
        id: ANIM_ROAM,
        flags: 0
    }));
}

#[test]
fn test_roam_arrives_and_returns_to_idle() {
    let mut app = test_app(99, RngStreamKind::Chacha8);
    let home = Vec3::new(0.0, 0.75, 0.0);
    let entity = sentry_at(&mut app, home);

    let cues = run_ticks(&mut app, 200);
    let entries = state_entries(&cues, entity);
    assert_eq!(entries[0].0, "idle");
    assert_eq!(entries[0].1, "roam");
    // Пауза 10 исходных тиков = 20 тиков, fire на 21-м
    assert_eq!(entries[0].2, 20);
    assert!(entries.iter().any(|(from, to, _)| *from == "roam" && *to == "idle"));

    let motion = app.world().get::<ActorMotion>(entity).unwrap();
    assert_relative_eq!(motion.position.y, 0.75, epsilon = 1e-4);
    assert!(motion.position.x.abs() <= 2.75 && motion.position.z.abs() <= 2.75);
}

#[test]
fn test_seek_turn_then_charge() {
    let mut app = test_app(3, RngStreamKind::Chacha8);
    let entity = sentry_at(&mut app, Vec3::new(0.0, 0.75, 0.0));
    spawn_player(&mut app, Vec3::new(3.0, 0.75, 0.0), 100);

    let cues = run_ticks(&mut app, 9);
    let entries = state_entries(&cues, entity);
    // 90° за 4 исходных шага → 8 тиков поворота
    assert_eq!(entries, vec![("idle", "turn", 0), ("turn", "charge", 8)]);
    assert!(cues.contains(&ActorCue::Sfx { entity, id: SFX_ALERT }));

    let motion = app.world().get::<ActorMotion>(entity).unwrap();
    assert_relative_eq!(motion.facing.x, 1.0, epsilon = 1e-4);
    assert!(motion.speed.x > 0.0);
}

#[test]
fn test_known_odd_guard_never_fires() {
    // Игрок прямо в позиции актора: squared length 0 < -1.0 ложно,
    // поэтому первым срабатывает player_spotted, а не прямой переход в charge
    let mut app = test_app(5, RngStreamKind::Chacha8);
    let position = Vec3::new(1.0, 0.75, 1.0);
    let entity = sentry_at(&mut app, position);
    spawn_player(&mut app, position, 1_000);

    let cues = run_ticks(&mut app, 1);
    assert_eq!(state_entries(&cues, entity), vec![("idle", "turn", 0)]);
}

#[test]
fn test_hidden_player_is_not_spotted() {
    let mut app = test_app(5, RngStreamKind::Chacha8);
    let entity = sentry_at(&mut app, Vec3::new(0.0, 0.75, 0.0));
    let player = spawn_player(&mut app, Vec3::new(3.0, 0.75, 0.0), 100);
    app.world_mut()
        .get_mut::<ActorStatus>(player)
        .unwrap()
        .flags
        .remove(ActorFlags::VISIBLE);

    let cues = run_ticks(&mut app, 9);
    assert!(state_entries(&cues, entity).is_empty());
    assert!(!cues.contains(&ActorCue::Sfx { entity, id: SFX_ALERT }));
}

#[test]
fn test_contact_damage_kills_player() {
    let mut app = test_app(11, RngStreamKind::Chacha8);
    sentry_at(&mut app, Vec3::new(0.0, 0.75, 0.0));
    let player = spawn_player(&mut app, Vec3::new(0.5, 0.75, 0.0), 10);

    run_ticks(&mut app, 1);
    assert_eq!(app.world().get::<Health>(player).unwrap().current, 5);
    assert!(app.world().get::<Dead>(player).is_none());

    let cues = run_ticks(&mut app, 1);
    assert_eq!(app.world().get::<Health>(player).unwrap().current, 0);
    assert!(app.world().get::<Dead>(player).is_some());
    assert!(cues.contains(&ActorCue::Died { entity: player, frame: 1 }));

    // Мёртвый игрок выпадает из registry → урона больше нет
    run_ticks(&mut app, 3);
    let registry = app.world().resource::<ActorRegistry>();
    assert!(registry.main_player().is_none());
}

#[test]
fn test_invincible_player_ignores_contact_damage() {
    let mut app = test_app(11, RngStreamKind::Chacha8);
    sentry_at(&mut app, Vec3::new(0.0, 0.75, 0.0));
    let player = spawn_player(&mut app, Vec3::new(0.5, 0.75, 0.0), 10);
    app.world_mut()
        .get_mut::<ActorStatus>(player)
        .unwrap()
        .flags
        .insert(ActorFlags::INVINCIBLE);

    run_ticks(&mut app, 4);
    assert_eq!(app.world().get::<Health>(player).unwrap().current, 10);
}

#[test]
fn test_shield_absorbs_before_health() {
    let mut app = test_app(13, RngStreamKind::Chacha8);
    let position = Vec3::new(0.0, 0.75, 0.0);
    let values = SentryValues {
        shield: 1,
        ..SentryValues::default()
    };
    let entity = spawn_sentry(&mut app, Sentry::new(values, position), position);

    let hit = DamageRequest {
        source: None,
        target: entity,
        amount: 4,
        flags: DamageFlags::empty(),
        direction: Vec3::X,
    };
    app.world_mut().send_event(hit);
    app.world_mut().send_event(hit);

    // Тик 1: урон лежит в inbox
    run_ticks(&mut app, 1);
    assert_eq!(app.world().get::<Health>(entity).unwrap().current, 20);

    // Тик 2: Process() разбирает inbox, щит съедает первый удар
    run_ticks(&mut app, 1);
    assert_eq!(app.world().get::<Health>(entity).unwrap().current, 16);
    assert_eq!(app.world().get::<Sentry>(entity).unwrap().absorbed, 1);
    assert_eq!(app.world().get::<ActorStatus>(entity).unwrap().ticks_since_damage, 1);
}

#[test]
fn test_killed_actor_stops_state_machine() {
    let mut app = test_app(17, RngStreamKind::Chacha8);
    let home = Vec3::new(0.0, 0.75, 0.0);
    let sentry = Sentry {
        wait: Countdown::raw(3),
        ..Sentry::new(SentryValues::default(), home)
    };
    let entity = spawn_sentry(&mut app, sentry, home);
    app.world_mut().send_event(kill_request(entity));

    let cues = run_ticks(&mut app, 2);
    assert!(app.world().get::<Dead>(entity).is_some());
    assert!(cues.contains(&ActorCue::Died { entity, frame: 1 }));

    // Таймер истёк бы на 4-м тике, но dispatch остановлен
    let cues = run_ticks(&mut app, 20);
    assert!(state_entries(&cues, entity).is_empty());
    assert_eq!(
        app.world().get::<StateMachine<SentryState>>(entity).unwrap().current(),
        SentryState::Idle
    );
}

#[test]
fn test_rejected_class_does_not_stop_simulation() {
    let mut app = test_app(19, RngStreamKind::Chacha8);
    app.add_actor_class::<BrokenSentry>();

    let rejected = app.world().resource::<RejectedActorClasses>();
    assert!(rejected.contains("broken_sentry"));

    let broken = app
        .world_mut()
        .spawn(actor_bundle(BrokenSentry, ActorMotion::at(Vec3::new(4.0, 0.75, 4.0)), Health::new(5)))
        .id();
    let home = Vec3::new(0.0, 0.75, 0.0);
    let sentry = Sentry {
        wait: Countdown::raw(0),
        ..Sentry::new(SentryValues::default(), home)
    };
    let working = spawn_sentry(&mut app, sentry, home);

    let cues = run_ticks(&mut app, 5);
    assert!(state_entries(&cues, broken).is_empty());
    assert!(cues.iter().all(|cue| cue.entity() != broken));
    assert_eq!(state_entries(&cues, working)[0], ("idle", "roam", 0));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriftState {
    Hover,
    /// Не перечислено в ALL
    Lost,
}

impl ActorState for DriftState {
    const ALL: &'static [Self] = &[DriftState::Hover];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            DriftState::Hover => "hover",
            DriftState::Lost => "lost",
        }
    }
}

#[derive(Component, Debug, Default)]
struct Drifter;

impl ActorClass for Drifter {
    type State = DriftState;

    const NAME: &'static str = "drifter";
    const CLASS_ID: u16 = 3;

    fn state_table() -> Result<StateTable<Self>, ConfigError> {
        StateTable::builder().state(DriftState::Hover, no_action, vec![]).build()
    }

    fn initial_state(&self) -> DriftState {
        DriftState::Lost
    }
}

#[test]
fn test_unlisted_initial_state_stalls_actor_only() {
    let mut app = test_app(37, RngStreamKind::Chacha8);
    app.add_actor_class::<Drifter>();
    assert!(!app.world().resource::<RejectedActorClasses>().contains("drifter"));

    let drifter = app
        .world_mut()
        .spawn(actor_bundle(Drifter, ActorMotion::at(Vec3::new(4.0, 0.75, 4.0)), Health::new(5)))
        .id();
    let home = Vec3::new(0.0, 0.75, 0.0);
    let sentry = Sentry {
        wait: Countdown::raw(0),
        ..Sentry::new(SentryValues::default(), home)
    };
    let working = spawn_sentry(&mut app, sentry, home);

    let cues = run_ticks(&mut app, 3);
    assert!(app.world().get::<Stalled>(drifter).is_some());
    assert!(state_entries(&cues, drifter).is_empty());
    assert_eq!(state_entries(&cues, working)[0], ("idle", "roam", 0));

    // Урон по застрявшему актору идёт сразу в Health
    app.world_mut().send_event(DamageRequest {
        source: None,
        target: drifter,
        amount: 2,
        flags: DamageFlags::empty(),
        direction: Vec3::X,
    });
    run_ticks(&mut app, 1);
    assert_eq!(app.world().get::<Health>(drifter).unwrap().current, 3);
}

#[test]
fn test_duplicate_registration_ignored() {
    let mut app = test_app(23, RngStreamKind::Chacha8);
    app.add_actor_class::<Sentry>();

    let roster = app.world().resource::<host::ActorClassRoster>();
    assert_eq!(roster.names(), &["sentry"]);
}

#[test]
fn test_registry_refreshed_each_tick() {
    let mut app = test_app(29, RngStreamKind::Chacha8);
    let a = sentry_at(&mut app, Vec3::new(-3.0, 0.75, 0.0));
    sentry_at(&mut app, Vec3::new(3.0, 0.75, 0.0));

    run_ticks(&mut app, 1);
    assert_eq!(
        app.world().resource::<ActorRegistry>().count_alive(ActorKind::Enemy(Sentry::CLASS_ID)),
        2
    );

    app.world_mut().send_event(kill_request(a));
    run_ticks(&mut app, 3);
    let registry = app.world().resource::<ActorRegistry>();
    assert_eq!(registry.count_alive(ActorKind::Enemy(Sentry::CLASS_ID)), 1);
    assert!(!registry.get(a).unwrap().alive);
}

#[test]
fn test_clock_advances_once_per_tick() {
    let mut app = test_app(31, RngStreamKind::Chacha8);
    run_ticks(&mut app, 7);
    assert_eq!(app.world().resource::<SimulationClock>().frame, 7);
}

#[test]
fn test_values_loaded_from_json() {
    let values: SentryValues = load_values(
        r#"{ "sight": 4.0, "speed": 1.0, "wait": 3, "turn_steps": 2,
             "contact_damage": 9, "hurt_radius": 0.5, "shield": 2 }"#,
    )
    .unwrap();
    assert_eq!(values.shield, 2);
    assert_eq!(Sentry::new(values, Vec3::ZERO).wait.count(), 6);

    let broken: Result<SentryValues, _> = load_values("{ \"sight\": \"far\" }");
    assert!(matches!(broken, Err(ConfigError::Parse(_))));
}
