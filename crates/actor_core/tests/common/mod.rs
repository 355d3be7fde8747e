//! Общий тестовый класс актора + фикстуры мира

#![allow(dead_code)]

use actor_core::movement::kernel::BlockingParams;
use actor_core::*;
use bevy::prelude::*;
use serde::Deserialize;

/// Tunable values (данные, не подкласс)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SentryValues {
    /// Дальность обнаружения игрока
    pub sight: f32,
    /// Дистанция за исходный тик
    pub speed: f32,
    /// Пауза в Idle (исходные тики)
    pub wait: u16,
    /// Шагов поворота к игроку (исходные тики)
    pub turn_steps: u16,
    pub contact_damage: u32,
    pub hurt_radius: f32,
    /// Сколько ударов поглощает щит
    pub shield: u32,
}

impl Default for SentryValues {
    fn default() -> Self {
        Self {
            sight: 6.0,
            speed: 0.5,
            wait: 10,
            turn_steps: 4,
            contact_damage: 5,
            hurt_radius: 0.75,
            shield: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentryState {
    Idle,
    Roam,
    Turn,
    Charge,
}

impl ActorState for SentryState {
    const ALL: &'static [Self] = &[SentryState::Idle, SentryState::Roam, SentryState::Turn, SentryState::Charge];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            SentryState::Idle => "idle",
            SentryState::Roam => "roam",
            SentryState::Turn => "turn",
            SentryState::Charge => "charge",
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct Sentry {
    pub values: SentryValues,
    pub home: Vec3,
    pub wait: Countdown,
    pub travel: MoveTo,
    pub turn: Option<SeekPlan>,
    pub shield: u32,
    pub absorbed: u32,
}

impl Sentry {
    pub fn new(values: SentryValues, home: Vec3) -> Self {
        Self {
            wait: Countdown::original(values.wait),
            shield: values.shield,
            values,
            home,
            travel: MoveTo::default(),
            turn: None,
            absorbed: 0,
        }
    }
}

pub const ANIM_ROAM: u16 = 1;
pub const ANIM_CHARGE: u16 = 2;
pub const SFX_ALERT: u16 = 7;

fn player_in_sight(sentry: &Sentry, cx: &ActorContext<'_>) -> Option<Vec3> {
    let player = cx.visible_player()?;
    let offset = player.position - cx.motion.position;
    if offset.length() > sentry.values.sight {
        return None;
    }
    if cx.blocked_towards(player.position, TestFlags::SCAN).is_some() {
        return None;
    }
    Some(player.position)
}

fn walk(sentry: &mut Sentry, cx: &mut ActorContext<'_>) {
    let radius = sentry.values.hurt_radius;
    cx.move_and_collide(Vec3::ZERO, BlockingParams::slide(radius));
}

fn turn_towards_player(sentry: &mut Sentry, cx: &mut ActorContext<'_>) {
    if let Some(plan) = sentry.turn.as_mut() {
        plan.advance_facing(cx.motion);
    }
}

fn wait_expired(sentry: &mut Sentry, cx: &mut ActorContext<'_>) -> bool {
    if !sentry.wait.tick_or_fire() {
        return false;
    }
    let dx = cx.next_uint(5) as f32 - 2.0;
    let dz = cx.next_uint(5) as f32 - 2.0;
    let target = sentry.home + Vec3::new(dx, 0.0, dz);
    sentry.travel = start_move_to(cx.motion, target, sentry.values.speed);
    cx.set_animation(ANIM_ROAM, 0);
    true
}

/// Squared length против отрицательной константы: никогда не срабатывает.
/// Сохранено как есть (поведение класса не "чинится").
pub fn player_inside_negative_range(_sentry: &mut Sentry, cx: &mut ActorContext<'_>) -> bool {
    let Some(player) = cx.main_player() else {
        return false;
    };
    (player.position - cx.motion.position).length_squared() < -1.0
}

fn player_spotted(sentry: &mut Sentry, cx: &mut ActorContext<'_>) -> bool {
    let Some(target) = player_in_sight(sentry, cx) else {
        return false;
    };
    cx.motion.speed = Vec3::ZERO;
    let direction = (target - cx.motion.position).with_y(0.0);
    sentry.turn = Some(SeekPlan::original(cx.motion.facing, direction, sentry.values.turn_steps, cx.motion.up));
    cx.play_sfx(SFX_ALERT);
    true
}

fn arrived(sentry: &mut Sentry, cx: &mut ActorContext<'_>) -> bool {
    if !sentry.travel.tick_or_fire() {
        return false;
    }
    cx.motion.speed = Vec3::ZERO;
    sentry.wait.reset_original(sentry.values.wait);
    true
}

fn facing_player(sentry: &mut Sentry, cx: &mut ActorContext<'_>) -> bool {
    if !sentry.turn.as_ref().is_none_or(|plan| plan.is_done()) {
        return false;
    }
    sentry.turn = None;
    let Some(player) = cx.main_player() else {
        return true;
    };
    let target = player.position.with_y(cx.motion.position.y);
    sentry.travel = start_move_to(cx.motion, target, sentry.values.speed * 2.0);
    cx.set_animation(ANIM_CHARGE, 1);
    true
}

fn lost_player(sentry: &mut Sentry, cx: &mut ActorContext<'_>) -> bool {
    if player_in_sight(sentry, cx).is_some() {
        return false;
    }
    cx.motion.speed = Vec3::ZERO;
    sentry.turn = None;
    sentry.wait.reset_original(sentry.values.wait);
    true
}

impl ActorClass for Sentry {
    type State = SentryState;

    const NAME: &'static str = "sentry";
    const CLASS_ID: u16 = 1;

    fn state_table() -> Result<StateTable<Self>, ConfigError> {
        StateTable::builder()
            .state(
                SentryState::Idle,
                no_action,
                vec![
                    Subroutine::new("player_inside_negative_range", player_inside_negative_range, SentryState::Charge),
                    Subroutine::new("player_spotted", player_spotted, SentryState::Turn),
                    Subroutine::new("wait_expired", wait_expired, SentryState::Roam),
                ],
            )
            .state(
                SentryState::Roam,
                walk,
                vec![
                    Subroutine::new("player_spotted", player_spotted, SentryState::Turn),
                    Subroutine::new("arrived", arrived, SentryState::Idle),
                ],
            )
            .state(
                SentryState::Turn,
                turn_towards_player,
                vec![
                    Subroutine::new("lost_player", lost_player, SentryState::Idle),
                    Subroutine::new("facing_player", facing_player, SentryState::Charge),
                ],
            )
            .state(SentryState::Charge, walk, vec![Subroutine::new("arrived", arrived, SentryState::Idle)])
            .build()
    }

    fn initial_state(&self) -> SentryState {
        SentryState::Idle
    }

    fn process(&mut self, cx: &mut ActorContext<'_>) -> ProcessFlow {
        let hurt = Volume::Sphere {
            center: cx.motion.position,
            radius: self.values.hurt_radius,
        };
        cx.contact_damage_players(&hurt, self.values.contact_damage);
        ProcessFlow::RunState
    }

    fn take_damage(&mut self, _request: &DamageRequest, _cx: &mut ActorContext<'_>) -> bool {
        if self.shield == 0 {
            return false;
        }
        self.shield -= 1;
        self.absorbed += 1;
        true
    }
}

/// Класс с дырой в таблице (нет состояния Charge)
#[derive(Component, Debug, Clone, Default)]
pub struct BrokenSentry;

impl ActorClass for BrokenSentry {
    type State = SentryState;

    const NAME: &'static str = "broken_sentry";
    const CLASS_ID: u16 = 2;

    fn state_table() -> Result<StateTable<Self>, ConfigError> {
        StateTable::builder()
            .state(SentryState::Idle, no_action, vec![])
            .state(SentryState::Roam, no_action, vec![])
            .state(SentryState::Turn, no_action, vec![])
            .build()
    }

    fn initial_state(&self) -> SentryState {
        SentryState::Idle
    }
}

/// Пол 20x20 на y=0 + стена на x=8 (нормаль к -X)
pub fn arena() -> StaticGeometry {
    let mut geometry = StaticGeometry::new();
    geometry
        .add_quad(
            [
                Vec3::new(-10.0, 0.0, 10.0),
                Vec3::new(10.0, 0.0, 10.0),
                Vec3::new(10.0, 0.0, -10.0),
                Vec3::new(-10.0, 0.0, -10.0),
            ],
            SurfaceFlags::empty(),
        )
        .unwrap();
    geometry
        .add_quad(
            [
                Vec3::new(8.0, 0.0, 10.0),
                Vec3::new(8.0, 4.0, 10.0),
                Vec3::new(8.0, 4.0, -10.0),
                Vec3::new(8.0, 0.0, -10.0),
            ],
            SurfaceFlags::empty(),
        )
        .unwrap();
    geometry
}

/// App без wall clock: тики только через `step_tick`
pub fn test_app(seed: u64, rng: RngStreamKind) -> App {
    let config = SimulationConfig {
        seed,
        rng,
        log_level: LogLevel::Warning,
        ..SimulationConfig::default()
    };
    let mut app = App::new();
    app.add_plugins(ActorCorePlugin::new(config));
    app.insert_resource(arena());
    app.add_actor_class::<Sentry>();
    app
}

pub fn spawn_sentry(app: &mut App, sentry: Sentry, position: Vec3) -> Entity {
    app.world_mut()
        .spawn(actor_bundle(sentry, ActorMotion::at(position), Health::new(20)))
        .id()
}

pub fn spawn_player(app: &mut App, position: Vec3, health: u32) -> Entity {
    app.world_mut()
        .spawn(player_bundle(ActorMotion::at(position), Health::new(health), 0.5))
        .id()
}

pub fn run_ticks(app: &mut App, count: usize) -> Vec<ActorCue> {
    let mut cues = Vec::new();
    for _ in 0..count {
        step_tick(app);
        cues.extend(drain_cues(app));
    }
    cues
}

pub fn state_entries(cues: &[ActorCue], entity: Entity) -> Vec<(&'static str, &'static str, u64)> {
    cues.iter()
        .filter_map(|cue| match cue {
            ActorCue::StateEntered {
                entity: e, from, to, frame, ..
            } if *e == entity => Some((*from, *to, *frame)),
            _ => None,
        })
        .collect()
}
