//! Headless симуляция actor core
//!
//! Один класс-дрон патрулирует между точками и разворачивается к игроку.
//! Запуск: `actor_core [seed]`

use actor_core::movement::kernel::BlockingParams;
use actor_core::*;
use bevy::prelude::*;

const WAYPOINTS: [Vec3; 4] = [
    Vec3::new(-4.0, 1.0, -4.0),
    Vec3::new(4.0, 1.0, -4.0),
    Vec3::new(4.0, 1.0, 4.0),
    Vec3::new(-4.0, 1.0, 4.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DroneState {
    Patrol,
    Watch,
}

impl ActorState for DroneState {
    const ALL: &'static [Self] = &[DroneState::Patrol, DroneState::Watch];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            DroneState::Patrol => "patrol",
            DroneState::Watch => "watch",
        }
    }
}

#[derive(Component, Debug, Default)]
struct Drone {
    waypoint: usize,
    travel: MoveTo,
    turn: Option<SeekPlan>,
    watch: Countdown,
}

fn fly(_drone: &mut Drone, cx: &mut ActorContext<'_>) {
    cx.move_and_collide(Vec3::ZERO, BlockingParams::slide(0.5));
}

fn watch_player(drone: &mut Drone, cx: &mut ActorContext<'_>) {
    if let Some(plan) = drone.turn.as_mut() {
        plan.advance_facing(cx.motion);
    }
}

fn next_waypoint(drone: &mut Drone, cx: &mut ActorContext<'_>) -> bool {
    if !drone.travel.tick_or_fire() {
        return false;
    }
    drone.waypoint = (drone.waypoint + 1 + cx.next_uint(2) as usize) % WAYPOINTS.len();
    drone.travel = start_move_to(cx.motion, WAYPOINTS[drone.waypoint], 0.4);
    false
}

fn player_close(drone: &mut Drone, cx: &mut ActorContext<'_>) -> bool {
    let Some(player) = cx.visible_player() else {
        return false;
    };
    if cx.motion.distance_to(player.position) > 3.0 {
        return false;
    }
    cx.motion.speed = Vec3::ZERO;
    drone.turn = Some(SeekPlan::original(
        cx.motion.facing,
        player.position - cx.motion.position,
        6,
        cx.motion.up,
    ));
    drone.watch = Countdown::original(45);
    cx.set_animation(1, 0);
    true
}

fn watch_over(drone: &mut Drone, cx: &mut ActorContext<'_>) -> bool {
    if !drone.watch.tick_or_fire() {
        return false;
    }
    drone.turn = None;
    drone.travel = start_move_to(cx.motion, WAYPOINTS[drone.waypoint], 0.4);
    true
}

impl ActorClass for Drone {
    type State = DroneState;

    const NAME: &'static str = "drone";
    const CLASS_ID: u16 = 1;

    fn state_table() -> Result<StateTable<Self>, ConfigError> {
        StateTable::builder()
            .state(
                DroneState::Patrol,
                fly,
                vec![
                    Subroutine::new("player_close", player_close, DroneState::Watch),
                    Subroutine::new("next_waypoint", next_waypoint, DroneState::Patrol),
                ],
            )
            .state(
                DroneState::Watch,
                watch_player,
                vec![Subroutine::new("watch_over", watch_over, DroneState::Patrol)],
            )
            .build()
    }

    fn initial_state(&self) -> DroneState {
        DroneState::Patrol
    }
}

/// Пол 12x12 на y=0
fn floor() -> Result<StaticGeometry, ConfigError> {
    let mut geometry = StaticGeometry::new();
    geometry.add_quad(
        [
            Vec3::new(-6.0, 0.0, 6.0),
            Vec3::new(6.0, 0.0, 6.0),
            Vec3::new(6.0, 0.0, -6.0),
            Vec3::new(-6.0, 0.0, -6.0),
        ],
        SurfaceFlags::empty(),
    )?;
    Ok(geometry)
}

fn main() -> Result<(), ConfigError> {
    let seed = std::env::args().nth(1).and_then(|arg| arg.parse().ok()).unwrap_or(42);
    let config = SimulationConfig::default().with_seed(seed);
    println!("Starting actor core headless simulation (seed: {})", seed);

    let mut app = create_headless_app(config);
    app.insert_resource(floor()?);
    app.add_actor_class::<Drone>();

    for (index, waypoint) in WAYPOINTS.iter().enumerate() {
        let drone = Drone {
            waypoint: index,
            ..Drone::default()
        };
        app.world_mut()
            .spawn(actor_bundle(drone, ActorMotion::at(*waypoint), Health::new(30)));
    }
    let player = app
        .world_mut()
        .spawn(player_bundle(ActorMotion::at(Vec3::new(0.0, 1.0, 0.0)), Health::new(100), 0.5))
        .id();

    for tick in 0..1000u32 {
        // Игрок ходит по кругу (внешний ввод)
        if let Some(mut motion) = app.world_mut().get_mut::<ActorMotion>(player) {
            let angle = tick as f32 * 0.01;
            motion.position = Vec3::new(angle.cos() * 3.5, 1.0, angle.sin() * 3.5);
        }

        step_tick(&mut app);
        let cues = drain_cues(&mut app);

        for cue in &cues {
            if let ActorCue::StateEntered { entity, from, to, frame, .. } = cue {
                println!("Tick {}: {:?} {} → {}", frame, entity, from, to);
            }
        }

        if tick % 100 == 0 {
            let entity_count = app.world().entities().len();
            println!("Tick {}: {} entities", tick, entity_count);
        }
    }

    println!("Simulation complete!");
    Ok(())
}
