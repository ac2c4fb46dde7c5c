use std::time::Duration;

use siege_defence_core::{Command, EnemyId, Event, Position, Scenario};
use siege_defence_system_movement::Movement;
use siege_defence_world::{self as world, query, World};

#[test]
fn deterministic_replay_walks_first_wave_to_goal() {
    let first = replay(45);
    let second = replay(45);

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.arrivals.len(), 4);
    assert_eq!(first.goal_count, 4);
    assert!(first.positions.is_empty(), "arrived enemies leave the world");
}

#[test]
fn enemies_close_in_on_goal_every_frame() {
    let mut world = World::new(Scenario::default());
    let mut movement = Movement::new();
    let goal = query::scenario(&world).goal;
    start(&mut world);

    let mut previous = distances(&world, goal);
    for _ in 0..10 {
        frame(&mut world, &mut movement, &mut Vec::new());
        let current = distances(&world, goal);
        for (before, after) in previous.iter().zip(&current) {
            assert!(after < before, "enemy did not approach the goal");
        }
        previous = current;
    }
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    positions: Vec<(EnemyId, Position)>,
    arrivals: Vec<EnemyId>,
    goal_count: u32,
}

fn replay(frames: usize) -> ReplayOutcome {
    let mut world = World::new(Scenario::default());
    let mut movement = Movement::new();
    let mut log = Vec::new();
    start(&mut world);

    for _ in 0..frames {
        frame(&mut world, &mut movement, &mut log);
    }

    ReplayOutcome {
        positions: query::enemy_view(&world)
            .iter()
            .map(|enemy| (enemy.id, enemy.position))
            .collect(),
        arrivals: log
            .iter()
            .filter_map(|event| match event {
                Event::EnemyArrived { enemy } => Some(*enemy),
                _ => None,
            })
            .collect(),
        goal_count: query::goal_count(&world),
    }
}

fn start(world: &mut World) {
    let mut events = Vec::new();
    world::apply(world, Command::Restart, &mut events);
    world::apply(world, Command::SpawnNextWave, &mut events);
}

fn frame(world: &mut World, movement: &mut Movement, log: &mut Vec<Event>) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::Tick {
            dt: Duration::from_millis(500),
        },
        &mut events,
    );

    let mut commands = Vec::new();
    movement.handle(&events, &query::enemy_view(world), &mut commands);
    for command in commands {
        world::apply(world, command, &mut events);
    }
    log.extend(events);
}

fn distances(world: &World, goal: Position) -> Vec<f32> {
    query::enemy_view(world)
        .iter()
        .map(|enemy| enemy.position.distance(goal))
        .collect()
}
