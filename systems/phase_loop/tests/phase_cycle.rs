use std::time::Duration;

use siege_defence_core::{Command, Event, Outcome, Scenario};
use siege_defence_system_phase_loop::{Config, GameLoop};
use siege_defence_world::{self as world, query, World};

#[test]
fn waves_alternate_with_shop_until_victory() {
    let scenario = Scenario::default();
    let mut world = World::new(scenario.clone());
    let mut game_loop = GameLoop::new(Config::new(scenario.open_shop_at_start));
    let mut log = Vec::new();

    run(&mut world, &mut game_loop, Command::Restart, &mut log);
    for _ in 0..40 {
        run(
            &mut world,
            &mut game_loop,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut log,
        );
    }

    let phases: Vec<&Event> = log
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::ShopOpened | Event::WaveStarted { .. } | Event::GameWon | Event::GameLost
            )
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            &Event::WaveStarted { wave: 1 },
            &Event::ShopOpened,
            &Event::WaveStarted { wave: 2 },
            &Event::ShopOpened,
            &Event::WaveStarted { wave: 3 },
            &Event::GameWon,
        ]
    );
    assert_eq!(query::outcome(&world), Some(Outcome::Won));
    assert!(game_loop.is_finished());
    assert!(!query::timer_is_armed(&world));
}

#[test]
fn session_can_begin_in_the_shop() {
    let scenario = Scenario {
        open_shop_at_start: true,
        ..Scenario::default()
    };
    let mut world = World::new(scenario.clone());
    let mut game_loop = GameLoop::new(Config::new(scenario.open_shop_at_start));
    let mut log = Vec::new();

    run(&mut world, &mut game_loop, Command::Restart, &mut log);

    assert!(query::shop_is_open(&world));
    assert_eq!(query::timer_remaining_seconds(&world), 10);
    assert_eq!(query::waves_spawned(&world), 0);
}

fn run(world: &mut World, game_loop: &mut GameLoop, command: Command, log: &mut Vec<Event>) {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);

    while !events.is_empty() {
        let mut commands = Vec::new();
        game_loop.handle(&events, query::waves_remaining(world), &mut commands);
        log.append(&mut events);

        for command in commands {
            world::apply(world, command, &mut events);
        }
    }
}
