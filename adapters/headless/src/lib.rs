#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless frame driver that pumps commands and events between the world
//! and the pure systems.
//!
//! Every frame submits queued player commands, advances the clock, lets the
//! navigation and overlap providers report enemy positions and range
//! changes, and then dispatches the resulting events to the game loop and
//! the tower systems until no further commands are produced.

mod report;

use std::time::Duration;

use siege_defence_core::{BlueprintId, Command, Event, Position, Scenario, TowerId, TowerTarget};
use siege_defence_system_movement::Movement;
use siege_defence_system_phase_loop::{Config as GameLoopConfig, GameLoop};
use siege_defence_system_range_sensing::RangeSensing;
use siege_defence_system_tower_combat::TowerCombat;
use siege_defence_system_tower_targeting::TowerTargeting;
use siege_defence_world::{self as world, query, World};
use tracing::{debug, info};

pub use report::SessionReport;
use report::Tally;

/// Safety valve for command cascades within a single frame.
const MAX_CASCADE_ROUNDS: usize = 64;

/// Tower purchase deferred until the shop is open and the balance covers it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannedPurchase {
    /// Blueprint to buy.
    pub blueprint: BlueprintId,
    /// Position to place the tower at.
    pub position: Position,
}

/// Headless game session owning the world and every system.
#[derive(Debug)]
pub struct Session {
    world: World,
    game_loop: GameLoop,
    movement: Movement,
    sensing: RangeSensing,
    targeting: TowerTargeting,
    combat: TowerCombat,
    pending: Vec<Command>,
    planned: Vec<PlannedPurchase>,
    targets: Vec<TowerTarget>,
    frame_events: Vec<Event>,
    tally: Tally,
}

impl Session {
    /// Builds a session from the scenario and starts it.
    #[must_use]
    pub fn new(scenario: Scenario) -> Self {
        let game_loop = GameLoop::new(GameLoopConfig::new(scenario.open_shop_at_start));
        let mut session = Self {
            world: World::new(scenario),
            game_loop,
            movement: Movement::new(),
            sensing: RangeSensing::new(),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            pending: Vec::new(),
            planned: Vec::new(),
            targets: Vec::new(),
            frame_events: Vec::new(),
            tally: Tally::default(),
        };
        session.restart();
        session
    }

    /// Resets every manager from the scenario and starts a fresh session.
    ///
    /// Queued commands and planned purchases are discarded.
    pub fn restart(&mut self) {
        self.pending.clear();
        self.planned.clear();
        self.frame_events.clear();

        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Restart, &mut events);
        self.dispatch(events);
    }

    /// Queues a command applied at the start of the next frame.
    pub fn submit(&mut self, command: Command) {
        self.pending.push(command);
    }

    /// Plans a tower purchase carried out as soon as the shop is open.
    pub fn plan_purchase(&mut self, blueprint: BlueprintId, position: Position) {
        self.planned.push(PlannedPurchase {
            blueprint,
            position,
        });
    }

    /// Runs one frame, returning every event it produced.
    pub fn step(&mut self, dt: Duration) -> &[Event] {
        self.frame_events.clear();

        let mut events = Vec::new();
        for command in std::mem::take(&mut self.pending) {
            world::apply(&mut self.world, command, &mut events);
        }
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);

        let mut commands = Vec::new();
        self.movement
            .handle(&events, &query::enemy_view(&self.world), &mut commands);
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, &mut events);
        }

        self.sensing.handle(
            &query::tower_view(&self.world),
            &query::enemy_view(&self.world),
            &mut commands,
        );
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }

        self.dispatch(events);
        &self.frame_events
    }

    /// Steps until the game is decided or `max_frames` frames have run.
    pub fn run_until_finished(&mut self, dt: Duration, max_frames: u64) -> SessionReport {
        let mut frames = 0;
        while !self.is_finished() && frames < max_frames {
            let _ = self.step(dt);
            frames += 1;
        }

        let report = self.report();
        info!(
            outcome = ?report.outcome,
            frames = report.frames,
            kills = report.kills,
            "session finished"
        );
        report
    }

    /// Reports whether the game has been won or lost.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        query::outcome(&self.world).is_some()
    }

    /// Scenario the session was built from.
    #[must_use]
    pub fn scenario(&self) -> &Scenario {
        query::scenario(&self.world)
    }

    /// Provides read-only access to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Summarises the session so far.
    #[must_use]
    pub fn report(&self) -> SessionReport {
        SessionReport {
            frames: query::tick_index(&self.world),
            elapsed_secs: self.tally.elapsed.as_secs_f64(),
            outcome: query::outcome(&self.world),
            phase: query::phase(&self.world),
            balance: query::balance(&self.world),
            waves_spawned: query::waves_spawned(&self.world),
            total_waves: query::scenario(&self.world).wave_count(),
            goal_count: query::goal_count(&self.world),
            max_goal_count: query::max_goal_count(&self.world),
            kills: self.tally.kills,
            towers_placed: self.tally.towers_placed,
            rejected_requests: self.tally.rejected_requests,
        }
    }

    fn dispatch(&mut self, mut events: Vec<Event>) {
        let mut rounds = 0;
        while !events.is_empty() {
            rounds += 1;
            if rounds > MAX_CASCADE_ROUNDS {
                debug!(pending = events.len(), "command cascade cut short");
                self.record(events);
                return;
            }

            let mut commands = Vec::new();
            self.game_loop
                .handle(&events, query::waves_remaining(&self.world), &mut commands);

            let batch = std::mem::take(&mut events);
            self.resolve_attacks(&batch, &mut events);

            if query::shop_is_open(&self.world) {
                self.queue_planned_purchases(&mut commands);
            }

            self.record(batch);
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }

    /// Ready towers fire one after another so each one selects from the
    /// enemies its predecessors left alive.
    fn resolve_attacks(&mut self, batch: &[Event], out_events: &mut Vec<Event>) {
        let mut ready: Vec<TowerId> = Vec::new();
        for event in batch {
            if let Event::TowerReady { tower } = event {
                if !ready.contains(tower) {
                    ready.push(*tower);
                }
            }
        }

        let mut attacks = Vec::new();
        for tower in ready {
            let towers = query::tower_view(&self.world);
            let enemies = query::enemy_view(&self.world);
            self.targeting.handle(
                &[Event::TowerReady { tower }],
                &towers,
                &enemies,
                &mut self.targets,
            );
            self.combat.handle(&towers, &self.targets, &mut attacks);
            for command in attacks.drain(..) {
                world::apply(&mut self.world, command, out_events);
            }
        }
    }

    /// Moves the planned purchases the balance still covers into `commands`.
    ///
    /// Purchases the player cannot afford stay planned for a later shop.
    fn queue_planned_purchases(&mut self, commands: &mut Vec<Command>) {
        let mut committed = 0_u32;
        let world = &self.world;
        self.planned.retain(|purchase| {
            let Some(price) = query::scenario(world)
                .tower(purchase.blueprint)
                .map(|blueprint| blueprint.basic.price)
            else {
                commands.push(Command::BuyTower {
                    blueprint: purchase.blueprint,
                    position: purchase.position,
                });
                return false;
            };

            let total = committed.saturating_add(price);
            if !query::can_afford(world, total) {
                debug!(
                    blueprint = purchase.blueprint.get(),
                    price, "planned purchase deferred"
                );
                return true;
            }

            committed = total;
            commands.push(Command::BuyTower {
                blueprint: purchase.blueprint,
                position: purchase.position,
            });
            false
        });
    }

    fn record(&mut self, events: Vec<Event>) {
        for event in &events {
            self.tally.observe(event);
        }
        self.frame_events.extend(events);
    }
}
