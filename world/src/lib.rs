#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Siege Defence.

mod economy;
mod enemies;
mod registry;
mod timer;
mod towers;
mod waves;

use std::time::Duration;

use siege_defence_core::{
    BlueprintId, Command, EnemyId, Event, GamePhase, Outcome, Position, RejectionReason,
    Scenario, ShopRequest, SpawnSkipReason, TowerId, TowerLevel,
};
use tracing::{debug, info, warn};

use self::{
    economy::Economy,
    enemies::DamageOutcome,
    registry::EnemyRegistry,
    timer::PhaseTimer,
    towers::TowerRegistry,
    waves::{spawn_points, WaveDirector},
};

/// Represents the authoritative Siege Defence world state.
#[derive(Debug)]
pub struct World {
    scenario: Scenario,
    economy: Economy,
    timer: PhaseTimer,
    enemies: EnemyRegistry,
    towers: TowerRegistry,
    waves: WaveDirector,
    phase: GamePhase,
    paused: bool,
    outcome: Option<Outcome>,
    tick_index: u64,
}

impl World {
    /// Creates a world built from the provided scenario.
    ///
    /// Nothing happens until [`Command::Restart`] starts a session.
    #[must_use]
    pub fn new(scenario: Scenario) -> Self {
        Self {
            economy: Economy::new(scenario.starting_capital, scenario.debug.infinite_money),
            timer: PhaseTimer::new(),
            enemies: EnemyRegistry::new(scenario.max_enemies_at_goal),
            towers: TowerRegistry::new(),
            waves: WaveDirector::new(),
            phase: GamePhase::Combat,
            paused: false,
            outcome: None,
            tick_index: 0,
            scenario,
        }
    }

    fn reset(&mut self) {
        self.economy.reset();
        self.timer.disarm();
        self.enemies = EnemyRegistry::new(self.scenario.max_enemies_at_goal);
        self.towers = TowerRegistry::new();
        self.waves = WaveDirector::new();
        self.phase = GamePhase::Combat;
        self.paused = false;
        self.outcome = None;
        self.tick_index = 0;
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        if self.paused {
            out_events.push(Event::TimeAdvanced { dt: Duration::ZERO });
            return;
        }
        out_events.push(Event::TimeAdvanced { dt });

        for enemy in self.enemies.iter_mut() {
            if enemy.advance_debuff(dt) {
                out_events.push(Event::EnemyDebuffExpired {
                    enemy: enemy.id,
                    speed: enemy.speed(),
                });
            }
        }

        // An enemy that reaches its target has reached the goal, whatever
        // target it was last assigned.
        let tolerance = self.scenario.arrival_tolerance;
        let mut arrivals: Vec<EnemyId> = Vec::new();
        for enemy in self.enemies.iter_mut() {
            if enemy.check_arrival(tolerance) {
                arrivals.push(enemy.id);
            }
        }
        for enemy in arrivals {
            out_events.push(Event::EnemyArrived { enemy });
            self.count_goal_arrival(out_events);
        }

        for tower in self.towers.iter_mut() {
            if tower.advance(dt) {
                out_events.push(Event::TowerReady { tower: tower.id });
            }
        }

        if self.timer.advance(dt) {
            if self.phase == GamePhase::Combat {
                if let Some(wave) = self.waves.take_in_flight() {
                    out_events.push(Event::WaveEnded { wave });
                }
            }
            out_events.push(Event::PhaseTimerExpired);
        }
    }

    fn count_goal_arrival(&mut self, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() || self.scenario.debug.invincible_base {
            return;
        }

        let Some(tally) = self.enemies.record_arrival() else {
            return;
        };

        out_events.push(Event::GoalCountChanged {
            count: tally.count,
            max: self.enemies.max_at_goal(),
        });
        if tally.reached_max {
            self.declare(Outcome::Lost, out_events);
        }
    }

    fn declare(&mut self, outcome: Outcome, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            return;
        }

        info!(?outcome, at_goal = self.enemies.at_goal(), "game over");
        self.outcome = Some(outcome);
        self.timer.disarm();
        out_events.push(match outcome {
            Outcome::Won => Event::GameWon,
            Outcome::Lost => Event::GameLost,
        });
        self.set_paused(true, out_events);
    }

    fn set_paused(&mut self, paused: bool, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() && !paused {
            debug!("ignoring resume after the game ended");
            return;
        }

        if self.paused != paused {
            self.paused = paused;
            out_events.push(Event::PauseChanged { paused });
        }
    }

    fn open_shop(&mut self, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            return;
        }

        if let Some(wave) = self.waves.take_in_flight() {
            out_events.push(Event::WaveEnded { wave });
        }

        info!("shop opened");
        self.phase = GamePhase::ShopOpen;
        self.towers.set_active(false);
        out_events.push(Event::ShopOpened);
        out_events.push(Event::TowersActivated { active: false });
        self.arm_timer(self.scenario.shop_duration, out_events);
    }

    fn close_shop(&mut self, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            return;
        }

        info!("shop closed");
        self.phase = GamePhase::Combat;
        self.towers.set_active(true);
        out_events.push(Event::ShopClosed);
        out_events.push(Event::TowersActivated { active: true });
    }

    fn arm_timer(&mut self, duration: Duration, out_events: &mut Vec<Event>) {
        self.timer.arm(duration);
        out_events.push(Event::PhaseTimerArmed { duration });
    }

    fn spawn_next_wave(&mut self, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            return;
        }

        let Some((wave, spec)) = self
            .waves
            .advance(&self.scenario.waves)
            .map(|(wave, spec)| (wave, *spec))
        else {
            self.complete_waves(out_events);
            return;
        };

        match self.scenario.enemy(spec.enemy).cloned() {
            None => {
                warn!(wave, kind = spec.enemy.get(), "wave refers to an unknown enemy kind");
                out_events.push(Event::WaveSpawnSkipped {
                    wave,
                    reason: SpawnSkipReason::UnknownEnemyKind,
                });
            }
            Some(_) if spec.count == 0 => {
                warn!(wave, "wave requests no enemies");
                out_events.push(Event::WaveSpawnSkipped {
                    wave,
                    reason: SpawnSkipReason::EmptyBatch,
                });
            }
            Some(stats) => {
                let points = spawn_points(
                    self.scenario.spawn_origin,
                    self.scenario.spawn_spacing,
                    spec.count,
                );
                let mut batch = Vec::with_capacity(points.len());
                for position in points {
                    let enemy = self.enemies.spawn(spec.enemy, &stats, position);
                    out_events.push(Event::EnemySpawned {
                        enemy,
                        kind: spec.enemy,
                        position,
                    });
                    batch.push(enemy);
                }

                let goal = self.scenario.goal;
                for enemy in batch {
                    self.assign_target(enemy, goal, out_events);
                }
            }
        }

        info!(wave, total = self.scenario.wave_count(), "wave started");
        out_events.push(Event::WaveStarted { wave });
        self.arm_timer(self.scenario.inter_wave_delay, out_events);
    }

    fn complete_waves(&mut self, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            return;
        }

        out_events.push(Event::AllWavesCompleted);
        if let Some(outcome) = self.enemies.final_verdict(self.outcome) {
            self.declare(outcome, out_events);
        }
    }

    fn assign_target(&mut self, enemy: EnemyId, target: Position, out_events: &mut Vec<Event>) {
        let Some(state) = self.enemies.get_mut(enemy) else {
            return;
        };

        if state.set_target(target) {
            out_events.push(Event::EnemyTargetAssigned { enemy, target });
        }
    }

    fn shop_gate(&self) -> Result<(), RejectionReason> {
        if self.outcome.is_some() {
            return Err(RejectionReason::GameOver);
        }
        if self.phase != GamePhase::ShopOpen {
            return Err(RejectionReason::ShopClosed);
        }
        Ok(())
    }

    fn buy_tower(&mut self, blueprint: BlueprintId, position: Position) -> Result<Event, RejectionReason> {
        self.shop_gate()?;
        let stats = self
            .scenario
            .tower(blueprint)
            .ok_or(RejectionReason::UnknownBlueprint)?
            .stats_at(TowerLevel::Basic);
        if !self.economy.spend(stats.price) {
            return Err(RejectionReason::InsufficientFunds);
        }

        let tower = self.towers.insert(blueprint, stats, position);
        debug!(tower = tower.get(), price = stats.price, "tower purchased");
        Ok(Event::TowerPlaced {
            tower,
            blueprint,
            position,
        })
    }

    fn upgrade_tower(&mut self, tower: TowerId) -> Result<Event, RejectionReason> {
        self.shop_gate()?;
        let state = self.towers.get(tower).ok_or(RejectionReason::UnknownTower)?;
        let level = state.level.next().ok_or(RejectionReason::MaxLevelReached)?;
        let stats = self
            .scenario
            .tower(state.blueprint)
            .ok_or(RejectionReason::UnknownBlueprint)?
            .stats_at(level);
        if !self.economy.spend(stats.price) {
            return Err(RejectionReason::InsufficientFunds);
        }

        if let Some(state) = self.towers.get_mut(tower) {
            state.set_level(level, stats);
        }
        debug!(tower = tower.get(), ?level, price = stats.price, "tower upgraded");
        Ok(Event::TowerUpgraded { tower, level })
    }

    fn sell_tower(&mut self, tower: TowerId) -> Result<Event, RejectionReason> {
        self.shop_gate()?;
        let state = self.towers.remove(tower).ok_or(RejectionReason::UnknownTower)?;
        let refund = state.stats.price;
        self.economy.earn(refund);
        debug!(tower = tower.get(), refund, "tower sold");
        Ok(Event::TowerSold { tower, refund })
    }

    fn settle_shop_request(
        &mut self,
        request: ShopRequest,
        result: Result<Event, RejectionReason>,
        out_events: &mut Vec<Event>,
    ) {
        match result {
            Ok(event) => {
                out_events.push(event);
                out_events.push(Event::BalanceChanged {
                    balance: self.economy.balance(),
                });
            }
            Err(reason) => {
                debug!(?request, ?reason, "shop request rejected");
                out_events.push(Event::TowerRequestRejected { request, reason });
            }
        }
    }

    fn damage_enemy(&mut self, enemy: EnemyId, amount: f32, out_events: &mut Vec<Event>) {
        if !amount.is_finite() || amount < 0.0 {
            warn!(enemy = enemy.get(), amount, "ignoring invalid damage amount");
            return;
        }

        let instant_kill = self.scenario.debug.instant_kill;
        let Some(state) = self.enemies.get_mut(enemy) else {
            return;
        };

        let amount = if instant_kill {
            amount.max(state.health())
        } else {
            amount
        };

        match state.apply_damage(amount) {
            None => {}
            Some(DamageOutcome::Wounded(health)) => {
                out_events.push(Event::EnemyDamaged { enemy, health });
            }
            Some(DamageOutcome::Killed { health, reward }) => {
                out_events.push(Event::EnemyDamaged { enemy, health });
                out_events.push(Event::EnemyDied { enemy, reward });
                debug!(enemy = enemy.get(), reward, "enemy died");
                self.economy.earn(reward);
                out_events.push(Event::BalanceChanged {
                    balance: self.economy.balance(),
                });
            }
        }
    }

    fn debuff_enemy(&mut self, enemy: EnemyId, duration: Duration, out_events: &mut Vec<Event>) {
        let factor = self.scenario.debuff_factor;
        let Some(state) = self.enemies.get_mut(enemy) else {
            return;
        };

        if state.apply_debuff(factor, duration) {
            out_events.push(Event::EnemyDebuffed {
                enemy,
                speed: state.speed(),
            });
        }
    }

    fn retire_swept_enemies(&mut self) {
        for enemy in self.enemies.sweep_retired() {
            self.towers.forget_enemy(enemy);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(Scenario::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::Restart => {
            world.reset();
            info!(
                waves = world.scenario.wave_count(),
                capital = world.economy.balance(),
                "session started"
            );
            out_events.push(Event::SessionStarted);
            out_events.push(Event::BalanceChanged {
                balance: world.economy.balance(),
            });
        }
        Command::OpenShop => world.open_shop(out_events),
        Command::CloseShop => world.close_shop(out_events),
        Command::SpawnNextWave => world.spawn_next_wave(out_events),
        Command::CompleteWaves => world.complete_waves(out_events),
        Command::BuyTower {
            blueprint,
            position,
        } => {
            let result = world.buy_tower(blueprint, position);
            world.settle_shop_request(ShopRequest::Buy(blueprint), result, out_events);
        }
        Command::UpgradeTower { tower } => {
            let result = world.upgrade_tower(tower);
            world.settle_shop_request(ShopRequest::Upgrade(tower), result, out_events);
        }
        Command::SellTower { tower } => {
            let result = world.sell_tower(tower);
            world.settle_shop_request(ShopRequest::Sell(tower), result, out_events);
        }
        Command::SetEnemyTarget { enemy, target } => world.assign_target(enemy, target, out_events),
        Command::ReportEnemyPosition { enemy, position } => {
            if let Some(state) = world.enemies.get_mut(enemy) {
                if !state.move_to(position) {
                    debug!(
                        enemy = enemy.get(),
                        lifecycle = ?state.lifecycle,
                        "ignoring position report for an enemy that is not moving"
                    );
                }
            }
        }
        Command::EnemyEnteredRange { tower, enemy } => {
            let live = world
                .enemies
                .iter()
                .any(|state| state.id == enemy && !state.lifecycle.is_retired());
            if let (true, Some(state)) = (live, world.towers.get_mut(tower)) {
                state.enter_range(enemy);
            }
        }
        Command::EnemyExitedRange { tower, enemy } => {
            if let Some(state) = world.towers.get_mut(tower) {
                state.exit_range(enemy);
            }
        }
        Command::DamageEnemy { enemy, amount } => world.damage_enemy(enemy, amount, out_events),
        Command::DebuffEnemy { enemy, duration } => {
            world.debuff_enemy(enemy, duration, out_events);
        }
        Command::SetPaused { paused } => world.set_paused(paused, out_events),
        Command::ForceOutcome { outcome } => world.declare(outcome, out_events),
    }

    world.retire_swept_enemies();
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use siege_defence_core::{
        EnemyView, GamePhase, Outcome, Scenario, TowerId, TowerLevelStats, TowerView,
    };

    use super::World;

    /// Provides read-only access to the scenario the world was built from.
    #[must_use]
    pub fn scenario(world: &World) -> &Scenario {
        &world.scenario
    }

    /// Current player balance.
    #[must_use]
    pub fn balance(world: &World) -> u32 {
        world.economy.balance()
    }

    /// Reports whether the balance covers the provided price.
    #[must_use]
    pub fn can_afford(world: &World, price: u32) -> bool {
        world.economy.can_afford(price)
    }

    /// Phase the shop/combat state machine occupies.
    #[must_use]
    pub fn phase(world: &World) -> GamePhase {
        world.phase
    }

    /// Reports whether the shop is open.
    #[must_use]
    pub fn shop_is_open(world: &World) -> bool {
        world.phase == GamePhase::ShopOpen
    }

    /// Reports whether the global pause gate is engaged.
    #[must_use]
    pub fn is_paused(world: &World) -> bool {
        world.paused
    }

    /// Outcome of the session, once decided.
    #[must_use]
    pub fn outcome(world: &World) -> Option<Outcome> {
        world.outcome
    }

    /// Remaining phase time rounded to whole seconds; zero while dormant.
    #[must_use]
    pub fn timer_remaining_seconds(world: &World) -> u32 {
        world.timer.remaining_seconds()
    }

    /// Reports whether a phase countdown is pending.
    #[must_use]
    pub fn timer_is_armed(world: &World) -> bool {
        world.timer.is_armed()
    }

    /// Number of waves spawned so far.
    #[must_use]
    pub fn waves_spawned(world: &World) -> u32 {
        world.waves.spawned()
    }

    /// Reports whether any configured wave has not spawned yet.
    #[must_use]
    pub fn waves_remaining(world: &World) -> bool {
        world.waves.has_remaining(&world.scenario.waves)
    }

    /// Number of enemies counted at the goal.
    #[must_use]
    pub fn goal_count(world: &World) -> u32 {
        world.enemies.at_goal()
    }

    /// Number of goal arrivals that loses the game.
    #[must_use]
    pub fn max_goal_count(world: &World) -> u32 {
        world.enemies.max_at_goal()
    }

    /// Number of live enemies.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Number of placed towers.
    #[must_use]
    pub fn tower_count(world: &World) -> usize {
        world.towers.len()
    }

    /// Number of ticks processed since the session started.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Stats a tower exposes at its current level.
    #[must_use]
    pub fn tower_stats(world: &World, tower: TowerId) -> Option<TowerLevelStats> {
        world.towers.get(tower).map(|state| state.stats)
    }

    /// Captures a read-only view of the live enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .iter()
                .filter(|enemy| !enemy.lifecycle.is_retired())
                .map(|enemy| enemy.snapshot(world.paused))
                .collect(),
        )
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(
            world
                .towers
                .iter()
                .filter_map(|tower| {
                    world
                        .scenario
                        .tower(tower.blueprint)
                        .map(|blueprint| tower.snapshot(blueprint))
                })
                .collect(),
        )
    }
}
