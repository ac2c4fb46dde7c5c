#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Siege Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Reinitializes every manager from the scenario and starts a new session.
    Restart,
    /// Opens the shop, deactivating towers and arming the shop countdown.
    OpenShop,
    /// Closes the shop and activates every placed tower.
    CloseShop,
    /// Spawns the next configured wave, or completes the wave cycle when none remain.
    SpawnNextWave,
    /// Signals that the wave cycle is over and requests the final verdict.
    CompleteWaves,
    /// Requests the purchase of a tower built from the provided blueprint.
    BuyTower {
        /// Catalogue entry describing the tower to construct.
        blueprint: BlueprintId,
        /// World position the tower should occupy.
        position: Position,
    },
    /// Requests that a placed tower advance to its next level.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Requests that a placed tower be sold for its current level's price.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
    /// Updates the destination an enemy's mover travels toward.
    SetEnemyTarget {
        /// Identifier of the enemy receiving the destination.
        enemy: EnemyId,
        /// Destination the enemy should travel toward.
        target: Position,
    },
    /// Reports the latest position produced by the navigation provider.
    ReportEnemyPosition {
        /// Identifier of the enemy that moved.
        enemy: EnemyId,
        /// Position the enemy now occupies.
        position: Position,
    },
    /// Reports that an enemy entered a tower's range volume.
    EnemyEnteredRange {
        /// Tower whose range volume was entered.
        tower: TowerId,
        /// Enemy that entered the volume.
        enemy: EnemyId,
    },
    /// Reports that an enemy left a tower's range volume.
    EnemyExitedRange {
        /// Tower whose range volume was exited.
        tower: TowerId,
        /// Enemy that left the volume.
        enemy: EnemyId,
    },
    /// Subtracts health from an enemy.
    DamageEnemy {
        /// Identifier of the enemy being damaged.
        enemy: EnemyId,
        /// Amount of health to subtract.
        amount: f32,
    },
    /// Applies a temporary speed reduction to an enemy.
    DebuffEnemy {
        /// Identifier of the enemy being slowed.
        enemy: EnemyId,
        /// Duration after which the enemy's base speed is restored.
        duration: Duration,
    },
    /// Engages or releases the global pause gate.
    SetPaused {
        /// Whether the simulation should stop making progress.
        paused: bool,
    },
    /// Ends the game immediately with the provided outcome.
    ForceOutcome {
        /// Outcome to declare.
        outcome: Outcome,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick after the pause gate.
        dt: Duration,
    },
    /// Announces that every manager was reinitialized and a new session began.
    SessionStarted,
    /// Reports the player's balance after it changed.
    BalanceChanged {
        /// Balance after the change.
        balance: u32,
    },
    /// Confirms that the phase countdown was armed.
    PhaseTimerArmed {
        /// Duration the countdown will run for.
        duration: Duration,
    },
    /// Announces that the phase countdown crossed zero.
    PhaseTimerExpired,
    /// Announces that the shop opened.
    ShopOpened,
    /// Announces that the shop closed.
    ShopClosed,
    /// Reports that every placed tower changed activity.
    TowersActivated {
        /// Whether towers are now allowed to attack.
        active: bool,
    },
    /// Announces that a wave was spawned.
    WaveStarted {
        /// One-based index of the wave that started.
        wave: u32,
    },
    /// Announces that the delay following a wave elapsed.
    WaveEnded {
        /// One-based index of the wave that ended.
        wave: u32,
    },
    /// Reports that a wave could not spawn its enemies.
    WaveSpawnSkipped {
        /// One-based index of the wave that was skipped.
        wave: u32,
        /// Specific reason the batch was not spawned.
        reason: SpawnSkipReason,
    },
    /// Announces that no configured waves remain.
    AllWavesCompleted,
    /// Confirms that an enemy was created at a spawn point.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Catalogue entry the enemy was built from.
        kind: EnemyKind,
        /// Spawn point the enemy occupies.
        position: Position,
    },
    /// Instructs the navigation provider to move an enemy toward a destination.
    EnemyTargetAssigned {
        /// Identifier of the enemy that received the destination.
        enemy: EnemyId,
        /// Destination assigned to the enemy.
        target: Position,
    },
    /// Reports that an enemy lost health.
    EnemyDamaged {
        /// Identifier of the damaged enemy.
        enemy: EnemyId,
        /// Health remaining after the damage was applied.
        health: f32,
    },
    /// Reports that an enemy was slowed.
    EnemyDebuffed {
        /// Identifier of the slowed enemy.
        enemy: EnemyId,
        /// Speed the enemy moves at while slowed.
        speed: f32,
    },
    /// Reports that an enemy's slow wore off.
    EnemyDebuffExpired {
        /// Identifier of the enemy that recovered.
        enemy: EnemyId,
        /// Speed restored to the enemy.
        speed: f32,
    },
    /// Announces that an enemy died and credited its reward.
    EnemyDied {
        /// Identifier of the enemy that died.
        enemy: EnemyId,
        /// Currency credited for the kill.
        reward: u32,
    },
    /// Announces that an enemy reached its destination.
    EnemyArrived {
        /// Identifier of the enemy that arrived.
        enemy: EnemyId,
    },
    /// Reports the number of enemies that reached the goal.
    GoalCountChanged {
        /// Enemies counted at the goal so far.
        count: u32,
        /// Count at which the game is lost.
        max: u32,
    },
    /// Confirms that a tower was placed.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Blueprint the tower was built from.
        blueprint: BlueprintId,
        /// Position the tower occupies.
        position: Position,
    },
    /// Confirms that a tower advanced a level.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Level the tower reached.
        level: TowerLevel,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Identifier of the sold tower.
        tower: TowerId,
        /// Currency refunded for the sale.
        refund: u32,
    },
    /// Reports that a tower's attack cooldown elapsed.
    TowerReady {
        /// Identifier of the tower ready to attack.
        tower: TowerId,
    },
    /// Reports that a shop request was rejected without changing any state.
    TowerRequestRejected {
        /// Kind of request that was rejected.
        request: ShopRequest,
        /// Specific reason the request failed.
        reason: RejectionReason,
    },
    /// Reports that the global pause gate changed.
    PauseChanged {
        /// Whether the simulation is paused.
        paused: bool,
    },
    /// Announces that the game was won.
    GameWon,
    /// Announces that the game was lost.
    GameLost,
}

/// Shop requests that may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShopRequest {
    /// Purchase of a new tower from the provided blueprint.
    Buy(BlueprintId),
    /// Upgrade of an existing tower.
    Upgrade(TowerId),
    /// Sale of an existing tower.
    Sell(TowerId),
}

/// Reasons a shop request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    /// The balance does not cover the price.
    InsufficientFunds,
    /// The shop is closed, so purchases are disabled.
    ShopClosed,
    /// The game already ended.
    GameOver,
    /// No blueprint with the provided identifier exists.
    UnknownBlueprint,
    /// No tower with the provided identifier exists.
    UnknownTower,
    /// The tower has no further level to reach.
    MaxLevelReached,
}

/// Reasons a wave may fail to spawn its batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnSkipReason {
    /// The wave refers to an enemy kind missing from the catalogue.
    UnknownEnemyKind,
    /// The wave requests zero enemies.
    EmptyBatch,
}

/// Final result of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Every wave completed with fewer enemies at the goal than allowed.
    Won,
    /// Too many enemies reached the goal.
    Lost,
}

/// Phase the shop/combat state machine currently occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// The shop is open; towers are inactive and purchases are allowed.
    ShopOpen,
    /// The shop is closed; towers attack and waves advance.
    Combat,
}

/// Point in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
    z: f32,
}

impl Position {
    /// Creates a new position from its components.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Creates a position on the ground plane.
    #[must_use]
    pub const fn ground(x: f32, z: f32) -> Self {
        Self::new(x, 0.0, z)
    }

    /// Horizontal component along the x axis.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Horizontal component along the z axis.
    #[must_use]
    pub const fn z(&self) -> f32 {
        self.z
    }

    /// Returns the position translated by the provided offsets.
    #[must_use]
    pub fn offset(self, dx: f32, dy: f32, dz: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Squared Euclidean distance to another position.
    #[must_use]
    pub fn distance_squared(self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance(self, other: Position) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of an entry in the scenario's enemy catalogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyKind(u32);

impl EnemyKind {
    /// Creates a new enemy kind referring to the provided catalogue index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the catalogue index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of an entry in the scenario's tower catalogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlueprintId(u32);

impl BlueprintId {
    /// Creates a new blueprint identifier referring to the provided catalogue index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the catalogue index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Upgrade levels a tower may reach.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TowerLevel {
    /// Level every tower is purchased at.
    Basic,
    /// First and final upgrade.
    Upgrade1,
}

impl TowerLevel {
    /// Level reached by upgrading from this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Basic => Some(Self::Upgrade1),
            Self::Upgrade1 => None,
        }
    }
}

/// Effect a tower applies to the enemies it attacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImpactKind {
    /// Subtracts the tower's impact from the target's health.
    Damage,
    /// Slows the target for the tower's impact, measured in seconds.
    Debuff,
}

/// Strategy a tower uses to choose among the enemies in range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetSelection {
    /// Attacks the single enemy closest to the tower.
    Closest,
    /// Attacks every enemy in range.
    Area,
}

/// Stats a tower exposes at a single level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerLevelStats {
    /// Price paid to reach the level and refunded when selling at it.
    pub price: u32,
    /// Radius of the tower's range volume.
    pub range: f32,
    /// Damage dealt, or debuff duration in seconds, per attack.
    pub impact: f32,
    /// Cooldown between successive attacks.
    pub threshold: Duration,
}

/// Price and scaling applied to the basic stats when upgrading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpgradeModifiers {
    /// Price paid to reach the upgraded level.
    pub price: u32,
    /// Multiplier applied to the basic range.
    pub range_modifier: f32,
    /// Multiplier applied to the basic impact.
    pub impact_modifier: f32,
    /// Multiplier applied to the basic threshold; values below one attack faster.
    pub threshold_modifier: f32,
}

impl Default for UpgradeModifiers {
    fn default() -> Self {
        Self {
            price: 0,
            range_modifier: 1.0,
            impact_modifier: 1.0,
            threshold_modifier: 0.7,
        }
    }
}

/// Catalogue entry describing a purchasable tower.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerBlueprint {
    /// Display name of the tower.
    pub name: String,
    /// Effect the tower applies.
    pub impact_kind: ImpactKind,
    /// Strategy the tower uses to pick targets.
    pub selection: TargetSelection,
    /// Stats at the basic level.
    pub basic: TowerLevelStats,
    /// Scaling applied when reaching [`TowerLevel::Upgrade1`].
    pub upgrade: UpgradeModifiers,
}

impl TowerBlueprint {
    /// Derives the stats the tower exposes at the provided level.
    #[must_use]
    pub fn stats_at(&self, level: TowerLevel) -> TowerLevelStats {
        match level {
            TowerLevel::Basic => self.basic,
            TowerLevel::Upgrade1 => {
                let modifiers = self.upgrade;
                let threshold = self.basic.threshold.as_secs_f32() * modifiers.threshold_modifier;
                TowerLevelStats {
                    price: modifiers.price,
                    range: self.basic.range * modifiers.range_modifier,
                    impact: self.basic.impact * modifiers.impact_modifier,
                    threshold: Duration::try_from_secs_f32(threshold).unwrap_or(Duration::ZERO),
                }
            }
        }
    }
}

/// Catalogue entry describing an enemy type.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemyStats {
    /// Display name of the enemy type.
    pub name: String,
    /// Health the enemy spawns with.
    pub health: f32,
    /// Base movement speed in world units per second.
    pub speed: f32,
    /// Currency credited when the enemy dies.
    pub reward: u32,
}

/// Single configured wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveSpec {
    /// Enemy type spawned by the wave.
    pub enemy: EnemyKind,
    /// Number of enemies spawned, one per spawn point.
    pub count: u32,
}

/// Toggles that bend the rules for testing a level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebugOptions {
    /// Any damage kills its target outright.
    pub instant_kill: bool,
    /// Spending never reduces the balance.
    pub infinite_money: bool,
    /// Arrivals at the goal are never counted.
    pub invincible_base: bool,
}

/// Immutable configuration the world is built from.
#[derive(Clone, Debug, PartialEq)]
pub struct Scenario {
    /// Balance the player starts every session with.
    pub starting_capital: u32,
    /// Number of goal arrivals that loses the game.
    pub max_enemies_at_goal: u32,
    /// Time the shop stays open.
    pub shop_duration: Duration,
    /// Time between a wave starting and the next phase transition.
    pub inter_wave_delay: Duration,
    /// Whether a session opens the shop before the first wave.
    pub open_shop_at_start: bool,
    /// Multiplier applied to an enemy's speed while slowed.
    pub debuff_factor: f32,
    /// Distance within which an enemy counts as having reached its destination.
    pub arrival_tolerance: f32,
    /// Destination every enemy travels toward.
    pub goal: Position,
    /// Anchor of the spawn point layout.
    pub spawn_origin: Position,
    /// Distance between neighbouring spawn points.
    pub spawn_spacing: f32,
    /// Enemy types referenced by waves.
    pub enemies: Vec<EnemyStats>,
    /// Towers available for purchase.
    pub towers: Vec<TowerBlueprint>,
    /// Waves spawned in order.
    pub waves: Vec<WaveSpec>,
    /// Rule-bending toggles.
    pub debug: DebugOptions,
}

impl Scenario {
    /// Looks up an enemy type in the catalogue.
    #[must_use]
    pub fn enemy(&self, kind: EnemyKind) -> Option<&EnemyStats> {
        self.enemies.get(usize::try_from(kind.get()).ok()?)
    }

    /// Looks up a tower blueprint in the catalogue.
    #[must_use]
    pub fn tower(&self, blueprint: BlueprintId) -> Option<&TowerBlueprint> {
        self.towers.get(usize::try_from(blueprint.get()).ok()?)
    }

    /// Finds a tower blueprint by its display name.
    #[must_use]
    pub fn tower_by_name(&self, name: &str) -> Option<BlueprintId> {
        self.towers
            .iter()
            .position(|blueprint| blueprint.name == name)
            .and_then(|index| u32::try_from(index).ok())
            .map(BlueprintId::new)
    }

    /// Number of configured waves.
    #[must_use]
    pub fn wave_count(&self) -> u32 {
        u32::try_from(self.waves.len()).unwrap_or(u32::MAX)
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            starting_capital: 30,
            max_enemies_at_goal: 5,
            shop_duration: Duration::from_secs(10),
            inter_wave_delay: Duration::from_secs(5),
            open_shop_at_start: false,
            debuff_factor: 0.3,
            arrival_tolerance: 2.0,
            goal: Position::ground(0.0, 40.0),
            spawn_origin: Position::ground(-1.0, 0.0),
            spawn_spacing: 2.0,
            enemies: vec![
                EnemyStats {
                    name: "grunt".to_owned(),
                    health: 2.0,
                    speed: 2.0,
                    reward: 5,
                },
                EnemyStats {
                    name: "brute".to_owned(),
                    health: 6.0,
                    speed: 1.5,
                    reward: 12,
                },
            ],
            towers: vec![
                TowerBlueprint {
                    name: "cannon".to_owned(),
                    impact_kind: ImpactKind::Damage,
                    selection: TargetSelection::Closest,
                    basic: TowerLevelStats {
                        price: 20,
                        range: 8.0,
                        impact: 1.0,
                        threshold: Duration::from_secs(1),
                    },
                    upgrade: UpgradeModifiers {
                        price: 25,
                        range_modifier: 1.25,
                        impact_modifier: 2.0,
                        threshold_modifier: 0.7,
                    },
                },
                TowerBlueprint {
                    name: "frost".to_owned(),
                    impact_kind: ImpactKind::Debuff,
                    selection: TargetSelection::Area,
                    basic: TowerLevelStats {
                        price: 15,
                        range: 6.0,
                        impact: 2.0,
                        threshold: Duration::from_millis(1500),
                    },
                    upgrade: UpgradeModifiers {
                        price: 20,
                        range_modifier: 1.5,
                        impact_modifier: 1.5,
                        threshold_modifier: 0.7,
                    },
                },
            ],
            waves: vec![
                WaveSpec {
                    enemy: EnemyKind::new(0),
                    count: 4,
                },
                WaveSpec {
                    enemy: EnemyKind::new(0),
                    count: 6,
                },
                WaveSpec {
                    enemy: EnemyKind::new(1),
                    count: 4,
                },
            ],
            debug: DebugOptions::default(),
        }
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Catalogue entry the enemy was built from.
    pub kind: EnemyKind,
    /// Position the enemy occupies.
    pub position: Position,
    /// Destination the enemy travels toward, if one was assigned.
    pub target: Option<Position>,
    /// Health remaining.
    pub health: f32,
    /// Stored movement speed, reduced while slowed.
    pub speed: f32,
    /// Speed the navigation provider should apply this tick; zero while paused.
    pub effective_speed: f32,
    /// Indicates whether a slow is active.
    pub debuffed: bool,
}

/// Read-only snapshot describing all live enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a single enemy.
    #[must_use]
    pub fn get(&self, enemy: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&enemy, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Blueprint the tower was built from.
    pub blueprint: BlueprintId,
    /// Level the tower has reached.
    pub level: TowerLevel,
    /// Position the tower occupies.
    pub position: Position,
    /// Stats derived from the tower's current level.
    pub stats: TowerLevelStats,
    /// Effect the tower applies.
    pub impact_kind: ImpactKind,
    /// Strategy the tower uses to pick targets.
    pub selection: TargetSelection,
    /// Indicates whether the tower may attack.
    pub active: bool,
    /// Enemies inside the range volume in the order they entered.
    pub in_range: Vec<EnemyId>,
}

/// Read-only snapshot describing all placed towers.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a single tower.
    #[must_use]
    pub fn get(&self, tower: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&tower, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Target chosen for a tower that is ready to attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerTarget {
    /// Identifier of the attacking tower.
    pub tower: TowerId,
    /// Identifier of the enemy being attacked.
    pub enemy: EnemyId,
}

#[cfg(test)]
mod tests {
    use super::{
        BlueprintId, EnemyId, ImpactKind, Outcome, Position, RejectionReason, Scenario,
        TargetSelection, TowerBlueprint, TowerLevel, TowerLevelStats, UpgradeModifiers,
    };
    use serde::{de::DeserializeOwned, Serialize};
    use std::time::Duration;

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    fn blueprint() -> TowerBlueprint {
        TowerBlueprint {
            name: "cannon".to_owned(),
            impact_kind: ImpactKind::Damage,
            selection: TargetSelection::Closest,
            basic: TowerLevelStats {
                price: 20,
                range: 4.0,
                impact: 1.5,
                threshold: Duration::from_secs(2),
            },
            upgrade: UpgradeModifiers {
                price: 35,
                range_modifier: 1.5,
                impact_modifier: 2.0,
                threshold_modifier: 0.5,
            },
        }
    }

    #[test]
    fn distance_matches_expectation() {
        let origin = Position::ground(1.0, 1.0);
        let destination = Position::ground(4.0, 5.0);
        assert!((origin.distance(destination) - 5.0).abs() < f32::EPSILON);
        assert!((destination.distance_squared(origin) - 25.0).abs() < f32::EPSILON);
    }

    #[test]
    fn enemy_id_round_trips_through_bincode() {
        assert_round_trip(&EnemyId::new(42));
    }

    #[test]
    fn outcome_and_rejection_round_trip_through_bincode() {
        assert_round_trip(&Outcome::Lost);
        assert_round_trip(&RejectionReason::InsufficientFunds);
    }

    #[test]
    fn basic_level_reports_configured_stats() {
        let blueprint = blueprint();
        assert_eq!(blueprint.stats_at(TowerLevel::Basic), blueprint.basic);
    }

    #[test]
    fn upgraded_level_scales_basic_stats() {
        let stats = blueprint().stats_at(TowerLevel::Upgrade1);
        assert_eq!(stats.price, 35);
        assert!((stats.range - 6.0).abs() < f32::EPSILON);
        assert!((stats.impact - 3.0).abs() < f32::EPSILON);
        assert_eq!(stats.threshold, Duration::from_secs(1));
    }

    #[test]
    fn negative_threshold_modifier_clamps_to_zero() {
        let mut blueprint = blueprint();
        blueprint.upgrade.threshold_modifier = -1.0;
        assert_eq!(
            blueprint.stats_at(TowerLevel::Upgrade1).threshold,
            Duration::ZERO
        );
    }

    #[test]
    fn levels_advance_once() {
        assert_eq!(TowerLevel::Basic.next(), Some(TowerLevel::Upgrade1));
        assert_eq!(TowerLevel::Upgrade1.next(), None);
    }

    #[test]
    fn default_scenario_resolves_tower_names() {
        let scenario = Scenario::default();
        assert_eq!(scenario.tower_by_name("cannon"), Some(BlueprintId::new(0)));
        assert_eq!(scenario.tower_by_name("missing"), None);
        assert_eq!(scenario.wave_count(), 3);
        assert_eq!(scenario.starting_capital, 30);
    }
}
