//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use siege_defence_core::{
    BlueprintId, EnemyId, Position, TowerBlueprint, TowerId, TowerLevel, TowerLevelStats,
    TowerSnapshot,
};

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Blueprint the tower was built from.
    pub(crate) blueprint: BlueprintId,
    /// Level the tower has reached.
    pub(crate) level: TowerLevel,
    /// Position the tower occupies.
    pub(crate) position: Position,
    /// Stats derived from the current level.
    pub(crate) stats: TowerLevelStats,
    /// Whether the tower may attack.
    pub(crate) active: bool,
    /// Time accumulated toward the next attack.
    pub(crate) accumulator: Duration,
    /// Enemies inside the range volume in entry order.
    pub(crate) in_range: Vec<EnemyId>,
}

impl TowerState {
    fn new(id: TowerId, blueprint: BlueprintId, stats: TowerLevelStats, position: Position) -> Self {
        Self {
            id,
            blueprint,
            level: TowerLevel::Basic,
            position,
            stats,
            active: false,
            accumulator: stats.threshold,
            in_range: Vec::new(),
        }
    }

    /// Re-derives stats for a new level and restarts the attack cadence.
    pub(crate) fn set_level(&mut self, level: TowerLevel, stats: TowerLevelStats) {
        self.level = level;
        self.stats = stats;
        self.accumulator = stats.threshold;
    }

    /// Accumulates elapsed time, returning `true` when the cooldown elapsed.
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        self.accumulator = self.accumulator.saturating_add(dt);
        if self.accumulator >= self.stats.threshold {
            self.accumulator = Duration::ZERO;
            return true;
        }
        false
    }

    pub(crate) fn enter_range(&mut self, enemy: EnemyId) {
        if !self.in_range.contains(&enemy) {
            self.in_range.push(enemy);
        }
    }

    pub(crate) fn exit_range(&mut self, enemy: EnemyId) {
        self.in_range.retain(|candidate| *candidate != enemy);
    }

    pub(crate) fn snapshot(&self, blueprint: &TowerBlueprint) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            blueprint: self.blueprint,
            level: self.level,
            position: self.position,
            stats: self.stats,
            impact_kind: blueprint.impact_kind,
            selection: blueprint.selection,
            active: self.active,
            in_range: self.in_range.clone(),
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Places an inactive tower and returns its identifier.
    pub(crate) fn insert(
        &mut self,
        blueprint: BlueprintId,
        stats: TowerLevelStats,
        position: Position,
    ) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        let previous = self
            .entries
            .insert(id, TowerState::new(id, blueprint, stats, position));
        debug_assert!(previous.is_none(), "tower identifiers are never reused");
        id
    }

    pub(crate) fn remove(&mut self, tower: TowerId) -> Option<TowerState> {
        self.entries.remove(&tower)
    }

    pub(crate) fn get(&self, tower: TowerId) -> Option<&TowerState> {
        self.entries.get(&tower)
    }

    pub(crate) fn get_mut(&mut self, tower: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&tower)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Switches every tower's activity flag.
    pub(crate) fn set_active(&mut self, active: bool) {
        for tower in self.entries.values_mut() {
            tower.active = active;
        }
    }

    /// Drops a retired enemy from every range set.
    pub(crate) fn forget_enemy(&mut self, enemy: EnemyId) {
        for tower in self.entries.values_mut() {
            tower.exit_range(enemy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(threshold_ms: u64) -> TowerLevelStats {
        TowerLevelStats {
            price: 20,
            range: 4.0,
            impact: 1.0,
            threshold: Duration::from_millis(threshold_ms),
        }
    }

    #[test]
    fn registry_starts_empty_and_allocates_sequential_identifiers() {
        let mut registry = TowerRegistry::new();
        assert_eq!(registry.len(), 0);

        let first = registry.insert(BlueprintId::new(0), stats(1000), Position::default());
        let second = registry.insert(BlueprintId::new(0), stats(1000), Position::default());
        assert_eq!(first, TowerId::new(0));
        assert_eq!(second, TowerId::new(1));

        let _ = registry.remove(first);
        let third = registry.insert(BlueprintId::new(0), stats(1000), Position::default());
        assert_eq!(third, TowerId::new(2));
    }

    #[test]
    fn placed_tower_is_inactive_and_ready() {
        let mut registry = TowerRegistry::new();
        let id = registry.insert(BlueprintId::new(0), stats(1000), Position::default());
        let tower = registry.get_mut(id).expect("tower placed");
        assert!(!tower.active);
        assert!(tower.advance(Duration::ZERO), "first tick attacks immediately");
        assert!(!tower.advance(Duration::from_millis(999)));
        assert!(tower.advance(Duration::from_millis(1)));
    }

    #[test]
    fn range_set_ignores_duplicates_and_forgets_retired_enemies() {
        let mut registry = TowerRegistry::new();
        let id = registry.insert(BlueprintId::new(0), stats(1000), Position::default());
        {
            let tower = registry.get_mut(id).expect("tower placed");
            tower.enter_range(EnemyId::new(3));
            tower.enter_range(EnemyId::new(1));
            tower.enter_range(EnemyId::new(3));
        }
        assert_eq!(
            registry.get(id).expect("tower").in_range,
            vec![EnemyId::new(3), EnemyId::new(1)]
        );

        registry.forget_enemy(EnemyId::new(3));
        assert_eq!(registry.get(id).expect("tower").in_range, vec![EnemyId::new(1)]);
    }
}
