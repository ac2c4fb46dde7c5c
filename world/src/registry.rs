//! Live enemy tracking, goal arrivals and the end-of-waves verdict.

use siege_defence_core::{EnemyId, EnemyKind, EnemyStats, Outcome, Position};

use crate::enemies::Enemy;

/// Result of counting an arrival at the goal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ArrivalTally {
    /// Enemies counted at the goal so far.
    pub(crate) count: u32,
    /// Whether this arrival reached the configured maximum.
    pub(crate) reached_max: bool,
}

/// Registry of live enemies and the goal-arrival counter.
#[derive(Debug)]
pub(crate) struct EnemyRegistry {
    enemies: Vec<Enemy>,
    next_enemy_id: EnemyId,
    at_goal: u32,
    max_at_goal: u32,
}

impl EnemyRegistry {
    pub(crate) fn new(max_at_goal: u32) -> Self {
        Self {
            enemies: Vec::new(),
            next_enemy_id: EnemyId::new(0),
            at_goal: 0,
            max_at_goal,
        }
    }

    pub(crate) fn at_goal(&self) -> u32 {
        self.at_goal
    }

    pub(crate) fn max_at_goal(&self) -> u32 {
        self.max_at_goal
    }

    /// Spawns one enemy and starts tracking it.
    pub(crate) fn spawn(&mut self, kind: EnemyKind, stats: &EnemyStats, at: Position) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
        self.enemies.push(Enemy::spawn(id, kind, stats, at));
        id
    }

    pub(crate) fn get_mut(&mut self, enemy: EnemyId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|candidate| candidate.id == enemy)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.enemies.iter_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.enemies.len()
    }

    /// Removes enemies that died or arrived, returning their identifiers.
    ///
    /// Handlers mark enemies retired while iterating; removal happens here,
    /// once the iteration finished.
    pub(crate) fn sweep_retired(&mut self) -> Vec<EnemyId> {
        let retired: Vec<EnemyId> = self
            .enemies
            .iter()
            .filter(|enemy| enemy.lifecycle.is_retired())
            .map(|enemy| enemy.id)
            .collect();
        if !retired.is_empty() {
            self.enemies.retain(|enemy| !enemy.lifecycle.is_retired());
        }
        retired
    }

    /// Counts an arrival. Returns `None` once the maximum was reached.
    pub(crate) fn record_arrival(&mut self) -> Option<ArrivalTally> {
        if self.at_goal >= self.max_at_goal {
            return None;
        }

        self.at_goal += 1;
        Some(ArrivalTally {
            count: self.at_goal,
            reached_max: self.at_goal == self.max_at_goal,
        })
    }

    /// Outcome decided once every wave completed, given any earlier decision.
    pub(crate) fn final_verdict(&self, decided: Option<Outcome>) -> Option<Outcome> {
        match decided {
            Some(_) => None,
            None if self.at_goal < self.max_at_goal => Some(Outcome::Won),
            None => Some(Outcome::Lost),
        }
    }
}
