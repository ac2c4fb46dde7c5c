#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Overlap sensing that keeps each tower's range set in sync with enemy positions.

use siege_defence_core::{Command, EnemyView, TowerView};

/// Pure system that diffs range volumes against the recorded range sets.
#[derive(Debug, Default)]
pub struct RangeSensing {
    scratch: Vec<Command>,
}

impl RangeSensing {
    /// Creates a range sensing system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits enter and exit notifications for every change in overlap.
    ///
    /// An enemy overlaps a tower when its distance is at most the tower's
    /// range. Entries are emitted in ascending enemy order per tower.
    pub fn handle(&mut self, towers: &TowerView, enemies: &EnemyView, out: &mut Vec<Command>) {
        self.scratch.clear();

        for tower in towers.iter() {
            let radius_sq = tower.stats.range * tower.stats.range;

            for enemy in enemies.iter() {
                let inside = tower.position.distance_squared(enemy.position) <= radius_sq;
                let recorded = tower.in_range.contains(&enemy.id);

                if inside && !recorded {
                    self.scratch.push(Command::EnemyEnteredRange {
                        tower: tower.id,
                        enemy: enemy.id,
                    });
                } else if !inside && recorded {
                    self.scratch.push(Command::EnemyExitedRange {
                        tower: tower.id,
                        enemy: enemy.id,
                    });
                }
            }
        }

        out.append(&mut self.scratch);
    }
}
