//! Per-enemy health, speed, slow and mover state.

use std::time::Duration;

use siege_defence_core::{EnemyId, EnemyKind, EnemySnapshot, EnemyStats, Position};

/// Lifecycle of a single enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    /// Spawned but no destination assigned yet.
    Idle,
    /// Travelling toward its destination.
    Moving,
    /// Reached its destination; movement halted.
    Arrived,
    /// Health dropped to zero.
    Dead,
}

impl Lifecycle {
    /// Terminal states leave the simulation at the end of the current command.
    pub(crate) const fn is_retired(self) -> bool {
        matches!(self, Self::Arrived | Self::Dead)
    }
}

/// Result of applying damage to an enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum DamageOutcome {
    /// The enemy survived with the reported health.
    Wounded(f32),
    /// The enemy died; carries the reward to credit.
    Killed {
        /// Health after the killing blow.
        health: f32,
        /// Currency carried by the enemy.
        reward: u32,
    },
}

/// Authoritative state of a spawned enemy.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) position: Position,
    pub(crate) target: Option<Position>,
    pub(crate) lifecycle: Lifecycle,
    health: f32,
    base_speed: f32,
    speed: f32,
    reward: u32,
    debuff_remaining: Option<Duration>,
}

impl Enemy {
    /// Creates an idle enemy at the provided spawn point.
    pub(crate) fn spawn(id: EnemyId, kind: EnemyKind, stats: &EnemyStats, at: Position) -> Self {
        Self {
            id,
            kind,
            position: at,
            target: None,
            lifecycle: Lifecycle::Idle,
            health: stats.health,
            base_speed: stats.speed,
            speed: stats.speed,
            reward: stats.reward,
            debuff_remaining: None,
        }
    }

    pub(crate) fn health(&self) -> f32 {
        self.health
    }

    pub(crate) fn speed(&self) -> f32 {
        self.speed
    }

    pub(crate) fn is_debuffed(&self) -> bool {
        self.debuff_remaining.is_some()
    }

    /// Updates the destination. Ignored once the enemy retired.
    pub(crate) fn set_target(&mut self, target: Position) -> bool {
        if self.lifecycle.is_retired() {
            return false;
        }

        self.target = Some(target);
        self.lifecycle = Lifecycle::Moving;
        true
    }

    /// Records a position produced by the navigation provider.
    pub(crate) fn move_to(&mut self, position: Position) -> bool {
        if self.lifecycle != Lifecycle::Moving {
            return false;
        }

        self.position = position;
        true
    }

    /// Transitions to [`Lifecycle::Arrived`] when within `tolerance` of the target.
    ///
    /// Returns `true` only on the transition itself.
    pub(crate) fn check_arrival(&mut self, tolerance: f32) -> bool {
        if self.lifecycle != Lifecycle::Moving {
            return false;
        }

        let Some(target) = self.target else {
            return false;
        };

        if self.position.distance_squared(target) <= tolerance * tolerance {
            self.lifecycle = Lifecycle::Arrived;
            return true;
        }

        false
    }

    /// Subtracts health. Dead or arrived enemies ignore further damage.
    pub(crate) fn apply_damage(&mut self, amount: f32) -> Option<DamageOutcome> {
        if self.lifecycle.is_retired() {
            return None;
        }

        self.health -= amount;
        if self.health <= 0.0 {
            self.lifecycle = Lifecycle::Dead;
            return Some(DamageOutcome::Killed {
                health: self.health,
                reward: self.reward,
            });
        }

        Some(DamageOutcome::Wounded(self.health))
    }

    /// Slows the enemy by `factor` for `duration`. Active slows do not stack.
    pub(crate) fn apply_debuff(&mut self, factor: f32, duration: Duration) -> bool {
        if self.lifecycle.is_retired() || self.debuff_remaining.is_some() {
            return false;
        }

        self.speed *= factor;
        self.debuff_remaining = Some(duration);
        true
    }

    /// Counts the slow down, restoring base speed on the tick it runs out.
    pub(crate) fn advance_debuff(&mut self, dt: Duration) -> bool {
        let Some(remaining) = self.debuff_remaining else {
            return false;
        };

        let left = remaining.saturating_sub(dt);
        if left.is_zero() {
            self.debuff_remaining = None;
            self.speed = self.base_speed;
            return true;
        }

        self.debuff_remaining = Some(left);
        false
    }

    pub(crate) fn snapshot(&self, paused: bool) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            target: self.target,
            health: self.health,
            speed: self.speed,
            effective_speed: if paused { 0.0 } else { self.speed },
            debuffed: self.is_debuffed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DamageOutcome, Enemy, Lifecycle};
    use proptest::prelude::*;
    use siege_defence_core::{EnemyId, EnemyKind, EnemyStats, Position};
    use std::time::Duration;

    fn grunt() -> Enemy {
        let stats = EnemyStats {
            name: "grunt".to_owned(),
            health: 3.0,
            speed: 2.0,
            reward: 7,
        };
        Enemy::spawn(EnemyId::new(1), EnemyKind::new(0), &stats, Position::ground(0.0, 0.0))
    }

    #[test]
    fn death_is_reported_once() {
        let mut enemy = grunt();
        assert_eq!(enemy.apply_damage(1.0), Some(DamageOutcome::Wounded(2.0)));
        assert_eq!(
            enemy.apply_damage(2.0),
            Some(DamageOutcome::Killed {
                health: 0.0,
                reward: 7
            })
        );
        assert_eq!(enemy.apply_damage(5.0), None);
        assert_eq!(enemy.lifecycle, Lifecycle::Dead);
    }

    #[test]
    fn debuff_does_not_stack_and_restores_base_speed() {
        let mut enemy = grunt();
        assert!(enemy.apply_debuff(0.5, Duration::from_secs(1)));
        assert!(!enemy.apply_debuff(0.5, Duration::from_secs(5)));
        assert!((enemy.speed() - 1.0).abs() < f32::EPSILON);

        assert!(!enemy.advance_debuff(Duration::from_millis(600)));
        assert!(enemy.advance_debuff(Duration::from_millis(600)));
        assert!((enemy.speed() - 2.0).abs() < f32::EPSILON);
        assert!(!enemy.is_debuffed());
    }

    #[test]
    fn arrival_fires_once_and_halts_movement() {
        let mut enemy = grunt();
        assert!(!enemy.check_arrival(1.0), "idle enemies never arrive");
        assert!(enemy.set_target(Position::ground(0.0, 10.0)));
        assert!(!enemy.check_arrival(1.0));

        assert!(enemy.move_to(Position::ground(0.0, 9.5)));
        assert!(enemy.check_arrival(1.0));
        assert!(!enemy.check_arrival(1.0));

        assert!(!enemy.move_to(Position::ground(5.0, 5.0)));
        assert!(!enemy.set_target(Position::ground(1.0, 1.0)));
        assert_eq!(enemy.position, Position::ground(0.0, 9.5));
    }

    #[test]
    fn idle_enemies_ignore_position_reports() {
        let mut enemy = grunt();
        assert!(!enemy.move_to(Position::ground(3.0, 3.0)));
        assert_eq!(enemy.position, Position::ground(0.0, 0.0));
        assert_eq!(enemy.lifecycle, Lifecycle::Idle);
    }

    #[test]
    fn pause_zeroes_effective_speed_only() {
        let enemy = grunt();
        let snapshot = enemy.snapshot(true);
        assert_eq!(snapshot.effective_speed, 0.0);
        assert!((snapshot.speed - 2.0).abs() < f32::EPSILON);
    }

    #[derive(Clone, Copy, Debug)]
    enum SlowStep {
        Debuff(u64),
        Advance(u64),
    }

    fn slow_step() -> impl Strategy<Value = SlowStep> {
        prop_oneof![
            (0u64..3_000).prop_map(SlowStep::Debuff),
            (0u64..1_000).prop_map(SlowStep::Advance),
        ]
    }

    proptest! {
        #[test]
        fn slows_never_compound(
            factor in 0.1f32..=1.0,
            steps in prop::collection::vec(slow_step(), 0..48),
        ) {
            let mut enemy = grunt();
            let slowed = 2.0 * factor;
            for step in steps {
                match step {
                    SlowStep::Debuff(millis) => {
                        let was_debuffed = enemy.is_debuffed();
                        let applied = enemy.apply_debuff(factor, Duration::from_millis(millis));
                        prop_assert_eq!(applied, !was_debuffed);
                    }
                    SlowStep::Advance(millis) => {
                        let _ = enemy.advance_debuff(Duration::from_millis(millis));
                    }
                }

                let expected = if enemy.is_debuffed() { slowed } else { 2.0 };
                prop_assert!((enemy.speed() - expected).abs() < 1e-5);
            }
        }
    }
}
