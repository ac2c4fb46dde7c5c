#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Straight-line navigation that advances enemies toward their destination.

use std::time::Duration;

use glam::Vec3;
use siege_defence_core::{Command, EnemyView, Event, Position};

/// Pure system that reacts to elapsed time and emits position reports.
#[derive(Debug, Default)]
pub struct Movement {
    scratch: Vec<Command>,
}

impl Movement {
    /// Creates a movement system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves every enemy with a destination by `effective_speed * dt`.
    ///
    /// Elapsed time is taken from the `TimeAdvanced` events in the batch.
    /// Steps never overshoot the destination, and paused enemies report no
    /// movement because their effective speed is zero.
    pub fn handle(&mut self, events: &[Event], enemies: &EnemyView, out: &mut Vec<Command>) {
        let elapsed = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt } => Some(*dt),
                _ => None,
            })
            .fold(Duration::ZERO, Duration::saturating_add);
        if elapsed.is_zero() {
            return;
        }

        self.scratch.clear();
        let seconds = elapsed.as_secs_f32();

        for enemy in enemies.iter() {
            let Some(target) = enemy.target else {
                continue;
            };

            if enemy.effective_speed <= 0.0 {
                continue;
            }

            let current = to_vec(enemy.position);
            let offset = to_vec(target) - current;
            if offset == Vec3::ZERO {
                continue;
            }

            let next = current + offset.clamp_length_max(enemy.effective_speed * seconds);
            self.scratch.push(Command::ReportEnemyPosition {
                enemy: enemy.id,
                position: Position::new(next.x, next.y, next.z),
            });
        }

        out.append(&mut self.scratch);
    }
}

fn to_vec(position: Position) -> Vec3 {
    Vec3::new(position.x(), position.y(), position.z())
}

#[cfg(test)]
mod tests {
    use super::Movement;
    use siege_defence_core::{
        Command, EnemyId, EnemyKind, EnemySnapshot, EnemyView, Event, Position,
    };
    use std::time::Duration;

    fn enemy(id: u32, position: Position, target: Option<Position>, speed: f32) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::new(0),
            position,
            target,
            health: 1.0,
            speed,
            effective_speed: speed,
            debuffed: false,
        }
    }

    fn tick(millis: u64) -> Vec<Event> {
        vec![Event::TimeAdvanced {
            dt: Duration::from_millis(millis),
        }]
    }

    #[test]
    fn enemies_step_toward_target_at_effective_speed() {
        let mut movement = Movement::new();
        let enemies = EnemyView::from_snapshots(vec![enemy(
            1,
            Position::ground(0.0, 0.0),
            Some(Position::ground(0.0, 10.0)),
            2.0,
        )]);
        let mut out = Vec::new();

        movement.handle(&tick(500), &enemies, &mut out);

        assert_eq!(
            out,
            vec![Command::ReportEnemyPosition {
                enemy: EnemyId::new(1),
                position: Position::ground(0.0, 1.0),
            }]
        );
    }

    #[test]
    fn steps_never_overshoot_the_target() {
        let mut movement = Movement::new();
        let goal = Position::ground(3.0, 4.0);
        let enemies = EnemyView::from_snapshots(vec![enemy(
            1,
            Position::ground(0.0, 0.0),
            Some(goal),
            100.0,
        )]);
        let mut out = Vec::new();

        movement.handle(&tick(1000), &enemies, &mut out);

        let Some(Command::ReportEnemyPosition { position, .. }) = out.first() else {
            panic!("expected a position report, got {out:?}");
        };
        assert!(position.distance(goal) < 1e-4);
    }

    #[test]
    fn paused_idle_or_zero_time_enemies_stay_put() {
        let mut movement = Movement::new();
        let mut paused = enemy(
            1,
            Position::ground(0.0, 0.0),
            Some(Position::ground(5.0, 0.0)),
            2.0,
        );
        paused.effective_speed = 0.0;
        let idle = enemy(2, Position::ground(1.0, 1.0), None, 2.0);
        let enemies = EnemyView::from_snapshots(vec![paused, idle]);
        let mut out = Vec::new();

        movement.handle(&tick(500), &enemies, &mut out);
        assert!(out.is_empty());

        let moving = EnemyView::from_snapshots(vec![enemy(
            3,
            Position::ground(0.0, 0.0),
            Some(Position::ground(5.0, 0.0)),
            2.0,
        )]);
        movement.handle(&tick(0), &moving, &mut out);
        movement.handle(&[Event::ShopOpened], &moving, &mut out);
        assert!(out.is_empty());
    }
}
