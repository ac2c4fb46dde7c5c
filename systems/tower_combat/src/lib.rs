#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns tower targets into damage and slow commands.

use std::time::Duration;

use siege_defence_core::{Command, ImpactKind, TowerTarget, TowerView};

/// Tower combat system that queues impact commands for targeted enemies.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::DamageEnemy` or `Command::DebuffEnemy` per target.
    ///
    /// Damage towers subtract their impact from health; debuff towers slow
    /// their target for `impact` seconds.
    pub fn handle(&mut self, towers: &TowerView, targets: &[TowerTarget], out: &mut Vec<Command>) {
        if targets.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in targets {
            let Some(tower) = towers.get(target.tower) else {
                continue;
            };

            let impact = tower.stats.impact;
            self.scratch.push(match tower.impact_kind {
                ImpactKind::Damage => Command::DamageEnemy {
                    enemy: target.enemy,
                    amount: impact,
                },
                ImpactKind::Debuff => Command::DebuffEnemy {
                    enemy: target.enemy,
                    duration: Duration::try_from_secs_f32(impact).unwrap_or(Duration::ZERO),
                },
            });
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}
