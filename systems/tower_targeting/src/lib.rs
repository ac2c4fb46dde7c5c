#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that picks the enemies a ready tower attacks.

use siege_defence_core::{
    EnemyId, EnemyView, Event, TargetSelection, TowerId, TowerSnapshot, TowerTarget, TowerView,
};

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    ready: Vec<TowerId>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes targets for every tower the event batch reports as ready.
    ///
    /// The output buffer is cleared before populating it. Inactive towers and
    /// towers with an empty range set yield nothing; their cooldown was still
    /// consumed by the world.
    pub fn handle(
        &mut self,
        events: &[Event],
        towers: &TowerView,
        enemies: &EnemyView,
        out: &mut Vec<TowerTarget>,
    ) {
        out.clear();

        self.ready.clear();
        for event in events {
            if let Event::TowerReady { tower } = event {
                if !self.ready.contains(tower) {
                    self.ready.push(*tower);
                }
            }
        }

        if self.ready.is_empty() || enemies.is_empty() {
            return;
        }

        for tower in &self.ready {
            let Some(snapshot) = towers.get(*tower) else {
                continue;
            };

            if !snapshot.active || snapshot.in_range.is_empty() {
                continue;
            }

            match snapshot.selection {
                TargetSelection::Closest => {
                    if let Some(enemy) = closest_in_range(snapshot, enemies) {
                        out.push(TowerTarget {
                            tower: snapshot.id,
                            enemy,
                        });
                    }
                }
                TargetSelection::Area => {
                    out.extend(
                        snapshot
                            .in_range
                            .iter()
                            .filter(|enemy| enemies.get(**enemy).is_some())
                            .map(|enemy| TowerTarget {
                                tower: snapshot.id,
                                enemy: *enemy,
                            }),
                    );
                }
            }
        }
    }
}

/// Scans the range set in entry order; equal distances keep the earlier entry.
fn closest_in_range(tower: &TowerSnapshot, enemies: &EnemyView) -> Option<EnemyId> {
    let mut best: Option<(f32, EnemyId)> = None;

    for enemy in &tower.in_range {
        let Some(candidate) = enemies.get(*enemy) else {
            continue;
        };

        let distance = tower.position.distance_squared(candidate.position);
        match best {
            Some((closest, _)) if distance >= closest => {}
            _ => best = Some((distance, *enemy)),
        }
    }

    best.map(|(_, enemy)| enemy)
}

#[cfg(test)]
mod tests {
    use super::TowerTargeting;
    use siege_defence_core::{
        BlueprintId, EnemyId, EnemyKind, EnemySnapshot, EnemyView, Event, ImpactKind, Position,
        TargetSelection, TowerId, TowerLevel, TowerLevelStats, TowerSnapshot, TowerTarget,
        TowerView,
    };
    use std::time::Duration;

    fn tower(id: u32, selection: TargetSelection, in_range: &[u32]) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(id),
            blueprint: BlueprintId::new(0),
            level: TowerLevel::Basic,
            position: Position::ground(0.0, 0.0),
            stats: TowerLevelStats {
                price: 10,
                range: 10.0,
                impact: 1.0,
                threshold: Duration::from_secs(1),
            },
            impact_kind: ImpactKind::Damage,
            selection,
            active: true,
            in_range: in_range.iter().copied().map(EnemyId::new).collect(),
        }
    }

    fn enemy(id: u32, x: f32, z: f32) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::new(0),
            position: Position::ground(x, z),
            target: None,
            health: 3.0,
            speed: 1.0,
            effective_speed: 1.0,
            debuffed: false,
        }
    }

    fn ready(ids: &[u32]) -> Vec<Event> {
        ids.iter()
            .map(|id| Event::TowerReady {
                tower: TowerId::new(*id),
            })
            .collect()
    }

    fn target(tower: u32, enemy: u32) -> TowerTarget {
        TowerTarget {
            tower: TowerId::new(tower),
            enemy: EnemyId::new(enemy),
        }
    }

    #[test]
    fn closest_enemy_in_range_is_selected() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(1, TargetSelection::Closest, &[4, 2, 7])]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(4, 5.0, 0.0),
            enemy(2, 0.0, 2.0),
            enemy(7, 3.0, 3.0),
        ]);
        let mut out = Vec::new();

        system.handle(&ready(&[1]), &towers, &enemies, &mut out);

        assert_eq!(out, vec![target(1, 2)]);
    }

    #[test]
    fn equal_distances_keep_the_first_entered_enemy() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(1, TargetSelection::Closest, &[9, 3])]);
        let enemies = EnemyView::from_snapshots(vec![enemy(9, 2.0, 0.0), enemy(3, -2.0, 0.0)]);
        let mut out = Vec::new();

        system.handle(&ready(&[1]), &towers, &enemies, &mut out);

        assert_eq!(out, vec![target(1, 9)]);
    }

    #[test]
    fn area_towers_attack_everything_in_range() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(2, TargetSelection::Area, &[5, 1, 8])]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(1, 1.0, 0.0),
            enemy(5, 2.0, 0.0),
            enemy(8, 3.0, 0.0),
        ]);
        let mut out = Vec::new();

        system.handle(&ready(&[2]), &towers, &enemies, &mut out);

        assert_eq!(out, vec![target(2, 5), target(2, 1), target(2, 8)]);
    }

    #[test]
    fn inactive_empty_or_unready_towers_stay_silent() {
        let mut system = TowerTargeting::new();
        let mut inactive = tower(1, TargetSelection::Closest, &[1]);
        inactive.active = false;
        let towers = TowerView::from_snapshots(vec![
            inactive,
            tower(2, TargetSelection::Area, &[]),
            tower(3, TargetSelection::Closest, &[1]),
        ]);
        let enemies = EnemyView::from_snapshots(vec![enemy(1, 1.0, 1.0)]);
        let mut out = vec![target(99, 99)];

        system.handle(&ready(&[1, 2]), &towers, &enemies, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn enemies_missing_from_view_are_skipped() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(1, TargetSelection::Closest, &[6, 4])]);
        let enemies = EnemyView::from_snapshots(vec![enemy(4, 8.0, 0.0)]);
        let mut out = Vec::new();

        system.handle(&ready(&[1, 1]), &towers, &enemies, &mut out);

        assert_eq!(out, vec![target(1, 4)]);
    }
}
