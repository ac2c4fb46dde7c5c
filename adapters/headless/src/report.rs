//! Summary of a session suitable for printing or serialising.

use std::time::Duration;

use serde::Serialize;
use siege_defence_core::{Event, GamePhase, Outcome};

/// Aggregate statistics describing a session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionReport {
    /// Ticks applied since the session started.
    pub frames: u64,
    /// Simulated seconds that elapsed, excluding paused frames.
    pub elapsed_secs: f64,
    /// Outcome of the session, if decided.
    pub outcome: Option<Outcome>,
    /// Phase the session was in when the report was taken.
    pub phase: GamePhase,
    /// Balance at the time of the report.
    pub balance: u32,
    /// Waves spawned so far.
    pub waves_spawned: u32,
    /// Waves configured by the scenario.
    pub total_waves: u32,
    /// Enemies counted at the goal.
    pub goal_count: u32,
    /// Goal arrivals that lose the game.
    pub max_goal_count: u32,
    /// Enemies killed by towers.
    pub kills: u32,
    /// Towers placed.
    pub towers_placed: u32,
    /// Shop requests the world rejected.
    pub rejected_requests: u32,
}

/// Counters accumulated from the event stream.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Tally {
    pub(crate) elapsed: Duration,
    pub(crate) kills: u32,
    pub(crate) towers_placed: u32,
    pub(crate) rejected_requests: u32,
}

impl Tally {
    pub(crate) fn observe(&mut self, event: &Event) {
        match event {
            Event::SessionStarted => *self = Self::default(),
            Event::TimeAdvanced { dt } => self.elapsed = self.elapsed.saturating_add(*dt),
            Event::EnemyDied { .. } => self.kills = self.kills.saturating_add(1),
            Event::TowerPlaced { .. } => {
                self.towers_placed = self.towers_placed.saturating_add(1);
            }
            Event::TowerRequestRejected { .. } => {
                self.rejected_requests = self.rejected_requests.saturating_add(1);
            }
            _ => {}
        }
    }
}

impl std::fmt::Display for SessionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let outcome = match self.outcome {
            Some(Outcome::Won) => "won",
            Some(Outcome::Lost) => "lost",
            None => "undecided",
        };
        let phase = match self.phase {
            GamePhase::ShopOpen => "shop open",
            GamePhase::Combat => "combat",
        };
        writeln!(f, "outcome:   {outcome} ({phase})")?;
        writeln!(
            f,
            "time:      {:.2}s over {} frames",
            self.elapsed_secs, self.frames
        )?;
        writeln!(f, "waves:     {}/{}", self.waves_spawned, self.total_waves)?;
        writeln!(f, "at goal:   {}/{}", self.goal_count, self.max_goal_count)?;
        writeln!(f, "kills:     {}", self.kills)?;
        writeln!(
            f,
            "towers:    {} placed, {} requests rejected",
            self.towers_placed, self.rejected_requests
        )?;
        write!(f, "balance:   {}", self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::Tally;
    use siege_defence_core::{EnemyId, Event};
    use std::time::Duration;

    #[test]
    fn session_start_resets_counters() {
        let mut tally = Tally::default();
        tally.observe(&Event::TimeAdvanced {
            dt: Duration::from_millis(250),
        });
        tally.observe(&Event::EnemyDied {
            enemy: EnemyId::new(0),
            reward: 3,
        });
        assert_eq!(tally.kills, 1);
        assert_eq!(tally.elapsed, Duration::from_millis(250));

        tally.observe(&Event::SessionStarted);
        assert_eq!(tally.kills, 0);
        assert!(tally.elapsed.is_zero());
    }
}
