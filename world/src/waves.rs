//! Wave progression and spawn point layout.

use siege_defence_core::{Position, WaveSpec};

/// Tracks which configured wave spawns next.
#[derive(Clone, Debug, Default)]
pub(crate) struct WaveDirector {
    next_index: u32,
    in_flight: Option<u32>,
}

impl WaveDirector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of waves spawned so far.
    pub(crate) fn spawned(&self) -> u32 {
        self.next_index
    }

    /// Reports whether any configured wave has not been spawned yet.
    pub(crate) fn has_remaining(&self, waves: &[WaveSpec]) -> bool {
        usize::try_from(self.next_index).map_or(false, |index| index < waves.len())
    }

    /// Claims the next wave, returning its one-based index and definition.
    pub(crate) fn advance<'a>(&mut self, waves: &'a [WaveSpec]) -> Option<(u32, &'a WaveSpec)> {
        let spec = waves.get(usize::try_from(self.next_index).ok()?)?;
        self.next_index = self.next_index.saturating_add(1);
        self.in_flight = Some(self.next_index);
        Some((self.next_index, spec))
    }

    /// Takes the one-based index of the wave awaiting its end notification.
    pub(crate) fn take_in_flight(&mut self) -> Option<u32> {
        self.in_flight.take()
    }
}

/// Lays out `count` spawn points in two columns anchored at `origin`.
pub(crate) fn spawn_points(origin: Position, spacing: f32, count: u32) -> Vec<Position> {
    (0..count)
        .map(|index| {
            let column = (index % 2) as f32;
            let row = (index / 2) as f32;
            origin.offset(column * spacing, 0.0, -row * spacing)
        })
        .collect()
}
