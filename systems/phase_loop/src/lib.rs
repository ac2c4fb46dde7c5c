#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game loop that alternates the shop and combat phases on timer expiry.

use siege_defence_core::{Command, Event};

/// Configuration parameters required to construct the game loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    open_shop_at_start: bool,
}

impl Config {
    /// Creates a configuration deciding whether a session begins in the shop.
    #[must_use]
    pub const fn new(open_shop_at_start: bool) -> Self {
        Self { open_shop_at_start }
    }
}

/// Pure system driving the shop/combat state machine.
///
/// The loop only reacts to events: a session start kicks off the first
/// phase, and every phase timer expiry selects the next one. Once the game
/// is won or lost the loop stays silent until the next session starts.
#[derive(Debug)]
pub struct GameLoop {
    open_shop_at_start: bool,
    shop_open: bool,
    finished: bool,
}

impl GameLoop {
    /// Creates a game loop using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            open_shop_at_start: config.open_shop_at_start,
            shop_open: false,
            finished: false,
        }
    }

    /// Consumes world events and emits the phase transition commands.
    ///
    /// `waves_remaining` reports whether another wave is configured; it
    /// decides between reopening the shop and completing the waves.
    pub fn handle(&mut self, events: &[Event], waves_remaining: bool, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::SessionStarted => {
                    self.shop_open = false;
                    self.finished = false;
                    if self.open_shop_at_start {
                        out.push(Command::OpenShop);
                    } else {
                        out.push(Command::CloseShop);
                        out.push(Command::SpawnNextWave);
                    }
                }
                Event::ShopOpened => self.shop_open = true,
                Event::ShopClosed => self.shop_open = false,
                Event::GameWon | Event::GameLost => self.finished = true,
                Event::PhaseTimerExpired if !self.finished => {
                    if self.shop_open {
                        out.push(Command::CloseShop);
                        out.push(Command::SpawnNextWave);
                    } else if waves_remaining {
                        out.push(Command::OpenShop);
                    } else {
                        out.push(Command::CompleteWaves);
                    }
                }
                _ => {}
            }
        }
    }

    /// Reports whether the loop saw the game end.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
