#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! TOML scenario loading for Siege Defence.
//!
//! Scenario files describe the enemy and tower catalogues and the ordered
//! wave list. Waves refer to enemies by name; loading resolves those names
//! to catalogue indices and validates every value before handing back an
//! immutable [`Scenario`]. Scalar settings that are omitted fall back to
//! [`Scenario::default`].

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use siege_defence_core::{
    DebugOptions, EnemyKind, EnemyStats, ImpactKind, Position, Scenario, TargetSelection,
    TowerBlueprint, TowerLevelStats, UpgradeModifiers, WaveSpec,
};

/// Largest number of enemies a single wave may spawn.
pub const MAX_WAVE_SIZE: u32 = 1_000;

/// Errors raised while loading a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The scenario file could not be read.
    #[error("failed to read scenario at {}: {source}", path.display())]
    Io {
        /// Location that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid TOML or does not match the scenario layout.
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),
    /// A wave names an enemy missing from the catalogue.
    #[error("wave {wave} refers to unknown enemy `{name}`")]
    UnknownEnemy {
        /// One-based index of the offending wave.
        wave: usize,
        /// Name that failed to resolve.
        name: String,
    },
    /// A required catalogue has no entries.
    #[error("scenario defines no {0}")]
    EmptyCatalogue(&'static str),
    /// A value is outside its permitted range.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Dotted path of the offending field.
        field: String,
        /// Constraint the value violated.
        reason: &'static str,
    },
}

/// Reads and validates the scenario stored at `path`.
pub fn load_scenario(path: impl AsRef<Path>) -> Result<Scenario, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scenario(&contents)
}

/// Parses and validates a scenario from TOML text.
pub fn parse_scenario(contents: &str) -> Result<Scenario, ConfigError> {
    let raw: RawScenario = toml::from_str(contents)?;
    raw.resolve()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScenario {
    starting_capital: Option<u32>,
    max_enemies_at_goal: Option<u32>,
    shop_duration_secs: Option<f32>,
    inter_wave_delay_secs: Option<f32>,
    open_shop_at_start: Option<bool>,
    debuff_factor: Option<f32>,
    arrival_tolerance: Option<f32>,
    goal: Option<[f32; 3]>,
    spawn_origin: Option<[f32; 3]>,
    spawn_spacing: Option<f32>,
    #[serde(default)]
    enemies: Vec<RawEnemy>,
    #[serde(default)]
    towers: Vec<RawTower>,
    #[serde(default)]
    waves: Vec<RawWave>,
    #[serde(default)]
    debug: RawDebug,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEnemy {
    name: String,
    health: f32,
    speed: f32,
    reward: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTower {
    name: String,
    impact: RawImpact,
    selection: RawSelection,
    basic: RawLevel,
    #[serde(default)]
    upgrade: RawUpgrade,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawImpact {
    Damage,
    Debuff,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawSelection {
    Closest,
    Area,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLevel {
    price: u32,
    range: f32,
    impact: f32,
    threshold_secs: f32,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawUpgrade {
    price: u32,
    range_modifier: f32,
    impact_modifier: f32,
    threshold_modifier: f32,
}

impl Default for RawUpgrade {
    fn default() -> Self {
        let modifiers = UpgradeModifiers::default();
        Self {
            price: modifiers.price,
            range_modifier: modifiers.range_modifier,
            impact_modifier: modifiers.impact_modifier,
            threshold_modifier: modifiers.threshold_modifier,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWave {
    enemy: String,
    count: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawDebug {
    instant_kill: bool,
    infinite_money: bool,
    invincible_base: bool,
}

impl RawScenario {
    fn resolve(self) -> Result<Scenario, ConfigError> {
        let defaults = Scenario::default();

        if self.enemies.is_empty() {
            return Err(ConfigError::EmptyCatalogue("enemies"));
        }
        if self.towers.is_empty() {
            return Err(ConfigError::EmptyCatalogue("towers"));
        }
        if self.waves.is_empty() {
            return Err(ConfigError::EmptyCatalogue("waves"));
        }

        let max_enemies_at_goal = self
            .max_enemies_at_goal
            .unwrap_or(defaults.max_enemies_at_goal);
        if max_enemies_at_goal == 0 {
            return Err(invalid("max_enemies_at_goal", "must be greater than zero"));
        }

        let enemies = self
            .enemies
            .into_iter()
            .map(RawEnemy::resolve)
            .collect::<Result<Vec<_>, _>>()?;
        ensure_unique("enemies", enemies.iter().map(|enemy| enemy.name.as_str()))?;

        let towers = self
            .towers
            .into_iter()
            .map(RawTower::resolve)
            .collect::<Result<Vec<_>, _>>()?;
        ensure_unique("towers", towers.iter().map(|tower| tower.name.as_str()))?;

        let waves = self
            .waves
            .into_iter()
            .enumerate()
            .map(|(index, wave)| wave.resolve(index + 1, &enemies))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Scenario {
            starting_capital: self.starting_capital.unwrap_or(defaults.starting_capital),
            max_enemies_at_goal,
            shop_duration: optional_seconds(
                "shop_duration_secs",
                self.shop_duration_secs,
                defaults.shop_duration,
            )?,
            inter_wave_delay: optional_seconds(
                "inter_wave_delay_secs",
                self.inter_wave_delay_secs,
                defaults.inter_wave_delay,
            )?,
            open_shop_at_start: self
                .open_shop_at_start
                .unwrap_or(defaults.open_shop_at_start),
            debuff_factor: fraction(
                "debuff_factor",
                self.debuff_factor.unwrap_or(defaults.debuff_factor),
            )?,
            arrival_tolerance: non_negative(
                "arrival_tolerance",
                self.arrival_tolerance.unwrap_or(defaults.arrival_tolerance),
            )?,
            goal: self
                .goal
                .map_or(Ok(defaults.goal), |value| position("goal", value))?,
            spawn_origin: self
                .spawn_origin
                .map_or(Ok(defaults.spawn_origin), |value| {
                    position("spawn_origin", value)
                })?,
            spawn_spacing: non_negative(
                "spawn_spacing",
                self.spawn_spacing.unwrap_or(defaults.spawn_spacing),
            )?,
            enemies,
            towers,
            waves,
            debug: DebugOptions {
                instant_kill: self.debug.instant_kill,
                infinite_money: self.debug.infinite_money,
                invincible_base: self.debug.invincible_base,
            },
        })
    }
}

impl RawEnemy {
    fn resolve(self) -> Result<EnemyStats, ConfigError> {
        let field = |name: &str| format!("enemies.{}.{name}", self.name);
        if !self.health.is_finite() || self.health <= 0.0 {
            return Err(invalid(field("health"), "must be a positive number"));
        }
        let speed = non_negative(field("speed"), self.speed)?;

        Ok(EnemyStats {
            name: self.name,
            health: self.health,
            speed,
            reward: self.reward,
        })
    }
}

impl RawTower {
    fn resolve(self) -> Result<TowerBlueprint, ConfigError> {
        let field = |name: &str| format!("towers.{}.{name}", self.name);
        let basic = TowerLevelStats {
            price: self.basic.price,
            range: non_negative(field("basic.range"), self.basic.range)?,
            impact: non_negative(field("basic.impact"), self.basic.impact)?,
            threshold: seconds(field("basic.threshold_secs"), self.basic.threshold_secs)?,
        };
        let upgrade = UpgradeModifiers {
            price: self.upgrade.price,
            range_modifier: non_negative(
                field("upgrade.range_modifier"),
                self.upgrade.range_modifier,
            )?,
            impact_modifier: non_negative(
                field("upgrade.impact_modifier"),
                self.upgrade.impact_modifier,
            )?,
            threshold_modifier: non_negative(
                field("upgrade.threshold_modifier"),
                self.upgrade.threshold_modifier,
            )?,
        };

        Ok(TowerBlueprint {
            name: self.name,
            impact_kind: match self.impact {
                RawImpact::Damage => ImpactKind::Damage,
                RawImpact::Debuff => ImpactKind::Debuff,
            },
            selection: match self.selection {
                RawSelection::Closest => TargetSelection::Closest,
                RawSelection::Area => TargetSelection::Area,
            },
            basic,
            upgrade,
        })
    }
}

impl RawWave {
    fn resolve(self, wave: usize, enemies: &[EnemyStats]) -> Result<WaveSpec, ConfigError> {
        let kind = enemies
            .iter()
            .position(|enemy| enemy.name == self.enemy)
            .and_then(|index| u32::try_from(index).ok())
            .ok_or(ConfigError::UnknownEnemy {
                wave,
                name: self.enemy,
            })?;
        if self.count > MAX_WAVE_SIZE {
            return Err(invalid(
                format!("waves.{wave}.count"),
                "exceeds the largest supported wave",
            ));
        }

        Ok(WaveSpec {
            enemy: EnemyKind::new(kind),
            count: self.count,
        })
    }
}

fn invalid(field: impl Into<String>, reason: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        reason,
    }
}

fn non_negative(field: impl Into<String>, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(invalid(field, "must be a finite, non-negative number"))
    }
}

fn fraction(field: impl Into<String>, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(invalid(field, "must lie in (0, 1]"))
    }
}

fn seconds(field: impl Into<String>, value: f32) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f32(value)
        .map_err(|_| invalid(field, "must be a finite, non-negative number of seconds"))
}

fn optional_seconds(
    field: &str,
    value: Option<f32>,
    fallback: Duration,
) -> Result<Duration, ConfigError> {
    value.map_or(Ok(fallback), |value| seconds(field, value))
}

fn position(field: &str, [x, y, z]: [f32; 3]) -> Result<Position, ConfigError> {
    if x.is_finite() && y.is_finite() && z.is_finite() {
        Ok(Position::new(x, y, z))
    } else {
        Err(invalid(field, "coordinates must be finite"))
    }
}

fn ensure_unique<'a>(
    catalogue: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(invalid(
                format!("{catalogue}.{name}"),
                "names must be unique within a catalogue",
            ));
        }
    }
    Ok(())
}
