use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fs,
    path::Path,
    time::Duration,
};
use thiserror::Error;

pub const DEFAULT_TICKET_PRICE: u64 = 5;
pub const DEFAULT_WIN_THRESHOLD: u64 = 350;
pub const DEFAULT_MAX_PURCHASE: u32 = 10;
pub const DEFAULT_TICK_PERIOD_MS: u64 = 100;
pub const DEFAULT_SPIN_DURATION_MS: u64 = 3000;
pub const DEFAULT_SETTLE_HOLD_MS: u64 = 500;
pub const DEFAULT_LOSS_MESSAGE: &str = "Better luck next time!";
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Congrats!";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Price-units charged per spin and added to the cumulative spend.
    pub ticket_price: u64,
    /// Cumulative spend at which the next spin is forced to win.
    pub win_threshold: u64,
    pub max_purchase: u32,
    pub tick_period_ms: u64,
    pub spin_duration_ms: u64,
    pub settle_hold_ms: u64,
    pub loss_message: String,
    pub fallback_message: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            ticket_price: DEFAULT_TICKET_PRICE,
            win_threshold: DEFAULT_WIN_THRESHOLD,
            max_purchase: DEFAULT_MAX_PURCHASE,
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            spin_duration_ms: DEFAULT_SPIN_DURATION_MS,
            settle_hold_ms: DEFAULT_SETTLE_HOLD_MS,
            loss_message: DEFAULT_LOSS_MESSAGE.to_string(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path.as_ref())?;
        let config: GameConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticket_price == 0 {
            return Err(ConfigError::Invalid("ticket_price must be positive"));
        }
        if self.max_purchase == 0 {
            return Err(ConfigError::Invalid("max_purchase must be positive"));
        }
        if self.tick_period_ms == 0 {
            return Err(ConfigError::Invalid("tick_period_ms must be positive"));
        }
        if self.spin_duration_ms < self.tick_period_ms {
            return Err(ConfigError::Invalid(
                "spin_duration_ms must cover at least one tick",
            ));
        }
        if self.fallback_message.trim().is_empty() {
            return Err(ConfigError::Invalid("fallback_message must not be empty"));
        }
        Ok(())
    }

    pub fn animation(&self) -> AnimationConfig {
        AnimationConfig {
            tick_period: Duration::from_millis(self.tick_period_ms),
            total_duration: Duration::from_millis(self.spin_duration_ms),
            settle_hold: Duration::from_millis(self.settle_hold_ms),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AnimationConfig {
    pub tick_period: Duration,
    pub total_duration: Duration,
    pub settle_hold: Duration,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        GameConfig::default().animation()
    }
}
