use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use anyhow::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dispatcher: DispatcherConfig,
    pub executor: ExecutorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStrategyKind {
    NearestVehicle,
    OrderAge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub assignment_strategy: AssignmentStrategyKind,
    pub recharge_idle_vehicles: bool,
    /// Idle vehicles below this energy level are sent to a charging location.
    pub energy_recharge_threshold: u8,
    /// Vehicles at or below this energy level get no transport orders.
    pub energy_critical_threshold: u8,
    pub park_idle_vehicles: bool,
    pub prioritized_parking: bool,
    pub repark_contested_positions: bool,
    pub repark_to_higher_priority_positions: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub fleet_id: String,
    pub channel_capacity: usize,
    /// Periodic dispatch trigger; 0 disables it.
    pub dispatch_interval_ms: u64,
    /// Run a dispatch cycle after every state-changing message.
    pub dispatch_on_change: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: Option<String>,
    pub console: bool,
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Defaults, then the TOML file if it exists, then `FLEET__SECTION__KEY`
    /// environment variables.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let defaults = config::Config::try_from(&Config::default())?;
        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("FLEET")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

impl ExecutorConfig {
    pub fn dispatch_interval(&self) -> Option<Duration> {
        match self.dispatch_interval_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dispatcher: DispatcherConfig::default(),
            executor: ExecutorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            assignment_strategy: AssignmentStrategyKind::NearestVehicle,
            recharge_idle_vehicles: true,
            energy_recharge_threshold: 30,
            energy_critical_threshold: 10,
            park_idle_vehicles: true,
            prioritized_parking: true,
            repark_contested_positions: true,
            repark_to_higher_priority_positions: false,
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            fleet_id: "fleet".to_string(),
            channel_capacity: 256,
            dispatch_interval_ms: 5000,
            dispatch_on_change: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: Some("fleet-dispatch.log".to_string()),
            console: true,
        }
    }
}
