use newengine_delays::DelaysConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub frame: FrameConfig,
    #[serde(default)]
    pub delays: DelaysConfig,
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Upper bound for a single frame delta.
    #[serde(default = "default_max_dt_ms")]
    pub max_dt_ms: u32,
    /// Frame pacing for `Engine::run`. 0 = unpaced.
    #[serde(default = "default_target_hz")]
    pub target_hz: u32,
    /// Stop after this many frames. 0 = until exit is requested.
    #[serde(default)]
    pub max_frames: u64,
}

fn default_max_dt_ms() -> u32 { 250 }
fn default_target_hz() -> u32 { 60 }

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_dt_ms: default_max_dt_ms(),
            target_hz: default_target_hz(),
            max_frames: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_settings")]
    pub settings: toml::Value,
}

fn default_enabled() -> bool { true }

fn default_settings() -> toml::Value {
    // Пустая таблица: безопасно для try_into().
    toml::Value::Table(toml::map::Map::new())
}
