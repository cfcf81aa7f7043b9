mod usage;

use engine_core::{config::FrameConfig, Engine, EngineConfig};
use newengine_modules_logging::{ConsoleLoggerConfig, ConsoleLoggerModule};

use usage::{UsageExample, UsageSettings};

fn main() -> anyhow::Result<()> {
    let cfg = match std::env::args().nth(1) {
        Some(path) => Engine::load_config_toml(path)?,
        None => EngineConfig {
            frame: FrameConfig { max_frames: 300, ..FrameConfig::default() },
            ..EngineConfig::default()
        },
    };

    let mut engine = Engine::new(cfg);
    engine.add_module(ConsoleLoggerModule::new(ConsoleLoggerConfig::from_env()));
    engine.register_module_factory("usage-example", UsageExample::factory);

    if engine.config().modules.is_empty() {
        engine.add_module(UsageExample::new(UsageSettings::default()));
    }

    engine.run()
}
