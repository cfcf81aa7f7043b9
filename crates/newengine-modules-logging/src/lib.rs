use env_logger::{Builder, WriteStyle};
use log::LevelFilter;
use engine_core::{frame::FrameContext, module::Module};

use std::io::Write;

#[derive(Debug, Clone)]
pub struct ConsoleLoggerConfig {
    pub level: LevelFilter,
    pub colors: bool,
    pub include_module: bool,
}

impl ConsoleLoggerConfig {
    pub fn from_env() -> Self {
        let level = std::env::var("NEWENGINE_LOG")
            .ok()
            .and_then(|v| v.parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::Info);
        let colors = std::env::var("NEWENGINE_LOG_COLORS")
            .ok()
            .map(|v| v != "0")
            .unwrap_or(true);
        let include_module = std::env::var("NEWENGINE_LOG_MODULE")
            .ok()
            .map(|v| v != "0")
            .unwrap_or(true);

        Self {
            level,
            colors,
            include_module,
        }
    }
}

impl Default for ConsoleLoggerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Install the console backend for the `log` facade.
///
/// Fails if a logger is already installed in this process.
pub fn init(config: &ConsoleLoggerConfig) -> Result<(), log::SetLoggerError> {
    let mut builder = Builder::new();
    builder.filter_level(config.level);
    builder.write_style(if config.colors {
        WriteStyle::Auto
    } else {
        WriteStyle::Never
    });

    let include_module = config.include_module;
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());

        if include_module {
            writeln!(
                buf,
                "[{style}{:<5}{style:#}] {:<25} {}",
                record.level(),
                record.target(),
                record.args()
            )
        } else {
            writeln!(buf, "[{style}{:<5}{style:#}] {}", record.level(), record.args())
        }
    });

    builder.try_init()
}

/// Installs the console logger when the engine registers its modules.
/// Add it first so that later modules' boot messages are captured.
pub struct ConsoleLoggerModule {
    config: ConsoleLoggerConfig,
    initialized: bool,
}

impl ConsoleLoggerModule {
    #[inline]
    pub fn new(config: ConsoleLoggerConfig) -> Self {
        Self {
            config,
            initialized: false,
        }
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Module for ConsoleLoggerModule {
    fn id(&self) -> &'static str {
        "console-logger"
    }

    fn on_register(&mut self, ctx: &mut FrameContext<'_>) {
        if self.initialized {
            return;
        }

        match init(&self.config) {
            Ok(()) => self.initialized = true,
            // Another backend owns the facade; keep using it.
            Err(e) => ctx.log.warn(format!("console logger not installed: {e}")),
        }
    }
}
