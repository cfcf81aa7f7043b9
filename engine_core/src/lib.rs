//! NEOCORE2 Engine Core (headless)
//!
//! Публичный фасад движка: кадровый цикл, жизненный цикл модулей, отложенные вызовы.
//! Всё, что используется приложениями и играми, экспортируется здесь.

pub mod engine;
pub mod config;
pub mod frame;
pub mod module;
pub mod phase;
pub mod schedule;
pub mod time;
pub mod signals;
pub mod log;

pub use engine::Engine;
pub use config::EngineConfig;

pub use newengine_delays as delays;
