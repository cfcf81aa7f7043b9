use std::{
    collections::HashMap,
    fs,
    path::Path,
    rc::Rc,
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Result};
use newengine_delays::{global, DelayKindId, DelayScheduler};

use crate::{
    config::{EngineConfig, ModuleConfig},
    frame::{FrameConstitution, FrameContext},
    log::Logger,
    module::Module,
    phase::FramePhase,
    schedule::FrameSchedule,
    signals::ExitSignal,
    time::Time,
};

pub type ModuleFactory = fn(&toml::Value) -> Result<Box<dyn Module>>;

// Disjoint field borrows for the module hooks.
macro_rules! frame_ctx {
    ($engine:ident) => {
        FrameContext {
            log: &$engine.log,
            time: &mut $engine.time,
            delays: &$engine.delays,
            context_change_requested: &mut $engine.context_change_requested,
            exit_requested: &mut $engine.exit_requested,
        }
    };
}

/// Headless кадровый цикл.
///
/// Владеет планировщиком отложенных вызовов всё время жизни процесса:
/// продвигает его раз в кадр и сбрасывает непостоянные вызовы при смене контекста.
pub struct Engine {
    cfg: EngineConfig,
    log: Logger,
    schedule: FrameSchedule,
    factories: HashMap<String, ModuleFactory>,

    delays: Rc<DelayScheduler>,
    constitution: FrameConstitution,
    time: Time,
    exit_signal: ExitSignal,

    exit_requested: bool,
    context_change_requested: bool,
    started: bool,
    shutdown_done: bool,
}

impl Engine {
    /// Builds the delay pools from `cfg.delays` and installs the scheduler as
    /// the current one for this thread.
    pub fn new(cfg: EngineConfig) -> Self {
        let log = Logger::new("Engine");

        let delays = Rc::new(DelayScheduler::new(cfg.delays.clone()));
        if global::install(delays.clone()).is_some() {
            log.debug("replaced previously installed delay scheduler");
        }

        let target_hz = cfg.frame.target_hz;
        let constitution = FrameConstitution {
            max_dt_sec: (cfg.frame.max_dt_ms as f32 / 1000.0).max(0.001),
            target_frame_sec: if target_hz == 0 { 0.0 } else { 1.0 / target_hz as f32 },
            max_frames: cfg.frame.max_frames,
        };

        Self {
            cfg,
            log,
            schedule: FrameSchedule::new(),
            factories: HashMap::new(),

            delays,
            constitution,
            time: Time::new(),
            exit_signal: ExitSignal::new(),

            exit_requested: false,
            context_change_requested: false,
            started: false,
            shutdown_done: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    #[inline]
    pub fn delays(&self) -> &Rc<DelayScheduler> {
        &self.delays
    }

    #[inline]
    pub fn time(&self) -> &Time {
        &self.time
    }

    #[inline]
    pub fn exit_signal(&self) -> ExitSignal {
        self.exit_signal.clone()
    }

    #[inline]
    pub fn module_count(&self) -> usize {
        self.schedule.len()
    }

    /// Dev/Tests/Bootstrap: добавить модуль напрямую (без TOML).
    pub fn add_module<M: Module + 'static>(&mut self, m: M) {
        self.schedule.add_boxed(Box::new(m));
    }

    pub fn register_module_factory(&mut self, id: &str, f: ModuleFactory) {
        self.factories.insert(id.to_string(), f);
    }

    /// Сборка модулей из конфигурации.
    /// Модули, добавленные вручную, остаются первыми.
    pub fn build_schedule_from_config(&mut self) -> Result<()> {
        for m in self.cfg.modules.iter() {
            if !m.enabled {
                self.log.info(format!("module '{}' disabled by config", m.id));
                continue;
            }
            let boxed = self.instantiate_module(m)?;
            self.log.info(format!("module '{}' loaded", m.id));
            self.schedule.add_boxed(boxed);
        }
        Ok(())
    }

    fn instantiate_module(&self, m: &ModuleConfig) -> Result<Box<dyn Module>> {
        let Some(f) = self.factories.get(&m.id) else {
            return Err(anyhow!("module factory not registered for id='{}'", m.id));
        };
        f(&m.settings)
    }

    pub fn load_config_toml(path: impl AsRef<Path>) -> Result<EngineConfig> {
        let text = fs::read_to_string(path)?;
        let cfg: EngineConfig = toml::from_str(&text)?;
        Ok(cfg)
    }

    /// Register and start all modules. Called by the first `step` if needed.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        let slots: usize = DelayKindId::ALL.iter().map(|&k| self.delays.capacity(k)).sum();
        self.log.info(format!(
            "boot: {} modules, {} delay slots",
            self.schedule.len(),
            slots
        ));

        let mut ctx = frame_ctx!(self);
        self.schedule.on_register(&mut ctx);
        self.schedule.on_start(&mut ctx);
    }

    /// Ask for a context change at the end of the current (or next) frame.
    #[inline]
    pub fn request_context_change(&mut self) {
        self.context_change_requested = true;
    }

    /// Replace the ambient context now: non-persistent delays are dropped,
    /// then modules are notified. Returns how many delays were dropped.
    pub fn change_context(&mut self) -> usize {
        self.context_change_requested = false;

        let dropped = self.delays.on_context_changed();
        self.log.info(format!("context changed ({dropped} delays dropped)"));

        let mut ctx = frame_ctx!(self);
        self.schedule.on_context_changed(&mut ctx);
        dropped
    }

    /// Run one frame with the given wall-clock delta.
    /// Returns `false` once the engine wants to exit.
    pub fn step(&mut self, dt: Duration) -> bool {
        self.start();

        if self.shutdown_done {
            return false;
        }
        if self.exit_signal.is_exit_requested() {
            self.exit_requested = true;
        }
        if self.exit_requested {
            return false;
        }

        let dt_sec = dt.as_secs_f32().min(self.constitution.max_dt_sec);
        self.time.advance(dt_sec);

        let mut ctx = frame_ctx!(self);

        self.schedule.run_phase(FramePhase::BeginFrame, &mut ctx);
        self.schedule.run_phase(FramePhase::Input, &mut ctx);
        self.schedule.run_phase(FramePhase::Update, &mut ctx);

        ctx.delays.advance(dt_sec);

        self.schedule.run_phase(FramePhase::LateUpdate, &mut ctx);
        self.schedule.run_phase(FramePhase::EndFrame, &mut ctx);

        if self.context_change_requested {
            self.change_context();
        }

        let max = self.constitution.max_frames;
        if max > 0 && self.time.frame_index >= max {
            self.log.debug(format!("frame limit {max} reached"));
            self.exit_requested = true;
        }

        !self.exit_requested
    }

    pub fn run(mut self) -> Result<()> {
        self.build_schedule_from_config()?;

        if let Err(e) = self.exit_signal.install_ctrlc_handler() {
            self.log.warn(format!("ctrl-c handler not installed: {e}"));
        }

        self.start();
        self.log.info("first frame");

        let target = Duration::from_secs_f32(self.constitution.target_frame_sec);
        let mut last = Instant::now();

        loop {
            let frame_start = Instant::now();
            let dt = frame_start.duration_since(last);
            last = frame_start;

            if !self.step(dt) {
                break;
            }

            let spent = frame_start.elapsed();
            if spent < target {
                thread::sleep(target - spent);
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Shut modules down in reverse order and release every pending delay.
    ///
    /// Modules are only notified if the engine was started; the delays and
    /// the global binding are released either way.
    pub fn shutdown(&mut self) {
        if self.shutdown_done {
            return;
        }
        self.shutdown_done = true;

        if self.started {
            let mut ctx = frame_ctx!(self);
            self.schedule.on_shutdown(&mut ctx);
        }

        self.release_delays();
        self.log.info("shutdown");
    }

    fn release_delays(&mut self) {
        self.delays.shutdown();

        // Another engine may have been installed since; leave its binding alone.
        if global::current().is_some_and(|c| Rc::ptr_eq(&c, &self.delays)) {
            global::uninstall();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
