use std::{cell::Cell, rc::Rc};

use anyhow::Result;
use engine_core::{frame::FrameContext, module::Module, phase::FramePhase};
use log::{info, warn};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct UsageSettings {
    /// Frame at which the scene is "reloaded". 0 = never.
    #[serde(default = "default_reload_at_frame")]
    pub reload_at_frame: u64,
    /// Extra next-frame delays scheduled at once to show pool exhaustion.
    #[serde(default)]
    pub burst: u32,
}

fn default_reload_at_frame() -> u64 { 120 }

impl Default for UsageSettings {
    fn default() -> Self {
        Self { reload_at_frame: default_reload_at_frame(), burst: 0 }
    }
}

/// Scene-scoped state the delays act on.
#[derive(Default)]
struct Scene {
    player_x: Cell<f32>,
    target_x: Cell<f32>,
}

/// Shows every delay kind, the persist flag, a scene reload and an overflow.
pub struct UsageExample {
    settings: UsageSettings,
    scene: Rc<Scene>,
    volume: Rc<Cell<f32>>,
    dt: Rc<Cell<f32>>,
}

impl UsageExample {
    pub fn new(settings: UsageSettings) -> Self {
        Self {
            settings,
            scene: Rc::new(Scene::default()),
            volume: Rc::new(Cell::new(1.0)),
            dt: Rc::new(Cell::new(0.0)),
        }
    }

    pub fn factory(settings: &toml::Value) -> Result<Box<dyn Module>> {
        let settings: UsageSettings = settings.clone().try_into()?;
        Ok(Box::new(Self::new(settings)))
    }

    fn schedule_scene(&self, ctx: &mut FrameContext<'_>) {
        let delays = ctx.delays;

        // A full pool is already reported by the scheduler; the demo carries on.
        delays.next_frame(|| info!("initialized something in the second frame")).ok();
        delays
            .run_in_next_frame(|| info!("initialized something in the 5th frame"), 5, false)
            .ok();

        let scene = self.scene.clone();
        delays
            .run_for_seconds(
                move || {
                    let dist = (scene.target_x.get() - scene.player_x.get()).abs();
                    if dist <= 1.0 {
                        info!("within 1 meter");
                    }
                },
                10.0,
                false,
            )
            .ok();

        let frames = Rc::new(Cell::new(0u32));
        delays.run_for_frames(move || frames.set(frames.get() + 1), 30, false).ok();

        for i in 0..self.settings.burst {
            if delays.next_frame(move || info!("burst delay {i}")).is_err() {
                warn!("burst stopped at {i}");
                break;
            }
        }
    }
}

impl Module for UsageExample {
    fn id(&self) -> &'static str {
        "usage-example"
    }

    fn on_start(&mut self, ctx: &mut FrameContext<'_>) {
        self.scene.target_x.set(3.0);
        self.schedule_scene(ctx);

        // Survives the reload: it only captures process-wide state.
        let (volume, dt) = (self.volume.clone(), self.dt.clone());
        ctx.delays
            .run_for_seconds(
                move || {
                    let v = (volume.get() - dt.get()).max(0.0);
                    volume.set(v);
                },
                1.0,
                true,
            )
            .ok();

        ctx.delays.run_in_seconds(|| info!("two seconds in"), 2.0, true).ok();
    }

    fn on_phase(&mut self, phase: FramePhase, ctx: &mut FrameContext<'_>) {
        match phase {
            FramePhase::BeginFrame => self.dt.set(ctx.time.dt_sec),
            FramePhase::Update => {
                let x = self.scene.player_x.get() + ctx.time.dt_sec;
                self.scene.player_x.set(x);

                let reload = self.settings.reload_at_frame;
                if reload != 0 && ctx.time.frame_index == reload {
                    ctx.request_context_change();
                }
            }
            _ => {}
        }
    }

    fn on_context_changed(&mut self, ctx: &mut FrameContext<'_>) {
        self.scene = Rc::new(Scene::default());
        self.scene.target_x.set(-3.0);
        ctx.log.info(format!(
            "scene reloaded, volume={:.2}, {} delays still pending",
            self.volume.get(),
            ctx.delays.total_active()
        ));
        self.schedule_scene(ctx);
    }

    fn on_shutdown(&mut self, ctx: &mut FrameContext<'_>) {
        ctx.log.info(format!("final volume={:.2}", self.volume.get()));
    }
}
