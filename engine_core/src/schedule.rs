use crate::{frame::FrameContext, module::Module, phase::FramePhase};

/// Ordered module list. Hooks run in insertion order, shutdown in reverse.
pub struct FrameSchedule {
    modules: Vec<Box<dyn Module>>,
}

impl FrameSchedule {
    pub fn new() -> Self {
        Self { modules: Vec::new() }
    }

    pub fn add_boxed(&mut self, m: Box<dyn Module>) {
        self.modules.push(m);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn on_register(&mut self, ctx: &mut FrameContext<'_>) {
        for m in self.modules.iter_mut() {
            m.on_register(ctx);
        }
    }

    pub fn on_start(&mut self, ctx: &mut FrameContext<'_>) {
        for m in self.modules.iter_mut() {
            m.on_start(ctx);
        }
    }

    pub fn on_context_changed(&mut self, ctx: &mut FrameContext<'_>) {
        for m in self.modules.iter_mut() {
            m.on_context_changed(ctx);
        }
    }

    pub fn on_shutdown(&mut self, ctx: &mut FrameContext<'_>) {
        for m in self.modules.iter_mut().rev() {
            m.on_shutdown(ctx);
        }
    }

    pub fn run_phase(&mut self, phase: FramePhase, ctx: &mut FrameContext<'_>) {
        for m in self.modules.iter_mut() {
            m.on_phase(phase, ctx);
        }
    }
}

impl Default for FrameSchedule {
    fn default() -> Self {
        Self::new()
    }
}
