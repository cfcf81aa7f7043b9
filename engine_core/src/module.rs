use crate::{frame::FrameContext, phase::FramePhase};

/// Модуль движка.
/// Важно: ядро не знает конкретных модулей.
/// Модуль добавляется напрямую или создаётся фабрикой по id из конфига.
pub trait Module {
    fn id(&self) -> &'static str;

    fn on_register(&mut self, _ctx: &mut FrameContext<'_>) {}
    fn on_start(&mut self, _ctx: &mut FrameContext<'_>) {}
    fn on_phase(&mut self, _phase: FramePhase, _ctx: &mut FrameContext<'_>) {}

    /// Сцена/мир заменены. Непостоянные отложенные вызовы к этому моменту уже сброшены.
    fn on_context_changed(&mut self, _ctx: &mut FrameContext<'_>) {}

    fn on_shutdown(&mut self, _ctx: &mut FrameContext<'_>) {}
}
