use std::rc::Rc;

use newengine_delays::DelayScheduler;

use crate::{log::Logger, time::Time};

#[derive(Debug, Clone)]
pub struct FrameConstitution {
    pub max_dt_sec: f32,
    /// 0 = run unpaced.
    pub target_frame_sec: f32,
    /// 0 = unlimited.
    pub max_frames: u64,
}

impl Default for FrameConstitution {
    fn default() -> Self {
        Self {
            max_dt_sec: 0.25,
            target_frame_sec: 1.0 / 60.0,
            max_frames: 0,
        }
    }
}

/// FrameContext: всё, что модуль может трогать внутри хука.
pub struct FrameContext<'a> {
    pub log: &'a Logger,
    pub time: &'a mut Time,
    /// Shared so callbacks can hold on to it and chain further delays.
    pub delays: &'a Rc<DelayScheduler>,
    pub context_change_requested: &'a mut bool,
    pub exit_requested: &'a mut bool,
}

impl FrameContext<'_> {
    /// Replace the current context at the end of this frame.
    #[inline]
    pub fn request_context_change(&mut self) {
        *self.context_change_requested = true;
    }

    #[inline]
    pub fn request_exit(&mut self) {
        *self.exit_requested = true;
    }
}
