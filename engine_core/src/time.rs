/// Frame clock as seen by modules.
#[derive(Debug, Clone, Default)]
pub struct Time {
    /// Clamped delta of the current frame.
    pub dt_sec: f32,
    /// Accumulated clamped time since start.
    pub t_sec: f64,
    pub frame_index: u64,
}

impl Time {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn advance(&mut self, dt_sec: f32) {
        self.dt_sec = dt_sec;
        self.t_sec += dt_sec as f64;
        self.frame_index += 1;
    }
}
