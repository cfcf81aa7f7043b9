use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Exit flag shared with the Ctrl-C handler.
#[derive(Clone, Default)]
pub struct ExitSignal {
    flag: Arc<AtomicBool>,
}

impl ExitSignal {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn request_exit(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_exit_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// The process accepts only one handler; a second call returns an error.
    pub fn install_ctrlc_handler(&self) -> anyhow::Result<()> {
        let s = self.clone();
        ctrlc::set_handler(move || s.request_exit())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let a = ExitSignal::new();
        let b = a.clone();
        assert!(!b.is_exit_requested());
        a.request_exit();
        assert!(b.is_exit_requested());
    }
}
