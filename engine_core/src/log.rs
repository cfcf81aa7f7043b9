use ::log::Level;

/// Tagged logger handed to modules through `FrameContext`.
///
/// Records go through the `log` facade with the tag as target, so whatever
/// backend the app installs (see `newengine-modules-logging`) decides the format.
#[derive(Clone, Debug)]
pub struct Logger {
    tag: &'static str,
}

impl Logger {
    pub fn new(tag: &'static str) -> Self {
        Self { tag }
    }

    #[inline]
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    #[inline]
    pub fn info(&self, msg: impl AsRef<str>) {
        self.print(Level::Info, msg.as_ref());
    }

    #[inline]
    pub fn debug(&self, msg: impl AsRef<str>) {
        self.print(Level::Debug, msg.as_ref());
    }

    #[inline]
    pub fn warn(&self, msg: impl AsRef<str>) {
        self.print(Level::Warn, msg.as_ref());
    }

    #[inline]
    pub fn error(&self, msg: impl AsRef<str>) {
        self.print(Level::Error, msg.as_ref());
    }

    fn print(&self, lvl: Level, msg: &str) {
        ::log::log!(target: self.tag, lvl, "{msg}");
    }
}
