//! Human-facing terminal output.

/// Prints progress to stdout unless silenced. Warnings and errors go to
/// stderr and are always shown.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    silent: bool,
}

impl Reporter {
    pub fn new(silent: bool) -> Self {
        Self { silent }
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn info(&self, message: impl AsRef<str>) {
        if !self.silent {
            println!("{}", message.as_ref());
        }
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        eprintln!("\x1b[33m⚠ {}\x1b[0m", message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        eprintln!("Error: {}", message.as_ref());
    }
}
