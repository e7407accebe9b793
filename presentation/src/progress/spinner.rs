//! Spinner shown while waiting on the model or a function.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// A single reusable spinner line.
///
/// Starting a new message replaces the current one; `clear` removes the
/// line so streamed text can take its place.
pub struct Spinner {
    bar: Mutex<Option<ProgressBar>>,
    enabled: bool,
}

impl Spinner {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            enabled: true,
        }
    }

    /// A spinner that never draws (quiet or non-interactive output).
    pub fn hidden() -> Self {
        Self {
            bar: Mutex::new(None),
            enabled: false,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    pub fn start(&self, message: impl Into<String>) {
        if !self.enabled {
            return;
        }
        let Ok(mut slot) = self.bar.lock() else {
            return;
        };
        if let Some(previous) = slot.take() {
            previous.finish_and_clear();
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::style());
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        *slot = Some(bar);
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.bar.lock()
            && let Some(bar) = slot.take()
        {
            bar.finish_and_clear();
        }
    }

    pub fn is_active(&self) -> bool {
        self.bar.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_spinner_never_activates() {
        let spinner = Spinner::hidden();
        spinner.start("Thinking...");
        assert!(!spinner.is_active());
    }

    #[test]
    fn test_start_then_clear() {
        let spinner = Spinner::new();
        spinner.start("Thinking...");
        assert!(spinner.is_active());
        spinner.start("Running get_balance...");
        assert!(spinner.is_active());
        spinner.clear();
        assert!(!spinner.is_active());
    }
}
