//! Progress rendering behind the library's sink trait.

use indicatif::{ProgressBar, ProgressStyle};

use onco_core::ProgressSink;

/// An indicatif bar driven by `(message, percent)` events.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{bar:32.cyan/blue} {pos:>3}% {msg}")
                .expect("valid progress template"),
        );
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgress {
    fn emit(&self, message: &str, percent: u8) {
        self.bar.set_position(u64::from(percent.min(100)));
        self.bar.set_message(message.to_string());
    }
}
