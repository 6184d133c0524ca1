use crate::algorithms::{PassObserver, Pattern};
use indicatif::{HumanBytes, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::Path;
use std::time::{Duration, Instant};

const TEMPLATE: &str =
    "{prefix:>12} [{elapsed_precise}] [{bar:40.green/white}] {bytes}/{total_bytes} ({bytes_per_sec}, eta {eta}) {msg}";

/// Terminal progress for overwrite passes, drawn on stderr
pub struct PassProgress {
    bar: ProgressBar,
    started: Instant,
    pass_bytes: u64,
    passes_done: u32,
}

impl Default for PassProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl PassProgress {
    pub fn new() -> Self {
        let target = if cfg!(feature = "progress-bars") {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        Self::with_draw_target(target)
    }

    /// A bar that tracks progress but never draws
    pub fn hidden() -> Self {
        Self::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        let bar = ProgressBar::with_draw_target(Some(0), target);
        bar.set_style(style);
        Self {
            bar,
            started: Instant::now(),
            pass_bytes: 0,
            passes_done: 0,
        }
    }

    pub fn passes_done(&self) -> u32 {
        self.passes_done
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Position within the current pass
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }

    pub fn abandon(&self, message: impl Into<String>) {
        self.bar.abandon_with_message(message.into());
    }
}

impl PassObserver for PassProgress {
    fn pass_started(
        &mut self,
        target: &Path,
        pass: u32,
        total: u32,
        pattern: Pattern,
        bytes: u64,
    ) {
        self.pass_bytes = bytes;
        self.bar.reset();
        self.bar.set_length(bytes);
        self.bar.set_position(0);
        self.bar.set_prefix(format!("pass {}/{}", pass, total));
        self.bar.set_message(format!("{} -> {}", pattern, target.display()));
    }

    fn bytes_written(&mut self, written: u64, _total: u64) {
        self.bar.set_position(written);
    }

    fn pass_completed(&mut self, target: &Path, pass: u32, total: u32) {
        self.passes_done += 1;
        self.bar.println(format!(
            "  pass {}/{} synced: {} of {}",
            pass,
            total,
            HumanBytes(self.pass_bytes),
            target.display()
        ));
    }
}
