//! Terminal progress for provisioning runs.

use indicatif::ProgressBar;
use provision::{ProgressCallback, Step, StepOutcome};
use std::time::Duration;

use crate::ui;

/// Prints one line per completed step, with a spinner while a step is in
/// flight. Failures print nothing here - the caller reports the single
/// error line.
pub struct StepPrinter {
    silent: bool,
    total: usize,
    done: usize,
    spinner: Option<ProgressBar>,
}

impl StepPrinter {
    pub fn new(silent: bool) -> Self {
        Self {
            silent,
            total: Step::ORDER.len(),
            done: 0,
            spinner: None,
        }
    }
}

impl ProgressCallback for StepPrinter {
    fn on_step_start(&mut self, step: Step) {
        if self.silent {
            return;
        }
        let bar = ProgressBar::new_spinner();
        bar.set_message(format!("creating {step}"));
        bar.enable_steady_tick(Duration::from_millis(120));
        self.spinner = Some(bar);
    }

    fn on_step_complete(&mut self, step: Step, outcome: &StepOutcome) {
        self.done += 1;
        if let Some(bar) = self.spinner.take() {
            bar.finish_and_clear();
        }
        if self.silent {
            return;
        }
        if let Some(handle) = &outcome.handle {
            ui::step_ok(self.done, self.total, &format!("{step}: {handle}"));
        }
    }
}
