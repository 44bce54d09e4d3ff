use super::*;
use crossbeam_channel::unbounded;
use tracing::info;

use crate::orchestrator::execute_step;

impl App {
    pub(super) fn submit_current_line(&mut self) {
        if self.input.trim().is_empty() {
            return;
        }
        // Input surface stays closed until the running command settles.
        if self.is_busy() {
            return;
        }

        let line = self.input.clone();
        self.history.push(line.clone());
        self.history_pos = None;
        self.clear_input_buffer();

        let step = self.interpreter.submit(&line, &mut self.transcript);
        self.last_status = self.interpreter.phase().label();
        if let Some(step) = step {
            self.run_started_at = Some(Instant::now());
            self.start_step(step);
        }
    }

    pub(super) fn start_step(&mut self, step: Step) {
        info!(username = step.username(), step = ?step, "starting remote step");
        let services = self.services.clone();
        let (tx, rx) = unbounded::<WorkerEvent>();
        std::thread::spawn(move || execute_step(&services, step, tx));
        self.rx = Some(rx);
    }
}
