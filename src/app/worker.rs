use super::*;
use crossbeam_channel::TryRecvError;

impl App {
    /// Feeds a finished worker result into the interpreter. Returns true when state changed.
    pub(super) fn poll_worker(&mut self) -> bool {
        let Some(rx) = self.rx.clone() else {
            return false;
        };
        match rx.try_recv() {
            Ok(WorkerEvent::Profile(result)) => {
                self.rx = None;
                if let Some(step) = self
                    .interpreter
                    .profile_fetched(result, &mut self.transcript)
                {
                    self.start_step(step);
                }
            }
            Ok(WorkerEvent::History(result)) => {
                self.rx = None;
                self.interpreter
                    .history_generated(result, &mut self.transcript);
            }
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => {
                self.rx = None;
                self.interpreter.abort(&mut self.transcript);
            }
        }
        if !self.is_busy() {
            self.finish_run();
        }
        self.last_status = self.interpreter.phase().label();
        true
    }
}
