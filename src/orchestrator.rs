use crossbeam_channel::Sender;
use tracing::{debug, warn};

use crate::app::WorkerEvent;
use crate::interpreter::Step;
use crate::services::Services;

/// Runs one remote step to completion on the calling (worker) thread and reports
/// the outcome back to the UI loop.
pub(crate) fn execute_step(services: &Services, step: Step, tx: Sender<WorkerEvent>) {
    let event = match &step {
        Step::FetchProfile(username) => {
            WorkerEvent::Profile(services.profiles.fetch_profile(username))
        }
        Step::GenerateHistory(username) => {
            WorkerEvent::History(services.histories.generate_history(username))
        }
    };
    debug!(step = ?step, "remote step finished");
    if tx.send(event).is_err() {
        // UI loop already gone; nothing left to report to.
        warn!(step = ?step, "dropping step result, receiver closed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crossbeam_channel::unbounded;

    use super::*;
    use crate::services::history::{GenerateError, LoginRecord};
    use crate::services::profile::{FetchError, Profile};
    use crate::services::{HistorySource, ProfileSource};

    struct FixedProfile;

    impl ProfileSource for FixedProfile {
        fn fetch_profile(&self, username: &str) -> Result<Profile, FetchError> {
            Ok(Profile {
                username: username.to_string(),
                ..Profile::default()
            })
        }
    }

    struct FailingHistory;

    impl HistorySource for FailingHistory {
        fn generate_history(&self, _username: &str) -> Result<Vec<LoginRecord>, GenerateError> {
            Err(GenerateError)
        }
    }

    fn services() -> Services {
        Services {
            profiles: Arc::new(FixedProfile),
            histories: Arc::new(FailingHistory),
        }
    }

    #[test]
    fn profile_step_reports_profile_event() {
        let (tx, rx) = unbounded();
        execute_step(&services(), Step::FetchProfile("nasa".to_string()), tx);
        match rx.recv().expect("event") {
            WorkerEvent::Profile(Ok(profile)) => assert_eq!(profile.username, "nasa"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn history_step_reports_history_event() {
        let (tx, rx) = unbounded();
        execute_step(&services(), Step::GenerateHistory("nasa".to_string()), tx);
        assert!(matches!(
            rx.recv().expect("event"),
            WorkerEvent::History(Err(GenerateError))
        ));
    }

    #[test]
    fn closed_receiver_is_tolerated() {
        let (tx, rx) = unbounded();
        drop(rx);
        execute_step(&services(), Step::FetchProfile("nasa".to_string()), tx);
    }
}
