use thiserror::Error;
use tracing::{info, warn};

use crate::services::history::{GenerateError, LoginRecord};
use crate::services::profile::{FetchError, Profile};
use crate::transcript::{DataBlock, EntryPayload, Transcript};

const CHECK_COMMAND: &str = "/check";
pub(crate) const GENERATING_MESSAGE: &str =
    "Generating simulated login history (this may take a moment)...";
pub(crate) const WORKER_LOST_MESSAGE: &str = "The background task stopped unexpectedly.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Check { username: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("Command not found: {0}. Use '/check @{{username}}'.")]
pub(crate) struct UnknownCommand(pub(crate) String);

/// Accepts exactly `/check @<username>`; the username is not validated.
pub(crate) fn parse_command(line: &str) -> Result<Command, UnknownCommand> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [CHECK_COMMAND, target] => match target.strip_prefix('@') {
            Some(username) => Ok(Command::Check {
                username: username.to_string(),
            }),
            None => Err(UnknownCommand(line.to_string())),
        },
        _ => Err(UnknownCommand(line.to_string())),
    }
}

/// Remote call the caller must run next and report back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    FetchProfile(String),
    GenerateHistory(String),
}

impl Step {
    pub(crate) fn username(&self) -> &str {
        match self {
            Step::FetchProfile(username) | Step::GenerateHistory(username) => username,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum Phase {
    #[default]
    Idle,
    FetchingProfile {
        username: String,
    },
    FetchingHistory {
        username: String,
    },
    Done,
    Failed,
}

impl Phase {
    pub(crate) fn label(&self) -> String {
        match self {
            Phase::Idle => "ready".to_string(),
            Phase::FetchingProfile { username } => format!("fetching profile @{username}"),
            Phase::FetchingHistory { username } => format!("generating history @{username}"),
            Phase::Done => "done".to_string(),
            Phase::Failed => "error".to_string(),
        }
    }
}

/// Drives one `/check` run at a time. Each method appends the entries for the
/// transition it performs and returns the next remote call, if any.
#[derive(Debug, Default)]
pub(crate) struct Interpreter {
    phase: Phase,
}

impl Interpreter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn phase(&self) -> &Phase {
        &self.phase
    }

    pub(crate) fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            Phase::FetchingProfile { .. } | Phase::FetchingHistory { .. }
        )
    }

    pub(crate) fn submit(&mut self, line: &str, transcript: &mut Transcript) -> Option<Step> {
        if self.is_busy() {
            warn!(line, "input ignored while a command is running");
            return None;
        }
        transcript.append(EntryPayload::Command(line.to_string()));
        match parse_command(line) {
            Ok(Command::Check { username }) => {
                info!(username = %username, "check command accepted");
                transcript.append(EntryPayload::Info(format!(
                    "Fetching data for @{username}..."
                )));
                self.phase = Phase::FetchingProfile {
                    username: username.clone(),
                };
                Some(Step::FetchProfile(username))
            }
            Err(err) => {
                info!(line, "unknown command");
                transcript.append(EntryPayload::Error(err.to_string()));
                self.phase = Phase::Failed;
                None
            }
        }
    }

    pub(crate) fn profile_fetched(
        &mut self,
        result: Result<Profile, FetchError>,
        transcript: &mut Transcript,
    ) -> Option<Step> {
        let Phase::FetchingProfile { username } = &self.phase else {
            warn!(phase = ?self.phase, "dropping profile result outside profile phase");
            return None;
        };
        let username = username.clone();
        match result {
            Ok(profile) => {
                transcript.append(EntryPayload::Component(DataBlock::Profile(profile)));
                transcript.append(EntryPayload::Info(GENERATING_MESSAGE.to_string()));
                self.phase = Phase::FetchingHistory {
                    username: username.clone(),
                };
                Some(Step::GenerateHistory(username))
            }
            Err(err) => {
                warn!(username = %username, error = %err, "profile fetch failed");
                transcript.append(EntryPayload::Error(err.to_string()));
                self.phase = Phase::Failed;
                None
            }
        }
    }

    pub(crate) fn history_generated(
        &mut self,
        result: Result<Vec<LoginRecord>, GenerateError>,
        transcript: &mut Transcript,
    ) {
        let Phase::FetchingHistory { username } = &self.phase else {
            warn!(phase = ?self.phase, "dropping history result outside history phase");
            return;
        };
        match result {
            Ok(records) => {
                info!(username = %username, count = records.len(), "check command completed");
                transcript.append(EntryPayload::Info(format!(
                    "Generated {} login attempts:",
                    records.len()
                )));
                transcript.append(EntryPayload::Component(DataBlock::LoginTable(records)));
                self.phase = Phase::Done;
            }
            Err(err) => {
                transcript.append(EntryPayload::Error(err.to_string()));
                self.phase = Phase::Failed;
            }
        }
    }

    /// Ends an in-flight run whose result will never arrive.
    pub(crate) fn abort(&mut self, transcript: &mut Transcript) {
        if !self.is_busy() {
            return;
        }
        warn!(phase = ?self.phase, "command aborted");
        transcript.append(EntryPayload::Error(WORKER_LOST_MESSAGE.to_string()));
        self.phase = Phase::Failed;
    }
}
