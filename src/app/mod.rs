use std::io::Stdout;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::backend::CrosstermBackend;
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Widget, Wrap};
use ratatui::Terminal;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::input_cursor_position;
use crate::interpreter::{Interpreter, Step};
use crate::services::Services;
use crate::transcript::Transcript;

pub(crate) const PROMPT: &str = "user@insta-checker:~$ ";
const WELCOME_TITLE: &str = "Welcome to Insta-Checker Console.";
const WELCOME_HINT: &str = "Type '/check @{username}' to begin. (e.g., /check @instagram)";
const WELCOME_KEYS: &str = "keys: Enter run | Up/Down recall | Ctrl+U clear | Ctrl+C exit";

mod commands;
mod input;
mod render;
mod runtime;
mod text;
mod types;
mod ui;
mod worker;

pub(crate) use runtime::run_app;
use text::sanitize_remote_text;
pub(crate) use types::{console_palette, ThemePalette, WorkerEvent};

struct App {
    services: Services,
    interpreter: Interpreter,
    transcript: Transcript,
    should_quit: bool,
    spinner_idx: usize,

    input: String,
    cursor: usize,
    history: Vec<String>,
    history_pos: Option<usize>,

    rx: Option<Receiver<WorkerEvent>>,
    run_started_at: Option<Instant>,
    last_status: String,
    theme: ThemePalette,
}

impl App {
    fn new(services: Services) -> Self {
        let interpreter = Interpreter::new();
        let last_status = interpreter.phase().label();
        Self {
            services,
            interpreter,
            transcript: Transcript::new(),
            should_quit: false,
            spinner_idx: 0,
            input: String::new(),
            cursor: 0,
            history: Vec::new(),
            history_pos: None,
            rx: None,
            run_started_at: None,
            last_status,
            theme: console_palette(),
        }
    }

    pub(super) fn is_busy(&self) -> bool {
        self.interpreter.is_busy()
    }

    pub(super) fn theme_palette(&self) -> ThemePalette {
        self.theme
    }

    pub(super) fn running_elapsed_secs(&self) -> u64 {
        self.run_started_at
            .map(|started| started.elapsed().as_secs())
            .unwrap_or(0)
    }

    fn finish_run(&mut self) {
        self.rx = None;
        self.run_started_at = None;
    }

    fn input_height(&self, width: u16, prompt_width: u16) -> u16 {
        if self.input.is_empty() {
            return 1;
        }
        let (_, end_y) = input_cursor_position(&self.input, self.input.len(), width, prompt_width);
        end_y.saturating_add(1).max(1)
    }

    fn status_text(&self) -> String {
        if self.is_busy() {
            let secs = self.running_elapsed_secs();
            format!("{} ({:02}:{:02})", self.last_status, secs / 60, secs % 60)
        } else {
            self.last_status.clone()
        }
    }
}
