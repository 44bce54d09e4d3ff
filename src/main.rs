use std::io::Stdout;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use crossterm::cursor;
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::{Terminal, TerminalOptions, Viewport};
use tracing::info;
use unicode_width::UnicodeWidthChar;

mod app;
mod config;
mod interpreter;
mod orchestrator;
mod services;
mod transcript;

use config::Config;
use services::Services;

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--version" | "-v" => {
                println!("insta-checker {}", APP_VERSION);
                return Ok(());
            }
            unknown => {
                eprintln!("unknown argument: {}", unknown);
                std::process::exit(2);
            }
        }
    }

    let config = Config::from_env();
    init_file_logging(&config.log_path)?;
    info!(version = APP_VERSION, config = ?config, "insta-checker starting");
    let services = Services::from_config(&config)?;

    let mut terminal = setup_terminal()?;
    let result = app::run_app(&mut terminal, services);
    restore_terminal(&mut terminal)?;
    if let Err(err) = &result {
        tracing::error!(error = %err, "console loop failed");
    }
    result
}

/// The terminal belongs to the console, so diagnostics go to an append-only file.
fn init_file_logging(log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create log directory '{}'", parent.display()))?;
        }
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("open log file '{}'", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .init();

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    // ratatui::Terminal::insert_before requires at least one line above the viewport.
    // If cursor starts at row 0, move to row 1 first.
    if matches!(cursor::position(), Ok((_, 0))) {
        println!();
    }

    enable_raw_mode().context("enable raw mode")?;

    let term_height = crossterm::terminal::size().map(|(_, h)| h).unwrap_or(24);
    let term_width = crossterm::terminal::size().map(|(w, _)| w).unwrap_or(80);
    let inline_height = compute_inline_height(term_height);

    let mut terminal = match Terminal::with_options(
        CrosstermBackend::new(std::io::stdout()),
        TerminalOptions {
            viewport: Viewport::Inline(inline_height),
        },
    ) {
        Ok(t) => t,
        Err(inline_err) => {
            // Some terminals/shell wrappers fail cursor-position query required by Inline.
            // Fall back to a fixed bottom viewport to keep app usable.
            let fallback_rect = Rect::new(
                0,
                term_height.saturating_sub(inline_height),
                term_width.max(1),
                inline_height.max(1),
            );
            Terminal::with_options(
                CrosstermBackend::new(std::io::stdout()),
                TerminalOptions {
                    viewport: Viewport::Fixed(fallback_rect),
                },
            )
            .with_context(|| format!("create terminal (inline failed: {inline_err})"))?
        }
    };

    if matches!(supports_keyboard_enhancement(), Ok(true)) {
        crossterm::execute!(
            std::io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )
        .ok();
    }
    crossterm::execute!(std::io::stdout(), EnableBracketedPaste).ok();

    terminal.hide_cursor().ok();
    Ok(terminal)
}

fn compute_inline_height(term_height: u16) -> u16 {
    let max_allowed = term_height.saturating_sub(1).max(1);
    // Processing + console + status panels.
    10u16.min(max_allowed).max(6.min(max_allowed))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    crossterm::execute!(std::io::stdout(), DisableBracketedPaste).ok();
    crossterm::execute!(std::io::stdout(), PopKeyboardEnhancementFlags).ok();
    disable_raw_mode().context("disable raw mode")?;
    terminal.show_cursor().context("show cursor")?;
    println!();
    Ok(())
}

/// Cuts `s` after `n` characters and marks the cut with `...`.
fn truncate(s: &str, n: usize) -> String {
    match s.char_indices().nth(n) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

fn input_cursor_position(input: &str, cursor: usize, width: u16, prompt_width: u16) -> (u16, u16) {
    let width = width.max(1) as usize;
    let mut x = prompt_width as usize;
    let mut y = 0usize;
    let mut consumed = 0usize;

    for ch in input.chars() {
        let len = ch.len_utf8();
        if consumed + len > cursor {
            break;
        }
        consumed += len;
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1).max(1);
        if x + ch_width > width {
            x = 0;
            y += 1;
        }
        x += ch_width;
        if x >= width {
            x = 0;
            y += 1;
        }
    }

    (x as u16, y as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text_and_marks_cuts() {
        assert_eq!(truncate("ready", 10), "ready");
        assert_eq!(truncate("generating history @nasa", 10), "generating...");
        assert_eq!(truncate("Bakı şəhəri", 4), "Bakı...");
    }

    #[test]
    fn cursor_starts_after_prompt() {
        assert_eq!(input_cursor_position("", 0, 40, 22), (22, 0));
        assert_eq!(input_cursor_position("/check", 6, 40, 22), (28, 0));
    }

    #[test]
    fn cursor_wraps_at_panel_width() {
        // Prompt of 8 columns, 10 columns wide: two chars fill the first row.
        assert_eq!(input_cursor_position("abc", 3, 10, 8), (1, 1));
    }

    #[test]
    fn cursor_counts_wide_chars_by_display_width() {
        assert_eq!(input_cursor_position("你好", "你好".len(), 40, 0), (4, 0));
    }

    #[test]
    fn inline_height_fits_small_terminals() {
        assert_eq!(compute_inline_height(40), 10);
        assert_eq!(compute_inline_height(8), 7);
        assert_eq!(compute_inline_height(2), 1);
    }
}
