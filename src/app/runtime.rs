use super::*;

use super::render::banner_lines;

pub(crate) fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    services: Services,
) -> Result<()> {
    let mut app = App::new(services);
    const ACTIVE_POLL_MS: u64 = 33;
    const IDLE_POLL_MS: u64 = 100;
    const SPINNER_TICK_MS: u64 = 120;
    const MAX_EVENTS_PER_FRAME: u16 = 64;
    let mut last_spinner_tick = Instant::now();
    let mut needs_draw = true;
    let mut flushed_entries = 0usize;

    let width = terminal.size().map(|s| s.width).unwrap_or(80).max(1);
    insert_lines(terminal, banner_lines(app.theme_palette(), width))?;

    loop {
        if app.poll_worker() {
            needs_draw = true;
        }
        if app.is_busy() && last_spinner_tick.elapsed() >= Duration::from_millis(SPINNER_TICK_MS)
        {
            app.spinner_idx = (app.spinner_idx + 1) % 8;
            last_spinner_tick = Instant::now();
            needs_draw = true;
        }

        if needs_draw {
            flush_new_entries(terminal, &app, &mut flushed_entries)?;
            terminal.draw(|f| ui::draw(f, &app))?;
            needs_draw = false;
        }

        if app.should_quit {
            break;
        }

        let timeout = if app.is_busy() {
            Duration::from_millis(ACTIVE_POLL_MS)
        } else {
            Duration::from_millis(IDLE_POLL_MS)
        };
        if !event::poll(timeout).context("event poll")? {
            continue;
        }

        let mut drained_events: u16 = 0;
        loop {
            match event::read().context("event read")? {
                Event::Key(key) => {
                    if !matches!(key.kind, KeyEventKind::Release) {
                        app.handle_key(key);
                        needs_draw = true;
                    }
                }
                Event::Paste(text) => {
                    app.handle_paste_event(&text);
                    needs_draw = true;
                }
                Event::Resize(_, _) => {
                    needs_draw = true;
                }
                _ => {}
            }

            drained_events = drained_events.saturating_add(1);
            if drained_events >= MAX_EVENTS_PER_FRAME {
                break;
            }
            if !event::poll(Duration::from_millis(0)).context("event poll drain")? {
                break;
            }
        }
    }

    flush_new_entries(terminal, &app, &mut flushed_entries)?;
    // Clear the console panels while keeping the transcript in scrollback.
    terminal.draw(ui::draw_exit)?;
    Ok(())
}

/// Writes transcript entries appended since the last flush above the inline viewport.
fn flush_new_entries(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &App,
    flushed_entries: &mut usize,
) -> Result<()> {
    let total = app.transcript.len();
    if *flushed_entries >= total {
        return Ok(());
    }
    let width = terminal
        .size()
        .context("terminal size for insert")?
        .width
        .max(1);
    let lines = app.render_entries_lines_range(width, *flushed_entries, total);
    if insert_lines(terminal, lines)? {
        *flushed_entries = total;
    }
    Ok(())
}

/// Returns false when the backend panicked mid-insert so the caller retries next frame.
fn insert_lines(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    lines: Vec<Line<'static>>,
) -> Result<bool> {
    if lines.is_empty() {
        return Ok(true);
    }
    let width = terminal
        .size()
        .context("terminal size for insert")?
        .width
        .max(1);
    let probe = Paragraph::new(Text::from(lines.clone())).wrap(Wrap { trim: false });
    let height = probe.line_count(width).min(u16::MAX as usize) as u16;
    if height == 0 {
        return Ok(true);
    }

    let insert_result = catch_unwind(AssertUnwindSafe(|| {
        terminal.insert_before(height, |buf| {
            let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
            paragraph.render(buf.area, buf);
        })
    }));
    match insert_result {
        Ok(res) => {
            res.context("insert transcript lines")?;
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}
