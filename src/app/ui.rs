use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use super::{App, ThemePalette, PROMPT};
use crate::{input_cursor_position, truncate};

const PANEL_PADDING_X: u16 = 1;
const PANEL_PADDING_Y: u16 = 0;
const PANEL_HORIZONTAL_INSET: u16 = 2 + PANEL_PADDING_X * 2;
const PANEL_VERTICAL_INSET: u16 = 2 + PANEL_PADDING_Y * 2;
const SPINNER_FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

// Pulse intensity for the processing dot, one entry per spinner frame.
const BREATH_SCALE_PCT: [u16; 8] = [58, 70, 82, 94, 108, 94, 82, 70];

pub(super) fn draw(f: &mut Frame, app: &App) {
    let frame_area = f.area();
    let theme = app.theme_palette();
    let prompt_width = UnicodeWidthStr::width(PROMPT) as u16;
    let composer_width = frame_area.width.saturating_sub(PANEL_HORIZONTAL_INSET).max(1);

    let busy = app.is_busy();
    let processing_h = if busy { 1 + PANEL_VERTICAL_INSET } else { 0 };
    let status_h: u16 = 1 + PANEL_VERTICAL_INSET;
    let max_input_height = frame_area
        .height
        .saturating_sub(processing_h + status_h)
        .max(3);
    let input_height = app
        .input_height(composer_width, prompt_width)
        .saturating_add(PANEL_VERTICAL_INSET)
        .min(max_input_height);

    let mut constraints = Vec::new();
    if busy {
        constraints.push(Constraint::Length(processing_h));
    }
    constraints.push(Constraint::Length(input_height));
    constraints.push(Constraint::Length(status_h));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame_area);

    let (processing_chunk, input_chunk, status_chunk) = if busy {
        (Some(chunks[0]), chunks[1], chunks[2])
    } else {
        (None, chunks[0], chunks[1])
    };

    if let Some(area) = processing_chunk {
        let panel = Paragraph::new(Text::from(vec![build_processing_line(app, theme)]))
            .style(theme.panel_surface_style())
            .block(panel_block(theme, "processing"));
        f.render_widget(panel, area);
    }

    let input = Paragraph::new(Text::from(build_input_lines(app, theme)))
        .style(theme.input_surface_style())
        .block(panel_block(theme, "console"))
        .wrap(Wrap { trim: false });
    f.render_widget(input, input_chunk);

    // No cursor while the prompt is disabled.
    if !busy {
        let content_width = input_chunk
            .width
            .saturating_sub(PANEL_HORIZONTAL_INSET)
            .max(1);
        let content_height = input_chunk
            .height
            .saturating_sub(PANEL_VERTICAL_INSET)
            .max(1);
        let (cx, cy) = input_cursor_position(&app.input, app.cursor, content_width, prompt_width);
        let cursor_x =
            input_chunk.x + 1 + PANEL_PADDING_X + cx.min(content_width.saturating_sub(1));
        let cursor_y =
            input_chunk.y + 1 + PANEL_PADDING_Y + cy.min(content_height.saturating_sub(1));
        f.set_cursor_position((cursor_x, cursor_y));
    }

    let status = Paragraph::new(format!(
        "{} | Up/Down history | Ctrl+C exit",
        truncate(&app.status_text(), 60)
    ))
    .style(theme.status_style())
    .block(panel_block(theme, "status"));
    f.render_widget(status, status_chunk);
}

pub(super) fn draw_exit(f: &mut Frame) {
    f.render_widget(Clear, f.area());
}

fn panel_block(theme: ThemePalette, title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme.panel_border_style())
        .title(Span::styled(format!(" {} ", title), theme.muted_style()))
        .padding(Padding::new(
            PANEL_PADDING_X,
            PANEL_PADDING_X,
            PANEL_PADDING_Y,
            PANEL_PADDING_Y,
        ))
        .style(theme.panel_surface_style())
}

fn build_input_lines(app: &App, theme: ThemePalette) -> Vec<Line<'static>> {
    let prompt = Span::styled(PROMPT.to_string(), theme.prompt_style());
    if app.is_busy() {
        return vec![Line::from(vec![
            prompt,
            Span::styled("waiting for the current command...", theme.muted_style()),
        ])];
    }
    if app.input.is_empty() {
        return vec![Line::from(vec![
            prompt,
            Span::styled("/check @username", theme.muted_style()),
        ])];
    }
    vec![Line::from(vec![
        prompt,
        Span::styled(app.input.clone(), Style::default().fg(theme.input_text)),
    ])]
}

fn scale_rgb(value: u8, pct: u16) -> u8 {
    ((value as u16 * pct) / 100).min(255) as u8
}

fn color_with_breath(base: Color, frame: usize) -> Color {
    let pct = BREATH_SCALE_PCT[frame % BREATH_SCALE_PCT.len()];
    match base {
        Color::Rgb(r, g, b) => Color::Rgb(scale_rgb(r, pct), scale_rgb(g, pct), scale_rgb(b, pct)),
        _ => base,
    }
}

fn build_processing_line(app: &App, theme: ThemePalette) -> Line<'static> {
    let frame = app.spinner_idx % SPINNER_FRAMES.len();
    let dot_color = color_with_breath(theme.processing, frame);
    Line::from(vec![
        Span::styled(
            format!(" {} ", SPINNER_FRAMES[frame]),
            theme.processing_style().fg(dot_color),
        ),
        Span::styled("Processing... ".to_string(), theme.processing_style()),
        Span::styled(app.status_text(), theme.muted_style()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn exit_frame_blanks_the_viewport() {
        let mut terminal = Terminal::new(TestBackend::new(24, 3)).expect("terminal");
        terminal
            .draw(|f| f.render_widget(Paragraph::new("leftover panel"), f.area()))
            .expect("first frame");

        terminal.draw(draw_exit).expect("exit frame");

        assert!(terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .all(|cell| cell.symbol() == " "));
    }

    #[test]
    fn breath_scales_rgb_and_leaves_named_colors() {
        assert_eq!(
            color_with_breath(Color::Rgb(100, 200, 50), 0),
            Color::Rgb(58, 116, 29)
        );
        assert_eq!(color_with_breath(Color::Red, 3), Color::Red);
    }

    #[test]
    fn brightest_frame_saturates_at_255() {
        assert_eq!(scale_rgb(250, 108), 255);
    }
}
