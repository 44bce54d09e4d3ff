use super::*;

use crate::services::history::LoginRecord;
use crate::services::profile::Profile;
use crate::transcript::{DataBlock, EntryPayload, TranscriptEntry};

const TABLE_HEADERS: [&str; 7] = [
    "Cihaz Türü",
    "Cihaz Modeli",
    "Giriş Türü",
    "Giriş Zamanı",
    "IP Adresi",
    "Giriş Konumu",
    "Giriş Yöntemi",
];
const TABLE_CELL_MAX_WIDTH: usize = 28;
const TABLE_CELL_MIN_WIDTH: usize = 4;
const TABLE_COLUMN_GAP: &str = "  ";
const HACK_METHOD: &str = "Hack Girişi";
const PROFILE_LABEL_WIDTH: usize = 11;

fn banner_card_outer_width(viewport_width: u16) -> usize {
    let max_outer = viewport_width.max(1) as usize;
    if max_outer >= 26 {
        max_outer.min(76)
    } else {
        max_outer
    }
}

fn truncate_display_width(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > max_width {
            break;
        }
        out.push(ch);
        used += cw;
    }
    out
}

fn fit_to_display_width(text: &str, width: usize) -> String {
    let mut fitted = if UnicodeWidthStr::width(text) > width && width > 1 {
        let mut cut = truncate_display_width(text, width - 1);
        cut.push('…');
        cut
    } else {
        truncate_display_width(text, width)
    };
    let used = UnicodeWidthStr::width(fitted.as_str());
    if used < width {
        fitted.push_str(&" ".repeat(width - used));
    }
    fitted
}

/// `1234567` -> `1,234,567`.
pub(super) fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Welcome card written above the composer once at startup.
pub(super) fn banner_lines(palette: ThemePalette, width: u16) -> Vec<Line<'static>> {
    let rows = [
        (WELCOME_TITLE, palette.info_style()),
        (WELCOME_HINT, palette.info_style()),
        (WELCOME_KEYS, palette.muted_style()),
    ];
    let outer = banner_card_outer_width(width);
    let mut lines = Vec::new();
    if outer < 6 {
        for (text, style) in rows {
            lines.push(Line::from(Span::styled(text.to_string(), style)));
        }
        lines.push(Line::from(""));
        return lines;
    }

    let border_style = palette.panel_border_style();
    let inner = outer.saturating_sub(2);
    let content_width = inner.saturating_sub(2);
    lines.push(Line::from(vec![
        Span::styled("┌".to_string(), border_style),
        Span::styled("─".repeat(inner), border_style),
        Span::styled("┐".to_string(), border_style),
    ]));
    for (text, style) in rows {
        lines.push(Line::from(vec![
            Span::styled("│ ".to_string(), border_style),
            Span::styled(fit_to_display_width(text, content_width), style),
            Span::styled(" │".to_string(), border_style),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("└".to_string(), border_style),
        Span::styled("─".repeat(inner), border_style),
        Span::styled("┘".to_string(), border_style),
    ]));
    lines.push(Line::from(""));
    lines
}

fn push_text_lines(lines: &mut Vec<Line<'static>>, text: &str, style: Style) {
    // Error text may echo a submitted line.
    for part in sanitize_remote_text(text, true).split('\n') {
        let content = if part.is_empty() { " " } else { part };
        lines.push(Line::from(Span::styled(content.to_string(), style)));
    }
}

fn profile_row(label: &str, value: Vec<Span<'static>>, palette: ThemePalette) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("{:<width$}", format!("{label}:"), width = PROFILE_LABEL_WIDTH),
        palette.label_style(),
    )];
    spans.push(Span::raw(" "));
    spans.extend(value);
    Line::from(spans)
}

fn render_profile(profile: &Profile, palette: ThemePalette) -> Vec<Line<'static>> {
    let value = |text: String| vec![Span::styled(text, palette.value_style())];
    let mut username = vec![Span::styled(
        sanitize_remote_text(&profile.username, false),
        palette.value_style().add_modifier(ratatui::style::Modifier::BOLD),
    )];
    if profile.is_verified {
        username.push(Span::styled(
            " (Verified)".to_string(),
            Style::default().fg(palette.verified),
        ));
    }

    let mut lines = vec![
        profile_row("Username", username, palette),
        profile_row(
            "Full Name",
            value(sanitize_remote_text(&profile.full_name, false)),
            palette,
        ),
        profile_row("Followers", value(group_thousands(profile.followers)), palette),
        profile_row("Following", value(group_thousands(profile.following)), palette),
        profile_row(
            "Private",
            value(if profile.is_private { "Yes" } else { "No" }.to_string()),
            palette,
        ),
    ];
    if !profile.profile_pic_url.is_empty() {
        lines.push(profile_row(
            "Avatar",
            vec![Span::styled(
                sanitize_remote_text(&profile.profile_pic_url, false),
                palette.muted_style(),
            )],
            palette,
        ));
    }
    lines.push(Line::from(Span::styled(
        "Biography:".to_string(),
        palette.label_style(),
    )));
    let bio_style = Style::default().fg(palette.bio_text);
    let bio = sanitize_remote_text(&profile.biography, true);
    for part in bio.split('\n') {
        lines.push(Line::from(Span::styled(format!("  {part}"), bio_style)));
    }
    lines
}

fn record_cells(record: &LoginRecord) -> [String; 7] {
    [
        &record.device_type,
        &record.device_model,
        &record.login_type,
        &record.login_time,
        &record.login_ip,
        &record.login_location,
        &record.login_method,
    ]
    .map(|cell| sanitize_remote_text(cell, false))
}

/// Column widths that fit the table into `width` columns where possible.
fn table_column_widths(rows: &[[String; 7]], width: usize) -> [usize; 7] {
    let mut widths = TABLE_HEADERS.map(UnicodeWidthStr::width);
    for row in rows {
        for (col, cell) in row.iter().enumerate() {
            widths[col] = widths[col].max(UnicodeWidthStr::width(cell.as_str()));
        }
    }
    for w in widths.iter_mut() {
        *w = (*w).min(TABLE_CELL_MAX_WIDTH);
    }

    let gaps = TABLE_COLUMN_GAP.len() * (widths.len() - 1);
    loop {
        let total: usize = widths.iter().sum::<usize>() + gaps;
        if total <= width {
            break;
        }
        let Some((widest, _)) = widths
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > TABLE_CELL_MIN_WIDTH)
            .max_by_key(|(_, w)| **w)
        else {
            break;
        };
        widths[widest] -= 1;
    }
    widths
}

fn render_login_table(
    records: &[LoginRecord],
    palette: ThemePalette,
    width: u16,
) -> Vec<Line<'static>> {
    let rows: Vec<[String; 7]> = records.iter().map(record_cells).collect();
    let widths = table_column_widths(&rows, width.max(1) as usize);
    let header_style = palette.label_style();
    let rule_style = Style::default().fg(palette.table_rule);

    let row_line = |cells: Vec<(String, Style)>| -> Line<'static> {
        let mut spans = Vec::with_capacity(cells.len() * 2);
        for (col, (cell, style)) in cells.into_iter().enumerate() {
            if col > 0 {
                spans.push(Span::raw(TABLE_COLUMN_GAP));
            }
            spans.push(Span::styled(fit_to_display_width(&cell, widths[col]), style));
        }
        Line::from(spans)
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(row_line(
        TABLE_HEADERS
            .iter()
            .map(|h| (h.to_string(), header_style))
            .collect(),
    ));
    let rule_width = widths.iter().sum::<usize>() + TABLE_COLUMN_GAP.len() * (widths.len() - 1);
    lines.push(Line::from(Span::styled("─".repeat(rule_width), rule_style)));
    for row in rows {
        let cells = row
            .into_iter()
            .enumerate()
            .map(|(col, cell)| {
                let style = if col == 6 && cell == HACK_METHOD {
                    palette.error_style()
                } else {
                    palette.value_style()
                };
                (cell, style)
            })
            .collect();
        lines.push(row_line(cells));
    }
    lines
}

/// Pure mapping from one transcript entry to styled terminal lines.
pub(super) fn render_entry_lines(
    entry: &TranscriptEntry,
    palette: ThemePalette,
    width: u16,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    match &entry.payload {
        EntryPayload::Command(text) => {
            lines.push(Line::from(vec![
                Span::styled(PROMPT.to_string(), palette.prompt_style()),
                Span::styled(sanitize_remote_text(text, false), palette.command_style()),
            ]));
        }
        EntryPayload::Output(text) => push_text_lines(&mut lines, text, palette.output_style()),
        EntryPayload::Info(text) => push_text_lines(&mut lines, text, palette.info_style()),
        EntryPayload::Error(text) => push_text_lines(&mut lines, text, palette.error_style()),
        EntryPayload::Component(DataBlock::Profile(profile)) => {
            lines.extend(render_profile(profile, palette));
            lines.push(Line::from(""));
        }
        EntryPayload::Component(DataBlock::LoginTable(records)) => {
            lines.extend(render_login_table(records, palette, width));
            lines.push(Line::from(""));
        }
    }
    lines
}

impl App {
    pub(super) fn render_entries_lines_range(
        &self,
        width: u16,
        start: usize,
        end: usize,
    ) -> Vec<Line<'static>> {
        let palette = self.theme_palette();
        let entries = self.transcript.entries();
        let end = end.min(entries.len());
        let start = start.min(end);
        entries[start..end]
            .iter()
            .flat_map(|entry| render_entry_lines(entry, palette, width))
            .collect()
    }
}
