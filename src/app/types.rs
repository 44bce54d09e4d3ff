use ratatui::style::{Color, Modifier, Style};

use crate::services::history::{GenerateError, LoginRecord};
use crate::services::profile::{FetchError, Profile};

/// Result of one remote step, sent from the worker thread back to the UI loop.
#[derive(Debug)]
pub(crate) enum WorkerEvent {
    Profile(Result<Profile, FetchError>),
    History(Result<Vec<LoginRecord>, GenerateError>),
}

#[derive(Clone, Copy)]
pub(crate) struct ThemePalette {
    pub(crate) prompt: Color,
    pub(crate) input_text: Color,
    pub(crate) muted_text: Color,
    pub(crate) command_text: Color,
    pub(crate) output_text: Color,
    pub(crate) info_text: Color,
    pub(crate) error_text: Color,
    pub(crate) label: Color,
    pub(crate) value_text: Color,
    pub(crate) verified: Color,
    pub(crate) bio_text: Color,
    pub(crate) table_rule: Color,
    pub(crate) status_text: Color,
    pub(crate) panel_bg: Color,
    pub(crate) panel_fg: Color,
    pub(crate) panel_border: Color,
    pub(crate) processing: Color,
}

/// Green-on-black console palette.
pub(crate) fn console_palette() -> ThemePalette {
    ThemePalette {
        prompt: Color::Rgb(96, 165, 250),
        input_text: Color::Rgb(74, 222, 128),
        muted_text: Color::Rgb(107, 114, 128),
        command_text: Color::Rgb(255, 255, 255),
        output_text: Color::Rgb(74, 222, 128),
        info_text: Color::Rgb(234, 179, 8),
        error_text: Color::Rgb(239, 68, 68),
        label: Color::Rgb(34, 211, 238),
        value_text: Color::Rgb(255, 255, 255),
        verified: Color::Rgb(59, 130, 246),
        bio_text: Color::Rgb(209, 213, 219),
        table_rule: Color::Rgb(55, 65, 81),
        status_text: Color::Rgb(140, 150, 160),
        panel_bg: Color::Rgb(17, 24, 39),
        panel_fg: Color::Rgb(74, 222, 128),
        panel_border: Color::Rgb(55, 65, 81),
        processing: Color::Rgb(234, 179, 8),
    }
}

impl ThemePalette {
    pub(crate) fn prompt_style(self) -> Style {
        Style::default()
            .fg(self.prompt)
            .add_modifier(Modifier::BOLD)
    }

    pub(crate) fn command_style(self) -> Style {
        Style::default().fg(self.command_text)
    }

    pub(crate) fn output_style(self) -> Style {
        Style::default().fg(self.output_text)
    }

    pub(crate) fn info_style(self) -> Style {
        Style::default().fg(self.info_text)
    }

    pub(crate) fn error_style(self) -> Style {
        Style::default().fg(self.error_text)
    }

    pub(crate) fn label_style(self) -> Style {
        Style::default().fg(self.label)
    }

    pub(crate) fn value_style(self) -> Style {
        Style::default().fg(self.value_text)
    }

    pub(crate) fn muted_style(self) -> Style {
        Style::default().fg(self.muted_text)
    }

    pub(crate) fn status_style(self) -> Style {
        Style::default().fg(self.status_text)
    }

    pub(crate) fn panel_surface_style(self) -> Style {
        Style::default().bg(self.panel_bg).fg(self.panel_fg)
    }

    pub(crate) fn panel_border_style(self) -> Style {
        Style::default().fg(self.panel_border)
    }

    pub(crate) fn input_surface_style(self) -> Style {
        Style::default().fg(self.input_text)
    }

    pub(crate) fn processing_style(self) -> Style {
        Style::default()
            .fg(self.processing)
            .add_modifier(Modifier::BOLD)
    }
}
