pub mod account;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::{App, AppState},
    reporting::StatsView,
    session::{CharStatus, Guidance, Session},
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

pub fn char_style(status: CharStatus) -> Style {
    match status {
        CharStatus::Correct => bold().fg(Color::Green),
        CharStatus::Incorrect => bold().fg(Color::Red),
        CharStatus::Highlighted => dim_bold().add_modifier(Modifier::UNDERLINED),
        CharStatus::Unvisited => dim_bold(),
    }
}

/// One span per character of the target text.
pub fn prompt_spans(session: &Session) -> Vec<Span<'static>> {
    session
        .render_model()
        .map(|(c, status)| {
            let symbol = match (status, c) {
                (CharStatus::Incorrect, ' ') => "·".to_owned(),
                _ => c.to_string(),
            };
            Span::styled(symbol, char_style(status))
        })
        .collect()
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Min(1),    // body
                Constraint::Length(1), // notice
                Constraint::Length(1), // legend
            ])
            .split(area);

        render_header(&self.stats_view(), chunks[0], buf);

        match self.state {
            AppState::Loading => {
                Paragraph::new(Span::styled("Loading text...", dim_bold()))
                    .alignment(Alignment::Center)
                    .render(centered_line(chunks[1]), buf);
            }
            AppState::Typing => render_typing(&self.session, chunks[1], buf),
            AppState::Results => render_results(self, chunks[1], buf),
            AppState::Account => account::render_account(self, chunks[1], buf),
        }

        if let Some(notice) = &self.notice {
            Paragraph::new(Span::styled(
                notice.as_str(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
        }

        Paragraph::new(Span::styled(
            legend(self),
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[3], buf);
    }
}

fn render_header(view: &StatsView, area: Rect, buf: &mut Buffer) {
    let line = Line::from(vec![
        Span::styled(view.username.clone(), bold().fg(Color::Magenta)),
        Span::raw(format!(
            "   races {}   speed {} wpm   accuracy {}%",
            view.races, view.speed, view.accuracy
        )),
    ]);
    Paragraph::new(line)
        .alignment(Alignment::Right)
        .render(area, buf);
}

fn centered_line(area: Rect) -> Rect {
    Rect {
        y: area.y + area.height / 2,
        height: area.height.min(1),
        ..area
    }
}

fn render_typing(session: &Session, area: Rect, buf: &mut Buffer) {
    let max_chars_per_line = area.width.max(1);
    let prompt_width = session.prompt().width();
    let prompt_occupied_lines = if prompt_width <= max_chars_per_line as usize {
        1
    } else {
        (prompt_width as f64 / max_chars_per_line as f64).ceil() as u16 + 1
    };
    let padding = area.height.saturating_sub(prompt_occupied_lines + 2) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(prompt_occupied_lines),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Line::from(prompt_spans(session)))
        .alignment(if prompt_occupied_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: false })
        .render(chunks[1], buf);

    let guidance_style = match session.guidance() {
        Guidance::FixErrors | Guidance::UseBackspace | Guidance::KeepCorrecting => {
            Style::default().fg(Color::Yellow)
        }
        _ => Style::default().add_modifier(Modifier::DIM),
    };
    Paragraph::new(Span::styled(session.guidance().message(), guidance_style))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(results) = &app.results else {
        return;
    };

    let lines = vec![
        Line::from(Span::styled(results.summary(), bold().fg(Color::Green))),
        Line::default(),
        Line::from(Span::styled(
            format!(
                "{} wpm   {}% acc   {} errors   {} chars",
                results.wpm, results.accuracy, results.errors, results.total_chars
            ),
            bold(),
        )),
    ];

    let top = area.height.saturating_sub(lines.len() as u16) / 2;
    let body = Rect {
        y: area.y + top,
        height: area.height - top,
        ..area
    };
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(body, buf);
}

fn legend(app: &App) -> &'static str {
    match app.state {
        AppState::Loading => "(esc)ape",
        AppState::Typing => "(←) retry / (→) new / (tab) account / (esc)ape",
        AppState::Results => "(r)etry / (n)ew / (tab) account / (esc)ape",
        AppState::Account if app.is_signed_in() => "(o) sign out / (esc) back",
        AppState::Account => "(tab) next / (f2) sign in or sign up / (enter) submit / (esc) back",
    }
}
