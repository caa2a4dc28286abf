use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::{
    accounts::{Availability, UserRecord},
    app::App,
    form::{AccountForm, Field, FormMode, MessageKind},
};

const FORM_WIDTH: u16 = 60;

/// Lines for a single form field: the input line, then an optional note.
pub fn present_field(form: &AccountForm, field: Field) -> Vec<Line<'static>> {
    let focused = form.focused() == field;
    let value = form.value(field);
    let shown = if field.is_secret() {
        "•".repeat(value.chars().count())
    } else {
        value.to_string()
    };

    let label_style = if focused {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };
    let value_style = if focused {
        Style::default().add_modifier(Modifier::UNDERLINED)
    } else {
        Style::default()
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(if focused { "> " } else { "  " }, label_style),
        Span::styled(format!("{:<18}", format!("{}:", field)), label_style),
        Span::styled(shown, value_style),
    ])];

    if let Some(error) = form.errors.get(&field) {
        lines.push(note(error.clone(), Color::Red));
    } else if field == Field::Username {
        let state = form.username_check.state();
        let color = match state {
            Availability::Available => Some(Color::Green),
            Availability::Checking => Some(Color::Yellow),
            Availability::Unknown => None,
            _ => Some(Color::Red),
        };
        if let Some(color) = color {
            lines.push(note(state.message().to_string(), color));
        }
    }
    lines
}

fn note(text: String, color: Color) -> Line<'static> {
    Line::from(Span::styled(
        format!("{:20}{}", "", text),
        Style::default().fg(color),
    ))
}

fn profile_lines(user: &UserRecord) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    vec![
        Line::from(Span::styled(user.name.clone(), bold)),
        Line::from(format!("@{}  <{}>", user.username, user.email)),
        Line::from(format!(
            "Member since {}",
            user.member_since.format("%B %-d, %Y")
        )),
        Line::default(),
        Line::from(vec![
            Span::styled(format!("{}", user.races), bold),
            Span::raw(" races   "),
            Span::styled(format!("{}", user.speed), bold),
            Span::raw(" wpm avg   "),
            Span::styled(format!("{}%", user.accuracy), bold),
            Span::raw(" accuracy"),
        ]),
    ]
}

fn form_lines(form: &AccountForm) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for &field in form.fields() {
        lines.extend(present_field(form, field));
    }

    if let Some((kind, message)) = &form.message {
        let color = match kind {
            MessageKind::Info => Color::Cyan,
            MessageKind::Success => Color::Green,
            MessageKind::Error => Color::Red,
        };
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            message.clone(),
            Style::default().fg(color),
        )));
    }
    lines
}

pub fn render_account(app: &App, area: Rect, buf: &mut Buffer) {
    let (title, lines) = match &app.user {
        Some(user) => (" Account ", profile_lines(user)),
        None => (
            match app.form.mode {
                FormMode::Login => " Sign in ",
                FormMode::Signup => " Create account ",
            },
            form_lines(&app.form),
        ),
    };

    let width = FORM_WIDTH.min(area.width);
    let height = (lines.len() as u16 + 2).min(area.height);
    let rect = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false })
        .render(rect, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::UsernameCheck;
    use crate::app::AppState;
    use crate::quotes::{QuoteLoader, QuoteSource};
    use chrono::Local;
    use std::time::Instant;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn rendered(app: &App) -> String {
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        render_account(app, area, &mut buffer);
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    fn account_app() -> App {
        let loader = QuoteLoader::new(QuoteSource::new(Some("x".to_string()), None));
        let mut app = App::new(loader, None, None, UsernameCheck::default());
        app.state = AppState::Account;
        app
    }

    #[test]
    fn secrets_are_masked() {
        let mut form = AccountForm::new(UsernameCheck::default());
        form.set_value(Field::LoginPassword, "hunter2");

        let lines = present_field(&form, Field::LoginPassword);
        let text = line_text(&lines[0]);
        assert!(text.contains("•••••••"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn focused_field_is_marked() {
        let form = AccountForm::new(UsernameCheck::default());
        let lines = present_field(&form, Field::LoginUsername);
        assert!(line_text(&lines[0]).starts_with("> Username:"));

        let lines = present_field(&form, Field::LoginPassword);
        assert!(line_text(&lines[0]).starts_with("  Password:"));
    }

    #[test]
    fn field_error_replaces_availability_note() {
        let mut form = AccountForm::new(UsernameCheck::default());
        form.toggle_mode();
        form.username_check.input_changed("chimp", Instant::now());

        let lines = present_field(&form, Field::Username);
        assert_eq!(lines.len(), 2);
        assert!(line_text(&lines[1]).contains("Checking availability..."));

        form.errors
            .insert(Field::Username, "Please enter a username".to_string());
        let lines = present_field(&form, Field::Username);
        assert!(line_text(&lines[1]).contains("Please enter a username"));
    }

    #[test]
    fn login_form_renders() {
        let app = account_app();
        let content = rendered(&app);
        assert!(content.contains("Sign in"));
        assert!(content.contains("Username:"));
        assert!(content.contains("Password:"));
    }

    #[test]
    fn signup_form_renders_all_fields() {
        let mut app = account_app();
        app.form.toggle_mode();
        let content = rendered(&app);
        assert!(content.contains("Create account"));
        assert!(content.contains("Full name:"));
        assert!(content.contains("Confirm password:"));
    }

    #[test]
    fn profile_renders_for_signed_in_user() {
        let mut app = account_app();
        app.user = Some(UserRecord {
            username: "chimp".to_string(),
            name: "Chim Panzee".to_string(),
            email: "chimp@example.org".to_string(),
            races: 12,
            speed: 77,
            accuracy: 98,
            member_since: Local::now(),
        });

        let content = rendered(&app);
        assert!(content.contains("Chim Panzee"));
        assert!(content.contains("@chimp"));
        assert!(content.contains("12 races"));
        assert!(content.contains("77 wpm avg"));
    }

    #[test]
    fn small_area_does_not_panic() {
        let app = account_app();
        let area = Rect::new(0, 0, 10, 3);
        let mut buffer = Buffer::empty(area);
        render_account(&app, area, &mut buffer);
    }
}
