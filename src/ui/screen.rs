use ratatui::Frame;

use crate::app::{App, AppState};

/// A UI Screen boundary: responsible for drawing one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Loading, typing and results share the main widget
pub struct MainScreen;

impl Screen for MainScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Account screen, drawn over a cleared frame
pub struct AccountScreen;

impl Screen for AccountScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(ratatui::widgets::Clear, f.area());
        f.render_widget(app, f.area());
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Account => Box::new(AccountScreen),
        AppState::Loading | AppState::Typing | AppState::Results => Box::new(MainScreen),
    }
}

/// Draws whatever screen the app is on.
pub fn draw(app: &App, f: &mut Frame) {
    current_screen(&app.state).render(app, f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::UsernameCheck;
    use crate::quotes::{QuoteLoader, QuoteSource};
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn draws_every_state() {
        let loader = QuoteLoader::new(QuoteSource::new(Some("abc".to_string()), None));
        let mut app = App::new(loader, None, None, UsernameCheck::default());
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        for state in [
            AppState::Loading,
            AppState::Typing,
            AppState::Results,
            AppState::Account,
        ] {
            app.state = state;
            terminal.draw(|f| draw(&app, f)).unwrap();
        }

        let content: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(content.contains("Sign in"));
    }
}
