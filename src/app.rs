use std::time::{Instant, SystemTime};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info, warn};

use crate::accounts::{
    AccountClient, AccountError, AccountRequest, AccountResponse, ProfileCache, UserRecord,
    UsernameCheck,
};
use crate::form::{AccountForm, Field, FormAction, MessageKind};
use crate::quotes::QuoteLoader;
use crate::reporting::{AccountReporter, GuestStats, StatsReporter, StatsView};
use crate::results::TestResults;
use crate::session::{FinishEvent, InputOutcome, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum AppState {
    Loading,
    Typing,
    Results,
    Account,
}

/// Whether the event loop should keep going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

pub struct App {
    pub session: Session,
    pub state: AppState,
    pub results: Option<TestResults>,
    pub user: Option<UserRecord>,
    pub guest: GuestStats,
    pub form: AccountForm,
    pub notice: Option<String>,
    loader: QuoteLoader,
    accounts: Option<AccountClient>,
    profile: Option<ProfileCache>,
    return_to: AppState,
}

impl App {
    /// Restores a remembered user and asks for the first text.
    pub fn new(
        loader: QuoteLoader,
        accounts: Option<AccountClient>,
        profile: Option<ProfileCache>,
        username_check: UsernameCheck,
    ) -> Self {
        let user = profile.as_ref().and_then(ProfileCache::load);
        if let Some(user) = &user {
            info!(username = %user.username, "restored saved session");
        }

        let mut app = Self {
            session: Session::new(""),
            state: AppState::Loading,
            results: None,
            user,
            guest: GuestStats::default(),
            form: AccountForm::new(username_check),
            notice: None,
            loader,
            accounts,
            profile,
            return_to: AppState::Typing,
        };
        app.new_test();
        app
    }

    pub fn stats_view(&self) -> StatsView {
        StatsView::current(self.user.as_ref(), &self.guest)
    }

    pub fn accounts_enabled(&self) -> bool {
        self.accounts.is_some()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// Discards the current session and fetches a fresh text.
    pub fn new_test(&mut self) {
        self.results = None;
        self.state = AppState::Loading;
        self.loader.request();
    }

    /// Starts over on the same text.
    pub fn retry(&mut self) {
        if self.session.is_empty() {
            self.new_test();
            return;
        }
        let prompt = self.session.prompt().to_string();
        self.session.load_text(prompt);
        self.results = None;
        self.state = AppState::Typing;
    }

    pub fn on_tick(&mut self, now: Instant) {
        if let Some(text) = self.loader.poll() {
            debug!(chars = text.chars().count(), "text loaded");
            self.session.load_text(text);
            self.state = AppState::Typing;
        }

        if let Some((ticket, username)) = self.form.username_check.due(now) {
            if let Some(client) = &self.accounts {
                if let Err(err) = client.send(AccountRequest::CheckUsername { ticket, username }) {
                    self.form
                        .username_check
                        .apply(ticket, &Err(AccountError::ServiceUnavailable));
                    warn!(error = %err, "could not queue username check");
                }
            }
        }

        while let Some(response) = self.accounts.as_ref().and_then(AccountClient::try_recv) {
            self.on_account_response(response);
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Control {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Control::Quit;
        }

        match self.state {
            AppState::Loading => {
                if key.code == KeyCode::Esc {
                    return Control::Quit;
                }
            }
            AppState::Typing => return self.on_typing_key(key),
            AppState::Results => match key.code {
                KeyCode::Esc => return Control::Quit,
                KeyCode::Char('r') | KeyCode::Left => self.retry(),
                KeyCode::Char('n') | KeyCode::Right => self.new_test(),
                KeyCode::Tab => self.open_account(),
                _ => {}
            },
            AppState::Account => {
                let signed_in = self.is_signed_in();
                match self.form.on_key(key, now, signed_in) {
                    FormAction::None => {}
                    FormAction::Close => self.close_account(),
                    FormAction::Submit(request) => self.submit_account(request),
                    FormAction::Logout => self.logout(),
                }
            }
        }
        Control::Continue
    }

    fn on_typing_key(&mut self, key: KeyEvent) -> Control {
        match key.code {
            KeyCode::Esc => return Control::Quit,
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => self.new_test(),
            KeyCode::Right => self.new_test(),
            KeyCode::Left => self.retry(),
            KeyCode::Tab => self.open_account(),
            KeyCode::Backspace => {
                self.session.submit_backspace();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let InputOutcome::Finished(event) =
                    self.session.submit_character_at(c, SystemTime::now())
                {
                    self.finish(event);
                }
            }
            _ => {}
        }
        Control::Continue
    }

    fn finish(&mut self, event: FinishEvent) {
        let results = TestResults::from_finish(&event);
        info!(
            wpm = results.wpm,
            accuracy = results.accuracy,
            errors = results.errors,
            "test finished"
        );

        let reported = match (&self.user, &self.accounts) {
            (Some(user), Some(client)) => {
                AccountReporter::new(client, &user.username).report(&results)
            }
            _ => self.guest.report(&results),
        };
        if let Err(err) = reported {
            warn!(error = %err, "could not record results");
        }

        self.results = Some(results);
        self.state = AppState::Results;
    }

    fn open_account(&mut self) {
        self.return_to = self.state;
        self.state = AppState::Account;
        if !self.accounts_enabled() {
            self.form.message = Some((
                MessageKind::Error,
                "Account service is unavailable".to_string(),
            ));
        }
    }

    fn close_account(&mut self) {
        self.state = self.return_to;
    }

    fn submit_account(&mut self, request: AccountRequest) {
        let sent = match &self.accounts {
            Some(client) => client.send(request),
            None => Err(AccountError::ServiceUnavailable),
        };
        if let Err(err) = sent {
            warn!(error = %err, "account request not sent");
            self.form.busy = false;
            self.form.message = Some((
                MessageKind::Error,
                "Account service is unavailable".to_string(),
            ));
        }
    }

    fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!(username = %user.username, "signed out");
        }
        if let Some(profile) = &self.profile {
            if let Err(err) = profile.clear() {
                warn!(error = %err, "could not remove saved session");
            }
        }
        self.form.reset();
        self.notice = Some("Signed out".to_string());
        self.close_account();
    }

    fn remember(&self, user: &UserRecord) {
        if let Some(profile) = &self.profile {
            if let Err(err) = profile.save(user) {
                warn!(error = %err, "could not save session");
            }
        }
    }

    fn on_account_response(&mut self, response: AccountResponse) {
        match response {
            AccountResponse::LoggedIn(result) => {
                self.form.busy = false;
                match result {
                    Ok(user) => {
                        info!(username = %user.username, "signed in");
                        self.remember(&user);
                        self.notice = Some(format!("Welcome back, {}!", user.name));
                        self.user = Some(user);
                        self.form.reset();
                        if self.state == AppState::Account {
                            self.close_account();
                        }
                    }
                    Err(err) => {
                        self.form.message = Some((MessageKind::Error, err.to_string()));
                    }
                }
            }
            AccountResponse::SignedUp { username, result } => {
                self.form.busy = false;
                match result {
                    Ok(()) => {
                        info!(%username, "account created");
                        self.form.clear_signup();
                        self.form.show_login();
                        self.form.set_value(Field::LoginUsername, &username);
                        self.form.message = Some((
                            MessageKind::Success,
                            "Account created successfully! Please sign in with your new account."
                                .to_string(),
                        ));
                    }
                    Err(AccountError::UsernameTaken) => {
                        self.form
                            .errors
                            .insert(Field::Username, "Username is already taken".to_string());
                    }
                    Err(err) => {
                        self.form.message = Some((MessageKind::Error, err.to_string()));
                    }
                }
            }
            AccountResponse::UsernameChecked { ticket, result, .. } => {
                self.form.username_check.apply(ticket, &result);
            }
            AccountResponse::StatsUpdated(Ok(updated)) => {
                let current = self.user.as_ref().map(|u| u.username.as_str());
                if current == Some(updated.username.as_str()) {
                    self.remember(&updated);
                    self.user = Some(updated);
                }
            }
            AccountResponse::StatsUpdated(Err(err)) => {
                warn!(error = %err, "stats update failed");
            }
        }
    }
}
