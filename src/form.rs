use std::collections::HashMap;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::accounts::{
    validate_email, validate_name, validate_password, AccountRequest, Credentials,
    SignupRequest, UsernameCheck, USERNAME_MAX_LEN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Login,
    Signup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Field {
    #[strum(to_string = "Username")]
    LoginUsername,
    #[strum(to_string = "Password")]
    LoginPassword,
    #[strum(to_string = "Full name")]
    Name,
    #[strum(to_string = "Email")]
    Email,
    #[strum(to_string = "Username")]
    Username,
    #[strum(to_string = "Password")]
    Password,
    #[strum(to_string = "Confirm password")]
    ConfirmPassword,
}

impl Field {
    pub fn is_secret(&self) -> bool {
        matches!(
            self,
            Field::LoginPassword | Field::Password | Field::ConfirmPassword
        )
    }
}

const LOGIN_FIELDS: [Field; 2] = [Field::LoginUsername, Field::LoginPassword];
const SIGNUP_FIELDS: [Field; 5] = [
    Field::Name,
    Field::Email,
    Field::Username,
    Field::Password,
    Field::ConfirmPassword,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Error,
}

/// What the app should do after the form consumed a key.
#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    None,
    Close,
    Submit(AccountRequest),
    Logout,
}

/// Login / signup form state.
#[derive(Debug, Clone)]
pub struct AccountForm {
    pub mode: FormMode,
    focus: usize,
    values: HashMap<Field, String>,
    pub errors: HashMap<Field, String>,
    pub message: Option<(MessageKind, String)>,
    pub username_check: UsernameCheck,
    pub busy: bool,
}

impl AccountForm {
    pub fn new(username_check: UsernameCheck) -> Self {
        Self {
            mode: FormMode::Login,
            focus: 0,
            values: HashMap::new(),
            errors: HashMap::new(),
            message: None,
            username_check,
            busy: false,
        }
    }

    pub fn fields(&self) -> &'static [Field] {
        match self.mode {
            FormMode::Login => &LOGIN_FIELDS,
            FormMode::Signup => &SIGNUP_FIELDS,
        }
    }

    pub fn focused(&self) -> Field {
        self.fields()[self.focus]
    }

    pub fn value(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn set_value(&mut self, field: Field, value: &str) {
        self.values.insert(field, value.to_string());
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            FormMode::Login => FormMode::Signup,
            FormMode::Signup => FormMode::Login,
        };
        self.focus = 0;
        self.errors.clear();
        self.message = None;
    }

    pub fn show_login(&mut self) {
        if self.mode != FormMode::Login {
            self.toggle_mode();
        }
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields().len();
    }

    pub fn prev_field(&mut self) {
        let len = self.fields().len();
        self.focus = (self.focus + len - 1) % len;
    }

    /// Clears every value and message.
    pub fn reset(&mut self) {
        self.mode = FormMode::Login;
        self.focus = 0;
        self.values.clear();
        self.errors.clear();
        self.message = None;
        self.username_check.reset();
        self.busy = false;
    }

    pub fn clear_signup(&mut self) {
        for field in SIGNUP_FIELDS {
            self.values.remove(&field);
        }
        self.username_check.reset();
    }

    fn edit(&mut self, now: Instant, apply: impl FnOnce(&mut String)) {
        let field = self.focused();
        let value = self.values.entry(field).or_default();
        apply(value);
        if field == Field::LoginUsername && value.chars().count() > USERNAME_MAX_LEN {
            value.pop();
        }
        let value = value.clone();

        self.errors.remove(&field);
        self.message = None;
        if field == Field::Username {
            self.username_check.input_changed(&value, now);
        }
    }

    pub fn input_char(&mut self, c: char, now: Instant) {
        self.edit(now, |value| value.push(c));
    }

    pub fn backspace(&mut self, now: Instant) {
        self.edit(now, |value| {
            value.pop();
        });
    }

    pub fn validate_login(&mut self) -> Option<Credentials> {
        self.errors.clear();
        let username = self.value(Field::LoginUsername).to_string();
        let password = self.value(Field::LoginPassword).to_string();

        if username.trim().is_empty() {
            self.errors
                .insert(Field::LoginUsername, "Please enter your username".to_string());
        } else if username.chars().count() > USERNAME_MAX_LEN {
            self.errors
                .insert(Field::LoginUsername, "Username is too long".to_string());
        }
        if password.is_empty() {
            self.errors
                .insert(Field::LoginPassword, "Please enter your password".to_string());
        }

        self.errors
            .is_empty()
            .then_some(Credentials { username, password })
    }

    pub fn validate_signup(&mut self) -> Option<SignupRequest> {
        self.errors.clear();
        let request = SignupRequest {
            username: self.value(Field::Username).to_string(),
            email: self.value(Field::Email).to_string(),
            password: self.value(Field::Password).to_string(),
            name: self.value(Field::Name).to_string(),
        };

        if let Err(err) = validate_name(&request.name) {
            self.errors.insert(Field::Name, err.to_string());
        }
        if let Err(err) = validate_email(&request.email) {
            self.errors.insert(Field::Email, err.to_string());
        }
        if request.username.trim().is_empty() {
            self.errors
                .insert(Field::Username, "Please enter a username".to_string());
        } else if !self.username_check.is_available() {
            self.errors.insert(
                Field::Username,
                "Please ensure username is available".to_string(),
            );
        }
        if let Err(err) = validate_password(&request.password) {
            self.errors.insert(Field::Password, err.to_string());
        }
        let confirm = self.value(Field::ConfirmPassword).to_string();
        if confirm.is_empty() {
            self.errors.insert(
                Field::ConfirmPassword,
                "Please confirm your password".to_string(),
            );
        } else if confirm != request.password {
            self.errors
                .insert(Field::ConfirmPassword, "Passwords do not match".to_string());
        }

        self.errors.is_empty().then_some(request)
    }

    pub fn submit(&mut self) -> Option<AccountRequest> {
        if self.busy {
            return None;
        }
        let request = match self.mode {
            FormMode::Login => self.validate_login().map(AccountRequest::Login),
            FormMode::Signup => self.validate_signup().map(AccountRequest::Signup),
        }?;
        self.busy = true;
        self.message = Some((
            MessageKind::Info,
            match self.mode {
                FormMode::Login => "Signing in...".to_string(),
                FormMode::Signup => "Creating account...".to_string(),
            },
        ));
        Some(request)
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant, signed_in: bool) -> FormAction {
        if key.code == KeyCode::Esc {
            return FormAction::Close;
        }
        if signed_in {
            return match key.code {
                KeyCode::Char('o') => FormAction::Logout,
                _ => FormAction::None,
            };
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down => self.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.prev_field(),
            KeyCode::F(2) => self.toggle_mode(),
            KeyCode::Enter => {
                if let Some(request) = self.submit() {
                    return FormAction::Submit(request);
                }
            }
            KeyCode::Backspace => self.backspace(now),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input_char(c, now)
            }
            _ => {}
        }
        FormAction::None
    }
}
