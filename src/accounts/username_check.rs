use std::time::{Duration, Instant};

use super::{validate_username, AccountError, USERNAME_MIN_LEN};

pub const DEFAULT_CHECK_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Unknown,
    Invalid(String),
    Checking,
    Available,
    Taken,
    Failed,
}

impl Availability {
    pub fn message(&self) -> &str {
        match self {
            Availability::Unknown => "",
            Availability::Invalid(reason) => reason,
            Availability::Checking => "Checking availability...",
            Availability::Available => "Username is available",
            Availability::Taken => "Username is unavailable",
            Availability::Failed => "Error checking availability",
        }
    }
}

/// Delayed, single-flight username availability lookup.
///
/// Every edit supersedes whatever was scheduled or in flight and restarts the
/// delay. Once the delay elapses [`UsernameCheck::due`] hands out one ticket;
/// an answer is applied only if it carries the latest ticket.
#[derive(Debug, Clone)]
pub struct UsernameCheck {
    delay: Duration,
    latest: u64,
    scheduled: Option<(String, Instant)>,
    state: Availability,
}

impl Default for UsernameCheck {
    fn default() -> Self {
        Self::new(DEFAULT_CHECK_DELAY)
    }
}

impl UsernameCheck {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            latest: 0,
            scheduled: None,
            state: Availability::Unknown,
        }
    }

    pub fn state(&self) -> &Availability {
        &self.state
    }

    pub fn is_available(&self) -> bool {
        self.state == Availability::Available
    }

    pub fn input_changed(&mut self, username: &str, now: Instant) {
        self.latest += 1;
        self.scheduled = None;

        if username.chars().count() < USERNAME_MIN_LEN {
            self.state = Availability::Unknown;
            return;
        }
        if let Err(err) = validate_username(username) {
            self.state = Availability::Invalid(err.to_string());
            return;
        }

        self.state = Availability::Checking;
        self.scheduled = Some((username.to_string(), now + self.delay));
    }

    /// Ticket and username to look up, once the delay has elapsed.
    pub fn due(&mut self, now: Instant) -> Option<(u64, String)> {
        let ready = matches!(&self.scheduled, Some((_, deadline)) if *deadline <= now);
        if !ready {
            return None;
        }
        let ticket = self.latest;
        self.scheduled.take().map(|(username, _)| (ticket, username))
    }

    /// Applies an answer; returns false when the answer was superseded.
    pub fn apply(&mut self, ticket: u64, result: &Result<bool, AccountError>) -> bool {
        if ticket != self.latest {
            return false;
        }
        self.state = match result {
            Ok(true) => Availability::Available,
            Ok(false) => Availability::Taken,
            Err(_) => Availability::Failed,
        };
        true
    }

    pub fn reset(&mut self) {
        self.latest += 1;
        self.scheduled = None;
        self.state = Availability::Unknown;
    }
}
