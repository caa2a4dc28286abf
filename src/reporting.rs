use thiserror::Error;
use tracing::debug;

use crate::accounts::{AccountClient, AccountError, AccountRequest, UserRecord};
use crate::results::TestResults;
use crate::util::rounded_mean;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Account(#[from] AccountError),
}

/// Receives the results of every completed session.
pub trait StatsReporter {
    fn report(&mut self, results: &TestResults) -> Result<(), ReportError>;
}

/// In-memory tally for a user who has not signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestStats {
    pub races: u32,
    pub total_wpm: u64,
    pub total_accuracy: u64,
    pub best_wpm: u32,
    pub average_wpm: u32,
    pub average_accuracy: u32,
}

impl GuestStats {
    pub fn record(&mut self, wpm: u32, accuracy: u8) {
        self.races += 1;
        self.total_wpm += wpm as u64;
        self.total_accuracy += accuracy as u64;
        self.best_wpm = self.best_wpm.max(wpm);
        self.average_wpm = rounded_mean(self.total_wpm, self.races);
        self.average_accuracy = rounded_mean(self.total_accuracy, self.races);
    }
}

impl StatsReporter for GuestStats {
    fn report(&mut self, results: &TestResults) -> Result<(), ReportError> {
        self.record(results.wpm, results.accuracy);
        Ok(())
    }
}

/// Queues an update of a signed-in user's averages on the account worker.
/// The updated record comes back later as a `StatsUpdated` response.
pub struct AccountReporter<'a> {
    client: &'a AccountClient,
    username: &'a str,
}

impl<'a> AccountReporter<'a> {
    pub fn new(client: &'a AccountClient, username: &'a str) -> Self {
        Self { client, username }
    }
}

impl StatsReporter for AccountReporter<'_> {
    fn report(&mut self, results: &TestResults) -> Result<(), ReportError> {
        debug!(username = self.username, wpm = results.wpm, "queueing stats update");
        self.client.send(AccountRequest::UpdateStats {
            username: self.username.to_string(),
            wpm: results.wpm,
            accuracy: results.accuracy,
        })?;
        Ok(())
    }
}

/// Figures shown in the header, for either a user or the guest tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsView {
    pub username: String,
    pub races: u32,
    pub speed: u32,
    pub accuracy: u32,
}

impl StatsView {
    pub fn current(user: Option<&UserRecord>, guest: &GuestStats) -> Self {
        match user {
            Some(user) => Self {
                username: user.username.clone(),
                races: user.races,
                speed: user.speed,
                accuracy: user.accuracy,
            },
            None => Self {
                username: "Guest".to_string(),
                races: guest.races,
                speed: guest.average_wpm,
                accuracy: guest.average_accuracy,
            },
        }
    }
}
