use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use super::{AccountError, AccountStore, Credentials, SignupRequest, UserRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountRequest {
    Signup(SignupRequest),
    Login(Credentials),
    CheckUsername { ticket: u64, username: String },
    UpdateStats { username: String, wpm: u32, accuracy: u8 },
}

#[derive(Debug)]
pub enum AccountResponse {
    SignedUp {
        username: String,
        result: Result<(), AccountError>,
    },
    LoggedIn(Result<UserRecord, AccountError>),
    UsernameChecked {
        ticket: u64,
        username: String,
        result: Result<bool, AccountError>,
    },
    StatsUpdated(Result<UserRecord, AccountError>),
}

/// Handle to the account worker thread, which owns the store.
///
/// Requests are queued and answered in order; the UI thread picks answers
/// up with [`AccountClient::try_recv`] and never waits on the database.
pub struct AccountClient {
    tx: Sender<AccountRequest>,
    rx: Receiver<AccountResponse>,
}

impl AccountClient {
    pub fn spawn(mut store: AccountStore) -> Self {
        let (req_tx, req_rx) = mpsc::channel::<AccountRequest>();
        let (resp_tx, resp_rx) = mpsc::channel();

        thread::spawn(move || {
            for request in req_rx {
                let response = handle(&mut store, request);
                if resp_tx.send(response).is_err() {
                    break;
                }
            }
            debug!("account worker stopped");
        });

        Self {
            tx: req_tx,
            rx: resp_rx,
        }
    }

    pub fn send(&self, request: AccountRequest) -> Result<(), AccountError> {
        self.tx
            .send(request)
            .map_err(|_| AccountError::ServiceUnavailable)
    }

    pub fn try_recv(&self) -> Option<AccountResponse> {
        self.rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<AccountResponse> {
        match self.rx.recv_timeout(timeout) {
            Ok(response) => Some(response),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

fn handle(store: &mut AccountStore, request: AccountRequest) -> AccountResponse {
    match request {
        AccountRequest::Signup(req) => {
            let result = store.signup(&req);
            if let Err(err) = &result {
                warn!(username = %req.username, error = %err, "signup failed");
            }
            AccountResponse::SignedUp {
                username: req.username,
                result,
            }
        }
        AccountRequest::Login(creds) => {
            let result = store.login(&creds);
            if let Err(err) = &result {
                warn!(username = %creds.username, error = %err, "login failed");
            }
            AccountResponse::LoggedIn(result)
        }
        AccountRequest::CheckUsername { ticket, username } => {
            let result = store.is_username_available(&username);
            debug!(ticket, %username, ?result, "username checked");
            AccountResponse::UsernameChecked {
                ticket,
                username,
                result,
            }
        }
        AccountRequest::UpdateStats {
            username,
            wpm,
            accuracy,
        } => AccountResponse::StatsUpdated(store.update_stats(&username, wpm, accuracy)),
    }
}
