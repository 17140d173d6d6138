use log::{info, warn};
use crate::account::{Account, Identity, LoginAttempt};
use crate::error::{BankError, Result};
use crate::store::AccountStore;

/// Who is operating the terminal. At most one account is logged in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    LoggedOut,
    LoggedIn(Identity),
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, Session::LoggedIn(_))
    }

    /// Checks the password of `identity` and opens a session on success.
    /// Failed attempts are counted on the account, so the store must be
    /// saved afterwards whatever the outcome.
    pub fn login(store: &mut AccountStore, identity: &str, password: &str) -> Result<Session> {
        let account = store.find_mut(identity)?;
        match account.attempt_login(password)? {
            LoginAttempt::Accepted => {
                info!("Account {} logged in", identity);
                Ok(Session::LoggedIn(identity.to_string()))
            }
            LoginAttempt::Rejected => {
                warn!("Wrong password for account {} ({} failed attempts)", identity, account.failed_logins());
                Err(BankError::InvalidCredentials)
            }
            LoginAttempt::Locked => {
                warn!("Account {} locked after {} failed attempts", identity, account.failed_logins());
                Err(BankError::AccountLocked)
            }
        }
    }

    pub fn logout(self) -> Session {
        if let Session::LoggedIn(identity) = &self {
            info!("Account {} logged out", identity);
        }
        Session::LoggedOut
    }

    pub fn account<'a>(&self, store: &'a AccountStore) -> Result<&'a Account> {
        match self {
            Session::LoggedIn(identity) => store.find(identity),
            Session::LoggedOut => Err(BankError::NotLoggedIn),
        }
    }

    pub fn account_mut<'a>(&self, store: &'a mut AccountStore) -> Result<&'a mut Account> {
        match self {
            Session::LoggedIn(identity) => store.find_mut(identity),
            Session::LoggedOut => Err(BankError::NotLoggedIn),
        }
    }
}
