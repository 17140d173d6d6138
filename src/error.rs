use thiserror::Error;

#[derive(Error, Debug)]
pub enum BankError {
    #[error("Error! Tax id {0} is already registered.")]
    DuplicateIdentity(String),
    #[error("Error! Account not found.")]
    NotFound,
    #[error("Wrong password.")]
    InvalidCredentials,
    #[error("Error! User is locked after multiple wrong password attempts.")]
    AccountLocked,
    #[error("Operation failed! The amount informed is invalid.")]
    InvalidAmount,
    #[error("Operation failed! You do not have enough balance.")]
    InsufficientFunds,
    #[error("Operation failed! The withdrawal amount exceeds the limit.")]
    LimitExceeded,
    #[error("Operation failed! Maximum number of withdrawals exceeded.")]
    DailyCountExceeded,
    #[error("Operation failed! '{0}' is not a valid amount.")]
    MalformedAmount(String),
    #[error("Error! You need to log in first.")]
    NotLoggedIn,
    #[error("Failed to read account data: {0}")]
    DeserializationError(#[source] serde_json::Error),
    #[error("Failed to write account data: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BankError {
    /// Whether the teller reports this error and returns to the menu,
    /// as opposed to aborting the process.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            BankError::DeserializationError(_) | BankError::Serialization(_) | BankError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BankError>;
