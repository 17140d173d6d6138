use log::trace;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use crate::error::{BankError, Result};

pub type Identity = String;

pub const DEFAULT_WITHDRAWAL_LIMIT: Decimal = Decimal::from_parts(500, 0, 0, false, 0);
pub const DEFAULT_MAX_WITHDRAWALS: u32 = 3;
pub const MAX_FAILED_LOGINS: u32 = 3;
pub const NO_MOVEMENTS: &str = "No movements.";

/// Amounts carry at most cents.
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;
/// Largest amount accepted for a single operation: 999,999,999.99.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(99_999_999_999u64 as u32, (99_999_999_999u64 >> 32) as u32, 0, false, 2);
/// Largest balance an account may hold: 9,999,999,999,999.99. Fifteen
/// significant digits, so the balance survives the float in the data file.
pub const MAX_BALANCE: Decimal = Decimal::from_parts(999_999_999_999_999u64 as u32, (999_999_999_999_999u64 >> 32) as u32, 0, false, 2);

/// Limits applied to every withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalPolicy {
    pub limit_per_transaction: Decimal,
    pub max_withdrawals: u32,
}

impl Default for WithdrawalPolicy {
    fn default() -> Self {
        WithdrawalPolicy {
            limit_per_transaction: DEFAULT_WITHDRAWAL_LIMIT,
            max_withdrawals: DEFAULT_MAX_WITHDRAWALS,
        }
    }
}

/// Outcome of a password check against an account.
#[derive(Debug, PartialEq, Eq)]
pub enum LoginAttempt {
    Accepted,
    Rejected,
    /// The rejected attempt that locked the account.
    Locked,
}

/// A single bank account as it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "nome")]
    name: String,
    #[serde(rename = "endereco")]
    address: String,
    #[serde(rename = "cpf")]
    identity: Identity,
    #[serde(rename = "senha")]
    password: String,
    #[serde(
        rename = "saldo",
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "deserialize_balance"
    )]
    balance: Decimal,
    #[serde(rename = "extrato")]
    statement: String,
    #[serde(rename = "numero_saques")]
    withdrawals: u32,
    #[serde(rename = "bloqueado")]
    locked: bool,
    #[serde(rename = "tentativas_erradas")]
    failed_logins: u32,
    #[serde(rename = "agencia")]
    branch: String,
    #[serde(rename = "numero_conta")]
    account_number: String,
}

fn deserialize_balance<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Decimal, D::Error> {
    let balance = rust_decimal::serde::float::deserialize(deserializer)?;
    if balance < Decimal::ZERO {
        return Err(serde::de::Error::custom(format!("negative balance {}", balance)));
    }
    Ok(balance)
}

impl Account {
    pub fn new(
        identity: Identity,
        name: String,
        address: String,
        password: String,
        branch: String,
        account_number: String,
    ) -> Self {
        Account {
            name,
            address,
            identity,
            password,
            balance: Decimal::ZERO,
            statement: String::new(),
            withdrawals: 0,
            locked: false,
            failed_logins: 0,
            branch,
            account_number,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn withdrawals(&self) -> u32 {
        self.withdrawals
    }

    pub fn failed_logins(&self) -> u32 {
        self.failed_logins
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// The accumulated statement, or the no-movements marker when empty.
    pub fn statement(&self) -> &str {
        if self.statement.is_empty() {
            NO_MOVEMENTS
        } else {
            &self.statement
        }
    }

    /// The only place a candidate password is compared with the stored one.
    #[inline]
    pub fn verify_password(&self, candidate: &str) -> bool {
        self.password == candidate
    }

    /// Records a login attempt. Locked accounts reject every attempt.
    pub fn attempt_login(&mut self, password: &str) -> Result<LoginAttempt> {
        if self.locked {
            return Err(BankError::AccountLocked);
        }
        if self.verify_password(password) {
            self.failed_logins = 0;
            return Ok(LoginAttempt::Accepted);
        }
        self.failed_logins += 1;
        if self.failed_logins >= MAX_FAILED_LOGINS {
            self.locked = true;
            return Ok(LoginAttempt::Locked);
        }
        Ok(LoginAttempt::Rejected)
    }

    /// Sets a new password and clears the lockout.
    pub fn recover(&mut self, new_password: String) {
        self.password = new_password;
        self.failed_logins = 0;
        self.locked = false;
    }

    #[inline]
    pub fn deposit(&mut self, amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            trace!("Account {} rejected deposit of {}", self.identity, amount);
            return Err(BankError::InvalidAmount);
        }
        let Some(balance) = self.balance.checked_add(amount).filter(|balance| *balance <= MAX_BALANCE) else {
            trace!("Account {} rejected deposit of {}: balance would exceed {}", self.identity, amount, MAX_BALANCE);
            return Err(BankError::InvalidAmount);
        };
        self.balance = balance;
        self.statement.push_str(&format!("Deposit: R$ {:.2}\n", amount));
        Ok(())
    }

    /// Checks run in a fixed order and the first failing one is reported.
    #[inline]
    pub fn withdraw(&mut self, amount: Decimal, policy: &WithdrawalPolicy) -> Result<()> {
        let rejection = if amount > self.balance {
            Some(BankError::InsufficientFunds)
        } else if amount > policy.limit_per_transaction {
            Some(BankError::LimitExceeded)
        } else if self.withdrawals >= policy.max_withdrawals {
            Some(BankError::DailyCountExceeded)
        } else if amount <= Decimal::ZERO {
            Some(BankError::InvalidAmount)
        } else {
            None
        };
        if let Some(error) = rejection {
            trace!("Account {} rejected withdrawal of {}: {:?}. Balance: {}", self.identity, amount, error, self.balance);
            return Err(error);
        }

        self.balance -= amount;
        self.withdrawals += 1;
        self.statement.push_str(&format!("Withdrawal: R$ {:.2}\n", amount));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(amount: &str) -> Decimal {
        amount.parse().unwrap()
    }

    fn account() -> Account {
        Account::new(
            "111".to_string(),
            "Ana".to_string(),
            "Rua A, 1".to_string(),
            "1234".to_string(),
            "0001".to_string(),
            "123456".to_string(),
        )
    }

    #[test]
    fn test_deposit_valid() {
        let mut account = account();
        account.deposit(d("200")).unwrap();

        assert_eq!(account.balance(), d("200"));
        assert_eq!(format!("{:.2}", account.balance()), "200.00");
        assert_eq!(account.statement(), "Deposit: R$ 200.00\n");
    }

    #[test]
    fn test_deposit_non_positive() {
        let mut account = account();
        assert!(matches!(account.deposit(d("0")), Err(BankError::InvalidAmount)));
        assert!(matches!(account.deposit(d("-10")), Err(BankError::InvalidAmount)));

        assert_eq!(account.balance(), Decimal::ZERO);
        assert_eq!(account.statement(), NO_MOVEMENTS);
    }

    #[test]
    fn test_withdraw_insufficient_before_limit() {
        let mut account = account();
        account.deposit(d("200")).unwrap();

        let result = account.withdraw(d("600"), &WithdrawalPolicy::default());
        assert!(matches!(result, Err(BankError::InsufficientFunds)));
        assert_eq!(account.balance(), d("200"));
        assert_eq!(account.withdrawals(), 0);
    }

    #[test]
    fn test_withdraw_over_limit() {
        let mut account = account();
        account.deposit(d("2000")).unwrap();

        let result = account.withdraw(d("500.01"), &WithdrawalPolicy::default());
        assert!(matches!(result, Err(BankError::LimitExceeded)));
        assert_eq!(account.balance(), d("2000"));
    }

    #[test]
    fn test_withdraw_count_exceeded() {
        let mut account = account();
        account.deposit(d("2000")).unwrap();
        let policy = WithdrawalPolicy::default();

        for _ in 0..3 {
            account.withdraw(d("500"), &policy).unwrap();
        }
        assert_eq!(account.balance(), d("500"));

        let result = account.withdraw(d("1"), &policy);
        assert!(matches!(result, Err(BankError::DailyCountExceeded)));
        assert_eq!(account.balance(), d("500"));
        assert_eq!(account.withdrawals(), 3);
    }

    #[test]
    fn test_withdraw_count_checked_before_positivity() {
        let mut account = account();
        account.deposit(d("100")).unwrap();
        let policy = WithdrawalPolicy { limit_per_transaction: d("500"), max_withdrawals: 0 };

        let result = account.withdraw(d("-5"), &policy);
        assert!(matches!(result, Err(BankError::DailyCountExceeded)));
    }

    #[test]
    fn test_withdraw_non_positive() {
        let mut account = account();
        account.deposit(d("100")).unwrap();

        assert!(matches!(account.withdraw(d("0"), &WithdrawalPolicy::default()), Err(BankError::InvalidAmount)));
        assert!(matches!(account.withdraw(d("-5"), &WithdrawalPolicy::default()), Err(BankError::InvalidAmount)));
        assert_eq!(account.balance(), d("100"));
        assert_eq!(account.statement(), "Deposit: R$ 100.00\n");
    }

    #[test]
    fn test_withdraw_valid_appends_statement() {
        let mut account = account();
        account.deposit(d("100")).unwrap();
        account.withdraw(d("40.5"), &WithdrawalPolicy::default()).unwrap();

        assert_eq!(account.balance(), d("59.5"));
        assert_eq!(account.withdrawals(), 1);
        assert_eq!(account.statement(), "Deposit: R$ 100.00\nWithdrawal: R$ 40.50\n");
    }

    #[test]
    fn test_deposit_maximum_twice() {
        let mut account = account();
        assert!(matches!(account.deposit(Decimal::MAX), Err(BankError::InvalidAmount)));
        assert!(matches!(account.deposit(Decimal::MAX), Err(BankError::InvalidAmount)));
        assert_eq!(account.balance(), Decimal::ZERO);
        assert_eq!(account.statement(), NO_MOVEMENTS);

        account.deposit(MAX_AMOUNT).unwrap();
        account.deposit(MAX_AMOUNT).unwrap();
        assert_eq!(account.balance(), d("1999999999.98"));
    }

    #[test]
    fn test_deposit_beyond_balance_ceiling() {
        let mut account = account();
        account.balance = MAX_BALANCE - d("0.01");
        account.deposit(d("0.01")).unwrap();
        assert_eq!(account.balance(), MAX_BALANCE);

        assert!(matches!(account.deposit(d("0.01")), Err(BankError::InvalidAmount)));
        assert_eq!(account.balance(), MAX_BALANCE);
        assert_eq!(account.statement(), "Deposit: R$ 0.01\n");
    }

    #[test]
    fn test_withdraw_whole_balance_at_limit() {
        let mut account = account();
        account.deposit(d("500")).unwrap();

        account.withdraw(d("500"), &WithdrawalPolicy::default()).unwrap();
        assert_eq!(account.balance(), Decimal::ZERO);
        assert_eq!(account.withdrawals(), 1);
    }

    #[test]
    fn test_ceilings() {
        assert_eq!(MAX_AMOUNT, d("999999999.99"));
        assert_eq!(MAX_BALANCE, d("9999999999999.99"));
    }

    #[test]
    fn test_load_rejects_negative_balance() {
        let mut value = serde_json::to_value(account()).unwrap();
        value["saldo"] = serde_json::json!(-5.0);

        let error = serde_json::from_value::<Account>(value).unwrap_err();
        assert!(error.to_string().contains("negative balance"));
    }

    #[test]
    fn test_balance_never_negative() {
        let mut account = account();
        let policy = WithdrawalPolicy { limit_per_transaction: d("1000"), max_withdrawals: 100 };
        let amounts = [d("50"), d("-20"), d("80"), d("0"), d("300"), d("10")];

        for (i, amount) in amounts.iter().cycle().take(30).enumerate() {
            if i % 2 == 0 {
                let _ = account.deposit(*amount);
            } else {
                let _ = account.withdraw(*amount, &policy);
            }
            assert!(account.balance() >= Decimal::ZERO);
        }
    }

    #[test]
    fn test_three_failures_lock() {
        let mut account = account();
        assert_eq!(account.attempt_login("bad").unwrap(), LoginAttempt::Rejected);
        assert_eq!(account.attempt_login("bad").unwrap(), LoginAttempt::Rejected);
        assert_eq!(account.attempt_login("bad").unwrap(), LoginAttempt::Locked);
        assert!(account.is_locked());

        assert!(matches!(account.attempt_login("1234"), Err(BankError::AccountLocked)));
        assert_eq!(account.failed_logins(), 3);
    }

    #[test]
    fn test_successful_login_resets_failures() {
        let mut account = account();
        account.attempt_login("bad").unwrap();
        account.attempt_login("bad").unwrap();
        assert_eq!(account.attempt_login("1234").unwrap(), LoginAttempt::Accepted);
        assert_eq!(account.failed_logins(), 0);

        assert_eq!(account.attempt_login("bad").unwrap(), LoginAttempt::Rejected);
        assert!(!account.is_locked());
    }

    #[test]
    fn test_recover_unlocks() {
        let mut account = account();
        for _ in 0..3 {
            account.attempt_login("bad").unwrap();
        }
        account.recover("9999".to_string());

        assert!(!account.is_locked());
        assert_eq!(account.failed_logins(), 0);
        assert!(!account.verify_password("1234"));
        assert_eq!(account.attempt_login("9999").unwrap(), LoginAttempt::Accepted);
    }
}
