use std::path::PathBuf;
use clap::Parser;
use rust_decimal::Decimal;
use crate::account::{WithdrawalPolicy, DEFAULT_MAX_WITHDRAWALS, DEFAULT_WITHDRAWAL_LIMIT};
use crate::store::DEFAULT_BRANCH;

/// Interactive terminal for a single bank branch.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct BankConfig {
    /// JSON file holding every account of the branch
    #[arg(long, default_value = "contas_bancarias.json")]
    pub data_file: PathBuf,

    /// Branch code given to new accounts
    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Largest amount a single withdrawal may take
    #[arg(long, default_value_t = DEFAULT_WITHDRAWAL_LIMIT)]
    pub withdrawal_limit: Decimal,

    /// Number of withdrawals an account may ever make
    #[arg(long, default_value_t = DEFAULT_MAX_WITHDRAWALS)]
    pub max_withdrawals: u32,
}

impl BankConfig {
    pub fn withdrawal_policy(&self) -> WithdrawalPolicy {
        WithdrawalPolicy {
            limit_per_transaction: self.withdrawal_limit,
            max_withdrawals: self.max_withdrawals,
        }
    }
}
