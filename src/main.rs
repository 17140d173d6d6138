use clap::Parser;
use log::{error, info};
use crate::config::BankConfig;
use crate::error::Result;
use crate::store::AccountStore;
use crate::teller::Teller;

mod account;
mod config;
mod error;
mod session;
mod store;
mod teller;

fn main() {
    env_logger::init();
    let config = BankConfig::parse();

    if let Err(e) = run(&config) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(config: &BankConfig) -> Result<()> {
    let store = AccountStore::load(&config.data_file)?.with_branch(config.branch.clone());

    let stdin = std::io::stdin();
    let mut teller = Teller::new(store, config.withdrawal_policy(), stdin.lock(), std::io::stdout());
    teller.run()?;

    let store = teller.into_store();
    info!("Closing with {} registered accounts", store.directory().len());
    Ok(())
}
