use std::io::{BufRead, ErrorKind, Write};
use log::debug;
use rust_decimal::Decimal;
use crate::account::{WithdrawalPolicy, AMOUNT_DECIMAL_PLACES, MAX_AMOUNT};
use crate::error::{BankError, Result};
use crate::session::Session;
use crate::store::AccountStore;

const MAIN_MENU: &str = "
 [1] Create Account
 [2] Login
 [3] List Accounts
 [4] Recover User
 [5] Exit
 => ";

const ACCOUNT_MENU: &str = "
 [1] Deposit
 [2] Withdraw
 [3] Statement
 [4] Balance Inquiry
 [5] Logout
 => ";

const RULE: &str = "==========================================";

/// A menu choice, resolved against the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    CreateAccount,
    Login,
    ListAccounts,
    RecoverUser,
    Exit,
    Deposit,
    Withdraw,
    Statement,
    BalanceInquiry,
    Logout,
}

impl Command {
    /// Options 1 to 5 depend on the menu being shown, 6 to 8 work everywhere.
    pub fn parse(choice: &str, session: &Session) -> Option<Command> {
        let command = match (choice.trim(), session.is_logged_in()) {
            ("1", false) => Command::CreateAccount,
            ("2", false) => Command::Login,
            ("3", false) => Command::ListAccounts,
            ("4", false) => Command::RecoverUser,
            ("5", false) => Command::Exit,
            ("1", true) => Command::Deposit,
            ("2", true) => Command::Withdraw,
            ("3", true) => Command::Statement,
            ("4", true) => Command::BalanceInquiry,
            ("5", true) => Command::Logout,
            ("6", _) => Command::ListAccounts,
            ("7", _) => Command::RecoverUser,
            ("8", _) => Command::Exit,
            _ => return None,
        };
        Some(command)
    }
}

/// What the loop does after a command completes.
#[derive(Debug, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Enter(Session),
    Exit,
}

/// Reads an operator amount. Sub-cent digits and magnitudes above
/// `MAX_AMOUNT` are refused; the sign is left for the account rules.
pub fn parse_amount(input: &str) -> Result<Decimal> {
    let input = input.trim();
    let malformed = || BankError::MalformedAmount(input.to_string());
    let amount = input
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(input))
        .map_err(|_| malformed())?
        .normalize();
    if amount.scale() > AMOUNT_DECIMAL_PLACES || amount.abs() > MAX_AMOUNT {
        return Err(malformed());
    }
    Ok(amount)
}

/// The interactive front desk. Reads menu choices from `input`, writes
/// every screen to `output` and saves the store after each mutation.
pub struct Teller<R, W> {
    store: AccountStore,
    policy: WithdrawalPolicy,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Teller<R, W> {
    pub fn new(store: AccountStore, policy: WithdrawalPolicy, input: R, output: W) -> Self {
        Teller { store, policy, input, output }
    }

    pub fn into_store(self) -> AccountStore {
        self.store
    }

    /// Runs until the operator exits or input ends. Only storage and
    /// terminal failures escape the loop.
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.output, "Hello! Welcome to the Ether Central Bank!")?;
        let mut session = Session::LoggedOut;

        loop {
            let menu = if session.is_logged_in() { ACCOUNT_MENU } else { MAIN_MENU };
            let Some(choice) = self.read_line(menu)? else {
                break;
            };
            let Some(command) = Command::parse(&choice, &session) else {
                writeln!(self.output, "Invalid operation, please select the desired operation again.")?;
                continue;
            };

            match self.dispatch(&session, command) {
                Ok(Transition::Stay) => {}
                Ok(Transition::Enter(next)) => session = next,
                Ok(Transition::Exit) => break,
                Err(e) if e.is_recoverable() => {
                    debug!("{:?} failed: {:?}", command, e);
                    writeln!(self.output, "{}", e)?;
                }
                Err(e) => return Err(e),
            }
        }

        writeln!(self.output, "Exiting... See you soon!")?;
        self.output.flush()?;
        Ok(())
    }

    pub fn dispatch(&mut self, session: &Session, command: Command) -> Result<Transition> {
        match command {
            Command::CreateAccount => self.create_account(),
            Command::Login => self.login(),
            Command::ListAccounts => self.list_accounts(),
            Command::RecoverUser => self.recover_user(),
            Command::Exit => Ok(Transition::Exit),
            Command::Deposit => self.deposit(session),
            Command::Withdraw => self.withdraw(session),
            Command::Statement => self.statement(session),
            Command::BalanceInquiry => self.balance_inquiry(session),
            Command::Logout => {
                writeln!(self.output, "Logging out... See you soon!")?;
                Ok(Transition::Enter(session.clone().logout()))
            }
        }
    }

    fn create_account(&mut self) -> Result<Transition> {
        let name = self.ask("Enter your name: ")?;
        let address = self.ask("Enter your address: ")?;
        let identity = self.ask("Enter your tax id: ")?;
        if self.store.contains(&identity) {
            return Err(BankError::DuplicateIdentity(identity));
        }
        let password = self.ask("Enter your password: ")?;

        let account = self.store.register(identity, name, address, password)?;
        let (branch, number) = (account.branch().to_string(), account.account_number().to_string());
        self.store.save()?;
        writeln!(self.output, "Account registered successfully! Branch: {}, Account: {}", branch, number)?;
        Ok(Transition::Stay)
    }

    fn login(&mut self) -> Result<Transition> {
        let identity = self.ask("Enter your tax id: ")?;
        if self.store.find(&identity)?.is_locked() {
            return Err(BankError::AccountLocked);
        }
        let password = self.ask("Enter your password: ")?;

        let outcome = Session::login(&mut self.store, &identity, &password);
        self.store.save()?;
        let session = outcome?;
        let account = session.account(&self.store)?;
        writeln!(self.output, "Welcome, {}!", account.name())?;
        Ok(Transition::Enter(session))
    }

    fn list_accounts(&mut self) -> Result<Transition> {
        let directory = self.store.directory();
        if directory.is_empty() {
            writeln!(self.output, "No accounts created yet.")?;
            return Ok(Transition::Stay);
        }

        writeln!(self.output, "\n================ ACCOUNTS ================")?;
        for entry in directory {
            writeln!(
                self.output,
                "Name: {}, Address: {}, Tax id: {}, Branch: {}, Account: {}",
                entry.name, entry.address, entry.identity, entry.branch, entry.account_number
            )?;
        }
        writeln!(self.output, "{}", RULE)?;
        Ok(Transition::Stay)
    }

    fn recover_user(&mut self) -> Result<Transition> {
        let name = self.ask("Enter your name: ")?;
        let address = self.ask("Enter your address: ")?;
        let identity = self.ask("Enter your tax id: ")?;
        self.store.find_for_recovery(&identity, &name, &address)?;
        let password = self.ask("Enter a new password for your account: ")?;

        self.store.recover(&identity, &name, &address, password)?;
        self.store.save()?;
        writeln!(self.output, "User recovered successfully!")?;
        Ok(Transition::Stay)
    }

    fn deposit(&mut self, session: &Session) -> Result<Transition> {
        session.account(&self.store)?;
        let amount = parse_amount(&self.ask("Enter the deposit amount: ")?)?;

        session.account_mut(&mut self.store)?.deposit(amount)?;
        self.store.save()?;
        writeln!(self.output, "Deposit of R$ {:.2} completed.", amount)?;
        Ok(Transition::Stay)
    }

    fn withdraw(&mut self, session: &Session) -> Result<Transition> {
        session.account(&self.store)?;
        let amount = parse_amount(&self.ask("Enter the withdrawal amount: ")?)?;

        session.account_mut(&mut self.store)?.withdraw(amount, &self.policy)?;
        self.store.save()?;
        writeln!(self.output, "Withdrawal of R$ {:.2} completed.", amount)?;
        Ok(Transition::Stay)
    }

    fn statement(&mut self, session: &Session) -> Result<Transition> {
        let account = session.account(&self.store)?;
        writeln!(self.output, "\n================ STATEMENT ================")?;
        writeln!(self.output, "{}", account.statement())?;
        writeln!(self.output, "\nBalance: R$ {:.2}", account.balance())?;
        writeln!(self.output, "{}", RULE)?;
        Ok(Transition::Stay)
    }

    fn balance_inquiry(&mut self, session: &Session) -> Result<Transition> {
        let account = session.account(&self.store)?;
        writeln!(self.output, "\n================ BALANCE ================")?;
        writeln!(self.output, "Balance: R$ {:.2}", account.balance())?;
        writeln!(
            self.output,
            "Withdrawals made: {} of {}",
            account.withdrawals(),
            self.policy.max_withdrawals
        )?;
        writeln!(self.output, "{}", RULE)?;
        Ok(Transition::Stay)
    }

    /// Prompts and reads one line. `None` once input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.read_line(prompt)?
            .ok_or_else(|| std::io::Error::new(ErrorKind::UnexpectedEof, "input ended in the middle of an operation").into())
    }
}
