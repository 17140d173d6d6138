use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use crate::account::{Account, Identity};
use crate::error::{BankError, Result};

pub const DEFAULT_BRANCH: &str = "0001";

/// Display summary of an account, appended once per successful
/// registration and never touched afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "endereco")]
    pub address: String,
    #[serde(rename = "cpf")]
    pub identity: Identity,
    #[serde(rename = "agencia")]
    pub branch: String,
    #[serde(rename = "numero_conta")]
    pub account_number: String,
}

impl From<&Account> for DirectoryEntry {
    fn from(account: &Account) -> Self {
        DirectoryEntry {
            name: account.name().to_string(),
            address: account.address().to_string(),
            identity: account.identity().to_string(),
            branch: account.branch().to_string(),
            account_number: account.account_number().to_string(),
        }
    }
}

/// All accounts of the branch plus the directory list, persisted together
/// as one JSON document.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountStore {
    #[serde(rename = "contas")]
    accounts: BTreeMap<Identity, Account>,
    #[serde(rename = "lista_contas")]
    directory: Vec<DirectoryEntry>,

    #[serde(skip)]
    path: PathBuf,
    #[serde(skip)]
    branch: String,
}

impl AccountStore {
    /// Create an empty store that will be saved to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        AccountStore {
            accounts: BTreeMap::new(),
            directory: Vec::new(),
            path: path.into(),
            branch: DEFAULT_BRANCH.to_string(),
        }
    }

    /// Reads the store from `path`. A missing file yields an empty store,
    /// unreadable content is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No account data at {}. Starting with an empty store.", path.display());
                return Ok(AccountStore::new(path));
            }
            Err(e) => return Err(e.into()),
        };

        let mut store: AccountStore = serde_json::from_str(&content).map_err(BankError::DeserializationError)?;
        store.path = path.to_path_buf();
        store.branch = DEFAULT_BRANCH.to_string();
        info!("Loaded {} accounts from {}", store.accounts.len(), path.display());
        Ok(store)
    }

    /// Branch code assigned to accounts registered from now on.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Rewrites the whole document.
    pub fn save(&self) -> Result<()> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer).map_err(BankError::Serialization)?;
        fs::write(&self.path, buffer)?;
        debug!("Saved {} accounts to {}", self.accounts.len(), self.path.display());
        Ok(())
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.accounts.contains_key(identity)
    }

    pub fn register(&mut self, identity: Identity, name: String, address: String, password: String) -> Result<&Account> {
        if self.contains(&identity) {
            return Err(BankError::DuplicateIdentity(identity));
        }

        let account_number = rand::thread_rng().gen_range(100_000..=999_999).to_string();
        let account = Account::new(identity.clone(), name, address, password, self.branch.clone(), account_number);
        self.directory.push(DirectoryEntry::from(&account));
        info!("Registered account {} for {}", account.account_number(), identity);

        let account = self.accounts.entry(identity).or_insert(account);
        Ok(&*account)
    }

    pub fn find(&self, identity: &str) -> Result<&Account> {
        self.accounts.get(identity).ok_or(BankError::NotFound)
    }

    pub fn find_mut(&mut self, identity: &str) -> Result<&mut Account> {
        self.accounts.get_mut(identity).ok_or(BankError::NotFound)
    }

    /// The account whose identity, name and address all match.
    pub fn find_for_recovery(&self, identity: &str, name: &str, address: &str) -> Result<&Account> {
        self.find(identity)
            .ok()
            .filter(|account| account.name() == name && account.address() == address)
            .ok_or(BankError::NotFound)
    }

    /// Sets a new password on the matching account and clears its lockout.
    pub fn recover(&mut self, identity: &str, name: &str, address: &str, new_password: String) -> Result<()> {
        self.find_for_recovery(identity, name, address)?;
        self.find_mut(identity)?.recover(new_password);
        info!("Recovered access to account {}", identity);
        Ok(())
    }

    pub fn directory(&self) -> &[DirectoryEntry] {
        &self.directory
    }
}
