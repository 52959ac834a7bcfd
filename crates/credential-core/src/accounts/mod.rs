//! Account storage.
//!
//! The credential core never owns accounts; it only needs something that can
//! find one by email and hand back its id, hash and elevated flag. Any real
//! backend (SQL, remote service) implements [`AccountStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::types::normalize_email;
use crate::{Account, Error, Result, UpdateAccountRequest};

/// Data needed to create an account; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub elevated: bool,
}

/// Account storage trait
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with [`Error::AccountAlreadyExists`] if the email is taken.
    async fn create_account(&self, account: NewAccount) -> Result<Account>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;
    async fn get_account(&self, id: u64) -> Result<Option<Account>>;
    async fn list_accounts(&self) -> Result<Vec<Account>>;
    async fn update_account(&self, id: u64, update: UpdateAccountRequest) -> Result<Account>;
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    accounts: HashMap<u64, Account>,
    by_email: HashMap<String, u64>,
}

/// In-memory account store
#[derive(Default)]
pub struct MemoryAccountStore {
    inner: RwLock<Inner>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create_account(&self, account: NewAccount) -> Result<Account> {
        let email = normalize_email(&account.email);
        let mut inner = self.inner.write();

        if inner.by_email.contains_key(&email) {
            return Err(Error::AccountAlreadyExists(email));
        }

        inner.next_id += 1;
        let id = inner.next_id;
        let account = Account {
            id,
            name: account.name,
            email: email.clone(),
            password_hash: account.password_hash,
            elevated: account.elevated,
            created_at: Utc::now(),
        };

        inner.by_email.insert(email, id);
        inner.accounts.insert(id, account.clone());
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let email = normalize_email(email);
        let inner = self.inner.read();
        Ok(inner
            .by_email
            .get(&email)
            .and_then(|id| inner.accounts.get(id))
            .cloned())
    }

    async fn get_account(&self, id: u64) -> Result<Option<Account>> {
        Ok(self.inner.read().accounts.get(&id).cloned())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let mut accounts: Vec<Account> = self.inner.read().accounts.values().cloned().collect();
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    async fn update_account(&self, id: u64, update: UpdateAccountRequest) -> Result<Account> {
        let mut inner = self.inner.write();
        let account = inner.accounts.get_mut(&id).ok_or(Error::AccountNotFound(id))?;

        if let Some(name) = update.name {
            account.name = name;
        }
        if let Some(elevated) = update.elevated {
            account.elevated = elevated;
        }

        Ok(account.clone())
    }
}
