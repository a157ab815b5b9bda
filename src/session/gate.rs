use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::{Identity, is_plausible_email};
use crate::io::recovery::atomic_write;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Error type for authentication requests. Messages are shown to the user as-is.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("password should be at least 6 characters")]
    WeakPassword,
    #[error("user already registered: {0}")]
    AlreadyRegistered(String),
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("could not access {path}: {source}")]
    StorageError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not encode session data: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A change in who is signed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Identity),
    SignedOut,
}

pub type SessionListener = Box<dyn FnMut(&SessionEvent)>;

/// The boundary to whatever authenticates users.
///
/// Nothing behind this trait touches category data; callers react to
/// `SessionEvent`s by loading or discarding their snapshot.
pub trait SessionGate {
    fn current_user(&self) -> Option<Identity>;

    /// Register a callback fired after every sign-in and sign-out.
    fn on_session_change(&mut self, listener: SessionListener);

    fn sign_in(&mut self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Create an account and sign it in.
    fn sign_up(&mut self, name: &str, email: &str, password: &str)
    -> Result<Identity, AuthError>;

    fn sign_out(&mut self) -> Result<(), AuthError>;
}

// ---------------------------------------------------------------------------
// Local gate
// ---------------------------------------------------------------------------

/// Account data as stored by the local gate. Richer than `Identity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccountRecord {
    full_name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl AccountRecord {
    fn identity(&self) -> Identity {
        Identity::new(&self.full_name, &self.email)
    }

    fn matches(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AccountBook {
    #[serde(default)]
    accounts: Vec<AccountRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActiveSession {
    email: String,
    signed_in_at: DateTime<Utc>,
}

/// A single-machine gate backed by `accounts.json` and `.session.json` in
/// the data directory.
///
/// It checks the shape of credentials and that the account exists, but it
/// holds no secrets: passwords are validated for length and then discarded.
pub struct LocalSessionGate {
    data_dir: PathBuf,
    accounts: AccountBook,
    current: Option<Identity>,
    listeners: Vec<SessionListener>,
}

impl LocalSessionGate {
    /// Open the gate, restoring a previous sign-in if its account still exists.
    /// Missing or malformed files are treated as empty.
    pub fn open(data_dir: &Path) -> Self {
        let accounts: AccountBook = read_json(&data_dir.join("accounts.json")).unwrap_or_default();
        let current = read_json::<ActiveSession>(&data_dir.join(".session.json")).and_then(|s| {
            accounts
                .accounts
                .iter()
                .find(|a| a.matches(&s.email))
                .map(AccountRecord::identity)
        });
        LocalSessionGate {
            data_dir: data_dir.to_path_buf(),
            accounts,
            current,
            listeners: Vec::new(),
        }
    }

    fn accounts_path(&self) -> PathBuf {
        self.data_dir.join("accounts.json")
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(".session.json")
    }

    fn activate(&mut self, identity: Identity) -> Result<Identity, AuthError> {
        let active = ActiveSession {
            email: identity.email.clone(),
            signed_in_at: Utc::now(),
        };
        write_json(&self.data_dir, &self.session_path(), &active)?;
        self.current = Some(identity.clone());
        log::info!("event=sign_in module=session status=ok");
        self.emit(&SessionEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    fn emit(&mut self, event: &SessionEvent) {
        for listener in self.listeners.iter_mut() {
            listener(event);
        }
    }
}

impl SessionGate for LocalSessionGate {
    fn current_user(&self) -> Option<Identity> {
        self.current.clone()
    }

    fn on_session_change(&mut self, listener: SessionListener) {
        self.listeners.push(listener);
    }

    fn sign_in(&mut self, email: &str, password: &str) -> Result<Identity, AuthError> {
        validate_credentials(email, password)?;
        let identity = self
            .accounts
            .accounts
            .iter()
            .find(|a| a.matches(email))
            .map(AccountRecord::identity)
            .ok_or_else(|| {
                log::warn!("event=sign_in module=session status=rejected");
                AuthError::InvalidCredentials
            })?;
        self.activate(identity)
    }

    fn sign_up(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        validate_credentials(email, password)?;
        if self.accounts.accounts.iter().any(|a| a.matches(email)) {
            return Err(AuthError::AlreadyRegistered(email.trim().to_string()));
        }

        let record = AccountRecord {
            full_name: name.trim().to_string(),
            email: email.trim().to_string(),
            created_at: Utc::now(),
        };
        let mut book = self.accounts.clone();
        book.accounts.push(record.clone());
        write_json(&self.data_dir, &self.accounts_path(), &book)?;
        self.accounts = book;
        log::info!("event=sign_up module=session status=ok");

        self.activate(record.identity())
    }

    fn sign_out(&mut self) -> Result<(), AuthError> {
        let path = self.session_path();
        if path.exists() {
            fs::remove_file(&path).map_err(|source| AuthError::StorageError { path, source })?;
        }
        if self.current.take().is_some() {
            log::info!("event=sign_out module=session status=ok");
            self.emit(&SessionEvent::SignedOut);
        }
        Ok(())
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    if !is_plausible_email(email) {
        return Err(AuthError::InvalidEmail(email.trim().to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

fn write_json<T: Serialize>(data_dir: &Path, path: &Path, value: &T) -> Result<(), AuthError> {
    let content = serde_json::to_string_pretty(value)?;
    fs::create_dir_all(data_dir).map_err(|source| AuthError::StorageError {
        path: data_dir.to_path_buf(),
        source,
    })?;
    atomic_write(path, content.as_bytes()).map_err(|source| AuthError::StorageError {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[test]
    fn test_sign_up_signs_in_and_persists() {
        let tmp = TempDir::new().unwrap();
        let mut gate = LocalSessionGate::open(tmp.path());
        assert!(gate.current_user().is_none());

        let who = gate.sign_up("Ada", "ada@example.com", "secret1").unwrap();
        assert_eq!(who, Identity::new("Ada", "ada@example.com"));
        assert_eq!(gate.current_user(), Some(who.clone()));

        let reopened = LocalSessionGate::open(tmp.path());
        assert_eq!(reopened.current_user(), Some(who));
    }

    #[test]
    fn test_passwords_are_not_stored() {
        let tmp = TempDir::new().unwrap();
        let mut gate = LocalSessionGate::open(tmp.path());
        gate.sign_up("Ada", "ada@example.com", "hunter22").unwrap();
        let accounts = fs::read_to_string(tmp.path().join("accounts.json")).unwrap();
        let session = fs::read_to_string(tmp.path().join(".session.json")).unwrap();
        assert!(!accounts.contains("hunter22"));
        assert!(!session.contains("hunter22"));
    }

    #[test]
    fn test_duplicate_sign_up_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut gate = LocalSessionGate::open(tmp.path());
        gate.sign_up("Ada", "ada@example.com", "secret1").unwrap();
        let err = gate
            .sign_up("Other", "ADA@example.com", "secret2")
            .unwrap_err();
        assert!(matches!(err, AuthError::AlreadyRegistered(_)));
    }

    #[test]
    fn test_sign_in_unknown_account_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut gate = LocalSessionGate::open(tmp.path());
        let err = gate.sign_in("nobody@example.com", "secret1").unwrap_err();
        assert_eq!(err.to_string(), "invalid login credentials");
        assert!(gate.current_user().is_none());
    }

    #[test]
    fn test_credential_shape_checked() {
        let tmp = TempDir::new().unwrap();
        let mut gate = LocalSessionGate::open(tmp.path());
        assert!(matches!(
            gate.sign_up("A", "not-an-email", "secret1"),
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            gate.sign_up("A", "a@b.c", "123"),
            Err(AuthError::WeakPassword)
        ));
        assert!(!tmp.path().join("accounts.json").exists());
    }

    #[test]
    fn test_sign_out_then_sign_in() {
        let tmp = TempDir::new().unwrap();
        let mut gate = LocalSessionGate::open(tmp.path());
        gate.sign_up("Ada", "ada@example.com", "secret1").unwrap();
        gate.sign_out().unwrap();
        assert!(gate.current_user().is_none());
        assert!(LocalSessionGate::open(tmp.path()).current_user().is_none());

        let who = gate.sign_in("Ada@Example.com", "whatever").unwrap();
        assert_eq!(who.display_name, "Ada");
    }

    #[test]
    fn test_listeners_see_every_change() {
        let tmp = TempDir::new().unwrap();
        let mut gate = LocalSessionGate::open(tmp.path());
        let seen: Rc<RefCell<Vec<SessionEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        gate.on_session_change(Box::new(move |e: &SessionEvent| sink.borrow_mut().push(e.clone())));

        gate.sign_up("Ada", "ada@example.com", "secret1").unwrap();
        gate.sign_out().unwrap();
        // Signing out twice only reports once
        gate.sign_out().unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[0],
            SessionEvent::SignedIn(Identity::new("Ada", "ada@example.com"))
        );
        assert_eq!(seen[1], SessionEvent::SignedOut);
    }

    #[test]
    fn test_malformed_session_file_means_signed_out() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".session.json"), "{{{").unwrap();
        assert!(LocalSessionGate::open(tmp.path()).current_user().is_none());
    }
}
