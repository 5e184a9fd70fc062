//! Local account system: a user table and a session snapshot kept in a
//! [`KeyValueStore`].
//!
//! Two keys are used:
//! - `users`: JSON array with every registered [`User`];
//! - `currentUser`: JSON copy of the logged-in user, removed on logout.
//!
//! Every mutation re-reads `users`, changes it, and writes back the whole
//! table followed by the session snapshot. Each write is atomic on its own,
//! but the pair is not: an interrupted mutation can leave the snapshot behind
//! the table. Nothing here reconciles the two.
//!
//! ```
//! use globe_rs::identity::IdentityStore;
//! use globe_rs::models::NewUser;
//! use globe_rs::storage::MemoryStore;
//!
//! let mut ids = IdentityStore::open(MemoryStore::new())?;
//! ids.register(NewUser {
//!     name: "Ada".into(),
//!     email: "ada@example.com".into(),
//!     password: "secret1".into(),
//! })?;
//! assert!(ids.current_user().is_some());
//! # Ok::<(), globe_rs::identity::AuthError>(())
//! ```

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Country, NewUser, User};
use crate::storage::{KeyValueStore, StorageError};

pub const USERS_KEY: &str = "users";
pub const CURRENT_USER_KEY: &str = "currentUser";
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+$").expect("valid email regex"));

/// Why an identity operation was rejected. `Display` is the message shown to
/// the user.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please fill in all required fields")]
    MissingFields,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Email already in use")]
    EmailInUse,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("stored '{key}' entry is not valid JSON: {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Registration form rules: all fields present, a plausible email, and a
/// password of at least [`MIN_PASSWORD_LEN`] characters.
pub fn validate_registration(user: &NewUser) -> Result<(), AuthError> {
    if user.name.trim().is_empty() || user.email.trim().is_empty() || user.password.is_empty() {
        return Err(AuthError::MissingFields);
    }
    if !EMAIL_RE.is_match(&user.email) {
        return Err(AuthError::InvalidEmail);
    }
    if user.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort);
    }
    Ok(())
}

pub fn validate_password_confirmation(password: &str, confirm: &str) -> Result<(), AuthError> {
    if password == confirm {
        Ok(())
    } else {
        Err(AuthError::PasswordMismatch)
    }
}

#[derive(Debug)]
pub struct IdentityStore<S: KeyValueStore> {
    store: S,
    current: Option<User>,
}

impl<S: KeyValueStore> IdentityStore<S> {
    /// Wrap `store` and restore the persisted session, if any.
    ///
    /// An unreadable session snapshot is dropped with a warning and the store
    /// starts logged out.
    pub fn open(store: S) -> Result<Self, AuthError> {
        let current = match store.get(CURRENT_USER_KEY)? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(u) => Some(u),
                Err(e) => {
                    log::warn!("ignoring unreadable session snapshot: {}", e);
                    None
                }
            },
            None => None,
        };
        Ok(Self { store, current })
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }

    /// Favorites of the session user; empty when logged out.
    pub fn favorites(&self) -> &[Country] {
        self.current
            .as_ref()
            .map(|u| u.favorites.as_slice())
            .unwrap_or(&[])
    }

    /// The whole user table as currently persisted.
    pub fn users(&self) -> Result<Vec<User>, AuthError> {
        match self.store.get(USERS_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|source| AuthError::Corrupt {
                key: USERS_KEY,
                source,
            }),
            None => Ok(Vec::new()),
        }
    }

    /// Create an account and log it in.
    ///
    /// ### Errors
    /// - form validation failures (see [`validate_registration`])
    /// - [`AuthError::EmailInUse`] when another user already has this email
    pub fn register(&mut self, new_user: NewUser) -> Result<User, AuthError> {
        validate_registration(&new_user)?;
        let mut users = self.users()?;
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(AuthError::EmailInUse);
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: new_user.name,
            email: new_user.email,
            password: new_user.password,
            favorites: Vec::new(),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        self.save_users(&users)?;
        self.set_session(user.clone())?;
        log::info!("registered user {}", user.id);
        Ok(user)
    }

    /// Log in with an exact email + password match.
    pub fn login(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        let user = self
            .users()?
            .into_iter()
            .find(|u| u.email == email && u.password == password)
            .ok_or(AuthError::InvalidCredentials)?;
        self.set_session(user.clone())?;
        log::info!("user {} logged in", user.id);
        Ok(user)
    }

    pub fn logout(&mut self) -> Result<(), AuthError> {
        self.current = None;
        self.store.remove(CURRENT_USER_KEY)?;
        Ok(())
    }

    /// Save a snapshot of `country` for the session user.
    ///
    /// Returns `Ok(false)` without touching storage when nobody is logged in,
    /// the code is already saved, or the session user is missing from the table.
    pub fn add_to_favorites(&mut self, country: &Country) -> Result<bool, AuthError> {
        let Some(current_id) = self.current.as_ref().map(|u| u.id.clone()) else {
            return Ok(false);
        };
        let mut users = self.users()?;
        let Some(idx) = users.iter().position(|u| u.id == current_id) else {
            log::warn!("session user {} not found in user table", current_id);
            return Ok(false);
        };
        let favs = &mut users[idx].favorites;
        if favs.iter().any(|f| f.alpha3_code == country.alpha3_code) {
            return Ok(false);
        }
        favs.push(country.clone());
        let favorites = favs.clone();
        self.save_users(&users)?;
        self.refresh_session_favorites(favorites)?;
        Ok(true)
    }

    /// Drop the favorite with `code`. Returns whether one was removed; the
    /// table and snapshot are rewritten either way while logged in.
    pub fn remove_from_favorites(&mut self, code: &str) -> Result<bool, AuthError> {
        let Some(current_id) = self.current.as_ref().map(|u| u.id.clone()) else {
            return Ok(false);
        };
        let mut users = self.users()?;
        let Some(idx) = users.iter().position(|u| u.id == current_id) else {
            log::warn!("session user {} not found in user table", current_id);
            return Ok(false);
        };
        let favs = &mut users[idx].favorites;
        let before = favs.len();
        favs.retain(|f| f.alpha3_code != code);
        let removed = favs.len() != before;
        let favorites = favs.clone();
        self.save_users(&users)?;
        self.refresh_session_favorites(favorites)?;
        Ok(removed)
    }

    /// Answered from the session snapshot; `false` when logged out.
    pub fn is_in_favorites(&self, code: &str) -> bool {
        self.favorites().iter().any(|f| f.alpha3_code == code)
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn save_users(&mut self, users: &[User]) -> Result<(), AuthError> {
        let raw = serde_json::to_string(users).map_err(|source| AuthError::Corrupt {
            key: USERS_KEY,
            source,
        })?;
        self.store.set(USERS_KEY, &raw)?;
        Ok(())
    }

    fn set_session(&mut self, user: User) -> Result<(), AuthError> {
        let raw = serde_json::to_string(&user).map_err(|source| AuthError::Corrupt {
            key: CURRENT_USER_KEY,
            source,
        })?;
        self.store.set(CURRENT_USER_KEY, &raw)?;
        self.current = Some(user);
        Ok(())
    }

    // The snapshot keeps its other fields; only favorites follow the table.
    fn refresh_session_favorites(&mut self, favorites: Vec<Country>) -> Result<(), AuthError> {
        if let Some(mut user) = self.current.clone() {
            user.favorites = favorites;
            self.set_session(user)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn ada() -> NewUser {
        NewUser {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "secret1".into(),
        }
    }

    fn peru() -> Country {
        Country {
            name: "Peru".into(),
            alpha3_code: "PER".into(),
            region: "Americas".into(),
            population: 32_971_846,
            ..Default::default()
        }
    }

    #[test]
    fn validation_mirrors_the_registration_form() {
        let mut u = ada();
        u.name = "  ".into();
        assert!(matches!(validate_registration(&u), Err(AuthError::MissingFields)));
        let mut u = ada();
        u.email = "not-an-email".into();
        assert!(matches!(validate_registration(&u), Err(AuthError::InvalidEmail)));
        let mut u = ada();
        u.email = "ada@localhost".into();
        assert!(validate_registration(&u).is_ok());
        u.email = "ada @example.com".into();
        assert!(matches!(validate_registration(&u), Err(AuthError::InvalidEmail)));
        let mut u = ada();
        u.password = "12345".into();
        assert!(matches!(validate_registration(&u), Err(AuthError::PasswordTooShort)));
        assert!(validate_registration(&ada()).is_ok());
        assert!(matches!(
            validate_password_confirmation("secret1", "secret2"),
            Err(AuthError::PasswordMismatch)
        ));
    }

    #[test]
    fn error_messages_are_user_facing() {
        assert_eq!(AuthError::EmailInUse.to_string(), "Email already in use");
        assert_eq!(AuthError::InvalidCredentials.to_string(), "Invalid credentials");
        assert_eq!(
            AuthError::PasswordTooShort.to_string(),
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn favorites_are_unique_by_code() {
        let mut ids = IdentityStore::open(MemoryStore::new()).unwrap();
        ids.register(ada()).unwrap();
        assert!(ids.add_to_favorites(&peru()).unwrap());
        assert!(!ids.add_to_favorites(&peru()).unwrap());
        assert_eq!(ids.favorites().len(), 1);
        assert_eq!(ids.users().unwrap()[0].favorites.len(), 1);
    }

    #[test]
    fn favorites_need_a_session() {
        let mut ids = IdentityStore::open(MemoryStore::new()).unwrap();
        assert!(!ids.add_to_favorites(&peru()).unwrap());
        assert!(!ids.remove_from_favorites("PER").unwrap());
        assert!(!ids.is_in_favorites("PER"));
        assert!(ids.users().unwrap().is_empty());
    }

    #[test]
    fn removing_an_absent_code_is_a_no_op() {
        let mut ids = IdentityStore::open(MemoryStore::new()).unwrap();
        ids.register(ada()).unwrap();
        ids.add_to_favorites(&peru()).unwrap();
        assert!(!ids.remove_from_favorites("XXX").unwrap());
        assert!(ids.is_in_favorites("PER"));
    }

    #[test]
    fn unreadable_snapshot_starts_logged_out() {
        let mut store = MemoryStore::new();
        store.set(CURRENT_USER_KEY, "{not json").unwrap();
        let ids = IdentityStore::open(store).unwrap();
        assert!(!ids.is_logged_in());
    }

    #[test]
    fn corrupt_user_table_is_reported() {
        let mut store = MemoryStore::new();
        store.set(USERS_KEY, "oops").unwrap();
        let mut ids = IdentityStore::open(store).unwrap();
        assert!(matches!(
            ids.register(ada()),
            Err(AuthError::Corrupt { key: USERS_KEY, .. })
        ));
    }
}
