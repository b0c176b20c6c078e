use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

use crate::{
    models::{
        store::Store,
        user::{User, is_valid_username, normalize_username},
    },
    storage::{Storage, StorageError},
};

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("Enter both username and password")]
    MissingCredentials,

    #[error("Invalid username '{0}'. Use up to 32 letters, digits, '.', '-' or '_' (not leading)")]
    InvalidUsername(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("User '{0}' already exists")]
    UserAlreadyExists(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct RegisterParameters {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

pub fn register(
    store: &mut Store,
    storage: &impl Storage,
    parameters: RegisterParameters,
) -> Result<User, RegisterError> {
    let username = normalize_username(&parameters.username);

    if username.is_empty() || parameters.password.is_empty() {
        return Err(RegisterError::MissingCredentials);
    }
    if !is_valid_username(&username) {
        return Err(RegisterError::InvalidUsername(parameters.username));
    }
    if parameters.password != parameters.confirm_password {
        return Err(RegisterError::PasswordMismatch);
    }
    if store.find_user(&username).is_some() {
        return Err(RegisterError::UserAlreadyExists(username));
    }

    let user = User {
        username,
        password_hash: hash_password(&parameters.password)?,
        created_at: jiff::Timestamp::now(),
    };

    store.add_user(user.clone());
    storage.save(store)?;

    log::info!("Registered user {}", user.username);
    Ok(user)
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Enter both username and password")]
    MissingCredentials,

    #[error("User '{0}' not found")]
    UnknownUser(String),

    #[error("Incorrect password")]
    WrongPassword,

    #[error("Stored password hash for '{0}' is corrupt")]
    CorruptHash(String),
}

pub struct LoginParameters {
    pub username: String,
    pub password: String,
}

/// Checks credentials. Usernames match case-insensitively.
pub fn login(store: &Store, parameters: LoginParameters) -> Result<User, LoginError> {
    let username = normalize_username(&parameters.username);
    if username.is_empty() || parameters.password.is_empty() {
        return Err(LoginError::MissingCredentials);
    }

    let user = store
        .find_user(&username)
        .ok_or(LoginError::UnknownUser(username))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| LoginError::CorruptHash(user.username.clone()))?;

    Argon2::default()
        .verify_password(parameters.password.as_bytes(), &parsed_hash)
        .map_err(|_| LoginError::WrongPassword)?;

    log::info!("User {} logged in", user.username);
    Ok(user.clone())
}

fn hash_password(password: &str) -> Result<String, RegisterError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| RegisterError::Hashing(e.to_string()))
}
