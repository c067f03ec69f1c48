//! Authentication: Argon2 password hashing and session-backed identity.

mod password;
mod session;

pub use password::{
    hash_blocking, hash_password, verify_blocking, verify_dummy, verify_password,
    MIN_PASSWORD_CHARS,
};
pub use session::{sign_in, CurrentUser, PremiumUser, SESSION_USER_ID_KEY};
