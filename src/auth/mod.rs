//! # Identity & Session Management
//!
//! Local accounts (the `users` record), the active [`Session`]
//! (`currentUser`) and the fixed guest identity.
//!
//! Passwords are reduced to a 32-bit checksum ([`password_checksum`]) for
//! compatibility with existing records. That is not a security mechanism;
//! this layer only separates the progress of people sharing one machine.

pub mod account;
pub mod launch;
pub mod manager;
pub mod session;

pub use account::{password_checksum, Account};
pub use launch::LaunchFlags;
pub use manager::SessionManager;
pub use session::{Role, Session, GUEST_ID, GUEST_NAME};
