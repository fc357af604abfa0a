//! Session Management
//!
//! Holds the bearer token and signed-in user between invocations.
//!
//! ## Architecture
//!
//! - **SessionStore**: persistence seam (JSON file or memory)
//! - **SessionManager**: two-state machine over a store
//!
//! ## State Machine
//!
//! ```text
//!   Unauthenticated --login succeeded--> Authenticated
//!   Authenticated   --logout-----------> Unauthenticated
//!   Authenticated   --server 401-------> Unauthenticated
//! ```

mod manager;
mod store;

pub use manager::{AuthState, SessionEvent, SessionManager};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting a session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to write session file {path:?}: {error}")]
    Write { path: PathBuf, error: String },

    #[error("Failed to remove session file {path:?}: {error}")]
    Remove { path: PathBuf, error: String },

    #[error("Failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;
