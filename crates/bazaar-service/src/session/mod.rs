//! Server-side sessions and single-use tokens.
//!
//! Sessions live in the shared store under `session:<id>` with a sliding TTL:
//! every write restarts the expiry window. Tokens are fixed-lifetime records
//! that are deleted when consumed.

mod gate;
mod manager;
mod model;

pub use gate::{SessionGate, SESSION_HEADER};
pub use manager::{
    SessionManager, SessionManagerComponent, SessionManagerComponentParameters, SessionManagerExt,
    DEFAULT_PASSWORD_RESET_TTL, DEFAULT_SESSION_TTL,
};
pub use model::{Session, SessionUpdate, TokenKind};
