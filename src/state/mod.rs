//! State management module.
//!
//! Contains the Matrix (shared server state), the user and channel entities,
//! the access hierarchy and the mode engine.

mod access;
mod channel;
mod invites;
mod matrix;
mod membership;
pub mod modes;
mod registration;
mod uid;
mod user;

pub use access::{AccessHierarchy, AccessLevel};
pub use channel::{Channel, ModeEnv, ModeSource, ModeTarget, Topic};
pub use invites::{Invite, InviteStore};
pub use matrix::{Matrix, MatrixConfig, ServerInfo};
pub use registration::{Credentials, Progress, RegistrationGate};
pub use uid::{Uid, UidGenerator};
pub use user::{NickProblem, User, UserModeSource, validate_nick};
