//! Local session handling for Ink2Text
//!
//! A session is a user record kept in the persisted key-value store. It gates
//! access to conversion history and OCR; it is not a security boundary.

pub mod error;
pub mod models;
pub mod session;
pub mod validation;

pub use error::{SessionError, SessionResult};
pub use models::{SessionEvent, SessionRecord};
pub use session::SessionStore;
pub use validation::{PasswordEvaluation, PasswordPolicy, Strength, evaluate_password};
