//! Request handlers.

pub mod candidates;
pub mod health;
pub mod users;

pub use candidates::*;
pub use health::*;
pub use users::*;
