pub mod asset;
pub mod common;
pub mod form;
pub mod record;
pub mod reservation;
pub mod session;
pub mod user_context;

pub use asset::*;
pub use common::*;
pub use form::*;
pub use record::*;
pub use reservation::*;
pub use session::*;
pub use user_context::*;
