//! Typed front-ends for the individual services.
//!
//! Each facade borrows a [`Session`](crate::session::Session) and exposes
//! only its own command vocabulary. They share nothing but the session.

pub mod authserv;
pub mod chanserv;
pub mod opserv;

pub use self::authserv::AuthServ;
pub use self::chanserv::{ChanServ, ChannelInfo};
pub use self::opserv::OpServ;
