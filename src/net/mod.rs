//! Socket plumbing shared by the client and server.
//!
//! - `resolver`: host/port to ordered [`Endpoint`] candidates
//! - `connector`: first reachable candidate wins (client)
//! - `listener`: first bindable candidate wins, then listen (server)
//!
//! Every socket is an owned value; a candidate that fails is dropped, and
//! therefore closed, before the next one is tried.

mod connector;
mod listener;
mod resolver;

pub use connector::connect;
pub use listener::{bind, DEFAULT_BACKLOG};
pub use resolver::{resolve, Endpoint};
