//! Transport connection manager
//!
//! Owns the lifecycle of the one connection a session uses: open, detect
//! closure, retry after a fixed delay, tear down.

mod error;
mod state;
mod traits;
mod websocket;

#[cfg(test)]
mod proptests;

pub use error::TransportError;
pub use state::{
    transition, LinkEffect, LinkEvent, LinkState, LinkTransition, ReconnectPolicy,
    DEFAULT_RECONNECT_DELAY,
};
pub use traits::{Connection, Connector, RawFrame};
pub use websocket::{WsConnection, WsConnector};
