//! TCP gateway and the per-connection dispatch loop.

pub mod connection;
pub mod gateway;
pub mod manager;

pub use connection::{serve_connection, ConnectionServices};
pub use gateway::{start_gateway, GatewayHandle};
pub use manager::{ConnectionInfo, SessionManager};
