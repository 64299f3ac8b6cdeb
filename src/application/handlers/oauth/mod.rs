//! OAuth handlers - Merchant connection lifecycle.

mod begin_connect;
mod complete_connect;
mod disconnect;
mod refresh_connection;

pub use begin_connect::{BeginConnectCommand, BeginConnectHandler};
pub use complete_connect::{CompleteConnectCommand, CompleteConnectHandler};
pub use disconnect::{DisconnectCommand, DisconnectHandler};
pub use refresh_connection::{RefreshConnectionCommand, RefreshConnectionHandler};
