//! Persistent connection to the coordinator
//!
//! Receives jobs, sends results, and watches the coordinator's heartbeat.

pub mod connection;
pub mod errors;
pub mod messages;
pub mod state;

pub use connection::{ChannelSettings, ControlChannel};
pub use errors::ChannelError;
pub use messages::{Inbound, decode_inbound, encode_result};
pub use state::ChannelState;
