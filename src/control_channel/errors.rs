/// Why a connection attempt or an open connection ended
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error("Connection not open after {0} ms")]
    ConnectTimeout(u64),

    #[error("No heartbeat within {0} ms")]
    HeartbeatTimeout(u64),

    #[error("Connection closed by coordinator")]
    Disconnected,

    #[error("WebSocket error: {0}")]
    Protocol(String),

    #[error("Failed to encode message: {0}")]
    Encode(String),
}
