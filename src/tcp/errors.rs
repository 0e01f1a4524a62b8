use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TcpError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error), // Wrapper around std::io::Error

    #[error("Stream capacity must be non-zero")]
    ZeroCapacity,

    #[error("Maximum payload size must be non-zero")]
    ZeroPayloadSize,

    #[error("Initial retransmission timeout must be non-zero")]
    ZeroTimeout,
}
