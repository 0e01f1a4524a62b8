use crate::tcp::errors::TcpError;
use crate::tcp::wrap32::Wrap32;

/// Construction-time parameters for one half of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpConfig {
    pub capacity: usize,           // ByteStream capacity in bytes
    pub max_payload_size: usize,   // Largest payload carried by one segment
    pub initial_rto_ms: u64,       // Retransmission timeout before any backoff
    pub fixed_isn: Option<Wrap32>, // Initial seq number; random if unset
}

impl TcpConfig {
    pub const DEFAULT_CAPACITY: usize = 64000;
    pub const MAX_PAYLOAD_SIZE: usize = 1000;
    pub const TIMEOUT_DEFAULT_MS: u64 = 1000;

    pub fn capacity(&mut self, capacity: usize) -> &mut Self {
        self.capacity = capacity;
        self
    }

    pub fn max_payload_size(&mut self, max_payload_size: usize) -> &mut Self {
        self.max_payload_size = max_payload_size;
        self
    }

    pub fn initial_rto_ms(&mut self, initial_rto_ms: u64) -> &mut Self {
        self.initial_rto_ms = initial_rto_ms;
        self
    }

    pub fn isn(&mut self, isn: Wrap32) -> &mut Self {
        self.fixed_isn = Some(isn);
        self
    }

    /// Reject settings that would stall the connection
    pub fn validate(&self) -> Result<(), TcpError> {
        if self.capacity == 0 {
            return Err(TcpError::ZeroCapacity);
        }
        if self.max_payload_size == 0 {
            return Err(TcpError::ZeroPayloadSize);
        }
        if self.initial_rto_ms == 0 {
            return Err(TcpError::ZeroTimeout);
        }
        Ok(())
    }
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            capacity: Self::DEFAULT_CAPACITY,
            max_payload_size: Self::MAX_PAYLOAD_SIZE,
            initial_rto_ms: Self::TIMEOUT_DEFAULT_MS,
            fixed_isn: None,
        }
    }
}
