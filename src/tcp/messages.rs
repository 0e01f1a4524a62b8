use crate::tcp::tcp_flags::TcpFlags;
use crate::tcp::wrap32::Wrap32;
use std::fmt;

/// Data travelling from a `TcpSender` to the peer's `TcpReceiver`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TcpSenderMessage {
    pub seqno: Wrap32,    // Seq number of the first sequence slot (SYN if set)
    pub syn: bool,        // Start of stream
    pub fin: bool,        // End of stream
    pub payload: Vec<u8>, // Stream bytes
}

impl TcpSenderMessage {
    /// Sequence numbers this message occupies; SYN and FIN count one each
    pub fn sequence_length(&self) -> u64 {
        self.payload.len() as u64 + self.syn as u64 + self.fin as u64
    }

    pub fn flags(&self) -> TcpFlags {
        let mut flags = TcpFlags::empty();
        flags.set(TcpFlags::SYN, self.syn);
        flags.set(TcpFlags::FIN, self.fin);
        flags
    }
}

impl fmt::Display for TcpSenderMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seqno={} flags={} len={}",
            self.seqno,
            self.flags(),
            self.payload.len()
        )
    }
}

/// Acknowledgement and flow control travelling from a `TcpReceiver` back to the peer's `TcpSender`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpReceiverMessage {
    pub ackno: Option<Wrap32>, // Next seq number wanted; absent before SYN
    pub window_size: u16,      // Free space in the receiver's stream
}

impl TcpReceiverMessage {
    pub fn flags(&self) -> TcpFlags {
        if self.ackno.is_some() {
            TcpFlags::ACK
        } else {
            TcpFlags::empty()
        }
    }
}

impl fmt::Display for TcpReceiverMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ackno {
            Some(ackno) => write!(f, "ackno={} win={}", ackno, self.window_size),
            None => write!(f, "ackno=- win={}", self.window_size),
        }
    }
}
