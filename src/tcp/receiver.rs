use crate::tcp::byte_stream::ByteStream;
use crate::tcp::config::TcpConfig;
use crate::tcp::errors::TcpError;
use crate::tcp::messages::{TcpReceiverMessage, TcpSenderMessage};
use crate::tcp::reassembler::Reassembler;
use crate::tcp::wrap32::Wrap32;
use tracing::{debug, trace};

/// The receiver end of a connection
#[derive(Debug)]
pub struct TcpReceiver {
    reassembler: Reassembler, // Handles incoming TCP segments
    isn: Option<Wrap32>,      // Initial seq number, known once SYN arrives
}

impl TcpReceiver {
    pub fn new(config: &TcpConfig) -> Result<Self, TcpError> {
        config.validate()?;
        Ok(Self::with_capacity(config.capacity))
    }

    pub fn with_capacity(capacity: usize) -> Self {
        TcpReceiver {
            reassembler: Reassembler::new(ByteStream::new(capacity)),
            isn: None,
        }
    }

    /// Hand a segment from the peer's sender to the reassembler
    pub fn receive(&mut self, msg: &TcpSenderMessage) {
        let mut seqno = msg.seqno;
        if msg.syn {
            match self.isn {
                None => {
                    debug!(isn = %seqno, "receiver: SYN received");
                    self.isn = Some(seqno);
                }
                Some(isn) if isn != seqno => {
                    debug!(isn = %isn, got = %seqno, "receiver: conflicting SYN, keeping original isn");
                }
                Some(_) => {}
            }
            // SYN occupies absolute seq number 0
            seqno += 1;
        }

        let Some(isn) = self.isn else {
            trace!(%msg, "receiver: segment before SYN ignored");
            return;
        };

        let checkpoint = self.reassembler.first_unassembled();
        let abs_seqno = seqno.unwrap(isn, checkpoint);

        match abs_seqno.checked_sub(1) {
            Some(stream_idx) => self.reassembler.insert(stream_idx, &msg.payload, msg.fin),
            None => {
                // First payload byte sits on the SYN's slot and cannot be stream data
                if let Some(rest) = msg.payload.get(1..) {
                    self.reassembler.insert(0, rest, msg.fin);
                }
            }
        }
    }

    /// The ackno and window to report back to the peer's sender
    pub fn status(&self) -> TcpReceiverMessage {
        let output = self.reassembler.output();
        let window_size = output.remaining_capacity().min(u16::MAX as usize) as u16;

        let ackno = self.isn.map(|isn| {
            // SYN and, once the stream is complete, FIN each take a seq number
            let abs_ackno = output.bytes_pushed() + 1 + output.is_closed() as u64;
            Wrap32::wrap(abs_ackno, isn)
        });

        TcpReceiverMessage { ackno, window_size }
    }

    pub fn isn(&self) -> Option<Wrap32> {
        self.isn
    }

    pub fn bytes_pending(&self) -> u64 {
        self.reassembler.bytes_pending()
    }

    /// Get a reference to the reassembled ByteStream
    pub fn output(&self) -> &ByteStream {
        self.reassembler.output()
    }

    pub fn output_mut(&mut self) -> &mut ByteStream {
        self.reassembler.output_mut()
    }
}
