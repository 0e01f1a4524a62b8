use crate::tcp::byte_stream::ByteStream;
use crate::tcp::config::TcpConfig;
use crate::tcp::errors::TcpError;
use crate::tcp::messages::{TcpReceiverMessage, TcpSenderMessage};
use crate::tcp::wrap32::Wrap32;
use rand::Rng;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// A run of absolute sequence numbers `[first, last)` waiting to be sent or acknowledged
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    first: u64,    // Absolute seq number of the first slot
    last: u64,     // One past the last slot; SYN and FIN take a slot each
    data: Vec<u8>, // Payload
    syn: bool,     // Carries the SYN
    fin: bool,     // Carries the FIN
}

impl Segment {
    fn syn() -> Self {
        Segment {
            first: 0,
            last: 1,
            data: Vec::new(),
            syn: true,
            fin: false,
        }
    }

    fn empty_at(seqno: u64) -> Self {
        Segment {
            first: seqno,
            last: seqno,
            data: Vec::new(),
            syn: false,
            fin: false,
        }
    }

    fn message(&self, isn: Wrap32) -> TcpSenderMessage {
        TcpSenderMessage {
            seqno: Wrap32::wrap(self.first, isn),
            syn: self.syn,
            fin: self.fin,
            payload: self.data.clone(),
        }
    }
}

/// The sender end of a connection
#[derive(Debug)]
pub struct TcpSender {
    isn: Wrap32,                     // Initial seq number
    outbound: ByteStream,            // Stream of outgoing data written by the application
    max_payload_size: usize,         // Payload limit per segment
    initial_rto_ms: u64,             // RTO to fall back to after progress
    rto_ms: u64,                     // Current RTO, doubled on backoff
    timer_ms: u64,                   // Time left before the timer fires
    consecutive_retransmissions: u64,
    next_seqno: u64,                 // High-water mark of transmitted seq numbers
    ackno: u64,                      // Highest acknowledged seq number
    window_size: u64,                // Last known receiver window
    fin_sent: bool,                  // FIN has been scheduled
    queued: VecDeque<Segment>,       // Ready to go out, including retransmissions at the front
    outstanding: VecDeque<Segment>,  // Sent but un'acked segments, oldest first
}

impl TcpSender {
    /// New `TcpSender`; draws a random ISN unless the config fixes one
    pub fn new(config: &TcpConfig) -> Result<Self, TcpError> {
        Self::with_rng(config, &mut rand::thread_rng())
    }

    /// New `TcpSender` drawing its ISN (if not fixed) from `rng`
    pub fn with_rng<R: Rng + ?Sized>(config: &TcpConfig, rng: &mut R) -> Result<Self, TcpError> {
        config.validate()?;

        let isn = config.fixed_isn.unwrap_or_else(|| Wrap32::new(rng.gen()));
        Ok(TcpSender {
            isn,
            outbound: ByteStream::new(config.capacity),
            max_payload_size: config.max_payload_size,
            initial_rto_ms: config.initial_rto_ms,
            rto_ms: config.initial_rto_ms,
            timer_ms: 0,
            consecutive_retransmissions: 0,
            next_seqno: 0,
            ackno: 0,
            window_size: 0,
            fin_sent: false,
            queued: VecDeque::from([Segment::syn()]),
            outstanding: VecDeque::new(),
        })
    }

    /// Cut as much of the outbound stream into segments as the receiver's window allows
    pub fn fill(&mut self) {
        if self.fin_sent {
            return;
        }

        // A closed window still lets one seq number through to probe it
        let right_edge = self.ackno + self.window_size.max(1);
        let room = right_edge.saturating_sub(self.next_assigned());
        let to_pop = room.min(self.outbound.bytes_buffered() as u64);

        let data = self.outbound.pop(to_pop as usize);
        let mss = self.max_payload_size;
        let mut rest = data.as_slice();
        while !rest.is_empty() {
            let mut seg = self.take_tail(mss);
            let n = (mss - seg.data.len()).min(rest.len());
            seg.data.extend_from_slice(&rest[..n]);
            seg.last += n as u64;
            rest = &rest[n..];
            self.queued.push_back(seg);
        }

        if to_pop < room && self.outbound.is_finished() {
            let mut seg = self.take_tail(usize::MAX);
            trace!(seqno = seg.last, "sender: FIN scheduled");
            seg.fin = true;
            seg.last += 1;
            self.queued.push_back(seg);
            self.fin_sent = true;
        }
    }

    /// The next segment to put on the wire, if any
    pub fn next_outgoing(&mut self) -> Option<TcpSenderMessage> {
        let seg = self.queued.pop_front()?;

        if seg.last > self.next_seqno {
            // First transmission
            self.next_seqno = seg.last;
            if self.outstanding.is_empty() {
                self.timer_ms = self.rto_ms;
            }
            self.outstanding.push_back(seg.clone());
        }

        Some(seg.message(self.isn))
    }

    /// A zero-length segment at the current seq number, e.g. to carry an ACK
    pub fn keepalive(&self) -> TcpSenderMessage {
        TcpSenderMessage {
            seqno: Wrap32::wrap(self.next_seqno, self.isn),
            ..Default::default()
        }
    }

    /// Process an acknowledgement and window update from the peer's receiver
    pub fn on_ack(&mut self, msg: &TcpReceiverMessage) {
        let Some(ackno) = msg.ackno else {
            self.window_size = msg.window_size as u64;
            return;
        };

        let ackno = ackno.unwrap(self.isn, self.ackno);
        if ackno > self.next_seqno {
            debug!(ackno, next_seqno = self.next_seqno, "sender: ignoring ack for unsent data");
            return;
        }

        let mut progress = false;
        while let Some(seg) = self.outstanding.front() {
            if seg.last > ackno {
                break;
            }
            self.outstanding.pop_front();
            progress = true;
        }

        // A reordered ack must not pull the right edge of the window back in
        let right_edge = (ackno + msg.window_size as u64).max(self.ackno + self.window_size);
        self.ackno = self.ackno.max(ackno);
        self.window_size = right_edge - self.ackno;

        if !progress {
            return;
        }

        self.rto_ms = self.initial_rto_ms;
        self.consecutive_retransmissions = 0;
        if !self.outstanding.is_empty() {
            self.timer_ms = self.rto_ms;
        }
    }

    /// Advance the retransmission timer by `ms_since_last_tick`
    pub fn tick(&mut self, ms_since_last_tick: u64) {
        let Some(oldest) = self.outstanding.front() else {
            return;
        };

        if ms_since_last_tick < self.timer_ms {
            self.timer_ms -= ms_since_last_tick;
            return;
        }

        // Back off only when the loss can't be blamed on a closed window
        if self.window_size != 0 || oldest.syn {
            self.consecutive_retransmissions += 1;
            self.rto_ms = self.rto_ms.saturating_mul(2);
        }
        self.timer_ms = self.rto_ms;

        debug!(
            first = oldest.first,
            rto_ms = self.rto_ms,
            consecutive = self.consecutive_retransmissions,
            "sender: timer expired, retransmitting oldest segment"
        );
        self.queued.push_front(oldest.clone());
    }

    /// Seq numbers sent but not yet acknowledged
    pub fn in_flight(&self) -> u64 {
        self.next_seqno - self.ackno
    }

    pub fn consecutive_retransmissions(&self) -> u64 {
        self.consecutive_retransmissions
    }

    pub fn isn(&self) -> Wrap32 {
        self.isn
    }

    pub fn rto_ms(&self) -> u64 {
        self.rto_ms
    }

    /// Last known receiver window, measured from the highest ackno
    pub fn window_size(&self) -> u64 {
        self.window_size
    }

    pub fn next_seqno_absolute(&self) -> u64 {
        self.next_seqno
    }

    pub fn ackno_absolute(&self) -> u64 {
        self.ackno
    }

    pub fn outbound(&self) -> &ByteStream {
        &self.outbound
    }

    pub fn outbound_mut(&mut self) -> &mut ByteStream {
        &mut self.outbound
    }

    /// Next absolute seq number to hand out to new data
    fn next_assigned(&self) -> u64 {
        match self.queued.back() {
            Some(seg) => seg.last.max(self.next_seqno),
            None => self.next_seqno,
        }
    }

    /// Take the never-sent tail segment if it holds fewer than `limit` payload bytes, else start a new one
    fn take_tail(&mut self, limit: usize) -> Segment {
        let next_seqno = self.next_seqno;
        let reusable = self
            .queued
            .back()
            .is_some_and(|seg| seg.first >= next_seqno && !seg.fin && seg.data.len() < limit);

        if reusable {
            if let Some(seg) = self.queued.pop_back() {
                return seg;
            }
        }
        Segment::empty_at(self.next_assigned())
    }
}
