use std::collections::VecDeque;
use std::io;
use std::io::{Read, Write};

/// A bounded FIFO of bytes with a writer side (push/close) and a reader side (pop/peek)
#[derive(Debug)]
pub struct ByteStream {
    buffer: VecDeque<u8>,
    capacity: usize,
    closed: bool,
    error: bool,
    bytes_pushed: u64,
    bytes_popped: u64,
}

impl ByteStream {
    pub fn new(capacity: usize) -> Self {
        ByteStream {
            buffer: VecDeque::with_capacity(capacity.min(1 << 16)),
            capacity,
            closed: false,
            error: false,
            bytes_pushed: 0,
            bytes_popped: 0,
        }
    }

    // -- Writer side --

    /// Push as many bytes as fit; the rest are dropped. Returns the number accepted.
    pub fn push(&mut self, data: &[u8]) -> usize {
        let to_push = data.len().min(self.remaining_capacity());
        self.buffer.extend(&data[..to_push]);
        self.bytes_pushed += to_push as u64;
        to_push
    }

    /// Signal that no more bytes will be pushed
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Flag the stream as having seen an error
    pub fn set_error(&mut self) {
        self.error = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The remaining capacity in the underlying buffer
    pub fn remaining_capacity(&self) -> usize {
        self.capacity - self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of bytes ever accepted by `push`
    pub fn bytes_pushed(&self) -> u64 {
        self.bytes_pushed
    }

    // -- Reader side --

    /// Consume up to `amount` bytes from the front of the stream
    pub fn pop(&mut self, amount: usize) -> Vec<u8> {
        let to_pop = amount.min(self.buffer.len());
        self.bytes_popped += to_pop as u64;
        self.buffer.drain(..to_pop).collect()
    }

    /// Consume everything currently buffered
    pub fn pop_all(&mut self) -> Vec<u8> {
        self.pop(self.buffer.len())
    }

    /// Copy out all buffered bytes without consuming them
    pub fn peek(&self) -> Vec<u8> {
        self.buffer.iter().copied().collect()
    }

    /// Copy out at most `amount` bytes without consuming them
    pub fn peek_n(&self, amount: usize) -> Vec<u8> {
        self.buffer.iter().take(amount).copied().collect()
    }

    /// Closed and fully drained
    pub fn is_finished(&self) -> bool {
        self.closed && self.buffer.is_empty()
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    /// The number of bytes still available in the buffer (not consumed yet)
    pub fn bytes_buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Total number of bytes ever consumed by `pop`
    pub fn bytes_popped(&self) -> u64 {
        self.bytes_popped
    }
}

impl Read for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let to_read = buf.len().min(self.buffer.len());
        for (dst, src) in buf.iter_mut().zip(self.buffer.drain(..to_read)) {
            *dst = src;
        }
        self.bytes_popped += to_read as u64;
        Ok(to_read)
    }
}

impl Write for ByteStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream closed"));
        }
        Ok(self.push(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// -- Unit tests --
