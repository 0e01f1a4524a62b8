use crate::tcp::byte_stream::ByteStream;
use std::collections::VecDeque;
use std::io;
use std::io::Read;

/// An indexed byte range waiting to be written to the output stream
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    first: u64,     // Absolute index of the first byte
    last: u64,      // One past the absolute index of the last byte
    data: Vec<u8>,  // Payload, always `last - first` bytes long
    eof: bool,      // Does the stream end at `last`?
}

impl Segment {
    fn new(first: u64, data: &[u8], eof: bool) -> Self {
        Segment {
            first,
            last: first + data.len() as u64,
            data: data.to_vec(),
            eof,
        }
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    /// Clip the segment to `[min_idx, max_idx]`. A clipped tail loses its EOF marker.
    fn narrow(self, min_idx: u64, max_idx: u64) -> Option<Segment> {
        if self.first > max_idx || self.last < min_idx {
            return None;
        }

        let Segment { mut first, mut last, mut data, mut eof } = self;
        if last > max_idx {
            data.truncate((max_idx - first) as usize);
            last = max_idx;
            eof = false;
        }
        if first < min_idx {
            data.drain(..(min_idx - first) as usize);
            first = min_idx;
        }
        Some(Segment { first, last, data, eof })
    }

    /// Union with an overlapping or adjacent `other`; the bytes of `self` win on overlap
    fn absorb(self, other: &Segment) -> Segment {
        let Segment { mut first, mut last, mut data, mut eof } = self;

        if other.first < first {
            let mut head = other.data[..(first - other.first) as usize].to_vec();
            head.extend_from_slice(&data);
            data = head;
            first = other.first;
        }
        if !eof && other.last >= last {
            data.extend_from_slice(&other.data[(last - other.first) as usize..]);
            last = other.last;
            eof = other.eof;
        }
        Segment { first, last, data, eof }
    }
}

/// Reorders indexed substrings into the contiguous output `ByteStream`
#[derive(Debug)]
pub struct Reassembler {
    pending: VecDeque<Segment>, // Sorted by `first`, pairwise disjoint and non-adjacent
    output: ByteStream,         // The assembled ByteStream, ready to be read
}

impl Reassembler {
    /// New `Reassembler` with the provided `ByteStream` as output
    pub fn new(output: ByteStream) -> Self {
        Reassembler {
            pending: VecDeque::new(),
            output,
        }
    }

    /// Insert the substring `data` that starts at absolute index `first_index`
    pub fn insert(&mut self, first_index: u64, data: &[u8], is_last: bool) {
        self.insert_segment(Segment::new(first_index, data, is_last));
    }

    /// The total number of bytes pending reassembly
    pub fn bytes_pending(&self) -> u64 {
        self.pending.iter().map(|seg| seg.len() as u64).sum()
    }

    /// Index of the next byte the output is waiting for
    pub fn first_unassembled(&self) -> u64 {
        self.output.bytes_pushed()
    }

    pub fn output(&self) -> &ByteStream {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut ByteStream {
        &mut self.output
    }

    fn insert_segment(&mut self, seg: Segment) {
        // Nothing past the end of the stream is deliverable
        if self.output.is_closed() {
            return;
        }

        let min_idx = self.output.bytes_pushed();
        let max_idx = min_idx + self.output.remaining_capacity() as u64;

        let Some(seg) = seg.narrow(min_idx, max_idx) else {
            return;
        };
        if seg.data.is_empty() && !seg.eof {
            return;
        }

        let mut candidate = Some(seg);
        let mut merged = VecDeque::with_capacity(self.pending.len() + 1);

        for piece in self.pending.drain(..) {
            let Some(seg) = candidate.take() else {
                merged.push_back(piece);
                continue;
            };

            if piece.last < seg.first {
                merged.push_back(piece);
                candidate = Some(seg);
            } else if piece.first > seg.last {
                merged.push_back(seg);
                merged.push_back(piece);
            } else if seg.eof {
                // Everything from here on lies beyond the end of the stream
                candidate = Some(seg.absorb(&piece));
                break;
            } else {
                candidate = Some(seg.absorb(&piece));
            }
        }
        if let Some(seg) = candidate {
            merged.push_back(seg);
        }
        self.pending = merged;

        self.write_output(min_idx);
    }

    /// Move the front segment to the output if it is the next expected one
    fn write_output(&mut self, next_idx: u64) {
        if self.pending.front().map_or(true, |seg| seg.first != next_idx) {
            return;
        }

        if let Some(seg) = self.pending.pop_front() {
            if !seg.data.is_empty() {
                self.output.push(&seg.data);
            }
            if seg.eof {
                self.output.close();
            }
        }
    }
}

impl Read for Reassembler {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.output.read(buf)
    }
}
