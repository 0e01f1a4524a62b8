//! End-to-end transfers from a `TcpSender` to a `TcpReceiver` over an
//! in-memory channel that can drop, duplicate and reorder messages.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use tcp_reliable::tcp::{TcpConfig, TcpReceiver, TcpSender, Wrap32};

const TICK_MS: u64 = 10;
const MAX_ROUNDS: usize = 200_000;

/// One direction of an unreliable network
struct LossyChannel<T> {
    rng: StdRng,
    loss: f64,
    dup: f64,
    queue: Vec<T>,
}

impl<T: Clone> LossyChannel<T> {
    fn new(seed: u64, loss: f64, dup: f64) -> Self {
        LossyChannel {
            rng: StdRng::seed_from_u64(seed),
            loss,
            dup,
            queue: Vec::new(),
        }
    }

    fn send(&mut self, item: T) {
        if self.rng.gen_bool(self.loss) {
            return;
        }
        if self.rng.gen_bool(self.dup) {
            self.queue.push(item.clone());
        }
        self.queue.push(item);
    }

    /// Everything in transit, in a random order
    fn drain(&mut self) -> Vec<T> {
        self.queue.shuffle(&mut self.rng);
        std::mem::take(&mut self.queue)
    }
}

struct Transfer {
    received: Vec<u8>,
    sender: TcpSender,
    receiver: TcpReceiver,
}

fn transfer(data: &[u8], config: &TcpConfig, loss: f64, dup: f64, seed: u64) -> Transfer {
    let mut sender = TcpSender::with_rng(config, &mut StdRng::seed_from_u64(seed)).unwrap();
    let mut receiver = TcpReceiver::new(config).unwrap();
    let mut data_path = LossyChannel::new(seed + 1, loss, dup);
    let mut ack_path = LossyChannel::new(seed + 2, loss, dup);

    let mut written = 0;
    let mut received = Vec::with_capacity(data.len());

    for _ in 0..MAX_ROUNDS {
        // Application writes as much as the outbound stream accepts
        written += sender.outbound_mut().push(&data[written..]);
        if written == data.len() && !sender.outbound().is_closed() {
            sender.outbound_mut().close();
        }

        sender.fill();
        while let Some(msg) = sender.next_outgoing() {
            assert!(msg.payload.len() <= config.max_payload_size);
            data_path.send(msg);
        }

        for msg in data_path.drain() {
            receiver.receive(&msg);
            ack_path.send(receiver.status());
        }
        received.extend(receiver.output_mut().pop_all());

        if receiver.output().is_finished() {
            return Transfer {
                received,
                sender,
                receiver,
            };
        }

        for ack in ack_path.drain() {
            sender.on_ack(&ack);
        }
        sender.tick(TICK_MS);
    }

    panic!("transfer did not finish in {MAX_ROUNDS} rounds");
}

fn random_payload(len: usize, seed: u64) -> Vec<u8> {
    let mut data = vec![0u8; len];
    StdRng::seed_from_u64(seed).fill_bytes(&mut data);
    data
}

#[test]
fn test_transfer_over_perfect_channel() {
    let data = random_payload(100_000, 1);
    let mut config = TcpConfig::default();
    config.capacity(4000).initial_rto_ms(TICK_MS * 5);

    let result = transfer(&data, &config, 0.0, 0.0, 10);
    assert_eq!(result.received, data);
    assert_eq!(result.sender.consecutive_retransmissions(), 0);
    assert_eq!(result.receiver.bytes_pending(), 0);
}

#[test]
fn test_transfer_over_lossy_channel() {
    let data = random_payload(50_000, 2);
    let mut config = TcpConfig::default();
    config
        .capacity(3000)
        .max_payload_size(500)
        .initial_rto_ms(TICK_MS * 3);

    let result = transfer(&data, &config, 0.1, 0.1, 20);
    assert_eq!(result.received, data);
    assert!(result.receiver.output().is_finished());
}

#[test]
fn test_transfer_across_seqno_wraparound() {
    let data = random_payload(20_000, 3);
    let mut config = TcpConfig::default();
    config
        .capacity(1500)
        .max_payload_size(700)
        .initial_rto_ms(TICK_MS * 3)
        .isn(Wrap32::new(u32::MAX - 5000));

    let result = transfer(&data, &config, 0.05, 0.2, 30);
    assert_eq!(result.received, data);

    // The final ackno covers SYN, every byte and FIN
    let ackno = result.receiver.status().ackno.unwrap();
    let expected = Wrap32::wrap(data.len() as u64 + 2, Wrap32::new(u32::MAX - 5000));
    assert_eq!(ackno, expected);
}

#[test]
fn test_empty_stream_transfers_syn_and_fin() {
    let mut config = TcpConfig::default();
    config.initial_rto_ms(TICK_MS);

    let result = transfer(&[], &config, 0.2, 0.0, 40);
    assert!(result.received.is_empty());
    assert!(result.receiver.output().is_finished());
}
