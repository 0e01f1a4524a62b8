pub mod byte_stream;
pub mod config;
pub mod errors;
pub mod messages;
pub mod reassembler;
pub mod receiver;
pub mod sender;
pub mod tcp_flags;
pub mod wrap32;

// -- Re-export structs for more concise usage

pub use byte_stream::ByteStream;
pub use config::TcpConfig;
pub use errors::TcpError;
pub use messages::{TcpReceiverMessage, TcpSenderMessage};
pub use reassembler::Reassembler;
pub use receiver::TcpReceiver;
pub use sender::TcpSender;
pub use tcp_flags::TcpFlags;
pub use wrap32::Wrap32;
