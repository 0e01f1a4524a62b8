use bitflags::bitflags;
use std::fmt;

bitflags! {
    // Same bit positions as the TCP header; only the flags this core models
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TcpFlags: u8 {
        const ACK = 1 << 4;
        const SYN = 1 << 1;
        const FIN = 1 << 0;
    }
}

impl fmt::Display for TcpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        for (name, _) in self.iter_names() {
            write!(f, "{}", &name[..1])?;
        }
        Ok(())
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use crate::tcp::tcp_flags::TcpFlags;

    #[test]
    fn test_tcp_flags() {
        assert_eq!(TcpFlags::FIN.bits(), 0b00000001);
        assert_eq!(TcpFlags::SYN.bits(), 0b00000010);
        assert_eq!(TcpFlags::ACK.bits(), 0b00010000);

        let combined = TcpFlags::FIN | TcpFlags::SYN | TcpFlags::ACK;
        assert_eq!(combined.bits(), 0b00010011);
    }

    #[test]
    fn test_display() {
        assert_eq!(TcpFlags::empty().to_string(), "-");
        assert_eq!((TcpFlags::SYN | TcpFlags::FIN).to_string(), "SF");
        assert_eq!(TcpFlags::ACK.to_string(), "A");
    }
}
