pub mod codec;
pub mod envelope;

pub use codec::{decode, encode, CodecError, Packet};

/// Largest datagram any socket loop needs to read. Well above the biggest
/// frame so trailing bytes don't get the datagram truncated by the kernel.
pub const MAX_DATAGRAM: usize = 1500;
