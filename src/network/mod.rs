pub mod packet;

pub use packet::{Packet, PacketSpec, Protocol};
