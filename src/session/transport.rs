//! No-op outgoing transport.
//!
//! A fake session has no peer, so everything the emulated handshake "sends"
//! lands in a sink that counts it and throws it away. Packets are still
//! encoded, so the cost profile matches a real session minus the socket.

use serde::{Deserialize, Serialize};

/// Clientbound packets the fake session emits during its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundPacket {
    Disconnect { reason: String },
    KeepAlive { tick: u64 },
}

/// Outgoing channel that accepts encoded packets and discards them
pub trait PacketSink {
    fn send(&mut self, packet: &OutboundPacket);
}

/// The default sink: encodes, counts, drops
#[derive(Debug, Default)]
pub struct DiscardSink {
    packets_discarded: u64,
    bytes_discarded: u64,
}

impl DiscardSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packets_discarded(&self) -> u64 {
        self.packets_discarded
    }

    pub fn bytes_discarded(&self) -> u64 {
        self.bytes_discarded
    }
}

impl PacketSink for DiscardSink {
    fn send(&mut self, packet: &OutboundPacket) {
        // Encoding an in-memory enum cannot fail; fall back to 0 bytes if the
        // packet shape ever becomes unencodable
        let encoded_len = serde_json::to_vec(packet).map(|v| v.len()).unwrap_or(0);
        self.packets_discarded += 1;
        self.bytes_discarded += encoded_len as u64;
        tracing::trace!(?packet, bytes = encoded_len, "discarded outbound packet");
    }
}
