//! Wake-on-LAN magic packet construction and broadcast.
//!
//! The magic packet is a fixed 102-byte payload: 6 bytes of `0xFF` followed
//! by the target MAC repeated 16 times. It is sent as a single UDP datagram
//! to the broadcast address on port 9; the protocol has no acknowledgment,
//! so success only means the packet was handed to the network layer.

use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::debug;

use crate::error::WolError;
use crate::mac::MacAddr;

/// Magic packet size: 6-byte header + 16 repetitions of the 6-byte MAC.
pub const MAGIC_PACKET_LEN: usize = 102;

/// Conventional Wake-on-LAN discard port.
pub const WOL_PORT: u16 = 9;

/// Limited broadcast address used for the wake datagram.
pub const BROADCAST_ADDR: Ipv4Addr = Ipv4Addr::BROADCAST;

/// A fully constructed Wake-on-LAN magic packet.
///
/// Ephemeral by design: built for one send call and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicPacket {
    bytes: [u8; MAGIC_PACKET_LEN],
}

impl MagicPacket {
    /// Build the packet for the given MAC address.
    pub fn new(mac: MacAddr) -> Self {
        let mut bytes = [0xFFu8; MAGIC_PACKET_LEN];
        let octets = mac.octets();
        for repetition in 0..16 {
            let start = 6 + repetition * 6;
            bytes[start..start + 6].copy_from_slice(&octets);
        }
        Self { bytes }
    }

    /// Parse a MAC string and build the packet in one step.
    pub fn from_mac_str(mac: &str) -> Result<Self, WolError> {
        Ok(Self::new(mac.parse()?))
    }

    /// The raw 102-byte payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Send a magic packet for `mac` to `255.255.255.255:9`.
///
/// One attempt per invocation; callers may re-invoke. Propagates
/// [`WolError::InvalidAddress`] unchanged when the MAC does not parse.
pub async fn send_wol(mac: &str) -> Result<(), WolError> {
    send_wol_to(mac, SocketAddr::from((BROADCAST_ADDR, WOL_PORT))).await
}

/// Send a magic packet to an explicit destination.
///
/// The socket is bound to an ephemeral local port, flagged for broadcast,
/// and dropped when this function returns regardless of outcome.
pub async fn send_wol_to(mac: &str, dest: SocketAddr) -> Result<(), WolError> {
    let packet = MagicPacket::from_mac_str(mac)?;

    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    socket.set_broadcast(true)?;
    socket.send_to(packet.as_bytes(), dest).await?;

    debug!(mac, %dest, "magic packet sent");
    Ok(())
}
