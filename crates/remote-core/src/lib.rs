//! Core types for PC Remote Control.
//!
//! This crate holds everything the client and the on-PC agent share: the
//! device model, MAC address parsing, and the Wake-on-LAN primitive (magic
//! packet construction plus the UDP broadcast sender). It is UI-agnostic
//! and carries no storage or HTTP concerns.

pub mod device;
pub mod error;
pub mod mac;
pub mod wol;

pub use device::{Device, DeviceId, DeviceStatus, PowerAction, PowerCommand, DEFAULT_AGENT_PORT};
pub use error::WolError;
pub use mac::MacAddr;
pub use wol::{send_wol, send_wol_to, MagicPacket, BROADCAST_ADDR, MAGIC_PACKET_LEN, WOL_PORT};
