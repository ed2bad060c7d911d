//! Error types for the Wake-on-LAN primitive.

use thiserror::Error;

/// Errors that can occur while building or sending a magic packet.
#[derive(Error, Debug)]
pub enum WolError {
    /// The MAC address did not reduce to exactly 12 hex digits.
    ///
    /// Raised locally, before anything touches the network. A device may be
    /// stored with a malformed MAC; it surfaces only at send time.
    #[error("invalid MAC address '{input}': expected 12 hex digits, found {digits}")]
    InvalidAddress {
        /// The original, unstripped input string.
        input: String,
        /// Number of hex digits that survived stripping.
        digits: usize,
    },

    /// Socket creation, broadcast permission, or the send itself failed.
    #[error("failed to send magic packet: {0}")]
    Transport(#[from] std::io::Error),
}
