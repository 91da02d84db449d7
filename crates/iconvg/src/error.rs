//! Error types for decoding and disassembly.

use std::fmt;
use std::io;

/// Errors that can occur when decoding an IconVG graphic.
///
/// The decoder stops at the first error; drawing actions streamed to the
/// sink before the error are left as-is.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// The first four bytes are not the IconVG magic identifier.
    InvalidMagicIdentifier,
    /// The metadata chunk count failed to decode.
    InvalidNumberOfMetadataChunks,
    /// A metadata chunk's length failed to decode.
    InvalidMetadataChunkLength,
    /// A metadata chunk's identifier failed to decode.
    InvalidMetadataIdentifier,
    /// A metadata chunk's identifier is not a recognized one.
    UnsupportedMetadataIdentifier,
    /// The view box has a non-finite corner or an inverted axis.
    InvalidViewBox,
    /// The suggested palette has a malformed header or truncated entries.
    InvalidSuggestedPalette,
    /// A metadata chunk's body did not consume its declared length.
    InconsistentMetadataChunkLength,
    /// A natural number or coordinate failed to decode mid-stream.
    InvalidNumber,
    /// A 4-byte color read was truncated.
    InvalidColor,
    /// An extra-data block extends past the end of input.
    InvalidExtraDataLength,
    /// A drawing opcode this decoder does not support.
    UnsupportedDrawingOpcode,
    /// A styling opcode this decoder does not support.
    UnsupportedStylingOpcode,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DecodeError::InvalidMagicIdentifier => "invalid magic identifier",
            DecodeError::InvalidNumberOfMetadataChunks => "invalid number of metadata chunks",
            DecodeError::InvalidMetadataChunkLength => "invalid metadata chunk length",
            DecodeError::InvalidMetadataIdentifier => "invalid metadata identifier",
            DecodeError::UnsupportedMetadataIdentifier => "unsupported metadata identifier",
            DecodeError::InvalidViewBox => "invalid view box",
            DecodeError::InvalidSuggestedPalette => "invalid suggested palette",
            DecodeError::InconsistentMetadataChunkLength => "inconsistent metadata chunk length",
            DecodeError::InvalidNumber => "invalid number",
            DecodeError::InvalidColor => "invalid color",
            DecodeError::InvalidExtraDataLength => "invalid extra data length",
            DecodeError::UnsupportedDrawingOpcode => "unsupported drawing opcode",
            DecodeError::UnsupportedStylingOpcode => "unsupported styling opcode",
        };
        write!(f, "iconvg: {msg}")
    }
}

impl std::error::Error for DecodeError {}

/// Errors that can occur when disassembling an IconVG graphic.
#[derive(Debug)]
pub enum DisassembleError {
    /// The graphic failed to decode.
    Decode(DecodeError),
    /// Writing the disassembly text failed.
    Io(io::Error),
}

impl fmt::Display for DisassembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisassembleError::Decode(e) => write!(f, "{e}"),
            DisassembleError::Io(e) => write!(f, "iconvg: write failed: {e}"),
        }
    }
}

impl std::error::Error for DisassembleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DisassembleError::Decode(e) => Some(e),
            DisassembleError::Io(e) => Some(e),
        }
    }
}

impl From<DecodeError> for DisassembleError {
    fn from(e: DecodeError) -> Self {
        DisassembleError::Decode(e)
    }
}

impl From<io::Error> for DisassembleError {
    fn from(e: io::Error) -> Self {
        DisassembleError::Io(e)
    }
}
