//! # iconvg - IconVG decoder and disassembler
//!
//! IconVG is a compact binary format for vector graphics icons. This
//! crate decodes the format's byte code and streams the drawing actions
//! to a caller-supplied [`Sink`], or renders a human-readable
//! disassembly of the same byte code.
//!
//! ## Architecture
//!
//! ```text
//! bytes ──► magic check ──► metadata ──► byte-code interpreter ──► Sink
//!                                              │
//!                                              └──► disassembly text
//! ```
//!
//! Decoding is a single sequential pass over a borrowed byte slice: no
//! background I/O, no allocation in the steady state. The interpreter
//! maintains a program counter, a current point, and a jump-skip
//! countdown; jumped-over opcodes are parsed but produce no sink calls.
//!
//! Rendering pixels is out of scope: implement [`Sink`] to rasterize,
//! convert, or record the decoded actions.

mod color;
mod decode;
mod disassemble;
mod encoding;
mod error;
mod sink;
mod types;

pub use color::{decode_color1, Color};
pub use decode::{decode, decode_metadata, DecodeOptions};
pub use disassemble::disassemble;
pub use encoding::{
    decode_coordinate, decode_float32, decode_natural, encode_coordinate, encode_float32,
    encode_natural,
};
pub use error::{DecodeError, DisassembleError};
pub use sink::Sink;
pub use types::{
    Metadata, Palette, Point, Rect, Rgba, DEFAULT_PALETTE, DEFAULT_VIEW_BOX, MAGIC,
};
