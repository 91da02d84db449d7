//! Disassembling IconVG graphics to human-readable text.

use std::fmt::{self, Write as _};
use std::io;

use crate::decode::{decode_impl, DecodeOptions, Trace};
use crate::error::DisassembleError;

/// Write `src`'s disassembly to `w`.
///
/// Every operation is rendered as a hex dump of its bytes alongside a
/// line of narration, e.g.
///
/// ```text
/// 89 49 56 47   IconVG Magic Identifier
/// 01            Number of metadata chunks: 0
/// 03            #0000 LineTo (3 reps)
/// ```
///
/// The text is buffered internally and written to `w` in one call. On a
/// decode error, everything narrated up to the error is still written.
pub fn disassemble<W: io::Write>(w: &mut W, src: &[u8]) -> Result<(), DisassembleError> {
    let mut printer = Printer { out: String::new() };
    let result = decode_impl(None, &mut printer, false, src, &DecodeOptions::default());
    w.write_all(printer.out.as_bytes())?;
    result?;
    Ok(())
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// A [`Trace`] that renders each operation into a text buffer: a
/// 14-column hex dump of the operation's bytes, then the narration.
struct Printer {
    out: String,
}

impl Trace for Printer {
    fn active(&self) -> bool {
        true
    }

    fn op(&mut self, bytes: &[u8], args: fmt::Arguments<'_>) {
        let mut column = [b' '; 14];
        for (i, &x) in bytes.iter().take(4).enumerate() {
            column[3 * i] = HEX_DIGITS[(x >> 4) as usize];
            column[3 * i + 1] = HEX_DIGITS[(x & 0x0f) as usize];
        }
        for &b in &column {
            self.out.push(b as char);
        }
        // Writing to a String cannot fail.
        let _ = self.out.write_fmt(args);
        self.out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disassembly(src: &[u8]) -> String {
        let mut out = Vec::new();
        disassemble(&mut out, src).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn minimal_graphic() {
        let text = disassembly(&[0x89, 0x49, 0x56, 0x47, 0x01]);
        assert_eq!(
            text,
            "89 49 56 47   IconVG Magic Identifier\n\
             01            Number of metadata chunks: 0\n",
        );
    }

    #[test]
    fn nop_and_line_to() {
        // NOP, then LineTo (1 rep) to (1, -2).
        let text = disassembly(&[
            0x89, 0x49, 0x56, 0x47, 0x01, 0x37, 0x01, 0x83, 0x7d,
        ]);
        assert_eq!(
            text,
            "89 49 56 47   IconVG Magic Identifier\n\
             01            Number of metadata chunks: 0\n\
             37            #0000 NOP\n\
             01            #0001 LineTo (1 reps)\n\
             83            +1\n\
             7d            -2\n",
        );
    }

    #[test]
    fn jump_narration() {
        let text = disassembly(&[0x89, 0x49, 0x56, 0x47, 0x01, 0x38, 0x05, 0x37, 0x37]);
        assert!(text.contains("#0000 Jump Unconditional\n"));
        assert!(text.contains("      Target: #0003 (PC+2)\n"));
    }

    #[test]
    fn truncated_stream_still_writes_prefix() {
        // LineTo (1 rep) with no coordinates following.
        let mut out = Vec::new();
        let err = disassemble(&mut out, &[0x89, 0x49, 0x56, 0x47, 0x01, 0x01]).unwrap_err();
        assert!(matches!(
            err,
            DisassembleError::Decode(crate::DecodeError::InvalidNumber)
        ));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("#0000 LineTo (1 reps)\n"));
    }
}
