//! Decoding IconVG graphics: metadata parsing and the byte-code
//! interpreter.
//!
//! The interpreter walks the byte code once, dispatching on the top two
//! bits of each opcode and streaming drawing actions to an optional
//! [`Sink`]. A taken jump detaches the sink for the next `jump_dist`
//! opcodes; those opcodes are still parsed (and narrated), they just
//! produce no sink calls.

use std::fmt;

use crate::color::{decode_color1, Color};
use crate::encoding;
use crate::error::DecodeError;
use crate::sink::Sink;
use crate::types::{Metadata, Palette, Point, Rect, Rgba, MAGIC};

/// Optional parameters to [`decode`].
#[derive(Clone, Debug, Default)]
pub struct DecodeOptions {
    /// An optional 64 color palette. If one isn't provided, the graphic's
    /// suggested palette will be used.
    pub palette: Option<Palette>,
}

/// Observes every decoded operation: the bytes it occupied and one line
/// of narration. The disassembler is the only live observer; plain
/// decoding uses [`NoTrace`].
pub(crate) trait Trace {
    /// Whether narration is consumed at all. Gates the narration lines
    /// that are expensive to build.
    fn active(&self) -> bool;

    fn op(&mut self, bytes: &[u8], args: fmt::Arguments<'_>);
}

/// The no-op observer used by [`decode`] and [`decode_metadata`].
pub(crate) struct NoTrace;

impl Trace for NoTrace {
    fn active(&self) -> bool {
        false
    }

    fn op(&mut self, _bytes: &[u8], _args: fmt::Arguments<'_>) {}
}

/// Decode an IconVG graphic, streaming its drawing actions to `sink`.
pub fn decode(sink: &mut dyn Sink, src: &[u8], opts: &DecodeOptions) -> Result<(), DecodeError> {
    decode_impl(Some(sink), &mut NoTrace, false, src, opts).map(|_| ())
}

/// Decode only the metadata in an IconVG graphic.
pub fn decode_metadata(src: &[u8]) -> Result<Metadata, DecodeError> {
    decode_impl(None, &mut NoTrace, true, src, &DecodeOptions::default())
}

pub(crate) fn decode_impl<'a, T: Trace>(
    mut sink: Option<&'a mut dyn Sink>,
    trace: &'a mut T,
    metadata_only: bool,
    src: &[u8],
    opts: &DecodeOptions,
) -> Result<Metadata, DecodeError> {
    let mut r = Reader::new(src);

    let magic = r
        .bytes(MAGIC.len())
        .ok_or(DecodeError::InvalidMagicIdentifier)?;
    if *magic != MAGIC {
        return Err(DecodeError::InvalidMagicIdentifier);
    }
    trace.op(magic, format_args!("IconVG Magic Identifier"));

    let (n_chunks, raw) = r
        .natural()
        .ok_or(DecodeError::InvalidNumberOfMetadataChunks)?;
    trace.op(raw, format_args!("Number of metadata chunks: {n_chunks}"));

    let mut metadata = Metadata::default();
    for _ in 0..n_chunks {
        decode_metadata_chunk(&mut r, trace, &mut metadata, opts.palette.is_some())?;
    }
    if let Some(palette) = opts.palette {
        metadata.palette = palette;
    }
    if metadata_only {
        return Ok(metadata);
    }

    if let Some(sink) = sink.as_deref_mut() {
        sink.reset(&metadata);
    }
    Interpreter {
        r,
        sink,
        trace,
        pc: 0,
        skip: 0,
        curr: Point::ZERO,
    }
    .run()?;
    Ok(metadata)
}

const MID_VIEW_BOX: u32 = 0;
const MID_DESCRIPTIONS: [&str; 2] = ["ViewBox", "Suggested Palette"];

fn decode_metadata_chunk<T: Trace>(
    r: &mut Reader<'_>,
    trace: &mut T,
    metadata: &mut Metadata,
    palette_overridden: bool,
) -> Result<(), DecodeError> {
    let (length, raw) = r.natural().ok_or(DecodeError::InvalidMetadataChunkLength)?;
    trace.op(raw, format_args!("Metadata chunk length: {length}"));
    // The declared length covers the identifier and the body.
    let len_want = r.len() as i64 - length as i64;

    let (mid, raw) = r.natural().ok_or(DecodeError::InvalidMetadataIdentifier)?;
    if mid as usize >= MID_DESCRIPTIONS.len() {
        return Err(DecodeError::UnsupportedMetadataIdentifier);
    }
    trace.op(
        raw,
        format_args!("Metadata Identifier: {mid} ({})", MID_DESCRIPTIONS[mid as usize]),
    );

    if mid == MID_VIEW_BOX {
        let mut args = [0.0f32; 4];
        decode_coordinates(r, trace, &mut args)?;
        metadata.view_box = Rect::new(args[0], args[1], args[2], args[3]);
        if !metadata.view_box.is_well_formed() {
            return Err(DecodeError::InvalidViewBox);
        }
    } else {
        let header = r.bytes(1).ok_or(DecodeError::InvalidSuggestedPalette)?;
        if header[0] >> 6 != 0 {
            return Err(DecodeError::InvalidSuggestedPalette);
        }
        let count = 1 + (header[0] & 0x3f) as usize;
        trace.op(header, format_args!("      {count} palette colors"));

        for i in 0..count {
            let raw = r.bytes(4).ok_or(DecodeError::InvalidSuggestedPalette)?;
            let mut c = Rgba::new(raw[0], raw[1], raw[2], raw[3]);
            if !c.is_premultiplied() {
                c = Rgba::BLACK;
            }
            trace.op(
                raw,
                format_args!("      rgba({:02X}:{:02X}:{:02X}:{:02X})", c.r, c.g, c.b, c.a),
            );
            if !palette_overridden {
                metadata.palette[i] = c;
            }
        }
    }

    if r.len() as i64 != len_want {
        return Err(DecodeError::InconsistentMetadataChunkLength);
    }
    Ok(())
}

fn decode_coordinates<T: Trace>(
    r: &mut Reader<'_>,
    trace: &mut T,
    out: &mut [f32],
) -> Result<(), DecodeError> {
    for coord in out {
        let (x, raw) = r.coordinate().ok_or(DecodeError::InvalidNumber)?;
        trace.op(raw, format_args!("      {x:+}"));
        *coord = x;
    }
    Ok(())
}

/// Cursor over the remaining bytes of an IconVG graphic. Each consuming
/// method also returns the consumed prefix, for narration.
struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn peek(&self) -> Option<u8> {
        self.data.first().copied()
    }

    fn bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.data.len() < n {
            return None;
        }
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Some(head)
    }

    fn natural(&mut self) -> Option<(u32, &'a [u8])> {
        let (v, n) = encoding::decode_natural(self.data)?;
        let raw = self.bytes(n)?;
        Some((v, raw))
    }

    fn coordinate(&mut self) -> Option<(f32, &'a [u8])> {
        let (v, n) = encoding::decode_coordinate(self.data)?;
        let raw = self.bytes(n)?;
        Some((v, raw))
    }

    fn float32(&mut self) -> Option<(f32, &'a [u8])> {
        let (v, n) = encoding::decode_float32(self.data)?;
        let raw = self.bytes(n)?;
        Some((v, raw))
    }
}

enum Flow {
    Continue,
    Return,
}

const SPREAD_NAMES: [&str; 4] = ["none", "pad", "reflect", "repeat"];

/// The byte-code interpreter.
struct Interpreter<'a, 'c, T: Trace> {
    r: Reader<'a>,
    sink: Option<&'c mut dyn Sink>,
    trace: &'c mut T,
    /// Program counter, counting instructions.
    pc: u32,
    /// Jump-skip countdown. While nonzero the sink is detached.
    skip: u32,
    /// The current point.
    curr: Point,
}

impl<T: Trace> Interpreter<'_, '_, T> {
    fn run(&mut self) -> Result<(), DecodeError> {
        while let Some(opcode) = self.r.peek() {
            if self.skip > 0 {
                self.skip -= 1;
            }
            match opcode >> 6 {
                // Path-drawing, miscellaneous, jump and call opcodes.
                0 => {
                    if opcode < 0x30 {
                        self.line_quad_cube(opcode)?;
                    } else if opcode < 0x34 {
                        self.ellipse(opcode)?;
                    } else if let Flow::Return = self.misc(opcode)? {
                        return Ok(());
                    }
                }
                // Set-register opcodes.
                1 => self.set_regs(opcode)?,
                // Fill opcodes.
                2 => self.fill(opcode)?,
                // Reserved opcodes.
                _ => self.reserved(opcode)?,
            }
        }
        Ok(())
    }

    /// The sink, if it is attached: jumped-over opcodes see `None`.
    fn sink(&mut self) -> Option<&mut dyn Sink> {
        if self.skip == 0 {
            match &mut self.sink {
                Some(s) => Some(&mut **s),
                None => None,
            }
        } else {
            None
        }
    }

    fn attached(&self) -> bool {
        self.skip == 0 && self.sink.is_some()
    }

    fn coordinates(&mut self, out: &mut [f32]) -> Result<(), DecodeError> {
        decode_coordinates(&mut self.r, &mut *self.trace, out)
    }

    fn line_quad_cube(&mut self, opcode: u8) -> Result<(), DecodeError> {
        let (op, n_coords) = match opcode >> 4 {
            0 => ("LineTo", 2),
            1 => ("QuadTo", 4),
            _ => ("CubeTo", 6),
        };

        let raw = self.r.bytes(1).ok_or(DecodeError::InvalidNumber)?;
        let mut n_reps = (opcode & 0x0f) as u32;
        if n_reps > 0 {
            self.trace
                .op(raw, format_args!("#{:04} {op} ({n_reps} reps)", self.pc));
        } else {
            self.trace.op(raw, format_args!("#{:04} {op}...", self.pc));
            let (n, raw) = self.r.natural().ok_or(DecodeError::InvalidNumber)?;
            n_reps = n + 16;
            self.trace.op(raw, format_args!("      ...({n_reps} reps)"));
        }
        self.pc += 1;

        let mut coords = [0.0f32; 6];
        for i in 0..n_reps {
            if i != 0 {
                self.trace.op(&[], format_args!("      (rep)"));
            }
            self.coordinates(&mut coords[6 - n_coords..])?;
            let to = Point::new(coords[4], coords[5]);
            if let Some(sink) = self.sink() {
                match opcode >> 4 {
                    0 => sink.line_to(to),
                    1 => sink.quad_to(Point::new(coords[2], coords[3]), to),
                    _ => sink.cube_to(
                        Point::new(coords[0], coords[1]),
                        Point::new(coords[2], coords[3]),
                        to,
                    ),
                }
            }
            self.curr = to;
        }
        Ok(())
    }

    fn ellipse(&mut self, opcode: u8) -> Result<(), DecodeError> {
        let n_quarters = 1 + (opcode & 3) as u32;
        let raw = self.r.bytes(1).ok_or(DecodeError::InvalidNumber)?;
        self.trace.op(
            raw,
            format_args!("#{:04} Ellipse ({n_quarters} quarters)", self.pc),
        );
        self.pc += 1;

        let mut args = [0.0f32; 4];
        self.coordinates(&mut args)?;
        let curr = self.curr;
        if let Some(sink) = self.sink() {
            sink.ellipse(
                n_quarters,
                Point::new(args[0], args[1]),
                Point::new(args[2], args[3]),
                curr,
            );
        }
        Ok(())
    }

    fn misc(&mut self, opcode: u8) -> Result<Flow, DecodeError> {
        match opcode & 0x0f {
            // Parallelogram.
            0x04 => {
                let raw = self.r.bytes(1).ok_or(DecodeError::InvalidNumber)?;
                self.trace
                    .op(raw, format_args!("#{:04} Parallelogram", self.pc));
                self.pc += 1;

                let mut args = [0.0f32; 4];
                self.coordinates(&mut args)?;
                let curr = self.curr;
                if let Some(sink) = self.sink() {
                    sink.parallelogram(
                        Point::new(args[0], args[1]),
                        Point::new(args[2], args[3]),
                        curr,
                    );
                }
            }

            // ClosePath; MoveTo.
            0x05 => {
                let raw = self.r.bytes(1).ok_or(DecodeError::InvalidNumber)?;
                self.trace
                    .op(raw, format_args!("#{:04} ClosePath; MoveTo", self.pc));
                self.pc += 1;

                let mut to = [0.0f32; 2];
                self.coordinates(&mut to)?;
                self.curr = Point::new(to[0], to[1]);
                let curr = self.curr;
                if let Some(sink) = self.sink() {
                    sink.close_path_move_to(curr);
                }
            }

            // Adjust the register selector.
            0x06 => {
                let raw = self.r.bytes(2).ok_or(DecodeError::InvalidNumber)?;
                let delta = raw[1] & 63;
                self.trace
                    .op(raw, format_args!("#{:04} SEL += {delta}", self.pc));
                self.pc += 1;
                // Register state is parsed but not executed.
            }

            0x07 => {
                let raw = self.r.bytes(1).ok_or(DecodeError::InvalidNumber)?;
                self.trace.op(raw, format_args!("#{:04} NOP", self.pc));
                self.pc += 1;
            }

            // Jump Unconditional.
            0x08 => {
                let raw = self.r.bytes(1).ok_or(DecodeError::InvalidNumber)?;
                self.trace
                    .op(raw, format_args!("#{:04} Jump Unconditional", self.pc));
                self.pc += 1;

                let jump_dist = self.jump_target()?;
                if self.attached() {
                    self.skip = jump_dist + 1;
                }
            }

            // Jump Feature-Bits.
            0x09 => {
                let raw = self.r.bytes(1).ok_or(DecodeError::InvalidNumber)?;
                self.trace
                    .op(raw, format_args!("#{:04} Jump Feature-Bits", self.pc));
                self.pc += 1;

                let jump_dist = self.jump_target()?;
                let (f_bits, raw) = self.r.natural().ok_or(DecodeError::InvalidNumber)?;
                self.trace
                    .op(raw, format_args!("      FeatureBits: 0x{f_bits:08X}"));
                // This decoder doesn't support any feature bits, so the
                // jump is always taken.
                if self.attached() {
                    self.skip = jump_dist + 1;
                }
            }

            // Jump Level-of-Detail.
            0x0a => {
                let raw = self.r.bytes(1).ok_or(DecodeError::InvalidNumber)?;
                self.trace
                    .op(raw, format_args!("#{:04} Jump Level-of-Detail", self.pc));
                self.pc += 1;

                let jump_dist = self.jump_target()?;
                let mut lod = [0.0f32; 2];
                self.coordinates(&mut lod)?;
                let take_jump = match self.sink() {
                    Some(sink) => !sink.query_level_of_detail(lod[0], lod[1]),
                    None => false,
                };
                if take_jump {
                    self.skip = jump_dist + 1;
                }
            }

            // Return. While the sink is detached this is a NOP.
            0x0b => {
                let raw = self.r.bytes(1).ok_or(DecodeError::InvalidNumber)?;
                self.trace.op(raw, format_args!("#{:04} RET", self.pc));
                self.pc += 1;
                if self.attached() {
                    return Ok(Flow::Return);
                }
            }

            // Call opcodes.
            _ => return Err(DecodeError::UnsupportedDrawingOpcode),
        }
        Ok(Flow::Continue)
    }

    /// Decode and narrate a jump's distance operand.
    fn jump_target(&mut self) -> Result<u32, DecodeError> {
        let (jump_dist, raw) = self.r.natural().ok_or(DecodeError::InvalidNumber)?;
        self.trace.op(
            raw,
            format_args!("      Target: #{:04} (PC+{jump_dist})", self.pc + jump_dist),
        );
        Ok(jump_dist)
    }

    fn set_regs(&mut self, opcode: u8) -> Result<(), DecodeError> {
        let adj = opcode & 0x0f;
        let decr = if adj == 0 { "; SEL--" } else { "" };
        let raw = self.r.bytes(1).ok_or(DecodeError::InvalidNumber)?;

        match (opcode >> 4) & 3 {
            0 => {
                self.trace.op(
                    raw,
                    format_args!("#{:04} Set REGS[SEL+{adj}].lo32{decr}", self.pc),
                );
                self.pc += 1;
                self.set_reg_lo32()?;
            }
            1 => {
                self.trace.op(
                    raw,
                    format_args!("#{:04} Set REGS[SEL+{adj}].hi32{decr}", self.pc),
                );
                self.pc += 1;
                self.set_reg_hi32()?;
            }
            2 => {
                self.trace
                    .op(raw, format_args!("#{:04} Set REGS[SEL+{adj}]{decr}", self.pc));
                self.pc += 1;
                self.set_reg_lo32()?;
                self.set_reg_hi32()?;
            }
            _ => {
                self.trace.op(
                    raw,
                    format_args!(
                        "#{:04} SEL -= {}; Set REGS[SEL+1 .. SEL+{}]",
                        self.pc,
                        adj + 2,
                        adj + 3,
                    ),
                );
                self.pc += 1;
                for _ in 0..adj + 2 {
                    self.set_reg_lo32()?;
                    self.set_reg_hi32()?;
                }
            }
        }
        Ok(())
    }

    fn set_reg_lo32(&mut self) -> Result<(), DecodeError> {
        let raw = self.r.bytes(4).ok_or(DecodeError::InvalidNumber)?;
        self.trace.op(
            raw,
            format_args!(
                "      lo32 = 0x{:02X}{:02X}_{:02X}{:02X}",
                raw[3], raw[2], raw[1], raw[0],
            ),
        );
        // Register state is parsed but not executed.
        Ok(())
    }

    fn set_reg_hi32(&mut self) -> Result<(), DecodeError> {
        let raw = self.r.bytes(4).ok_or(DecodeError::InvalidColor)?;
        if self.trace.active() {
            let c = Rgba::new(raw[0], raw[1], raw[2], raw[3]);
            if c.is_premultiplied() {
                self.trace.op(
                    raw,
                    format_args!("      hi32 = rgba({:02X}:{:02X}:{:02X}:{:02X})", c.r, c.g, c.b, c.a),
                );
            } else if raw[0] == 0x00 || raw[1] == raw[2] {
                self.trace
                    .op(raw, format_args!("      hi32 = {}", decode_color1(raw[1])));
            } else if raw[0] == 0xff {
                self.trace
                    .op(raw, format_args!("      hi32 = {}", decode_color1(raw[2])));
            } else {
                self.trace.op(
                    raw,
                    format_args!("      hi32 = {}", Color::blend(raw[0], raw[1], raw[2])),
                );
            }
        }
        // Register state is parsed but not executed.
        Ok(())
    }

    fn fill(&mut self, opcode: u8) -> Result<(), DecodeError> {
        let adj = opcode & 0x0f;
        let incr = if adj == 0 { "SEL++; " } else { "" };

        match (opcode >> 4) & 3 {
            0 => {
                let raw = self.r.bytes(1).ok_or(DecodeError::InvalidNumber)?;
                self.trace.op(
                    raw,
                    format_args!(
                        "#{:04} ClosePath; {incr}Fill (flat color) with REGS[SEL+{adj}]",
                        self.pc,
                    ),
                );
                self.pc += 1;
                if let Some(sink) = self.sink() {
                    sink.close_path_fill();
                }
            }

            o @ (1 | 2) => {
                let raw = self.r.bytes(2).ok_or(DecodeError::InvalidColor)?;
                let shape = if o == 1 { "linear" } else { "radial" };
                self.trace.op(
                    raw,
                    format_args!(
                        "#{:04} ClosePath; {incr}Fill ({shape} gradient; {}) with REGS[SEL+{adj} .. SEL+{}]",
                        self.pc,
                        SPREAD_NAMES[(raw[1] >> 6) as usize],
                        adj as u32 + 2 + (raw[1] & 63) as u32,
                    ),
                );
                self.pc += 1;

                for _ in 0..3 * o {
                    let (f, raw) = self.r.float32().ok_or(DecodeError::InvalidNumber)?;
                    self.trace.op(raw, format_args!("      {f:+}"));
                }
                if let Some(sink) = self.sink() {
                    sink.close_path_fill();
                }
            }

            _ => {
                let raw = self.r.bytes(1).ok_or(DecodeError::InvalidNumber)?;
                self.trace.op(
                    raw,
                    format_args!(
                        "#{:04} ClosePath; {incr}Fill (reserved) with REGS[SEL+{adj}]",
                        self.pc,
                    ),
                );
                self.pc += 1;
                self.extra_data()?;
                if let Some(sink) = self.sink() {
                    sink.close_path_fill();
                }
            }
        }
        Ok(())
    }

    fn reserved(&mut self, opcode: u8) -> Result<(), DecodeError> {
        let line_to = opcode < 0xe0;
        let raw = self.r.bytes(1).ok_or(DecodeError::InvalidNumber)?;
        self.trace.op(
            raw,
            format_args!("Reserved ({})", if line_to { "LineTo" } else { "NOP" }),
        );

        self.extra_data()?;

        if line_to {
            let mut to = [0.0f32; 2];
            self.coordinates(&mut to)?;
            if let Some(sink) = self.sink() {
                sink.line_to(Point::new(to[0], to[1]));
            }
        }
        self.pc += 1;
        Ok(())
    }

    fn extra_data(&mut self) -> Result<(), DecodeError> {
        let (length, raw) = self.r.natural().ok_or(DecodeError::InvalidNumber)?;
        self.trace
            .op(raw, format_args!("      Extra data length: {length}"));

        let mut extra = self
            .r
            .bytes(length as usize)
            .ok_or(DecodeError::InvalidExtraDataLength)?;
        while extra.len() > 4 {
            self.trace.op(&extra[..4], format_args!("      ???"));
            extra = &extra[4..];
        }
        if !extra.is_empty() {
            self.trace.op(extra, format_args!("      ???"));
        }
        Ok(())
    }
}
