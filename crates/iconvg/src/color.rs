//! Colors, direct and indirect.

use std::fmt;

use crate::types::{Palette, Rgba};

/// An IconVG color, whose RGBA value can depend on context. Some colors
/// are direct RGBA values. Others are indirect, referring to an index of
/// the custom palette, a color register of the decoder virtual machine,
/// or a blend of two other colors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Color {
    /// A direct RGBA value.
    Rgba(Rgba),
    /// An index into the custom palette.
    Palette(u8),
    /// An index into the REGS color registers of the decoder virtual
    /// machine.
    Reg(u8),
    /// A blend of two 1-byte colors: `(255-t)/255` parts `c0` plus
    /// `t/255` parts `c1`.
    Blend { t: u8, c0: u8, c1: u8 },
}

impl Color {
    /// An indirect color referring to an index of the custom palette.
    pub const fn palette(i: u8) -> Self {
        Color::Palette(i & 0x3f)
    }

    /// An indirect color referring to a color register.
    pub const fn reg(i: u8) -> Self {
        Color::Reg(i & 0x3f)
    }

    /// An indirect color blending two 1-byte colors.
    pub const fn blend(t: u8, c0: u8, c1: u8) -> Self {
        Color::Blend { t, c0, c1 }
    }

    /// Resolve the color's RGBA value, given its context: the custom
    /// palette and the color registers of the decoder virtual machine.
    pub fn resolve(self, palette: &Palette, regs: &[Rgba; 64]) -> Rgba {
        match self {
            Color::Rgba(c) => c,
            Color::Palette(i) => palette[(i & 0x3f) as usize],
            Color::Reg(i) => regs[(i & 0x3f) as usize],
            Color::Blend { t, c0, c1 } => {
                let p = 255 - t as u32;
                let q = t as u32;
                let x = decode_color1(c0).resolve(palette, regs);
                let y = decode_color1(c1).resolve(palette, regs);
                let mix = |x: u8, y: u8| ((p * x as u32 + q * y as u32 + 128) / 255) as u8;
                Rgba::new(mix(x.r, y.r), mix(x.g, y.g), mix(x.b, y.b), mix(x.a, y.a))
            }
        }
    }
}

/// The narration forms used by the disassembler.
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Color::Rgba(c) => {
                write!(f, "rgba({:02X}:{:02X}:{:02X}:{:02X})", c.r, c.g, c.b, c.a)
            }
            Color::Palette(i) => write!(f, "CPAL[{i}]"),
            Color::Reg(i) => write!(f, "REGS[INDEX+{i}]"),
            Color::Blend { t, c0, c1 } => write!(
                f,
                "blend(0x{:02X} * {}, 0x{:02X} * {})",
                0xff - t,
                decode_color1(c0),
                t,
                decode_color1(c1),
            ),
        }
    }
}

/// The five channel levels of the 1-byte color cube.
const CUBE_LEVELS: [u8; 5] = [0x00, 0x40, 0x80, 0xc0, 0xff];

/// Decode a 1-byte color.
///
/// `0x00..0x03` are transparent black and two semi-transparent grays,
/// `0x03..0x80` a 5x5x5 cube of opaque colors, `0x80..0xC0` palette
/// indexes, and `0xC0..` register indexes.
pub fn decode_color1(x: u8) -> Color {
    if x >= 0xc0 {
        return Color::reg(x);
    }
    if x >= 0x80 {
        return Color::palette(x);
    }
    match x {
        0x00 => Color::Rgba(Rgba::TRANSPARENT),
        0x01 => Color::Rgba(Rgba::new(0x80, 0x80, 0x80, 0x80)),
        0x02 => Color::Rgba(Rgba::new(0xc0, 0xc0, 0xc0, 0xc0)),
        _ => {
            let x = x - 3;
            let blue = CUBE_LEVELS[(x % 5) as usize];
            let x = x / 5;
            let green = CUBE_LEVELS[(x % 5) as usize];
            let red = CUBE_LEVELS[(x / 5) as usize];
            Color::Rgba(Rgba::rgb(red, green, blue))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_PALETTE;

    const NO_REGS: [Rgba; 64] = [Rgba::TRANSPARENT; 64];

    #[test]
    fn one_byte_color_specials() {
        assert_eq!(decode_color1(0x00), Color::Rgba(Rgba::TRANSPARENT));
        assert_eq!(
            decode_color1(0x01),
            Color::Rgba(Rgba::new(0x80, 0x80, 0x80, 0x80))
        );
        assert_eq!(
            decode_color1(0x02),
            Color::Rgba(Rgba::new(0xc0, 0xc0, 0xc0, 0xc0))
        );
    }

    #[test]
    fn one_byte_color_cube() {
        // x = 3 is the cube origin: opaque black.
        assert_eq!(decode_color1(0x03), Color::Rgba(Rgba::rgb(0, 0, 0)));
        // The fastest-varying axis is blue.
        assert_eq!(decode_color1(0x07), Color::Rgba(Rgba::rgb(0, 0, 0xff)));
        // Then green.
        assert_eq!(decode_color1(0x17), Color::Rgba(Rgba::rgb(0, 0xff, 0)));
        // Then red.
        assert_eq!(decode_color1(0x67), Color::Rgba(Rgba::rgb(0xff, 0, 0)));
        // The far corner is opaque white.
        assert_eq!(
            decode_color1(0x7f),
            Color::Rgba(Rgba::rgb(0xff, 0xff, 0xff))
        );
    }

    #[test]
    fn one_byte_color_indirect() {
        assert_eq!(decode_color1(0x80), Color::Palette(0));
        assert_eq!(decode_color1(0xbf), Color::Palette(63));
        assert_eq!(decode_color1(0xc0), Color::Reg(0));
        assert_eq!(decode_color1(0xff), Color::Reg(63));
    }

    #[test]
    fn resolve_direct_and_indirect() {
        let mut palette = DEFAULT_PALETTE;
        palette[7] = Rgba::new(1, 2, 3, 255);
        let mut regs = NO_REGS;
        regs[9] = Rgba::new(9, 9, 9, 9);

        let c = Rgba::new(10, 20, 30, 255);
        assert_eq!(Color::Rgba(c).resolve(&palette, &regs), c);
        assert_eq!(
            Color::palette(7).resolve(&palette, &regs),
            Rgba::new(1, 2, 3, 255)
        );
        assert_eq!(Color::reg(9).resolve(&palette, &regs), Rgba::new(9, 9, 9, 9));
        // Indexes wrap at 64.
        assert_eq!(
            Color::Palette(64 + 7).resolve(&palette, &regs),
            Rgba::new(1, 2, 3, 255)
        );
    }

    #[test]
    fn resolve_blend() {
        let mut palette = DEFAULT_PALETTE;
        palette[1] = Rgba::new(10, 10, 10, 10);
        let regs = NO_REGS;

        // A 50/50-ish blend of palette[1] and transparent:
        // (127*10 + 128*0 + 128) / 255 = 5 per channel.
        let c = Color::blend(128, 0x81, 0x00);
        assert_eq!(c.resolve(&palette, &regs), Rgba::new(5, 5, 5, 5));
    }

    #[test]
    fn display_forms() {
        assert_eq!(
            Color::Rgba(Rgba::new(0xff, 0, 0, 0xff)).to_string(),
            "rgba(FF:00:00:FF)"
        );
        assert_eq!(Color::palette(3).to_string(), "CPAL[3]");
        assert_eq!(Color::reg(60).to_string(), "REGS[INDEX+60]");
        assert_eq!(
            Color::blend(0x40, 0x80, 0xc1).to_string(),
            "blend(0xBF * CPAL[0], 0x40 * REGS[INDEX+1])"
        );
    }
}
