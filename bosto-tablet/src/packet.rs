//! Raw interrupt report parsing
//!
//! Report layout (10 bytes):
//! - Byte 0: report kind (`0x02` pen, `0x0c` tablet heartbeat)
//! - Byte 1: pen status (proximity / contact / stylus button)
//! - Bytes 2-3: X, big-endian (byte 3 carries the tool code on tool-in)
//! - Bytes 4-5: Y, big-endian
//! - Byte 6: pressure bits 10..3
//! - Byte 7: pressure bits 2..1 in its top two bits
//! - Bytes 8-9: unused

use zerocopy::byteorder::big_endian::U16;
use zerocopy::{FromBytes, Immutable, KnownLayout};

/// Report kind byte values
pub mod kind {
    /// Pen event
    pub const PEN: u8 = 0x02;
    /// Tablet heartbeat, no coordinates
    pub const HEARTBEAT: u8 = 0x0c;
}

/// Pen status byte values
pub mod status {
    /// Tool left proximity
    pub const TOOL_OUT: u8 = 0x80;
    /// Tool entered proximity
    pub const TOOL_IN: u8 = 0xc2;
    /// In range, not touching (`0xa2`/`0xa3` with the barrel button held)
    pub const FLOAT_FIRST: u8 = 0xa0;
    pub const FLOAT_LAST: u8 = 0xa3;
    /// Touching (`0xe2`/`0xe3` with the barrel button held)
    pub const CONTACT_FIRST: u8 = 0xe0;
    pub const CONTACT_LAST: u8 = 0xe3;
}

/// Tool codes found in the high nibble of byte 3 on tool-in
pub mod tool_code {
    pub const STYLUS_TIP: u8 = 0x20;
    pub const ERASER: u8 = 0xa0;
}

/// Fixed view over a pen report's position payload, starting at byte 1
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
struct PenPayload {
    status: u8,
    x: U16,
    y: U16,
    pressure_hi: u8,
    pressure_lo: u8,
}

/// One parsed report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenPacket {
    /// Tool left proximity
    ToolOut,
    /// Tool entered proximity; `tool_code` is the raw byte 3
    ToolIn { tool_code: u8 },
    /// Tool hovering in range
    Float { x: u16, y: u16, stylus2: bool },
    /// Tool touching the surface; `pressure` is the raw 11-bit reading
    Contact {
        x: u16,
        y: u16,
        stylus2: bool,
        pressure: u16,
    },
    /// Tablet heartbeat
    Heartbeat,
    /// Pen report with a status byte we do not know
    UnknownPenStatus(u8),
    /// Report kind we do not know
    Malformed(u8),
    /// Pen report too short to hold its payload
    Truncated(usize),
}

/// Combine the two pressure bytes.
///
/// Bit layout is fixed by the hardware: `(hi << 3) | ((lo & 0xc0) >> 5)`.
#[inline]
pub fn pressure_from_bytes(hi: u8, lo: u8) -> u16 {
    (u16::from(hi) << 3) | (u16::from(lo & 0xc0) >> 5)
}

/// Parse one raw report. Total over every input.
pub fn parse_report(data: &[u8]) -> PenPacket {
    let Some(&first) = data.first() else {
        return PenPacket::Truncated(0);
    };

    match first {
        kind::PEN => parse_pen(data),
        kind::HEARTBEAT => PenPacket::Heartbeat,
        other => PenPacket::Malformed(other),
    }
}

fn parse_pen(data: &[u8]) -> PenPacket {
    let Some(&pen_status) = data.get(1) else {
        return PenPacket::Truncated(data.len());
    };

    match pen_status {
        status::TOOL_OUT => PenPacket::ToolOut,
        status::TOOL_IN => match data.get(3) {
            Some(&tool_code) => PenPacket::ToolIn { tool_code },
            None => PenPacket::Truncated(data.len()),
        },
        status::FLOAT_FIRST..=status::FLOAT_LAST
        | status::CONTACT_FIRST..=status::CONTACT_LAST => {
            parse_position(pen_status, &data[1..]).unwrap_or(PenPacket::Truncated(data.len()))
        }
        other => PenPacket::UnknownPenStatus(other),
    }
}

fn parse_position(pen_status: u8, payload: &[u8]) -> Option<PenPacket> {
    let (pen, _) = PenPayload::read_from_prefix(payload).ok()?;
    let x = pen.x.get();
    let y = pen.y.get();

    Some(match pen_status {
        status::CONTACT_FIRST..=status::CONTACT_LAST => PenPacket::Contact {
            x,
            y,
            stylus2: matches!(pen.status, 0xe2 | 0xe3),
            pressure: pressure_from_bytes(pen.pressure_hi, pen.pressure_lo),
        },
        _ => PenPacket::Float {
            x,
            y,
            stylus2: matches!(pen.status, 0xa2 | 0xa3),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(bytes: &[u8]) -> [u8; 10] {
        let mut buf = [0u8; 10];
        buf[..bytes.len()].copy_from_slice(bytes);
        buf
    }

    #[test]
    fn test_parse_float() {
        let packet = parse_report(&report(&[0x02, 0xa0, 0x12, 0x34, 0x56, 0x78]));
        assert_eq!(
            packet,
            PenPacket::Float {
                x: 0x1234,
                y: 0x5678,
                stylus2: false
            }
        );

        let packet = parse_report(&report(&[0x02, 0xa3, 0x00, 0x01, 0x00, 0x02]));
        assert_eq!(
            packet,
            PenPacket::Float {
                x: 1,
                y: 2,
                stylus2: true
            }
        );
    }

    #[test]
    fn test_parse_contact() {
        let packet = parse_report(&report(&[0x02, 0xe2, 0x00, 0x10, 0x00, 0x20, 0x30, 0xc0]));
        assert_eq!(
            packet,
            PenPacket::Contact {
                x: 0x0010,
                y: 0x0020,
                stylus2: true,
                pressure: 0x186,
            }
        );

        let packet = parse_report(&report(&[0x02, 0xe1, 0x27, 0xde, 0x1c, 0xfe, 0x01, 0x00]));
        assert_eq!(
            packet,
            PenPacket::Contact {
                x: 0x27de,
                y: 0x1cfe,
                stylus2: false,
                pressure: 8,
            }
        );
    }

    #[test]
    fn test_pressure_bit_layout() {
        assert_eq!(pressure_from_bytes(0, 0), 0);
        assert_eq!(pressure_from_bytes(0x30, 0xc0), 0x186);
        // Only the top two bits of the low byte count
        assert_eq!(pressure_from_bytes(0, 0x3f), 0);
        assert_eq!(pressure_from_bytes(0, 0x40), 2);
        assert_eq!(pressure_from_bytes(0, 0x80), 4);
        assert_eq!(pressure_from_bytes(0xff, 0xff), (0xff << 3) | 6);
    }

    #[test]
    fn test_parse_proximity() {
        assert_eq!(parse_report(&report(&[0x02, 0x80])), PenPacket::ToolOut);
        assert_eq!(
            parse_report(&report(&[0x02, 0xc2, 0x00, 0x2f])),
            PenPacket::ToolIn { tool_code: 0x2f }
        );
    }

    #[test]
    fn test_parse_heartbeat_and_garbage() {
        assert_eq!(parse_report(&report(&[0x0c, 0xff, 0xff])), PenPacket::Heartbeat);
        assert_eq!(parse_report(&report(&[0x07])), PenPacket::Malformed(0x07));
        assert_eq!(
            parse_report(&report(&[0x02, 0x55])),
            PenPacket::UnknownPenStatus(0x55)
        );
        assert_eq!(parse_report(&[]), PenPacket::Truncated(0));
        assert_eq!(parse_report(&[0x02, 0xe0, 0x00]), PenPacket::Truncated(3));
        // A heartbeat needs no payload
        assert_eq!(parse_report(&[0x0c]), PenPacket::Heartbeat);
        assert_eq!(parse_report(&[0x02]), PenPacket::Truncated(1));
        assert_eq!(parse_report(&[0x02, 0xc2, 0x00]), PenPacket::Truncated(3));
        assert_eq!(
            parse_report(&[0x02, 0xa0, 0x00, 0x10, 0x00, 0x20, 0x30]),
            PenPacket::Truncated(7)
        );
    }

    #[test]
    fn test_proximity_needs_only_its_bytes() {
        assert_eq!(parse_report(&[0x02, 0x80]), PenPacket::ToolOut);
        assert_eq!(
            parse_report(&[0x02, 0xc2, 0x00, 0xa5]),
            PenPacket::ToolIn { tool_code: 0xa5 }
        );
    }
}
