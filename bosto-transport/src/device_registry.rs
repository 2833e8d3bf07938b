//! Device registry - USB identities the driver binds to
//!
//! Report geometry for each product lives in the tablet crate's feature
//! table; this module only knows how to recognize the hardware on the bus.

/// Hanwang vendor ID (Bosto tablets are rebadged Hanwang hardware)
pub const VENDOR_ID: u16 = 0x0b57;

/// Bosto Kingtee 14WA
pub const PID_BOSTO_14WA: u16 = 0x9018;

/// Products the driver will attempt to attach to
pub const SUPPORTED_PIDS: &[u16] = &[PID_BOSTO_14WA];

/// USB interface qualification for the pen interrupt endpoint
pub mod interface {
    /// HID
    pub const CLASS: u8 = 0x03;
    /// Boot interface
    pub const SUB_CLASS: u8 = 0x01;
    /// Mouse
    pub const PROTOCOL: u8 = 0x02;
}

/// USB interface class/subclass/protocol triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceTriple {
    pub class: u8,
    pub sub_class: u8,
    pub protocol: u8,
}

impl InterfaceTriple {
    /// The triple the pen interface reports
    pub const PEN: InterfaceTriple = InterfaceTriple {
        class: interface::CLASS,
        sub_class: interface::SUB_CLASS,
        protocol: interface::PROTOCOL,
    };
}

impl std::fmt::Display for InterfaceTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.class, self.sub_class, self.protocol)
    }
}

/// Check if a VID/PID pair is a product we bind to
#[inline]
pub fn is_supported(vid: u16, pid: u16) -> bool {
    vid == VENDOR_ID && SUPPORTED_PIDS.contains(&pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_ids() {
        assert!(is_supported(0x0b57, 0x9018));
        assert!(!is_supported(0x0b57, 0x0000));
        assert!(!is_supported(0x056a, 0x9018)); // right pid, wrong vendor
    }

    #[test]
    fn test_pen_interface_triple() {
        assert_eq!(
            InterfaceTriple::PEN,
            InterfaceTriple {
                class: 3,
                sub_class: 1,
                protocol: 2
            }
        );
        assert_eq!(InterfaceTriple::PEN.to_string(), "(3, 1, 2)");
    }
}
