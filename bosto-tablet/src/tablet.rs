//! Tablet core: one tool state, one sink, one lock
//!
//! Both logical devices' report readers observe the same physical stream and
//! may complete concurrently. Every report is decoded and published while
//! holding a single lock, so proximity, contact and publish steps are
//! linearized across readers.

use std::time::Instant;

use bosto_transport::ReportHandler;
use parking_lot::Mutex;
use tracing::debug;

use crate::decoder::{decode_report, Decoded, PointerSample, ToolState};
use crate::features::DeviceProfile;
use crate::sink::{AbsAxis, LogicalDevice, MiscCode, OutputSink};

struct Inner<S> {
    tool: ToolState,
    sink: S,
}

/// Decoder plus publisher for one physical tablet
pub struct Tablet<S: OutputSink> {
    profile: &'static DeviceProfile,
    inner: Mutex<Inner<S>>,
}

impl<S: OutputSink> Tablet<S> {
    /// Create a tablet core publishing to `sink`
    pub fn new(profile: &'static DeviceProfile, sink: S) -> Self {
        Self {
            profile,
            inner: Mutex::new(Inner {
                tool: ToolState::new(),
                sink,
            }),
        }
    }

    /// Profile this tablet was attached with
    pub fn profile(&self) -> &'static DeviceProfile {
        self.profile
    }

    /// Decode and publish one report using the current time
    pub fn process_report(&self, report: &[u8]) -> PointerSample {
        self.process_report_at(report, Instant::now())
    }

    /// Decode and publish one report as if it arrived at `now`
    pub fn process_report_at(&self, report: &[u8], now: Instant) -> PointerSample {
        debug!("Bosto packet: {:02x?}", report);

        let mut inner = self.inner.lock();
        let Inner { tool, sink } = &mut *inner;
        let decoded = decode_report(report, tool, now);
        publish(sink, &decoded, self.profile.pid);
        decoded.sample
    }

    /// Snapshot of the shared tool state
    pub fn tool_state(&self) -> ToolState {
        self.inner.lock().tool.clone()
    }

    /// Run `f` with exclusive access to the sink
    pub fn with_sink<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.inner.lock().sink)
    }
}

impl<S: OutputSink> ReportHandler for Tablet<S> {
    fn handle_report(&self, report: &[u8]) {
        self.process_report(report);
    }
}

/// Emit one decoded report.
///
/// Key transitions go first, then the sample goes to the routed device,
/// then both devices get a sync marker so the idle one never goes stale.
fn publish<S: OutputSink>(sink: &mut S, decoded: &Decoded, serial: u16) {
    for key in &decoded.keys {
        sink.report_key(key.device, key.key, key.pressed);
    }

    let target = decoded.target;
    let sample = &decoded.sample;
    let id = i32::from(sample.device_id.0);

    if decoded.is_heartbeat() {
        sink.report_absolute(target, AbsAxis::Misc, id);
        sink.report_misc(target, MiscCode::Serial, i32::from(serial));
    }

    sink.report_absolute(target, AbsAxis::X, i32::from(sample.x));
    sink.report_absolute(target, AbsAxis::Y, i32::from(sample.y));
    sink.report_absolute(target, AbsAxis::Pressure, i32::from(sample.pressure));
    sink.report_absolute(target, AbsAxis::Misc, id);
    sink.report_misc(target, MiscCode::Serial, i32::from(serial));

    for device in LogicalDevice::ALL {
        sink.sync(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features;
    use crate::sink::{Button, RecordingSink, SinkEvent};

    fn tablet() -> Tablet<RecordingSink> {
        Tablet::new(features::lookup(0x9018).unwrap(), RecordingSink::new())
    }

    #[test]
    fn test_publish_order_for_contact() {
        let tablet = tablet();
        let t0 = Instant::now();
        tablet.process_report_at(&[0x02, 0xc2, 0, 0x20, 0, 0, 0, 0, 0, 0], t0);
        tablet.with_sink(|s| s.clear());

        tablet.process_report_at(
            &[0x02, 0xe0, 0x01, 0x00, 0x02, 0x00, 0x10, 0x00, 0, 0],
            t0 + std::time::Duration::from_secs(1),
        );

        let events = tablet.with_sink(|s| s.events().to_vec());
        let stylus = LogicalDevice::Stylus;
        assert_eq!(
            events,
            vec![
                (stylus, SinkEvent::Key(Button::ToolPen, true)),
                (stylus, SinkEvent::Key(Button::Touch, true)),
                (stylus, SinkEvent::Key(Button::Stylus2, false)),
                (stylus, SinkEvent::Abs(AbsAxis::X, 0x100)),
                (stylus, SinkEvent::Abs(AbsAxis::Y, 0x200)),
                (stylus, SinkEvent::Abs(AbsAxis::Pressure, 0x80)),
                (stylus, SinkEvent::Abs(AbsAxis::Misc, 0x02)),
                (stylus, SinkEvent::Misc(MiscCode::Serial, 0x9018)),
                (stylus, SinkEvent::Sync),
                (LogicalDevice::Eraser, SinkEvent::Sync),
            ]
        );
    }

    #[test]
    fn test_heartbeat_reports_id_and_serial() {
        let tablet = tablet();
        tablet.process_report(&[0x0c, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

        let stylus = tablet.with_sink(|s| s.events_for(LogicalDevice::Stylus));
        assert_eq!(
            stylus,
            vec![
                SinkEvent::Abs(AbsAxis::Misc, 0),
                SinkEvent::Misc(MiscCode::Serial, 0x9018),
                SinkEvent::Abs(AbsAxis::X, 0),
                SinkEvent::Abs(AbsAxis::Y, 0),
                SinkEvent::Abs(AbsAxis::Pressure, 0),
                SinkEvent::Abs(AbsAxis::Misc, 0),
                SinkEvent::Misc(MiscCode::Serial, 0x9018),
                SinkEvent::Sync,
            ]
        );
        assert_eq!(
            tablet.with_sink(|s| s.events_for(LogicalDevice::Eraser)),
            vec![SinkEvent::Sync]
        );
    }
}
