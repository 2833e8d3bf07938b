//! End-to-end tests: raw report streams through the tablet core.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bosto_tablet::{
    features, AbsAxis, Button, DeviceId, LogicalDevice, RecordingSink, SinkEvent, Tablet, Tool,
};
use bosto_transport::{
    DeviceGone, GoneReason, ReaderConfig, ReportReader, ReportSource, TransportError,
};
use tokio::sync::mpsc;

fn report(bytes: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; 10];
    buf[..bytes.len()].copy_from_slice(bytes);
    buf
}

fn tablet() -> Tablet<RecordingSink> {
    Tablet::new(features::lookup(0x9018).unwrap(), RecordingSink::new())
}

/// A stylus stroke followed by an eraser stroke
fn session() -> Vec<Vec<u8>> {
    vec![
        report(&[0x02, 0xc2, 0x00, 0x20]),                               // stylus in
        report(&[0x02, 0xa0, 0x01, 0x00, 0x01, 0x00]),                   // hover
        report(&[0x02, 0xe0, 0x01, 0x10, 0x01, 0x10, 0x40, 0x00]),       // touch
        report(&[0x0c]),                                                 // heartbeat
        report(&[0x02, 0xe2, 0x01, 0x20, 0x01, 0x20, 0x80, 0x40]),       // touch + button
        report(&[0x02, 0x80]),                                           // out
        report(&[0x02, 0xc2, 0x00, 0xa0]),                               // eraser in
        report(&[0x02, 0xe1, 0x02, 0x00, 0x02, 0x00, 0x20, 0x00]),       // erase
        report(&[0x02, 0x80]),                                           // out
        report(&[0x5a, 0x5a]),                                           // garbage
    ]
}

#[test]
fn every_report_syncs_both_devices_once() {
    let tablet = tablet();
    let reports = session();
    for r in &reports {
        tablet.process_report(r);
    }

    tablet.with_sink(|sink| {
        assert_eq!(sink.sync_count(LogicalDevice::Stylus), reports.len());
        assert_eq!(sink.sync_count(LogicalDevice::Eraser), reports.len());
    });
}

#[test]
fn stylus_then_eraser_session_routes_correctly() {
    let tablet = tablet();
    let t0 = Instant::now();
    let later = t0 + Duration::from_secs(1);

    tablet.process_report_at(&report(&[0x02, 0xc2, 0x00, 0x20]), t0);
    let sample =
        tablet.process_report_at(&report(&[0x02, 0xe0, 0x01, 0x10, 0x01, 0x10, 0x40, 0x00]), later);
    assert_eq!(sample.pressure, 0x200);
    assert_eq!(sample.device_id, DeviceId::STYLUS);
    tablet.with_sink(|sink| {
        assert_eq!(sink.last_abs(LogicalDevice::Stylus, AbsAxis::X), Some(0x110));
        assert_eq!(sink.last_key(LogicalDevice::Stylus, Button::Touch), Some(true));
        assert_eq!(sink.last_abs(LogicalDevice::Eraser, AbsAxis::X), None);
    });

    tablet.process_report_at(&report(&[0x02, 0x80]), later);
    tablet.with_sink(|sink| {
        assert_eq!(sink.last_key(LogicalDevice::Stylus, Button::ToolPen), Some(false));
    });

    tablet.process_report_at(&report(&[0x02, 0xc2, 0x00, 0xa0]), later);
    assert_eq!(tablet.tool_state().current_tool, Tool::Eraser);

    // Inside the settle window: position flows, pressure is held at zero
    let sample = tablet.process_report_at(
        &report(&[0x02, 0xe1, 0x02, 0x00, 0x02, 0x00, 0x20, 0x00]),
        later + Duration::from_millis(100),
    );
    assert_eq!(sample.pressure, 0);
    tablet.with_sink(|sink| {
        assert_eq!(sink.last_key(LogicalDevice::Eraser, Button::ToolRubber), Some(true));
        assert_eq!(sink.last_abs(LogicalDevice::Eraser, AbsAxis::X), Some(0x200));
        assert_eq!(sink.last_abs(LogicalDevice::Eraser, AbsAxis::Pressure), Some(0));
        assert_eq!(
            sink.last_abs(LogicalDevice::Eraser, AbsAxis::Misc),
            Some(i32::from(DeviceId::ERASER.0))
        );
    });

    let sample = tablet.process_report_at(
        &report(&[0x02, 0xe1, 0x02, 0x00, 0x02, 0x00, 0x20, 0x00]),
        later + Duration::from_millis(230),
    );
    assert_eq!(sample.pressure, 0x100);

    tablet.process_report_at(&report(&[0x02, 0x80]), later + Duration::from_secs(1));
    tablet.with_sink(|sink| {
        assert_eq!(sink.last_key(LogicalDevice::Eraser, Button::ToolRubber), Some(false));
    });
    assert_eq!(tablet.tool_state().current_id, DeviceId::NONE);
}

#[test]
fn heartbeat_publishes_origin_and_current_id() {
    let tablet = tablet();
    tablet.process_report(&report(&[0x02, 0xc2, 0x00, 0xa0]));
    tablet.with_sink(|s| s.clear());

    let sample = tablet.process_report(&report(&[0x0c, 0xde, 0xad]));
    assert_eq!((sample.x, sample.y, sample.pressure), (0, 0, 0));
    assert_eq!(sample.device_id, DeviceId::ERASER);

    tablet.with_sink(|sink| {
        assert_eq!(sink.sync_count(LogicalDevice::Stylus), 1);
        assert_eq!(sink.sync_count(LogicalDevice::Eraser), 1);
        assert!(sink.events_for(LogicalDevice::Stylus) == vec![SinkEvent::Sync]);
    });
}

/// Replays one shared stream, then reports the device as removed
struct StreamSource {
    reports: VecDeque<Vec<u8>>,
}

impl ReportSource for StreamSource {
    fn read_report(&mut self, buf: &mut [u8], _timeout_ms: i32) -> Result<usize, TransportError> {
        match self.reports.pop_front() {
            Some(r) => {
                buf[..r.len()].copy_from_slice(&r);
                Ok(r.len())
            }
            None => Err(TransportError::Disconnected),
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn two_readers_share_one_tool_state() {
    let tablet = Arc::new(tablet());
    let (tx, mut rx) = mpsc::unbounded_channel::<DeviceGone>();
    let reports = session();

    let mut readers = Vec::new();
    for device in LogicalDevice::ALL {
        let source = Box::new(StreamSource {
            reports: reports.clone().into(),
        });
        let config = ReaderConfig::new(device.display_name(), 10);
        readers.push(
            ReportReader::start(source, tablet.clone(), config, "/dev/hidraw0".into(), tx.clone())
                .unwrap(),
        );
    }
    drop(tx);

    let mut gone = Vec::new();
    while let Ok(Some(g)) = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
        gone.push(g);
    }
    assert_eq!(gone.len(), 2, "each reader reports device gone once");
    assert!(gone.iter().all(|g| g.reason == GoneReason::Disconnected));

    // Each reader decodes the full stream
    let total = reports.len() * 2;
    tablet.with_sink(|sink| {
        assert_eq!(sink.sync_count(LogicalDevice::Stylus), total);
        assert_eq!(sink.sync_count(LogicalDevice::Eraser), total);
    });
    drop(readers);
}
