use std::{collections::VecDeque, io};

use ads7843::{RawPoint, SampleSource};
use evdev::{AbsoluteAxisCode, Device, EventType, InputEvent, KeyCode, SynchronizationCode};
use log::trace;

/// Anything that hands out batches of input events.
pub trait EventSource {
    /// Appends the next batch to `out`. Blocks until one is available.
    fn fetch(&mut self, out: &mut VecDeque<InputEvent>) -> io::Result<()>;
}

impl EventSource for Device {
    fn fetch(&mut self, out: &mut VecDeque<InputEvent>) -> io::Result<()> {
        out.extend(self.fetch_events()?);
        Ok(())
    }
}

/// Contact state accumulated between reports.
#[derive(Debug, Default)]
struct Contact {
    touching: bool,
    x: Option<i32>,
    y: Option<i32>,
}

impl Contact {
    /// Folds one event in. Returns true when it closes a report.
    fn apply(&mut self, event: &InputEvent) -> bool {
        let code = event.code();
        match event.event_type() {
            EventType::KEY if code == KeyCode::BTN_TOUCH.code() => {
                self.touching = event.value() != 0
            }
            EventType::ABSOLUTE if code == AbsoluteAxisCode::ABS_X.0 => {
                self.x = Some(event.value())
            }
            EventType::ABSOLUTE if code == AbsoluteAxisCode::ABS_Y.0 => {
                self.y = Some(event.value())
            }
            EventType::SYNCHRONIZATION if code == SynchronizationCode::SYN_REPORT.0 => {
                return true
            }
            _ => (),
        }
        false
    }

    fn sample(&self) -> Option<RawPoint> {
        match (self.touching, self.x, self.y) {
            (true, Some(x), Some(y)) => Some(RawPoint::new(x, y)),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("input device stopped delivering events")]
    Disconnected,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Touch samples from a Linux input event device.
///
/// Each read blocks until the next `SYN_REPORT` and yields the latest
/// coordinates if the panel is being touched.
pub struct EvdevTouch<E> {
    events: E,
    pending: VecDeque<InputEvent>,
    contact: Contact,
}

impl<E: EventSource> EvdevTouch<E> {
    pub fn new(events: E) -> Self {
        Self {
            events,
            pending: VecDeque::new(),
            contact: Contact::default(),
        }
    }
}

impl<E: EventSource> SampleSource for EvdevTouch<E> {
    type Error = SensorError;

    fn read_raw_sample(&mut self) -> Result<Option<RawPoint>, SensorError> {
        loop {
            if self.pending.is_empty() {
                self.events.fetch(&mut self.pending)?;
            }
            let Some(event) = self.pending.pop_front() else {
                return Err(SensorError::Disconnected);
            };

            trace!(
                "event type {} code {} value {}",
                event.event_type().0,
                event.code(),
                event.value()
            );

            if self.contact.apply(&event) {
                return Ok(self.contact.sample());
            }
        }
    }
}
