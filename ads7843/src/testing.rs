//! Scripted collaborators for unit tests.

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;

use crate::{filter::SAMPLE_COUNT, raster::FrameBuffer, RawPoint, SampleSource};

/// Replays a fixed sequence of reads. Running past the end is a test bug.
#[derive(Default)]
pub struct Script(VecDeque<Result<Option<RawPoint>, &'static str>>);

impl Script {
    /// A full burst at `point`.
    pub fn hold(mut self, point: RawPoint) -> Self {
        for _ in 0..SAMPLE_COUNT {
            self.0.push_back(Ok(Some(point)));
        }
        self
    }

    pub fn push(mut self, point: RawPoint) -> Self {
        self.0.push_back(Ok(Some(point)));
        self
    }

    pub fn lift(mut self) -> Self {
        self.0.push_back(Ok(None));
        self
    }

    pub fn fail(mut self) -> Self {
        self.0.push_back(Err("sensor fault"));
        self
    }

    pub fn remaining(&self) -> usize {
        self.0.len()
    }
}

impl SampleSource for Script {
    type Error = &'static str;

    fn read_raw_sample(&mut self) -> Result<Option<RawPoint>, Self::Error> {
        self.0.pop_front().expect("script ran dry")
    }
}

/// Adds up requested delays instead of sleeping.
#[derive(Default)]
pub struct Clock {
    pub elapsed_ns: u64,
}

impl Clock {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns / 1_000_000
    }
}

impl DelayNs for Clock {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
    }
}

pub fn screen() -> FrameBuffer<Vec<u8>> {
    FrameBuffer::new(vec![0; 320 * 240 * 2], 320, 240, 640).expect("buffer fits")
}
