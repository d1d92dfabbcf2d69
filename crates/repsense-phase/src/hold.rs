//! Hold accumulator - isometric hold time across interruptions
//!
//! Time is credited only while a segment is open. Entry and exit are
//! immediate: no debounce, so unstable time is never counted.
//! Time between a segment breaking and the next one opening is tracked
//! separately as broken time; gated frames are neither held nor broken.

use std::time::Duration;

use tracing::{debug, info};

use repsense_core::FrameTime;

/// What one observation did to the accumulator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoldEvent {
    /// Predicate false and no segment open
    Idle,
    /// A new segment opened at this instant
    Opened,
    /// Segment still open
    Continuing,
    /// Segment closed; carries the segment length
    Closed(Duration),
}

/// Continuous-hold accumulator
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HoldAccumulator {
    accumulated: Duration,
    segment_start: Option<FrameTime>,
    segments: u32,
    broken: Duration,
    broken_since: Option<FrameTime>,
}

impl HoldAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_holding(&self) -> bool {
        self.segment_start.is_some()
    }

    /// Closed segments only
    pub fn accumulated(&self) -> Duration {
        self.accumulated
    }

    /// Time spent out of position after a segment broke
    pub fn broken(&self) -> Duration {
        self.broken
    }

    /// Number of segments opened so far
    pub fn segments(&self) -> u32 {
        self.segments
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed the hold-stable predicate at `now`
    pub fn observe(&mut self, stable: bool, now: FrameTime) -> HoldEvent {
        match (stable, self.segment_start) {
            (true, None) => {
                if let Some(since) = self.broken_since.take() {
                    self.broken += now - since;
                }
                self.segment_start = Some(now);
                self.segments += 1;
                info!(segment = self.segments, "hold segment opened");
                HoldEvent::Opened
            }
            (true, Some(_)) => HoldEvent::Continuing,
            (false, Some(_)) => match self.close(now) {
                Some(length) => {
                    self.broken_since = Some(now);
                    HoldEvent::Closed(length)
                }
                None => HoldEvent::Idle,
            },
            (false, None) => HoldEvent::Idle,
        }
    }

    /// Close any open segment, crediting its length
    pub fn close(&mut self, now: FrameTime) -> Option<Duration> {
        let start = self.segment_start.take()?;
        let length = now - start;
        self.accumulated += length;
        debug!(
            length_ms = length.as_millis() as u64,
            total_ms = self.accumulated.as_millis() as u64,
            "hold segment closed"
        );
        Some(length)
    }

    /// Close the open segment and any running break at session end
    pub fn finish(&mut self, now: FrameTime) -> Duration {
        self.close(now);
        if let Some(since) = self.broken_since.take() {
            self.broken += now - since;
        }
        self.accumulated
    }

    /// Accumulated total plus the open segment, if any
    pub fn elapsed(&self, now: FrameTime) -> Duration {
        match self.segment_start {
            Some(start) => self.accumulated + (now - start),
            None => self.accumulated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(ms: u64) -> FrameTime {
        FrameTime::from_millis(ms)
    }

    #[test]
    fn test_accumulates_across_interruption() {
        let mut hold = HoldAccumulator::new();

        assert_eq!(hold.observe(true, at(0)), HoldEvent::Opened);
        assert_eq!(hold.observe(true, at(1500)), HoldEvent::Continuing);
        assert_eq!(
            hold.observe(false, at(3000)),
            HoldEvent::Closed(Duration::from_secs(3))
        );
        assert_eq!(hold.observe(false, at(3500)), HoldEvent::Idle);
        assert_eq!(hold.elapsed(at(3900)), Duration::from_secs(3));

        assert_eq!(hold.observe(true, at(4000)), HoldEvent::Opened);
        assert_eq!(hold.elapsed(at(5000)), Duration::from_secs(4));

        hold.close(at(6000));
        assert_eq!(hold.accumulated(), Duration::from_secs(5));
        assert_eq!(hold.segments(), 2);
        assert!(!hold.is_holding());
    }

    #[test]
    fn test_broken_time_tracked_between_segments() {
        let mut hold = HoldAccumulator::new();
        hold.observe(true, at(0));
        hold.observe(false, at(2000));
        hold.observe(false, at(2300));
        hold.observe(true, at(2500));
        assert_eq!(hold.broken(), Duration::from_millis(500));

        // A gate close does not start a break
        hold.close(at(3000));
        hold.observe(true, at(4000));
        assert_eq!(hold.broken(), Duration::from_millis(500));

        // A break still running at the end is counted
        hold.observe(false, at(5000));
        assert_eq!(hold.finish(at(5400)), Duration::from_millis(3500));
        assert_eq!(hold.broken(), Duration::from_millis(900));
    }

    #[test]
    fn test_close_without_segment_is_noop() {
        let mut hold = HoldAccumulator::new();
        assert_eq!(hold.close(at(1000)), None);
        assert_eq!(hold.elapsed(at(2000)), Duration::ZERO);
    }

    proptest! {
        #[test]
        fn prop_total_never_exceeds_stable_time(flags in prop::collection::vec(any::<bool>(), 1..200)) {
            let mut hold = HoldAccumulator::new();
            let step = 33u64;
            let mut stable_ms = 0u64;
            let mut prev = false;

            for (i, stable) in flags.iter().enumerate() {
                let now = at(i as u64 * step);
                if prev {
                    stable_ms += step;
                }
                hold.observe(*stable, now);
                prev = *stable;
            }
            let end = at(flags.len() as u64 * step);
            if prev {
                stable_ms += step;
            }
            hold.close(end);
            prop_assert!(hold.accumulated() <= Duration::from_millis(stable_ms));
        }
    }
}
