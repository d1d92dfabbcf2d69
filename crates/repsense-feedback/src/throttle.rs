//! Feedback throttle - rate limit and back-to-back deduplication
//!
//! The visible message changes at most once per interval. A message offered
//! too early is held as pending and released by a later poll; a newer offer
//! replaces it, so the latest text wins.

use std::time::Duration;

use serde::Deserialize;
use tracing::trace;

use repsense_core::FrameTime;

use crate::FeedbackEvent;

/// Throttle configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Minimum time between visible message changes, milliseconds
    pub interval_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        ThrottleConfig { interval_ms: 400 }
    }
}

impl ThrottleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Rate limiter for the visible feedback line
#[derive(Clone, Debug)]
pub struct FeedbackThrottle {
    interval: Duration,
    shown: Option<String>,
    shown_at: Option<FrameTime>,
    pending: Option<FeedbackEvent>,
}

impl FeedbackThrottle {
    pub fn new(config: &ThrottleConfig) -> Self {
        FeedbackThrottle {
            interval: config.interval(),
            shown: None,
            shown_at: None,
            pending: None,
        }
    }

    /// Currently visible text
    pub fn current(&self) -> Option<&str> {
        self.shown.as_deref()
    }

    pub fn pending(&self) -> Option<&FeedbackEvent> {
        self.pending.as_ref()
    }

    pub fn reset(&mut self) {
        self.shown = None;
        self.shown_at = None;
        self.pending = None;
    }

    fn may_show(&self, now: FrameTime) -> bool {
        self.shown_at
            .map_or(true, |last| now.since(last) >= self.interval)
    }

    /// Offer a new message; returns it if it should be shown now
    pub fn offer(&mut self, event: FeedbackEvent) -> Option<FeedbackEvent> {
        if self.shown.as_deref() == Some(event.text.as_str()) {
            // Same as what is on screen: nothing newer should replace it
            self.pending = None;
            trace!(text = %event.text, "duplicate feedback dropped");
            return None;
        }

        if self.may_show(event.at) {
            self.pending = None;
            return Some(self.show(event));
        }

        trace!(text = %event.text, "feedback held as pending");
        self.pending = Some(event);
        None
    }

    /// Release the pending message once the interval has elapsed
    pub fn poll(&mut self, now: FrameTime) -> Option<FeedbackEvent> {
        if self.pending.is_none() || !self.may_show(now) {
            return None;
        }
        let mut event = self.pending.take()?;
        event.at = now;
        Some(self.show(event))
    }

    fn show(&mut self, event: FeedbackEvent) -> FeedbackEvent {
        self.shown = Some(event.text.clone());
        self.shown_at = Some(event.at);
        event
    }
}

impl Default for FeedbackThrottle {
    fn default() -> Self {
        Self::new(&ThrottleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FeedbackKind;

    fn msg(text: &str, ms: u64) -> FeedbackEvent {
        FeedbackEvent::text(FeedbackKind::Cue, text, FrameTime::from_millis(ms))
    }

    #[test]
    fn test_first_message_shows_immediately() {
        let mut throttle = FeedbackThrottle::default();
        assert!(throttle.offer(msg("Get into position", 0)).is_some());
        assert_eq!(throttle.current(), Some("Get into position"));
    }

    #[test]
    fn test_back_to_back_duplicate_is_dropped() {
        let mut throttle = FeedbackThrottle::default();
        throttle.offer(msg("Hold position...", 0));
        assert!(throttle.offer(msg("Hold position...", 1000)).is_none());
        assert!(throttle.poll(FrameTime::from_millis(2000)).is_none());
    }

    #[test]
    fn test_early_message_is_pending_latest_wins() {
        let mut throttle = FeedbackThrottle::default();
        throttle.offer(msg("Down!", 0));

        assert!(throttle.offer(msg("Squat deeper", 100)).is_none());
        assert!(throttle.offer(msg("Great squat!", 200)).is_none());
        assert!(throttle.poll(FrameTime::from_millis(300)).is_none());

        let released = throttle.poll(FrameTime::from_millis(400)).unwrap();
        assert_eq!(released.text, "Great squat!");
        assert_eq!(released.at, FrameTime::from_millis(400));
        assert!(throttle.pending().is_none());
    }

    #[test]
    fn test_message_after_interval_shows_directly() {
        let mut throttle = FeedbackThrottle::default();
        throttle.offer(msg("Down!", 0));
        let shown = throttle.offer(msg("Great squat!", 450));
        assert_eq!(shown.map(|e| e.text), Some("Great squat!".to_string()));
    }
}
