//! Feedback events

use serde::Serialize;

use repsense_core::FrameTime;

/// Where a feedback message came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackKind {
    /// A pipeline gate short-circuited the frame
    Gate,
    /// Readiness and phase cues
    Cue,
    /// Outcome of a completed rep
    RepResult,
    /// Hold segment updates
    Hold,
}

/// A text message plus an optional spoken utterance
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedbackEvent {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speak: Option<String>,
    #[serde(skip)]
    pub at: FrameTime,
    #[serde(skip)]
    pub kind: FeedbackKind,
}

impl FeedbackEvent {
    /// Text-only event
    pub fn text(kind: FeedbackKind, text: impl Into<String>, at: FrameTime) -> Self {
        FeedbackEvent {
            text: text.into(),
            speak: None,
            at,
            kind,
        }
    }

    /// Event whose text is also spoken
    pub fn spoken(kind: FeedbackKind, text: impl Into<String>, at: FrameTime) -> Self {
        let text = text.into();
        FeedbackEvent {
            speak: Some(text.clone()),
            text,
            at,
            kind,
        }
    }
}
