use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Artifact produced by `POST /api/analyze`, immutable for the session's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoAnalysis {
    pub video_id: String,
    pub analysis: Analysis,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
}

pub const TRANSCRIPT_PLACEHOLDER: &str = "Transcript not available";
pub const SUMMARY_PLACEHOLDER: &str = "No summary available";
pub const KEY_POINTS_PLACEHOLDER: &str = "No key points generated for this video";

impl Analysis {
    pub fn transcript_text(&self) -> &str {
        self.transcript.as_deref().unwrap_or(TRANSCRIPT_PLACEHOLDER)
    }

    pub fn summary_text(&self) -> &str {
        self.summary.as_deref().unwrap_or(SUMMARY_PLACEHOLDER)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Client-selected answer strategy for the next question. Changing it never
/// rewrites history; each outgoing question carries the mode active at send time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    #[default]
    Transcript,
    Buddy,
    Beyond,
}

pub struct ModeHint {
    pub title: &'static str,
    pub description: &'static str,
    pub example: &'static str,
}

impl AnswerMode {
    pub fn wire_name(&self) -> &'static str {
        match self {
            AnswerMode::Transcript => "transcript",
            AnswerMode::Buddy => "buddy",
            AnswerMode::Beyond => "beyond",
        }
    }

    pub fn hint(&self) -> ModeHint {
        match self {
            AnswerMode::Transcript => ModeHint {
                title: "Transcript Mode",
                description: "Answers strictly from video content",
                example: "What does the video say about...?",
            },
            AnswerMode::Buddy => ModeHint {
                title: "Buddy Mode",
                description: "General knowledge answers (ignores transcript)",
                example: "Hey buddy, tell me about...",
            },
            AnswerMode::Beyond => ModeHint {
                title: "Beyond Mode",
                description: "Transcript answer + general knowledge",
                example: "Beyond the transcript, explain...",
            },
        }
    }
}

/// One message in the session's append-only conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: Role,
    pub text: String,
    /// `None` only for the synthetic greeting seeded at session start.
    pub created_at: Option<SystemTime>,
    /// Which answer strategy produced this entry; assistant entries only.
    pub mode: Option<AnswerMode>,
}

/// Ask-question response, decoded once at the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    Single {
        mode: AnswerMode,
        answer: String,
    },
    Dual {
        transcript_answer: String,
        general_answer: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Summary,
    KeyPoints,
}

/// Which copy action most recently fired, for the transient "Copied!" feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTag {
    Transcript,
    Summary,
}
