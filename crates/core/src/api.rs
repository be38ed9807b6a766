use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, SessionError},
    types::{Analysis, AnswerMode, AskOutcome, VideoAnalysis},
};

/// Typed HTTP client for the video analysis backend.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    url: &'a str,
}

/// Analyze response. The server wraps the artifact in envelope fields
/// (`status`, timestamps) which are not load-bearing here.
#[derive(Deserialize)]
struct AnalyzeResponse {
    video_id: String,
    #[serde(default)]
    analysis: Option<Analysis>,
}

#[derive(Serialize)]
struct AskRequest<'a> {
    video_id: &'a str,
    question: &'a str,
    mode: &'a str,
}

#[derive(Deserialize)]
struct AskEnvelope {
    data: AskData,
}

/// Raw ask payload before the kind is resolved. The `type` field
/// discriminates; the answer fields present depend on it.
#[derive(Deserialize)]
struct AskData {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    transcript_answer: Option<String>,
    #[serde(default)]
    general_answer: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let resp = self.http.get(self.url("/health")).send().await?;
        Ok(resp.error_for_status()?.json().await?)
    }

    /// Submit a video URL for analysis. A response without an `analysis`
    /// payload is a hard failure for the caller.
    pub async fn analyze(&self, video_url: &str) -> Result<VideoAnalysis> {
        let resp = self
            .http
            .post(self.url("/api/analyze"))
            .json(&AnalyzeRequest { url: video_url })
            .send()
            .await?;

        let body: AnalyzeResponse = resp.error_for_status()?.json().await?;
        let analysis = body.analysis.ok_or(SessionError::MissingAnalysis)?;

        Ok(VideoAnalysis {
            video_id: body.video_id,
            analysis,
        })
    }
}

/// Seam between the session controller and the ask-question exchange.
#[async_trait]
pub trait AskTransport: Send + Sync {
    async fn ask(
        &self,
        video_id: &str,
        question: &str,
        mode: AnswerMode,
    ) -> Result<AskOutcome>;
}

#[async_trait]
impl AskTransport for ApiClient {
    async fn ask(
        &self,
        video_id: &str,
        question: &str,
        mode: AnswerMode,
    ) -> Result<AskOutcome> {
        let resp = self
            .http
            .post(self.url("/api/ask"))
            .json(&AskRequest {
                video_id,
                question,
                mode: mode.wire_name(),
            })
            .send()
            .await?;

        let envelope: AskEnvelope = resp.error_for_status()?.json().await?;
        decode_ask(envelope.data)
    }
}

/// Resolve the backend-declared response kind into the fan-out contract.
/// `"default"` is what older servers call transcript-grounded answers.
fn decode_ask(data: AskData) -> Result<AskOutcome> {
    match data.kind.as_str() {
        "beyond" => {
            let transcript_answer = require(data.transcript_answer, "transcript_answer")?;
            let general_answer = require(data.general_answer, "general_answer")?;
            Ok(AskOutcome::Dual {
                transcript_answer,
                general_answer,
            })
        }
        "buddy" => Ok(AskOutcome::Single {
            mode: AnswerMode::Buddy,
            answer: require(data.answer, "answer")?,
        }),
        "transcript" | "default" => Ok(AskOutcome::Single {
            mode: AnswerMode::Transcript,
            answer: require(data.answer, "answer")?,
        }),
        other => Err(SessionError::UnexpectedResponse {
            reason: format!("unknown answer kind `{other}`"),
        }),
    }
}

fn require(field: Option<String>, name: &str) -> Result<String> {
    field.ok_or_else(|| SessionError::UnexpectedResponse {
        reason: format!("missing `{name}` field"),
    })
}
