use std::{sync::Arc, time::SystemTime};

use uuid::Uuid;

use crate::{
    api::AskTransport,
    error::Result,
    player::{PlayerBackend, PlayerManager, PlayerPhase},
    store::{SessionSnapshot, StateStore},
    types::{AnswerMode, AskOutcome, ConversationEntry, CopyTag, Role, Tab, VideoAnalysis},
    view::{Clipboard, ViewState},
};

pub const GREETING: &str =
    "Hi! I'm here to help you understand this video better. Ask me anything about the content!";
pub const APOLOGY: &str = "Sorry, I couldn't process your question right now.";

/// What happened to a submitted question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Blank input; nothing appended, nothing sent.
    Ignored,
    /// The backend answered and the conversation grew accordingly.
    Answered,
    /// The exchange failed; the apology entry was appended instead.
    Fallback,
}

/// Controller for one video's analysis session: owns the conversation log,
/// the active answer mode, view/clipboard state, and the player instance
/// scoped to the current video id.
pub struct Session {
    id: Uuid,
    result: VideoAnalysis,
    conversation: Vec<ConversationEntry>,
    mode: AnswerMode,
    view: ViewState,
    player: Option<PlayerManager>,
    transport: Arc<dyn AskTransport>,
    store: Option<StateStore>,
    clipboard: Box<dyn Clipboard>,
}

impl Session {
    /// Open a session over an analysis artifact. The conversation starts
    /// with exactly one synthetic greeting that is never removed.
    pub fn start(
        result: VideoAnalysis,
        transport: Arc<dyn AskTransport>,
        clipboard: Box<dyn Clipboard>,
    ) -> Self {
        let id = Uuid::new_v4();
        tracing::info!(session = %id, video = %result.video_id, "session started");

        Self {
            id,
            result,
            conversation: vec![ConversationEntry {
                role: Role::Assistant,
                text: GREETING.to_string(),
                created_at: None,
                mode: None,
            }],
            mode: AnswerMode::default(),
            view: ViewState::new(),
            player: None,
            transport,
            store: None,
            clipboard,
        }
    }

    /// Reopen a persisted session: same artifact, restored tab and mode,
    /// fresh conversation.
    pub fn restore(
        snapshot: SessionSnapshot,
        transport: Arc<dyn AskTransport>,
        clipboard: Box<dyn Clipboard>,
    ) -> Self {
        let mut session = Self::start(snapshot.result, transport, clipboard);
        session.view.set_active_tab(snapshot.active_tab);
        session.mode = snapshot.mode;
        session
    }

    /// Launch the embedded player for this session's video id.
    pub fn with_player(mut self, backend: Arc<dyn PlayerBackend>) -> Self {
        self.player = Some(PlayerManager::launch(&self.result.video_id, backend));
        self
    }

    /// Mirror the session to persistent state so a relaunch can restore it.
    pub fn with_store(mut self, store: StateStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn video_id(&self) -> &str {
        &self.result.video_id
    }

    pub fn summary_text(&self) -> &str {
        self.result.analysis.summary_text()
    }

    pub fn transcript_text(&self) -> &str {
        self.result.analysis.transcript_text()
    }

    pub fn key_points(&self) -> &[String] {
        &self.result.analysis.key_points
    }

    pub fn conversation(&self) -> &[ConversationEntry] {
        &self.conversation
    }

    pub fn mode(&self) -> AnswerMode {
        self.mode
    }

    /// Switch the strategy for subsequent questions; past entries keep the
    /// mode they were answered under.
    pub fn set_mode(&mut self, mode: AnswerMode) {
        self.mode = mode;
    }

    pub fn active_tab(&self) -> Tab {
        self.view.active_tab()
    }

    pub fn set_active_tab(&mut self, tab: Tab) {
        self.view.set_active_tab(tab);
    }

    pub fn copied_item(&self) -> Option<CopyTag> {
        self.view.copied_item()
    }

    pub fn copy_transcript(&mut self) -> anyhow::Result<()> {
        let text = self.result.analysis.transcript.clone().unwrap_or_default();
        self.view
            .copy(&text, CopyTag::Transcript, self.clipboard.as_mut())
    }

    pub fn copy_summary(&mut self) -> anyhow::Result<()> {
        let text = self.result.analysis.summary.clone().unwrap_or_default();
        self.view
            .copy(&text, CopyTag::Summary, self.clipboard.as_mut())
    }

    pub fn player_phase(&self) -> Option<PlayerPhase> {
        self.player.as_ref().map(PlayerManager::phase)
    }

    pub fn player(&self) -> Option<&PlayerManager> {
        self.player.as_ref()
    }

    /// Ask the backend about the video. The question is appended before the
    /// request goes out; the response fans out into one or two assistant
    /// entries depending on the declared kind. Failures never escape: they
    /// become the fixed apology entry.
    pub async fn submit_question(&mut self, text: &str) -> Submission {
        let question = text.trim();
        if question.is_empty() {
            return Submission::Ignored;
        }
        let question = question.to_string();

        self.conversation.push(ConversationEntry {
            role: Role::User,
            text: question.clone(),
            created_at: Some(SystemTime::now()),
            mode: None,
        });

        let outcome = self
            .transport
            .ask(&self.result.video_id, &question, self.mode)
            .await;

        let answered_at = Some(SystemTime::now());
        match outcome {
            Ok(AskOutcome::Dual {
                transcript_answer,
                general_answer,
            }) => {
                self.conversation.push(ConversationEntry {
                    role: Role::Assistant,
                    text: transcript_answer,
                    created_at: answered_at,
                    mode: Some(AnswerMode::Transcript),
                });
                self.conversation.push(ConversationEntry {
                    role: Role::Assistant,
                    text: general_answer,
                    created_at: answered_at,
                    mode: Some(AnswerMode::Beyond),
                });
                Submission::Answered
            }
            Ok(AskOutcome::Single { mode, answer }) => {
                self.conversation.push(ConversationEntry {
                    role: Role::Assistant,
                    text: answer,
                    created_at: answered_at,
                    mode: Some(mode),
                });
                Submission::Answered
            }
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "ask request failed");
                self.conversation.push(ConversationEntry {
                    role: Role::Assistant,
                    text: APOLOGY.to_string(),
                    created_at: answered_at,
                    mode: None,
                });
                Submission::Fallback
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            result: self.result.clone(),
            active_tab: self.view.active_tab(),
            mode: self.mode,
        }
    }

    /// Save the current snapshot if a store is attached.
    pub async fn persist(&self) -> Result<()> {
        if let Some(store) = &self.store {
            store.save(&self.snapshot()).await?;
        }
        Ok(())
    }

    /// Pause the session for a later relaunch: keep the snapshot, release
    /// the player.
    pub async fn suspend(&mut self) -> Result<()> {
        self.persist().await?;
        if let Some(mut player) = self.player.take() {
            player.shutdown().await;
        }
        Ok(())
    }

    /// Leave the session: drop the persisted snapshot and destroy the
    /// player instance.
    pub async fn exit(&mut self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.clear().await {
                tracing::warn!(session = %self.id, error = %e, "failed to clear session state");
            }
        }
        if let Some(mut player) = self.player.take() {
            player.shutdown().await;
        }
        tracing::info!(session = %self.id, "session closed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;

    use super::*;
    use crate::{error::SessionError, types::Analysis};

    struct ScriptedTransport {
        outcomes: Mutex<Vec<Result<AskOutcome>>>,
        calls: AtomicUsize,
        last_mode: Mutex<Option<AnswerMode>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<AskOutcome>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
                calls: AtomicUsize::new(0),
                last_mode: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl AskTransport for ScriptedTransport {
        async fn ask(
            &self,
            _video_id: &str,
            _question: &str,
            mode: AnswerMode,
        ) -> Result<AskOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_mode.lock().unwrap() = Some(mode);
            self.outcomes.lock().unwrap().remove(0)
        }
    }

    #[derive(Default)]
    struct NullClipboard;
    impl Clipboard for NullClipboard {
        fn set_contents(&mut self, _text: String) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn result() -> VideoAnalysis {
        VideoAnalysis {
            video_id: "abc".into(),
            analysis: Analysis {
                transcript: Some("T".into()),
                summary: Some("S".into()),
                key_points: vec!["k1".into(), "k2".into()],
            },
        }
    }

    fn session(transport: Arc<ScriptedTransport>) -> Session {
        Session::start(result(), transport, Box::new(NullClipboard))
    }

    #[test]
    fn conversation_opens_with_the_greeting() {
        let session = session(ScriptedTransport::new(vec![]));
        let log = session.conversation();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].role, Role::Assistant);
        assert_eq!(log[0].text, GREETING);
        assert!(log[0].created_at.is_none());
        assert!(log[0].mode.is_none());
    }

    #[tokio::test]
    async fn blank_question_is_rejected_without_a_request() {
        let transport = ScriptedTransport::new(vec![]);
        let mut session = session(transport.clone());

        assert_eq!(session.submit_question("").await, Submission::Ignored);
        assert_eq!(session.submit_question("   \t").await, Submission::Ignored);

        assert_eq!(session.conversation().len(), 1);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn single_kind_answer_appends_one_tagged_entry() {
        let transport = ScriptedTransport::new(vec![Ok(AskOutcome::Single {
            mode: AnswerMode::Buddy,
            answer: "sure thing".into(),
        })]);
        let mut session = session(transport.clone());
        session.set_mode(AnswerMode::Buddy);

        assert_eq!(
            session.submit_question("hey buddy?").await,
            Submission::Answered
        );

        let log = session.conversation();
        assert_eq!(log.len(), 3);
        assert_eq!(log[1].role, Role::User);
        assert_eq!(log[1].text, "hey buddy?");
        assert_eq!(log[2].role, Role::Assistant);
        assert_eq!(log[2].mode, Some(AnswerMode::Buddy));
        assert_eq!(*transport.last_mode.lock().unwrap(), Some(AnswerMode::Buddy));
    }

    #[tokio::test]
    async fn beyond_answer_fans_out_into_two_entries_sharing_a_timestamp() {
        let transport = ScriptedTransport::new(vec![Ok(AskOutcome::Dual {
            transcript_answer: "A".into(),
            general_answer: "B".into(),
        })]);
        let mut session = session(transport);

        session.submit_question("What is this about?").await;

        let log = session.conversation();
        assert_eq!(log.len(), 4);
        assert_eq!(log[2].text, "A");
        assert_eq!(log[2].mode, Some(AnswerMode::Transcript));
        assert_eq!(log[3].text, "B");
        assert_eq!(log[3].mode, Some(AnswerMode::Beyond));
        assert_eq!(log[2].created_at, log[3].created_at);
    }

    #[tokio::test]
    async fn transport_failure_becomes_the_apology_entry() {
        let transport = ScriptedTransport::new(vec![Err(SessionError::UnexpectedResponse {
            reason: "mangled".into(),
        })]);
        let mut session = session(transport);
        let before = session.conversation().len();

        assert_eq!(
            session.submit_question("anyone home?").await,
            Submission::Fallback
        );

        let log = session.conversation();
        assert_eq!(log.len(), before + 2);
        let last = log.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.text, APOLOGY);
        assert!(last.mode.is_none());
    }

    #[tokio::test]
    async fn switching_mode_never_rewrites_history() {
        let transport = ScriptedTransport::new(vec![Ok(AskOutcome::Single {
            mode: AnswerMode::Transcript,
            answer: "from the video".into(),
        })]);
        let mut session = session(transport);

        session.submit_question("q1").await;
        session.set_mode(AnswerMode::Beyond);

        assert_eq!(
            session.conversation()[2].mode,
            Some(AnswerMode::Transcript)
        );
        assert_eq!(session.mode(), AnswerMode::Beyond);
    }

    #[test]
    fn tabs_reflect_the_artifact() {
        let session = session(ScriptedTransport::new(vec![]));
        assert_eq!(session.active_tab(), Tab::Summary);
        assert_eq!(session.summary_text(), "S");
        assert_eq!(
            session.key_points().to_vec(),
            vec!["k1".to_string(), "k2".to_string()]
        );
    }

    #[test]
    fn snapshot_carries_view_state() {
        let mut session = session(ScriptedTransport::new(vec![]));
        session.set_active_tab(Tab::KeyPoints);
        session.set_mode(AnswerMode::Beyond);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.active_tab, Tab::KeyPoints);
        assert_eq!(snapshot.mode, AnswerMode::Beyond);
        assert_eq!(snapshot.result.video_id, "abc");
    }
}
