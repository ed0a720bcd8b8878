use tracing::{debug, info, warn};

use super::error::SessionError;
use super::turn::{Transcript, Turn};
use crate::backend::{BackendFactory, ChatBackend, FaultKind};

/// Result of one exchange with the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The backend answered; the answer was appended as an assistant turn.
    Answered(String),
    /// The backend faulted; no assistant turn was appended.
    Failed { kind: FaultKind, message: String },
}

impl SendOutcome {
    /// The text to show the user: the answer or the error message.
    pub fn text(&self) -> &str {
        match self {
            Self::Answered(answer) => answer,
            Self::Failed { message, .. } => message,
        }
    }

    pub const fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }
}

/// Backend handle and transcript live and die together.
struct Active {
    backend: Box<dyn ChatBackend>,
    transcript: Transcript,
}

impl Active {
    async fn exchange(&mut self) -> SendOutcome {
        let result = self.backend.send(self.transcript.turns()).await;

        match result {
            Ok(answer) => {
                debug!(
                    turns = self.transcript.len() + 1,
                    answer_chars = answer.chars().count(),
                    "exchange answered"
                );
                self.transcript.push(Turn::assistant(answer.clone()));
                SendOutcome::Answered(answer)
            }
            Err(fault) => {
                warn!(kind = ?fault.kind, error = %fault, "exchange failed");
                SendOutcome::Failed {
                    kind: fault.kind,
                    message: format!("An error occurred: {fault}"),
                }
            }
        }
    }
}

enum State {
    Uninitialized,
    Active(Active),
}

/// One logical conversation with a remote model.
///
/// The session starts uninitialized. [`initialize`](Self::initialize) builds a
/// backend from a credential; [`reset`](Self::reset) drops the backend and the
/// transcript in one step and returns to the uninitialized state.
///
/// A failed exchange keeps the unanswered user turn in the transcript. Call
/// [`retry`](Self::retry) to ask for its answer again without duplicating it;
/// a plain [`send`](Self::send) instead continues the conversation with the
/// unanswered turn still in context.
pub struct ConversationSession {
    factory: Box<dyn BackendFactory>,
    verify: bool,
    state: State,
}

impl ConversationSession {
    pub fn new(factory: Box<dyn BackendFactory>) -> Self {
        Self {
            factory,
            verify: true,
            state: State::Uninitialized,
        }
    }

    /// Controls whether [`initialize`](Self::initialize) asks the backend to
    /// confirm the credential before the session becomes active.
    #[must_use]
    pub const fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub const fn is_active(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    /// Creates the backend handle. A no-op if the session is already active.
    pub async fn initialize(&mut self, credential: Option<&str>) -> Result<(), SessionError> {
        if self.is_active() {
            debug!("session already active, keeping existing conversation");
            return Ok(());
        }

        let credential = check_credential(credential, self.factory.requires_credential())?;
        let backend = self.factory.create(credential)?;

        if self.verify {
            backend.verify().await.map_err(|fault| match fault.kind {
                FaultKind::Auth => SessionError::Authentication(format!(
                    "The API key was rejected by the backend: {fault}"
                )),
                _ => SessionError::Configuration(format!(
                    "Could not reach the backend to verify the API key: {fault}"
                )),
            })?;
        }

        info!(backend = %backend.describe(), "session initialized");
        self.state = State::Active(Active {
            backend,
            transcript: Transcript::new(),
        });
        Ok(())
    }

    /// Discards the backend handle and the transcript.
    pub fn reset(&mut self) {
        if self.is_active() {
            info!("session reset");
        }
        self.state = State::Uninitialized;
    }

    /// Appends a user turn, asks the backend for an answer using the full
    /// transcript, and appends the answer.
    ///
    /// Backend faults are reported as [`SendOutcome::Failed`], never as `Err`.
    pub async fn send(&mut self, user_text: &str) -> Result<SendOutcome, SessionError> {
        let active = self.active_mut()?;
        active.transcript.push(Turn::user(user_text));
        Ok(active.exchange().await)
    }

    /// Asks again for the answer to the trailing unanswered user turn.
    pub async fn retry(&mut self) -> Result<SendOutcome, SessionError> {
        let active = self.active_mut()?;
        if active.transcript.pending().is_none() {
            return Err(SessionError::NothingToRetry);
        }
        Ok(active.exchange().await)
    }

    /// Turns in insertion order. Empty while uninitialized.
    pub fn history(&self) -> std::slice::Iter<'_, Turn> {
        match &self.state {
            State::Active(active) => active.transcript.iter(),
            State::Uninitialized => <&[Turn]>::default().iter(),
        }
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        match &self.state {
            State::Active(active) => Some(&active.transcript),
            State::Uninitialized => None,
        }
    }

    pub fn backend_description(&self) -> Option<String> {
        match &self.state {
            State::Active(active) => Some(active.backend.describe()),
            State::Uninitialized => None,
        }
    }

    fn active_mut(&mut self) -> Result<&mut Active, SessionError> {
        match &mut self.state {
            State::Active(active) => Ok(active),
            State::Uninitialized => Err(SessionError::NotInitialized),
        }
    }
}

fn check_credential(
    credential: Option<&str>,
    required: bool,
) -> Result<Option<&str>, SessionError> {
    let credential = credential.map(str::trim).filter(|c| !c.is_empty());

    match credential {
        None if required => Err(SessionError::Authentication(
            "No API key provided".to_string(),
        )),
        Some(c) if c.chars().any(|ch| ch.is_whitespace() || ch.is_control()) => Err(
            SessionError::Authentication(
                "The API key is malformed: it must not contain spaces or control characters"
                    .to_string(),
            ),
        ),
        other => Ok(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::BackendFault;
    use crate::conversation::Role;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Probe {
        created: AtomicUsize,
        failures_left: AtomicUsize,
        calls: Mutex<Vec<Vec<Turn>>>,
    }

    struct EchoBackend {
        probe: Arc<Probe>,
        reject_key: bool,
    }

    #[async_trait]
    impl ChatBackend for EchoBackend {
        fn describe(&self) -> String {
            "echo".to_string()
        }

        async fn verify(&self) -> Result<(), BackendFault> {
            if self.reject_key {
                Err(BackendFault::auth("invalid key"))
            } else {
                Ok(())
            }
        }

        async fn send(&self, history: &[Turn]) -> Result<String, BackendFault> {
            self.probe.calls.lock().unwrap().push(history.to_vec());
            let failing = self
                .probe
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(BackendFault::network("connection reset"));
            }
            let last = history.last().map(Turn::content).unwrap_or_default();
            Ok(format!("ECHO:{last}"))
        }
    }

    struct EchoFactory {
        probe: Arc<Probe>,
        reject_key: bool,
    }

    impl BackendFactory for EchoFactory {
        fn create(&self, _credential: Option<&str>) -> Result<Box<dyn ChatBackend>, SessionError> {
            self.probe.created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(EchoBackend {
                probe: Arc::clone(&self.probe),
                reject_key: self.reject_key,
            }))
        }
    }

    /// A session whose backend fails the first `failures` sends.
    fn session(failures: usize) -> (ConversationSession, Arc<Probe>) {
        let probe = Arc::new(Probe {
            failures_left: AtomicUsize::new(failures),
            ..Probe::default()
        });
        let factory = EchoFactory {
            probe: Arc::clone(&probe),
            reject_key: false,
        };
        (ConversationSession::new(Box::new(factory)), probe)
    }

    fn rejecting_factory() -> EchoFactory {
        EchoFactory {
            probe: Arc::default(),
            reject_key: true,
        }
    }

    fn contents(session: &ConversationSession) -> Vec<(Role, String)> {
        session
            .history()
            .map(|t| (t.role(), t.content().to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_initialize_activates_with_empty_transcript() {
        let (mut session, _) = session(0);
        assert!(!session.is_active());

        session.initialize(Some("key")).await.unwrap();

        assert!(session.is_active());
        assert_eq!(session.history().count(), 0);
        assert_eq!(session.backend_description().as_deref(), Some("echo"));
    }

    #[tokio::test]
    async fn test_initialize_without_credential_fails() {
        let (mut session, probe) = session(0);

        let err = session.initialize(None).await.unwrap_err();
        assert!(matches!(err, SessionError::Authentication(_)));

        let err = session.initialize(Some("   ")).await.unwrap_err();
        assert!(matches!(err, SessionError::Authentication(_)));

        assert!(!session.is_active());
        assert_eq!(probe.created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_initialize_with_malformed_credential_fails() {
        let (mut session, _) = session(0);
        let err = session.initialize(Some("abc def")).await.unwrap_err();
        assert!(matches!(err, SessionError::Authentication(_)));
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_initialize_rejected_by_backend() {
        let mut session = ConversationSession::new(Box::new(rejecting_factory()));

        let err = session.initialize(Some("key")).await.unwrap_err();
        assert!(matches!(err, SessionError::Authentication(_)));
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_verification_can_be_skipped() {
        let mut session =
            ConversationSession::new(Box::new(rejecting_factory())).with_verification(false);

        session.initialize(Some("key")).await.unwrap();
        assert!(session.is_active());
    }

    #[tokio::test]
    async fn test_send_appends_both_turns() {
        let (mut session, _) = session(0);
        session.initialize(Some("key")).await.unwrap();

        let outcome = session.send("hello").await.unwrap();

        assert_eq!(outcome, SendOutcome::Answered("ECHO:hello".to_string()));
        assert_eq!(
            contents(&session),
            vec![
                (Role::User, "hello".to_string()),
                (Role::Assistant, "ECHO:hello".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_n_sends_give_2n_alternating_turns() {
        let (mut session, _) = session(0);
        session.initialize(Some("key")).await.unwrap();

        for i in 0..5 {
            let outcome = session.send(&format!("message {i}")).await.unwrap();
            assert!(outcome.is_answered());
        }

        assert_eq!(session.history().count(), 10);
        assert!(session.transcript().unwrap().is_alternating());
        for (i, turn) in session.history().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(turn.role(), expected);
        }
    }

    #[tokio::test]
    async fn test_backend_receives_full_history() {
        let (mut session, probe) = session(0);
        session.initialize(Some("key")).await.unwrap();

        session.send("hi").await.unwrap();
        session.send("there").await.unwrap();

        assert_eq!(
            contents(&session),
            vec![
                (Role::User, "hi".to_string()),
                (Role::Assistant, "ECHO:hi".to_string()),
                (Role::User, "there".to_string()),
                (Role::Assistant, "ECHO:there".to_string()),
            ]
        );

        let calls = probe.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], vec![Turn::user("hi")]);
        assert_eq!(
            calls[1],
            vec![Turn::user("hi"), Turn::assistant("ECHO:hi"), Turn::user("there")]
        );
    }

    #[tokio::test]
    async fn test_send_before_initialize_fails() {
        let (mut session, probe) = session(0);

        let err = session.send("hello").await.unwrap_err();

        assert!(matches!(err, SessionError::NotInitialized));
        assert_eq!(session.history().count(), 0);
        assert!(probe.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fault_keeps_only_user_turn() {
        let (mut session, _) = session(usize::MAX);
        session.initialize(Some("key")).await.unwrap();

        let outcome = session.send("hello").await.unwrap();

        let SendOutcome::Failed { kind, message } = &outcome else {
            panic!("expected a failed outcome");
        };
        assert_eq!(*kind, FaultKind::Network);
        assert!(!message.is_empty());
        assert!(message.contains("connection reset"));
        assert_eq!(contents(&session), vec![(Role::User, "hello".to_string())]);
        assert!(session.is_active());
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let (mut session, _) = session(0);
        session.initialize(Some("key")).await.unwrap();
        session.send("hello").await.unwrap();

        session.reset();

        assert!(!session.is_active());
        assert_eq!(session.history().count(), 0);
        assert!(session.transcript().is_none());
        assert!(session.backend_description().is_none());
        assert!(matches!(
            session.send("again").await,
            Err(SessionError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_reset_then_initialize_starts_fresh() {
        let (mut session, probe) = session(0);
        session.initialize(Some("key")).await.unwrap();
        session.send("hello").await.unwrap();

        session.reset();
        session.initialize(Some("key")).await.unwrap();

        assert_eq!(session.history().count(), 0);
        assert_eq!(probe.created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reset_when_uninitialized_is_harmless() {
        let (mut session, _) = session(0);
        session.reset();
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_initialize_twice_keeps_transcript() {
        let (mut session, probe) = session(0);
        session.initialize(Some("key")).await.unwrap();
        session.send("hello").await.unwrap();

        session.initialize(Some("other-key")).await.unwrap();

        assert_eq!(session.history().count(), 2);
        assert_eq!(probe.created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_answers_pending_turn_without_duplicating_it() {
        let (mut session, probe) = session(1);
        session.initialize(Some("key")).await.unwrap();
        assert!(!session.send("hello").await.unwrap().is_answered());

        let outcome = session.retry().await.unwrap();

        assert_eq!(outcome, SendOutcome::Answered("ECHO:hello".to_string()));
        assert_eq!(
            contents(&session),
            vec![
                (Role::User, "hello".to_string()),
                (Role::Assistant, "ECHO:hello".to_string()),
            ]
        );
        let calls = probe.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], vec![Turn::user("hello")]);
    }

    #[tokio::test]
    async fn test_failed_retry_leaves_transcript_unchanged() {
        let (mut session, _) = session(2);
        session.initialize(Some("key")).await.unwrap();
        session.send("hello").await.unwrap();

        let outcome = session.retry().await.unwrap();

        assert!(!outcome.is_answered());
        assert_eq!(contents(&session), vec![(Role::User, "hello".to_string())]);
    }

    #[tokio::test]
    async fn test_retry_without_pending_turn() {
        let (mut session, _) = session(0);
        session.initialize(Some("key")).await.unwrap();
        session.send("hello").await.unwrap();

        assert!(matches!(
            session.retry().await,
            Err(SessionError::NothingToRetry)
        ));
    }

    #[tokio::test]
    async fn test_retry_before_initialize() {
        let (mut session, _) = session(0);
        assert!(matches!(
            session.retry().await,
            Err(SessionError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_send_after_fault_continues_with_orphaned_turn() {
        let (mut session, probe) = session(usize::MAX);
        session.initialize(Some("key")).await.unwrap();

        session.send("first").await.unwrap();
        session.send("second").await.unwrap();

        let calls = probe.calls.lock().unwrap();
        assert_eq!(calls[1], vec![Turn::user("first"), Turn::user("second")]);
        assert!(!session.transcript().unwrap().is_alternating());
    }

    #[test]
    fn test_check_credential() {
        assert_eq!(check_credential(Some(" key "), true).unwrap(), Some("key"));
        assert_eq!(check_credential(None, false).unwrap(), None);
        assert_eq!(check_credential(Some(""), false).unwrap(), None);
        assert!(check_credential(None, true).is_err());
        assert!(check_credential(Some("a\tb"), false).is_err());
    }
}
