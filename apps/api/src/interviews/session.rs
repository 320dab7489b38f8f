use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::interviews::voice::SessionEvent;
use crate::models::interview::TranscriptTurn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a voice session is already open for interview {0}")]
    AlreadyOpen(Uuid),

    #[error("voice session is {0:?}, expected {1}")]
    InvalidState(SessionState, &'static str),

    #[error("call failed: {0}")]
    Failed(String),

    #[error("call exceeded the maximum duration of {0:?}")]
    TimedOut(Duration),

    #[error("event channel closed before the call ended")]
    Closed,
}

/// Routes provider events to the session waiting on them.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    channels: Arc<Mutex<HashMap<Uuid, mpsc::UnboundedSender<SessionEvent>>>>,
}

impl SessionRegistry {
    fn channels(&self) -> MutexGuard<'_, HashMap<Uuid, mpsc::UnboundedSender<SessionEvent>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a channel for this interview. Must happen before the call is
    /// started so no early event is lost.
    pub fn open(&self, interview_id: Uuid) -> Result<VoiceSession, SessionError> {
        let mut channels = self.channels();
        if channels.contains_key(&interview_id) {
            return Err(SessionError::AlreadyOpen(interview_id));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        channels.insert(interview_id, tx);
        debug!(%interview_id, "Voice session registered");

        Ok(VoiceSession {
            interview_id,
            registry: self.clone(),
            events: rx,
            state: SessionState::Idle,
            transcript: Vec::new(),
        })
    }

    /// Returns false when no session is listening for this interview.
    pub fn dispatch(&self, interview_id: Uuid, event: SessionEvent) -> bool {
        match self.channels().get(&interview_id) {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    #[cfg(test)]
    pub fn is_open(&self, interview_id: Uuid) -> bool {
        self.channels().contains_key(&interview_id)
    }

    fn close(&self, interview_id: Uuid) {
        if self.channels().remove(&interview_id).is_some() {
            debug!(%interview_id, "Voice session deregistered");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active { call_ref: String },
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub transcript: Vec<TranscriptTurn>,
    pub recording_ref: Option<String>,
}

/// One voice call, `Idle → Active → Ended`.
///
/// The registry entry lives exactly as long as the session is not `Ended`;
/// the first terminal event, `end()` or drop removes it.
pub struct VoiceSession {
    interview_id: Uuid,
    registry: SessionRegistry,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    state: SessionState,
    transcript: Vec<TranscriptTurn>,
}

impl VoiceSession {
    #[cfg(test)]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Turns collected so far; available after a failed call too.
    pub fn take_transcript(&mut self) -> Vec<TranscriptTurn> {
        std::mem::take(&mut self.transcript)
    }

    pub fn activate(&mut self, call_ref: String) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidState(self.state.clone(), "Idle"));
        }
        self.state = SessionState::Active { call_ref };
        Ok(())
    }

    /// Collects transcript turns until the call ends, fails, or runs past
    /// `max_duration`. The session is `Ended` afterwards in every case.
    pub async fn run_to_end(&mut self, max_duration: Duration) -> Result<SessionOutcome, SessionError> {
        if !matches!(self.state, SessionState::Active { .. }) {
            return Err(SessionError::InvalidState(self.state.clone(), "Active"));
        }
        let deadline = Instant::now() + max_duration;

        let result = loop {
            match timeout_at(deadline, self.events.recv()).await {
                Ok(Some(SessionEvent::Transcript(turn))) => self.transcript.push(turn),
                Ok(Some(SessionEvent::CallEnded { recording_ref })) => {
                    break Ok(SessionOutcome {
                        transcript: self.take_transcript(),
                        recording_ref,
                    })
                }
                Ok(Some(SessionEvent::Failed(reason))) => break Err(SessionError::Failed(reason)),
                Ok(None) => break Err(SessionError::Closed),
                Err(_) => {
                    warn!(interview_id = %self.interview_id, "Voice call hit the duration limit");
                    break Err(SessionError::TimedOut(max_duration));
                }
            }
        };

        self.end();
        result
    }

    pub fn end(&mut self) {
        if self.state != SessionState::Ended {
            self.state = SessionState::Ended;
            self.registry.close(self.interview_id);
        }
    }
}

impl Drop for VoiceSession {
    fn drop(&mut self) {
        self.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::interview::Speaker;

    fn turn(role: Speaker, content: &str) -> SessionEvent {
        SessionEvent::Transcript(TranscriptTurn {
            role,
            content: content.to_string(),
        })
    }

    #[tokio::test]
    async fn test_session_collects_until_call_ended() {
        let registry = SessionRegistry::default();
        let id = Uuid::new_v4();
        let mut session = registry.open(id).unwrap();
        session.activate("call_1".to_string()).unwrap();

        assert!(registry.dispatch(id, turn(Speaker::Assistant, "Hello")));
        assert!(registry.dispatch(id, turn(Speaker::User, "Hi")));
        assert!(registry.dispatch(
            id,
            SessionEvent::CallEnded {
                recording_ref: Some("rec".to_string())
            }
        ));

        let outcome = session.run_to_end(Duration::from_secs(5)).await.unwrap();
        assert_eq!(outcome.transcript.len(), 2);
        assert_eq!(outcome.recording_ref.as_deref(), Some("rec"));
        assert_eq!(session.state(), &SessionState::Ended);
        assert!(!registry.is_open(id));
        assert!(!registry.dispatch(id, turn(Speaker::User, "late")));
    }

    #[tokio::test]
    async fn test_failure_event_ends_session_and_keeps_partial_transcript() {
        let registry = SessionRegistry::default();
        let id = Uuid::new_v4();
        let mut session = registry.open(id).unwrap();
        session.activate("call_1".to_string()).unwrap();
        registry.dispatch(id, turn(Speaker::Assistant, "Hello"));
        registry.dispatch(id, SessionEvent::Failed("dropped".to_string()));

        let err = session.run_to_end(Duration::from_secs(5)).await.unwrap_err();
        assert_eq!(err, SessionError::Failed("dropped".to_string()));
        assert_eq!(session.take_transcript().len(), 1);
        assert!(!registry.is_open(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_times_out() {
        let registry = SessionRegistry::default();
        let id = Uuid::new_v4();
        let mut session = registry.open(id).unwrap();
        session.activate("call_1".to_string()).unwrap();

        let err = session.run_to_end(Duration::from_secs(60)).await.unwrap_err();
        assert_eq!(err, SessionError::TimedOut(Duration::from_secs(60)));
        assert!(!registry.is_open(id));
    }

    #[test]
    fn test_drop_deregisters_and_duplicate_open_is_rejected() {
        let registry = SessionRegistry::default();
        let id = Uuid::new_v4();
        let session = registry.open(id).unwrap();
        assert_eq!(registry.open(id).err(), Some(SessionError::AlreadyOpen(id)));
        drop(session);
        assert!(!registry.is_open(id));
        assert!(registry.open(id).is_ok());
    }

    #[tokio::test]
    async fn test_run_requires_active_state() {
        let registry = SessionRegistry::default();
        let mut session = registry.open(Uuid::new_v4()).unwrap();
        assert!(matches!(
            session.run_to_end(Duration::from_secs(1)).await,
            Err(SessionError::InvalidState(SessionState::Idle, _))
        ));
        session.activate("c".to_string()).unwrap();
        assert!(session.activate("c".to_string()).is_err());
    }
}
