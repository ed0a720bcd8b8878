//! Conversation state: turns, transcripts, and the session lifecycle.

mod error;
mod session;
mod turn;

pub use error::SessionError;
pub use session::{ConversationSession, SendOutcome};
pub use turn::{Role, Transcript, Turn};
