use std::fmt;

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in a conversation.
///
/// Turns are immutable once created; the only way to change a transcript is
/// to append a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub const fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Chronological, append-only list of turns.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub const fn new() -> Self {
        Self { turns: Vec::new() }
    }

    pub(crate) fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns the trailing user turn that never received an answer.
    pub fn pending(&self) -> Option<&Turn> {
        self.turns.last().filter(|turn| turn.role == Role::User)
    }

    /// Returns `true` if turns strictly alternate starting with `user`.
    ///
    /// A failed exchange followed by a new message leaves two user turns in a
    /// row; `push` does not reject that.
    pub fn is_alternating(&self) -> bool {
        self.turns.iter().enumerate().all(|(i, turn)| {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            turn.role == expected
        })
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_constructors() {
        let turn = Turn::user("hello");
        assert_eq!(turn.role(), Role::User);
        assert_eq!(turn.content(), "hello");

        let turn = Turn::assistant("hi");
        assert_eq!(turn.role(), Role::Assistant);
        assert_eq!(turn.content(), "hi");
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_transcript_starts_empty() {
        let transcript = Transcript::new();
        assert!(transcript.is_empty());
        assert!(transcript.pending().is_none());
        assert!(transcript.is_alternating());
    }

    #[test]
    fn test_transcript_pending_after_user_turn() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::user("question"));
        assert_eq!(transcript.pending().map(Turn::content), Some("question"));

        transcript.push(Turn::assistant("answer"));
        assert!(transcript.pending().is_none());
    }

    #[test]
    fn test_transcript_alternation() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::user("a"));
        transcript.push(Turn::assistant("b"));
        transcript.push(Turn::user("c"));
        assert!(transcript.is_alternating());

        transcript.push(Turn::user("d"));
        assert!(!transcript.is_alternating());
    }

    #[test]
    fn test_transcript_starting_with_assistant_is_not_alternating() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::assistant("hello"));
        assert!(!transcript.is_alternating());
    }

    #[test]
    fn test_transcript_iteration_is_restartable() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::user("a"));
        transcript.push(Turn::assistant("b"));

        let iter = transcript.iter();
        let first: Vec<_> = iter.clone().map(Turn::content).collect();
        let second: Vec<_> = iter.map(Turn::content).collect();
        assert_eq!(first, vec!["a", "b"]);
        assert_eq!(first, second);
    }
}
