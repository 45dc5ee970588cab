//! Session identity and per-session cursor state.

/// An opaque, caller-supplied session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap a caller-supplied token as a session id.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl From<&str> for SessionId {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A session's cursor into a [`crate::History`], plus its last-touched
/// timestamp for inactivity expiry.
pub(crate) struct SessionState<I> {
    /// Logical index of the next unread record.
    pub(crate) cursor: u64,
    /// Snapshot of `History::count` at session creation; `validation` on
    /// each retrieve is `count - offset`.
    pub(crate) offset: u64,
    pub(crate) last_touch: I,
}

/// The shape an HTTP polling layer would serialize back to a ground client:
/// the records observed since the last retrieve, the validation count, and
/// any non-fatal advisory errors (e.g. validation skew) to surface for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResponse<T> {
    /// Records observed since the session's previous retrieve, in
    /// insertion order.
    pub history: Vec<T>,
    /// `count - offset(session)`, snapshotted at this retrieve.
    pub validation: u64,
    /// Advisory diagnostics (e.g. validation skew); never a transport
    /// error.
    pub errors: Vec<String>,
}
