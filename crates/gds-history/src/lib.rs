//! Session-tracked in-memory histories.
//!
//! One append-only record stream per record type (events, channels,
//! commands), each wrapped by its caller in a single mutex — no history ever
//! locks another while holding its own. Sessions are created lazily on
//! first retrieve and see only records appended after that point. Cursors
//! are indices into a logical, ever-growing record sequence; [`History::clear`]
//! shifts the live window forward and rebases every cursor by the same
//! delta, so a `VecDeque` of retained records never needs to grow without
//! bound.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use std::{collections::VecDeque, time::Duration};

use gds_core::env::Environment;
use tracing::debug;

mod session;

pub use session::{PollResponse, SessionId};
use session::SessionState;

/// An append-only record stream with per-session cursors.
///
/// `T` is the record type (an event, a channel sample, a command echo);
/// `E` is the [`Environment`] used to timestamp session activity, so tests
/// can drive inactivity-window expiry deterministically.
pub struct History<T, E: Environment> {
    env: E,
    records: VecDeque<T>,
    /// Logical index of `records[0]`; every live cursor is `>= base`.
    base: u64,
    /// Total records ever appended, including ones since trimmed away.
    count: u64,
    sessions: std::collections::HashMap<SessionId, SessionState<E::Instant>>,
}

impl<T: Clone, E: Environment> History<T, E> {
    /// Build an empty history.
    #[must_use]
    pub fn new(env: E) -> Self {
        Self { env, records: VecDeque::new(), base: 0, count: 0, sessions: std::collections::HashMap::new() }
    }

    /// Append one record. Called as a data callback from a decoder.
    pub fn append(&mut self, record: T) {
        self.records.push_back(record);
        self.count += 1;
    }

    /// Number of records ever appended, including trimmed ones.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Retrieve up to `limit` unread records for `session` (all of them if
    /// `limit` is `None`), advancing that session's cursor.
    ///
    /// A previously unseen `session` is created with its cursor at the
    /// current tail (it sees only future records) and its validation
    /// baseline at the current [`History::count`] — so its very first
    /// retrieve reports `validation = 0`.
    pub fn retrieve(&mut self, session: SessionId, limit: Option<usize>) -> PollResponse<T> {
        let now = self.env.now();
        let state = self.sessions.entry(session).or_insert_with(|| {
            debug!(session = %session, "creating new session at current tail");
            SessionState { cursor: self.base + self.records.len() as u64, offset: self.count, last_touch: now }
        });

        let start = (state.cursor - self.base) as usize;
        let available = self.records.len().saturating_sub(start);
        let take = limit.map_or(available, |limit| limit.min(available));

        let slice: Vec<T> = self.records.iter().skip(start).take(take).cloned().collect();
        state.cursor += slice.len() as u64;
        state.last_touch = now;
        let validation = self.count - state.offset;

        PollResponse { history: slice, validation, errors: Vec::new() }
    }

    /// Trim records strictly older than the minimum live session cursor,
    /// rebasing every remaining cursor by the same delta. Sessions with no
    /// cursor yet recorded (none have retrieved) do not constrain the trim.
    pub fn clear(&mut self) {
        let Some(min_cursor) = self.sessions.values().map(|s| s.cursor).min() else {
            // No sessions at all: everything is safe to drop.
            let dropped = self.records.len();
            self.records.clear();
            self.base += dropped as u64;
            return;
        };

        let drop_count = (min_cursor - self.base).min(self.records.len() as u64) as usize;
        for _ in 0..drop_count {
            self.records.pop_front();
        }
        self.base += drop_count as u64;
    }

    /// Remove sessions not touched within `window`. A subsequent `retrieve`
    /// with the same id starts fresh (sees only future data).
    pub fn expire(&mut self, window: Duration) {
        let now = self.env.now();
        self.sessions.retain(|id, state| {
            let stale = now - state.last_touch >= window;
            if stale {
                debug!(session = %id, "expiring inactive session");
            }
            !stale
        });
    }

    /// Number of sessions currently tracked (for tests and diagnostics).
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gds_core::env::SystemEnv;

    use super::*;

    fn hist() -> History<u32, SystemEnv> {
        History::new(SystemEnv)
    }

    #[test]
    fn scenario_three_two_sessions_diverge_on_cursor_and_validation() {
        let mut h = hist();
        h.append(1);
        h.append(2);
        h.append(3);

        let a = h.retrieve(SessionId::from("a"), Some(10));
        assert_eq!(a.history, vec![1, 2, 3]);
        assert_eq!(a.validation, 3);

        h.append(4);
        h.append(5);

        let b = h.retrieve(SessionId::from("b"), Some(10));
        assert_eq!(b.history, vec![1, 2, 3, 4, 5]);
        assert_eq!(b.validation, 5);

        let a_again = h.retrieve(SessionId::from("a"), Some(10));
        assert_eq!(a_again.history, vec![4, 5]);
        assert_eq!(a_again.validation, 5);
    }

    #[test]
    fn unknown_session_on_first_retrieve_sees_only_future_data() {
        let mut h = hist();
        h.append(1);
        h.append(2);

        let first = h.retrieve(SessionId::from("new"), None);
        assert!(first.history.is_empty());
        assert_eq!(first.validation, 0);

        h.append(3);
        let second = h.retrieve(SessionId::from("new"), None);
        assert_eq!(second.history, vec![3]);
        assert_eq!(second.validation, 1);
    }

    #[test]
    fn retrieve_with_limit_zero_is_a_no_op() {
        let mut h = hist();
        h.append(1);
        let session = SessionId::from("s");
        let first = h.retrieve(session.clone(), Some(10));
        assert_eq!(first.history, vec![1]);

        let second = h.retrieve(session, Some(0));
        assert!(second.history.is_empty());
        assert_eq!(second.validation, first.validation);
    }

    #[test]
    fn clear_never_drops_a_record_a_live_session_still_needs() {
        let mut h = hist();
        for i in 0..5u32 {
            h.append(i);
        }
        let a = SessionId::from("a");
        let b = SessionId::from("b");
        let _ = h.retrieve(a.clone(), Some(2)); // cursor at 2
        let _ = h.retrieve(b, Some(5)); // cursor at 5

        h.clear();
        // `a` is the minimum cursor (2): records [0,1] may be dropped, [2,3,4] must remain.
        let remaining = h.retrieve(a, Some(10));
        assert_eq!(remaining.history, vec![2, 3, 4]);
    }

    #[test]
    fn clear_then_retrieve_matches_pre_clear_slice() {
        let mut h = hist();
        for i in 0..4u32 {
            h.append(i);
        }
        let a = SessionId::from("a");
        let _ = h.retrieve(a.clone(), Some(1)); // cursor at 1, next retrieve would give [1,2,3]

        let mut h2 = hist();
        for i in 0..4u32 {
            h2.append(i);
        }
        let a2 = SessionId::from("a");
        let _ = h2.retrieve(a2.clone(), Some(1));
        h2.clear();

        let expected = h.retrieve(a, Some(10));
        let actual = h2.retrieve(a2, Some(10));
        assert_eq!(expected.history, actual.history);
    }

    #[tokio::test]
    async fn expire_drops_sessions_past_the_inactivity_window() {
        let mut h = hist();
        h.append(1);
        let session = SessionId::from("stale");
        let _ = h.retrieve(session.clone(), Some(10));
        assert_eq!(h.session_count(), 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        h.expire(Duration::from_millis(10));
        assert_eq!(h.session_count(), 0);

        // Same token, fresh session: sees only future data.
        h.append(2);
        let fresh = h.retrieve(session, Some(10));
        assert_eq!(fresh.history, vec![2]);
    }
}
