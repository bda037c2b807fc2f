// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! GM-notice queue: batches recovered-error warnings for a host adapter to
//! flush, deduping identical notices the way the passive ledger dedupes
//! spot messages (same content within a window is dropped, not resent).

use std::collections::VecDeque;

/// One queued GM-visible notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Rendered message body.
    pub body: String,
    /// Wall-clock time the notice was enqueued, in milliseconds.
    pub timestamp_ms: u64,
}

/// Debounced queue of GM notices awaiting delivery.
///
/// A host adapter calls [`NoticeQueue::push`] for every recovered error the
/// engine reports, then [`NoticeQueue::drain`] once per tick to flush
/// whatever survived deduping to the host's whisper channel.
#[derive(Debug, Clone)]
pub struct NoticeQueue {
    pending: VecDeque<Notice>,
    recent: Vec<Notice>,
    window_ms: u64,
    max_recent: usize,
}

impl NoticeQueue {
    /// Creates a queue that suppresses an identical notice for `window_ms`
    /// after it was last sent.
    #[must_use]
    pub fn new(window_ms: u64) -> Self {
        Self {
            pending: VecDeque::new(),
            recent: Vec::new(),
            window_ms,
            max_recent: 64,
        }
    }

    /// Enqueues `body` unless an identical notice was already sent within the
    /// debounce window. Returns whether it was actually enqueued.
    pub fn push(&mut self, body: impl Into<String>, now_ms: u64) -> bool {
        let body = body.into();
        self.recent.retain(|n| now_ms.saturating_sub(n.timestamp_ms) < self.window_ms);

        if self.recent.iter().any(|n| n.body == body) {
            return false;
        }

        let notice = Notice { body, timestamp_ms: now_ms };
        if self.recent.len() == self.max_recent {
            self.recent.remove(0);
        }
        self.recent.push(notice.clone());
        self.pending.push_back(notice);
        true
    }

    /// Removes and returns every notice queued since the last drain, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.pending.drain(..).collect()
    }

    /// Whether any notice is waiting to be drained.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_notice_within_window_is_suppressed() {
        let mut queue = NoticeQueue::new(100_000);
        assert!(queue.push("trap-1 config parse error", 1_000));
        assert!(!queue.push("trap-1 config parse error", 1_500));
    }

    #[test]
    fn notice_resends_outside_window() {
        let mut queue = NoticeQueue::new(100_000);
        queue.push("trap-1 config parse error", 1_000);
        assert!(queue.push("trap-1 config parse error", 200_000));
    }

    #[test]
    fn drain_empties_pending_and_preserves_order() {
        let mut queue = NoticeQueue::new(100_000);
        queue.push("first", 0);
        queue.push("second", 0);

        let drained = queue.drain();
        assert_eq!(drained.iter().map(|n| n.body.as_str()).collect::<Vec<_>>(), vec!["first", "second"]);
        assert!(!queue.has_pending());
    }
}
