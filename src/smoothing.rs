use std::collections::VecDeque;

use crate::posture::PostureLabel;

/// A label the recent history agrees on, with the media time at which the
/// agreeing run of frames began.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StableLabel {
    pub label: PostureLabel,
    pub since_ms: u64,
}

/// Bounded FIFO of instantaneous labels that suppresses single-frame jitter.
///
/// A label is stable once the newest `quorum` entries all agree. The window
/// keeps at most `capacity` entries; the oldest is evicted on overflow.
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    history: VecDeque<PostureLabel>,
    capacity: usize,
    quorum: usize,
    run: Option<StableLabel>,
    stable: Option<StableLabel>,
}

impl SmoothingWindow {
    /// Expects `1 <= quorum <= capacity`, which [`Config::validate`] enforces.
    ///
    /// [`Config::validate`]: crate::config::Config::validate
    pub fn new(capacity: usize, quorum: usize) -> Self {
        debug_assert!(
            quorum >= 1 && quorum <= capacity,
            "quorum {quorum} outside 1..={capacity}"
        );
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            quorum,
            run: None,
            stable: None,
        }
    }

    /// Record one instantaneous label observed at `at_ms`. Returns the stable
    /// label when the newest `quorum` entries agree, otherwise `None` and the
    /// caller keeps its previous state.
    pub fn push(&mut self, label: PostureLabel, at_ms: u64) -> Option<StableLabel> {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(label);

        match self.run {
            Some(run) if run.label == label => {}
            _ => {
                self.run = Some(StableLabel {
                    label,
                    since_ms: at_ms,
                })
            }
        }

        if self.history.len() < self.quorum {
            return None;
        }

        let agreed = self
            .history
            .iter()
            .rev()
            .take(self.quorum)
            .all(|&l| l == label);
        if !agreed {
            return None;
        }

        if self.stable.map(|s| s.label) != Some(label) {
            tracing::debug!(label = %label, "smoothed posture latched");
            self.stable = self.run;
        }
        self.stable
    }

    /// Last label the window agreed on, held across non-agreeing pushes.
    pub fn stable(&self) -> Option<StableLabel> {
        self.stable
    }
}
