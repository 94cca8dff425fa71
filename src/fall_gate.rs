use crate::posture::PostureLabel;

/// Holds a falling reading back until it has persisted, unbroken, for the
/// confirmation delay.
///
/// Any non-falling instantaneous label clears the candidate; a later falling
/// reading starts a fresh streak instead of resuming the old one.
#[derive(Debug, Clone)]
pub struct FallGate {
    confirm_delay_ms: u64,
    candidate_since: Option<u64>,
}

impl FallGate {
    pub fn new(confirm_delay_ms: u64) -> Self {
        Self {
            confirm_delay_ms,
            candidate_since: None,
        }
    }

    /// Returns `true` once the current falling streak has lasted at least the
    /// confirmation delay. `false` means "no change", never another posture.
    pub fn observe(&mut self, label: PostureLabel, now_ms: u64) -> bool {
        if label != PostureLabel::Falling {
            if self.candidate_since.take().is_some() {
                tracing::debug!(label = %label, "fall candidate cleared");
            }
            return false;
        }

        let since = *self.candidate_since.get_or_insert_with(|| {
            tracing::debug!(at_ms = now_ms, "fall candidate started");
            now_ms
        });

        now_ms.saturating_sub(since) >= self.confirm_delay_ms
    }

    /// Media time at which the current unbroken falling streak began.
    pub fn candidate_since(&self) -> Option<u64> {
        self.candidate_since
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PostureLabel::{Falling, Sitting};

    const T0: u64 = 10_000;

    #[test]
    fn confirms_only_after_the_delay() {
        let mut gate = FallGate::new(5_000);
        assert!(!gate.observe(Falling, T0));
        assert!(!gate.observe(Falling, T0 + 3_000));
        assert!(gate.observe(Falling, T0 + 5_000));
        assert_eq!(gate.candidate_since(), Some(T0));
    }

    #[test]
    fn interruption_restarts_the_timer() {
        let mut gate = FallGate::new(5_000);
        assert!(!gate.observe(Falling, T0));
        assert!(!gate.observe(Sitting, T0 + 4_000));
        assert_eq!(gate.candidate_since(), None);

        assert!(!gate.observe(Falling, T0 + 4_100));
        assert!(!gate.observe(Falling, T0 + 5_000));
        assert!(!gate.observe(Falling, T0 + 9_000));
        assert!(gate.observe(Falling, T0 + 9_100));
    }

    #[test]
    fn other_labels_never_confirm() {
        let mut gate = FallGate::new(0);
        assert!(!gate.observe(Sitting, T0));
        assert!(gate.observe(Falling, T0));
    }
}
