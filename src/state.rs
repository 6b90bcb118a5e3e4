use std::collections::HashSet;

/// Where the poll loop is between two steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    PerAccountPass,
    Cooldown,
    Done,
}

/// State owned by the poll loop for the lifetime of the process.
///
/// Nothing here is persisted: a restart starts from an empty maxed set.
#[derive(Debug, Clone)]
pub struct PollState {
    /// Distinct user ids loaded at startup.
    pub accounts: HashSet<String>,
    /// Accounts (by user id) that reported today's click cap.
    pub maxed: HashSet<String>,
    /// Completed passes over the account list.
    pub passes: u64,
    pub phase: LoopPhase,
}

impl PollState {
    pub fn new(user_ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            accounts: user_ids.into_iter().collect(),
            maxed: HashSet::new(),
            passes: 0,
            phase: LoopPhase::PerAccountPass,
        }
    }

    /// Record that `user_id` has no clicks left today. Returns `false` if it
    /// was already recorded.
    pub fn mark_maxed(&mut self, user_id: &str) -> bool {
        self.maxed.insert(user_id.to_string())
    }

    pub fn is_maxed(&self, user_id: &str) -> bool {
        self.maxed.contains(user_id)
    }

    /// Every loaded account has hit its daily cap at least once.
    pub fn is_exhausted(&self) -> bool {
        !self.accounts.is_empty() && self.accounts.iter().all(|id| self.maxed.contains(id))
    }

    /// Advance after a full pass over the accounts: stop if every account is
    /// exhausted, otherwise cool down.
    pub fn finish_pass(&mut self) -> LoopPhase {
        self.passes += 1;
        self.phase = if self.is_exhausted() {
            LoopPhase::Done
        } else {
            LoopPhase::Cooldown
        };
        self.phase
    }

    /// Advance once the cooldown wait is over.
    pub fn finish_cooldown(&mut self) {
        self.phase = LoopPhase::PerAccountPass;
    }
}
