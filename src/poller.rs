use tracing::{debug, error, info, warn};

use crate::api::GameApi;
use crate::auth::SessionManager;
use crate::config::SettingsConfig;
use crate::credentials::Credential;
use crate::error::ApiError;
use crate::executor::{collect_coins, fetch_game_state, run_tasks};
use crate::reporter::countdown;
use crate::state::{LoopPhase, PollState};

/// Why [`Poller::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// Every account hit its daily cap.
    Exhausted,
    /// Ctrl+C during a cooldown.
    Interrupted,
}

/// Drives the per-account pipeline over all accounts until they are exhausted.
pub struct Poller<A> {
    api: A,
    sessions: SessionManager,
    accounts: Vec<Credential>,
    settings: SettingsConfig,
    state: PollState,
}

impl<A: GameApi> Poller<A> {
    pub fn new(
        api: A,
        sessions: SessionManager,
        accounts: Vec<Credential>,
        settings: SettingsConfig,
    ) -> Self {
        let state = PollState::new(accounts.iter().map(Credential::user_id));
        Self {
            api,
            sessions,
            accounts,
            settings,
            state,
        }
    }

    #[cfg(test)]
    pub(crate) fn api(&self) -> &A {
        &self.api
    }

    #[cfg(test)]
    pub(crate) fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// Pass over the accounts, cool down, repeat; stop once every account is
    /// maxed out or on Ctrl+C during a cooldown.
    pub async fn run(&mut self) -> LoopOutcome {
        loop {
            match self.state.phase {
                LoopPhase::PerAccountPass => {
                    self.run_pass().await;
                    self.state.finish_pass();
                }
                LoopPhase::Cooldown => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            info!("Shutdown signal received");
                            return LoopOutcome::Interrupted;
                        }
                        _ = countdown(self.settings.cooldown_secs) => {}
                    }
                    self.state.finish_cooldown();
                }
                LoopPhase::Done => {
                    info!("all daily left over!");
                    return LoopOutcome::Exhausted;
                }
            }
        }
    }

    /// One pass over every account in file order.
    pub async fn run_pass(&mut self) {
        for idx in 0..self.accounts.len() {
            let credential = self.accounts[idx].clone();
            info!("Account {} | {}", idx + 1, credential.user.first_name);
            if let Err(e) = self.process_account(&credential).await {
                debug!("Account {} skipped for this pass: {e}", credential.user_id());
            }
            tokio::time::sleep(self.settings.account_delay()).await;
        }
    }

    async fn process_account(&mut self, credential: &Credential) -> Result<(), ApiError> {
        let user_id = credential.user_id();

        let token = self
            .sessions
            .token_for(&self.api, credential)
            .await
            .inspect_err(|e| error!("Failed to get token for account {user_id}: {e}"))?;

        let info = match fetch_game_state(&self.api, &token, &user_id, &mut self.state).await {
            Ok(info) => info,
            Err(e @ ApiError::DailyLimit) => {
                warn!("Unable to get game information for account {user_id}: {e}");
                return Err(e);
            }
            Err(e) => {
                error!("Unable to get game information for account {user_id}: {e}");
                return Err(e);
            }
        };

        if info.coin_pool_left > 0 {
            if let Err(e) = collect_coins(&self.api, &token, &info).await {
                error!("Failed to collect coins for account {user_id}: {e}");
            }
        } else {
            warn!("No coins to collect for account {user_id}");
        }

        let summary = run_tasks(&self.api, &token, &user_id, self.settings.task_delay()).await;
        if summary.completed + summary.failed > 0 {
            info!(
                "Tasks for account {user_id}: {} completed, {} failed",
                summary.completed, summary.failed
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::test_support::{
        Call, FakeApi, credential, expired_token, game_info, perpetual_token, task,
    };
    use crate::token_store::{TokenMap, TokenStore};

    fn fast_settings(cooldown_secs: u64) -> SettingsConfig {
        SettingsConfig {
            cooldown_secs,
            account_delay_ms: 0,
            task_delay_ms: 0,
        }
    }

    fn poller(
        api: FakeApi,
        dir: &TempDir,
        cached: TokenMap,
        cooldown_secs: u64,
    ) -> Poller<FakeApi> {
        let accounts = vec![credential(1, "Alice"), credential(2, "Bob")];
        poller_for(api, dir, cached, accounts, cooldown_secs)
    }

    fn poller_for(
        api: FakeApi,
        dir: &TempDir,
        cached: TokenMap,
        accounts: Vec<Credential>,
        cooldown_secs: u64,
    ) -> Poller<FakeApi> {
        let store = TokenStore::new(dir.path().join("token.json"));
        store.save(&cached).unwrap();
        let sessions = SessionManager::open(store).unwrap();
        Poller::new(api, sessions, accounts, fast_settings(cooldown_secs))
    }

    fn is_auth(c: &Call) -> bool {
        matches!(c, Call::Auth(_))
    }

    fn is_game_info(c: &Call) -> bool {
        matches!(c, Call::GameInfo(_))
    }

    fn is_collect(c: &Call) -> bool {
        matches!(c, Call::Collect(..))
    }

    fn is_finish(c: &Call) -> bool {
        matches!(c, Call::FinishTask(..))
    }

    #[tokio::test]
    async fn pass_authenticates_collects_and_caches_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let mut poller = poller(FakeApi::default(), &dir, TokenMap::new(), 0);
        poller.run_pass().await;

        let api = poller.api();
        assert_eq!(api.count(is_auth), 2);
        assert_eq!(api.count(is_game_info), 2);
        assert_eq!(api.count(is_collect), 2);
        assert_eq!(api.count(is_finish), 0);
        for call in api.calls() {
            if let Call::Collect(_, request) = call {
                assert_eq!(request.collect_amount, 50);
                assert_eq!(request.collect_seq_no, 7);
            }
        }

        let saved = TokenStore::new(dir.path().join("token.json")).load().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(&saved, poller.sessions().tokens());
        assert!(!poller.state().is_exhausted());
    }

    #[tokio::test]
    async fn calls_for_one_account_happen_in_pipeline_order() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi {
            tasks: Ok(vec![task(9, "Join", false)]),
            ..FakeApi::default()
        };
        let mut poller = poller(api, &dir, TokenMap::new(), 0);
        poller.run_pass().await;

        let kinds: Vec<&str> = poller
            .api()
            .calls()
            .iter()
            .take(5)
            .map(|c| match c {
                Call::Auth(_) => "auth",
                Call::GameInfo(_) => "info",
                Call::Collect(..) => "collect",
                Call::TaskList(_) => "tasks",
                Call::FinishTask(..) => "finish",
            })
            .collect();
        assert_eq!(kinds, vec!["auth", "info", "collect", "tasks", "finish"]);
    }

    #[tokio::test]
    async fn cached_token_skips_authentication() {
        let dir = tempfile::tempdir().unwrap();
        let mut cached = TokenMap::new();
        cached.insert("1".to_string(), perpetual_token("one"));
        cached.insert("2".to_string(), perpetual_token("two"));
        let mut poller = poller(FakeApi::default(), &dir, cached, 0);
        poller.run_pass().await;

        assert_eq!(poller.api().count(is_auth), 0);
        assert!(
            poller
                .api()
                .calls()
                .contains(&Call::GameInfo(perpetual_token("one")))
        );
    }

    #[tokio::test]
    async fn empty_pool_skips_collect_but_runs_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi {
            game_info: Ok(game_info(0, 100, 10_000)),
            tasks: Ok(vec![task(1, "a", false)]),
            ..FakeApi::default()
        };
        let mut poller = poller(api, &dir, TokenMap::new(), 0);
        poller.run_pass().await;

        assert_eq!(poller.api().count(is_collect), 0);
        assert_eq!(poller.api().count(is_finish), 2);
    }

    #[tokio::test]
    async fn all_maxed_on_first_pass_stops_without_cooldown() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi {
            game_info: Ok(game_info(100, 10_000, 10_000)),
            ..FakeApi::default()
        };
        // A cooldown would block far longer than the timeout.
        let mut poller = poller(api, &dir, TokenMap::new(), 3_600);
        let outcome = tokio::time::timeout(Duration::from_secs(10), poller.run())
            .await
            .expect("loop should end without cooling down");

        assert_eq!(outcome, LoopOutcome::Exhausted);
        assert_eq!(poller.state().passes, 1);
        assert!(poller.state().is_exhausted());
        assert_eq!(poller.api().count(is_collect), 0);
        assert_eq!(poller.api().count(|c| matches!(c, Call::TaskList(_))), 0);
    }

    #[tokio::test]
    async fn duplicate_account_lines_still_exhaust() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi {
            game_info: Ok(game_info(100, 10_000, 10_000)),
            ..FakeApi::default()
        };
        let accounts = vec![credential(1, "Alice"), credential(1, "Alice")];
        let mut poller = poller_for(api, &dir, TokenMap::new(), accounts, 3_600);
        let outcome = tokio::time::timeout(Duration::from_secs(10), poller.run())
            .await
            .expect("loop should end once the only account is maxed");

        assert_eq!(outcome, LoopOutcome::Exhausted);
        assert_eq!(poller.state().passes, 1);
        assert_eq!(poller.state().phase, LoopPhase::Done);
        // Both lines are still processed; the second reuses the cached token.
        assert_eq!(poller.api().count(is_auth), 1);
        assert_eq!(poller.api().count(is_game_info), 2);
    }

    #[tokio::test]
    async fn auth_error_skips_account_and_keeps_cache() {
        let dir = tempfile::tempdir().unwrap();
        let stale = expired_token();
        let mut cached = TokenMap::new();
        cached.insert("1".to_string(), stale.clone());
        cached.insert("2".to_string(), perpetual_token("two"));
        let api = FakeApi {
            auth: Err(ApiError::Vendor("bad payload".to_string())),
            ..FakeApi::default()
        };
        let mut poller = poller(api, &dir, cached, 0);
        poller.run_pass().await;

        let api = poller.api();
        // Only account 2 gets past authentication.
        assert_eq!(api.count(is_auth), 1);
        assert_eq!(api.count(is_game_info), 1);
        assert_eq!(api.count(is_collect), 1);
        assert!(
            api.calls()
                .iter()
                .filter(|c| !is_auth(c))
                .all(|c| !format!("{c:?}").contains(&stale))
        );

        let saved = TokenStore::new(dir.path().join("token.json")).load().unwrap();
        assert_eq!(saved.get("1"), Some(&stale));
    }

    #[tokio::test]
    async fn failed_pass_is_retried_next_pass() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi {
            game_info: Err(ApiError::Transport("timed out".to_string())),
            ..FakeApi::default()
        };
        let mut poller = poller(api, &dir, TokenMap::new(), 0);
        poller.run_pass().await;
        poller.run_pass().await;

        // Tokens from the first pass are reused on the second.
        assert_eq!(poller.api().count(is_auth), 2);
        assert_eq!(poller.api().count(is_game_info), 4);
        assert_eq!(poller.api().count(is_collect), 0);
        assert!(!poller.state().is_exhausted());
    }
}
