use std::time::Duration;

use tracing::{error, info};

use crate::api::{CollectRequest, GameApi};
use crate::engine::{collect_amount, collect_hash, pending_tasks};
use crate::error::{ApiError, ApiResult};
use crate::state::PollState;
use crate::types::GameInfo;

/// Outcome of one run over an account's open tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSummary {
    pub completed: usize,
    pub failed: usize,
}

/// Fetch and log today's counters for an account.
///
/// An account at its daily click cap is recorded in `state` and reported as
/// [`ApiError::DailyLimit`].
pub async fn fetch_game_state<A: GameApi + ?Sized>(
    api: &A,
    token: &str,
    user_id: &str,
    state: &mut PollState,
) -> ApiResult<GameInfo> {
    let info = api.game_info(token).await?;
    info!("The current balance: {}", info.current_amount);
    info!("Coin Pool: {}/{}", info.coin_pool_left, info.coin_pool_limit);
    info!(
        "Number of clicks today: {}/{}",
        info.user_to_day_now_click, info.user_to_day_max_click
    );
    if info.is_maxed() {
        state.mark_maxed(user_id);
        return Err(ApiError::DailyLimit);
    }
    Ok(info)
}

/// Claim what is in the coin pool. Returns the amount sent.
pub async fn collect_coins<A: GameApi + ?Sized>(
    api: &A,
    token: &str,
    info: &GameInfo,
) -> ApiResult<u64> {
    let amount = collect_amount(info);
    let request = CollectRequest {
        collect_amount: amount,
        hash_code: collect_hash(amount, info.collect_seq_no),
        collect_seq_no: info.collect_seq_no,
    };
    api.collect_coin(token, &request).await?;
    info!("Successfully collected {amount} coins");
    Ok(amount)
}

/// Complete every open task, one at a time, pausing `delay` after each.
///
/// A failed task is logged and the next one is attempted.
pub async fn run_tasks<A: GameApi + ?Sized>(
    api: &A,
    token: &str,
    user_id: &str,
    delay: Duration,
) -> TaskSummary {
    let mut summary = TaskSummary::default();
    let tasks = match api.task_list(token).await {
        Ok(tasks) => pending_tasks(tasks),
        Err(e) => {
            error!("Unable to get task list for account {user_id}: {e}");
            return summary;
        }
    };

    for task in &tasks {
        info!("Performing task: {}", task.name);
        match api.finish_task(token, &task.id_param()).await {
            Ok(()) => {
                info!(
                    "Completed task {} successfully | Reward: {}",
                    task.name, task.reward_party
                );
                summary.completed += 1;
            }
            Err(e) => {
                error!("Cannot complete task {}: {e}", task.name);
                summary.failed += 1;
            }
        }
        tokio::time::sleep(delay).await;
    }
    summary
}
