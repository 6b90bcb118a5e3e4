use md5::{Digest, Md5};

use crate::types::{GameInfo, Task};
use crate::{COLLECT_HASH_SECRET, MAX_DAILY_CLICKS};

/// Coins to claim in one collect call.
///
/// Bounded by what is left in the pool and by the clicks left today.
pub fn collect_amount(info: &GameInfo) -> u64 {
    let clicks_left = MAX_DAILY_CLICKS.saturating_sub(info.user_to_day_now_click);
    info.coin_pool_left.min(clicks_left)
}

/// Checksum sent alongside a collect: `md5(amount ++ seq_no ++ secret)` in lowercase hex.
pub fn collect_hash(amount: u64, seq_no: u64) -> String {
    let mut hasher = Md5::new();
    hasher.update(amount.to_string().as_bytes());
    hasher.update(seq_no.to_string().as_bytes());
    hasher.update(COLLECT_HASH_SECRET.as_bytes());
    hex::encode(hasher.finalize())
}

/// Tasks still open, in the order the server listed them.
pub fn pending_tasks(tasks: Vec<Task>) -> Vec<Task> {
    tasks.into_iter().filter(Task::is_pending).collect()
}
