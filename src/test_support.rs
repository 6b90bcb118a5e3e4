//! Fakes shared by the unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::json;

use crate::api::{CollectRequest, GameApi};
use crate::credentials::Credential;
use crate::error::ApiResult;
use crate::types::{GameInfo, Task};

/// One recorded call against [`FakeApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Auth(String),
    GameInfo(String),
    Collect(String, CollectRequest),
    TaskList(String),
    FinishTask(String, String),
}

/// In-memory `GameApi` returning canned responses and recording every call.
pub(crate) struct FakeApi {
    pub auth: ApiResult<()>,
    pub game_info: ApiResult<GameInfo>,
    pub collect: ApiResult<()>,
    pub tasks: ApiResult<Vec<Task>>,
    pub finish: ApiResult<()>,
    pub calls: Mutex<Vec<Call>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            auth: Ok(()),
            game_info: Ok(game_info(50, 9950, 10_000)),
            collect: Ok(()),
            tasks: Ok(Vec::new()),
            finish: Ok(()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(*c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl GameApi for FakeApi {
    async fn authenticate(&self, auth_payload: &str) -> ApiResult<String> {
        self.record(Call::Auth(auth_payload.to_string()));
        self.auth.clone()?;
        Ok(perpetual_token(auth_payload))
    }

    async fn game_info(&self, token: &str) -> ApiResult<GameInfo> {
        self.record(Call::GameInfo(token.to_string()));
        self.game_info.clone()
    }

    async fn collect_coin(&self, token: &str, request: &CollectRequest) -> ApiResult<()> {
        self.record(Call::Collect(token.to_string(), request.clone()));
        self.collect.clone()
    }

    async fn task_list(&self, token: &str) -> ApiResult<Vec<Task>> {
        self.record(Call::TaskList(token.to_string()));
        self.tasks.clone()
    }

    async fn finish_task(&self, token: &str, task_id: &str) -> ApiResult<()> {
        self.record(Call::FinishTask(token.to_string(), task_id.to_string()));
        self.finish.clone()
    }
}

pub(crate) fn game_info(pool_left: u64, now_click: u64, max_click: u64) -> GameInfo {
    GameInfo {
        current_amount: "1000".to_string(),
        coin_pool_left: pool_left,
        coin_pool_limit: 1500,
        user_to_day_now_click: now_click,
        user_to_day_max_click: max_click,
        collect_seq_no: 7,
    }
}

pub(crate) fn task(id: u64, name: &str, finished: bool) -> Task {
    serde_json::from_value(json!({
        "id": id,
        "name": name,
        "isFinish": if finished { 1 } else { 0 },
        "rewardParty": 250
    }))
    .expect("valid test Task JSON")
}

/// A JWT-shaped token without an `exp` claim.
pub(crate) fn perpetual_token(subject: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "sub": subject }).to_string());
    format!("{header}.{payload}.sig")
}

/// A JWT-shaped token that expired a minute ago.
pub(crate) fn expired_token() -> String {
    let exp = chrono::Utc::now().timestamp() - 60;
    let payload = URL_SAFE_NO_PAD.encode(json!({ "exp": exp }).to_string());
    format!("h.{payload}.sig")
}

pub(crate) fn credential(id: i64, first_name: &str) -> Credential {
    let user = json!({ "id": id, "first_name": first_name }).to_string();
    let encoded: String = url::form_urlencoded::byte_serialize(user.as_bytes()).collect();
    let line = format!("query_id=Q{id}&user={encoded}&auth_date=1720000000&hash=h{id}");
    Credential::from_line(&line).expect("valid test credential")
}
