use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ApiError, ApiResult};

/// Common response wrapper: `code == 0` is success, otherwise `msg` says why.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    pub msg: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Turn the wrapper into a result, ignoring any payload.
    pub fn into_unit(self) -> ApiResult<()> {
        if self.code == 0 {
            Ok(())
        } else {
            Err(self.vendor_error())
        }
    }

    /// Turn the wrapper into a result, requiring a payload on success.
    pub fn into_data(self) -> ApiResult<T> {
        if self.code != 0 {
            return Err(self.vendor_error());
        }
        self.data
            .ok_or_else(|| ApiError::Vendor("response has no data".to_string()))
    }

    fn vendor_error(&self) -> ApiError {
        ApiError::Vendor(
            self.msg
                .clone()
                .unwrap_or_else(|| format!("vendor error code {}", self.code)),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthData {
    pub token: String,
}

/// Per-account counters returned by `GetGameInfo`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub current_amount: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub coin_pool_left: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub coin_pool_limit: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub user_to_day_now_click: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub user_to_day_max_click: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub collect_seq_no: u64,
}

impl GameInfo {
    pub fn is_maxed(&self) -> bool {
        self.user_to_day_now_click == self.user_to_day_max_click
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskList {
    #[serde(default)]
    pub lists: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: serde_json::Value,
    #[serde(default)]
    pub name: String,
    /// `0` means open; a missing or null flag is not treated as open.
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    pub is_finish: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reward_party: String,
}

impl Task {
    /// Task id as it appears in the `finish_task` query string.
    pub fn id_param(&self) -> String {
        value_to_string(&self.id)
    }

    pub fn is_pending(&self) -> bool {
        self.is_finish == Some(0)
    }
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Accept `123`, `"123"` or `null`.
fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match &value {
        serde_json::Value::Null => Ok(0),
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .ok_or_else(|| serde::de::Error::custom(format!("expected unsigned number, got {n}"))),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom(format!("expected numeric string, got {s:?}"))),
        other => Err(serde::de::Error::custom(format!(
            "expected number, got {other}"
        ))),
    }
}

fn lenient_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    lenient_u64(value).map(Some).map_err(serde::de::Error::custom)
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_string(&value))
}
