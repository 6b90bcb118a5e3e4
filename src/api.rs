use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName,
    HeaderValue, ORIGIN, REFERER, USER_AGENT,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::types::{AuthData, Envelope, GameInfo, Task, TaskList};

const AUTH_PATH: &str = "/miniapps/api/user/telegram_auth";
const GAME_INFO_PATH: &str = "/miniapps/api/user_game_level/GetGameInfo";
const COLLECT_PATH: &str = "/miniapps/api/user_game/collectCoin";
const TASK_LIST_PATH: &str = "/miniapps/api/task/lists";
const FINISH_TASK_PATH: &str = "/miniapps/api/task/finish_task";

/// Form body of a collect call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectRequest {
    pub collect_amount: u64,
    pub hash_code: String,
    pub collect_seq_no: u64,
}

/// The vendor endpoints used by the farming loop.
#[async_trait]
pub trait GameApi: Send + Sync {
    /// Exchange an escaped init-data payload for a bearer token.
    async fn authenticate(&self, auth_payload: &str) -> ApiResult<String>;

    async fn game_info(&self, token: &str) -> ApiResult<GameInfo>;

    async fn collect_coin(&self, token: &str, request: &CollectRequest) -> ApiResult<()>;

    async fn task_list(&self, token: &str) -> ApiResult<Vec<Task>>;

    async fn finish_task(&self, token: &str, task_id: &str) -> ApiResult<()>;
}

/// `GameApi` over HTTPS with the mini-app's browser headers.
///
/// `Accept-Encoding` is left to reqwest so compressed bodies are decoded.
pub struct HttpGameApi {
    client: Client,
    base_url: String,
    invitation_code: String,
}

impl HttpGameApi {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .default_headers(browser_headers())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            invitation_code: config.invitation_code.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<Envelope<T>> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, body = %body, "vendor response");

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            if status == StatusCode::OK {
                ApiError::Transport(format!("malformed response: {e}"))
            } else {
                ApiError::Transport(format!("HTTP {status}"))
            }
        })?;
        if status != StatusCode::OK {
            return Err(ApiError::Vendor(
                envelope.msg.unwrap_or_else(|| format!("HTTP {status}")),
            ));
        }
        Ok(envelope)
    }
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn authenticate(&self, auth_payload: &str) -> ApiResult<String> {
        // The payload is already escaped, so the query is assembled by hand
        // to avoid encoding its `%` signs a second time.
        let url = format!(
            "{}?invitationCode={}&initData={}",
            self.url(AUTH_PATH),
            self.invitation_code,
            auth_payload
        );
        let envelope: Envelope<AuthData> = self.send(self.client.post(url)).await?;
        Ok(envelope.into_data()?.token)
    }

    async fn game_info(&self, token: &str) -> ApiResult<GameInfo> {
        let request = self
            .client
            .get(self.url(GAME_INFO_PATH))
            .header(AUTHORIZATION, bearer(token));
        self.send::<GameInfo>(request).await?.into_data()
    }

    async fn collect_coin(&self, token: &str, request: &CollectRequest) -> ApiResult<()> {
        let form = [
            ("collectAmount", request.collect_amount.to_string()),
            ("hashCode", request.hash_code.clone()),
            ("collectSeqNo", request.collect_seq_no.to_string()),
        ];
        let request = self
            .client
            .post(self.url(COLLECT_PATH))
            .header(AUTHORIZATION, bearer(token))
            .form(&form);
        self.send::<serde_json::Value>(request).await?.into_unit()
    }

    async fn task_list(&self, token: &str) -> ApiResult<Vec<Task>> {
        let request = self
            .client
            .get(self.url(TASK_LIST_PATH))
            .header(AUTHORIZATION, bearer(token));
        let list = self.send::<TaskList>(request).await?.into_data()?;
        Ok(list.lists)
    }

    async fn finish_task(&self, token: &str, task_id: &str) -> ApiResult<()> {
        let request = self
            .client
            .post(self.url(FINISH_TASK_PATH))
            .query(&[("id", task_id)])
            .header(AUTHORIZATION, bearer(token));
        self.send::<serde_json::Value>(request).await?.into_unit()
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("vi-VN,vi;q=0.9,fr-FR;q=0.8,fr;q=0.7,en-US;q=0.6,en;q=0.5"),
    );
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded; charset=UTF-8"),
    );
    headers.insert(ORIGIN, HeaderValue::from_static("https://app.freedogs.bot"));
    headers.insert(REFERER, HeaderValue::from_static("https://app.freedogs.bot/"));
    headers.insert(
        HeaderName::from_static("sec-ch-ua"),
        HeaderValue::from_static(
            "\"Not/A)Brand\";v=\"99\", \"Google Chrome\";v=\"115\", \"Chromium\";v=\"115\"",
        ),
    );
    headers.insert(HeaderName::from_static("sec-ch-ua-mobile"), HeaderValue::from_static("?0"));
    headers.insert(
        HeaderName::from_static("sec-ch-ua-platform"),
        HeaderValue::from_static("\"Windows\""),
    );
    headers.insert(HeaderName::from_static("sec-fetch-dest"), HeaderValue::from_static("empty"));
    headers.insert(HeaderName::from_static("sec-fetch-mode"), HeaderValue::from_static("cors"));
    headers.insert(HeaderName::from_static("sec-fetch-site"), HeaderValue::from_static("same-site"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36",
        ),
    );
    headers
}
