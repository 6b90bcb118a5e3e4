//! Credential file loading.
//!
//! Each line of the credential file is either a full mini-app launch URL
//! (containing `tgwebappdata=<payload>"`) or the bare init-data payload.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow, bail};
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::Deserialize;

static WRAPPED_PAYLOAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)tgwebappdata=(?<payload>[^"]*)""#).expect("invalid regex"));

/// Where a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    /// Pulled out of a `tgwebappdata=...` wrapper and URL-decoded.
    Wrapped,
    /// The line was used as-is.
    Raw,
}

/// Identity embedded in the init-data `user` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: String,
}

/// One account loaded from the credential file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Decoded init-data query string (`query_id=...&user=...&hash=...`).
    pub payload: String,
    pub source: PayloadSource,
    pub user: TelegramUser,
}

impl Credential {
    pub fn from_line(line: &str) -> Result<Self> {
        let (payload, source) = extract_payload(line)?;
        let user = parse_user(&payload)?;
        Ok(Self {
            payload,
            source,
            user,
        })
    }

    /// Key used in the token cache.
    pub fn user_id(&self) -> String {
        self.user.id.to_string()
    }

    /// Payload with `&` and `=` escaped so it can travel as one query value.
    pub fn auth_payload(&self) -> String {
        self.payload.replace('&', "%26").replace('=', "%3D")
    }
}

/// Extract the init-data payload from a credential line.
///
/// A wrapped line yields the text between `tgwebappdata=` and the next quote,
/// URL-decoded once. Anything else is returned verbatim and tagged `Raw`; it
/// still has to pass [`parse_user`] before it is accepted.
pub fn extract_payload(line: &str) -> Result<(String, PayloadSource)> {
    match WRAPPED_PAYLOAD.captures(line) {
        Some(caps) => {
            let encoded = caps
                .name("payload")
                .map(|m| m.as_str())
                .unwrap_or_default();
            let decoded = percent_decode_str(encoded)
                .decode_utf8()
                .context("wrapped payload is not valid UTF-8 after decoding")?;
            Ok((decoded.into_owned(), PayloadSource::Wrapped))
        }
        None => Ok((line.to_string(), PayloadSource::Raw)),
    }
}

/// Decode the `user` JSON object embedded in an init-data payload.
pub fn parse_user(payload: &str) -> Result<TelegramUser> {
    let raw = url::form_urlencoded::parse(payload.as_bytes())
        .find(|(key, _)| key == "user")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| anyhow!("payload has no `user` field"))?;

    // Some clients encode the user object twice.
    let json = if raw.trim_start().starts_with('{') {
        raw
    } else {
        percent_decode_str(&raw)
            .decode_utf8()
            .context("`user` field is not valid UTF-8")?
            .into_owned()
    };

    serde_json::from_str(&json).context("`user` field is not a valid user object")
}

/// Parse the contents of a credential file, one account per non-empty line.
pub fn parse_credentials(contents: &str) -> Result<Vec<Credential>> {
    let mut credentials = Vec::new();
    for (idx, line) in contents.split('\n').enumerate() {
        let line = line.replace('\r', "");
        if line.is_empty() {
            continue;
        }
        let credential = Credential::from_line(&line)
            .with_context(|| format!("invalid credential on line {}", idx + 1))?;
        credentials.push(credential);
    }
    Ok(credentials)
}

/// Load every credential from `path`.
pub fn load_credentials(path: &Path) -> Result<Vec<Credential>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let credentials = parse_credentials(&contents)?;
    if credentials.is_empty() {
        bail!("{} contains no credentials", path.display());
    }
    Ok(credentials)
}
