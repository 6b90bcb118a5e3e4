pub mod api;
pub mod auth;
pub mod config;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod executor;
pub mod poller;
pub mod reporter;
pub mod state;
pub mod token_store;
pub mod types;

/// FreeDogs mini-app API base URL
pub const API_BASE: &str = "https://api.freedogs.bot";

/// Invitation code sent along with every `telegram_auth` call
pub const INVITATION_CODE: &str = "oscKOfyL";

/// Shared secret appended to the collect checksum input
pub const COLLECT_HASH_SECRET: &str = "7be2a16a82054ee58398c5edb7ac4a5a";

/// Clicks an account may spend per day before the vendor caps it
pub const MAX_DAILY_CLICKS: u64 = 10_000;

#[cfg(test)]
pub(crate) mod test_support;
