use std::time::Duration;

use crate::utils::error::Result;

/// GitHub API 要求携带 User-Agent
pub const USER_AGENT: &str = concat!("mihomo-deploy/", env!("CARGO_PKG_VERSION"));

/// 带整体超时的 HTTP 客户端
pub fn client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}
