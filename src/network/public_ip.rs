use std::net::IpAddr;
use std::time::Duration;

use tracing::{debug, warn};

use super::http;
use crate::utils::error::Result;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// 依次访问查询地址获取本机公网 IP, 全部失败返回 None
pub async fn lookup_public_ip(endpoints: &[String]) -> Option<IpAddr> {
    let client = match http::client(LOOKUP_TIMEOUT) {
        Ok(client) => client,
        Err(e) => {
            warn!("⚠️ 无法创建 HTTP 客户端: {}", e);
            return None;
        }
    };

    for endpoint in endpoints {
        match fetch(&client, endpoint).await {
            Ok(body) => match parse_ip_response(&body) {
                Some(ip) => return Some(ip),
                None => debug!("{} 返回的不是 IP: {:?}", endpoint, body.trim()),
            },
            Err(e) => debug!("查询 {} 失败: {}", endpoint, e),
        }
    }

    warn!("⚠️ 获取公网 IP 失败");
    None
}

async fn fetch(client: &reqwest::Client, endpoint: &str) -> Result<String> {
    let body = client
        .get(endpoint)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(body)
}

/// 响应体应当只有一个 IP 地址
pub fn parse_ip_response(body: &str) -> Option<IpAddr> {
    body.trim().parse().ok()
}
