use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use super::platform::Platform;
use crate::config::Settings;
use crate::network::http;
use crate::utils::command::run_checked;
use crate::utils::error::{DeployError, Result};

const API_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

/// 从 GitHub release API 响应中取出版本号
pub fn parse_latest_tag(body: &str) -> Result<String> {
    let release: Release = serde_json::from_str(body)?;
    if release.tag_name.trim().is_empty() {
        return Err(DeployError::Command("获取版本号失败".to_string()));
    }
    Ok(release.tag_name)
}

/// 查询最新版本号
pub async fn latest_version(client: &reqwest::Client, api: &str) -> Result<String> {
    let body = client
        .get(api)
        .timeout(API_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    parse_latest_tag(&body)
}

pub fn download_url(base: &str, version: &str, file_name: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), version, file_name)
}

/// 下载到 `dest`, 非 2xx 响应视为失败
pub async fn download(client: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    let mut response = client.get(url).send().await?.error_for_status()?;
    let mut file = tokio::fs::File::create(dest).await?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}

/// 安装 mihomo; 可执行文件已存在时跳过
pub async fn install_binary(settings: &Settings, platform: &Platform) -> Result<()> {
    if settings.binary_path.exists() {
        info!("✅ 已检测到 mihomo,跳过安装步骤");
        return Ok(());
    }

    info!("⬇️ 正在安装 mihomo ...");
    let client = http::client(settings.download_timeout())?;
    let version = latest_version(&client, &settings.release_api).await?;

    let mut candidates = vec![platform.asset_name(&version)];
    candidates.extend(platform.compatible_asset_name(&version));

    let archive = settings.download_dir.join("mihomo.gz");
    let mut downloaded = false;
    for file_name in &candidates {
        let url = download_url(&settings.release_download_base, &version, file_name);
        info!("📦 下载 {} ...", file_name);
        match download(&client, &url, &archive).await {
            Ok(()) => {
                downloaded = true;
                break;
            }
            Err(e) => warn!("⚠️ 下载 {} 失败: {}", file_name, e),
        }
    }

    if !downloaded {
        let _ = fs::remove_file(&archive);
        return Err(DeployError::Command(format!("mihomo {} 下载失败", version)));
    }

    let archive_arg = archive.to_string_lossy();
    run_checked("gzip", &["-df", &*archive_arg], Duration::from_secs(60)).await?;

    let extracted = settings.download_dir.join("mihomo");
    place_binary(&extracted, &settings.binary_path)?;

    info!("✅ mihomo {} 安装完成", version);
    Ok(())
}

/// 复制到目标位置, 设置可执行权限, 删除源文件
fn place_binary(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to)?;
    fs::set_permissions(to, fs::Permissions::from_mode(0o755))?;
    fs::remove_file(from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::http::testing::serve_once;

    #[test]
    fn test_parse_latest_tag() {
        let body = r#"{"tag_name": "v1.19.13", "name": "v1.19.13", "assets": []}"#;
        assert_eq!(parse_latest_tag(body).unwrap(), "v1.19.13");
        assert!(matches!(parse_latest_tag("{}"), Err(DeployError::Json(_))));
        assert!(parse_latest_tag(r#"{"tag_name": ""}"#).is_err());
        assert!(parse_latest_tag("rate limited").is_err());
    }

    #[tokio::test]
    async fn test_latest_version_over_http() {
        let client = http::client(Duration::from_secs(5)).unwrap();

        let ok = serve_once("200 OK", br#"{"tag_name": "v1.19.13"}"#).await;
        let version = latest_version(&client, &format!("http://{}/latest", ok)).await.unwrap();
        assert_eq!(version, "v1.19.13");

        let limited = serve_once("403 Forbidden", br#"{"message": "rate limited"}"#).await;
        let err = latest_version(&client, &format!("http://{}/latest", limited)).await.unwrap_err();
        assert!(matches!(err, DeployError::Http(_)));
    }

    #[tokio::test]
    async fn test_download_writes_body() {
        let dir = std::env::temp_dir().join(format!("mihomo-download-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let dest = dir.join("mihomo.gz");
        let client = http::client(Duration::from_secs(5)).unwrap();

        let ok = serve_once("200 OK", b"archive-bytes").await;
        download(&client, &format!("http://{}/a.gz", ok), &dest).await.unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"archive-bytes");

        let missing = serve_once("404 Not Found", b"Not Found").await;
        assert!(download(&client, &format!("http://{}/b.gz", missing), &dest).await.is_err());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_download_url() {
        assert_eq!(
            download_url(
                "https://github.com/MetaCubeX/mihomo/releases/download/",
                "v1.19.13",
                "mihomo-linux-arm64-v1.19.13.gz"
            ),
            "https://github.com/MetaCubeX/mihomo/releases/download/v1.19.13/mihomo-linux-arm64-v1.19.13.gz"
        );
    }

    #[test]
    fn test_place_binary() {
        let dir = std::env::temp_dir().join(format!("mihomo-release-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let from = dir.join("mihomo");
        let to = dir.join("bin").join("mihomo");
        fs::write(&from, b"#!/bin/sh\n").unwrap();

        place_binary(&from, &to).unwrap();
        assert!(!from.exists());
        let mode = fs::metadata(&to).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);

        fs::remove_dir_all(&dir).unwrap();
    }
}
