use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::Settings;
use crate::utils::command::{run_checked, run_foreground};
use crate::utils::error::Result;

const SYSTEMCTL_TIMEOUT: Duration = Duration::from_secs(30);

/// 生成 systemd unit 内容
pub fn render_unit(settings: &Settings) -> String {
    let dir = settings.config_dir.display();
    format!(
        "[Unit]
Description=Mihomo Service
After=network.target

[Service]
Type=simple
WorkingDirectory={dir}
ExecStart={bin} -d {dir}
Restart=on-failure
RestartSec=3
User=root
CapabilityBoundingSet=CAP_NET_BIND_SERVICE
AmbientCapabilities=CAP_NET_BIND_SERVICE
NoNewPrivileges=true

[Install]
WantedBy=multi-user.target
",
        dir = dir,
        bin = settings.binary_path.display()
    )
}

/// systemd 服务管理
#[derive(Debug, Clone)]
pub struct ServiceManager {
    name: String,
    unit_file: PathBuf,
    systemctl_bin: PathBuf,
    journalctl_bin: PathBuf,
}

impl ServiceManager {
    pub fn new(name: impl Into<String>, unit_file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            unit_file: unit_file.into(),
            systemctl_bin: PathBuf::from("systemctl"),
            journalctl_bin: PathBuf::from("journalctl"),
        }
    }

    /// 替换 systemctl / journalctl 命令路径
    pub fn with_commands(mut self, systemctl: impl Into<PathBuf>, journalctl: impl Into<PathBuf>) -> Self {
        self.systemctl_bin = systemctl.into();
        self.journalctl_bin = journalctl.into();
        self
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.service_name.clone(), &settings.service_file)
            .with_commands(&settings.systemctl_path, &settings.journalctl_path)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 写入 unit 文件, 重新加载并立即启用
    pub async fn install(&self, unit: &str) -> Result<()> {
        if let Some(parent) = self.unit_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.unit_file, unit)?;
        info!("📝 已写入 {}", self.unit_file.display());

        self.systemctl(&["daemon-reload"]).await?;
        let unit_name = format!("{}.service", self.name);
        self.systemctl(&["enable", "--now", unit_name.as_str()]).await?;

        // 等待服务启动
        tokio::time::sleep(Duration::from_secs(2)).await;
        info!("✅ 服务 {} 已启用", self.name);
        Ok(())
    }

    pub async fn restart(&self) -> Result<()> {
        self.systemctl(&["restart", self.name.as_str()]).await
    }

    /// 停止并禁用; 服务不存在时只记录警告
    pub async fn stop_and_disable(&self) {
        for action in ["stop", "disable"] {
            if let Err(e) = self.systemctl(&[action, self.name.as_str()]).await {
                warn!("⚠️ systemctl {} {} 失败: {}", action, self.name, e);
            }
        }
    }

    /// 删除 unit 文件, 返回文件是否存在过
    pub async fn remove_unit(&self) -> Result<bool> {
        if !self.unit_file.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.unit_file)?;
        self.systemctl(&["daemon-reload"]).await?;
        Ok(true)
    }

    /// `systemctl status`, 输出直接到终端
    pub async fn status(&self) -> Result<bool> {
        run_foreground(&self.systemctl_bin, &["status", self.name.as_str(), "--no-pager", "-l"]).await
    }

    /// `journalctl -f`, Ctrl-C 结束
    pub async fn follow_logs(&self) -> Result<bool> {
        run_foreground(&self.journalctl_bin, &["-u", self.name.as_str(), "-f", "--no-pager"]).await
    }

    async fn systemctl(&self, args: &[&str]) -> Result<()> {
        run_checked(&self.systemctl_bin, args, SYSTEMCTL_TIMEOUT).await.map(|_| ())
    }
}
