use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::{ServiceConfig, Settings, Validator};
use crate::network::lookup_public_ip;
use crate::protocol::Protocol;
use crate::system::service::render_unit;
use crate::system::{deps, platform, release, ServiceManager};
use crate::utils::prompt::Prompter;

/// 公网 IP 获取失败时客户端配置里的占位符
pub const UNKNOWN_SERVER: &str = "YOUR_SERVER_IP";

/// 协议无关的安装流程
pub struct Installer<P: Protocol> {
    settings: Settings,
    protocol: P,
    service: ServiceManager,
    /// 客户端配置中的服务器地址; None 时自动查询公网 IP
    server_address: Option<String>,
}

impl<P: Protocol> Installer<P> {
    pub fn new(settings: Settings, protocol: P) -> Self {
        let service = ServiceManager::from_settings(&settings);
        Self {
            settings,
            protocol,
            service,
            server_address: None,
        }
    }

    pub fn with_server_address(mut self, address: Option<String>) -> Self {
        self.server_address = address;
        self
    }

    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn service(&self) -> &ServiceManager {
        &self.service
    }

    /// 完整安装: 依赖检查 → 安装 mihomo → 收集参数 → 写配置 → 注册服务 → 输出客户端信息
    pub async fn install(&self, prompter: &mut dyn Prompter) -> Result<()> {
        prompter.say(&format!("\n{}", "=".repeat(46)));
        prompter.say(&format!("🚀 开始安装 {}", self.protocol.name()));
        prompter.say(&"=".repeat(46));

        let missing = deps::missing_required();
        if !missing.is_empty() {
            prompter.say("❌ 缺少必要的依赖命令:");
            for cmd in &missing {
                prompter.say(&format!("   - {}", cmd));
            }
            bail!("缺少依赖: {}", missing.join(", "));
        }

        let platform = platform::detect(&self.settings).await?;
        release::install_binary(&self.settings, &platform)
            .await
            .context("mihomo 安装失败")?;

        let (config, path) = self.configure(prompter).await?;
        info!("📄 配置文件: {}", path.display());

        self.service
            .install(&render_unit(&self.settings))
            .await
            .context("创建 systemd 服务失败")?;

        self.print_final_info(prompter, &config).await?;
        Ok(())
    }

    /// 收集参数并写出服务端配置; 任一步失败都不会留下配置文件
    pub async fn configure(&self, prompter: &mut dyn Prompter) -> Result<(P::Config, PathBuf)> {
        let config = self.protocol.collect_config(prompter).await?;

        info!("⚙️ 生成 {} 配置...", self.protocol.name());
        let service_config = self.protocol.render_service_config(&config);
        Validator::validate_service_config(&service_config)?;
        let path = self.write_service_config(&service_config)?;

        info!("✅ 配置文件生成完成");
        Ok((config, path))
    }

    fn write_service_config(&self, service_config: &ServiceConfig) -> Result<PathBuf> {
        fs::create_dir_all(&self.settings.config_dir)
            .with_context(|| format!("无法创建目录 {}", self.settings.config_dir.display()))?;

        let path = self.settings.config_file();
        let content = serde_yaml::to_string(service_config)?;
        fs::write(&path, content).with_context(|| format!("无法写入 {}", path.display()))?;
        Ok(path)
    }

    async fn server_address(&self) -> String {
        if let Some(address) = &self.server_address {
            return address.clone();
        }
        match lookup_public_ip(&self.settings.public_ip_endpoints).await {
            Some(ip) => ip.to_string(),
            None => UNKNOWN_SERVER.to_string(),
        }
    }

    async fn print_final_info(&self, prompter: &mut dyn Prompter, config: &P::Config) -> Result<()> {
        let server = self.server_address().await;
        let snippet = self.protocol.render_client_snippet(config, &server)?;
        let port = self.protocol.port(config);
        let rule = "=".repeat(46);

        prompter.say(&format!("\n{}", rule));
        prompter.say(&format!("✅ {} 部署完成!", self.protocol.name()));
        prompter.say(&format!("{}\n", rule));

        prompter.say(&format!("📋 {} 客户端配置:\n", self.protocol.name()));
        prompter.say("---[ YAML 格式 ]---");
        prompter.say(&snippet.document);
        prompter.say("---[ Compact 格式 ]---");
        prompter.say(&format!("{}\n", snippet.compact));

        prompter.say(&rule);
        prompter.say("📌 重要信息:");
        prompter.say(&format!("  服务器 IP: {}", server));
        for line in self.protocol.report(config) {
            prompter.say(&line);
        }

        prompter.say("\n🎯 防火墙设置:");
        prompter.say(&format!("  请确保开放端口: {}\n", port));
        prompter.say("  Ubuntu/Debian:");
        prompter.say(&format!("    sudo ufw allow {}/tcp", port));
        prompter.say(&format!("    sudo ufw allow {}/udp\n", port));
        prompter.say("  CentOS/RHEL:");
        prompter.say(&format!("    sudo firewall-cmd --permanent --add-port={}/tcp", port));
        prompter.say(&format!("    sudo firewall-cmd --permanent --add-port={}/udp", port));
        prompter.say("    sudo firewall-cmd --reload\n");

        let name = self.service.name();
        prompter.say(&rule);
        prompter.say("🔧 服务管理命令:");
        prompter.say(&format!("  查看状态: systemctl status {}", name));
        prompter.say(&format!("  重启服务: systemctl restart {}", name));
        prompter.say(&format!("  查看日志: journalctl -u {} -f", name));
        prompter.say(&format!("  停止服务: systemctl stop {}\n", name));

        prompter.say("📊 当前服务状态:");
        if let Err(e) = self.service.status().await {
            warn!("⚠️ 无法获取服务状态: {}", e);
        }

        prompter.say("\n✅ 安装完成!请将上面的配置信息添加到您的客户端中。");
        for note in self.protocol.notes() {
            prompter.say(&note);
        }
        Ok(())
    }

    /// 卸载: 停止服务, 删除 unit、可执行文件和配置目录
    pub async fn uninstall(&self, prompter: &mut dyn Prompter) -> Result<()> {
        prompter.say("⚠️ 警告: 此操作将删除以下内容:");
        prompter.say(&format!("  1. Mihomo 程序文件 ({})", self.settings.binary_path.display()));
        prompter.say(&format!("  2. Mihomo 配置目录 ({})", self.settings.config_dir.display()));
        prompter.say(&format!("  3. systemd 服务 ({})\n", self.service.name()));

        let answer = prompter.ask("确认卸载? (yes/no): ")?;
        if answer.to_ascii_lowercase() != "yes" {
            prompter.say("❌ 已取消卸载");
            return Ok(());
        }

        prompter.say("\n🛑 停止服务...");
        self.service.stop_and_disable().await;

        match self.service.remove_unit().await {
            Ok(true) => prompter.say("✅ 服务文件已删除"),
            Ok(false) => prompter.say("⚠️ 服务文件不存在"),
            Err(e) => prompter.say(&format!("⚠️ 删除服务文件失败: {}", e)),
        }

        self.remove_path(prompter, &self.settings.binary_path, "Mihomo 程序");
        self.remove_path(prompter, &self.settings.config_dir, "配置目录");

        prompter.say("\n✅ 卸载完成!");
        Ok(())
    }

    fn remove_path(&self, prompter: &mut dyn Prompter, path: &std::path::Path, what: &str) {
        if !path.exists() {
            prompter.say(&format!("⚠️ {}不存在", what));
            return;
        }
        let result = if path.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        match result {
            Ok(()) => prompter.say(&format!("✅ {}已删除: {}", what, path.display())),
            Err(e) => prompter.say(&format!("⚠️ 删除{}失败: {}", what, e)),
        }
    }
}
