use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod mihomo;
mod validator;
pub use mihomo::{ClientProxy, Listener, ServiceConfig};
pub use validator::Validator;

/// 部署工具的运行参数
///
/// 所有固定路径都在这里, 由调用方显式传入各组件, 测试时可以指向临时目录。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// mihomo 配置目录 (config.yaml 所在目录, 同时是服务工作目录)
    #[serde(rename = "configDir")]
    pub config_dir: PathBuf,
    /// mihomo 可执行文件路径
    #[serde(rename = "binaryPath")]
    pub binary_path: PathBuf,
    /// systemd 服务名
    #[serde(rename = "serviceName")]
    pub service_name: String,
    /// systemd unit 文件路径
    #[serde(rename = "serviceFile")]
    pub service_file: PathBuf,
    /// systemctl 命令
    #[serde(rename = "systemctlPath")]
    pub systemctl_path: PathBuf,
    /// journalctl 命令
    #[serde(rename = "journalctlPath")]
    pub journalctl_path: PathBuf,
    /// CPU 信息文件, 用于判断指令集等级
    #[serde(rename = "cpuInfoPath")]
    pub cpu_info_path: PathBuf,
    /// 下载临时目录
    #[serde(rename = "downloadDir")]
    pub download_dir: PathBuf,
    /// 最新版本查询地址
    #[serde(rename = "releaseApi")]
    pub release_api: String,
    /// 下载地址前缀, 后接 `/<tag>/<file>`
    #[serde(rename = "releaseDownloadBase")]
    pub release_download_base: String,
    /// 公网 IP 查询地址 (返回纯文本 IP), 依次尝试
    #[serde(rename = "publicIpEndpoints")]
    pub public_ip_endpoints: Vec<String>,
    /// 密钥生成超时 (秒)
    #[serde(rename = "keygenTimeoutSecs")]
    pub keygen_timeout_secs: u64,
    /// 下载超时 (秒)
    #[serde(rename = "downloadTimeoutSecs")]
    pub download_timeout_secs: u64,
    /// 随机端口下限
    #[serde(rename = "randomPortMin")]
    pub random_port_min: u16,
    /// 随机端口上限
    #[serde(rename = "randomPortMax")]
    pub random_port_max: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("/root/.config/mihomo"),
            binary_path: PathBuf::from("/usr/local/bin/mihomo"),
            service_name: "mihomo".to_string(),
            service_file: PathBuf::from("/etc/systemd/system/mihomo.service"),
            systemctl_path: PathBuf::from("systemctl"),
            journalctl_path: PathBuf::from("journalctl"),
            cpu_info_path: PathBuf::from("/proc/cpuinfo"),
            download_dir: PathBuf::from("/tmp"),
            release_api: "https://api.github.com/repos/MetaCubeX/mihomo/releases/latest".to_string(),
            release_download_base: "https://github.com/MetaCubeX/mihomo/releases/download".to_string(),
            public_ip_endpoints: vec!["https://ifconfig.me/ip".to_string(), "https://icanhazip.com".to_string()],
            keygen_timeout_secs: 10,
            download_timeout_secs: 300,
            random_port_min: 20000,
            random_port_max: 60000,
        }
    }
}

impl Settings {
    /// 从 TOML 文件加载, 未出现的字段使用默认值
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件 {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("配置文件格式错误 {}", path.display()))?;

        Validator::validate_settings(&settings)?;

        Ok(settings)
    }

    /// 写出的服务配置文件
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.yaml")
    }

    pub fn keygen_timeout(&self) -> Duration {
        Duration::from_secs(self.keygen_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn random_port_range(&self) -> RangeInclusive<u16> {
        self.random_port_min..=self.random_port_max
    }
}
