use std::fmt;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::Settings;
use crate::utils::command::run_checked;
use crate::utils::error::{DeployError, Result};

/// 发布包架构
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Amd64,
    Arm64,
    Armv7,
    Armv6,
}

impl Arch {
    /// 由 `uname -m` 的输出映射
    pub fn from_machine(machine: &str) -> Result<Self> {
        match machine.trim() {
            "x86_64" => Ok(Arch::Amd64),
            "aarch64" => Ok(Arch::Arm64),
            "armv7l" => Ok(Arch::Armv7),
            "armv6l" => Ok(Arch::Armv6),
            other => Err(DeployError::Unsupported(format!("不支持的架构: {}", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
            Arch::Armv7 => "armv7",
            Arch::Armv6 => "armv6",
        }
    }
}

/// amd64 指令集等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    V1,
    V2,
    V3,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::V1 => "v1",
            Level::V2 => "v2",
            Level::V3 => "v3",
        }
    }
}

/// 根据 /proc/cpuinfo 第一条 flags 判断等级: avx2 → v3, avx → v2, 否则 v1
pub fn level_from_cpuinfo(cpuinfo: &str) -> Level {
    let flags = cpuinfo
        .lines()
        .find(|line| line.starts_with("flags"))
        .and_then(|line| line.split_once(':'))
        .map(|(_, flags)| flags)
        .unwrap_or_default();

    let has = |flag: &str| flags.split_whitespace().any(|f| f == flag);
    if has("avx2") {
        Level::V3
    } else if has("avx") {
        Level::V2
    } else {
        Level::V1
    }
}

/// 本机平台
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub arch: Arch,
    /// 只对 amd64 有意义
    pub level: Option<Level>,
}

impl Platform {
    /// 发布包文件名, 如 `mihomo-linux-amd64-v3-v1.19.0.gz`
    pub fn asset_name(&self, version: &str) -> String {
        match self.level {
            Some(level) => format!("mihomo-linux-{}-{}-{}.gz", self.arch.as_str(), level.as_str(), version),
            None => format!("mihomo-linux-{}-{}.gz", self.arch.as_str(), version),
        }
    }

    /// amd64 的兼容版本文件名, 其他架构没有
    pub fn compatible_asset_name(&self, version: &str) -> Option<String> {
        self.level
            .map(|_| format!("mihomo-linux-{}-compatible-{}.gz", self.arch.as_str(), version))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Some(level) => write!(f, "{} ({})", self.arch.as_str(), level.as_str()),
            None => f.write_str(self.arch.as_str()),
        }
    }
}

/// 检测本机架构和指令集等级
pub async fn detect(settings: &Settings) -> Result<Platform> {
    let machine = run_checked("uname", &["-m"], Duration::from_secs(5)).await?;
    let arch = Arch::from_machine(&machine)?;

    let level = if arch == Arch::Amd64 {
        match tokio::fs::read_to_string(&settings.cpu_info_path).await {
            Ok(cpuinfo) => Some(level_from_cpuinfo(&cpuinfo)),
            Err(e) => {
                warn!("⚠️ 无法读取 {}: {}", settings.cpu_info_path.display(), e);
                Some(Level::V1)
            }
        }
    } else {
        None
    };

    let platform = Platform { arch, level };
    info!("🧠 检测到 CPU 架构: {}", platform);
    Ok(platform)
}
