use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::Settings;
use crate::utils::command::run_with_timeout;
use crate::utils::error::{DeployError, Result};

/// X25519 密钥对子命令
pub const X25519_SUBCOMMAND: &str = "vless-x25519";
/// ML-KEM-768 密钥对子命令
pub const MLKEM768_SUBCOMMAND: &str = "vless-mlkem768";

/// 密钥生成后端: 执行 `generate <subcommand>` 并返回标准输出
#[allow(async_fn_in_trait)]
pub trait KeygenRunner {
    async fn generate(&self, subcommand: &str) -> Result<String>;
}

/// 调用已安装的 mihomo 可执行文件生成密钥
#[derive(Debug, Clone)]
pub struct MihomoKeygen {
    binary: PathBuf,
    timeout: Duration,
}

impl MihomoKeygen {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.binary_path, settings.keygen_timeout())
    }
}

impl KeygenRunner for MihomoKeygen {
    async fn generate(&self, subcommand: &str) -> Result<String> {
        let output = run_with_timeout(&self.binary, &["generate", subcommand], self.timeout)
            .await
            .map_err(|e| DeployError::KeyGen(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeployError::KeyGen(format!(
                "generate {} 退出码 {:?}: {}",
                subcommand,
                output.status.code(),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// X25519 密钥对: 服务端私钥 + 客户端 password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X25519Pair {
    private_key: String,
    password: String,
}

impl X25519Pair {
    /// 从 `generate vless-x25519` 的输出解析
    pub fn from_output(output: &str) -> Result<Self> {
        match (find_label(output, "PrivateKey:"), find_label(output, "Password:")) {
            (Some(private_key), Some(password)) => Ok(Self { private_key, password }),
            _ => Err(DeployError::KeyGen("无法解析 X25519 密钥对".to_string())),
        }
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// ML-KEM-768 密钥对: 服务端 seed + 客户端 client key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MlKem768Pair {
    seed: String,
    client: String,
}

impl MlKem768Pair {
    /// 从 `generate vless-mlkem768` 的输出解析
    pub fn from_output(output: &str) -> Result<Self> {
        match (find_label(output, "Seed:"), find_label(output, "Client:")) {
            (Some(seed), Some(client)) => Ok(Self { seed, client }),
            _ => Err(DeployError::KeyGen("无法解析 ML-KEM-768 密钥对".to_string())),
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn client(&self) -> &str {
        &self.client
    }
}

/// 取第一行包含 `label` 的行中 label 之后的内容, 值为空视为缺失
fn find_label(output: &str, label: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let idx = line.find(label)?;
        let value = line[idx + label.len()..].trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// 生成 X25519 密钥对
pub async fn generate_x25519<R: KeygenRunner>(runner: &R) -> Result<X25519Pair> {
    info!("🔐 生成 X25519 密钥对...");
    let output = runner.generate(X25519_SUBCOMMAND).await?;
    let pair = X25519Pair::from_output(&output)?;
    debug!("X25519 Password: {}", pair.password());
    Ok(pair)
}

/// 生成 ML-KEM-768 密钥对
pub async fn generate_mlkem768<R: KeygenRunner>(runner: &R) -> Result<MlKem768Pair> {
    info!("🔐 生成 ML-KEM-768 密钥对...");
    let output = runner.generate(MLKEM768_SUBCOMMAND).await?;
    let pair = MlKem768Pair::from_output(&output)?;
    debug!("ML-KEM-768 Client: {}", pair.client());
    Ok(pair)
}
