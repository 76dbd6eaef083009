use thiserror::Error;

/// 部署错误类型
#[derive(Error, Debug)]
pub enum DeployError {
    /// padding 三元组格式错误 (不是三个整数字段)
    #[error("格式错误: {0}")]
    Format(String),

    /// 数值越界
    #[error("范围错误: {0}")]
    Range(String),

    /// 密钥生成失败 (子进程失败 / 超时 / 输出无法解析)
    #[error("密钥生成失败: {0}")]
    KeyGen(String),

    /// 用户在确认步骤取消
    #[error("用户取消操作")]
    UserAbort,

    #[error("外部命令失败: {0}")]
    Command(String),

    #[error("不支持: {0}")]
    Unsupported(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML 序列化错误: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),
}

impl DeployError {
    /// 可以通过重新输入恢复的错误
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DeployError::Format(_) | DeployError::Range(_))
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
