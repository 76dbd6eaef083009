pub mod vless_encryption;

pub use vless_encryption::VlessEncryption;

use crate::config::ServiceConfig;
use crate::utils::error::Result;
use crate::utils::prompt::Prompter;

/// 客户端导入片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSnippet {
    /// 多行 YAML
    pub document: String,
    /// 单行 flow 格式
    pub compact: String,
}

/// 协议部署能力接口
///
/// 每种协议实现一次, 安装流程 ([`crate::installer::Installer`]) 只依赖这个接口。
#[allow(async_fn_in_trait)]
pub trait Protocol {
    /// 一次安装收集到的部署参数
    type Config;

    fn name(&self) -> &'static str;

    /// 交互式收集部署参数
    async fn collect_config(&self, prompter: &mut dyn Prompter) -> Result<Self::Config>;

    /// 服务端配置
    fn render_service_config(&self, config: &Self::Config) -> ServiceConfig;

    /// 客户端导入片段
    fn render_client_snippet(&self, config: &Self::Config, server: &str) -> Result<ClientSnippet>;

    /// 安装完成后展示的协议相关信息
    fn report(&self, config: &Self::Config) -> Vec<String>;

    /// 需要在防火墙放行的端口
    fn port(&self, config: &Self::Config) -> u16;

    fn notes(&self) -> Vec<String> {
        Vec::new()
    }
}
