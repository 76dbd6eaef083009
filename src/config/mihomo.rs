use serde::{Deserialize, Serialize};

/// mihomo 服务端配置 (config.yaml)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub listeners: Vec<Listener>,
}

/// 入站监听器
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listener {
    pub name: String,
    #[serde(rename = "type")]
    pub listener_type: ListenerType,
    pub port: u16,
    pub listen: String,
    pub users: Vec<User>,
    /// VLESS Encryption 服务端字符串, 未启用时省略
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub decryption: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListenerType {
    Vless,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub uuid: String,
}

/// 客户端代理条目 (proxies 列表中的一项)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientProxy {
    pub name: String,
    pub server: String,
    #[serde(rename = "type")]
    pub proxy_type: ListenerType,
    pub port: u16,
    pub uuid: String,
    pub network: Network,
    pub udp: bool,
    /// VLESS Encryption 客户端字符串
    pub encryption: String,
    pub tls: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Tcp,
}

impl ListenerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListenerType::Vless => "vless",
        }
    }
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Tcp => "tcp",
        }
    }
}
