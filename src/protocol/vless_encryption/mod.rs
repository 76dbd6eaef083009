//! VLESS Encryption: mlkem768x25519plus 混合密钥交换 + padding 策略

pub mod builder;
pub mod collector;
pub mod compose;
pub mod emitter;
pub mod keys;
pub mod padding;

use std::ops::RangeInclusive;

pub use builder::{build_interactive, BuilderState, Event};
pub use collector::{Collector, DeploymentConfig};
pub use compose::{compose, EncryptionMode, Negotiation, RttMode, Side, TicketTime, HYBRID_TAG};
pub use keys::{KeygenRunner, MihomoKeygen, MlKem768Pair, X25519Pair};
pub use padding::{BlockKind, PaddingBlock, PaddingChain, Triplet, DEFAULT_PADDING};

use super::{ClientSnippet, Protocol};
use crate::config::{ServiceConfig, Settings};
use crate::network::port::{PortProbe, SocketProbe};
use crate::utils::error::Result;
use crate::utils::prompt::Prompter;

/// VLESS Encryption 协议部署
pub struct VlessEncryption<K = MihomoKeygen, P = SocketProbe> {
    keygen: K,
    probe: P,
    port_range: RangeInclusive<u16>,
}

impl VlessEncryption {
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(MihomoKeygen::from_settings(settings), SocketProbe, settings.random_port_range())
    }
}

impl<K, P> VlessEncryption<K, P>
where
    K: KeygenRunner,
    P: PortProbe,
{
    pub fn new(keygen: K, probe: P, port_range: RangeInclusive<u16>) -> Self {
        Self {
            keygen,
            probe,
            port_range,
        }
    }
}

impl<K, P> Protocol for VlessEncryption<K, P>
where
    K: KeygenRunner,
    P: PortProbe,
{
    type Config = DeploymentConfig;

    fn name(&self) -> &'static str {
        "VLESS Encryption"
    }

    async fn collect_config(&self, prompter: &mut dyn Prompter) -> Result<DeploymentConfig> {
        Collector::new(&self.keygen, &self.probe, self.port_range.clone())
            .collect(prompter)
            .await
    }

    fn render_service_config(&self, config: &DeploymentConfig) -> ServiceConfig {
        emitter::render_service_config(config)
    }

    fn render_client_snippet(&self, config: &DeploymentConfig, server: &str) -> Result<ClientSnippet> {
        emitter::render_client_snippet(config, server)
    }

    fn report(&self, config: &DeploymentConfig) -> Vec<String> {
        let neg = &config.negotiation;
        vec![
            format!("  加密方式: {}", neg.mode),
            format!("  RTT 模式: {}", neg.rtt_mode),
            format!("  票据时间: {}", neg.ticket_time),
            format!("  端口: {}", config.port),
            format!("  UUID: {}", config.uuid),
            String::new(),
            "🔐 服务端密钥配置:".to_string(),
            format!("  X25519 PrivateKey: {}", config.x25519.private_key()),
            format!("  ML-KEM-768 Seed: {}", config.mlkem.seed()),
            String::new(),
            "🔐 客户端密钥配置:".to_string(),
            format!("  X25519 Password: {}", config.x25519.password()),
            format!("  ML-KEM-768 Client: {}", config.mlkem.client()),
            String::new(),
            "🔐 Padding 配置:".to_string(),
            format!("  {}", neg.padding),
            String::new(),
            "🔐 完整 Decryption 字符串(服务端):".to_string(),
            format!("  {}", config.decryption_string()),
            String::new(),
            "🔐 完整 Encryption 字符串(客户端):".to_string(),
            format!("  {}", config.encryption_string()),
        ]
    }

    fn port(&self, config: &DeploymentConfig) -> u16 {
        config.port
    }

    fn notes(&self) -> Vec<String> {
        vec![
            "💡 提示: VLESS Encryption 使用混合量子密钥交换 (X25519 + ML-KEM-768)".to_string(),
            "💡 注意: 该协议不使用 TLS,加密完全依赖 VLESS Encryption 本身".to_string(),
        ]
    }
}
