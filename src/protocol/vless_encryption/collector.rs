use std::ops::RangeInclusive;

use tracing::{info, warn};
use uuid::Uuid;

use super::builder::build_interactive;
use super::compose::{compose, EncryptionMode, Negotiation, RttMode, Side, TicketTime};
use super::keys::{generate_mlkem768, generate_x25519, KeygenRunner, MlKem768Pair, X25519Pair};
use super::padding::{PaddingChain, DEFAULT_PADDING};
use crate::network::port::{parse_port, random_free_port, PortProbe};
use crate::utils::error::{DeployError, Result};
use crate::utils::prompt::{choose, is_affirmative, Prompter};

/// 一次安装的完整部署参数
///
/// 两个组合字符串不单独保存, 每次从这里重新生成。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub negotiation: Negotiation,
    pub x25519: X25519Pair,
    pub mlkem: MlKem768Pair,
    pub port: u16,
    pub uuid: String,
}

impl DeploymentConfig {
    /// 服务端 `decryption` 字符串
    pub fn decryption_string(&self) -> String {
        compose(&self.negotiation, &self.x25519, &self.mlkem, Side::Server)
    }

    /// 客户端 `encryption` 字符串
    pub fn encryption_string(&self) -> String {
        compose(&self.negotiation, &self.x25519, &self.mlkem, Side::Client)
    }
}

/// 交互式收集部署参数
pub struct Collector<'a, K, P: ?Sized> {
    keygen: &'a K,
    probe: &'a P,
    port_range: RangeInclusive<u16>,
}

impl<'a, K, P> Collector<'a, K, P>
where
    K: KeygenRunner,
    P: PortProbe + ?Sized,
{
    pub fn new(keygen: &'a K, probe: &'a P, port_range: RangeInclusive<u16>) -> Self {
        Self {
            keygen,
            probe,
            port_range,
        }
    }

    /// 依次询问所有参数, 最后要求用户确认
    ///
    /// 密钥生成失败直接返回 [`DeployError::KeyGen`]; 确认时回答非 y 返回 [`DeployError::UserAbort`]。
    pub async fn collect(&self, prompter: &mut dyn Prompter) -> Result<DeploymentConfig> {
        prompter.say(&format!("\n{}", "=".repeat(42)));
        prompter.say("⚙️ VLESS Encryption 部署配置");
        prompter.say(&format!("{}\n", "=".repeat(42)));

        let mode = select_mode(prompter)?;
        let ticket_time = select_ticket_time(prompter)?;
        let rtt_mode = select_rtt_mode(prompter, &ticket_time)?;
        let padding = select_padding(prompter)?;
        prompter.say(&format!("✅ 使用 Padding: {}", padding));

        let negotiation = Negotiation::new(mode, ticket_time, rtt_mode, padding)?;

        prompter.say("\n🔐 生成 X25519 密钥对...");
        let x25519 = generate_x25519(self.keygen).await?;
        prompter.say(&format!("✅ X25519 PrivateKey: {}", x25519.private_key()));
        prompter.say(&format!("✅ X25519 Password: {}", x25519.password()));

        prompter.say("\n🔐 生成 ML-KEM-768 密钥对...");
        let mlkem = generate_mlkem768(self.keygen).await?;
        prompter.say(&format!("✅ ML-KEM-768 Seed: {}", mlkem.seed()));
        prompter.say(&format!("✅ ML-KEM-768 Client: {}", mlkem.client()));

        prompter.say("\n📌 端口配置:");
        let port = self.select_port(prompter)?;

        prompter.say("\n🔑 UUID 配置:");
        let uuid = select_uuid(prompter)?;

        let config = DeploymentConfig {
            negotiation,
            x25519,
            mlkem,
            port,
            uuid,
        };

        print_summary(prompter, &config);
        let answer = prompter.ask("确认无误?(y/n): ")?;
        if !is_affirmative(&answer) {
            prompter.say("❌ 已取消");
            return Err(DeployError::UserAbort);
        }

        info!("✅ 部署参数已确认 (端口 {})", config.port);
        Ok(config)
    }

    /// 显式端口 1-65535; 留空或无效时随机选择空闲端口
    fn select_port(&self, prompter: &mut dyn Prompter) -> Result<u16> {
        let input = prompter.ask(&format!(
            "请输入端口 (1-65535, 留空随机 {}-{}): ",
            self.port_range.start(),
            self.port_range.end()
        ))?;

        if let Some(port) = parse_port(&input) {
            return Ok(port);
        }

        if !input.is_empty() {
            warn!("⚠️ 无效端口 {:?}, 改用随机端口", input);
        }
        let port = random_free_port(self.probe, self.port_range.clone(), &mut rand::thread_rng())?;
        prompter.say(&format!("🎲 随机端口: {}", port));
        Ok(port)
    }
}

fn select_mode(prompter: &mut dyn Prompter) -> Result<EncryptionMode> {
    prompter.say("🔐 加密方式:");
    prompter.say("  1. native  - 原始外观");
    prompter.say("  2. xorpub  - 只 XOR 公钥 (默认)");
    prompter.say("  3. random  - 全随机数");

    let choice = choose(prompter, "\n请选择加密方式 (1/2/3, 默认 2): ", 3, 2)?;
    Ok(EncryptionMode::ALL[choice - 1])
}

fn select_ticket_time(prompter: &mut dyn Prompter) -> Result<TicketTime> {
    prompter.say("\n🎫 服务端票据有效时间 (ticket_time):");
    prompter.say("  1. 0s   - 禁用 0-RTT");
    prompter.say("  2. 300s - 自定义时间 (300-600 秒)");

    if choose(prompter, "\n请选择 (1/2, 默认 1): ", 2, 1)? == 1 {
        return Ok(TicketTime::disabled());
    }

    loop {
        let input = prompter.ask("请输入时间 (300-600 秒之间,格式如 300s,留空则不设置): ")?;
        match TicketTime::parse_custom(&input) {
            Ok(ticket_time) => return Ok(ticket_time),
            Err(e) => prompter.say(&format!("❌ {}", e)),
        }
    }
}

fn select_rtt_mode(prompter: &mut dyn Prompter, ticket_time: &TicketTime) -> Result<RttMode> {
    prompter.say("\n🔄 客户端 RTT 模式 (rtt_mode):");
    prompter.say("  1. 0rtt - 启用 0-RTT");
    prompter.say("  2. 1rtt - 启用 1-RTT");

    loop {
        let rtt_mode = match choose(prompter, "\n请选择 (1/2, 默认 2): ", 2, 2)? {
            1 => RttMode::ZeroRtt,
            _ => RttMode::OneRtt,
        };
        if rtt_mode == RttMode::ZeroRtt && ticket_time.is_empty() {
            prompter.say("❌ 未设置服务端票据时间, 不能启用 0-RTT");
            continue;
        }
        return Ok(rtt_mode);
    }
}

fn select_padding(prompter: &mut dyn Prompter) -> Result<PaddingChain> {
    prompter.say("\n🔐 Padding 配置 (用于混淆长度特征):");
    prompter.say("  提示: 格式为 probability-min-max");
    prompter.say("  Padding 格式: 如 100-111-1111 (100%概率发送111-1111字节)");
    prompter.say("  Delay 格式: 如 75-0-111 (75%概率等待0-111毫秒)");
    prompter.say(&format!("  默认值: {}", DEFAULT_PADDING));

    let answer = prompter.ask("\n使用默认 Padding 配置? (y/n, 默认 y): ")?;
    if matches!(answer.to_ascii_lowercase().as_str(), "n" | "no") {
        build_interactive(prompter)
    } else {
        Ok(PaddingChain::default_chain())
    }
}

/// 留空时生成 UUID v4
fn select_uuid(prompter: &mut dyn Prompter) -> Result<String> {
    let input = prompter.ask("请输入 UUID (留空自动生成): ")?;
    if input.is_empty() {
        let uuid = Uuid::new_v4().to_string();
        prompter.say(&format!("🎲 生成 UUID: {}", uuid));
        Ok(uuid)
    } else {
        Ok(input)
    }
}

fn print_summary(prompter: &mut dyn Prompter, config: &DeploymentConfig) {
    let neg = &config.negotiation;
    let ticket = if neg.ticket_time.is_empty() {
        "(未设置)"
    } else {
        neg.ticket_time.as_str()
    };

    prompter.say("\n📋 配置信息确认:");
    prompter.say(&format!("  加密方式: {}", neg.mode));
    prompter.say(&format!("  服务端票据时间: {}", ticket));
    prompter.say(&format!("  客户端 RTT 模式: {}", neg.rtt_mode));
    prompter.say(&format!("  Padding: {}", neg.padding));
    prompter.say(&format!("  X25519 PrivateKey: {}", config.x25519.private_key()));
    prompter.say(&format!("  X25519 Password: {}", config.x25519.password()));
    prompter.say(&format!("  ML-KEM-768 Seed: {}", config.mlkem.seed()));
    prompter.say(&format!("  ML-KEM-768 Client: {}", config.mlkem.client()));
    prompter.say(&format!("  端口: {}", config.port));
    prompter.say(&format!("  UUID: {}\n", config.uuid));
}
