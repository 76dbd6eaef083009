use std::fmt;
use std::str::FromStr;

use super::keys::{MlKem768Pair, X25519Pair};
use super::padding::PaddingChain;
use crate::utils::error::{DeployError, Result};

/// 混合密钥交换标识, 组合字符串的第一个字段
pub const HYBRID_TAG: &str = "mlkem768x25519plus";

/// 加密外观
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptionMode {
    /// 原始外观
    Native,
    /// 只 XOR 公钥
    #[default]
    XorPub,
    /// 全随机数
    Random,
}

impl EncryptionMode {
    pub const ALL: [EncryptionMode; 3] = [EncryptionMode::Native, EncryptionMode::XorPub, EncryptionMode::Random];

    pub fn as_str(&self) -> &'static str {
        match self {
            EncryptionMode::Native => "native",
            EncryptionMode::XorPub => "xorpub",
            EncryptionMode::Random => "random",
        }
    }
}

impl fmt::Display for EncryptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncryptionMode {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        EncryptionMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| DeployError::Format(format!("未知的加密方式: {}", s)))
    }
}

/// 客户端握手模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RttMode {
    ZeroRtt,
    #[default]
    OneRtt,
}

impl RttMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RttMode::ZeroRtt => "0rtt",
            RttMode::OneRtt => "1rtt",
        }
    }
}

impl fmt::Display for RttMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RttMode {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "0rtt" => Ok(RttMode::ZeroRtt),
            "1rtt" => Ok(RttMode::OneRtt),
            _ => Err(DeployError::Format(format!("未知的 RTT 模式: {}", s))),
        }
    }
}

/// 服务端票据有效时间
///
/// `0s` 表示禁用 0-RTT; 自定义值必须在 300-600 秒之间; 空值表示不写该字段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketTime(String);

impl TicketTime {
    pub const MIN_SECS: u64 = 300;
    pub const MAX_SECS: u64 = 600;

    /// `0s`
    pub fn disabled() -> Self {
        Self("0s".to_string())
    }

    /// 空值, 组合时该字段被省略
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn seconds(secs: u64) -> Result<Self> {
        if !(Self::MIN_SECS..=Self::MAX_SECS).contains(&secs) {
            return Err(DeployError::Range(format!(
                "时间必须在 {}-{} 秒之间",
                Self::MIN_SECS,
                Self::MAX_SECS
            )));
        }
        Ok(Self(format!("{}s", secs)))
    }

    /// 自定义分支的输入: 留空或 `<300-600>s`, 不接受 `0s`
    pub fn parse_custom(input: &str) -> Result<Self> {
        let ticket_time: TicketTime = input.parse()?;
        if ticket_time == Self::disabled() {
            return Err(DeployError::Range(format!(
                "时间必须在 {}-{} 秒之间",
                Self::MIN_SECS,
                Self::MAX_SECS
            )));
        }
        Ok(ticket_time)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for TicketTime {
    type Err = DeployError;

    /// 接受 `""`, `0s` 和 `<300-600>s`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::empty());
        }
        if s == "0s" {
            return Ok(Self::disabled());
        }
        let secs = s
            .strip_suffix('s')
            .and_then(|n| n.parse::<u64>().ok())
            .ok_or_else(|| DeployError::Format("格式错误,请输入如 300s 的格式".to_string()))?;
        Self::seconds(secs)
    }
}

impl fmt::Display for TicketTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 协商参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiation {
    pub mode: EncryptionMode,
    /// 仅服务端使用
    pub ticket_time: TicketTime,
    /// 仅客户端使用
    pub rtt_mode: RttMode,
    pub padding: PaddingChain,
}

impl Negotiation {
    /// 空票据时间只允许在 1-RTT 下使用
    pub fn new(mode: EncryptionMode, ticket_time: TicketTime, rtt_mode: RttMode, padding: PaddingChain) -> Result<Self> {
        if ticket_time.is_empty() && rtt_mode == RttMode::ZeroRtt {
            return Err(DeployError::Range("0-RTT 需要设置服务端票据时间".to_string()));
        }
        Ok(Self {
            mode,
            ticket_time,
            rtt_mode,
            padding,
        })
    }
}

impl Default for Negotiation {
    fn default() -> Self {
        Self {
            mode: EncryptionMode::default(),
            ticket_time: TicketTime::disabled(),
            rtt_mode: RttMode::default(),
            padding: PaddingChain::default_chain(),
        }
    }
}

/// 组合字符串的使用方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// `decryption` 字符串
    Server,
    /// `encryption` 字符串
    Client,
}

/// 组合服务端或客户端字符串
///
/// 字段顺序固定: 标识 . 加密方式 . (票据时间 | RTT 模式) . padding . (私钥 | password) . (seed | client)。
/// 空字段直接省略, 不留空段。
pub fn compose(negotiation: &Negotiation, x25519: &X25519Pair, mlkem: &MlKem768Pair, side: Side) -> String {
    let padding = negotiation.padding.to_string();
    let fields: [&str; 6] = match side {
        Side::Server => [
            HYBRID_TAG,
            negotiation.mode.as_str(),
            negotiation.ticket_time.as_str(),
            &padding,
            x25519.private_key(),
            mlkem.seed(),
        ],
        Side::Client => [
            HYBRID_TAG,
            negotiation.mode.as_str(),
            negotiation.rtt_mode.as_str(),
            &padding,
            x25519.password(),
            mlkem.client(),
        ],
    };

    fields
        .iter()
        .filter(|field| !field.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> (X25519Pair, MlKem768Pair) {
        (
            X25519Pair::from_output("PrivateKey: PRIV\nPassword: PASS\n").unwrap(),
            MlKem768Pair::from_output("Seed: SEED\nClient: CLIENT\n").unwrap(),
        )
    }

    #[test]
    fn test_compose_both_sides() {
        let (x, m) = keys();
        let neg = Negotiation::new(
            EncryptionMode::XorPub,
            TicketTime::disabled(),
            RttMode::OneRtt,
            PaddingChain::default_chain(),
        )
        .unwrap();

        assert_eq!(
            compose(&neg, &x, &m, Side::Server),
            "mlkem768x25519plus.xorpub.0s.100-111-1111.75-0-111.50-0-3333.PRIV.SEED"
        );
        assert_eq!(
            compose(&neg, &x, &m, Side::Client),
            "mlkem768x25519plus.xorpub.1rtt.100-111-1111.75-0-111.50-0-3333.PASS.CLIENT"
        );
    }

    #[test]
    fn test_empty_ticket_time_dropped() {
        let (x, m) = keys();
        let with = Negotiation::default();
        let without = Negotiation {
            ticket_time: TicketTime::empty(),
            ..Negotiation::default()
        };

        let full = compose(&with, &x, &m, Side::Server);
        let short = compose(&without, &x, &m, Side::Server);
        assert!(!short.contains(".."));
        assert_eq!(short.split('.').count() + 1, full.split('.').count());
        assert_eq!(short, "mlkem768x25519plus.xorpub.100-111-1111.75-0-111.50-0-3333.PRIV.SEED");
    }

    #[test]
    fn test_sides_share_mode_and_padding() {
        let (x, m) = keys();
        for mode in EncryptionMode::ALL {
            let neg = Negotiation::new(
                mode,
                TicketTime::seconds(300).unwrap(),
                RttMode::ZeroRtt,
                "100-40-50.10-0-5".parse().unwrap(),
            )
            .unwrap();
            let server: Vec<String> = compose(&neg, &x, &m, Side::Server).split('.').map(String::from).collect();
            let client: Vec<String> = compose(&neg, &x, &m, Side::Client).split('.').map(String::from).collect();

            assert_eq!(server.len(), client.len());
            assert_eq!(server[0..2], client[0..2]);
            assert_eq!(server[3..5], client[3..5]);
            assert_eq!(server[2], "300s");
            assert_eq!(client[2], "0rtt");
            assert_eq!((server[5].as_str(), server[6].as_str()), ("PRIV", "SEED"));
            assert_eq!((client[5].as_str(), client[6].as_str()), ("PASS", "CLIENT"));
        }
    }

    #[test]
    fn test_ticket_time_parsing() {
        assert_eq!("0s".parse::<TicketTime>().unwrap(), TicketTime::disabled());
        assert_eq!("".parse::<TicketTime>().unwrap(), TicketTime::empty());
        assert_eq!("600s".parse::<TicketTime>().unwrap().as_str(), "600s");
        assert!(matches!("299s".parse::<TicketTime>(), Err(DeployError::Range(_))));
        assert!(matches!("601s".parse::<TicketTime>(), Err(DeployError::Range(_))));
        assert!(matches!("300".parse::<TicketTime>(), Err(DeployError::Format(_))));
        assert!(matches!("abcs".parse::<TicketTime>(), Err(DeployError::Format(_))));

        assert!(matches!(TicketTime::parse_custom("0s"), Err(DeployError::Range(_))));
        assert!(matches!(TicketTime::parse_custom(" 0s "), Err(DeployError::Range(_))));
        assert_eq!(TicketTime::parse_custom("").unwrap(), TicketTime::empty());
        assert_eq!(TicketTime::parse_custom("300s").unwrap().as_str(), "300s");
    }

    #[test]
    fn test_empty_ticket_requires_one_rtt() {
        let err = Negotiation::new(
            EncryptionMode::Native,
            TicketTime::empty(),
            RttMode::ZeroRtt,
            PaddingChain::default_chain(),
        );
        assert!(matches!(err, Err(DeployError::Range(_))));
    }

    #[test]
    fn test_mode_names() {
        assert_eq!("random".parse::<EncryptionMode>().unwrap(), EncryptionMode::Random);
        assert_eq!("0rtt".parse::<RttMode>().unwrap(), RttMode::ZeroRtt);
        assert!("aes".parse::<EncryptionMode>().is_err());
    }
}
