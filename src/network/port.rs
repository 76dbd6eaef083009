use std::net::{Ipv4Addr, SocketAddr};
use std::ops::RangeInclusive;

use rand::Rng;
use socket2::{Domain, Protocol, Socket, Type};
use tracing::debug;

use crate::utils::error::{DeployError, Result};

/// 随机选端口的最大尝试次数
const MAX_ATTEMPTS: usize = 1000;

/// 端口占用探测
pub trait PortProbe {
    /// 端口当前是否已被占用 (TCP 或 UDP)
    fn is_in_use(&self, port: u16) -> bool;
}

/// 通过尝试绑定 TCP 和 UDP socket 判断端口是否空闲
///
/// 不设置 SO_REUSEADDR, 任意地址上已有的绑定都会使探测失败。
#[derive(Debug, Default, Clone, Copy)]
pub struct SocketProbe;

impl SocketProbe {
    fn can_bind(ty: Type, protocol: Protocol, port: u16) -> bool {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        let socket = match Socket::new(Domain::IPV4, ty, Some(protocol)) {
            Ok(socket) => socket,
            Err(_) => return false,
        };
        socket.bind(&addr.into()).is_ok()
    }
}

impl PortProbe for SocketProbe {
    fn is_in_use(&self, port: u16) -> bool {
        !(Self::can_bind(Type::STREAM, Protocol::TCP, port) && Self::can_bind(Type::DGRAM, Protocol::UDP, port))
    }
}

/// 在范围内随机挑选一个空闲端口
pub fn random_free_port<P, R>(probe: &P, range: RangeInclusive<u16>, rng: &mut R) -> Result<u16>
where
    P: PortProbe + ?Sized,
    R: Rng,
{
    if range.is_empty() {
        return Err(DeployError::Range(format!(
            "端口范围为空: {}-{}",
            range.start(),
            range.end()
        )));
    }

    for _ in 0..MAX_ATTEMPTS {
        let port = rng.gen_range(range.clone());
        if !probe.is_in_use(port) {
            debug!("🎲 随机端口: {}", port);
            return Ok(port);
        }
    }

    Err(DeployError::Range(format!(
        "{}-{} 范围内找不到空闲端口",
        range.start(),
        range.end()
    )))
}

/// 解析用户输入的端口, 只接受 1-65535
pub fn parse_port(input: &str) -> Option<u16> {
    match input.trim().parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}
