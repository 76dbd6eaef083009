use std::fmt;
use std::str::FromStr;

use crate::utils::error::{DeployError, Result};

/// 默认 padding 链: Padding, Delay, Padding
pub const DEFAULT_PADDING: &str = "100-111-1111.75-0-111.50-0-3333";

/// 第一个 Padding 块的最小长度 (字节)
pub const FIRST_PADDING_MIN_LEN: u64 = 35;

/// 第一个 Padding 块的概率
pub const FIRST_PADDING_PROBABILITY: u8 = 100;

/// 块类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// 注入随机长度的填充字节
    Padding,
    /// 插入随机时长的等待 (毫秒)
    Delay,
}

impl BlockKind {
    pub fn label(&self) -> &'static str {
        match self {
            BlockKind::Padding => "Padding",
            BlockKind::Delay => "Delay",
        }
    }

    /// 链中第 `index` 个块的类型: 偶数位 Padding, 奇数位 Delay
    pub fn at(index: usize) -> Self {
        if index % 2 == 0 {
            BlockKind::Padding
        } else {
            BlockKind::Delay
        }
    }
}

/// `probability-min-max` 三元组, 构造时已完成范围校验
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triplet {
    probability: u8,
    min: u64,
    max: u64,
}

impl Triplet {
    /// 字段均为非负整数, 上限为 `u64::MAX`
    pub fn new(probability: u64, min: u64, max: u64) -> Result<Self> {
        let probability = u8::try_from(probability)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| DeployError::Range("概率必须在 0-100 之间".to_string()))?;

        if max < min {
            return Err(DeployError::Range("最大值不能小于最小值".to_string()));
        }

        Ok(Self { probability, min, max })
    }

    pub fn probability(&self) -> u8 {
        self.probability
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    /// 第一个块的额外约束: 100% 概率且最小长度 >= 35
    pub fn check_first_padding(&self) -> Result<()> {
        if self.probability != FIRST_PADDING_PROBABILITY {
            return Err(DeployError::Range("第一个 Padding 必须是 100% 概率".to_string()));
        }

        if self.min < FIRST_PADDING_MIN_LEN {
            return Err(DeployError::Range(format!(
                "第一个 Padding 的最小长度必须 >= {} 字节",
                FIRST_PADDING_MIN_LEN
            )));
        }

        Ok(())
    }
}

impl FromStr for Triplet {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('-').collect();
        if parts.len() != 3 {
            return Err(DeployError::Format("格式错误,应为 probability-min-max".to_string()));
        }

        let mut values = [0u64; 3];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = parse_field(part)?;
        }

        Triplet::new(values[0], values[1], values[2])
    }
}

/// 非负十进制整数; 超过 `u64::MAX` 报范围错误
fn parse_field(part: &str) -> Result<u64> {
    let part = part.trim();
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DeployError::Format(format!("必须为整数: {:?}", part)));
    }
    part.parse::<u64>()
        .map_err(|_| DeployError::Range(format!("数值超出上限 {}: {}", u64::MAX, part)))
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.probability, self.min, self.max)
    }
}

/// 链中的一个块
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddingBlock {
    pub kind: BlockKind,
    pub triplet: Triplet,
}

/// Padding / Delay 交替链
///
/// 块的类型由位置决定 (见 [`BlockKind::at`]), 因此相邻两个块不可能同类。
/// 第一个块总是满足 [`Triplet::check_first_padding`]。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddingChain {
    blocks: Vec<Triplet>,
}

impl PaddingChain {
    /// 以第一个 Padding 块开始一条链
    pub fn new(first: Triplet) -> Result<Self> {
        first.check_first_padding()?;
        Ok(Self { blocks: vec![first] })
    }

    /// 默认链 `100-111-1111.75-0-111.50-0-3333`
    pub fn default_chain() -> Self {
        let triplet = |p, min, max| Triplet { probability: p, min, max };
        Self {
            blocks: vec![triplet(100, 111, 1111), triplet(75, 0, 111), triplet(50, 0, 3333)],
        }
    }

    /// 追加一个块, 类型为下一个位置的类型
    pub fn push(&mut self, triplet: Triplet) -> BlockKind {
        let kind = self.next_kind();
        self.blocks.push(triplet);
        kind
    }

    /// 下一个追加的块的类型
    pub fn next_kind(&self) -> BlockKind {
        BlockKind::at(self.blocks.len())
    }

    /// 最后一个块的类型
    pub fn last_kind(&self) -> BlockKind {
        BlockKind::at(self.blocks.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// 链永远非空
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn blocks(&self) -> impl Iterator<Item = PaddingBlock> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, triplet)| PaddingBlock {
                kind: BlockKind::at(i),
                triplet: *triplet,
            })
    }

    pub fn first(&self) -> Triplet {
        self.blocks[0]
    }
}

impl Default for PaddingChain {
    fn default() -> Self {
        Self::default_chain()
    }
}

impl FromStr for PaddingChain {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DeployError::Format("padding 不能为空".to_string()));
        }

        let mut parts = s.split('.');
        let first = parts
            .next()
            .ok_or_else(|| DeployError::Format("padding 不能为空".to_string()))?
            .parse::<Triplet>()?;

        let mut chain = PaddingChain::new(first)?;
        for part in parts {
            chain.push(part.parse()?);
        }
        Ok(chain)
    }
}

impl fmt::Display for PaddingChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", block)?;
        }
        Ok(())
    }
}
