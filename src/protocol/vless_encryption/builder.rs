use tracing::debug;

use super::padding::{BlockKind, PaddingChain, Triplet};
use crate::utils::error::{DeployError, Result};
use crate::utils::prompt::Prompter;

/// Padding 链构建状态
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BuilderState {
    /// 等待第一个 Padding 块 (100% 概率, 最小长度 >= 35)
    #[default]
    AwaitFirstPadding,
    /// 上一个块是 Padding, 可以添加 Delay 或完成
    AwaitNextAfterPadding(PaddingChain),
    /// 上一个块是 Delay, 可以添加 Padding 或完成
    AwaitNextAfterDelay(PaddingChain),
    /// 终态
    Done(PaddingChain),
}

/// 状态机输入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// 追加一个已通过格式校验的块, 类型由当前状态决定
    Add(Triplet),
    /// 结束构建
    Finish,
}

impl BuilderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 应用一个输入; 失败时状态保持不变
    pub fn apply(&mut self, event: Event) -> Result<()> {
        let state = std::mem::take(self);
        let (next, result) = Self::transition(state, event);
        *self = next;
        result
    }

    /// 解析一行文本并作为 [`Event::Add`] 应用
    pub fn apply_input(&mut self, input: &str) -> Result<()> {
        let triplet: Triplet = input.parse()?;
        self.apply(Event::Add(triplet))
    }

    fn transition(state: Self, event: Event) -> (Self, Result<()>) {
        use BuilderState::*;

        match (state, event) {
            (AwaitFirstPadding, Event::Add(triplet)) => match PaddingChain::new(triplet) {
                Ok(chain) => (AwaitNextAfterPadding(chain), Ok(())),
                Err(e) => (AwaitFirstPadding, Err(e)),
            },
            (AwaitFirstPadding, Event::Finish) => (
                AwaitFirstPadding,
                Err(DeployError::Format("第一个 Padding 不能为空".to_string())),
            ),
            (AwaitNextAfterPadding(mut chain), Event::Add(triplet)) => {
                chain.push(triplet);
                (AwaitNextAfterDelay(chain), Ok(()))
            }
            (AwaitNextAfterDelay(mut chain), Event::Add(triplet)) => {
                chain.push(triplet);
                (AwaitNextAfterPadding(chain), Ok(()))
            }
            (AwaitNextAfterPadding(chain), Event::Finish) | (AwaitNextAfterDelay(chain), Event::Finish) => {
                (Done(chain), Ok(()))
            }
            (Done(chain), _) => (
                Done(chain),
                Err(DeployError::Format("padding 链已完成".to_string())),
            ),
        }
    }

    /// 当前已构建的链
    pub fn chain(&self) -> Option<&PaddingChain> {
        match self {
            BuilderState::AwaitFirstPadding => None,
            BuilderState::AwaitNextAfterPadding(chain)
            | BuilderState::AwaitNextAfterDelay(chain)
            | BuilderState::Done(chain) => Some(chain),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, BuilderState::Done(_))
    }

    pub fn into_chain(self) -> Option<PaddingChain> {
        match self {
            BuilderState::Done(chain) => Some(chain),
            _ => None,
        }
    }
}

/// 交互式构建 padding 链, 支持无限串联
pub fn build_interactive(prompter: &mut dyn Prompter) -> Result<PaddingChain> {
    prompter.say("");
    prompter.say("🔧 自定义 Padding 配置");
    prompter.say(&"=".repeat(42));
    prompter.say("说明:");
    prompter.say("  - 第一个 Padding 必须 100% 概率且最小长度 >= 35");
    prompter.say("  - 后续可添加多个 padding/delay 块");
    prompter.say("  - 两个 padding 块之间必须有 delay 块");
    prompter.say("");

    let mut state = BuilderState::new();

    loop {
        if state == BuilderState::AwaitFirstPadding {
            prompter.say("📦 第一个 Padding (必填):");
            let input = prompter.ask("  格式 100-min-max (如 100-111-1111): ")?;
            if input.is_empty() {
                prompter.say("❌ 第一个 Padding 不能为空");
                continue;
            }
            match state.apply_input(&input) {
                Ok(()) => prompter.say(&format!("✅ 已添加: {}\n", input)),
                Err(e) if e.is_recoverable() => prompter.say(&format!("❌ {}", e)),
                Err(e) => return Err(e),
            }
            continue;
        }

        let next_kind = match &state {
            BuilderState::Done(_) => break,
            BuilderState::AwaitFirstPadding => continue,
            BuilderState::AwaitNextAfterPadding(chain) | BuilderState::AwaitNextAfterDelay(chain) => {
                prompter.say(&format!("当前配置: {}\n", chain));
                chain.next_kind()
            }
        };

        prompter.say("📊 下一步选择:");
        prompter.say(&format!("  1. 添加 {} 块", next_kind.label()));
        prompter.say("  2. 完成配置");
        match prompter.ask("请选择 (1/2): ")?.as_str() {
            "1" => {
                let triplet = ask_block(prompter, next_kind)?;
                state.apply(Event::Add(triplet))?;
                prompter.say(&format!("✅ 已添加 {}: {}\n", next_kind.label(), triplet));
            }
            "2" => state.apply(Event::Finish)?,
            _ => prompter.say("❌ 无效选项\n"),
        }
    }

    let chain = state
        .into_chain()
        .ok_or_else(|| DeployError::Format("padding 链未完成".to_string()))?;
    debug!("padding 链构建完成: {}", chain);
    Ok(chain)
}

/// 重复提问直到得到一个合法的块
fn ask_block(prompter: &mut dyn Prompter, kind: BlockKind) -> Result<Triplet> {
    let prompt = match kind {
        BlockKind::Padding => "\n📦 Padding 格式 probability-min-max (如 50-0-3333): ",
        BlockKind::Delay => "\n⏱️  Delay 格式 probability-min-max (如 75-0-111): ",
    };

    loop {
        let input = prompter.ask(prompt)?;
        if input.is_empty() {
            prompter.say(&format!("❌ {} 不能为空", kind.label()));
            continue;
        }
        match input.parse::<Triplet>() {
            Ok(triplet) => return Ok(triplet),
            Err(e) if e.is_recoverable() => prompter.say(&format!("❌ {}", e)),
            Err(e) => return Err(e),
        }
    }
}
