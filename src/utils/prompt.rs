use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use super::error::{DeployError, Result};

/// 终端交互抽象
///
/// 所有提问都经过这个 trait, 核心逻辑因此可以在没有终端的情况下测试。
/// 输入流关闭 (EOF / Ctrl-D) 视为中断, 返回 [`DeployError::UserAbort`]。
pub trait Prompter: Send {
    /// 输出提示并读取一行, 返回去除首尾空白后的内容
    fn ask(&mut self, prompt: &str) -> Result<String>;

    /// 输出一行信息
    fn say(&mut self, line: &str);
}

/// 基于标准输入输出的 Prompter
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for TerminalPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let mut line = String::new();
        let n = io::stdin().lock().read_line(&mut line)?;
        if n == 0 {
            println!();
            return Err(DeployError::UserAbort);
        }
        Ok(line.trim().to_string())
    }

    fn say(&mut self, line: &str) {
        println!("{}", line);
    }
}

/// 按预设答案回答的 Prompter
///
/// 用于非交互场景和测试。答案用尽时表现为输入流关闭。
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    /// 尚未消费的答案数
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    /// 所有输出过的提示和信息
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// 输出中是否出现过某段文本
    pub fn saw(&self, needle: &str) -> bool {
        self.transcript.iter().any(|line| line.contains(needle))
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.transcript.push(prompt.to_string());
        match self.answers.pop_front() {
            Some(answer) => Ok(answer.trim().to_string()),
            None => Err(DeployError::UserAbort),
        }
    }

    fn say(&mut self, line: &str) {
        self.transcript.push(line.to_string());
    }
}

/// 肯定回答: y / yes (不区分大小写)
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
}

/// y/n 确认
pub fn confirm(prompter: &mut dyn Prompter, prompt: &str) -> Result<bool> {
    let answer = prompter.ask(prompt)?;
    Ok(is_affirmative(&answer))
}

/// 编号选择, 空输入取默认值, 无效输入重新提问
///
/// 返回 1 起始的编号。
pub fn choose(prompter: &mut dyn Prompter, prompt: &str, count: usize, default: usize) -> Result<usize> {
    loop {
        let answer = prompter.ask(prompt)?;
        if answer.is_empty() {
            return Ok(default);
        }
        match answer.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => return Ok(n),
            _ => prompter.say("❌ 无效选项,请重新输入"),
        }
    }
}
