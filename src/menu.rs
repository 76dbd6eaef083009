use anyhow::Result;
use tracing::error;

use crate::installer::Installer;
use crate::protocol::Protocol;
use crate::utils::error::DeployError;
use crate::utils::prompt::{confirm, Prompter};

const RULE_WIDTH: usize = 63;

/// 主菜单动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Install,
    Uninstall,
    Status,
    Restart,
    Logs,
    Exit,
}

impl MenuAction {
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice {
            "1" => Some(MenuAction::Install),
            "2" => Some(MenuAction::Uninstall),
            "3" => Some(MenuAction::Status),
            "4" => Some(MenuAction::Restart),
            "5" => Some(MenuAction::Logs),
            "0" => Some(MenuAction::Exit),
            _ => None,
        }
    }
}

/// 错误是否来自用户取消 (确认时拒绝或输入流关闭)
pub fn is_user_abort(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<DeployError>(), Some(DeployError::UserAbort))
}

/// 交互主菜单
pub struct Menu<P: Protocol> {
    installer: Installer<P>,
}

impl<P: Protocol> Menu<P> {
    pub fn new(installer: Installer<P>) -> Self {
        Self { installer }
    }

    /// 运行到用户选择退出或输入流关闭
    pub async fn run(&self, prompter: &mut dyn Prompter) -> Result<()> {
        loop {
            print_main_menu(prompter);
            let choice = match prompter.ask("\n请选择操作 (输入编号): ") {
                Ok(choice) => choice,
                Err(DeployError::UserAbort) => break,
                Err(e) => return Err(e.into()),
            };

            let result = match MenuAction::from_choice(&choice) {
                Some(MenuAction::Exit) => break,
                Some(action) => self.dispatch(action, prompter).await,
                None => {
                    prompter.say("\n❌ 无效的选项,请重新选择");
                    continue;
                }
            };

            if let Err(e) = result {
                if is_user_abort(&e) {
                    prompter.say("\n❌ 用户取消操作");
                } else {
                    error!("❌ 操作失败: {:#}", e);
                    prompter.say(&format!("\n❌ 发生错误: {:#}", e));
                }
            }
        }

        prompter.say(&format!("\n{}", "═".repeat(RULE_WIDTH)));
        prompter.say("                  👋 感谢使用,再见! 👋");
        prompter.say(&format!("{}\n", "═".repeat(RULE_WIDTH)));
        Ok(())
    }

    pub async fn dispatch(&self, action: MenuAction, prompter: &mut dyn Prompter) -> Result<()> {
        match action {
            MenuAction::Install => self.install(prompter).await,
            MenuAction::Uninstall => {
                print_title(prompter, "🗑️  卸载 Mihomo 🗑️");
                self.installer.uninstall(prompter).await
            }
            MenuAction::Status => {
                print_title(prompter, "📊 服务状态查询 📊");
                if !self.installer.service().status().await? {
                    prompter.say("\n⚠️  服务未运行或未安装");
                }
                Ok(())
            }
            MenuAction::Restart => self.restart(prompter).await,
            MenuAction::Logs => {
                print_title(prompter, "📖 服务日志查看 📖");
                prompter.say("提示: 按 Ctrl+C 退出日志查看\n");
                tokio::select! {
                    result = self.installer.service().follow_logs() => {
                        result?;
                    }
                    _ = tokio::signal::ctrl_c() => {
                        prompter.say("\n✅ 已退出日志查看");
                    }
                }
                Ok(())
            }
            MenuAction::Exit => Ok(()),
        }
    }

    async fn install(&self, prompter: &mut dyn Prompter) -> Result<()> {
        let name = self.installer.protocol().name();
        print_title(prompter, "选择协议类型");
        prompter.say(&format!("  1. {}", name));
        prompter.say("       → 混合量子密钥交换 (mlkem768x25519plus), 无需证书\n");
        prompter.say("  0. 返回主菜单");

        loop {
            match prompter.ask("\n请选择协议 (输入编号): ")?.as_str() {
                "0" => return Ok(()),
                "1" => break,
                _ => prompter.say("❌ 无效的选项,请重新选择"),
            }
        }

        if !confirm(prompter, &format!("\n确认安装 {}? (y/n): ", name))? {
            prompter.say("❌ 已取消安装");
            return Ok(());
        }

        self.installer.install(prompter).await
    }

    async fn restart(&self, prompter: &mut dyn Prompter) -> Result<()> {
        print_title(prompter, "🔄 重启服务 🔄");
        if !confirm(prompter, "确认重启 Mihomo 服务? (y/n): ")? {
            prompter.say("❌ 已取消重启");
            return Ok(());
        }

        prompter.say("\n🔄 正在重启服务...");
        self.installer.service().restart().await?;
        prompter.say("✅ 服务重启成功!");
        prompter.say("\n📊 当前状态:");
        self.installer.service().status().await?;
        Ok(())
    }
}

fn print_main_menu(prompter: &mut dyn Prompter) {
    prompter.say(&format!("\n{}", "─".repeat(RULE_WIDTH)));
    prompter.say("                       M S C r i p t 主菜单");
    prompter.say(&format!("{}\n", "─".repeat(RULE_WIDTH)));
    prompter.say("  1. 安装协议");
    prompter.say("  2. 卸载Mihomo及删除相关配置文件");
    prompter.say("  3. 查看服务状态");
    prompter.say("  4. 重启服务");
    prompter.say("  5. 查看日志");
    prompter.say("  0. 退出程序");
    prompter.say(&format!("\n{}", "─".repeat(RULE_WIDTH)));
}

fn print_title(prompter: &mut dyn Prompter, title: &str) {
    prompter.say(&format!("\n{}", "═".repeat(RULE_WIDTH)));
    prompter.say(&format!("                    {}", title));
    prompter.say(&format!("{}\n", "═".repeat(RULE_WIDTH)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_choices() {
        assert_eq!(MenuAction::from_choice("1"), Some(MenuAction::Install));
        assert_eq!(MenuAction::from_choice("0"), Some(MenuAction::Exit));
        assert_eq!(MenuAction::from_choice("6"), None);
        assert_eq!(MenuAction::from_choice(""), None);
    }

    #[test]
    fn test_is_user_abort() {
        assert!(is_user_abort(&anyhow::Error::from(DeployError::UserAbort)));
        assert!(!is_user_abort(&anyhow::Error::from(DeployError::KeyGen("x".into()))));
        assert!(!is_user_abort(&anyhow::anyhow!("other")));
    }
}
