use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, Level};

use mihomo_deploy::menu::{is_user_abort, Menu, MenuAction};
use mihomo_deploy::system::deps;
use mihomo_deploy::utils::prompt::TerminalPrompter;
use mihomo_deploy::{Installer, Settings, VlessEncryption};

#[derive(Parser, Debug)]
#[command(author, version, about = "Mihomo VLESS Encryption 一键部署", long_about = None)]
struct Args {
    /// 部署参数文件 (TOML), 不指定时使用默认路径
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// 日志级别
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// 客户端配置中使用的服务器地址, 不指定时自动查询公网 IP
    #[arg(long)]
    server: Option<String>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Cmd {
    /// 交互主菜单 (默认)
    Menu,
    /// 安装 VLESS Encryption
    Install,
    /// 卸载 mihomo 及相关配置
    Uninstall,
    /// 查看服务状态
    Status,
    /// 重启服务
    Restart,
    /// 跟踪服务日志
    Logs,
}

impl Cmd {
    fn action(self) -> Option<MenuAction> {
        match self {
            Cmd::Menu => None,
            Cmd::Install => Some(MenuAction::Install),
            Cmd::Uninstall => Some(MenuAction::Uninstall),
            Cmd::Status => Some(MenuAction::Status),
            Cmd::Restart => Some(MenuAction::Restart),
            Cmd::Logs => Some(MenuAction::Logs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 优先使用环境变量 RUST_LOG，否则使用命令行参数
    let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| args.log_level.clone());

    let log_level = match log_level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    if !deps::is_root() {
        error!("❌ 此程序需要 root 权限运行");
        bail!("请使用 sudo 或以 root 用户运行");
    }

    let settings = match &args.settings {
        Some(path) => {
            info!("📄 加载部署参数: {}", path.display());
            Settings::load(path)?
        }
        None => Settings::default(),
    };

    let protocol = VlessEncryption::from_settings(&settings);
    let installer = Installer::new(settings, protocol).with_server_address(args.server.clone());
    let menu = Menu::new(installer);
    let mut prompter = TerminalPrompter::new();

    match args.command.and_then(Cmd::action) {
        None => menu.run(&mut prompter).await,
        Some(action) => match menu.dispatch(action, &mut prompter).await {
            Err(e) if is_user_abort(&e) => {
                info!("❌ 用户取消操作");
                Ok(())
            }
            other => other,
        },
    }
}
