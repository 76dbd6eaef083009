use anyhow::{Context, Result};
use clap::Parser;
use rand::thread_rng;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use mihomo_deploy::config::Validator;
use mihomo_deploy::installer::UNKNOWN_SERVER;
use mihomo_deploy::network::{random_free_port, SocketProbe};
use mihomo_deploy::protocol::vless_encryption::keys::{generate_mlkem768, generate_x25519, MihomoKeygen};
use mihomo_deploy::protocol::vless_encryption::{
    emitter, DeploymentConfig, EncryptionMode, Negotiation, PaddingChain, RttMode, TicketTime,
};

/// 非交互生成 VLESS Encryption 服务端配置和客户端片段
#[derive(Parser, Debug)]
#[command(author, version, about = "VLESS Encryption 配置生成工具", long_about = None)]
struct Args {
    /// 加密方式: native / xorpub / random
    #[arg(long, default_value = "xorpub")]
    mode: EncryptionMode,

    /// 服务端票据时间: 0s 或 300s-600s, 空字符串表示省略
    #[arg(long, default_value = "0s")]
    ticket_time: TicketTime,

    /// 客户端 RTT 模式: 0rtt / 1rtt
    #[arg(long, default_value = "1rtt")]
    rtt: RttMode,

    /// padding 链, 如 100-111-1111.75-0-111.50-0-3333
    #[arg(long)]
    padding: Option<PaddingChain>,

    /// 监听端口, 不指定时随机选择空闲端口
    #[arg(long)]
    port: Option<u16>,

    /// 用户 UUID, 不指定时随机生成
    #[arg(long)]
    uuid: Option<String>,

    /// 客户端片段中的服务器地址
    #[arg(long, default_value = UNKNOWN_SERVER)]
    server: String,

    /// mihomo 可执行文件路径 (用于生成密钥)
    #[arg(long, default_value = "/usr/local/bin/mihomo")]
    binary: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    println!("========================================");
    println!("VLESS Encryption 配置生成工具");
    println!("========================================");
    println!();

    let negotiation = Negotiation::new(
        args.mode,
        args.ticket_time,
        args.rtt,
        args.padding.unwrap_or_default(),
    )?;

    let keygen = MihomoKeygen::new(&args.binary, Duration::from_secs(10));
    let x25519 = generate_x25519(&keygen).await?;
    let mlkem = generate_mlkem768(&keygen).await?;

    let port = match args.port.filter(|p| *p != 0) {
        Some(port) => port,
        None => random_free_port(&SocketProbe, 20000..=60000, &mut thread_rng())?,
    };
    let uuid = args
        .uuid
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let config = DeploymentConfig {
        negotiation,
        x25519,
        mlkem,
        port,
        uuid,
    };

    let service_config = emitter::render_service_config(&config);
    Validator::validate_service_config(&service_config)?;
    let snippet = emitter::render_client_snippet(&config, &args.server)?;

    println!("服务端配置 (config.yaml):");
    println!("{}", serde_yaml::to_string(&service_config).context("序列化服务端配置失败")?);
    println!("客户端配置:");
    println!("{}", snippet.document);
    println!("{}", snippet.compact);
    println!();
    println!("========================================");
    println!("下一步:");
    println!("========================================");
    println!();
    println!("1. 将服务端配置保存到 mihomo 配置目录下的 config.yaml");
    println!("2. 重启 mihomo 服务");
    println!("3. 将客户端配置导入客户端, 并把 server 改为服务器地址");
    println!();

    Ok(())
}
