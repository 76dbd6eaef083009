use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use mihomo_deploy::protocol::vless_encryption::keys::{generate_mlkem768, generate_x25519, MihomoKeygen};

#[derive(Parser, Debug)]
#[command(author, version, about = "VLESS Encryption 密钥生成工具", long_about = None)]
struct Args {
    /// mihomo 可执行文件路径
    #[arg(short, long, default_value = "/usr/local/bin/mihomo")]
    binary: PathBuf,

    /// 单次生成超时 (秒)
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    println!("========================================");
    println!("VLESS Encryption 密钥生成工具");
    println!("========================================");
    println!();

    let keygen = MihomoKeygen::new(&args.binary, Duration::from_secs(args.timeout));
    let x25519 = generate_x25519(&keygen).await?;
    let mlkem = generate_mlkem768(&keygen).await?;

    println!("X25519 PrivateKey:  {}", x25519.private_key());
    println!("X25519 Password:    {}", x25519.password());
    println!("ML-KEM-768 Seed:    {}", mlkem.seed());
    println!("ML-KEM-768 Client:  {}", mlkem.client());
    println!();
    println!("========================================");
    println!("使用说明:");
    println!("========================================");
    println!();
    println!("1. 服务端 decryption 使用 PrivateKey 和 Seed");
    println!("2. 客户端 encryption 使用 Password 和 Client");
    println!();
    println!("注意: 服务端密钥请妥善保管, 不要泄露!");
    println!();

    Ok(())
}
