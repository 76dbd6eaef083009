use std::ffi::OsStr;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use super::error::{DeployError, Result};

/// 执行外部命令并捕获输出, 超过 `timeout` 视为失败
///
/// 超时后子进程会被杀掉。退出码由调用方检查。
pub async fn run_with_timeout<P, A>(program: P, args: &[A], timeout: Duration) -> Result<Output>
where
    P: AsRef<OsStr>,
    A: AsRef<OsStr>,
{
    let program = program.as_ref();
    debug!("🔧 执行: {:?} {:?}", program, args.iter().map(|a| a.as_ref()).collect::<Vec<_>>());

    let output_future = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(timeout, output_future).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(DeployError::Command(format!("无法执行 {:?}: {}", program, e))),
        Err(_) => Err(DeployError::Command(format!(
            "{:?} 执行超时 ({} 秒)",
            program,
            timeout.as_secs()
        ))),
    }
}

/// 执行命令, 非零退出码视为失败, 返回 stdout 文本
pub async fn run_checked<P, A>(program: P, args: &[A], timeout: Duration) -> Result<String>
where
    P: AsRef<OsStr>,
    A: AsRef<OsStr>,
{
    let name = program.as_ref().to_string_lossy().into_owned();
    let output = run_with_timeout(program, args, timeout).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DeployError::Command(format!(
            "{} 退出码 {:?}: {}",
            name,
            output.status.code(),
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// 在前台执行命令 (继承终端), 用于 systemctl status / journalctl -f
pub async fn run_foreground<P, A>(program: P, args: &[A]) -> Result<bool>
where
    P: AsRef<OsStr>,
    A: AsRef<OsStr>,
{
    let status = Command::new(program.as_ref())
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| DeployError::Command(format!("无法执行 {:?}: {}", program.as_ref(), e)))?;
    Ok(status.success())
}
