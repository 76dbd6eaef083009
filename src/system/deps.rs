use std::env;
use std::ffi::OsStr;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

/// 安装流程依赖的外部命令
pub const REQUIRED_COMMANDS: &[&str] = &["gzip", "systemctl"];

/// 当前进程是否为 root
pub fn is_root() -> bool {
    // SAFETY: geteuid 没有前置条件, 不会失败
    unsafe { libc::geteuid() == 0 }
}

/// 在 PATH 中查找可执行文件
pub fn find_in_path(command: &str, path_var: &OsStr) -> Option<PathBuf> {
    env::split_paths(path_var)
        .map(|dir| dir.join(command))
        .find(|candidate| {
            candidate
                .metadata()
                .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
                .unwrap_or(false)
        })
}

/// 列出 PATH 中找不到的命令
pub fn missing_commands<'a>(commands: &[&'a str], path_var: &OsStr) -> Vec<&'a str> {
    commands
        .iter()
        .copied()
        .filter(|cmd| find_in_path(cmd, path_var).is_none())
        .collect()
}

/// 使用当前进程的 PATH 检查 [`REQUIRED_COMMANDS`]
pub fn missing_required() -> Vec<&'static str> {
    let path_var = env::var_os("PATH").unwrap_or_default();
    missing_commands(REQUIRED_COMMANDS, &path_var)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_in_path() {
        let dir = env::temp_dir().join(format!("mihomo-deps-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();

        let exe = dir.join("fake-tool");
        fs::write(&exe, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();

        let plain = dir.join("not-executable");
        fs::write(&plain, "").unwrap();
        fs::set_permissions(&plain, fs::Permissions::from_mode(0o644)).unwrap();

        let path_var = env::join_paths([PathBuf::from("/nonexistent"), dir.clone()]).unwrap();
        assert_eq!(find_in_path("fake-tool", &path_var), Some(exe));
        assert_eq!(
            missing_commands(&["fake-tool", "not-executable", "nope"], &path_var),
            vec!["not-executable", "nope"]
        );

        fs::remove_dir_all(&dir).unwrap();
    }
}
