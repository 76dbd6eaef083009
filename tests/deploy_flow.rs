use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use mihomo_deploy::config::ServiceConfig;
use mihomo_deploy::menu::Menu;
use mihomo_deploy::network::PortProbe;
use mihomo_deploy::protocol::vless_encryption::KeygenRunner;
use mihomo_deploy::utils::error::{DeployError, Result};
use mihomo_deploy::utils::prompt::ScriptedPrompter;
use mihomo_deploy::{Installer, Settings, VlessEncryption};

struct FakeKeygen {
    fail: bool,
}

impl KeygenRunner for FakeKeygen {
    async fn generate(&self, subcommand: &str) -> Result<String> {
        if self.fail {
            return Err(DeployError::KeyGen("mihomo generate 执行超时 (10 秒)".to_string()));
        }
        Ok(match subcommand {
            "vless-x25519" => "PrivateKey: PRIV\nPassword: PASS\nHash32: H\n".to_string(),
            _ => "Seed: SEED\nClient: CLIENT\nHash32: H\n".to_string(),
        })
    }
}

struct NothingBusy;

impl PortProbe for NothingBusy {
    fn is_in_use(&self, _port: u16) -> bool {
        false
    }
}

/// 所有路径都在临时目录下, systemctl/journalctl 是只记录参数的脚本
fn temp_settings() -> Settings {
    let root = std::env::temp_dir().join(format!("mihomo-deploy-it-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&root).unwrap();

    let mut commands = Vec::new();
    for name in ["systemctl", "journalctl"] {
        let path = root.join(name);
        let log = root.join(format!("{}.log", name));
        fs::write(&path, format!("#!/bin/sh\necho \"$@\" >> {}\n", log.display())).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        commands.push(path);
    }

    Settings {
        config_dir: root.join("config"),
        binary_path: root.join("bin/mihomo"),
        service_name: "mihomo-it".to_string(),
        service_file: root.join("unit/mihomo.service"),
        systemctl_path: commands[0].clone(),
        journalctl_path: commands[1].clone(),
        ..Settings::default()
    }
}

fn systemctl_calls(settings: &Settings) -> String {
    fs::read_to_string(root_of(settings).join("systemctl.log")).unwrap_or_default()
}

fn installer(settings: Settings, fail: bool) -> Installer<VlessEncryption<FakeKeygen, NothingBusy>> {
    let protocol = VlessEncryption::new(FakeKeygen { fail }, NothingBusy, 20000..=60000);
    Installer::new(settings, protocol).with_server_address(Some("203.0.113.7".to_string()))
}

fn root_of(settings: &Settings) -> PathBuf {
    settings.config_dir.parent().unwrap().to_path_buf()
}

#[tokio::test]
async fn test_configure_writes_service_config() {
    let settings = temp_settings();
    let root = root_of(&settings);
    let installer = installer(settings.clone(), false);

    let mut prompter = ScriptedPrompter::new(["2", "1", "2", "y", "443", "abc-123", "y"]);
    let (config, path) = installer.configure(&mut prompter).await.unwrap();

    assert_eq!(path, settings.config_file());
    let written: ServiceConfig = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let listener = &written.listeners[0];
    assert_eq!(listener.port, 443);
    assert_eq!(listener.users[0].uuid, "abc-123");
    assert_eq!(
        listener.decryption.as_deref(),
        Some("mlkem768x25519plus.xorpub.0s.100-111-1111.75-0-111.50-0-3333.PRIV.SEED")
    );
    assert_eq!(
        config.encryption_string(),
        "mlkem768x25519plus.xorpub.1rtt.100-111-1111.75-0-111.50-0-3333.PASS.CLIENT"
    );

    fs::remove_dir_all(root).unwrap();
}

#[tokio::test]
async fn test_custom_padding_and_blank_ticket() {
    let settings = temp_settings();
    let root = root_of(&settings);
    let installer = installer(settings.clone(), false);

    let mut prompter = ScriptedPrompter::new([
        "1", // native
        "2", "", // 自定义票据时间, 留空
        "2", // 1rtt
        "n", "150-0-10", "100-20-50", "100-40-80", "1", "30-5-10", "2", // padding
        "", "", "y",
    ]);
    let (config, path) = installer.configure(&mut prompter).await.unwrap();

    assert_eq!(prompter.remaining(), 0);
    assert!(prompter.saw("❌"));
    assert_eq!(
        config.decryption_string(),
        "mlkem768x25519plus.native.100-40-80.30-5-10.PRIV.SEED"
    );
    assert!((20000..=60000).contains(&config.port));
    assert!(uuid::Uuid::parse_str(&config.uuid).is_ok());
    assert!(path.exists());

    fs::remove_dir_all(root).unwrap();
}

#[tokio::test]
async fn test_declined_confirmation_writes_nothing() {
    let settings = temp_settings();
    let installer = installer(settings.clone(), false);

    let mut prompter = ScriptedPrompter::new(["2", "1", "2", "y", "443", "abc-123", "n"]);
    let err = installer.configure(&mut prompter).await.unwrap_err();

    assert!(matches!(err.downcast_ref::<DeployError>(), Some(DeployError::UserAbort)));
    assert!(!settings.config_file().exists());

    fs::remove_dir_all(root_of(&settings)).unwrap();
}

#[tokio::test]
async fn test_keygen_failure_is_fatal() {
    let settings = temp_settings();
    let installer = installer(settings.clone(), true);

    let mut prompter = ScriptedPrompter::new(["2", "1", "2", "y", "443", "abc-123", "y"]);
    let err = installer.configure(&mut prompter).await.unwrap_err();

    assert!(matches!(err.downcast_ref::<DeployError>(), Some(DeployError::KeyGen(_))));
    assert_eq!(prompter.remaining(), 3);
    assert!(!settings.config_file().exists());

    fs::remove_dir_all(root_of(&settings)).unwrap();
}

#[tokio::test]
async fn test_uninstall_removes_files() {
    let settings = temp_settings();
    let root = root_of(&settings);
    fs::create_dir_all(&settings.config_dir).unwrap();
    fs::write(settings.config_file(), "listeners: []\n").unwrap();
    fs::create_dir_all(settings.binary_path.parent().unwrap()).unwrap();
    fs::write(&settings.binary_path, "").unwrap();

    let installer = installer(settings.clone(), false);

    let mut prompter = ScriptedPrompter::new(["no"]);
    installer.uninstall(&mut prompter).await.unwrap();
    assert!(prompter.saw("已取消卸载"));
    assert!(settings.binary_path.exists());
    assert_eq!(systemctl_calls(&settings), "");

    let mut prompter = ScriptedPrompter::new(["yes"]);
    installer.uninstall(&mut prompter).await.unwrap();
    assert!(!settings.binary_path.exists());
    assert!(!settings.config_dir.exists());
    assert!(prompter.saw("服务文件不存在"));
    assert_eq!(systemctl_calls(&settings), "stop mihomo-it\ndisable mihomo-it\n");

    fs::remove_dir_all(root).unwrap();
}

#[tokio::test]
async fn test_menu_restart_uses_configured_systemctl() {
    let settings = temp_settings();
    let menu = Menu::new(installer(settings.clone(), false));

    let mut prompter = ScriptedPrompter::new(["4", "n", "4", "y", "0"]);
    menu.run(&mut prompter).await.unwrap();

    assert!(prompter.saw("已取消重启"));
    assert!(prompter.saw("服务重启成功"));
    assert_eq!(
        systemctl_calls(&settings),
        "restart mihomo-it\nstatus mihomo-it --no-pager -l\n"
    );

    fs::remove_dir_all(root_of(&settings)).unwrap();
}

#[tokio::test]
async fn test_menu_exits_on_choice_and_eof() {
    let settings = temp_settings();
    let menu = Menu::new(installer(settings.clone(), false));

    let mut prompter = ScriptedPrompter::new(["9", "0"]);
    menu.run(&mut prompter).await.unwrap();
    assert!(prompter.saw("无效的选项"));
    assert!(prompter.saw("再见"));

    let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
    menu.run(&mut prompter).await.unwrap();
    assert!(prompter.saw("再见"));

    fs::remove_dir_all(root_of(&settings)).unwrap();
}

#[tokio::test]
async fn test_menu_install_can_go_back() {
    let settings = temp_settings();
    let menu = Menu::new(installer(settings.clone(), false));

    let mut prompter = ScriptedPrompter::new(["1", "0", "0"]);
    menu.run(&mut prompter).await.unwrap();
    assert!(prompter.saw("VLESS Encryption"));
    assert_eq!(prompter.remaining(), 0);

    fs::remove_dir_all(root_of(&settings)).unwrap();
}
