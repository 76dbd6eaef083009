use anyhow::{anyhow, Result};

use super::mihomo::ServiceConfig;
use super::Settings;
use crate::protocol::vless_encryption::HYBRID_TAG;

pub struct Validator;

impl Validator {
    /// 验证运行参数
    pub fn validate_settings(settings: &Settings) -> Result<()> {
        if settings.config_dir.as_os_str().is_empty() {
            return Err(anyhow!("configDir 不能为空"));
        }

        if settings.binary_path.as_os_str().is_empty() {
            return Err(anyhow!("binaryPath 不能为空"));
        }

        if settings.service_name.trim().is_empty() {
            return Err(anyhow!("serviceName 不能为空"));
        }

        if settings.keygen_timeout_secs == 0 {
            return Err(anyhow!("keygenTimeoutSecs 必须大于 0"));
        }

        if settings.random_port_min == 0 || settings.random_port_min > settings.random_port_max {
            return Err(anyhow!(
                "随机端口范围无效: {}-{}",
                settings.random_port_min,
                settings.random_port_max
            ));
        }

        Ok(())
    }

    /// 写入前验证服务端配置
    pub fn validate_service_config(config: &ServiceConfig) -> Result<()> {
        if config.listeners.is_empty() {
            return Err(anyhow!("至少需要一个监听器"));
        }

        for (idx, listener) in config.listeners.iter().enumerate() {
            // 验证端口
            if listener.port == 0 {
                return Err(anyhow!("监听器 {} 的端口不能为 0", idx));
            }

            if listener.users.is_empty() {
                return Err(anyhow!("监听器 {} 没有用户", idx));
            }

            for (user_idx, user) in listener.users.iter().enumerate() {
                if user.uuid.trim().is_empty() {
                    return Err(anyhow!("监听器 {} 的用户 {} UUID 为空", idx, user_idx));
                }
            }

            if let Some(decryption) = &listener.decryption {
                if !decryption.starts_with(HYBRID_TAG) {
                    return Err(anyhow!(
                        "监听器 {} 的 decryption 必须以 {} 开头",
                        idx,
                        HYBRID_TAG
                    ));
                }
                if decryption.contains("..") || decryption.ends_with('.') {
                    return Err(anyhow!("监听器 {} 的 decryption 含有空字段", idx));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::mihomo::*;

    fn listener(port: u16, uuid: &str, decryption: &str) -> ServiceConfig {
        ServiceConfig {
            listeners: vec![Listener {
                name: "vless-encryption-in-1".to_string(),
                listener_type: ListenerType::Vless,
                port,
                listen: "0.0.0.0".to_string(),
                users: vec![User {
                    username: "user1".to_string(),
                    uuid: uuid.to_string(),
                }],
                decryption: Some(decryption.to_string()),
            }],
        }
    }

    #[test]
    fn test_valid_service_config() {
        let config = listener(
            443,
            "b831381d-6324-4d53-ad4f-8cda48b30811",
            "mlkem768x25519plus.xorpub.0s.100-111-1111.priv.seed",
        );
        assert!(Validator::validate_service_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_service_config() {
        assert!(Validator::validate_service_config(&listener(0, "u", "mlkem768x25519plus.a")).is_err());
        assert!(Validator::validate_service_config(&listener(443, " ", "mlkem768x25519plus.a")).is_err());
        assert!(Validator::validate_service_config(&listener(443, "u", "none")).is_err());
        assert!(Validator::validate_service_config(&listener(443, "u", "mlkem768x25519plus..a")).is_err());
        assert!(Validator::validate_service_config(&ServiceConfig { listeners: vec![] }).is_err());
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Validator::validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let settings = Settings {
            keygen_timeout_secs: 0,
            ..Settings::default()
        };
        assert!(Validator::validate_settings(&settings).is_err());
    }
}
