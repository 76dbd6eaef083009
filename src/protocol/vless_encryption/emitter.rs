use super::collector::DeploymentConfig;
use crate::config::mihomo::{ClientProxy, Listener, ListenerType, Network, ServiceConfig, User};
use crate::protocol::ClientSnippet;
use crate::utils::error::Result;

/// 监听器名称
pub const LISTENER_NAME: &str = "vless-encryption-in-1";
/// 唯一用户名
pub const USERNAME: &str = "user1";
/// 监听地址
pub const LISTEN_ADDR: &str = "0.0.0.0";

/// 服务端配置: 单个 vless 监听器, 携带 decryption 字符串
pub fn render_service_config(config: &DeploymentConfig) -> ServiceConfig {
    ServiceConfig {
        listeners: vec![Listener {
            name: LISTENER_NAME.to_string(),
            listener_type: ListenerType::Vless,
            port: config.port,
            listen: LISTEN_ADDR.to_string(),
            users: vec![User {
                username: USERNAME.to_string(),
                uuid: config.uuid.clone(),
            }],
            decryption: Some(config.decryption_string()),
        }],
    }
}

/// 客户端代理条目; 协议自带加密, TLS 关闭
pub fn render_client_proxy(config: &DeploymentConfig, server: &str) -> ClientProxy {
    let neg = &config.negotiation;
    ClientProxy {
        name: format!("VlessEnc|{}|{}", neg.mode, neg.rtt_mode),
        server: server.to_string(),
        proxy_type: ListenerType::Vless,
        port: config.port,
        uuid: config.uuid.clone(),
        network: Network::Tcp,
        udp: true,
        encryption: config.encryption_string(),
        tls: false,
    }
}

/// 客户端导入片段: 多行 YAML 列表 + 单行 flow 格式
pub fn render_client_snippet(config: &DeploymentConfig, server: &str) -> Result<ClientSnippet> {
    let proxy = render_client_proxy(config, server);
    let document = serde_yaml::to_string(&vec![&proxy])?;
    let compact = compact_line(&proxy)?;
    Ok(ClientSnippet { document, compact })
}

/// 字符串字段写成双引号标量 (JSON 字符串也是合法的 YAML flow 标量)
fn quoted(value: &str) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn compact_line(proxy: &ClientProxy) -> Result<String> {
    Ok(format!(
        "- {{name: {}, type: {}, server: {}, port: {}, uuid: {}, network: {}, udp: {}, encryption: {}, tls: {}}}",
        quoted(&proxy.name)?,
        proxy.proxy_type.as_str(),
        quoted(&proxy.server)?,
        proxy.port,
        quoted(&proxy.uuid)?,
        proxy.network.as_str(),
        proxy.udp,
        quoted(&proxy.encryption)?,
        proxy.tls
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::vless_encryption::compose::Negotiation;
    use crate::protocol::vless_encryption::keys::{MlKem768Pair, X25519Pair};

    fn config() -> DeploymentConfig {
        DeploymentConfig {
            negotiation: Negotiation::default(),
            x25519: X25519Pair::from_output("PrivateKey: PRIV\nPassword: PASS\n").unwrap(),
            mlkem: MlKem768Pair::from_output("Seed: SEED\nClient: CLIENT\n").unwrap(),
            port: 443,
            uuid: "b831381d-6324-4d53-ad4f-8cda48b30811".to_string(),
        }
    }

    #[test]
    fn test_service_config_yaml() {
        let service = render_service_config(&config());
        let yaml = serde_yaml::to_string(&service).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        let listener = &value["listeners"][0];
        assert_eq!(listener["name"].as_str(), Some(LISTENER_NAME));
        assert_eq!(listener["type"].as_str(), Some("vless"));
        assert_eq!(listener["port"].as_u64(), Some(443));
        assert_eq!(listener["listen"].as_str(), Some("0.0.0.0"));
        assert_eq!(listener["users"][0]["username"].as_str(), Some("user1"));
        assert_eq!(
            listener["users"][0]["uuid"].as_str(),
            Some("b831381d-6324-4d53-ad4f-8cda48b30811")
        );
        assert_eq!(
            listener["decryption"].as_str(),
            Some("mlkem768x25519plus.xorpub.0s.100-111-1111.75-0-111.50-0-3333.PRIV.SEED")
        );
    }

    #[test]
    fn test_client_snippet_renderings_agree() {
        let cfg = config();
        let snippet = render_client_snippet(&cfg, "203.0.113.7").unwrap();

        let multi: Vec<ClientProxy> = serde_yaml::from_str(&snippet.document).unwrap();
        let compact: Vec<ClientProxy> = serde_yaml::from_str(&snippet.compact).unwrap();
        assert_eq!(multi, compact);
        assert_eq!(multi.len(), 1);

        let proxy = &multi[0];
        assert_eq!(proxy.name, "VlessEnc|xorpub|1rtt");
        assert_eq!(proxy.server, "203.0.113.7");
        assert_eq!(proxy.port, 443);
        assert!(!proxy.tls);
        assert!(proxy.udp);
        assert_eq!(proxy.encryption, cfg.encryption_string());
        assert!(!snippet.compact.contains('\n'));
        assert!(snippet.document.lines().count() > 1);
    }

    #[test]
    fn test_compact_line_format() {
        let snippet = render_client_snippet(&config(), "1.2.3.4").unwrap();
        assert!(snippet
            .compact
            .starts_with("- {name: \"VlessEnc|xorpub|1rtt\", type: vless, server: \"1.2.3.4\", port: 443,"));
        assert!(snippet.compact.contains("uuid: \"b831381d-6324-4d53-ad4f-8cda48b30811\""));
        assert!(snippet.compact.ends_with(", tls: false}"));
    }

    #[test]
    fn test_compact_line_escapes_user_strings() {
        for uuid in ["abc, tls: true", "my id: x", "a}b", "quote\"inside", "#hash", "- dash"] {
            let cfg = DeploymentConfig {
                uuid: uuid.to_string(),
                ..config()
            };
            let snippet = render_client_snippet(&cfg, "host, tls: true").unwrap();

            let multi: Vec<ClientProxy> = serde_yaml::from_str(&snippet.document).unwrap();
            let compact: Vec<ClientProxy> = serde_yaml::from_str(&snippet.compact).unwrap();
            assert_eq!(multi, compact, "{:?}", uuid);
            assert_eq!(compact[0].uuid, uuid);
            assert_eq!(compact[0].server, "host, tls: true");
            assert!(!compact[0].tls);
            assert!(!snippet.compact.contains('\n'));
        }
    }
}
