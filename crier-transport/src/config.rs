use serde::{Deserialize, Serialize};

/// Provider settings carried inside a job's configuration.
///
/// The `type` tag selects the provider:
///
/// ```json
/// { "type": "smtp", "host": "relay.example.com", "from": "news@example.com" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportConfig {
    Smtp(SmtpConfig),
    Ses(SesConfig),
    HttpApi(HttpApiConfig),
}

impl TransportConfig {
    /// Provider label, matching the serialized `type` tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Smtp(_) => "smtp",
            Self::Ses(_) => "ses",
            Self::HttpApi(_) => "http_api",
        }
    }
}

/// SMTP relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    pub from: String,
    #[serde(default)]
    pub tls: SmtpTls,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    /// Plaintext, for local relays and test servers.
    None,
    /// Implicit TLS from the first byte.
    Tls,
    /// Plaintext upgraded via STARTTLS.
    #[default]
    Starttls,
}

/// Amazon SES settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SesConfig {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub from: String,
}

/// Generic JSON mail API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpApiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub from: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_smtp_port() -> u16 {
    587
}

const fn default_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smtp_config_defaults() {
        let config: TransportConfig = serde_json::from_value(serde_json::json!({
            "type": "smtp",
            "host": "relay.example.com",
            "from": "news@example.com",
        }))
        .expect("decode smtp config");

        match config {
            TransportConfig::Smtp(smtp) => {
                assert_eq!(smtp.port, 587);
                assert_eq!(smtp.tls, SmtpTls::Starttls);
                assert_eq!(smtp.timeout_secs, 30);
                assert!(smtp.username.is_none());
            }
            other => panic!("decoded wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_tls_mode_decodes_lowercase() {
        let config: TransportConfig = serde_json::from_value(serde_json::json!({
            "type": "smtp",
            "host": "localhost",
            "port": 1025,
            "from": "news@example.com",
            "tls": "none",
        }))
        .expect("decode smtp config");

        match config {
            TransportConfig::Smtp(smtp) => assert_eq!(smtp.tls, SmtpTls::None),
            other => panic!("decoded wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_http_api_tag_is_snake_case() {
        let config: TransportConfig = serde_json::from_value(serde_json::json!({
            "type": "http_api",
            "endpoint": "https://mail.example.com/v1/send",
            "api_key": "secret",
            "from": "news@example.com",
        }))
        .expect("decode http_api config");

        assert_eq!(config.kind(), "http_api");
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let result: std::result::Result<TransportConfig, _> =
            serde_json::from_value(serde_json::json!({
                "type": "carrier_pigeon",
                "coop": "roof",
            }));
        assert!(result.is_err());
    }

    #[test]
    fn test_round_trip_preserves_tag() {
        let config = TransportConfig::Ses(SesConfig {
            region: "eu-west-1".to_string(),
            access_key_id: "AKIA".to_string(),
            secret_access_key: "secret".to_string(),
            from: "news@example.com".to_string(),
        });

        let value = serde_json::to_value(&config).expect("encode ses config");
        assert_eq!(value["type"], "ses");

        let back: TransportConfig = serde_json::from_value(value).expect("decode ses config");
        assert_eq!(back.kind(), "ses");
    }
}
