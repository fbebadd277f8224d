use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use toml::Value;

use tripdesk_core::config::{resolve_config_path, AppConfig, LoadOptions};

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "api.base_url",
        &config.api.base_url,
        source("api.base_url", &["TRIPDESK_API_BASE_URL"]),
    ));
    lines.push(render_line(
        "api.timeout_secs",
        &config.api.timeout_secs.to_string(),
        source("api.timeout_secs", &["TRIPDESK_API_TIMEOUT_SECS"]),
    ));
    lines.push(render_line(
        "auth.access_token",
        &render_secret(config.auth.access_token.as_ref()),
        source("auth.access_token", &["TRIPDESK_AUTH_ACCESS_TOKEN"]),
    ));
    lines.push(render_line(
        "auth.refresh_token",
        &render_secret(config.auth.refresh_token.as_ref()),
        source("auth.refresh_token", &["TRIPDESK_AUTH_REFRESH_TOKEN"]),
    ));
    lines.push(render_line(
        "selection.policy",
        config.selection.policy.as_str(),
        source("selection.policy", &["TRIPDESK_SELECTION_POLICY"]),
    ));
    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["TRIPDESK_LOGGING_LEVEL", "TRIPDESK_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["TRIPDESK_LOGGING_FORMAT", "TRIPDESK_LOG_FORMAT"]),
    ));

    CommandResult::success("config", lines.join("\n"))
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("config file"));
            return format!("file ({})", file_path.display());
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn render_secret(secret: Option<&SecretString>) -> String {
    match secret {
        Some(secret) => redact_token(secret.expose_secret()),
        None => "<unset>".to_string(),
    }
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    // Bearer tokens are JWTs; the header segment carries nothing secret.
    if let Some((header, _)) = trimmed.split_once('.') {
        let visible: String = header.chars().take(6).collect();
        return format!("{visible}.***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::redact_token;

    #[test]
    fn tokens_are_never_rendered_in_full() {
        assert_eq!(redact_token("eyJhbGciOiJIUzI1NiJ9.payload.signature"), "eyJhbG.***");
        assert_eq!(redact_token("opaque-token"), "<redacted>");
        assert_eq!(redact_token("   "), "<empty>");
    }
}
