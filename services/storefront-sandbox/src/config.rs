use anyhow::Context;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_STATIC_DIR: &str = "ui/storefront-wasm/pkg";

#[derive(Debug, Clone)]
pub(crate) struct SandboxConfig {
    pub(crate) addr: SocketAddr,
    /// wasm-pack output served under `/pkg`.
    pub(crate) static_dir: PathBuf,
    pub(crate) login_required: bool,
    /// Whether a fresh sandbox starts with a signed-in customer.
    pub(crate) logged_in: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            login_required: false,
            logged_in: true,
        }
    }
}

impl SandboxConfig {
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        let addr = env::var("SANDBOX_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_owned());
        let addr = addr
            .parse()
            .with_context(|| format!("SANDBOX_ADDR is not a socket address: {addr}"))?;

        let static_dir = env::var("SANDBOX_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATIC_DIR));

        Ok(Self {
            addr,
            static_dir,
            login_required: env_flag("SANDBOX_LOGIN_REQUIRED")?.unwrap_or(false),
            logged_in: env_flag("SANDBOX_LOGGED_IN")?.unwrap_or(true),
        })
    }
}

fn env_flag(name: &str) -> anyhow::Result<Option<bool>> {
    match env::var(name) {
        Ok(value) => parse_flag(&value)
            .map(Some)
            .with_context(|| format!("{name} must be a boolean, got {value:?}")),
        Err(_) => Ok(None),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
