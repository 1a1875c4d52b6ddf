//! HTTP server configuration.
//!
//! Resolved like [`AgentConfig`](crate::agent::AgentConfig): explicit
//! values → environment variables → defaults.

use std::path::PathBuf;

use crate::agent::config::env_nonempty;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;
/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default staging directory for uploads.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
/// Default upload size ceiling (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Configuration for the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Directory uploads are staged in.
    pub upload_dir: PathBuf,
    /// Largest accepted image, in bytes.
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Configuration from the environment alone.
    #[must_use]
    pub fn from_env() -> Self {
        Self::builder().from_env().build()
    }

    /// `host:port` string for binding.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Upload limit in whole megabytes, for error messages.
    #[must_use]
    pub const fn max_upload_mb(&self) -> usize {
        self.max_upload_bytes / (1024 * 1024)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone, Default)]
pub struct ServerConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    upload_dir: Option<PathBuf>,
    max_upload_bytes: Option<usize>,
}

impl ServerConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.host.is_none() {
            self.host = env_nonempty("CAMGPT_HOST");
        }
        if self.port.is_none() {
            self.port = env_nonempty("PORT").and_then(|v| v.parse().ok());
        }
        if self.upload_dir.is_none() {
            self.upload_dir = env_nonempty("CAMGPT_UPLOAD_DIR").map(PathBuf::from);
        }
        if self.max_upload_bytes.is_none() {
            self.max_upload_bytes =
                env_nonempty("CAMGPT_MAX_UPLOAD_BYTES").and_then(|v| v.parse().ok());
        }
        self
    }

    /// Sets the bind address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the listen port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the upload staging directory.
    #[must_use]
    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = Some(dir.into());
        self
    }

    /// Sets the upload size ceiling.
    #[must_use]
    pub const fn max_upload_bytes(mut self, n: usize) -> Self {
        self.max_upload_bytes = Some(n);
        self
    }

    /// Builds the [`ServerConfig`].
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            upload_dir: self
                .upload_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            max_upload_bytes: self.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        }
    }
}
