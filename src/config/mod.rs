// Configuration module entry point
// Loads configuration from file and environment, then validates the file-delivery settings

mod files;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use files::{normalize_extension, FileServerConfig};
pub use types::{Config, FilesConfig, LoggingConfig, ServerConfig, TlsConfig};

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("FILESERVER").separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8443)?
            .set_default("server.header_read_timeout", 30)?
            .set_default("files.base_path", "shared_files")?
            .set_default(
                "files.allowed_extensions",
                vec![".txt", ".pdf", ".jpg", ".png", ".mp4"],
            )?
            .set_default("files.max_file_size", 52_428_800)? // 50MB
            .set_default("files.stream_timeout", 30)?
            .set_default("files.chunk_size", 65_536)?
            .set_default("files.cache_max_age", 3600)?
            .set_default("files.create_base_dir", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log_format", "json")?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("does-not-exist-fileserver-config").unwrap();
        assert_eq!(cfg.server.port, 8443);
        assert!(cfg.server.tls.is_none());
        assert_eq!(cfg.files.base_path, "shared_files");
        assert_eq!(cfg.files.max_file_size, 52_428_800);
        assert_eq!(cfg.files.stream_timeout, 30);
        assert_eq!(cfg.files.allowed_extensions.len(), 5);
        assert_eq!(cfg.logging.access_log_format, "json");
        assert!(cfg.logging.access_log_file.is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9443

[server.tls]
cert_path = "certs/server.cert"
key_path = "certs/server.key"

[files]
base_path = "/srv/shared"
allowed_extensions = [".txt"]
max_file_size = 1024
"#
        )
        .unwrap();

        let stem = dir.path().join("server");
        let cfg = Config::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9443);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(
            cfg.server.tls,
            Some(TlsConfig {
                cert_path: "certs/server.cert".to_string(),
                key_path: "certs/server.key".to_string(),
            })
        );
        assert_eq!(cfg.files.base_path, "/srv/shared");
        assert_eq!(cfg.files.allowed_extensions, vec![".txt".to_string()]);
        assert_eq!(cfg.files.max_file_size, 1024);
        assert_eq!(cfg.files.chunk_size, 65_536);
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 9443);
    }
}
