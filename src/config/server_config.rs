use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use super::cli::Cli;

const DEFAULT_DOWNLOADS_DIR: &str = "downloads";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_YT_DLP: &str = "yt-dlp";

pub fn read_config<P: AsRef<Path>>(path: P) -> anyhow::Result<FileConfig> {
    let contents = fs::read_to_string(path).with_context(|| "Failed to read config file")?;
    let config: FileConfig = serde_yml::from_str(&contents)
        .with_context(|| "Could not parse config (There is most likely an error in the config)")?;
    debug!("Read config: {:?}", config);
    Ok(config)
}

/// Optional yaml config, every key may be left out
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub downloads_dir: Option<PathBuf>,
    pub host: Option<IpAddr>,
    pub port: Option<u16>,
    #[serde(default)]
    pub extractor: FileExtractor,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileExtractor {
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub params: Vec<String>,
}

/// Resolved configuration, built once at startup and read-only afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where downloaded files are stored
    pub downloads_dir: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    pub extractor: ExtractorConfig,
}

/// How to invoke yt-dlp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    pub path: PathBuf,
    pub params: Vec<String>,
}

impl Config {
    /// Command line (and environment) wins over the config file, which wins over defaults
    pub fn resolve(cli: Cli) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => read_config(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => FileConfig::default(),
        };
        Ok(Self::merge(cli, file))
    }

    fn merge(cli: Cli, file: FileConfig) -> Self {
        let params = if cli.yt_dlp_args.is_empty() {
            file.extractor.params
        } else {
            cli.yt_dlp_args
        };

        Self {
            downloads_dir: cli
                .downloads_dir
                .or(file.downloads_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOADS_DIR)),
            host: cli
                .host
                .or(file.host)
                .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            extractor: ExtractorConfig {
                path: cli
                    .yt_dlp
                    .or(file.extractor.path)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_YT_DLP)),
                params,
            },
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
