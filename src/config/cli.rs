use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Download videos with yt-dlp and serve them over http")]
pub struct Cli {
    #[clap(long, env = "KINTARO_CONFIG", help = "Path to an optional yaml config")]
    pub config: Option<PathBuf>,

    #[clap(
        long,
        env = "VITE_DOWNLOADS_DIR",
        help = "Directory downloaded videos are stored in [default: downloads]"
    )]
    pub downloads_dir: Option<PathBuf>,

    #[clap(long, env = "KINTARO_HOST", help = "Address to listen on [default: 0.0.0.0]")]
    pub host: Option<IpAddr>,

    #[clap(long, env = "VITE_BACKEND_PORT", help = "Port to listen on [default: 5000]")]
    pub port: Option<u16>,

    #[clap(long = "yt-dlp", env = "KINTARO_YT_DLP", help = "yt-dlp executable [default: yt-dlp]")]
    pub yt_dlp: Option<PathBuf>,

    #[clap(
        long = "yt-dlp-arg",
        allow_hyphen_values = true,
        help = "Extra argument passed to yt-dlp, may be repeated"
    )]
    pub yt_dlp_args: Vec<String>,
}
