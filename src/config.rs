use clap::Parser;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

/// Runtime settings. Every flag can also be supplied through the environment
/// (or a `.env` file, loaded before parsing).
#[derive(Debug, Clone, Parser)]
#[command(name = "filebox-server", version, about = "Local file upload and download server")]
pub struct AppConfig {
    /// Address to listen on
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Directory holding uploaded files, created if missing
    #[arg(long, env = "STORAGE_PATH", default_value = "files")]
    pub storage_path: PathBuf,

    /// Prebuilt frontend bundle served for non-API paths
    #[arg(long, env = "STATIC_DIR", default_value = "../dist")]
    pub static_dir: PathBuf,

    /// Largest accepted upload request body, in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 32 << 20)]
    pub max_upload_bytes: usize,

    /// Methods advertised in Access-Control-Allow-Methods
    #[arg(
        long,
        env = "CORS_ALLOW_METHODS",
        value_delimiter = ',',
        default_value = "GET,POST,PUT,DELETE,OPTIONS,HEAD"
    )]
    pub cors_allow_methods: Vec<String>,
}

impl AppConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
