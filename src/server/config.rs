use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory the browsing UI starts in.
    pub base_dir: PathBuf,
    /// Frontend directory to serve statically instead of the embedded page.
    pub frontend_dir_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: 5000,
            base_dir: PathBuf::from("."),
            frontend_dir_path: None,
        }
    }
}
