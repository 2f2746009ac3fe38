use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments for the restkit server.
#[derive(Debug, Parser)]
#[command(name = "restkit-server", version, about = "restkit application server")]
pub struct Cli {
    /// Path to a TOML, YAML or JSON configuration file.
    #[arg(short, long, env = "RESTKIT_CONFIG_PATH")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_config_path() {
        let cli = Cli::try_parse_from(["restkit-server", "--config", "/etc/restkit.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/restkit.toml")));
    }
}
