//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use flstudio_mcp_core::{BundledScript, InstallLayout, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "flstudio-mcp")]
#[command(version, about = "Install and drive the FL Studio MCP remote script")]
pub struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Bridge host (overrides the configuration)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Bridge port (overrides the configuration)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy the remote scripts into FL Studio (requires administrator rights)
    Install(InstallArgs),
    /// Remove previously installed remote scripts
    Uninstall(InstallArgs),
    /// Run a local bridge server backed by the simulated studio
    Serve,
    /// Run the MCP server on stdio
    Mcp {
        /// Start in simulation mode without contacting FL Studio
        #[arg(long)]
        simulate: bool,
    },
    /// Send one command to FL Studio and print the result
    Send {
        /// Command type, e.g. get_session_info or set_tempo
        command: String,
        /// Parameters as a JSON object
        #[arg(default_value = "{}")]
        params: String,
    },
    /// Check whether the remote script answers
    TestConnection,
    /// Create a track from a natural-language description
    Prompt {
        /// Description, e.g. "techno bass in F minor at 128 BPM"
        prompt: Option<String>,
        /// Print the example prompts and exit
        #[arg(long)]
        list_presets: bool,
        /// Use the simulator instead of FL Studio
        #[arg(long)]
        simulate: bool,
    },
}

/// Options shared by `install` and `uninstall`.
#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    /// FL Studio installation directory (skips probing)
    #[arg(long)]
    pub fl_dir: Option<PathBuf>,

    /// Directory containing the bundled script folders
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Destination layout
    #[arg(long, value_enum)]
    pub layout: Option<LayoutArg>,

    /// Script to process (repeatable; default: all)
    #[arg(long = "script", value_parser = parse_script)]
    pub scripts: Vec<BundledScript>,

    /// Exit without waiting for Enter
    #[arg(long)]
    pub no_pause: bool,
}

/// `--layout` values.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutArg {
    /// FL Studio's bundled Python site-packages
    SitePackages,
    /// The per-user MIDI hardware settings folder
    Hardware,
}

impl From<LayoutArg> for InstallLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::SitePackages => InstallLayout::SitePackages,
            LayoutArg::Hardware => InstallLayout::Hardware,
        }
    }
}

fn parse_script(s: &str) -> Result<BundledScript, String> {
    s.parse().map_err(|e: flstudio_mcp_core::Error| e.to_string())
}

impl Cli {
    /// Load the configuration file (or defaults) and apply command-line overrides.
    pub fn load_config(&self) -> flstudio_mcp_core::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };
        if let Some(host) = &self.host {
            config.bridge.host = host.clone();
        }
        if let Some(port) = self.port {
            config.bridge.port = port;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn install_flags_parse() {
        let cli = Cli::try_parse_from([
            "flstudio-mcp",
            "install",
            "--fl-dir",
            "/opt/fl",
            "--layout",
            "hardware",
            "--script",
            "remote",
            "--no-pause",
        ])
        .unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.fl_dir, Some(PathBuf::from("/opt/fl")));
                assert_eq!(args.layout, Some(LayoutArg::Hardware));
                assert_eq!(args.scripts, vec![BundledScript::RemoteScript]);
                assert!(args.no_pause);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_script_is_rejected() {
        let result = Cli::try_parse_from(["flstudio-mcp", "install", "--script", "nope"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_overrides_apply_to_config() {
        let cli = Cli::try_parse_from(["flstudio-mcp", "test-connection", "--port", "9999"])
            .unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config.bridge.port, 9999);
        assert_eq!(config.bridge.host, "localhost");
    }

    #[test]
    fn zero_port_fails_validation() {
        let cli = Cli::try_parse_from(["flstudio-mcp", "serve", "--port", "0"]).unwrap();
        assert!(cli.load_config().is_err());
    }

    #[test]
    fn send_defaults_to_empty_params() {
        let cli = Cli::try_parse_from(["flstudio-mcp", "send", "get_session_info"]).unwrap();
        match cli.command {
            Commands::Send { command, params } => {
                assert_eq!(command, "get_session_info");
                assert_eq!(params, "{}");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
