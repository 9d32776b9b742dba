//! # FL Studio MCP
//!
//! Installer, command bridge client and Model Context Protocol server for the
//! FL Studio MCP remote script.
//!
//! ## Overview
//!
//! Subcommands:
//! - `install` / `uninstall`: copy the bundled remote scripts into FL Studio
//! - `serve`: local bridge server answering from the simulated studio
//! - `mcp`: MCP server on stdio forwarding tool calls to FL Studio
//! - `send` / `test-connection`: one-off commands against the bridge
//! - `prompt`: create a track from a natural-language description
//!
//! ## Architecture
//!
//! This is Layer 3 - the binary that ties together:
//! - flstudio-mcp-core: Protocol, configuration, install layout
//! - flstudio-mcp-install: Privilege check, discovery, tree copy
//! - flstudio-mcp-bridge: TCP framing, server, reconnecting client
//! - flstudio-mcp-prompt: Prompt analysis and track creation

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rmcp::{transport::stdio, ServiceExt};
use tracing::{error, info, warn};

use flstudio_mcp::cli::{Cli, Commands, InstallArgs};
use flstudio_mcp::{logging, FlStudioMcpServer};
use flstudio_mcp_bridge::{BridgeServer, FlStudioClient, SimulatedStudio};
use flstudio_mcp_core::paths::{default_candidate_dirs, userprofile_dir};
use flstudio_mcp_core::{CommandType, Platform, ServerConfig};
use flstudio_mcp_install::{
    install, resolve_bundle_root, uninstall, InstallOptions, SystemPrivilegeCheck, TerminalPrompt,
};
use flstudio_mcp_prompt::{create_track_from_prompt, PRESET_PROMPTS};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    logging::init(&config.logging)?;
    info!("FL Studio MCP v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Install(args) => Ok(run_installer(&config, &args, false)),
        Commands::Uninstall(args) => Ok(run_installer(&config, &args, true)),
        Commands::Serve => serve(&config).await.map(|()| ExitCode::SUCCESS),
        Commands::Mcp { simulate } => run_mcp(&config, simulate).await.map(|()| ExitCode::SUCCESS),
        Commands::Send { command, params } => send(&config, &command, &params).await,
        Commands::TestConnection => test_connection(&config).await,
        Commands::Prompt {
            prompt,
            list_presets,
            simulate,
        } => {
            if list_presets {
                for preset in PRESET_PROMPTS {
                    println!("{preset}");
                }
                return Ok(ExitCode::SUCCESS);
            }
            let prompt = prompt.context("a prompt is required unless --list-presets is given")?;
            run_prompt(&config, &prompt, simulate).await
        }
    }
}

fn install_options(config: &ServerConfig, args: &InstallArgs) -> anyhow::Result<InstallOptions> {
    let userprofile =
        userprofile_dir().context("cannot determine the user profile directory")?;
    let bundle_root =
        resolve_bundle_root(args.source.as_deref().or(config.install.bundle_root.as_deref()))?;

    let mut options = InstallOptions::new(bundle_root, &userprofile);
    options.layout = args.layout.map(Into::into).unwrap_or(config.install.layout);
    options.fl_dir = args.fl_dir.clone();
    options.candidate_dirs = if config.install.candidate_dirs.is_empty() {
        let platform = Platform::detect();
        if !platform.supports_fl_studio() {
            warn!("FL Studio does not run on {}; pass --fl-dir or use --layout hardware", platform);
        }
        default_candidate_dirs(platform, &userprofile)
    } else {
        config.install.candidate_dirs.clone()
    };
    if !args.scripts.is_empty() {
        options.scripts = args.scripts.clone();
    }
    Ok(options)
}

/// Run install or uninstall, print the outcome and pause like the console
/// installer does. Returns the process exit code.
fn run_installer(config: &ServerConfig, args: &InstallArgs, remove: bool) -> ExitCode {
    let mut prompt = TerminalPrompt::stdio();

    let code = match install_options(config, args) {
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {e:#}");
            1
        }
        Ok(options) if remove => {
            match uninstall(&options, &SystemPrivilegeCheck, &mut prompt) {
                Ok(report) => {
                    for path in &report.removed {
                        println!("Removed {}", path.display());
                    }
                    for script in &report.missing {
                        println!("{script} was not installed");
                    }
                    println!("Uninstall complete.");
                    0
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    e.exit_code()
                }
            }
        }
        Ok(options) => match install(&options, &SystemPrivilegeCheck, &mut prompt) {
            Ok(report) => {
                for script in &report.scripts {
                    println!(
                        "Installed {} to {} ({} files{})",
                        script.script,
                        script.path.display(),
                        script.stats.files,
                        if script.replaced_previous {
                            ", replaced previous copy"
                        } else {
                            ""
                        }
                    );
                }
                println!();
                println!("Installation complete! Next steps:");
                for (i, step) in report.next_steps(&options.userprofile).iter().enumerate() {
                    println!("  {}. {}", i + 1, step);
                }
                0
            }
            Err(e) => {
                eprintln!("Error: {e}");
                e.exit_code()
            }
        },
    };

    if !args.no_pause {
        if let Err(e) = prompt.pause("Press Enter to exit...") {
            warn!("Pause failed: {}", e);
        }
    }

    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

async fn serve(config: &ServerConfig) -> anyhow::Result<()> {
    let studio = Arc::new(SimulatedStudio::new());
    let server = BridgeServer::bind(config.bridge.clone(), studio).await?;
    info!("Bridge listening on {}", server.local_addr()?);

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            shutdown.shutdown();
        }
    });

    server.run().await?;
    info!("Bridge stopped");
    Ok(())
}

async fn run_mcp(config: &ServerConfig, simulate: bool) -> anyhow::Result<()> {
    let mut client = FlStudioClient::new(config.bridge.clone());
    if simulate {
        client.set_simulation_mode(true);
    }

    info!(
        "MCP server targeting {} (simulation: {})",
        config.bridge.address(),
        simulate
    );

    let server = FlStudioMcpServer::with_client(client);

    // Serve the MCP server over stdio
    let service = server.serve(stdio()).await.map_err(|e| {
        error!("Error starting server: {}", e);
        e
    })?;

    info!("FL Studio MCP Server running on stdio");

    service.waiting().await?;

    info!("FL Studio MCP Server shutting down");
    Ok(())
}

async fn send(config: &ServerConfig, command: &str, params: &str) -> anyhow::Result<ExitCode> {
    let kind: CommandType = command.parse()?;
    let params: serde_json::Value =
        serde_json::from_str(params).context("params must be a JSON object")?;
    anyhow::ensure!(params.is_object(), "params must be a JSON object");

    let mut client = FlStudioClient::new(config.bridge.clone());
    let result = client.send_command(kind, params).await?;
    if client.simulation_mode() {
        warn!("FL Studio unreachable, result is simulated");
    }
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(ExitCode::SUCCESS)
}

async fn test_connection(config: &ServerConfig) -> anyhow::Result<ExitCode> {
    let mut client = FlStudioClient::new(config.bridge.clone());
    let status = client.test_connection().await;
    println!("{}", serde_json::to_string_pretty(&status)?);
    if status.connected {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!(
            "FL Studio is not answering on {}. Is the MCP remote script enabled?",
            status.address
        );
        Ok(ExitCode::FAILURE)
    }
}

async fn run_prompt(config: &ServerConfig, prompt: &str, simulate: bool) -> anyhow::Result<ExitCode> {
    let mut client = FlStudioClient::new(config.bridge.clone());
    if simulate {
        client.set_simulation_mode(true);
    }

    let report = create_track_from_prompt(&mut client, prompt).await?;
    for line in report.summary() {
        println!("{line}");
    }
    if client.simulation_mode() {
        println!("(simulation mode: nothing was sent to FL Studio)");
    }
    Ok(ExitCode::SUCCESS)
}
