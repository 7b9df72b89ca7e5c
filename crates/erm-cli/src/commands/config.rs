//! `erm config`: where the graph database lives and which workspace
//! commands fall back to

use std::path::Path;

use clap::{Args, Subcommand};
use erm_core::validation::parse_id;
use erm_core::WorkspaceId;

use crate::config::{config_file_path, default_data_dir, Config};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print one setting (data_dir, default_workspace)
    Get {
        key: String,
    },
    /// Change one setting
    Set {
        key: String,
        value: String,
    },
    /// Remove a setting so the built-in default applies again
    Unset {
        key: String,
    },
    /// Show the settings commands will actually use
    #[command(alias = "list")]
    Show,
    /// Print the config file location
    Path,
    /// Write a fresh config file
    Init {
        /// Pin this workspace as the default
        #[arg(long)]
        default_workspace: Option<String>,
        /// Generate a new workspace id and pin it as the default
        #[arg(long, conflicts_with = "default_workspace")]
        new_workspace: bool,
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: &ConfigArgs) -> anyhow::Result<()> {
    match &args.command {
        ConfigCommands::Get { key } => run_get(key),
        ConfigCommands::Set { key, value } => run_set(key, value),
        ConfigCommands::Unset { key } => run_unset(key),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Path => {
            println!("{}", config_file_path().display());
            Ok(())
        }
        ConfigCommands::Init {
            default_workspace,
            new_workspace,
            force,
        } => {
            let workspace = match (default_workspace, new_workspace) {
                (Some(raw), _) => Some(parse_workspace(raw)?),
                (None, true) => Some(WorkspaceId::new()),
                (None, false) => None,
            };
            run_init(workspace, *force)
        }
    }
}

/// Check a value before it is written, in terms of what it will be used for
fn check_value(key: &str, value: &str) -> anyhow::Result<()> {
    match key {
        "default_workspace" => parse_workspace(value).map(|_| ()),
        "data_dir" => {
            let path = Path::new(value);
            if value.trim().is_empty() {
                anyhow::bail!("data_dir must not be empty");
            }
            if path.is_file() {
                anyhow::bail!(
                    "data_dir {} is a file; the graph database needs a directory",
                    path.display()
                );
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn parse_workspace(raw: &str) -> anyhow::Result<WorkspaceId> {
    Ok(parse_id::<WorkspaceId>("default_workspace", raw)?)
}

fn require_known(key: &str) -> anyhow::Result<()> {
    if !Config::keys().contains(&key) {
        anyhow::bail!(
            "Unknown config key: {} (available: {})",
            key,
            Config::keys().join(", ")
        );
    }
    Ok(())
}

fn run_get(key: &str) -> anyhow::Result<()> {
    require_known(key)?;
    match Config::load().get(key) {
        Some(value) => println!("{}", value),
        None => println!("(not set)"),
    }
    Ok(())
}

fn run_set(key: &str, value: &str) -> anyhow::Result<()> {
    require_known(key)?;
    check_value(key, value)?;

    let mut config = Config::load();
    config.set(key, value)?;
    config.save()?;
    tracing::info!("Config {} set in {}", key, config_file_path().display());
    println!("Set {} = {}", key, value);
    Ok(())
}

fn run_unset(key: &str) -> anyhow::Result<()> {
    require_known(key)?;
    let mut config = Config::load();
    if config.unset(key) {
        config.save()?;
        println!("Unset {}", key);
    } else {
        println!("{} was not set", key);
    }
    Ok(())
}

fn run_show() -> anyhow::Result<()> {
    let config = Config::load();
    println!("Config file: {}", config_file_path().display());
    println!();

    let data_dir = match &config.data_dir {
        Some(dir) => dir.display().to_string(),
        None => format!("{} (default)", default_data_dir().display()),
    };
    println!("data_dir          = {}", data_dir);
    println!(
        "database          = {}",
        config
            .data_dir
            .clone()
            .unwrap_or_else(default_data_dir)
            .join("erm.redb")
            .display()
    );

    let workspace = config.default_workspace.as_deref().unwrap_or("(not set)");
    println!("default_workspace = {}", workspace);
    if let Ok(env_ws) = std::env::var("ERM_WORKSPACE") {
        println!("  overridden by ERM_WORKSPACE={}", env_ws);
    }
    Ok(())
}

fn run_init(workspace: Option<WorkspaceId>, force: bool) -> anyhow::Result<()> {
    let path = config_file_path();
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    let config = Config {
        data_dir: None,
        default_workspace: workspace.map(|ws| ws.to_string()),
    };
    config.save()?;
    println!("Created config file at {}", path.display());
    if let Some(ws) = workspace {
        println!("Default workspace: {}", ws);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        assert!(check_value("default_workspace", "6f1c2b0e-8a51-4c1e-9d0a-3b3f1f4e2a10").is_ok());
        let err = check_value("default_workspace", "ws-1").unwrap_err();
        assert!(err.to_string().contains("Invalid UUID for default_workspace"));

        assert!(check_value("data_dir", "  ").is_err());
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(check_value("data_dir", file.path().to_str().unwrap()).is_err());
        let dir = tempfile::tempdir().unwrap();
        assert!(check_value("data_dir", dir.path().to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_require_known() {
        assert!(require_known("data_dir").is_ok());
        assert!(require_known("colour").is_err());
    }
}
