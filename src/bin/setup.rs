use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pnp_subscription_bot::config::Config;
use pnp_subscription_bot::deploy::{init_env_file, should_deploy, CloudRunDeploy, InitEnvOutcome};

#[derive(Parser, Debug)]
#[command(name = "pnp-setup", version, about = "Deployment helper for the PNP Television bot")]
struct Cli {
    #[command(subcommand)]
    command: SetupCommand,
}

#[derive(Subcommand, Debug)]
enum SetupCommand {
    /// Write a .env template unless one already exists
    InitEnv {
        #[arg(long, default_value = ".env")]
        path: PathBuf,
    },
    /// Load .env and the environment, then check the bot configuration
    Validate,
    /// Print the Cloud Run deploy command for a branch, or skip
    DeployPlan {
        #[arg(long)]
        branch: String,
        #[arg(long)]
        image: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        SetupCommand::InitEnv { path } => init_env(&path),
        SetupCommand::Validate => validate(),
        SetupCommand::DeployPlan { branch, image } => deploy_plan(&branch, &image),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_env(path: &Path) -> Result<ExitCode> {
    match init_env_file(path)? {
        InitEnvOutcome::Created => {
            println!("✅ Created {} - edit it with your real values", path.display());
        }
        InitEnvOutcome::AlreadyExists => {
            println!("ℹ️  {} already exists, leaving it untouched", path.display());
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn validate() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let issues = config.validate();
    for issue in &issues {
        let marker = if issue.is_error() { "❌" } else { "⚠️ " };
        println!("{} {}", marker, issue.message);
    }

    if issues.iter().any(|issue| issue.is_error()) {
        return Ok(ExitCode::FAILURE);
    }
    println!("✅ Configuration is valid");
    Ok(ExitCode::SUCCESS)
}

fn deploy_plan(branch: &str, image: &str) -> Result<ExitCode> {
    if !should_deploy(branch) {
        println!("skip: branch '{branch}' is not deployed");
        return Ok(ExitCode::SUCCESS);
    }

    let substitutions: HashMap<String, String> = env::vars().filter(|(key, _)| key.starts_with('_')).collect();
    let deploy = CloudRunDeploy::from_substitutions(&substitutions)?;

    println!("gcloud {}", deploy.gcloud_args(image).join(" "));
    Ok(ExitCode::SUCCESS)
}
