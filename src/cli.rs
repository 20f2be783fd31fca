//! CLI parsing and command execution
//!
//! This module handles command-line argument parsing and routes commands to the appropriate handlers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use vault_config::{
    Config, GenericSecretBackendMetadata, HttpVaultSession, PropertySourceLocator, Secrets,
    VaultConfigOperations, VaultConfigTemplate,
};

#[derive(Parser)]
#[command(name = "vault-config")]
#[command(about = "Load application configuration from HashiCorp Vault", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "VAULT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Vault address (overrides config file)
    #[arg(long, env = "VAULT_ADDR")]
    pub vault_addr: Option<String>,

    /// Vault token (overrides config file)
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    pub vault_token: Option<String>,

    /// Fail on Vault error responses instead of logging a warning
    #[arg(long)]
    pub fail_fast: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a sample configuration file
    Init {
        /// Output path for the configuration file
        #[arg(short, long, default_value = "vault-config.toml")]
        output: PathBuf,
    },

    /// Read a single secret path and print its flattened properties
    Read {
        /// Secret backend mount (defaults to the generic backend)
        #[arg(short, long)]
        backend: Option<String>,

        /// Key below the backend, e.g. myapp/cloud
        key: String,

        /// Also print lease metadata
        #[arg(long)]
        show_lease: bool,
    },

    /// Locate and merge all property sources for the configured application
    Locate {
        /// Active profiles, in ascending precedence
        #[arg(short, long = "profile")]
        profiles: Vec<String>,

        /// Application name (overrides config)
        #[arg(short, long)]
        application: Option<String>,
    },
}

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    // Handle init command separately as it doesn't need Vault
    if let Commands::Init { output } = cli.command {
        Config::create_sample(&output)
            .with_context(|| format!("Failed to create sample config at {:?}", output))?;
        info!("Sample configuration created at {:?}", output);
        return Ok(());
    }

    // Load configuration
    let mut config = if let Some(config_path) = cli.config {
        Config::from_file(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        Config::from_env().context("Failed to load config from environment")?
    };

    // Override with CLI arguments if provided
    if let Some(addr) = cli.vault_addr {
        config.vault.address = addr;
    }
    if let Some(token) = cli.vault_token {
        config.vault.token = Some(token);
    }
    if cli.fail_fast {
        config.vault.fail_fast = true;
    }

    let session = HttpVaultSession::new(config.vault.address.clone(), config.vault.token.clone())
        .context("Failed to create Vault session")?;
    let template = VaultConfigTemplate::new(Arc::new(session), config.vault.clone());

    match cli.command {
        Commands::Init { .. } => unreachable!(), // Handled above

        Commands::Read {
            backend,
            key,
            show_lease,
        } => {
            let backend = backend.unwrap_or_else(|| config.vault.generic.backend.clone());
            let reference = GenericSecretBackendMetadata::new(backend, key);

            match template
                .read(&reference)
                .await
                .context("Failed to read secret")?
            {
                Some(secrets) => {
                    eprintln!(
                        "WARNING: Secret values will be displayed. Ensure this output is secured."
                    );
                    print_properties(secrets.data().iter());
                    if show_lease {
                        print_lease(&secrets);
                    }
                }
                None => println!("No secrets found at: {}/{}", reference.backend(), reference.key()),
            }
        }

        Commands::Locate {
            profiles,
            application,
        } => {
            let mut generic = config.vault.generic.clone();
            if let Some(application) = application {
                generic.application_name = application;
            }

            let locator = PropertySourceLocator::new(&template, &generic);
            let composite = locator
                .locate(&profiles)
                .await
                .context("Failed to locate property sources")?;

            if composite.is_empty() {
                println!("No property sources found for {}", generic.application_name);
                return Ok(());
            }

            println!("Property sources (lowest precedence first):");
            for source in composite.sources() {
                println!("  - {} ({} properties)", source.name(), source.properties().len());
            }

            eprintln!("WARNING: Secret values will be displayed. Ensure this output is secured.");
            let merged = composite.merged();
            print_properties(merged.iter());
        }
    }

    Ok(())
}

fn print_properties<'a>(properties: impl Iterator<Item = (&'a String, &'a String)>) {
    println!("Properties:");
    for (key, value) in properties {
        println!("  {}: {}", key, value);
    }
}

fn print_lease(secrets: &Secrets) {
    println!("Lease:");
    println!("  lease_id: {}", secrets.lease_id().unwrap_or(""));
    println!("  lease_duration: {}s", secrets.lease_duration());
    println!("  renewable: {}", secrets.is_renewable());
    if let Some(request_id) = secrets.request_id() {
        println!("  request_id: {}", request_id);
    }
    if let Some(warnings) = secrets.warnings() {
        for warning in warnings {
            println!("  warning: {}", warning);
        }
    }
}
