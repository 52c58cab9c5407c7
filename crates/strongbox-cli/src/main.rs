use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use strongbox_core::keystore::{KeyringBackend, SecureKeyStore};
use strongbox_core::lifecycle::KeyLifecycleManager;
use strongbox_core::record::{RecordMapper, SecretValue};
use strongbox_sync::autofill::AutofillGateway;
use strongbox_sync::config::{load_config, save_config, SyncConfig};
use strongbox_sync::paths::config_file;
use strongbox_sync::remote::HttpRemoteStore;
use strongbox_sync::service::{CredentialService, SyncState, VaultEntry};

#[derive(Parser)]
#[command(name = "strongbox")]
#[command(version, about = "Strongbox credential vault", long_about = None)]
struct Cli {
    /// Owner id; falls back to STRONGBOX_OWNER, then the configured owner
    #[arg(long, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a new credential
    Add {
        /// Site or service name
        name: String,

        /// Category label
        #[arg(long, default_value = "General")]
        category: String,

        /// Secret value; prompted when omitted
        #[arg(long)]
        secret: Option<String>,
    },

    /// List credentials (secrets stay masked)
    List {
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        search: Option<String>,
    },

    /// Print one credential's secret
    Show { name: String },

    /// Delete a credential by record id
    Delete { id: String },

    /// Resolve a credential the way the autofill provider does
    Autofill { service: String },

    /// Delete the local encryption key; stored records become unreadable
    ResetKey {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Set or print the remote endpoint configuration
    Config {
        #[arg(long)]
        api_base_url: Option<String>,

        #[arg(long)]
        api_token: Option<String>,

        #[arg(long)]
        set_owner: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = config_file()?;
    let config = load_config(&config_path)?;

    match cli.command {
        Commands::Add {
            name,
            category,
            secret,
        } => {
            let service = build_service(&resolve_owner(cli.owner, &config)?, &config)?;
            let secret = match secret {
                Some(secret) => secret,
                None => rpassword::prompt_password("Secret: ")?,
            };
            let entry = service.save(&name, &secret, &category).await?;
            println!(
                "Saved \"{}\" ({}) as {}",
                entry.record.name,
                entry.record.category,
                entry.id.as_deref().unwrap_or("<unacknowledged>")
            );
        }
        Commands::List { category, search } => {
            let service = build_service(&resolve_owner(cli.owner, &config)?, &config)?;
            service.load_all().await?;
            let entries = match (category, search) {
                (Some(category), _) => service.in_category(&category).await,
                (None, Some(query)) => service.search(&query).await,
                (None, None) => service.entries().await,
            };
            if entries.is_empty() {
                println!("No credentials.");
            }
            for entry in entries {
                println!("{}", describe(&entry));
            }
        }
        Commands::Show { name } => {
            let service = build_service(&resolve_owner(cli.owner, &config)?, &config)?;
            let entries = service.load_all().await?;
            let entry = entries
                .iter()
                .find(|e| e.record.name == name)
                .ok_or_else(|| anyhow!("no credential named \"{name}\""))?;
            match &entry.record.secret {
                SecretValue::Plain(secret) => println!("{secret}"),
                SecretValue::Undecryptable => {
                    return Err(anyhow!(
                        "\"{name}\" cannot be decrypted with the current key"
                    ))
                }
            }
        }
        Commands::Delete { id } => {
            let service = build_service(&resolve_owner(cli.owner, &config)?, &config)?;
            service.delete(&id).await?;
            println!("Deleted {id}");
        }
        Commands::Autofill { service: service_id } => {
            let service = build_service(&resolve_owner(cli.owner, &config)?, &config)?;
            let gateway = AutofillGateway::new(&service);
            match gateway.credential_for_service(&service_id).await? {
                Some(credential) => println!("{}\t{}", credential.name, credential.secret),
                None => return Err(anyhow!("no fillable credential for \"{service_id}\"")),
            }
        }
        Commands::ResetKey { yes } => {
            let owner = resolve_owner(cli.owner, &config)?;
            if !yes {
                return Err(anyhow!(
                    "reset-key makes every stored record for \"{owner}\" unreadable; re-run with --yes"
                ));
            }
            let service = build_service(&owner, &config)?;
            service.reset_key()?;
            println!("Encryption key for \"{owner}\" removed.");
        }
        Commands::Config {
            api_base_url,
            api_token,
            set_owner,
        } => {
            let mut config = config;
            let changed = api_base_url.is_some() || api_token.is_some() || set_owner.is_some();
            if let Some(url) = api_base_url {
                config.api_base_url = url;
            }
            if let Some(token) = api_token {
                config.api_token = Some(token);
            }
            if let Some(owner) = set_owner {
                config.owner_id = Some(owner);
            }
            if changed {
                save_config(&config_path, &config)?;
            }
            // Never echo the token back
            let mut display = config.clone();
            display.api_token = display.api_token.map(|_| "<set>".to_string());
            println!("{}", config_path.display());
            println!("{}", serde_json::to_string_pretty(&display)?);
        }
    }

    Ok(())
}

fn resolve_owner(cli_owner: Option<String>, config: &SyncConfig) -> Result<String> {
    cli_owner
        .or_else(|| std::env::var("STRONGBOX_OWNER").ok())
        .or_else(|| config.owner_id.clone())
        .ok_or_else(|| anyhow!("no owner configured; pass --owner or set STRONGBOX_OWNER"))
}

fn build_service(owner: &str, config: &SyncConfig) -> Result<CredentialService> {
    let backend = Arc::new(KeyringBackend);
    let store = SecureKeyStore::for_owner(backend, owner);
    let mapper = RecordMapper::new(KeyLifecycleManager::new(store));
    let remote = HttpRemoteStore::new(config.api_base_url.clone(), config.api_token.clone())?;
    Ok(CredentialService::new(mapper, Arc::new(remote), owner))
}

fn describe(entry: &VaultEntry) -> String {
    let id = entry.id.as_deref().unwrap_or("-");
    let secret = match &entry.record.secret {
        SecretValue::Plain(_) => "********",
        SecretValue::Undecryptable => "<undecryptable>",
    };
    let state = match entry.state {
        SyncState::Synced => "",
        SyncState::Pending => " [pending]",
        SyncState::Failed => " [failed]",
    };
    format!(
        "{id}  {}  {}  {secret}{state}",
        entry.record.name, entry.record.category
    )
}
