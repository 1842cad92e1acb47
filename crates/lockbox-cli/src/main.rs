//! Lockbox CLI - search shared accounts from the terminal

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use lockbox_core::config::Config;
use lockbox_core::domain::auth::AuthService;
use lockbox_core::domain::search::{
    AccountSearchService, SearchOutcome, SearchResults, SearchSession, SessionStore, SortKey,
    SortOrder, UserPreferences,
};
use lockbox_core::storage::{Database, default_database_path};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "lockbox")]
#[command(author, version, about = "Shared account search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database file (defaults to the configured path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply migrations
    Init,

    /// Search accounts visible to a user
    Search(SearchArgs),

    /// Authentication checks
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(clap::Args)]
struct SearchArgs {
    /// Login of the user searching
    #[arg(short, long)]
    user: String,

    /// Search text, or a user:, group:, file: or tag: expression
    #[arg(short, long, default_value = "")]
    text: String,

    /// Category id
    #[arg(long, default_value_t = 0)]
    category: i64,

    /// Customer id
    #[arg(long, default_value_t = 0)]
    customer: i64,

    /// Sort key (default, name, category, login, url, customer)
    #[arg(long, default_value = "default")]
    sort: String,

    /// Sort descending
    #[arg(long)]
    desc: bool,

    /// Offset of the first result
    #[arg(long, default_value_t = 0)]
    start: i64,

    /// Page size (0 for all rows, defaults to the configured account count)
    #[arg(long)]
    count: Option<i64>,

    /// Only favorites
    #[arg(long)]
    favorites: bool,

    /// Ignore ownership-based visibility
    #[arg(long)]
    global: bool,

    /// Session file holding colors and the last search
    #[arg(long)]
    session: Option<PathBuf>,

    /// Run the last search stored in the session again
    #[arg(long, requires = "session")]
    repeat: bool,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Check an action token
    Token {
        /// Action id
        #[arg(long)]
        action: i64,
        /// Token value
        token: String,
    },
    /// Check a local password (read from stdin)
    Login {
        /// Login name
        login: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show configuration file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lockbox=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => cmd_init(cli.db.as_deref(), cli.quiet).await,
        Commands::Search(args) => cmd_search(cli.db.as_deref(), args, cli.format).await,
        Commands::Auth { action } => cmd_auth(cli.db.as_deref(), action, cli.format).await,
        Commands::Config { action } => cmd_config(action, cli.quiet),
        Commands::Doctor => cmd_doctor(cli.db.as_deref(), cli.quiet).await,
    }
}

/// Database path from the flag, then the config, then the default location
fn resolve_db_path(flag: Option<&Path>, config: &Config) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| config.database.path.clone())
        .unwrap_or_else(default_database_path)
}

async fn open_db(flag: Option<&Path>, config: &Config) -> anyhow::Result<Database> {
    let path = resolve_db_path(flag, config);
    Database::open(Some(&path))
        .await
        .with_context(|| format!("Failed to open database {}", path.display()))
}

async fn cmd_init(db_flag: Option<&Path>, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let db = open_db(db_flag, &config).await?;
    let status = db.migration_status().await?;

    info!(path = %db.path().display(), version = status.current_version, "Database ready");
    if !quiet {
        println!("Database ready: {}", db.path().display());
        println!("Schema version: {}", status.current_version);
    }
    Ok(())
}

fn load_session(path: &Path) -> anyhow::Result<SearchSession> {
    if !path.exists() {
        return Ok(SearchSession::interactive(UserPreferences::default()));
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse session file {}", path.display()))
}

fn save_session(path: &Path, session: &SearchSession) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(session)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write session file {}", path.display()))
}

async fn cmd_search(
    db_flag: Option<&Path>,
    args: SearchArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let db = open_db(db_flag, &config).await?;

    let auth = AuthService::new(db.pool().clone(), config.auth.clone());
    let principal = auth.principal_for(&args.user).await?;
    let service = AccountSearchService::new(db.pool().clone(), config.search.clone());

    let mut session = match args.session {
        Some(ref path) => load_session(path)?,
        None => SearchSession::interactive(UserPreferences::default()),
    };

    let outcome = if args.repeat {
        service.repeat_last(&principal, &mut session).await?
    } else {
        let sort_key =
            SortKey::parse(&args.sort).ok_or_else(|| anyhow!("Unknown sort key: {}", args.sort))?;
        let sort_order = if args.desc { SortOrder::Desc } else { SortOrder::Asc };

        let mut criteria = service
            .default_criteria(&session)
            .with_text(args.text)
            .with_category(args.category)
            .with_customer(args.customer)
            .with_sort(sort_key, sort_order)
            .with_favorites_only(args.favorites)
            .with_global_search(args.global);
        let count = args.count.unwrap_or(criteria.limit_count);
        criteria = criteria.with_page(args.start, count);

        service.execute(criteria, &principal, &mut session).await?
    };

    if let Some(ref path) = args.session {
        save_session(path, &session)?;
    }

    match outcome {
        SearchOutcome::Found(ref results) => {
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
                OutputFormat::Text => {
                    print_results(results, session.last_criteria().map(|c| c.limit_start))
                }
            }
            Ok(())
        }
        SearchOutcome::QueryFailed { ref reason } => {
            warn!(reason = %reason, "Search query failed");
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
            Err(anyhow!("Search failed: {}", reason))
        }
    }
}

fn print_results(results: &SearchResults, start: Option<i64>) {
    if results.is_empty() {
        println!("No accounts found.");
        return;
    }

    println!(
        "{:<6} {:<30} {:<20} {:<20} {:<8} {}",
        "ID", "NAME", "CUSTOMER", "LOGIN", "COLOR", "ACCESS"
    );
    for row in &results.rows {
        let access = &row.access;
        let flags: String = [
            (access.can_view, 'v'),
            (access.can_view_secret, 's'),
            (access.can_edit, 'e'),
            (access.can_copy, 'c'),
            (access.can_delete, 'd'),
        ]
        .iter()
        .map(|(set, c)| if *set { *c } else { '-' })
        .collect();

        println!(
            "{:<6} {:<30} {:<20} {:<20} {:<8} {}",
            row.account.id,
            row.account.name,
            row.account.customer_name,
            row.account.login,
            row.color,
            flags
        );
        if !row.tags.is_empty() {
            println!("       tags: {}", row.tags.join(", "));
        }
    }

    let first = start.unwrap_or(0) + 1;
    let last = start.unwrap_or(0) + results.rows.len() as i64;
    println!();
    println!("Showing {}-{} of {} accounts", first, last, results.total);
}

async fn cmd_auth(
    db_flag: Option<&Path>,
    action: AuthAction,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let db = open_db(db_flag, &config).await?;
    let auth = AuthService::new(db.pool().clone(), config.auth.clone());

    let (label, ok) = match action {
        AuthAction::Token { action, token } => {
            ("token", auth.check_auth_token(action, &token).await?)
        }
        AuthAction::Login { login } => {
            let mut password = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut password)
                .context("Failed to read password from stdin")?;
            let password = password.trim_end_matches(['\r', '\n']);
            ("login", auth.authenticate_local(&login, password).await?)
        }
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "check": label, "valid": ok })),
        OutputFormat::Text => println!("{}", if ok { "valid" } else { "invalid" }),
    }

    if ok {
        Ok(())
    } else {
        Err(anyhow!("{} check failed", label))
    }
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(db_flag: Option<&Path>, quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("Lockbox Health Check");
        println!("====================");
        println!();
    }

    let mut all_ok = true;

    let config = match Config::load() {
        Ok(config) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }
            if config.auth.ldap_enabled && !config.auth.ldap_params_ok() {
                all_ok = false;
                if !quiet {
                    println!("[!!] Directory: enabled but server, base or group is missing");
                }
            }
            config
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Configuration: Error - {}", e);
            }
            Config::default()
        }
    };

    if !quiet {
        match Config::config_path() {
            Ok(path) if path.exists() => println!("[OK] Config file: {}", path.display()),
            Ok(path) => println!("[--] Config file: {} (using defaults)", path.display()),
            Err(e) => println!("[!!] Config file: {}", e),
        }
    }

    match open_db(db_flag, &config).await {
        Ok(db) => {
            let healthy = db.health_check().await.is_ok();
            let status = db.migration_status().await?;
            if healthy && !status.needs_migration {
                if !quiet {
                    println!(
                        "[OK] Database: {} (schema v{})",
                        db.path().display(),
                        status.current_version
                    );
                }
            } else {
                all_ok = false;
                if !quiet {
                    println!("[!!] Database: {} is not healthy", db.path().display());
                }
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Database: {:#}", e);
            }
        }
    }

    if !quiet {
        println!();
        if all_ok {
            println!("All checks passed.");
        } else {
            println!("Some checks failed.");
        }
    }

    if all_ok {
        Ok(())
    } else {
        Err(anyhow!("Health check failed"))
    }
}
