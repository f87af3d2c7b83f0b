use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use aluminium_store::{auth, config, db, logging, web};

#[derive(Parser, Debug)]
#[command(name = "aluminium-store", about = "Aluminium storefront and invoicing service")]
struct Cli {
    /// Overrides DATABASE_URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Overrides BIND_ADDR
        #[arg(long)]
        bind: Option<String>,
    },
    /// Create or upgrade the database schema
    InitDb,
    /// Create the admin account if it does not exist
    CreateAdmin {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = config::init()?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    let db = db::init(&config)
        .await
        .with_context(|| format!("opening database {}", config.database_url()))?;

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::InitDb => {
            println!("Initialized the database.");
        }
        Command::CreateAdmin { username, password } => {
            let username = username.unwrap_or_else(|| config.admin_username.clone());
            let password = password.unwrap_or_else(|| config.admin_password.clone());
            let created = auth::ensure_admin(
                &db,
                &username,
                &password,
                config.bcrypt_cost,
                config.default_labor_rate,
            )
            .await?;
            if created {
                println!("Admin user created.");
            } else {
                println!("Admin already exists.");
            }
        }
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }

            auth::ensure_admin(
                &db,
                &config.admin_username,
                &config.admin_password,
                config.bcrypt_cost,
                config.default_labor_rate,
            )
            .await?;

            let listener = tokio::net::TcpListener::bind(&config.bind_addr)
                .await
                .with_context(|| format!("binding {}", config.bind_addr))?;
            tracing::info!("listening on {}", listener.local_addr()?);

            let app = web::build_app(web::AppState::new(db, config));
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
