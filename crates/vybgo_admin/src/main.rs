use std::env;
use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use vybgo_server::auth::{hash_password, sign_token};
use vybgo_server::config::SupabaseConfig;
use vybgo_server::store::{Database, NewUser, SupabaseStore, UserRecord};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "vybgo_admin",
    about = "Admin and provisioning tasks for the VYBGO backend",
    long_about = "One-off maintenance commands run against the Supabase project:\n\
                  admin-user provisioning, token generation, and SQL application."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an admin user, or refresh the password of an existing one
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Sign a 7-day JWT for an existing user
    GenerateToken {
        #[arg(long)]
        email: String,
        #[arg(long, env = "JWT_SECRET")]
        jwt_secret: String,
    },
    /// List all users as JSON
    ListUsers,
    /// Grant admin rights to an existing user
    SetAdmin {
        #[arg(long)]
        email: String,
    },
    /// Apply a SQL file statement-by-statement via the exec_sql RPC
    ApplySql {
        #[arg(long)]
        file: PathBuf,
    },
}

type CommandError = Box<dyn std::error::Error>;

// ── command implementations ────────────────────────────────────────

fn user_json(user: &UserRecord) -> serde_json::Value {
    json!({
        "id": user.id,
        "email": user.email,
        "name": user.name,
        "isAdmin": user.is_admin,
    })
}

async fn create_admin(
    store: &SupabaseStore,
    email: &str,
    password: &str,
    name: Option<String>,
) -> Result<(), CommandError> {
    let password_hash = hash_password(password)?;

    let user = match store.find_user_by_email(email).await? {
        Some(existing) => {
            info!("User {email} exists, refreshing password and admin flag");
            store.set_password_hash(existing.id, password_hash).await?;
            store.set_admin(existing.id, true).await?
        }
        None => {
            info!("Creating admin user {email}");
            store
                .create_user(NewUser {
                    email: email.to_string(),
                    password_hash,
                    name,
                    phone: None,
                    is_admin: true,
                })
                .await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&user_json(&user))?);
    Ok(())
}

async fn generate_token(
    store: &SupabaseStore,
    email: &str,
    jwt_secret: &str,
) -> Result<(), CommandError> {
    let user = store
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| format!("User not found for email: {email}"))?;

    let token = sign_token(user.id, jwt_secret)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "user": user_json(&user),
            "token": token,
        }))?
    );
    Ok(())
}

async fn list_users(store: &SupabaseStore) -> Result<(), CommandError> {
    let users = store.list_users().await?;
    let rows: Vec<_> = users.iter().map(user_json).collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

async fn set_admin(store: &SupabaseStore, email: &str) -> Result<(), CommandError> {
    let user = store
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| format!("User not found for email: {email}"))?;

    let updated = store.set_admin(user.id, true).await?;
    println!("{}", serde_json::to_string_pretty(&user_json(&updated))?);
    Ok(())
}

async fn apply_sql(store: &SupabaseStore, file: &PathBuf) -> Result<(), CommandError> {
    let sql = std::fs::read_to_string(file)?;
    let statements: Vec<&str> = sql
        .split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty() && !statement.starts_with("--"))
        .collect();

    info!(
        "Applying {} statements from {}",
        statements.len(),
        file.display()
    );
    for (index, statement) in statements.iter().enumerate() {
        info!("Executing statement {}/{}", index + 1, statements.len());
        store.execute_sql(statement).await?;
    }
    info!("Applied {}", file.display());
    Ok(())
}

// ── entry point ────────────────────────────────────────────────────

fn store_from_env() -> SupabaseStore {
    let (Ok(url), Ok(service_role_key)) = (
        env::var("SUPABASE_URL"),
        env::var("SUPABASE_SERVICE_ROLE_KEY"),
    ) else {
        error!("SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY must be set");
        exit(2);
    };

    SupabaseStore::new(&SupabaseConfig {
        url,
        service_role_key,
    })
}

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let store = store_from_env();

    let result = match cli.command {
        Commands::CreateAdmin {
            email,
            password,
            name,
        } => create_admin(&store, &email, &password, name).await,
        Commands::GenerateToken { email, jwt_secret } => {
            generate_token(&store, &email, &jwt_secret).await
        }
        Commands::ListUsers => list_users(&store).await,
        Commands::SetAdmin { email } => set_admin(&store, &email).await,
        Commands::ApplySql { file } => apply_sql(&store, &file).await,
    };

    if let Err(err) = result {
        error!("Command failed: {err}");
        exit(1);
    }
}
