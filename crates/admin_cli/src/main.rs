use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{Engine, EngineError, SignUp};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

mod prompt;

#[derive(Parser, Debug)]
#[command(name = "sample_app_admin")]
#[command(about = "Admin utilities for Sample App (bootstrap users, admins, sessions)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./sample_app.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage accounts.
    User(User),
    /// Manage sign-in sessions.
    Sessions(Sessions),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create an account; the password is asked for interactively.
    Create(UserCreateArgs),
    /// Make an existing account an admin.
    GrantAdmin(EmailArgs),
    /// Take the admin flag away from an account.
    RevokeAdmin(EmailArgs),
    /// Print one page of accounts.
    List(ListArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    username: Option<String>,
    /// Grant admin right away.
    #[arg(long)]
    admin: bool,
}

#[derive(Args, Debug)]
struct EmailArgs {
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long, default_value_t = 1)]
    page: u64,
}

#[derive(Args, Debug)]
struct Sessions {
    #[command(subcommand)]
    command: SessionsCommand,
}

#[derive(Subcommand, Debug)]
enum SessionsCommand {
    /// Delete every expired session.
    Purge,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn set_admin(
    engine: &Engine,
    email: &str,
    admin: bool,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let Some(user) = engine.user_by_email(email).await? else {
        eprintln!("user not found: {email}");
        std::process::exit(1);
    };
    let user = engine.set_admin(user.id, admin).await?;
    let state = if user.admin { "granted" } else { "revoked" };
    println!("admin {state}: {} <{}>", user.name, user.email);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let (password, password_confirmation) = prompt::new_password()?;
            let user = match engine
                .sign_up(SignUp {
                    name: args.name,
                    email: args.email,
                    username: args.username,
                    password,
                    password_confirmation,
                })
                .await
            {
                Ok(user) => user,
                Err(EngineError::Invalid(errors)) => {
                    for message in errors.full_messages() {
                        eprintln!("{message}");
                    }
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            };
            let user = if args.admin {
                engine.set_admin(user.id, true).await?
            } else {
                user
            };

            println!(
                "created user {}: {} <{}>{}",
                user.id,
                user.handle(),
                user.email,
                if user.admin { " (admin)" } else { "" }
            );
        }
        Command::User(User {
            command: UserCommand::GrantAdmin(args),
        }) => set_admin(&engine, &args.email, true).await?,
        Command::User(User {
            command: UserCommand::RevokeAdmin(args),
        }) => set_admin(&engine, &args.email, false).await?,
        Command::User(User {
            command: UserCommand::List(args),
        }) => {
            let page = engine.list_users(args.page).await?;
            for user in &page.items {
                println!(
                    "{:>6}  {:<20}  {:<30}  {}{}",
                    user.id,
                    user.handle(),
                    user.email,
                    user.name,
                    if user.admin { " [admin]" } else { "" }
                );
            }
            println!(
                "page {}/{} ({} users)",
                page.page,
                page.total_pages.max(1),
                page.total_items
            );
        }
        Command::Sessions(Sessions {
            command: SessionsCommand::Purge,
        }) => {
            let purged = engine.purge_expired_sessions().await?;
            println!("purged {purged} expired session(s)");
        }
    }

    Ok(())
}
