//! Marketstall CLI - account management tools.
//!
//! # Usage
//!
//! ```bash
//! # List registered users
//! ms-cli users list
//!
//! # Create a user (validated like signup)
//! ms-cli users create -f Jon -l Snow -e jon@wall.com -p 9998887771 --password 'Abcd123!'
//! ```
//!
//! # Commands
//!
//! - `users list` - Print id, name and email of every account
//! - `users create` - Register an account without going through the HTTP API
//!
//! Both read `STOREFRONT_DATA_DIR` (and `.env`) unless `--data-dir` is given.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ms-cli")]
#[command(author, version, about = "Marketstall CLI tools")]
struct Cli {
    /// Directory holding `users.json` (overrides `STOREFRONT_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage registered users
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// List every registered user
    List,
    /// Create a new user
    Create {
        /// First name
        #[arg(short, long)]
        first_name: String,

        /// Last name
        #[arg(short, long)]
        last_name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// 10-digit mobile number
        #[arg(short, long)]
        phone: String,

        /// Password (8-32 chars, upper, lower, digit, special)
        #[arg(long, env = "MS_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli);

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::print_stdout)]
fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let repository = commands::users::open_repository(cli.data_dir)?;

    match cli.command {
        Commands::Users { action } => match action {
            UsersAction::List => {
                for line in commands::users::list(&repository)? {
                    println!("{line}");
                }
            }
            UsersAction::Create {
                first_name,
                last_name,
                email,
                phone,
                password,
            } => {
                let user = commands::users::create(
                    &repository,
                    commands::users::NewUserArgs {
                        first_name,
                        last_name,
                        email,
                        phone,
                        password,
                    },
                )?;
                println!("Created user {} <{}>", user.id, user.email);
            }
        },
    }
    Ok(())
}
