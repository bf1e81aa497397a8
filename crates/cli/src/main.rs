//! LearnHub CLI - browse the catalog and manage an account from a shell.
//!
//! # Usage
//!
//! ```bash
//! # List published courses
//! learnhub catalog list
//!
//! # Show one course with its lessons
//! learnhub catalog show 0b54b945-dfd1-48a8-a982-b40356ba1c49
//!
//! # Sign in (email or username) and print the resolved profile
//! learnhub account login -i ada@example.com -p secret
//!
//! # Register a new account
//! learnhub account register -u ada -e ada@example.com -p secret -r instructor
//!
//! # Enroll in a course (requires LEARNHUB_ACCESS_TOKEN)
//! learnhub enroll 0b54b945-dfd1-48a8-a982-b40356ba1c49
//! ```
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL` - Backend project URL
//! - `SUPABASE_ANON_KEY` - Public API key
//! - `LEARNHUB_ACCESS_TOKEN` - Optional stored session token

#![cfg_attr(not(test), forbid(unsafe_code))]
// Terminal output is the product here.
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use uuid::Uuid;

use learnhub_client::{AppConfig, AppState};
use learnhub_core::{CourseId, Role};

mod commands;

#[derive(Parser)]
#[command(name = "learnhub")]
#[command(author, version, about = "LearnHub e-learning CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the course catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Manage the account and session
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Enroll the signed-in user in a course
    Enroll {
        /// Course id
        course_id: Uuid,
    },
    /// List the signed-in user's enrollments with progress
    Enrollments,
    /// Read or write course reviews
    Reviews {
        #[command(subcommand)]
        action: ReviewAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List published courses
    List,
    /// Show one course with its lessons
    Show {
        /// Course id
        course_id: Uuid,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Sign in with an email or username
    Login {
        /// Email address or username
        #[arg(short, long)]
        identifier: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Register a new account
    Register {
        /// Username
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,

        /// Account role (`student` or `instructor`)
        #[arg(short, long, default_value = "student")]
        role: String,
    },
    /// Show the current session's profile
    Whoami,
}

#[derive(Subcommand)]
enum ReviewAction {
    /// List a course's reviews, newest first
    List {
        /// Course id
        course_id: Uuid,
    },
    /// Submit a review for a course
    Add {
        /// Course id
        course_id: Uuid,

        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: u8,

        /// Review text
        #[arg(short, long, default_value = "")]
        comment: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let state = AppState::new(config);

    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::List => commands::catalog::list(&state).await?,
            CatalogAction::Show { course_id } => {
                commands::catalog::show(&state, CourseId::new(course_id)).await?;
            }
        },
        Commands::Account { action } => match action {
            AccountAction::Login {
                identifier,
                password,
            } => commands::account::login(&state, &identifier, &password).await?,
            AccountAction::Register {
                username,
                email,
                password,
                role,
            } => {
                let role = Role::parse_lenient(&role);
                commands::account::register(&state, &username, &email, &password, role).await?;
            }
            AccountAction::Whoami => commands::account::whoami(&state).await?,
        },
        Commands::Enroll { course_id } => {
            commands::account::enroll(&state, CourseId::new(course_id)).await?;
        }
        Commands::Enrollments => commands::account::enrollments(&state).await?,
        Commands::Reviews { action } => match action {
            ReviewAction::List { course_id } => {
                commands::reviews::list(&state, CourseId::new(course_id)).await?;
            }
            ReviewAction::Add {
                course_id,
                rating,
                comment,
            } => {
                commands::reviews::add(&state, CourseId::new(course_id), rating, &comment).await?;
            }
        },
    }
    Ok(())
}
