//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use taskdeck_core::{config, logging};

mod commands;

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(version)]
#[command(about = "Personal task list backed by a hosted Supabase project")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Sign in with email and password (password is read from stdin)
    Login {
        /// Account email
        #[arg(long, env = "TASKDECK_EMAIL")]
        email: String,
    },

    /// Create an account (password is read from stdin)
    Signup {
        /// Account email
        #[arg(long, env = "TASKDECK_EMAIL")]
        email: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Manage tasks without the full-screen UI
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Store the backend project URL and anon key
    SetBackend {
        /// Project URL, e.g. https://<project-ref>.supabase.co
        #[arg(long)]
        url: String,
        /// Public anon key of the project
        #[arg(long = "anon-key")]
        anon_key: String,
    },
}

#[derive(clap::Subcommand)]
enum TaskCommands {
    /// List tasks, newest first
    List,
    /// Add a task
    Add {
        /// Title of the new task
        #[arg(value_name = "TITLE")]
        title: String,
    },
    /// Flip a task between done and not done
    Toggle {
        /// The ID of the task
        #[arg(value_name = "TASK_ID")]
        id: String,
    },
    /// Delete a task
    Delete {
        /// The ID of the task
        #[arg(value_name = "TASK_ID")]
        id: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    // Config commands must keep working when the file itself is broken.
    let command = match cli.command {
        Some(Commands::Config { command }) => return run_config(command),
        other => other,
    };

    let config = config::Config::load().context("load config")?;
    let _log_guard = match logging::init(&config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e:#}");
            None
        }
    };

    // default to the task screen
    let Some(command) = command else {
        return commands::tui::run(&config);
    };

    match command {
        Commands::Config { command } => run_config(command),
        Commands::Login { email } => commands::auth::login(&config, &email).await,
        Commands::Signup { email } => commands::auth::signup(&config, &email).await,
        Commands::Logout => commands::auth::logout(&config).await,
        Commands::Whoami => commands::auth::whoami(&config).await,

        Commands::Tasks { command } => match command {
            TaskCommands::List => commands::tasks::list(&config).await,
            TaskCommands::Add { title } => commands::tasks::add(&config, &title).await,
            TaskCommands::Toggle { id } => commands::tasks::toggle(&config, &id).await,
            TaskCommands::Delete { id } => commands::tasks::delete(&config, &id).await,
        },
    }
}

fn run_config(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Path => commands::config::path(),
        ConfigCommands::Init => commands::config::init(),
        ConfigCommands::SetBackend { url, anon_key } => {
            commands::config::set_backend(&url, &anon_key)
        }
    }
}
