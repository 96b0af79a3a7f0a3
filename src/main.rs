//! # Taskhub
//!
//! A terminal client for the task manager REST API. It offers a CLI for
//! one-off commands and a TUI (Terminal User Interface) for interactive use.
//!
//! ## Usage
//!
//! ### Interactive Mode (TUI)
//!
//! Run the command without arguments to launch the interactive UI:
//!
//! ```bash
//! taskhub
//! # or explicitly
//! taskhub ui
//! ```
//!
//! #### TUI Key Bindings
//!
//! **Task list**
//! *   `a`: Add task
//! *   `Enter`: Open selected task
//! *   `Space`: Toggle completion
//! *   `f`: Cycle filter (all, pending, completed, by owner for admins)
//! *   `p` / `s` / `u`: Profile, sessions, users (admins)
//! *   `L`: Logout
//! *   `q`: Quit
//!
//! **Forms**
//! *   `Tab`: Next field
//! *   `Enter`: Submit (enabled once something changed)
//! *   `Ctrl-D`: Delete the task or profile being edited
//! *   `Esc`: Back
//!
//! ### Command Line Interface (CLI)
//!
//! ```bash
//! taskhub signup --name Ana --email ana@example.com --password secret
//! taskhub login --email ana@example.com --password secret
//! taskhub tasks --filter pending
//! taskhub task add "Write report" --due 2025-12-01
//! taskhub task complete 3
//! taskhub logout
//! ```
//!
//! ## Configuration
//!
//! *   `TASKHUB_API_URL`: server base URL (default `http://localhost:3001`),
//!     or `--api-url`.
//! *   `TASKHUB_SESSION`: session file (default
//!     `~/.local/share/taskhub/session.json` on Linux).
//! *   `TASKHUB_TIMEOUT_SECS`: request timeout in seconds (default 30).
//! *   `RUST_LOG`: log filter (default `warn`). The TUI logs to
//!     `taskhub.log` next to the session file.
//!
//! A `.env` file in the working directory is read as well.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use taskhub::api::{ApiClient, TaskFilter};
use taskhub::commands::*;
use taskhub::config::{data_dir, Config};
use taskhub::error::ApiResult;
use taskhub::logging;
use taskhub::session::FileSessionStore;
use taskhub::tui::run_tui;

#[derive(Parser)]
#[command(name = "taskhub")]
#[command(about = "Terminal client for the task manager API", long_about = None)]
struct Cli {
    /// Server base URL (overrides TASKHUB_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account
    Signup {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List tasks
    Tasks {
        /// Which tasks to show
        #[arg(short, long, value_enum, default_value_t = TaskFilter::All)]
        filter: TaskFilter,
    },
    /// Manage a single task
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// List login sessions
    Sessions,
    /// Manage users (administrators)
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Manage a profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Show a task
    Show { id: i64 },
    /// Add a new task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
        /// Due date in YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
    },
    /// Edit a task
    Edit {
        id: i64,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New due date in YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
    },
    /// Mark a task as complete
    Complete {
        id: i64,
        /// Mark as pending instead
        #[arg(long)]
        undo: bool,
    },
    /// Remove a task
    Remove {
        id: i64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List all users
    List,
    /// Promote a user to administrator
    Promote { id: i64 },
    /// Delete a user
    Remove {
        id: i64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Edit a profile (your own unless --id is given)
    Edit {
        #[arg(long)]
        id: Option<i64>,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Delete your account
    Delete {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let shell_enum = match shell.as_str() {
            "bash" => Shell::Bash,
            "zsh" => Shell::Zsh,
            "fish" => Shell::Fish,
            "powershell" => Shell::PowerShell,
            "elvish" => Shell::Elvish,
            _ => {
                eprintln!("Unsupported shell: {}", shell);
                return ExitCode::FAILURE;
            }
        };
        let mut cmd = Cli::command();
        generate(shell_enum, &mut cmd, "taskhub", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    let interactive = matches!(cli.command, None | Some(Commands::Ui));
    if interactive {
        logging::init_file(&data_dir().join("taskhub.log"));
    } else {
        logging::init_stderr();
    }

    let config = Config::load(cli.api_url.clone());
    tracing::debug!(api_url = %config.api_url, session = %config.session_path.display(), "configuration loaded");
    let session = Arc::new(FileSessionStore::new(config.session_path.clone()));
    let api = match ApiClient::connect(&config, session) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if interactive {
        return match run_tui(api).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error running TUI: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    match run_command(&api, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_command(api: &ApiClient, command: Option<Commands>) -> ApiResult<()> {
    match command {
        Some(Commands::Signup { name, email, password }) => cmd_signup(api, name, email, password).await,
        Some(Commands::Login { email, password }) => cmd_login(api, email, password).await,
        Some(Commands::Logout) => cmd_logout(api).await,
        Some(Commands::Whoami) => cmd_whoami(api).await,
        Some(Commands::Tasks { filter }) => cmd_list(api, filter).await,
        Some(Commands::Task { command }) => match command {
            TaskCommands::Show { id } => cmd_show(api, id).await,
            TaskCommands::Add { title, description, due } => cmd_add(api, title, description, due).await,
            TaskCommands::Edit { id, title, description, due } => cmd_edit(api, id, title, description, due).await,
            TaskCommands::Complete { id, undo } => cmd_complete(api, id, undo).await,
            TaskCommands::Remove { id, force } => cmd_remove(api, id, force).await,
        },
        Some(Commands::Sessions) => cmd_sessions(api).await,
        Some(Commands::Users { command }) => match command {
            UserCommands::List => cmd_users_list(api).await,
            UserCommands::Promote { id } => cmd_promote(api, id).await,
            UserCommands::Remove { id, force } => cmd_profile_delete(api, Some(id), force).await,
        },
        Some(Commands::Profile { command }) => match command {
            ProfileCommands::Edit { id, name, email, password } => cmd_profile_edit(api, id, name, email, password).await,
            ProfileCommands::Delete { force } => cmd_profile_delete(api, None, force).await,
        },
        // Handled before the client is built.
        Some(Commands::Completions { .. }) | Some(Commands::Ui) | None => Ok(()),
    }
}
