use std::{
    io::{self, Write},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use colored::*;
use jiff::{Zoned, civil::Date, tz::TimeZone};

use crate::{
    config::{Backend, Config},
    dates::parse_due_date,
    models::{
        board::Board,
        store::Store,
        task::{Priority, Status},
    },
    services::{
        analytics::{compute_analytics, count_tags},
        auth::{LoginError, LoginParameters, RegisterError, RegisterParameters, login, register},
        quick_add::quick_add_task,
        quotes::{assign_variant, quote_of_the_day},
        tasks::{
            AddTaskError, AddTaskParameters, DeleteTaskError, DeleteTaskParameters,
            EditTaskError, EditTaskParameters, TaskFilter, TaskLookupError, UpdateStatusError,
            UpdateStatusParameters, add_task, delete_task, edit_task, list_tasks, update_status,
        },
    },
    session::{Session, SessionFile},
    storage::{Storage, lock::WriteLock},
};

mod config;
mod dates;
mod models;
mod services;
mod session;
mod storage;
mod ui;

#[derive(Parser)]
#[command(
    name = "taskdeck",
    about = "A personal kanban board and task tracker for your terminal"
)]
struct Cli {
    /// Directory holding the store and session files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage backend
    #[arg(long, global = true, value_enum, default_value_t = Backend::Json)]
    backend: Backend,

    /// Print debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        username: String,

        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,

        /// Password confirmation (defaults to --password)
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Log in and start a session
    Login {
        username: String,

        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// End the current session
    Logout,

    /// Show who is logged in
    Whoami,

    /// Add a new task
    Add {
        /// Task title
        title: String,

        /// Priority from 1 (lowest) to 5 (highest), or a name like "high"
        #[arg(short, long)]
        priority: Option<Priority>,

        /// Tag (e.g., "work")
        #[arg(short, long)]
        tag: Option<String>,

        /// Due date (e.g., "friday", "in 3 days", "2026-03-01")
        #[arg(short, long)]
        due: Option<String>,

        /// Estimated hours
        #[arg(short, long)]
        estimate: Option<f64>,
    },

    /// Add a task from free text (e.g., "urgent: call Ana by friday #sales")
    Quick {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Show the kanban board
    Board,

    /// List tasks, most urgent first
    List {
        /// Only tasks with this status
        #[arg(short, long)]
        status: Option<Status>,

        /// Only tasks with this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Only tasks with this priority
        #[arg(short, long)]
        priority: Option<Priority>,

        /// Only overdue tasks
        #[arg(long)]
        overdue: bool,
    },

    /// Move a task to another status ("to do", "in progress", "done")
    Move {
        task_number_or_fuzzy_name: String,
        status: Status,
    },

    /// Start working on a task
    Start { task_number_or_fuzzy_name: String },

    /// Complete a task
    Done { task_number_or_fuzzy_name: String },

    /// Change fields of a task
    Edit {
        task_number_or_fuzzy_name: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New priority
        #[arg(short, long)]
        priority: Option<Priority>,

        /// New tag
        #[arg(short, long, conflicts_with = "clear_tag")]
        tag: Option<String>,

        /// New due date
        #[arg(short, long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Estimated hours
        #[arg(short, long)]
        estimate: Option<f64>,

        /// Hours actually spent
        #[arg(short, long)]
        actual: Option<f64>,

        /// Remove the tag
        #[arg(long)]
        clear_tag: bool,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },

    /// Delete a task
    Delete { task_number_or_fuzzy_name: String },

    /// Show statistics for your board
    Stats {
        /// Days covered by the completions chart
        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u16).range(1..=90))]
        days: u16,
    },

    /// List tags with task counts
    Tags,

    /// Show the quote of the day
    Quote,
}

impl Commands {
    /// Commands that write the store and must hold the write lock
    fn is_mutating(&self) -> bool {
        matches!(
            self,
            Commands::Register { .. }
                | Commands::Add { .. }
                | Commands::Quick { .. }
                | Commands::Move { .. }
                | Commands::Start { .. }
                | Commands::Done { .. }
                | Commands::Edit { .. }
                | Commands::Delete { .. }
        )
    }
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = Config::resolve(cli.data_dir, cli.backend);

    // Create data directory if it doesn't exist
    std::fs::create_dir_all(config.data_dir()).unwrap_or_else(|e| {
        eprintln!("Error: Failed to create data directory: {}", e);
        std::process::exit(1);
    });

    let command = cli.command.unwrap_or(Commands::Board);

    let _lock = if command.is_mutating() {
        match WriteLock::acquire(&config.lock_path()) {
            Ok(lock) => Some(lock),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    let storage = config.open_storage();
    let sessions = SessionFile::new(config.session_path());

    let mut store = match storage.load() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: Failed to load store: {}", e);
            std::process::exit(1);
        }
    };

    let today = Zoned::now().date();

    match command {
        Commands::Register {
            username,
            password,
            confirm,
        } => {
            let (password, confirm_password) = match password {
                Some(password) => {
                    let confirm = confirm.unwrap_or_else(|| password.clone());
                    (password, confirm)
                }
                None => (prompt("Password: "), prompt("Confirm password: ")),
            };

            let params = RegisterParameters {
                username,
                password,
                confirm_password,
            };

            match register(&mut store, &storage, params) {
                Ok(user) => {
                    println!("✓ User registered: {}", user.username);
                    println!("  Log in with: taskdeck login {}", user.username);
                }
                Err(RegisterError::UserAlreadyExists(name)) => {
                    eprintln!("Error: User '{}' already exists", name);
                    eprintln!("\nLog in instead: taskdeck login {}", name);
                    std::process::exit(1);
                }
                Err(RegisterError::Storage(e)) => {
                    eprintln!("Error: Failed to save user: {}", e);
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Login { username, password } => {
            let password = password.unwrap_or_else(|| prompt("Password: "));
            let params = LoginParameters { username, password };

            match login(&store, params) {
                Ok(user) => {
                    let session = Session {
                        username: user.username.clone(),
                        started_at: jiff::Timestamp::now(),
                    };
                    if let Err(e) = sessions.save(&session) {
                        eprintln!("Error: Failed to start session: {}", e);
                        std::process::exit(1);
                    }
                    println!("✓ Logged in as {}", user.username.bold());
                }
                Err(LoginError::UnknownUser(name)) => {
                    eprintln!("Error: User '{}' not found", name);
                    eprintln!("\nCreate an account first: taskdeck register {}", name);
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Logout => match sessions.clear() {
            Ok(true) => println!("✓ Logged out"),
            Ok(false) => println!("Not logged in"),
            Err(e) => {
                eprintln!("Error: Failed to end session: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Whoami => {
            let username = require_user(&store, &sessions);
            let board_size = store.board(&username).map_or(0, |b| b.tasks.len());
            println!(
                "{} {}",
                username.bold(),
                format!(
                    "({} {})",
                    board_size,
                    if board_size == 1 { "task" } else { "tasks" }
                )
                .dimmed()
            );
        }
        Commands::Add {
            title,
            priority,
            tag,
            due,
            estimate,
        } => {
            let username = require_user(&store, &sessions);
            let due_date = due.map(|input| parse_due_date_or_exit(&input, today));

            let params = AddTaskParameters {
                title,
                priority: priority.unwrap_or_default(),
                tag,
                due_date,
                estimated_hours: estimate,
            };

            match add_task(&mut store, &storage, &username, params) {
                Ok(task) => {
                    println!("✓ Task added: {}", task.title);
                    println!("  #{} · {}", task.task_number, task.priority);
                }
                Err(e) => exit_with_add_error(e),
            }
        }
        Commands::Quick { text } => {
            let username = require_user(&store, &sessions);

            match quick_add_task(&mut store, &storage, &username, &text.join(" "), today) {
                Ok(task) => {
                    println!("✓ Task added: {}", task.title);
                    let mut details = vec![format!("#{}", task.task_number), task.priority.to_string()];
                    if let Some(tag) = &task.tag {
                        details.push(format!("#{}", tag));
                    }
                    if let Some(due) = task.due_date {
                        details.push(format!("due {}", due));
                    }
                    println!("  {}", details.join(" · "));
                }
                Err(e) => exit_with_add_error(e),
            }
        }
        Commands::Board => {
            let username = require_user(&store, &sessions);
            let empty = Board::default();
            let board = store.board(&username).unwrap_or(&empty);

            let variant = assign_variant(&username);
            println!();
            ui::render_quote(&quote_of_the_day(variant, today), variant);
            ui::render_board(board, today);
        }
        Commands::List {
            status,
            tag,
            priority,
            overdue,
        } => {
            let username = require_user(&store, &sessions);
            let empty = Board::default();
            let board = store.board(&username).unwrap_or(&empty);

            let filter = TaskFilter {
                status,
                tag,
                priority,
                overdue_on: overdue.then_some(today),
            };
            let tasks = list_tasks(board, &filter);

            if tasks.is_empty() {
                println!("No tasks found");
            } else {
                ui::render_view_header("Tasks", tasks.len());
                for task in tasks {
                    ui::render_task_line(task, today);
                }
                println!();
            }
        }
        Commands::Move {
            task_number_or_fuzzy_name,
            status,
        } => {
            let username = require_user(&store, &sessions);
            change_status(
                &mut store,
                &storage,
                &username,
                task_number_or_fuzzy_name,
                status,
            );
        }
        Commands::Start {
            task_number_or_fuzzy_name,
        } => {
            let username = require_user(&store, &sessions);
            change_status(
                &mut store,
                &storage,
                &username,
                task_number_or_fuzzy_name,
                Status::InProgress,
            );
        }
        Commands::Done {
            task_number_or_fuzzy_name,
        } => {
            let username = require_user(&store, &sessions);
            change_status(
                &mut store,
                &storage,
                &username,
                task_number_or_fuzzy_name,
                Status::Done,
            );
        }
        Commands::Edit {
            task_number_or_fuzzy_name,
            title,
            priority,
            tag,
            due,
            estimate,
            actual,
            clear_tag,
            clear_due,
        } => {
            let username = require_user(&store, &sessions);

            let tag = if clear_tag { Some(None) } else { tag.map(Some) };
            let due_date = if clear_due {
                Some(None)
            } else {
                due.map(|input| Some(parse_due_date_or_exit(&input, today)))
            };

            let params = EditTaskParameters {
                task_number_or_fuzzy_name,
                title,
                priority,
                tag,
                due_date,
                estimated_hours: estimate,
                actual_hours: actual,
            };

            match edit_task(&mut store, &storage, &username, params) {
                Ok(task) => {
                    println!("✓ Task updated: {}", task.title);
                    println!("  #{}", task.task_number);
                }
                Err(EditTaskError::Lookup(e)) => exit_with_lookup_error(e),
                Err(EditTaskError::NothingToChange) => {
                    eprintln!("Error: Nothing to change");
                    eprintln!(
                        "\nPass at least one of --title, --priority, --tag, --due, --estimate, --actual, --clear-tag, --clear-due"
                    );
                    std::process::exit(1);
                }
                Err(EditTaskError::DuplicateTask {
                    title,
                    priority,
                    task_number,
                }) => {
                    eprintln!(
                        "Error: Task '{}' with priority {} already exists (#{})",
                        title, priority, task_number
                    );
                    std::process::exit(1);
                }
                Err(EditTaskError::Storage(e)) => {
                    eprintln!("Error: Failed to save task: {}", e);
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Delete {
            task_number_or_fuzzy_name,
        } => {
            let username = require_user(&store, &sessions);
            let params = DeleteTaskParameters {
                task_number_or_fuzzy_name,
            };

            match delete_task(&mut store, &storage, &username, params) {
                Ok(task) => {
                    println!("✓ Task deleted: {}", task.title);
                    println!("  #{}", task.task_number);
                }
                Err(DeleteTaskError::Lookup(e)) => exit_with_lookup_error(e),
                Err(DeleteTaskError::Storage(e)) => {
                    eprintln!("Error: Failed to delete task: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Stats { days } => {
            let username = require_user(&store, &sessions);
            let tasks = store
                .board(&username)
                .map(|b| b.tasks.as_slice())
                .unwrap_or_default();

            let analytics = compute_analytics(tasks, today, &TimeZone::system(), days);
            ui::render_analytics(&analytics);
        }
        Commands::Tags => {
            let username = require_user(&store, &sessions);
            let tasks = store
                .board(&username)
                .map(|b| b.tasks.as_slice())
                .unwrap_or_default();
            let tags = count_tags(tasks);

            if tags.counts.is_empty() {
                println!("No tags found");
            } else {
                println!(
                    "{} ({} {})\n",
                    "TAGS".cyan(),
                    tags.counts.len(),
                    if tags.counts.len() == 1 { "tag" } else { "tags" }
                );

                for (tag, count) in &tags.counts {
                    println!(
                        "  {} {} {}",
                        "•".green(),
                        format!("#{}", tag).bold(),
                        format!("({} {})", count, if *count == 1 { "task" } else { "tasks" })
                            .dimmed()
                    );
                }
                if tags.untagged > 0 {
                    println!(
                        "  {} {}",
                        "•".dimmed(),
                        format!("{} untagged", tags.untagged).dimmed()
                    );
                }
            }
        }
        Commands::Quote => {
            let username = require_user(&store, &sessions);
            let variant = assign_variant(&username);
            ui::render_quote(&quote_of_the_day(variant, today), variant);
        }
    }
}

/// Resolves the logged in user or exits with a hint
fn require_user(store: &Store, sessions: &SessionFile) -> String {
    let session = match sessions.load() {
        Ok(Some(session)) => session,
        Ok(None) => {
            eprintln!("Error: Not logged in");
            eprintln!("\nLog in with: taskdeck login <username>");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("\nRun `taskdeck logout` and log in again.");
            std::process::exit(1);
        }
    };

    if store.find_user(&session.username).is_none() {
        log::warn!(
            "Session user {} no longer exists, clearing session",
            session.username
        );
        if let Err(e) = sessions.clear() {
            log::warn!("Failed to clear stale session: {}", e);
        }
        eprintln!("Error: Not logged in");
        eprintln!("\nLog in with: taskdeck login <username>");
        std::process::exit(1);
    }

    session.username
}

/// Reads one line from stdin after printing `label`
fn prompt(label: &str) -> String {
    print!("{}", label);
    if let Err(e) = io::stdout().flush() {
        log::debug!("Failed to flush prompt: {}", e);
    }

    let mut input = String::new();
    if let Err(e) = io::stdin().read_line(&mut input) {
        eprintln!("Error: Failed to read input: {}", e);
        std::process::exit(1);
    }
    input.trim_end_matches(['\r', '\n']).to_string()
}

fn parse_due_date_or_exit(input: &str, today: Date) -> Date {
    match parse_due_date(input, today) {
        Ok(date) => date,
        Err(e) => {
            eprintln!("Error: Invalid due date: {}", e);
            eprintln!(
                "\nExpected format: YYYY-MM-DD (e.g., 2026-03-01) or relative dates like 'friday', 'next monday', 'in 3 days'"
            );
            std::process::exit(1);
        }
    }
}

fn change_status(
    store: &mut Store,
    storage: &impl Storage,
    username: &str,
    task_number_or_fuzzy_name: String,
    status: Status,
) {
    let params = UpdateStatusParameters {
        task_number_or_fuzzy_name,
        status,
    };

    match update_status(store, storage, username, params) {
        Ok(result) if result.previous_status == result.task.status => {
            println!(
                "Task #{} is already {}: {}",
                result.task.task_number, result.task.status, result.task.title
            );
        }
        Ok(result) => {
            let verb = if result.task.status == Status::Done {
                "completed"
            } else {
                "moved"
            };
            println!("✓ Task {}: {}", verb, result.task.title);
            println!(
                "  #{} {} → {}",
                result.task.task_number,
                result.previous_status.to_string().dimmed(),
                result.task.status.to_string().bold()
            );
        }
        Err(UpdateStatusError::Lookup(e)) => exit_with_lookup_error(e),
        Err(UpdateStatusError::Storage(e)) => {
            eprintln!("Error: Failed to save task: {}", e);
            std::process::exit(1);
        }
    }
}

fn exit_with_add_error(error: AddTaskError) -> ! {
    match error {
        AddTaskError::DuplicateTask {
            title,
            priority,
            task_number,
        } => {
            eprintln!(
                "Error: Task '{}' with priority {} already exists (#{})",
                title, priority, task_number
            );
            eprintln!("\nUse a different title or priority, or edit the existing task.");
        }
        AddTaskError::Storage(e) => eprintln!("Error: Failed to save task: {}", e),
        e => eprintln!("Error: {}", e),
    }
    std::process::exit(1);
}

fn exit_with_lookup_error(error: TaskLookupError) -> ! {
    match error {
        TaskLookupError::TaskNotFound(identifier) => {
            eprintln!("Error: Task '{}' not found", identifier);
        }
        TaskLookupError::AmbiguousTaskName(titles) => {
            eprintln!("Error: Task name is ambiguous. Multiple tasks found:");
            for title in titles {
                eprintln!("  - {}", title);
            }
            eprintln!("\nPlease be more specific or use the task number.");
        }
    }
    std::process::exit(1);
}
