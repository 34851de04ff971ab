mod commands;
mod config;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    SettingsArgs, cmd_achievements, cmd_day, cmd_done, cmd_login, cmd_logout, cmd_profile_avatar,
    cmd_profile_set, cmd_profile_show, cmd_settings_set, cmd_settings_show, cmd_stats,
    cmd_timeline, cmd_whoami, cmd_workout_add, cmd_workout_delete, cmd_workout_edit,
    cmd_workout_list, cmd_workout_photo, cmd_workout_show, cmd_workout_video,
};
use crate::config::Config;
use reps_core::blob::FsBlobStore;
use reps_core::db::Database;
use reps_core::service::FitnessService;
use reps_core::store::SystemClock;
use reps_core::timeline::DEFAULT_TIMELINE_DAYS;

pub(crate) type Service = FitnessService<Database, SystemClock>;

#[derive(Parser)]
#[command(
    name = "reps",
    version,
    about = "A simple, local-first workout tracker",
    long_about = "\n\n  ██████╗ ███████╗██████╗ ███████╗
  ██╔══██╗██╔════╝██╔══██╗██╔════╝
  ██████╔╝█████╗  ██████╔╝███████╗
  ██╔══██╗██╔══╝  ██╔═══╝ ╚════██║
  ██║  ██║███████╗██║     ███████║
  ╚═╝  ╚═╝╚══════╝╚═╝     ╚══════╝
        show up. every day.
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in as a user; all other commands act on this user
    Login {
        /// User id
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sign out the current user
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the signed-in user
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage workouts
    Workout {
        #[command(subcommand)]
        command: WorkoutCommands,
    },
    /// Mark a workout as done now
    Done {
        /// Workout ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show streak, weekly progress, level and recent activity
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show completions per day for the last N days
    Timeline {
        /// Number of days to show
        #[arg(short, long, default_value_t = DEFAULT_TIMELINE_DAYS)]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the workouts completed on a day (defaults to today)
    Day {
        /// Day (YYYY-MM-DD or today/yesterday/tomorrow)
        day: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show all achievements and your progress toward them
    Achievements {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage goal, weekly target and reminders
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Manage your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
enum WorkoutCommands {
    /// Create a workout
    Add {
        /// Workout name
        name: String,
        /// A plan step; repeat for each step
        #[arg(short, long = "step")]
        steps: Vec<String>,
        /// Category (e.g. strength, cardio)
        #[arg(short, long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List your workouts, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a workout and its plan
    Show {
        /// Workout ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a workout's name, plan or category
    Edit {
        /// Workout ID
        id: i64,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// Replace the plan; repeat for each step
        #[arg(short, long = "step")]
        steps: Vec<String>,
        /// New category
        #[arg(short, long, conflicts_with = "clear_category")]
        category: Option<String>,
        /// Remove the category
        #[arg(long)]
        clear_category: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a workout (its completions stay in your history)
    Delete {
        /// Workout ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Attach a photo to a workout
    Photo {
        /// Workout ID
        id: i64,
        /// Image file (jpg, png, gif, webp, heic)
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Attach a demo video to a workout
    Video {
        /// Workout ID
        id: i64,
        /// Video file (mp4, mov, webm, m4v)
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show current settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update settings; unspecified values are kept
    Set {
        /// Training goal (free text)
        #[arg(long)]
        goal: Option<String>,
        /// Experience level (free text)
        #[arg(long)]
        level: Option<String>,
        /// Workouts per week (non-positive values reset to the default)
        #[arg(long, allow_hyphen_values = true)]
        weekly_target: Option<i64>,
        /// Daily reminder on or off
        #[arg(long)]
        reminders: Option<bool>,
        /// Reminder time, HH:MM 24-hour
        #[arg(long)]
        reminder_time: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show your profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set your display name (omit to clear it)
    Set {
        /// Full name
        name: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Upload a profile picture
    Avatar {
        /// Image file (jpg, png, gif, webp, heic)
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(serving: bool) {
    let default = if serving { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Commands::Serve { .. }));

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::open(&config.db_path)?;
    let service = FitnessService::new(db, SystemClock)
        .with_blob_store(FsBlobStore::new(&config.media_dir, &config.media_url()));

    match cli.command {
        Commands::Login { user, json } => cmd_login(&service, &user, json),
        Commands::Logout { json } => cmd_logout(&service, json),
        Commands::Whoami { json } => cmd_whoami(&service, json),
        Commands::Done { id, json } => cmd_done(&service, id, json),
        Commands::Stats { json } => cmd_stats(&service, json),
        Commands::Timeline { days, json } => cmd_timeline(&service, days, json),
        Commands::Day { day, json } => cmd_day(&service, day.as_deref(), json),
        Commands::Achievements { json } => cmd_achievements(&service, json),
        Commands::Workout { command } => match command {
            WorkoutCommands::Add {
                name,
                steps,
                category,
                json,
            } => cmd_workout_add(&service, &name, steps, category, json),
            WorkoutCommands::List { json } => cmd_workout_list(&service, json),
            WorkoutCommands::Show { id, json } => cmd_workout_show(&service, id, json),
            WorkoutCommands::Edit {
                id,
                name,
                steps,
                category,
                clear_category,
                json,
            } => {
                let steps = (!steps.is_empty()).then_some(steps);
                let category = if clear_category {
                    Some(None)
                } else {
                    category.map(Some)
                };
                cmd_workout_edit(&service, id, name, steps, category, json)
            }
            WorkoutCommands::Delete { id, json } => cmd_workout_delete(&service, id, json),
            WorkoutCommands::Photo { id, file, json } => {
                cmd_workout_photo(&service, id, &file, json)
            }
            WorkoutCommands::Video { id, file, json } => {
                cmd_workout_video(&service, id, &file, json)
            }
        },
        Commands::Settings { command } => match command {
            SettingsCommands::Show { json } => cmd_settings_show(&service, json),
            SettingsCommands::Set {
                goal,
                level,
                weekly_target,
                reminders,
                reminder_time,
                json,
            } => cmd_settings_set(
                &service,
                SettingsArgs {
                    goal,
                    level,
                    weekly_target,
                    reminders,
                    reminder_time,
                },
                json,
            ),
        },
        Commands::Profile { command } => match command {
            ProfileCommands::Show { json } => cmd_profile_show(&service, json),
            ProfileCommands::Set { name, json } => cmd_profile_set(&service, name, json),
            ProfileCommands::Avatar { file, json } => cmd_profile_avatar(&service, &file, json),
        },
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let (api_key, new_api_key) = if no_auth {
                (None, false)
            } else {
                let (key, new) = config.load_or_create_api_key()?;
                (Some(key), new)
            };
            server::start_server(service, port, &bind, api_key, new_api_key).await
        }
    }
}
