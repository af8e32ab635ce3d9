use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cardiobot-cli", version, about = "CardioBot CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a pressure pair against stored thresholds
    Classify {
        systolic: u16,
        diastolic: u16,
        /// Use this user's stored thresholds instead of the defaults
        #[arg(long)]
        user: Option<String>,
    },
    /// User settings management
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Drive the measurement conversation locally against an in-memory archive
    Simulate,
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Classify {
            systolic,
            diastolic,
            user,
        } => commands::classify::run(systolic, diastolic, user),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Simulate => commands::simulate::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
