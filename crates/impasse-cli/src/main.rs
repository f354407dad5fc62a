//! Impasse CLI: barrier tables, derivative checks, settings validation
//! and impact dump inspection.

use clap::{Parser, Subcommand, ValueEnum};
use impasse_contact::BarrierType;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "impasse")]
#[command(version, about = "Impasse: barrier potentials and contact constraints for rigid bodies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Barrier family as accepted on the command line.
#[derive(Clone, Copy, ValueEnum)]
enum Family {
    Ipc,
    PolyLog,
    Spline,
}

impl From<Family> for BarrierType {
    fn from(family: Family) -> Self {
        match family {
            Family::Ipc => BarrierType::Ipc,
            Family::PolyLog => BarrierType::PolyLog,
            Family::Spline => BarrierType::Spline,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Toml,
}

#[derive(Subcommand)]
enum Commands {
    /// Tabulate a barrier and its derivatives over (0, dhat].
    Barrier {
        /// Barrier family.
        #[arg(short, long, value_enum, default_value = "ipc")]
        family: Family,

        /// Activation distance.
        #[arg(short, long, default_value_t = 1.0)]
        dhat: f64,

        /// Number of sample points.
        #[arg(short, long, default_value_t = 10)]
        samples: usize,
    },

    /// Compare analytic barrier derivatives with central differences.
    CheckDerivatives {
        /// Barrier family; all families when omitted.
        #[arg(short, long, value_enum)]
        family: Option<Family>,

        /// Activation distance.
        #[arg(short, long, default_value_t = 1.0)]
        dhat: f64,
    },

    /// Validate a settings file (.json or .toml).
    Validate {
        /// Path to the settings file.
        path: String,
    },

    /// Print the default settings document.
    Defaults {
        #[arg(short, long, value_enum, default_value = "toml")]
        format: Format,
    },

    /// Inspect a zero-TOI impact dump (.json or bincode).
    Inspect {
        /// Path to the dump file.
        path: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Barrier {
            family,
            dhat,
            samples,
        } => commands::barrier_table(family.into(), dhat, samples),
        Commands::CheckDerivatives { family, dhat } => {
            let families = match family {
                Some(f) => vec![f.into()],
                None => BarrierType::ALL.to_vec(),
            };
            commands::check_derivatives(&families, dhat)
        }
        Commands::Validate { path } => commands::validate(&path),
        Commands::Defaults { format } => commands::defaults(match format {
            Format::Json => impasse_io::SettingsFormat::Json,
            Format::Toml => impasse_io::SettingsFormat::Toml,
        }),
        Commands::Inspect { path } => commands::inspect(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
