use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use fooddrive::predict::{self, DOORS_IN_ROUTE_SLIDER, ROUTES_COMPLETED_SLIDER, TIME_SPENT_SLIDER};
use fooddrive::{AppContext, Config, Dataset, PredictionForm, PredictionOutcome, PredictionRequest};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "fooddrive")]
#[command(author, version, about = "Edmonton Food Drive dashboard and donation-bag predictor")]
struct Args {
    /// Config file (default: fooddrive.toml in this or a parent directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the dashboard web server
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Predict donation bags for one route
    Predict {
        #[arg(long)]
        neighbourhood: String,

        #[arg(long)]
        stake: String,

        /// New Route Number/Name
        #[arg(long)]
        route: String,

        /// Routes completed (1-10)
        #[arg(long, default_value_t = ROUTES_COMPLETED_SLIDER.default)]
        routes_completed: i64,

        /// Time spent in minutes (10-300)
        #[arg(long, default_value_t = TIME_SPENT_SLIDER.default)]
        time_spent: i64,

        /// Doors in route (10-500)
        #[arg(long, default_value_t = DOORS_IN_ROUTE_SLIDER.default)]
        doors_in_route: i64,
    },

    /// List the neighbourhoods, stakes and routes offered by the form
    Options,

    /// Generate shell completion script
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fooddrive=info")))
        .init();

    let args = Args::parse();
    let config_path = args.config.as_deref();

    match args.command {
        Command::Serve { host, port } => {
            let mut config = load_config(config_path);
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let ctx = match AppContext::load(config) {
                Ok(ctx) => ctx,
                Err(e) => fail(&format!("Failed to load dataset: {}", e)),
            };
            if let Err(e) = fooddrive::serve::start(ctx) {
                fail(&format!("Server error: {}", e));
            }
        }

        Command::Predict {
            neighbourhood,
            stake,
            route,
            routes_completed,
            time_spent,
            doors_in_route,
        } => {
            let config = load_config(config_path);
            // Same validation path as the web form
            let form = PredictionForm {
                neighbourhood,
                stake,
                route,
                routes_completed: routes_completed.to_string(),
                time_spent: time_spent.to_string(),
                doors_in_route: doors_in_route.to_string(),
            };
            let outcome = predict::run(&config.assets.model, PredictionRequest::from_form(&form));
            match outcome {
                PredictionOutcome::Success { .. } => println!("{}", outcome.message().green()),
                PredictionOutcome::InputError { .. } => {
                    eprintln!("{}", outcome.message().yellow());
                    std::process::exit(2);
                }
                PredictionOutcome::Failure { .. } => fail(&outcome.message()),
            }
        }

        Command::Options => {
            let config = load_config(config_path);
            let dataset = match Dataset::load(&config.assets.dataset) {
                Ok(dataset) => dataset,
                Err(e) => fail(&format!("Failed to load dataset: {}", e)),
            };
            let options = &dataset.options;
            for (title, values) in [
                ("Neighbourhood", &options.neighbourhoods),
                ("Stake", &options.stakes),
                ("New Route Number/Name", &options.routes),
            ] {
                println!("{} ({})", title.bold(), values.len());
                for value in values {
                    println!("  {}", value);
                }
            }
        }

        Command::Completion { shell } => {
            clap_complete::generate(shell, &mut Args::command(), "fooddrive", &mut std::io::stdout());
        }
    }
}

fn load_config(path: Option<&Path>) -> Config {
    let loaded = match path {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    };
    match loaded {
        Ok(config) => config,
        Err(e) => fail(&format!("Failed to load config: {}", e)),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message.red());
    std::process::exit(1);
}
