use clap::Parser;
use std::path::PathBuf;

use tf2_randomiser_core::{run, RandomiserSettings};

#[derive(Debug, Parser)]
#[command(
    name = "tf2-randomiser",
    version,
    about = "Team Fortress 2 Manual world: starting inventory and goal check"
)]
struct Args {
    /// World directory (containing data/items.json) or a packed .apworld.
    #[arg(long)]
    catalog: PathBuf,

    /// Player options file. Repeat once per player; players are numbered
    /// from 1 in the order given.
    #[arg(long = "player-options", required = true)]
    player_options: Vec<PathBuf>,

    #[arg(long)]
    seed: u64,

    /// JSON object of player number to owned item names, added to the
    /// starting inventory before the goal is evaluated.
    #[arg(long)]
    owned: Option<PathBuf>,

    #[arg(long)]
    spoiler: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let settings = RandomiserSettings {
        seed: args.seed,
        catalog_path: args.catalog,
        player_option_paths: args.player_options,
        owned_items_path: args.owned,
        spoiler_path: args.spoiler,
    };

    let report = match run(settings) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
