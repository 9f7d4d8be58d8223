use clap::Parser;
use log::{error, info};

use dataset2tsv::{process_dataset, Args};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if !args.root_path.is_dir() {
        error!(
            "The specified dataset path does not exist: {}",
            args.root_path.display()
        );
        std::process::exit(1);
    }

    info!("Starting the conversion process...");

    match process_dataset(&args) {
        Ok(stats) => {
            stats.print_summary();
            info!("Conversion process completed successfully.");
        }
        Err(e) => {
            error!("Failed to process dataset: {}", e);
            std::process::exit(1);
        }
    }
}
