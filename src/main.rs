mod cli;

use cli::{CliConfig, CliError};
use indicatif::ProgressBar;
use meshdedupe_core::{
    apply, plan, print_outcome, print_plan, print_scan_start, print_status, progress,
    DedupeConfig, DedupeError,
};
use std::error::Error;
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = CliConfig::from_env().unwrap_or_else(|err| match err {
        CliError::Help | CliError::Version => {
            println!("{}", err);
            process::exit(0);
        }
        _ => {
            eprintln!("{}", err);
            process::exit(1);
        }
    });

    if let Err(error) = run(config) {
        eprintln!("Error: {}", error);
        process::exit(1);
    }
}

fn run(cli: CliConfig) -> Result<(), Box<dyn Error>> {
    // Checked before looking for a config file inside the root.
    if !cli.root.exists() {
        return Err(DedupeError::InvalidRoot(cli.root).into());
    }
    let config = DedupeConfig::load_or_default(&cli.root)?;
    log::debug!("running with {:?}", config);

    print_scan_start(&config.mesh_path());
    let progress_bar = phase_bar();
    let plan = plan(&config, &progress_bar)?;
    progress_bar.finish_and_clear();
    print_plan(&plan);
    if plan.is_empty() {
        return Ok(());
    }

    let progress_bar = phase_bar();
    let result = apply(&config, plan, &progress_bar, &mut |event| {
        progress_bar.suspend(|| print_status(&event))
    });
    progress_bar.finish_and_clear();
    print_outcome(&result?);
    Ok(())
}

fn phase_bar() -> ProgressBar {
    let progress_bar = ProgressBar::new(0);
    progress_bar.set_style(progress::default_style());
    progress_bar
}
