use std::process::ExitCode;
use std::sync::Arc;

use anyhow::bail;
use clap::Parser;
use engine_logging::{engine_error, engine_info, LogDestination};
use tubefetch_engine::{EngineEvent, EngineHandle, JobDispatcher, YtDlpFetcher, YtDlpResolver};

use super::args::Args;
use super::console::{Console, Printer};
use super::{controls, settings};

pub fn run_app() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let cwd = std::env::current_dir()?;
    let settings_path = settings::settings_path(&args, &cwd);
    let file = settings::load(&settings_path, args.settings.is_some())?;
    let config = settings::layer(&args, file, &cwd)?;

    let destination = if args.verbose {
        LogDestination::Both(config.log_file.clone())
    } else {
        LogDestination::File(config.log_file.clone())
    };
    engine_logging::initialize(destination, config.level);
    engine_info!("tubefetch starting with {:?}", config);

    if args.save_settings {
        settings::save(&settings_path, &config.effective)?;
    }
    if !config.input.is_file() {
        bail!("Input table {} does not exist", config.input.display());
    }

    let dispatcher = JobDispatcher::new(
        Arc::new(YtDlpResolver::default()),
        Arc::new(YtDlpFetcher::default()),
        config.dispatch.clone(),
    );
    let handle = EngineHandle::start(dispatcher, config.job());
    eprintln!("{}", controls::HELP);
    controls::spawn_reader(handle.token().clone());

    let mut console = Console::new();
    let mut printer = Printer::default();
    let result = loop {
        match handle.recv() {
            Some(EngineEvent::Job(event)) => {
                if let Some(output) = console.apply(&event) {
                    printer.print(output);
                }
            }
            Some(EngineEvent::Finished(result)) => break result,
            None => bail!("engine stopped without reporting a result"),
        }
    };

    for output in console.finish(&result) {
        printer.print(output);
    }
    match result {
        Ok(summary) => {
            engine_info!("finished: {:?}", summary);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            engine_error!("finished with error: {}", err);
            Ok(ExitCode::FAILURE)
        }
    }
}
