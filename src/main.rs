use std::process::ExitCode;

use canopy::cli::{Cli, EXIT_ERROR, PromptSelector, split_event_log_flag};
use canopy::cmux::CmuxBackendFactory;
use canopy::config;
use canopy::event_log::{EventLogger, FileEventLogger, NullEventLogger};
use canopy::service::SessionService;

fn main() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().skip(1).collect();
    let (args, event_log_path) = match split_event_log_flag(raw_args) {
        Ok(split) => split,
        Err(message) => {
            eprintln!("canopy: {message}");
            return ExitCode::from(EXIT_ERROR as u8);
        }
    };

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(error) => {
            eprintln!("canopy: get working dir: {error}");
            return ExitCode::from(EXIT_ERROR as u8);
        }
    };

    let config = match config::load() {
        Ok(loaded) => loaded.config,
        Err(message) => {
            eprintln!("canopy: {message}; using defaults");
            config::CanopyConfig::default()
        }
    };

    let logger: Box<dyn EventLogger> = match event_log_path {
        Some(path) => match FileEventLogger::open(&path) {
            Ok(logger) => Box::new(logger),
            Err(error) => {
                eprintln!("canopy: open event log {}: {error}", path.display());
                Box::new(NullEventLogger)
            }
        },
        None => Box::new(NullEventLogger),
    };

    let service = SessionService::new(CmuxBackendFactory::new(config));
    let selector = PromptSelector;
    let mut out = std::io::stdout();
    let mut err = std::io::stderr();
    let code = {
        let mut cli = Cli {
            service: &service,
            selector: Some(&selector),
            logger: logger.as_ref(),
            cwd,
            out: &mut out,
            err: &mut err,
        };
        cli.run(&args)
    };
    ExitCode::from(code.clamp(0, 255) as u8)
}
