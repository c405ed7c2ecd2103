mod config;
mod error;
mod file_io;
mod label;
mod logging;
mod prompt;
mod session;
mod settings;

#[allow(unused_imports)]
use log::{Level, trace, debug, info, warn, error};

use std::path::PathBuf;
use std::process::ExitCode;
use clap::Parser;

use crate::config::APP_NAME;
use crate::error::AnnotatorError;
use crate::prompt::{Prompt, PromptOptions, RunOutcome};
use crate::session::{AnnotationSession, InputSource};
use crate::settings::UserSettings;

/// Label Set card images with their number, color, shape and shading
#[derive(Parser, Debug)]
#[command(name = "setcard-annotator")]
#[command(version)]
struct Args {
    /// Directory of card images, or a list of image files
    #[arg(required_unless_present = "init_settings")]
    input: Vec<PathBuf>,

    /// Directory for the JSON annotations [default: <INPUT>/labels]
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Settings file to use instead of the per-user one
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Open each image in the system image viewer
    #[arg(long)]
    open: bool,

    /// Write a settings file with the default values and exit
    #[arg(long)]
    init_settings: bool,
}

impl Args {
    /// A single directory is scanned; anything else is an explicit file list
    fn input_source(&self) -> InputSource {
        match self.input.as_slice() {
            [path] if file_io::is_directory(path) => InputSource::Directory(path.clone()),
            paths => InputSource::Files(paths.to_vec()),
        }
    }
}

fn run(args: &Args, settings: &UserSettings) -> Result<RunOutcome, AnnotatorError> {
    let input = args.input_source();
    debug!("Input: {:?}", input);

    let mut session = AnnotationSession::with_output_subdir(
        input,
        args.output_dir.clone(),
        &settings.output_subdir,
    )?;
    info!(
        "Saving annotations to {} ({} pending)",
        session.output_dir().display(),
        session.pending().len()
    );

    let options = PromptOptions {
        open_image_viewer: args.open || settings.open_image_viewer,
        show_image_size: settings.show_image_size,
    };
    let outcome = Prompt::stdio(options).run(&mut session)?;

    if outcome == RunOutcome::Stopped {
        info!("Stopped with {}", session.progress());
    }
    info!("{} annotation(s) saved this run", session.annotations().len());
    Ok(outcome)
}

fn main() -> ExitCode {
    let shared_log_buffer = logging::setup_logger();
    logging::setup_panic_hook(APP_NAME, shared_log_buffer);

    let args = Args::parse();

    if args.init_settings {
        let path = args.settings.clone().unwrap_or_else(UserSettings::settings_path);
        return match UserSettings::default().write_template(&path) {
            Ok(()) => {
                println!("Wrote settings to {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("{}", e);
                ExitCode::FAILURE
            }
        };
    }

    let settings = UserSettings::load(args.settings.as_deref());

    match run(&args, &settings) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
