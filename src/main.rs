//! # diag-e
//!
//! `diag-e` indexes compiler diagnostics (`path:line[:col]: message`) and shows them
//! next to the current contents of the files they refer to.
//!
//! ```sh
//! go build -gcflags=-m ./... 2>&1 | diag-e view ./main.go --format text
//! ```

use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use diag_e::e_batch::render_all;
use diag_e::e_cli::{Command, OutputArgs};
use diag_e::e_config::Settings;
use diag_e::e_render::{self, Format, Highlighter, TextOptions};
use diag_e::{AnnotationIndex, Cli, IndexOptions, MergedView, ViewError};

/// Exit status when the requested path is not in the index.
const EXIT_NOT_FOUND: u8 = 2;

pub fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let cli = Cli::parse();
    if cli.version {
        diag_e::e_features::print_version_and_features();
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let cwd = env::current_dir().context("cannot determine the current directory")?;
    let settings = Settings::discover(cli.config.as_deref(), &cwd)?;

    let base_dir = cli
        .dir
        .clone()
        .or_else(|| settings.base_dir.clone())
        .map(|dir| cwd.join(dir))
        .unwrap_or_else(|| cwd.clone());
    let fold_case = cli.fold_case.unwrap_or(settings.fold_case);
    let options = IndexOptions::new(base_dir).with_path_policy(fold_case.policy());

    let index = match cli.log.as_deref() {
        Some(path) if path != Path::new("-") => AnnotationIndex::from_path(path, options)
            .with_context(|| format!("failed to read diagnostic log {}", path.display()))?,
        _ => AnnotationIndex::from_reader(io::stdin().lock(), options)
            .context("failed to read diagnostic log from stdin")?,
    };
    log::debug!("index options: {:?}", index.options());

    let mut out = io::stdout().lock();
    match cli.command.unwrap_or(Command::List { json: false }) {
        Command::List { json } => {
            let listing = e_render::render_file_list(&index, json)?;
            if json {
                writeln!(out, "{}", listing)?;
            } else {
                write!(out, "{}", listing)?;
            }
        }
        Command::Stats => {
            writeln!(out, "{}", serde_json::to_string(&index.stats())?)?;
        }
        Command::View { path, output } => {
            let render = renderer(&output, &settings)?;
            match index.merged_view(&path) {
                Ok(view) => write!(out, "{}", render(&view)?)?,
                Err(e @ ViewError::NotFound { .. }) => {
                    eprintln!("error: {}", e);
                    return Ok(ExitCode::from(EXIT_NOT_FOUND));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Dump { jobs, output } => {
            let jobs = jobs
                .or(settings.jobs)
                .unwrap_or_else(|| std::thread::available_parallelism().map_or(4, |n| n.get()));
            let render = renderer(&output, &settings)?;
            let report = render_all(Arc::new(index), jobs, render);
            for item in &report.items {
                match &item.output {
                    Ok(text) => write!(out, "{}", text)?,
                    Err(e) => eprintln!("error: {}: {:#}", item.path, e),
                }
            }
            if report.failures() > 0 {
                eprintln!(
                    "{} of {} files could not be shown",
                    report.failures(),
                    report.items.len()
                );
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    out.flush()?;
    Ok(ExitCode::SUCCESS)
}

type Renderer = Box<dyn Fn(&MergedView<'_>) -> Result<String> + Send + Sync>;

/// Builds the per-view renderer; every rendered view ends with a newline.
fn renderer(output: &OutputArgs, settings: &Settings) -> Result<Renderer> {
    match output.format {
        Format::Json => {
            let pretty = output.pretty;
            Ok(Box::new(move |view| {
                let mut json = e_render::render_json(view, pretty)?;
                json.push('\n');
                Ok(json)
            }))
        }
        Format::Text => {
            let highlighter = Highlighter::new(&settings.highlight_rules())?;
            let options = TextOptions {
                color: output.color.enabled(),
                only_annotated: output.only_annotated,
            };
            Ok(Box::new(move |view| {
                Ok(e_render::render_text(view, &highlighter, options))
            }))
        }
    }
}
