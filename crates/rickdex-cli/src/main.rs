// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use rickdex_api::{CharacterSource, Client};
use rickdex_app::{AppState, Location};
use runtime::ApiRuntime;
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let location = Location::parse(options.location.as_deref().unwrap_or_default());
    if options.print_location {
        println!("{}", location.href());
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `rickdex --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let client = Client::new(&config.api_url(), config.api_timeout()?).with_context(|| {
        format!(
            "invalid [api] config in {}; fix url/timeout values or unset RICKDEX_API_URL",
            options.config_path.display()
        )
    })?;
    let ui_options = config.ui_options()?;
    if options.check_only {
        return Ok(());
    }

    let log_path = logging::init(&config)?;
    tracing::info!(
        log = %log_path.display(),
        endpoint = client.endpoint(),
        timeout = ?client.timeout(),
        location = %location.href(),
        "starting rickdex"
    );

    let mut state = AppState::with_location(location);
    let mut runtime = ApiRuntime::new(CharacterSource::new(client));
    rickdex_tui::run_app(&mut state, &mut runtime, ui_options)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    location: Option<String>,
    print_location: bool,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        location: None,
        print_location: false,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--location" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--location requires a query such as \"?page=2&status=Alive\"")
                })?;
                options.location = Some(value.as_ref().to_owned());
            }
            "--print-location" => {
                options.print_location = true;
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("rickdex: browse Rick and Morty characters in the terminal");
    println!("  --config <path>          Use a specific config path");
    println!("  --location <query>       Start at a location, e.g. \"?page=2&status=Alive\"");
    println!("  --print-location         Print the normalized start location");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config and API settings, then exit");
    println!("  --help                   Show this help");
}
