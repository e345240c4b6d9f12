use std::io::{self, IsTerminal};
use std::path::Path;

use clap::{ColorChoice, CommandFactory, Parser};
use clap_complete::generate;
use tmxconv_cli::{
    cli::{Cli, Command, LogFormatArg},
    commands::{run_csv2tmx, run_tmx2csv, run_validate},
    config::Config,
    logging::{LogConfig, LogFormat, init_logging},
    report::{ColorMode, print_json, print_summary},
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    init_logging(&log_config_from_cli(&cli));

    if let Command::Completions { shell } = &cli.command {
        generate(*shell, &mut Cli::command(), "tmxconv", &mut io::stdout());
        return;
    }

    let config = match Config::discover(cli.config.as_deref(), Path::new(".")) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    };

    let result = match &cli.command {
        Command::Csv2Tmx(args) => run_csv2tmx(args, &config),
        Command::Tmx2Csv(args) => run_tmx2csv(args, &config),
        Command::Validate(args) => run_validate(args, &config),
        Command::Completions { .. } => return,
    };

    let exit_code = match result {
        Ok(summary) => {
            if cli.json {
                if let Err(error) = print_json(&summary) {
                    eprintln!("error: {error}");
                    std::process::exit(1);
                }
            } else {
                print_summary(&summary, color_mode(cli.color.color));
            }
            summary.exit_code()
        }
        Err(error) => {
            eprintln!("error: {error}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn color_mode(choice: ColorChoice) -> ColorMode {
    match choice {
        ColorChoice::Always => ColorMode {
            stdout: true,
            stderr: true,
        },
        ColorChoice::Never => ColorMode::default(),
        ColorChoice::Auto => ColorMode {
            stdout: io::stdout().is_terminal(),
            stderr: io::stderr().is_terminal(),
        },
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig::default()
        .with_level_filter(cli.verbosity.tracing_level_filter())
        .with_format(match cli.log_format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        });
    config.use_env_filter = !cli.verbosity.is_present();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => io::stderr().is_terminal(),
    };
    config
}
