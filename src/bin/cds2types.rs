use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use cds2types::compiler::compiler_for;
use cds2types::formatter::{CommandFormatter, Formatter, NoopFormatter};
use cds2types::writer::{dump_json, json_dump_path, write_output};
use cds2types::{generate_typescript_from_path, CdsError, GeneratorOptions};

/// Convert a CDS model to TypeScript interfaces and enumerations.
#[derive(Parser, Debug)]
#[command(name = "cds2types", author, version, about)]
struct Cli {
    /// CDS model file, or a compiled schema ending in `.json`
    #[arg(short, long, value_name = "FILE")]
    cds: PathBuf,

    /// Existing directory that receives one `.ts` file per namespace
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,

    /// Interface prefix for entities, structured types and action parameters
    #[arg(short, long)]
    prefix: Option<String>,

    /// Also write the compiled schema to `<output>.json`
    #[arg(short, long)]
    json: bool,

    /// Format generated files with the formatter command
    #[arg(short, long)]
    format: bool,

    /// Sort namespaces and definitions by name
    #[arg(short, long)]
    sort: bool,

    /// Debug logging and detailed error output
    #[arg(short, long)]
    debug: bool,

    /// Informational logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON file with generator options; flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Formatter program and arguments, whitespace separated
    #[arg(long, value_name = "CMD")]
    formatter_command: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Unable to write types: {err}");
            if !cli.debug {
                eprintln!("Use the debug flag (-d, --debug) for detailed logging.");
            } else {
                log::debug!("{:?}", err);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn options_from(cli: &Cli) -> Result<GeneratorOptions, CdsError> {
    let mut options = match &cli.config {
        Some(path) => GeneratorOptions::from_file(path)?,
        None => GeneratorOptions::default(),
    };
    if let Some(prefix) = &cli.prefix {
        options.prefix = prefix.clone();
    }
    if let Some(command) = &cli.formatter_command {
        options.formatter_command = command.split_whitespace().map(str::to_string).collect();
    }
    options.sort |= cli.sort;
    options.format |= cli.format;
    options.dump_json |= cli.json;
    options.validate()?;
    Ok(options)
}

fn run(cli: &Cli) -> Result<(), CdsError> {
    let options = options_from(cli)?;
    log::debug!("options: {:?}", options);

    let compiler = compiler_for(&cli.cds);
    let (schema, output) = generate_typescript_from_path(&cli.cds, compiler.as_ref(), &options)?;

    if options.dump_json {
        dump_json(&json_dump_path(&cli.output), &schema)?;
    }

    let formatter: Box<dyn Formatter> = if options.format {
        Box::new(CommandFormatter::from_command(&options.formatter_command)?)
    } else {
        Box::new(NoopFormatter)
    };

    let written = write_output(&cli.output, &output, formatter.as_ref())?;
    if !output.warnings.is_empty() {
        log::info!("{} types resolved to unknown", output.warnings.len());
    }
    for path in written {
        println!("Wrote types to '{}'", path.display());
    }
    Ok(())
}
