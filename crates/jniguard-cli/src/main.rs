//! Jniguard CLI - Command-line interface for the Jniguard native buffer tracer
//!
//! Traces variables from Java or C/C++ code into unsafe buffer operations,
//! following JNI `native` methods into their C/C++ implementations.

mod commands;
mod extract;
mod logging;
mod output;

use std::path::PathBuf;

use clap::Parser;
use commands::Commands;
use logging::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "jniguard",
    author,
    version,
    about = "Interprocedural buffer-misuse tracer for C/C++ and JNI-bridged Java code",
    long_about = "Jniguard links per-variable slice profiles of Java and C/C++ sources into one\n\
                  dependency graph and reports every path from an origin variable to an unsafe\n\
                  library call or buffer write.\n\n\
                  Configure logging with --log-level and --log-file options, or the\n\
                  JNIGUARD_LOG filter variable."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_enum, default_value = "warn", help = "Set the log level")]
    pub log_level: LogLevel,

    #[arg(
        long,
        global = true,
        help = "Write logs to the specified file, or to jniguard.log in a directory"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Output logs in JSON format")]
    pub log_json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init_logging(&cli);

    match cli.command {
        Commands::Scan(args) => args.run(),
        Commands::Init(args) => args.run(),
    }
}
