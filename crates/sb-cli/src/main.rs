//! Support bundle collector.
//!
//! The `sb` entry point, handling:
//! - Selective collection of a directory into a zip bundle
//! - Dry-run listing of what a collection would include
//! - Bundle checksum verification
//! - Capped report folder pruning

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sb_cli::commands::{
    default_host, run_collect, run_list, run_prune, run_verify, CollectRequest, CommandFailure,
    VersionReport,
};
use sb_cli::config::{ConfigResolver, ConfigSource, OptionOverrides};
use sb_cli::exit_codes::ExitCode;
use sb_cli::logging::{init_logging, LogConfig};
use sb_cli::output::{render, ErrorReport, OutputFormat, Report};
use sb_collect::{run_prefix, CollectionOptions};

/// Support bundle collector - gather a directory's files into a verifiable zip
#[derive(Parser)]
#[command(name = "sb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Collection config file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect a directory into a support bundle
    Collect(CollectArgs),
    /// Show which files a collection would include, without writing
    List(ListArgs),
    /// Verify a bundle's checksums
    Verify(VerifyArgs),
    /// Delete the oldest files in a folder beyond a cap
    Prune(PruneArgs),
    /// Print version information
    Version,
}

/// Filters shared by `collect` and `list`; each overrides the config file.
#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Include patterns, comma separated (Ant-style globs)
    #[arg(long)]
    include: Option<String>,

    /// Exclude patterns, comma separated; excludes win over includes
    #[arg(long)]
    exclude: Option<String>,

    /// Match patterns case-insensitively
    #[arg(long)]
    case_insensitive: bool,

    /// Deepest directory level collected (root files are depth 0)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Per-file size cap in bytes; larger files are truncated
    #[arg(long)]
    max_file_size: Option<u64>,

    /// Only collect files whose name ends with this suffix
    #[arg(long)]
    suffix: Option<String>,
}

impl FilterArgs {
    fn overrides(&self) -> OptionOverrides {
        OptionOverrides {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            case_insensitive: self.case_insensitive,
            max_depth: self.max_depth,
            max_file_size: self.max_file_size,
            suffix: self.suffix.clone(),
        }
    }
}

/// Archive naming shared by `collect` and `list`.
#[derive(Args, Debug)]
struct PrefixArgs {
    /// Prefix for archive entry names
    #[arg(long, conflicts_with = "job")]
    prefix: Option<String>,

    /// Job full name; with --build, names entries items/<job>/builds/<n>
    #[arg(long, requires = "build")]
    job: Option<String>,

    /// Build number, used with --job
    #[arg(long, requires = "job")]
    build: Option<u64>,
}

impl PrefixArgs {
    fn prefix(&self) -> String {
        match (&self.job, self.build) {
            (Some(job), Some(build)) => run_prefix(job, build),
            _ => self.prefix.clone().unwrap_or_default(),
        }
    }
}

#[derive(Args, Debug)]
struct CollectArgs {
    /// Directory to collect
    root: PathBuf,

    /// Bundle file to write
    #[arg(long, short = 'o', default_value = "support-bundle.zip")]
    output: PathBuf,

    #[command(flatten)]
    naming: PrefixArgs,

    #[command(flatten)]
    filters: FilterArgs,

    /// Host label recorded in the manifest (default: system hostname)
    #[arg(long)]
    host: Option<String>,

    /// Free-form description recorded in the manifest
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Directory to inspect
    root: PathBuf,

    #[command(flatten)]
    naming: PrefixArgs,

    #[command(flatten)]
    filters: FilterArgs,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// Bundle file to verify
    bundle: PathBuf,
}

#[derive(Args, Debug)]
struct PruneArgs {
    /// Folder to prune (files directly inside it only)
    folder: PathBuf,

    /// Number of newest files to keep
    #[arg(long)]
    keep: usize,
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(
        LogConfig::level_from_flags(cli.global.verbose, cli.global.quiet),
        None,
    );
    init_logging(&log_config);

    let exit_code = match &cli.command {
        Commands::Collect(args) => cmd_collect(&cli.global, args),
        Commands::List(args) => cmd_list(&cli.global, args),
        Commands::Verify(args) => emit(&cli.global, "verify", run_verify(&args.bundle)),
        Commands::Prune(args) => emit(&cli.global, "prune", run_prune(&args.folder, args.keep)),
        Commands::Version => {
            println!("{}", render(&VersionReport::current(), cli.global.format));
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

/// Print a command's report or failure; return its exit code.
fn emit<R: Report>(
    global: &GlobalOpts,
    command: &str,
    result: Result<(R, ExitCode), CommandFailure>,
) -> ExitCode {
    match result {
        Ok((report, code)) => {
            println!("{}", render(&report, global.format));
            code
        }
        Err(failure) => {
            let report = ErrorReport::new(command, failure.code, failure.message);
            println!("{}", render(&report, global.format));
            failure.code
        }
    }
}

fn resolve_options(
    global: &GlobalOpts,
    filters: &FilterArgs,
) -> Result<(CollectionOptions, ConfigSource), CommandFailure> {
    let (options, source) = ConfigResolver::from_process(global.config.clone()).load()?;
    Ok((filters.overrides().apply(options), source))
}

fn cmd_collect(global: &GlobalOpts, args: &CollectArgs) -> ExitCode {
    let result = resolve_options(global, &args.filters).and_then(|(options, config)| {
        run_collect(&CollectRequest {
            root: args.root.clone(),
            output: args.output.clone(),
            prefix: args.naming.prefix(),
            options,
            config,
            host: args.host.clone().unwrap_or_else(default_host),
            description: args.description.clone(),
        })
    });
    emit(global, "collect", result)
}

fn cmd_list(global: &GlobalOpts, args: &ListArgs) -> ExitCode {
    let result = resolve_options(global, &args.filters)
        .and_then(|(options, _)| run_list(&args.root, &args.naming.prefix(), &options));
    emit(global, "list", result)
}
