use anyhow::Result;
use clap::Parser;
use nulink::build::{DotnetCli, PackOptions};
use nulink::commands::{self, LinkOptions, config::Config};
use nulink::error::UserInputError;
use std::path::PathBuf;
use std::process::ExitCode;

/// nulink - link locally built NuGet packages
///
/// Pack one or more projects and link the result into the global packages
/// folder, so other projects can restore it without publishing. Tool packages
/// are installed as global tools instead.
///
/// Examples:
///   nulink                        # Pack and link the project in the current directory
///   nulink src/MyLib --no-build   # Link what the last pack produced
///   nulink All.sln -- -p:Version=1.2.3-local
#[derive(Parser, Debug)]
#[command(author, version = env!("NULINK_VERSION"), about)]
struct Cli {
    /// Project or solution files, or directories containing one
    #[arg(value_name = "PROJECT | SOLUTION")]
    paths: Vec<PathBuf>,

    /// Don't pack; use the manifest the last pack left in obj/
    #[arg(long = "no-build", visible_alias = "no-pack")]
    no_build: bool,

    /// Copy files instead of linking them
    #[arg(long)]
    copy: bool,

    /// Build configuration passed to the pack step
    #[arg(long, short = 'c', value_name = "CONFIGURATION")]
    configuration: Option<String>,

    /// Global packages folder (overrides defaults; also via NUGET_PACKAGES)
    #[arg(long = "packages-root", env = "NUGET_PACKAGES", value_name = "PATH")]
    packages_root: Option<PathBuf>,

    /// Global tools folder (defaults to ~/.dotnet/tools)
    #[arg(long = "tools-root", value_name = "PATH")]
    tools_root: Option<PathBuf>,

    /// Additional arguments for the pack step
    #[arg(last = true, value_name = "ARGS")]
    extra_args: Vec<String>,
}

fn run(cli: Cli) -> Result<bool> {
    let runtime = nulink::runtime::RealRuntime;
    let config = Config::new(&runtime, cli.packages_root, cli.tools_root, cli.copy)?;
    let options = LinkOptions {
        paths: cli.paths,
        no_build: cli.no_build,
        pack: PackOptions {
            configuration: cli.configuration,
            extra_args: cli.extra_args,
        },
    };

    let outcome = commands::link(&runtime, &DotnetCli, &config, &options)?;
    Ok(!outcome.any_failed())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            match e.downcast_ref::<UserInputError>() {
                Some(user_error) => eprintln!("error: {}", user_error),
                None => eprintln!("error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}
