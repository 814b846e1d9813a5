use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand, builder::BoolishValueParser};
use no_color::is_no_color;
use relver::{
    Git, RelverError, Resolved, Resolver, Source, VERSION_CACHE, VersionCache,
    error::{ErrorReport, build_report, render_report},
};
use serde_json::json;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Opts {
    /// Git executable to run
    #[clap(long, env = "RELVER_GIT", default_value = "git")]
    git: PathBuf,
    /// Directory of the git work tree, defaults to the current directory
    #[clap(short = 'C', long, env = "RELVER_DIRECTORY")]
    directory: Option<PathBuf>,
    /// Version cache file, relative paths are resolved against the directory
    #[clap(long, env = "RELVER_CACHE_FILE", default_value = VERSION_CACHE)]
    cache_file: PathBuf,
    /// Print a JSON object with the version and where it came from
    #[clap(long, env = "RELVER_JSON", value_parser = BoolishValueParser::new())]
    json: bool,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the version from git or the cache, updating the cache (default)
    Resolve,
    /// Compute the version from git only, leaving the cache untouched
    Live,
    /// Print the cached version
    Cached,
}

impl Opts {
    fn resolver(&self) -> Resolver {
        let cache_file = match &self.directory {
            Some(dir) if self.cache_file.is_relative() => dir.join(&self.cache_file),
            _ => self.cache_file.clone(),
        };
        let git = Git::builder()
            .program(self.git.clone())
            .maybe_cwd(self.directory.clone())
            .build();
        Resolver::builder()
            .git(git)
            .cache(VersionCache::new(cache_file))
            .build()
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("relver=warn")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!is_no_color()),
        )
        .init();
}

fn print(resolved: &Resolved, json: bool) {
    if json {
        let value = json!({
            "version": resolved.version,
            "source": resolved.source.as_str(),
        });
        println!("{value}");
    } else {
        println!("{}", resolved.version);
    }
}

fn try_main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    let resolver = opts.resolver();

    let resolved = match opts.command.unwrap_or(Command::Resolve) {
        Command::Resolve => resolver.resolve()?,
        Command::Live => {
            let Some(version) = resolver.live_version()? else {
                bail!("not inside a git work tree");
            };
            Resolved {
                version: version.into_string(),
                source: Source::Git,
            }
        }
        Command::Cached => {
            let Some(version) = resolver.cache().load()? else {
                bail!(
                    "no cached version in {}",
                    resolver.cache().path().display()
                );
            };
            Resolved {
                version,
                source: Source::Cache,
            }
        }
    };
    print(&resolved, opts.json);

    Ok(())
}

fn report_error(e: &anyhow::Error) {
    let Some(e) = e.downcast_ref::<RelverError>() else {
        eprintln!("Error: {e}");
        return;
    };
    match build_report(e) {
        ErrorReport::Report(report) => {
            let mut s = String::new();
            match render_report(&mut s, &report) {
                Ok(()) => eprint!("{s}"),
                Err(_) => eprintln!("Error: {e}"),
            }
        }
        ErrorReport::String(msg) => eprintln!("Error: {msg}"),
    }
}

fn main() {
    init_tracing();
    if let Err(e) = try_main() {
        report_error(&e);

        #[allow(clippy::exit)]
        std::process::exit(1);
    }
}
