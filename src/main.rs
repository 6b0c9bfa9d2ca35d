//! `proxy-confgen`: generate the nginx proxy configuration from templates.

use std::path::PathBuf;
use std::process;

use clap::Parser;

use proxy_confgen::config::{load_config, GeneratorConfig};
use proxy_confgen::generator::{create_conf, GenerateOptions, RunMode};
use proxy_confgen::observability::init_logging;

#[derive(Parser)]
#[command(name = "proxy-confgen")]
#[command(about = "Generate nginx proxy configuration files from templates")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Working directory; conf and template directories derive from it
    #[arg(short = 'w', long)]
    workdir: Option<PathBuf>,

    /// Template directory
    #[arg(short = 't', long)]
    templatedir: Option<PathBuf>,

    /// Config file prefix; also the template prefix unless -P is given
    #[arg(short = 'p', long)]
    prefix: Option<String>,

    /// Template file prefix
    #[arg(short = 'P', long)]
    template_prefix: Option<String>,

    /// Include directory, relative to the conf directory
    #[arg(short = 'i', long)]
    include: Option<String>,

    /// Dry run: resolve everything, write nothing
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Print default variables and exit
    #[arg(short = 'd', long, conflicts_with = "definitions")]
    defaults: bool,

    /// Print resolved variables and exit
    #[arg(short = 'D', long)]
    definitions: bool,

    /// Override a variable (key=value); may be repeated
    #[arg(short = 'c', long = "conf", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Generate for this server (id or name) instead of the local one
    #[arg(short = 's', long)]
    server: Option<String>,

    /// Fail when a virtual hostname cannot be resolved
    #[arg(short = 'f', long)]
    force_dns_resolution: bool,

    /// Debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    fn into_options(self, mut config: GeneratorConfig) -> GenerateOptions {
        if let Some(dir) = self.workdir {
            config.paths.work_dir = dir;
            config.paths.template_dir = None;
        }
        if let Some(dir) = self.templatedir {
            config.paths.template_dir = Some(dir);
        }
        if let Some(include) = self.include {
            config.paths.include_dir = include;
        }
        if let Some(prefix) = self.prefix {
            config.paths.conf_prefix = prefix;
            config.paths.template_prefix = None;
        }
        if let Some(prefix) = self.template_prefix {
            config.paths.template_prefix = Some(prefix);
        }

        let mut options = GenerateOptions::from_config(&config);
        options.mode = if self.defaults {
            RunMode::DisplayDefaults
        } else if self.definitions {
            RunMode::DisplayDefinitions
        } else {
            RunMode::Generate
        };
        options.dry_run = self.dry_run;
        options.overrides = self.overrides;
        options.server = self.server;
        options.enforce_dns = self.force_dns_resolution;
        options
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                init_logging("info", cli.verbose);
                tracing::error!(path = %path.display(), error = %e, "Failed to load settings");
                process::exit(1);
            }
        },
        None => GeneratorConfig::default(),
    };
    init_logging(&config.observability.log_level, cli.verbose);

    let options = cli.into_options(config);
    tracing::debug!(
        work_dir = %options.paths.work_dir.display(),
        template_dir = %options.paths.template_dir.display(),
        mode = ?options.mode,
        dry_run = options.dry_run,
        "Starting proxy configuration generation"
    );
    process::exit(create_conf(&options));
}
