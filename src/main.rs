mod ui;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use passbooster::{
    DomainResolver, KdfAlgorithm, NoSuffixList, Settings, SiteContext, check_policy, generate,
    normalize_label_explained,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "passbooster",
    version,
    about = "Regenerates a site password from a master secret using Argon2id"
)]
struct Cli {
    /// Site domain or URL
    domain: String,

    /// Account label, e.g. "work" or an email address
    #[arg(short, long, default_value = "")]
    label: String,

    /// Site version; bump it to rotate the password
    #[arg(short, long, default_value = "v1")]
    revision: String,

    /// TOML settings file
    #[arg(short, long, env = "PASSBOOSTER_CONFIG")]
    config: Option<PathBuf>,

    /// Password length, clamped to 12..=128 (overrides the settings file)
    #[arg(long)]
    length: Option<usize>,

    /// Characters that count as symbols; empty disables the symbol rule
    #[arg(long)]
    symbols: Option<String>,

    /// Key derivation function; pbkdf2-sha256 is deprecated
    #[arg(long, value_enum)]
    algorithm: Option<Algorithm>,

    /// Keep the full host instead of reducing it to its registrable domain
    #[arg(long)]
    no_public_suffix: bool,

    /// Show what label normalization changed
    #[arg(long)]
    explain: bool,

    /// Print only the password
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum Algorithm {
    Argon2id,
    Pbkdf2Sha256,
}

impl From<Algorithm> for KdfAlgorithm {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Argon2id => KdfAlgorithm::Argon2id,
            Algorithm::Pbkdf2Sha256 => KdfAlgorithm::Pbkdf2Sha256,
        }
    }
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        if let Some(length) = self.length {
            settings.policy.length = length;
        }
        if let Some(symbols) = &self.symbols {
            settings.policy.symbols = symbols.clone();
        }
        if let Some(algorithm) = self.algorithm {
            settings.kdf.algorithm = algorithm.into();
        }

        Ok(settings)
    }
}

#[cfg(feature = "psl")]
fn resolver(cli: &Cli) -> Box<dyn DomainResolver> {
    if cli.no_public_suffix {
        Box::new(NoSuffixList)
    } else {
        Box::new(passbooster::PublicSuffixList)
    }
}

#[cfg(not(feature = "psl"))]
fn resolver(_cli: &Cli) -> Box<dyn DomainResolver> {
    Box::new(NoSuffixList)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let settings = cli.settings()?;
    let resolver = resolver(&cli);
    let options = ui::DisplayOptions {
        unicode_support: ui::detect_unicode_support(),
        color_support: ui::detect_color_support(),
        quiet: cli.quiet,
    };

    let site = SiteContext::new(cli.domain.as_str(), cli.label.as_str(), cli.revision.as_str());
    let [domain, label, version] = site.normalized(&settings.label_steps, resolver.as_ref());

    if cli.explain && !options.quiet {
        let (_, changes) = normalize_label_explained(&site.label, &settings.label_steps);
        ui::display_changes(&changes, &options);
    }

    let master = ui::prompt_master_secret()?;

    let (password, elapsed) = ui::show_progress(options.unicode_support, async {
        generate(&master, &site, &settings, resolver.as_ref())
            .await
            .map_err(anyhow::Error::from)
    })
    .await?;
    drop(master);

    let report = check_policy(&password, &settings.policy);
    let info = ui::SiteInfo {
        domain: &domain,
        label: &label,
        version: &version,
    };

    ui::display_output(&password, &info, &settings, &report, elapsed, &options);

    Ok(())
}
