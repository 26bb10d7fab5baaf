use anyhow::{Context, Result};
use console::{Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use passbooster::{ChangeRecord, KdfAlgorithm, PolicyReport, Settings};
use rpassword::read_password;
use std::future::Future;
use std::io::{self, Write};
use std::time::{Duration, Instant};
use zeroize::Zeroizing;

pub const MIN_KDF_MEMORY_MIB: u32 = 64;
pub const MIN_KDF_TIME_COST: u32 = 3;

pub const MAX_MASTER_BYTES: usize = 1024 * 1024;

pub struct DisplayOptions {
    pub unicode_support: bool,
    pub color_support: bool,
    pub quiet: bool,
}

/// The normalized site context, as it went into the salt.
pub struct SiteInfo<'a> {
    pub domain: &'a str,
    pub label: &'a str,
    pub version: &'a str,
}

pub fn detect_unicode_support() -> bool {
    supports_unicode::on(supports_unicode::Stream::Stdout)
}

pub fn detect_color_support() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

pub fn get_status_symbols(unicode_support: bool) -> (&'static str, &'static str) {
    if unicode_support {
        ("✓", "!")
    } else {
        ("+", "!")
    }
}

fn tree_glyphs(unicode_support: bool) -> (&'static str, &'static str) {
    if unicode_support {
        ("├─", "└─")
    } else {
        ("|-", "`-")
    }
}

fn status_style(ok: bool, options: &DisplayOptions) -> Style {
    match (options.color_support, ok) {
        (false, _) => Style::new(),
        (true, true) => Style::new().green(),
        (true, false) => Style::new().yellow(),
    }
}

/// Reads the master secret without echo. Surrounding whitespace is dropped;
/// the secret itself is never normalized further.
pub fn prompt_master_secret() -> Result<Zeroizing<Vec<u8>>> {
    print!("Master: ");
    io::stdout().flush()?;

    let input = Zeroizing::new(read_password().context("Failed to fetch master secret")?);
    let trimmed = input.trim();

    if trimmed.is_empty() {
        anyhow::bail!("Master secret cannot be empty");
    }
    if trimmed.len() > MAX_MASTER_BYTES {
        anyhow::bail!(
            "Master secret too long ({} bytes, maximum is {})",
            trimmed.len(),
            MAX_MASTER_BYTES
        );
    }

    Ok(Zeroizing::new(trimmed.as_bytes().to_vec()))
}

pub async fn show_progress<F, T>(unicode_support: bool, task: F) -> Result<(T, Duration)>
where
    F: Future<Output = Result<T>>,
{
    let term = Term::stderr();
    term.hide_cursor().ok();

    let pb = ProgressBar::new_spinner();

    if unicode_support {
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
    } else {
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("-\\|/-"),
        );
    }

    pb.set_message("Deriving key...");
    pb.enable_steady_tick(Duration::from_millis(80));

    let start = Instant::now();
    let result = task.await;
    let elapsed = start.elapsed();

    pb.finish_and_clear();
    term.show_cursor().ok();

    result.map(|r| (r, elapsed))
}

pub fn display_changes(changes: &[ChangeRecord], options: &DisplayOptions) {
    let (branch, last) = tree_glyphs(options.unicode_support);

    println!("Label normalization:");
    if changes.is_empty() {
        println!("  {last} unchanged");
    }
    for (i, change) in changes.iter().enumerate() {
        let prefix = if i + 1 == changes.len() { last } else { branch };
        println!("  {prefix} {}: {}", change.title, change.detail);
        println!("       {:?} -> {:?}", change.before, change.after);
    }
    println!();
}

pub fn display_output(
    password: &Zeroizing<String>,
    site: &SiteInfo<'_>,
    settings: &Settings,
    report: &PolicyReport,
    elapsed: Duration,
    options: &DisplayOptions,
) {
    if options.quiet {
        println!("{}", &**password);
        return;
    }

    println!("Out:\n{}\n", &**password);
    display_settings(site, settings, options);
    display_report(password, report, elapsed, options);
}

fn or_empty(value: &str) -> &str {
    if value.is_empty() { "(empty)" } else { value }
}

fn display_settings(site: &SiteInfo<'_>, settings: &Settings, options: &DisplayOptions) {
    let (check_ok, check_warn) = get_status_symbols(options.unicode_support);
    let (branch, last) = tree_glyphs(options.unicode_support);
    let kdf = &settings.kdf;

    let kdf_secure = kdf.algorithm == KdfAlgorithm::Argon2id
        && kdf.memory_mib >= MIN_KDF_MEMORY_MIB
        && kdf.time_cost >= MIN_KDF_TIME_COST;
    let kdf_style = status_style(kdf_secure, options);
    let kdf_status = if kdf_secure { check_ok } else { check_warn };

    println!("Settings:");

    match kdf.algorithm {
        KdfAlgorithm::Argon2id => println!(
            "  {branch} KDF        {} Argon2id (m={} MiB, t={}, p={}, {} bytes)",
            kdf_style.apply_to(format!("[{kdf_status}]")),
            kdf_style.apply_to(kdf.memory_mib),
            kdf_style.apply_to(kdf.time_cost),
            kdf_style.apply_to(kdf.parallelism),
            kdf.output_bytes
        ),
        KdfAlgorithm::Pbkdf2Sha256 => println!(
            "  {branch} KDF        {} PBKDF2-SHA256 (deprecated, {} bytes)",
            kdf_style.apply_to(format!("[{kdf_status}]")),
            kdf.output_bytes
        ),
    }

    println!("  {branch} Domain     {}", or_empty(site.domain));
    println!("  {branch} Label      {}", or_empty(site.label));
    println!("  {branch} Version    {}", site.version);
    println!(
        "  {last} Policy     {} chars, symbols {:?}",
        settings.policy.effective_length(),
        settings.policy.symbols
    );
    println!();
}

fn display_report(
    password: &str,
    report: &PolicyReport,
    elapsed: Duration,
    options: &DisplayOptions,
) {
    let (check_ok, check_warn) = get_status_symbols(options.unicode_support);
    let (branch, last) = tree_glyphs(options.unicode_support);

    let line = |name: &str, ok: bool, detail: &str| {
        let style = status_style(ok, options);
        let status = if ok { check_ok } else { check_warn };
        println!(
            "  {branch} {name:<10} {} {detail}",
            style.apply_to(format!("[{status}]"))
        );
    };

    let length = password.chars().count();

    println!("Policy:");
    line("Length", report.length_ok, &format!("{length} chars"));
    line("Digit", report.has_digit, "");
    line("Uppercase", report.has_upper, "");
    line("Symbol", report.has_symbol, "");
    line("Digit run", report.no_long_digit_run, "no run of 3+");
    println!("  {last} Time       {:.1}s", elapsed.as_secs_f64());

    let style = status_style(report.ok, options);
    let (icon, text) = if report.ok {
        (check_ok, "OK")
    } else {
        (check_warn, "Not satisfied")
    };
    println!(
        "\n{} Policy: {}",
        style.apply_to(format!("[{icon}]")),
        style.apply_to(text)
    );
}
