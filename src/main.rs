//! CLI entry point for treescribe

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use treescribe::error::exit_code;
use treescribe::output::ConsoleFormatter;
use treescribe::tree::{IconStyle, SortKey, TraversalMode, replay};
use treescribe::{
    GenerateError, Hooks, OutputConfig, OutputFormat, PartialConfig, Session, StructureConfig,
};

const LOG_ENV: &str = "TREESCRIBE_LOG";
const DEFAULT_TEMPLATES_FILE: &str = ".treescribe-templates.json";

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Determine whether to use color output based on mode and environment.
fn should_use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // Respect NO_COLOR environment variable (https://no-color.org/)
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            if std::env::var_os("FORCE_COLOR").is_some() {
                return true;
            }
            if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
                return false;
            }
            io::stdout().is_terminal()
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "treescribe")]
#[command(about = "Snapshot a directory tree as text, JSON, Markdown, XML or CSV")]
#[command(version)]
struct Args {
    /// Directories to describe
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Include hidden files and directories
    #[arg(short, long)]
    all: bool,

    /// Descend only N levels deep (0 = unlimited)
    #[arg(short = 'L', long = "level", allow_negative_numbers = true)]
    level: Option<i64>,

    /// Folder name to skip; replaces the default list (node_modules, .git)
    #[arg(short = 'x', long = "exclude-folder", value_name = "NAME")]
    exclude_folders: Vec<String>,

    /// Only show files with these extensions (comma separated)
    #[arg(short = 'e', long = "ext", value_delimiter = ',')]
    extensions: Vec<String>,

    /// Skip entries whose relative path matches a glob (can be used multiple times)
    #[arg(short = 'I', long = "ignore", value_name = "GLOB")]
    ignore: Vec<String>,

    /// Do not apply .gitignore rules
    #[arg(long = "no-gitignore")]
    no_gitignore: bool,

    /// Show file sizes
    #[arg(short = 's', long = "size")]
    size: bool,

    /// Show permissions
    #[arg(short = 'p', long = "permissions")]
    permissions: bool,

    /// Show last-modified dates
    #[arg(short = 'D', long = "modified")]
    modified: bool,

    /// Sort order for siblings
    #[arg(long = "sort", value_name = "KEY")]
    sort: Option<SortKey>,

    /// Output format
    #[arg(short = 'f', long = "format")]
    format: Option<OutputFormat>,

    /// Collapse directories with more than THRESHOLD entries (default 50)
    #[arg(long = "compress", value_name = "THRESHOLD", num_args = 0..=1, allow_negative_numbers = true)]
    compress: Option<Option<i64>>,

    /// Icon style
    #[arg(long = "icons", value_name = "STYLE")]
    icons: Option<IconStyle>,

    /// Icon override for an extension, e.g. --icon rs=R (can be used multiple times)
    #[arg(long = "icon", value_name = "EXT=ICON", value_parser = parse_icon_override)]
    icon: Vec<(String, String)>,

    /// Emit output while walking instead of building the full tree first
    #[arg(long = "stream")]
    stream: bool,

    /// Control color output: auto, always, never
    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// Write output to FILE, or into DIR with a name derived from the root
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: Option<PathBuf>,

    /// Read options from a JSON config file
    #[arg(long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Template store (JSON map of name to options)
    #[arg(long = "templates", value_name = "FILE")]
    templates: Option<PathBuf>,

    /// Start from a saved template
    #[arg(long = "template", value_name = "NAME")]
    template: Option<String>,

    /// Save the effective options as a template
    #[arg(long = "save-template", value_name = "NAME")]
    save_template: Option<String>,

    /// Expire cached metadata after DURATION (e.g. 30s, 5m)
    #[arg(long = "cache-ttl", value_name = "DURATION", value_parser = parse_duration_string)]
    cache_ttl: Option<Duration>,

    /// Cancel the walk after DURATION
    #[arg(long = "timeout", value_name = "DURATION", value_parser = parse_duration_string)]
    timeout: Option<Duration>,

    /// Report progress on stderr
    #[arg(long = "progress")]
    progress: bool,

    /// Print raw stream events as JSON lines
    #[arg(long = "events", conflicts_with = "output")]
    events: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of parallel workers when several paths are given
    /// (0 = auto-detect, N = use N workers)
    #[arg(short = 'j', long = "jobs", default_value = "0")]
    jobs: usize,
}

/// Parse a duration string like "30s", "5m", "1h" into a Duration.
fn parse_duration_string(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s.trim()).map_err(|e| e.to_string())
}

/// Parse `EXT=ICON`.
fn parse_icon_override(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((ext, icon)) if !ext.trim().is_empty() => {
            Ok((ext.trim().to_string(), icon.to_string()))
        }
        _ => Err(format!("expected EXT=ICON, got '{}'", s)),
    }
}

/// Options given directly on the command line.
fn flags_to_partial(args: &Args) -> PartialConfig {
    PartialConfig {
        include_hidden: args.all.then_some(true),
        exclude_folders: (!args.exclude_folders.is_empty()).then(|| args.exclude_folders.clone()),
        extensions: (!args.extensions.is_empty()).then(|| args.extensions.clone()),
        exclude_patterns: (!args.ignore.is_empty()).then(|| args.ignore.clone()),
        respect_gitignore: args.no_gitignore.then_some(false),
        include_size: args.size.then_some(true),
        include_permissions: args.permissions.then_some(true),
        include_modified_date: args.modified.then_some(true),
        sort_by: args.sort,
        output_format: args.format,
        max_depth: args.level,
        compress_large_dirs: args.compress.map(|_| true),
        compression_threshold: args.compress.flatten(),
        icon_style: args.icons,
        custom_icons: (!args.icon.is_empty())
            .then(|| args.icon.iter().cloned().collect::<BTreeMap<_, _>>()),
        mode: args.stream.then_some(TraversalMode::Streaming),
    }
}

fn read_templates(path: &Path) -> Result<BTreeMap<String, PartialConfig>, String> {
    match fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents)
            .map_err(|e| format!("invalid template file '{}': {}", path.display(), e)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(format!("cannot read '{}': {}", path.display(), e)),
    }
}

/// Layer template, config file and flags over the defaults.
fn build_partial(args: &Args, templates_path: &Path) -> Result<PartialConfig, String> {
    let mut partial = PartialConfig::default();

    if let Some(name) = &args.template {
        let mut templates = read_templates(templates_path)?;
        let template = templates
            .remove(name)
            .ok_or_else(|| format!("unknown template '{}'", name))?;
        partial = partial.merge(template);
    }

    if let Some(path) = &args.config {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
        let file: PartialConfig = serde_json::from_str(&contents)
            .map_err(|e| format!("invalid config file '{}': {}", path.display(), e))?;
        partial = partial.merge(file);
    }

    Ok(partial.merge(flags_to_partial(args)))
}

fn save_template(path: &Path, name: &str, config: &StructureConfig) -> Result<(), String> {
    let mut templates = read_templates(path)?;
    templates.insert(name.to_string(), PartialConfig::from(config));
    let json = serde_json::to_string_pretty(&templates).map_err(|e| e.to_string())?;
    fs::write(path, json + "\n").map_err(|e| format!("cannot write '{}': {}", path.display(), e))
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn build_hooks(args: &Args) -> Hooks {
    let mut hooks = Hooks::new();
    if let Some(timeout) = args.timeout {
        let deadline = Instant::now() + timeout;
        hooks = hooks.cancel_when(move || Instant::now() >= deadline);
    }
    if args.progress {
        let mut processed = 0usize;
        hooks = hooks.on_progress(move |increment, _| {
            processed += increment;
            if processed % 100 == 0 {
                eprint!("\rtreescribe: {} items processed", processed);
            }
        });
    }
    hooks
}

fn root_name(root: &Path) -> String {
    fs::canonicalize(root)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "root".to_string())
}

/// Resolve `-o`: a directory gets `<root>-structure.<ext>` inside it.
///
/// A file target shared by several roots becomes `<stem>-<root>.<ext>` so
/// that each root gets its own file.
fn output_path(target: &Path, root: &Path, format: OutputFormat, shared: bool) -> PathBuf {
    if target.is_dir() {
        return target.join(format!("{}-structure.{}", root_name(root), format.file_extension()));
    }
    if !shared {
        return target.to_path_buf();
    }
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "structure".to_string());
    let name = match target.extension() {
        Some(ext) => format!("{}-{}.{}", stem, root_name(root), ext.to_string_lossy()),
        None => format!("{}-{}", stem, root_name(root)),
    };
    target.with_file_name(name)
}

fn write_output(args: &Args, root: &Path, format: OutputFormat, text: &str) -> Result<(), GenerateError> {
    match &args.output {
        Some(target) => {
            let path = output_path(target, root, format, args.paths.len() > 1);
            fs::write(&path, text).map_err(GenerateError::Write)?;
            eprintln!("treescribe: wrote {}", path.display());
            Ok(())
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes()).map_err(GenerateError::Write)?;
            stdout.flush().map_err(GenerateError::Write)
        }
    }
}

fn run_single(args: &Args, session: &Session, root: &Path, config: &StructureConfig) -> Result<(), GenerateError> {
    let hooks = build_hooks(args);

    let use_color = args.output.is_none()
        && config.output_format == OutputFormat::Tree
        && should_use_color(args.color);
    if use_color {
        let mut console = ConsoleFormatter::new(OutputConfig::new(config.clone()).with_color(true));
        match config.mode {
            TraversalMode::Eager => {
                let report = session.build_tree(root, config, hooks)?;
                replay(&report, &mut console)?;
            }
            TraversalMode::Streaming => {
                session.walk(root, config, &mut console, hooks)?;
            }
        }
        return Ok(());
    }

    let output = session.generate(root, config, hooks)?;
    write_output(args, root, config.output_format, &output.text)
}

/// Print one event stream per root, in input order.
fn run_events(args: &Args, session: &Session, config: &StructureConfig) -> Result<(), GenerateError> {
    let mut first_error = None;
    for root in &args.paths {
        if let Err(e) = print_events(args, session, root, config) {
            eprintln!("treescribe: {}: {}", root.display(), e);
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}

fn print_events(args: &Args, session: &Session, root: &Path, config: &StructureConfig) -> Result<(), GenerateError> {
    let mut stdout = io::stdout().lock();
    for event in session.stream(root, config, build_hooks(args))? {
        let line = serde_json::to_string(&event?)?;
        writeln!(stdout, "{}", line).map_err(GenerateError::Write)?;
    }
    stdout.flush().map_err(GenerateError::Write)
}

fn run_many(args: &Args, session: &Session, config: &StructureConfig) -> Result<(), GenerateError> {
    let results = session.generate_many(&args.paths, config, args.jobs);
    let mut first_error = None;
    for (root, result) in args.paths.iter().zip(results) {
        match result {
            Ok(output) => {
                if args.output.is_none() {
                    println!("==> {} <==", root.display());
                }
                write_output(args, root, config.output_format, &output.text)?;
            }
            Err(e) => {
                eprintln!("treescribe: {}: {}", root.display(), e);
                first_error.get_or_insert(e);
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let templates_path = args
        .templates
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATES_FILE));

    let partial = build_partial(&args, &templates_path).unwrap_or_else(|e| {
        eprintln!("treescribe: {}", e);
        process::exit(2);
    });
    let config = StructureConfig::resolve(partial).unwrap_or_else(|e| {
        eprintln!("treescribe: invalid configuration: {}", e);
        process::exit(2);
    });

    if let Some(name) = &args.save_template {
        if let Err(e) = save_template(&templates_path, name, &config) {
            eprintln!("treescribe: {}", e);
            process::exit(1);
        }
    }

    let session = Session::with_ttl(args.cache_ttl);
    let result = if args.events {
        run_events(&args, &session, &config)
    } else if args.paths.len() > 1 {
        run_many(&args, &session, &config)
    } else {
        run_single(&args, &session, &args.paths[0], &config)
    };
    if args.progress {
        eprintln!();
    }

    if let Err(e) = result {
        eprintln!("treescribe: {}", e);
        process::exit(exit_code(&e));
    }
}
