use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use scout_rank::config::{self, AppConfig};
use scout_rank::{dataset, pipeline, report};

const DEFAULT_CONFIG_PATH: &str = "scout.json";

fn main() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(ranking) = err.downcast_ref::<scout_rank::RankingError>() {
                eprintln!("error [{}]: {ranking}", ranking.kind());
            } else {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config_path = parse_path_arg("--config")
        .or_else(config::config_path_from_env)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut app = config::load_app_config(&config_path)?;
    app.apply_env_overrides();
    apply_cli_overrides(&mut app);

    let populations = dataset::load_populations(&app.dataset)
        .with_context(|| format!("load dataset from {}", config_path.display()))?;
    let ranking = pipeline::rank_populations(&populations, &app.ranking)?;

    print!("{}", report::render_table(&ranking, app.output.show_components));

    if let Some(path) = app.output.json.as_deref() {
        report::write_json(path, &ranking)?;
        println!("JSON: {}", path.display());
    }
    if let Some(path) = app.output.xlsx.as_deref() {
        report::export_xlsx(path, &ranking)?;
        println!("XLSX: {}", path.display());
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_cli_overrides(app: &mut AppConfig) {
    if let Some(top_k) = parse_string_arg("--top")
        .and_then(|raw| raw.parse::<usize>().ok())
        .filter(|k| *k > 0)
    {
        app.ranking.top_k = top_k;
    }
    if let Some(position) = parse_string_arg("--position") {
        app.dataset.position = Some(position);
    }
    if let Some(path) = parse_path_arg("--json") {
        app.output.json = Some(path);
    }
    if let Some(path) = parse_path_arg("--xlsx") {
        app.output.xlsx = Some(path);
    }
    if has_flag("--components") {
        app.output.show_components = true;
    }
}

fn parse_path_arg(flag: &str) -> Option<PathBuf> {
    parse_string_arg(flag).map(PathBuf::from)
}

fn parse_string_arg(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn has_flag(flag: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == flag)
}
