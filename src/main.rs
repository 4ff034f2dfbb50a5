mod cli;

use mediacheck::{check, config, extract};
use mediacheck_captions::CaptionParser;
use mediacheck_media::read_track_timescales;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediacheck=trace,mediacheck_captions=trace,mediacheck_media=debug,mediacheck_common=debug"
                .to_string()
        } else {
            "mediacheck=info,mediacheck_captions=info,mediacheck_media=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Captions {
            init,
            scheme,
            json,
            segments,
        } => decode_captions(&init, &scheme, &segments, json),
        Commands::Timing {
            init,
            json,
            segments,
        } => print_timing(&init, &segments, json),
        Commands::Emsg { json, segments } => print_emsg(&segments, json),
        Commands::Check { output } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_check(cli.config.as_deref(), output))
        }
        Commands::Validate { file } => {
            let path = file.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mediacheck {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        anyhow::bail!("File does not exist: {:?}", path);
    }
    std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))
}

fn decode_captions(init: &Path, scheme: &str, segments: &[PathBuf], json: bool) -> Result<()> {
    let scheme = extract::captions::resolve_scheme("cli", Some(scheme))?;
    let mut parser = CaptionParser::new(scheme);
    parser.parse_init(&read_file(init)?, "0")?;

    let mut cues = Vec::new();
    for (idx, segment) in segments.iter().enumerate() {
        let data = read_file(segment)?;
        cues.extend(parser.parse_media(&data, idx as u64 + 1, "0"));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&cues)?);
    } else if cues.is_empty() {
        println!("No captions found");
    } else {
        for cue in &cues {
            println!(
                "{:>10.3} --> {:>10.3}  [{}] {}",
                cue.begin,
                cue.end,
                cue.stream(),
                cue.raw_text
            );
        }
    }

    Ok(())
}

fn print_timing(init: &Path, segments: &[PathBuf], json: bool) -> Result<()> {
    let tracks = read_track_timescales(&read_file(init)?).context("Failed to parse init segment")?;

    let mut rows = Vec::with_capacity(segments.len());
    for segment in segments {
        let timing = extract::segment_timing(&tracks, &read_file(segment)?)?;
        rows.push(serde_json::json!({
            "segment": segment,
            "decode_time_ms": timing.decode_time_ms,
            "duration_ms": timing.duration_ms,
        }));
        if !json {
            println!(
                "{}: decode time {:.3} ms, duration {:.3} ms",
                segment.display(),
                timing.decode_time_ms,
                timing.duration_ms
            );
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    }
    Ok(())
}

fn print_emsg(segments: &[PathBuf], json: bool) -> Result<()> {
    let mut all = Vec::new();
    for segment in segments {
        let messages = extract::extract_emsg(&read_file(segment)?)?;
        if !json {
            println!("{}: {} emsg", segment.display(), messages.len());
            for emsg in &messages {
                println!(
                    "  [{}] {} value={} time={}/{} duration={} data={:?}",
                    emsg.id,
                    emsg.scheme_id_uri,
                    emsg.value,
                    emsg.presentation_time_delta,
                    emsg.timescale,
                    emsg.event_duration,
                    emsg.message_data
                );
            }
        }
        all.push(serde_json::json!({ "segment": segment, "emsg": messages }));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&all)?);
    }
    Ok(())
}

async fn run_check(config_path: Option<&Path>, output: Option<PathBuf>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    if config.representations.is_empty() {
        anyhow::bail!("No representations configured");
    }
    let out_dir = output.unwrap_or_else(|| config.output.dir.clone());

    tracing::info!("Running checks into {:?}", out_dir);
    let report = check::run_check(&config, &out_dir).await?;

    println!("Caption streams: {}", report.captions.len());
    for stream in &report.captions {
        println!("  {} ({} cues)", stream.key, stream.cue_count);
    }
    println!("Missing cues: {}", report.missing_cues.len());
    println!("Timing issues: {}", report.timing_issues.len());
    println!("Event messages: {}", report.emsg.len());
    println!("Report: {}", out_dir.join("report.json").display());
    if report.has_issues() {
        tracing::warn!("Check finished with issues");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Output: {:?}", config.output.dir);
            println!("  Concurrency: {}", config.limits.concurrency);
            println!("  Representations: {}", config.representations.len());
            println!(
                "    With captions: {}",
                config
                    .representations
                    .iter()
                    .filter(|r| r.captions.is_some())
                    .count()
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Output: {:?}", config.output.dir);
            println!("  Concurrency: {}", config.limits.concurrency);
        }
    }

    Ok(())
}
