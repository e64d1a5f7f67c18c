mod cli;

use segtrim::{config, processor::JobRunner, server, state::AppState};
use segtrim_av::{
    plan, resolve_tool, CancelToken, DurationProbe, FfprobeProber, JobOutcome, JobRequest,
    MediaDuration, SegmentParams,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

/// Largest plan the `plan` command will print.
const MAX_PLAN_WINDOWS: u64 = 1_000_000;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting segtrim server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );
    tracing::info!(
        "Uploads in {:?}, outputs in {:?}",
        config.storage.upload_dir,
        config.storage.output_dir
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "segtrim=trace,segtrim_av=trace,segtrim_common=debug,tower_http=debug".to_string()
        } else {
            "segtrim=debug,segtrim_av=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Run {
            input,
            segment,
            removal,
            output_dir,
        } => run_file(
            &input,
            segment,
            removal,
            output_dir.as_deref(),
            cli.config.as_deref(),
        ),
        Commands::Plan {
            duration,
            segment,
            removal,
            json,
        } => print_plan(duration, segment, removal, json),
        Commands::Probe { file, json } => probe_file(&file, json, cli.config.as_deref()),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate { path } => {
            let path = path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("segtrim {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_file(
    input: &Path,
    segment: u32,
    removal: u32,
    output_dir: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    if let Some(dir) = output_dir {
        config.storage.output_dir = dir.to_path_buf();
    }

    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }
    if !segtrim_common::paths::is_allowed_video(input, &config.processing.allowed_extensions) {
        anyhow::bail!(
            "Unsupported file type: {:?} (allowed: {})",
            input,
            config.processing.allowed_extensions.join(", ")
        );
    }

    let params = SegmentParams::new(segment, removal)?;
    let original_name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());

    let runner = JobRunner::from_config(&config, AppState::new());
    let run = runner.run_blocking(
        JobRequest::borrowed(input, original_name, params),
        &CancelToken::new(),
    );

    let outcome = run
        .result
        .with_context(|| format!("Processing {:?} failed", input))?;

    if let Some(duration) = run.report.duration {
        println!("Source: {} ({})", input.display(), duration);
    }
    match outcome {
        JobOutcome::Produced { output, segments } => {
            println!("Joined {} segments", segments);
            println!("Output: {}", output.display());
        }
        JobOutcome::NoOutput => {
            println!("No segments produced: every segment is shorter than the removal interval.");
        }
    }

    Ok(())
}

fn print_plan(duration: f64, segment: u32, removal: u32, json: bool) -> Result<()> {
    let params = SegmentParams::new(segment, removal)?;
    let duration = MediaDuration::from_secs(duration)?;
    let segments = params.segment_count(duration);
    if segments > MAX_PLAN_WINDOWS {
        anyhow::bail!(
            "{} segments requested; plans are limited to {}",
            segments,
            MAX_PLAN_WINDOWS
        );
    }
    let plan = plan(
        duration,
        f64::from(params.segment_length()),
        f64::from(params.removal_interval()),
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    if plan.is_empty() {
        println!("No windows: every segment is shorter than the removal interval.");
        return Ok(());
    }

    println!("{:>5}  {:>10}  {:>10}", "#", "start", "length");
    for window in plan.windows() {
        println!(
            "{:>5}  {:>10.3}  {:>10.3}",
            window.index, window.start, window.cut_length
        );
    }
    println!(
        "\n{} windows, {:.3}s of {} kept",
        plan.len(),
        plan.total_cut_length(),
        duration
    );

    Ok(())
}

fn probe_file(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let prober = FfprobeProber::new(resolve_tool(
        "ffprobe",
        config.tools.ffprobe_path.as_deref(),
    ));
    let duration = prober.probe(file)?;

    if json {
        let value = serde_json::json!({
            "file": file,
            "duration": duration,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        let secs = duration.as_secs();
        let whole = secs as u64;
        println!("File: {}", file.display());
        println!(
            "Duration: {:02}:{:02}:{:06.3} ({})",
            whole / 3600,
            (whole / 60) % 60,
            secs - (whole - whole % 60) as f64,
            duration
        );
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = [
        ("ffmpeg", config.tools.ffmpeg_path.as_deref()),
        ("ffprobe", config.tools.ffprobe_path.as_deref()),
    ];
    let mut all_ok = true;

    for (name, configured) in tools {
        let tool = segtrim_av::check_tool_at(name, &resolve_tool(name, configured));
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to process videos.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Upload limit: {} MB", config.server.max_upload_mb);
            println!("  Upload dir: {:?}", config.storage.upload_dir);
            println!("  Output dir: {:?}", config.storage.output_dir);
            println!(
                "  Codecs: {} / {}",
                config.processing.video_codec, config.processing.audio_codec
            );
            println!("  Parallel cuts: {}", config.processing.parallel_cuts);
            println!(
                "  Allowed extensions: {}",
                config.processing.allowed_extensions.join(", ")
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
