mod cli;

use mediagate::config;
use mediagate::TranscodeGateway;
use mg_av::ToolRegistry;
use mg_core::config::Config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use futures::StreamExt;
use std::path::Path;

fn main() {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediagate=debug,mg_av=trace,mg_core=debug,mg_playback=debug".to_string()
        } else {
            "mediagate=info,mg_av=info".to_string()
        }
    });

    // Logs go to stderr so command output on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        let code = e
            .downcast_ref::<mg_core::Error>()
            .map(mg_core::Error::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert { input, output } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            block_on(convert(&config, &input, &output))
        }
        Commands::Info { input, json } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            block_on(info(&config, &input, json))
        }
        Commands::Hls {
            input,
            output_dir,
            segment_duration,
        } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            block_on(hls(&config, &input, &output_dir, segment_duration))
        }
        Commands::Fmp4 {
            input,
            output,
            segment_duration,
        } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            block_on(fmp4(&config, &input, &output, segment_duration))
        }
        Commands::Progress { input } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            block_on(progress(&config, &input))
        }
        Commands::CheckTools => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            check_tools(&config)
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mediagate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn block_on<F>(fut: F) -> Result<()>
where
    F: std::future::Future<Output = Result<()>>,
{
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(fut)
}

async fn convert(config: &Config, input: &Path, output: &Path) -> Result<()> {
    let gateway = TranscodeGateway::from_config(config)?;
    let out = gateway.convert(input, output).await?;
    println!("{}", out.display());
    Ok(())
}

async fn hls(
    config: &Config,
    input: &Path,
    output_dir: &Path,
    segment_duration: Option<u32>,
) -> Result<()> {
    let gateway = TranscodeGateway::from_config(config)?;
    let manifest = gateway
        .start_streaming_conversion(input, output_dir, segment_duration)
        .await?;
    println!("{}", manifest.display());
    Ok(())
}

async fn fmp4(
    config: &Config,
    input: &Path,
    output: &Path,
    segment_duration: Option<u32>,
) -> Result<()> {
    let gateway = TranscodeGateway::from_config(config)?;
    let out = gateway
        .create_streaming_mp4(input, output, segment_duration)
        .await?;
    println!("{}", out.display());
    Ok(())
}

async fn progress(config: &Config, input: &Path) -> Result<()> {
    let gateway = TranscodeGateway::from_config(config)?;
    let mut samples = gateway.monitor_progress(input).await?;
    while let Some(sample) = samples.next().await {
        println!("{:.2}", sample.elapsed_secs);
    }
    Ok(())
}

async fn info(config: &Config, input: &Path, json: bool) -> Result<()> {
    let gateway = TranscodeGateway::from_config(config)?;
    let result = gateway.probe(input).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result.to_info_map())?);
        return Ok(());
    }

    println!("File: {}", input.display());
    match (&result.duration, result.duration_secs) {
        (Some(raw), Some(secs)) => println!("Duration: {} ({:.2}s)", raw, secs),
        (Some(raw), None) => println!("Duration: {}", raw),
        _ => println!("Duration: unknown"),
    }
    println!(
        "Video: {}",
        result.video_codec.as_deref().unwrap_or("unknown")
    );

    Ok(())
}

fn check_tools(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let registry = ToolRegistry::discover(&config.tools);
    let mut all_ok = true;

    for tool in registry.check_all() {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
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
        println!("Some tools are missing. Install ffmpeg or set tools.ffmpeg_path.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let (config, label) = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            (config::load_config(p)?, p.display().to_string())
        }
        None => match config::find_default_config() {
            Some(p) => {
                println!("Validating config: {:?}", p);
                (config::load_config(&p)?, p.display().to_string())
            }
            None => {
                println!("No config file specified, using defaults");
                (Config::default(), "defaults".to_string())
            }
        },
    };

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("✓ Configuration is valid ({label})");
    } else {
        println!("Configuration loaded with {} warning(s):", warnings.len());
        for w in &warnings {
            println!("  - {w}");
        }
    }

    let conv = &config.conversion;
    println!("  Video codec: {}", conv.video_codec);
    println!("  Audio codec: {}", conv.audio_codec);
    println!("  Segment duration: {}s", conv.segment_duration);
    println!("  Manifest: {} ({})", conv.manifest_name, conv.segment_pattern);
    println!("  Timeout: {}s", conv.timeout_secs);
    match conv.max_concurrent {
        Some(n) => println!("  Max concurrent: {n}"),
        None => println!("  Max concurrent: unbounded"),
    }

    Ok(())
}
