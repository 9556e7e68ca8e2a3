use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use generation_runtime::catalog::ModelRoute;
use generation_runtime::{
    GenerationOptions, GenerationRequest, GenerationRuntime, GenerationRuntimeBuilder,
    GenerationTask, MediaKind, PollPolicy, ProviderFamily,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "generate_cli", about = "Submit and poll media generation jobs")]
struct Cli {
    #[command(flatten)]
    runtime: RuntimeArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Submit a job and wait for its artifact URL.
    Generate(GenerateArgs),
    /// Submit a job and print the submitted task without polling.
    Submit(GenerateArgs),
    /// Poll a task that was submitted earlier.
    Resume(ResumeArgs),
    /// Print the effective model routing table as JSON.
    Routes,
}

#[derive(Debug, Args)]
struct RuntimeArgs {
    /// Per-request HTTP timeout in milliseconds.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Poll interval override for the selected media kind.
    #[arg(long, global = true)]
    interval_ms: Option<u64>,

    /// Poll attempt budget override for the selected media kind.
    #[arg(long, global = true)]
    max_attempts: Option<u32>,

    /// Base URL override, as `family=url`. Repeatable.
    #[arg(long = "base-url", value_name = "FAMILY=URL", global = true)]
    base_urls: Vec<String>,

    /// JSON file with extra routes (an array of route objects).
    #[arg(long, value_name = "FILE", global = true)]
    routes: Option<PathBuf>,

    /// Print the full task as JSON instead of just the URL.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// image, video, music, speech or slides.
    kind: MediaKind,
    model: String,
    prompt: String,

    #[arg(long)]
    aspect_ratio: Option<String>,
    #[arg(long)]
    duration_seconds: Option<u32>,
    #[arg(long)]
    style: Option<String>,
    #[arg(long)]
    quality: Option<String>,
    #[arg(long)]
    negative_prompt: Option<String>,
    #[arg(long = "image-url")]
    image_urls: Vec<String>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    instrumental: bool,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    voice: Option<String>,
    #[arg(long)]
    output_format: Option<String>,
    /// Provider-specific field, as `key=<json>`. Repeatable.
    #[arg(long = "extra", value_name = "KEY=JSON")]
    extra: Vec<String>,

    #[arg(long)]
    correlation_id: Option<String>,
}

#[derive(Debug, Args)]
struct ResumeArgs {
    kind: MediaKind,
    family: ProviderFamily,
    model: String,
    remote_task_id: String,

    /// Local task id; defaults to the remote id.
    #[arg(long)]
    task_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let media_kind = match &cli.command {
        Command::Generate(args) | Command::Submit(args) => Some(args.kind),
        Command::Resume(args) => Some(args.kind),
        Command::Routes => None,
    };
    let runtime = runtime_builder(&cli.runtime, media_kind)?.build()?;

    match cli.command {
        Command::Generate(args) => {
            let request = build_request(&args)?;
            let task = runtime.run_task(args.kind, &args.model, &request).await?;
            print_task(task, cli.runtime.json)?;
        }
        Command::Submit(args) => {
            let request = build_request(&args)?;
            let task = runtime.submit(args.kind, &args.model, &request).await?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        Command::Resume(args) => {
            let task_id = args.task_id.unwrap_or_else(|| args.remote_task_id.clone());
            let mut task = GenerationTask::new(task_id, args.kind, args.family, args.model);
            task.assign_remote_task_id(args.remote_task_id)?;
            let task = runtime.resume(task).await?;
            print_task(task, cli.runtime.json)?;
        }
        Command::Routes => println!("{}", runtime.export_routes_json()?),
    }

    Ok(())
}

fn runtime_builder(
    args: &RuntimeArgs,
    media_kind: Option<MediaKind>,
) -> Result<GenerationRuntimeBuilder, Box<dyn Error>> {
    let mut builder = GenerationRuntime::builder();
    if let Some(timeout_ms) = args.timeout_ms {
        builder = builder.with_timeout_ms(timeout_ms);
    }

    if let Some(media_kind) = media_kind {
        let defaults = PollPolicy::for_media_kind(media_kind);
        if args.interval_ms.is_some() || args.max_attempts.is_some() {
            builder = builder.with_poll_policy(
                media_kind,
                PollPolicy::new(
                    args.interval_ms.unwrap_or(defaults.interval_ms),
                    args.max_attempts.unwrap_or(defaults.max_attempts),
                ),
            );
        }
    }

    for entry in &args.base_urls {
        let (family, url) = split_pair(entry, "--base-url")?;
        builder = builder.with_base_url(family.parse::<ProviderFamily>()?, url);
    }

    if let Some(path) = &args.routes {
        let raw = std::fs::read_to_string(path)?;
        let routes: Vec<ModelRoute> = serde_json::from_str(&raw)?;
        for route in routes {
            builder = builder.with_route(route);
        }
    }

    Ok(builder)
}

fn build_request(args: &GenerateArgs) -> Result<GenerationRequest, Box<dyn Error>> {
    let mut options = GenerationOptions {
        aspect_ratio: args.aspect_ratio.clone(),
        duration_seconds: args.duration_seconds,
        style: args.style.clone(),
        quality: args.quality.clone(),
        negative_prompt: args.negative_prompt.clone(),
        image_urls: args.image_urls.clone(),
        seed: args.seed,
        instrumental: args.instrumental.then_some(true),
        title: args.title.clone(),
        voice: args.voice.clone(),
        output_format: args.output_format.clone(),
        ..GenerationOptions::default()
    };

    for entry in &args.extra {
        let (key, raw) = split_pair(entry, "--extra")?;
        // Bare words are taken as strings so `--extra mode=fast` works unquoted.
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        options.extra.insert(key.to_string(), value);
    }

    let mut request = GenerationRequest::new(args.prompt.clone()).with_options(options);
    if let Some(correlation_id) = &args.correlation_id {
        request = request.with_correlation_id(correlation_id.clone());
    }
    Ok(request)
}

fn split_pair<'a>(entry: &'a str, flag: &str) -> Result<(&'a str, &'a str), Box<dyn Error>> {
    entry
        .split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| (key.trim(), value))
        .ok_or_else(|| format!("{flag} expects KEY=VALUE, got `{entry}`").into())
}

fn print_task(task: GenerationTask, as_json: bool) -> Result<(), Box<dyn Error>> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&task)?);
        return Ok(());
    }

    let url = task.into_artifact()?;
    println!("{url}");
    Ok(())
}
