use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use clap::builder::{PossibleValue, PossibleValuesParser};
use clap::{Arg, ArgGroup, Command};
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use texo_viewer::playback::{PageImage, ViewFrame};
use texo_viewer::{
    AudioPayload, Config, HttpStoryClient, StoryService, StoryViewer, SubmissionError, SubmissionForm,
    ViewerCommand, DEFAULT_THEME,
};
use texo_core::{JobId, JobStatus, MaturityLevel, TransitionStyle};

fn cli() -> Command {
    Command::new("Texo Story Viewer")
        .version("0.1.0")
        .about("Create illustrated stories and watch them play back")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (defaults to the standard search path)")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("create")
                .about("Start a new story from a text prompt or a voice recording")
                .arg(
                    Arg::new("text")
                        .short('t')
                        .long("text")
                        .value_name("PROMPT")
                        .help("Story concept as text"),
                )
                .arg(
                    Arg::new("audio")
                        .short('a')
                        .long("audio")
                        .value_name("FILE")
                        .help("Recorded story prompt to upload"),
                )
                .group(ArgGroup::new("prompt").args(["text", "audio"]).required(true))
                .arg(
                    Arg::new("theme")
                        .long("theme")
                        .value_name("THEME")
                        .help("Story theme")
                        .default_value(DEFAULT_THEME),
                )
                .arg(
                    Arg::new("maturity")
                        .short('m')
                        .long("maturity")
                        .value_name("LEVEL")
                        .help("Target audience")
                        .value_parser(PossibleValuesParser::new(
                            MaturityLevel::ALL.map(|level| PossibleValue::new(level.as_str()).help(level.label())),
                        ))
                        .default_value("toddler"),
                )
                .arg(
                    Arg::new("watch")
                        .short('w')
                        .long("watch")
                        .help("Follow the job and play the story when it is ready")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("watch")
                .about("Follow an existing story job")
                .arg(Arg::new("id").value_name("ID").help("Story job id").required(true)),
        )
        .subcommand(Command::new("history").about("List previously created stories"))
}

type LogFilterHandle = reload::Handle<EnvFilter, Registry>;

fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("texo={level},texo_viewer={level},texo_core={level},warn"))
    })
}

/// Install the subscriber before anything logs; the level can be swapped once config is loaded
fn init_logging(verbose: bool) -> LogFilterHandle {
    let (filter, handle) = reload::Layer::new(log_filter(if verbose { "debug" } else { "info" }));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
    handle
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let verbose = matches.get_flag("verbose");
    let log_filter_handle = init_logging(verbose);
    if verbose {
        info!("Verbose logging enabled");
    }

    let config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from(Path::new(path))?.with_env_overrides(),
        None => Config::load()?,
    };
    if !verbose {
        if let Err(e) = log_filter_handle.reload(log_filter(&config.logging.level)) {
            warn!("Failed to apply log level {}: {}", config.logging.level, e);
        }
    }
    config.validate()?;
    debug!("{}", config.summary());

    let client: Arc<dyn StoryService> =
        Arc::new(HttpStoryClient::new(&config.service).context("building HTTP client")?);
    info!("🚀 Texo viewer talking to {}", config.service.api_url());

    match matches.subcommand() {
        Some(("create", sub)) => {
            let job_id = create(client.as_ref(), sub).await?;
            println!("{}", job_id);
            if sub.get_flag("watch") {
                watch(config, client, job_id).await?;
            }
            Ok(())
        }
        Some(("watch", sub)) => {
            let id = sub
                .get_one::<String>("id")
                .ok_or_else(|| anyhow!("missing story id"))?;
            watch(config, client, JobId::new(id.as_str())).await
        }
        Some(("history", _)) => history(client.as_ref()).await,
        _ => bail!("no command given"),
    }
}

async fn create(service: &dyn StoryService, args: &clap::ArgMatches) -> Result<JobId> {
    let theme = args
        .get_one::<String>("theme")
        .map(String::as_str)
        .unwrap_or(DEFAULT_THEME);
    let maturity: MaturityLevel = match args.get_one::<String>("maturity") {
        Some(level) => level.parse()?,
        None => MaturityLevel::default(),
    };

    let form = if let Some(text) = args.get_one::<String>("text") {
        SubmissionForm::text(text.as_str())
    } else if let Some(path) = args.get_one::<String>("audio") {
        let audio = AudioPayload::from_file(Path::new(path))
            .await
            .with_context(|| format!("reading recording {}", path))?;
        SubmissionForm::voice(audio)
    } else {
        bail!("either --text or --audio is required");
    };
    let mut form = form.with_theme(theme).with_maturity(maturity);

    match form.submit(service).await {
        Ok(id) => Ok(id),
        Err(SubmissionError::Api(e)) => {
            eprintln!("Failed to start story agent.");
            Err(anyhow::Error::new(e).context("creating story job"))
        }
        Err(e) => {
            eprintln!("{}", e);
            Err(e.into())
        }
    }
}

async fn history(service: &dyn StoryService) -> Result<()> {
    let stories = service.fetch_history().await.context("fetching story history")?;
    if stories.is_empty() {
        println!("No stories yet.");
        return Ok(());
    }

    for story in &stories {
        let date = story
            .created_at
            .map(|at| at.with_timezone(&Local).format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "----------".to_string());
        println!(
            "{}  {:<19}  {}  ({})",
            date,
            story.status.as_str(),
            story.display_title(),
            story.id
        );
    }
    Ok(())
}

/// What a frame looks like at the granularity worth reprinting
#[derive(Debug, PartialEq)]
enum FrameKey {
    Loading(Option<JobStatus>, String, u8, usize),
    Failed,
    Slide(usize, bool, TransitionStyle),
}

impl FrameKey {
    fn of(frame: &ViewFrame) -> Self {
        match frame {
            ViewFrame::Loading(loading) => FrameKey::Loading(
                loading.status,
                loading.message.clone(),
                loading.progress,
                loading.log.len(),
            ),
            ViewFrame::Failed(_) => FrameKey::Failed,
            ViewFrame::Slide(slide) => FrameKey::Slide(slide.page_index, slide.is_playing, slide.transition),
        }
    }
}

fn render(frame: &ViewFrame) {
    match frame {
        ViewFrame::Loading(loading) => {
            println!("[{:>3}%] {}", loading.progress, loading.message);
            if let Some(entry) = loading.log.first() {
                println!("        {} {} {}: {}", entry.time_label, entry.marker.symbol(), entry.stage, entry.message);
            }
        }
        ViewFrame::Failed(failed) => {
            println!("❌ Story generation failed: {}", failed.message);
            for entry in &failed.log {
                println!("   {} {} {}: {}", entry.time_label, entry.marker.symbol(), entry.stage, entry.message);
            }
        }
        ViewFrame::Slide(slide) => {
            println!();
            match &slide.badges {
                Some(badges) => println!(
                    "📖 {}  [{} | {} | {}]",
                    slide.title,
                    badges.theme,
                    badges.maturity,
                    badges.input_mode.label()
                ),
                None => println!("📖 {}", slide.title),
            }
            println!(
                "Page {}/{} ({}) {}",
                slide.page_index + 1,
                slide.page_count,
                slide.transition,
                if slide.is_playing { "▶ playing" } else { "⏸ paused" }
            );
            match &slide.image {
                PageImage::Ready(url) => println!("🖼  {}", url),
                PageImage::Placeholder => println!("🖼  {}", texo_viewer::playback::IMAGE_PLACEHOLDER),
            }
            println!("{}", slide.text);
        }
    }
}

/// Forward single-letter commands from stdin to the viewer
fn spawn_stdin_reader(commands: mpsc::Sender<ViewerCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let command = match line.trim() {
                "p" => ViewerCommand::TogglePlay,
                "n" => ViewerCommand::Next,
                "b" => ViewerCommand::Prev,
                "q" => ViewerCommand::Close,
                "" => continue,
                other => {
                    println!("Unknown command '{}' (p: play/pause, n: next, b: back, q: quit)", other);
                    continue;
                }
            };
            if commands.blocking_send(command).is_err() {
                break;
            }
        }
    });
}

async fn watch(config: Config, service: Arc<dyn StoryService>, job_id: JobId) -> Result<()> {
    let handle = StoryViewer::new(config, service).open(job_id);
    spawn_stdin_reader(handle.command_sender());
    println!("Controls: p play/pause, n next, b back, q quit");

    let mut frames = handle.frames();
    let mut last_key: Option<FrameKey> = None;

    loop {
        let key = {
            let frame = frames.borrow_and_update();
            let key = FrameKey::of(&frame);
            if last_key.as_ref() != Some(&key) {
                render(&frame);
            }
            key
        };
        let failed = key == FrameKey::Failed;
        last_key = Some(key);
        if failed {
            break;
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, closing viewer");
                break;
            }
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    let exit = handle.close().await?;
    if !exit.last_frame.is_slide() {
        warn!("Viewer closed before the story was ready ({:?})", exit.poll_outcome);
    }
    Ok(())
}
