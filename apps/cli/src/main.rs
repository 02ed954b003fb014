use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use console::{Term, style};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use socrates_core::{
    InputField, PlayerState, Question, Router, SimulatedPlayer, SocratesConfig, VideoFeed,
    VideoPlayer, default_config_path,
    events::{BusConfig, EventBus},
    format_timestamp, get_journal_path, get_root_data_dir, load_config,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    pipeline::{PipelineOptions, start_pipeline},
    workers::session_summary::SessionSummary,
};

mod answers;
mod pipeline;
mod workers;

type CliRouter = Router<SimulatedPlayer, Arc<EventBus>>;

/// How questions get answered when they pop.
#[derive(Clone, Copy, Default, ValueEnum)]
enum AnswerStrategy {
    /// Prompt on the terminal
    #[default]
    Interactive,
    /// Submit the expected answer
    Correct,
    /// Submit a wrong answer once, then skip
    Wrong,
    Skip,
}

#[derive(Parser)]
#[command(name = "socrates")]
#[command(about = "Play a video timeline and pause for the questions embedded in it")]
struct Cli {
    /// Video feed JSON with youtubeId, duration and timeline items
    feed: PathBuf,

    /// Config file. Defaults to <config dir>/socrates/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Playback speed multiplier
    #[arg(short, long, default_value_t = 1.0)]
    speed: f64,

    #[arg(short, long, value_enum, default_value = "interactive")]
    answers: AnswerStrategy,

    /// Start from a fragment: "4m32s", "<bookmark-slug>" or "<question-slug>/q"
    #[arg(short, long)]
    fragment: Option<String>,

    /// Response journal. Defaults to one file per video under the data dir
    #[arg(long)]
    journal: Option<PathBuf>,

    /// POST every response to this URL
    #[arg(long)]
    report_url: Option<String>,

    /// Play through without showing questions
    #[arg(long)]
    no_questions: bool,

    #[arg(long)]
    no_audio_cue: bool,
}

fn load_settings(cli: &Cli) -> Result<SocratesConfig> {
    let mut config = match cli.config.clone().or_else(default_config_path) {
        Some(path) => load_config(&path)?,
        None => SocratesConfig::default(),
    };
    if cli.no_questions {
        config.show_questions = false;
    }
    if cli.no_audio_cue {
        config.audio_cue = false;
    }
    Ok(config)
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn create_bar(duration: f64) -> Result<ProgressBar> {
    let bar = ProgressBar::with_draw_target(
        Some(duration.ceil() as u64),
        ProgressDrawTarget::stdout(),
    );
    bar.set_style(
        ProgressStyle::with_template("{msg:>16} [{bar:40.cyan/blue}] {prefix}")?
            .progress_chars("=> "),
    );
    Ok(bar)
}

fn update_bar(bar: &ProgressBar, router: &CliRouter) {
    let player = router.player();
    let position = player.current_time();
    bar.set_position(position as u64);
    bar.set_prefix(format!(
        "{} / {}",
        format_timestamp(position),
        format_timestamp(player.duration())
    ));
    bar.set_message(router.state().name());
}

fn drain_player_states(
    router: &mut CliRouter,
    states: &mut UnboundedReceiver<PlayerState>,
    now: Instant,
) {
    while let Ok(state) = states.try_recv() {
        router.on_player_state(now, state);
    }
}

async fn prompt(label: String) -> Result<String> {
    let line = tokio::task::spawn_blocking(move || {
        let term = Term::stdout();
        term.write_str(&label)?;
        term.read_line()
    })
    .await??;
    Ok(line)
}

fn print_result(bar: &ProgressBar, correct: bool) {
    if correct {
        bar.println(format!("  {} Correct", style("✓").green().bold()));
    } else {
        bar.println(format!("  {} Not quite", style("✗").red().bold()));
    }
}

async fn answer_interactively(
    router: &mut CliRouter,
    question: &Question,
    bar: &ProgressBar,
) -> Result<()> {
    let names = answers::text_field_names(question);
    if names.is_empty() {
        bar.println(format!(
            "  {}",
            style("Grid questions cannot be answered here, skipping").dim()
        ));
        router.skip(Instant::now())?;
        return Ok(());
    }

    bar.println(format!("  {}", style("Type :skip to move on").dim()));
    loop {
        for name in &names {
            let value = prompt(format!("  {name}> ")).await?;
            if value.trim() == ":skip" {
                router.skip(Instant::now())?;
                return Ok(());
            }
            router.set_input(InputField::Text {
                name: name.clone(),
                value,
            })?;
        }

        let submission = router.submit(Instant::now())?;
        print_result(bar, submission.correct);
        if submission.correct {
            if !submission.answered {
                router.skip(Instant::now())?;
            }
            return Ok(());
        }
    }
}

async fn answer_question(
    router: &mut CliRouter,
    strategy: AnswerStrategy,
    bar: &ProgressBar,
) -> Result<()> {
    let Some(question) = router.active_view().map(|view| view.question().clone()) else {
        return Ok(());
    };

    bar.println(format!(
        "{} {} {}",
        style("?").yellow().bold(),
        style(&question.bookmark.title).bold(),
        style(format!("[{}]", format_timestamp(router.player().current_time()))).dim()
    ));

    match strategy {
        AnswerStrategy::Skip => {
            router.skip(Instant::now())?;
            bar.println(format!("  {} Skipped", style("→").dim()));
        }
        AnswerStrategy::Correct | AnswerStrategy::Wrong => {
            let fields = match strategy {
                AnswerStrategy::Correct => answers::correct_inputs(&question),
                _ => answers::wrong_inputs(&question),
            };
            for field in fields {
                router.set_input(field)?;
            }
            let submission = router.submit(Instant::now())?;
            print_result(bar, submission.correct);
            if !submission.answered {
                router.skip(Instant::now())?;
            }
        }
        AnswerStrategy::Interactive => answer_interactively(router, &question, bar).await?,
    }
    Ok(())
}

fn print_summary(summary: &SessionSummary, journal_path: &std::path::Path) {
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{} {}/{}",
        style("Completed:").dim(),
        style(summary.completed.len()).cyan().bold(),
        summary.total_questions
    );
    println!(
        "{} {} ({} correct, {} skipped)",
        style("Responses:").dim(),
        summary.responses,
        summary.correct,
        summary.skipped
    );
    for failure in &summary.failures {
        println!("{} {}", style("!").red().bold(), failure);
    }
    println!(
        "{} {}",
        style("Journal:").dim(),
        style(journal_path.display()).cyan()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_settings(&cli)?;
    init_tracing(&config.log_level);

    let raw = tokio::fs::read_to_string(&cli.feed)
        .await
        .with_context(|| format!("reading feed {}", cli.feed.display()))?;
    let feed = VideoFeed::from_json(&raw)?;

    println!(
        "\n{}  {}\n",
        style("socrates").cyan().bold(),
        style(&feed.title).dim()
    );

    let journal_path = cli
        .journal
        .clone()
        .unwrap_or_else(|| get_journal_path(&get_root_data_dir(), &feed.youtube_id));

    let pipeline = start_pipeline(
        BusConfig::default(),
        PipelineOptions {
            journal_path: journal_path.clone(),
            report_url: cli.report_url.clone(),
            audio_cue: config.audio_cue,
        },
    )?;

    let tick_interval = config.tick_interval();
    let (player, mut states) = SimulatedPlayer::new(feed.duration);
    let player = player.with_rate(cli.speed);
    let mut router = Router::new(config, &feed, player, Arc::clone(&pipeline.bus))?;

    if let Some(fragment) = &cli.fragment {
        router.navigate(Instant::now(), fragment)?;
    }

    router.player_mut().cue();
    drain_player_states(&mut router, &mut states, Instant::now());
    if router.active_view().is_none() {
        router.player_mut().play();
    }

    let bar = create_bar(feed.duration)?;
    let mut interval = tokio::time::interval(tick_interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut last = Instant::now();
    loop {
        if router.active_view().is_some() {
            if let Err(err) = answer_question(&mut router, cli.answers, &bar).await {
                warn!(error = %err, "Answering failed, skipping question");
                if router.active_view().is_some()
                    && let Err(err) = router.skip(Instant::now())
                {
                    warn!(error = %err, "Skip failed");
                }
            }
            // Time spent answering is not playback time.
            last = Instant::now();
        }

        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut ctrl_c => {
                warn!("Interrupted");
                break;
            }
        }

        let now = Instant::now();
        router.player_mut().advance(now - last);
        last = now;

        drain_player_states(&mut router, &mut states, now);
        router.tick(now);
        update_bar(&bar, &router);

        if router.is_finished() {
            break;
        }
    }
    bar.finish_and_clear();

    let summary = if router.is_finished() {
        tokio::time::timeout(Duration::from_secs(2), pipeline.done_rx)
            .await
            .ok()
            .and_then(Result::ok)
    } else {
        None
    };

    // Workers may already be gone.
    let _ = pipeline.shutdown_tx.send(());

    match summary {
        Some(summary) => print_summary(&summary, &journal_path),
        None => println!("{}", style("Playback stopped early").yellow()),
    }
    info!("Session closed");
    Ok(())
}
