//! Playback Relay - CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use playback_relay::{
    cli::{wait_for_key, Args, Prompter},
    config::{validate_config, Config, MediaMode, RetentionIntent},
    error::{exit_codes, Result},
    fs::reveal_directory,
    output::{
        print_banner, print_error, print_info, print_source_summary, print_success,
        print_warning, BarReporter, NoProgress, ProgressObserver,
    },
    pipeline::{Pipeline, RetentionDecision, TranscodeCommand, TransferSession, UploadStatus},
    source::{resolve, SourceLink},
    TelegramSink,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Values from .env act as defaults for the env-backed flags
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt().with_env_filter(filter).with_target(false).init();

    print_banner();

    match run(&args).await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            if !args.no_wait {
                wait_for_key();
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    // Configuration gate: nothing is opened until this passes
    let mut config = Config::load_or_default(&args.config)?;
    args.merge_into_config(&mut config);
    let valid = validate_config(&config)?;

    let inputs = args.session_args();
    let mut prompter = Prompter::stdio();

    let link = match inputs.link {
        Some(link) => link,
        None => prompter.ask("Type video file link...")?,
    };
    let link = SourceLink::parse(&link)?;

    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let source = resolve(&client, &link).await?;
    print_source_summary(
        source.total_bytes,
        link.duration().map(|d| d.as_secs_f64()),
    );

    let name = match inputs.name {
        Some(name) => name,
        None => prompter.ask("Type video file name...")?,
    };
    let mode = match inputs.mode {
        Some(mode) => mode,
        None if prompter.ask_yes_no("Extract only audio?")? => MediaMode::Audio,
        None => MediaMode::Video,
    };
    let retention = match inputs.retention {
        Some(retention) => retention,
        None => RetentionIntent::from_answer(prompter.ask_yes_no("Keep file on disk?")?),
    };

    let session = TransferSession::new(
        &valid,
        &link,
        Some(source.total_bytes),
        &name,
        mode,
        retention,
    )?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let sink = TelegramSink::new(
        client,
        &config.telegram.api_base,
        valid.bot_token.clone(),
        valid.chat_id,
    );
    let transcoder = TranscodeCommand::ffmpeg_mp3(&valid.ffmpeg_path, &config.options.audio_bitrate);
    let pipeline = Pipeline::new(sink, transcoder).with_cancellation(cancel);

    let observer: Box<dyn ProgressObserver> = if config.options.show_progress {
        Box::new(BarReporter::new(format!("Downloading {}", session.file_name)))
    } else {
        Box::new(NoProgress)
    };

    let report = pipeline.run(&session, source.stream, observer).await?;

    match report.outcome.upload {
        UploadStatus::Delivered { .. } => {
            print_success(&format!("Uploaded {}", session.file_name));
        }
        UploadStatus::SkippedOverThreshold => {
            print_warning(&format!(
                "{} is too large to upload; it stays on disk",
                session.file_name
            ));
        }
    }

    if let Some(path) = report.retained_file() {
        print_info(&format!("Kept {}", path.display()));
        if config.options.reveal_directory {
            if let Some(dir) = &session.local_directory {
                if let Err(e) = reveal_directory(dir) {
                    tracing::warn!("Could not open {}: {}", dir.display(), e);
                }
            }
        }
    } else if report.decision == Some(RetentionDecision::Delete) {
        print_info(&format!("Removed local copy of {}", session.file_name));
    }

    print_success("Done");
    Ok(())
}
