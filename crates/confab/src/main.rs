//! A terminal front end for `confab`.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::path::Path;
use std::pin::pin;
use std::time::Duration;

use confab::config::AppConfig;
use confab::core::ErrorKind;
use confab::core::transcript::{Message, Sender};
use confab::{Session, SessionBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum SessionEvent {
    Message(Message),
    Cleared,
    Busy(bool),
}

const BAR_CHAR: &str = "▎";

const HELP: &str = "\
Commands:
  /1, /2, ...     send a suggested prompt
  /reset          start over with a new conversation
  /health         check the service
  /export <path>  save the transcript as HTML
  /quit           leave";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    debug!("loaded config: {config:?}");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let session = SessionBuilder::from_config(&config)
        .on_message({
            let event_tx = event_tx.clone();
            move |message| {
                event_tx.send(SessionEvent::Message(message.clone())).ok();
            }
        })
        .on_transcript_cleared({
            let event_tx = event_tx.clone();
            move || {
                event_tx.send(SessionEvent::Cleared).ok();
            }
        })
        .on_busy_changed({
            let event_tx = event_tx.clone();
            move |busy| {
                event_tx.send(SessionEvent::Busy(busy)).ok();
            }
        })
        .build();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    drive(session.start(), &mut event_rx, &progress_style)
        .await
        .ok();
    print_suggestions(&session);

    // One reader for the whole loop, so lines pasted together are kept.
    let mut input = BufReader::new(io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().unwrap();

        let Some(line) = read_line(&mut input).await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) => break,
            ("/help", _) => println!("{HELP}"),
            ("/reset", _) => {
                drive(session.reset(), &mut event_rx, &progress_style)
                    .await
                    .ok();
            }
            ("/health", _) => {
                let health =
                    drive(session.check_health(), &mut event_rx, &progress_style)
                        .await;
                match health {
                    Ok(health) => println!(
                        "service is {} (version {})",
                        health.status,
                        health.version.as_deref().unwrap_or("unknown")
                    ),
                    Err(err) => println!("{}", err.red()),
                }
            }
            ("/export", path) if !path.trim().is_empty() => {
                match session.export_transcript(Path::new(path.trim())) {
                    Ok(()) => println!("saved to {}", path.trim()),
                    Err(err) => println!("{}", err.red()),
                }
            }
            (command, _) if command.starts_with('/') => {
                let Ok(number) = command[1..].parse::<usize>() else {
                    println!("{HELP}");
                    continue;
                };
                let result =
                    drive(session.send_suggestion(number), &mut event_rx, &progress_style)
                        .await;
                if let Err(err) = result {
                    report(err.kind(), &err.reason());
                }
            }
            _ => {
                let result =
                    drive(session.send_message(line), &mut event_rx, &progress_style)
                        .await;
                if let Err(err) = result {
                    report(err.kind(), &err.reason());
                }
            }
        }
    }
}

/// Runs `fut` to completion while printing the session events it causes.
async fn drive<F: Future>(
    fut: F,
    event_rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    progress_style: &ProgressStyle,
) -> F::Output {
    let mut fut = pin!(fut);
    let mut progress_bar: Option<ProgressBar> = None;

    loop {
        let event = select! {
            output = &mut fut => {
                if let Some(progress_bar) = &progress_bar {
                    progress_bar.finish_and_clear();
                }
                // Callbacks run synchronously, so every event the
                // operation caused is already queued.
                while let Ok(event) = event_rx.try_recv() {
                    print_event(event);
                }
                return output;
            }
            event = event_rx.recv() => {
                let Some(event) = event else {
                    continue;
                };
                event
            }
            _ = sleep(Duration::from_millis(100)) => {
                if let Some(progress_bar) = &progress_bar {
                    progress_bar.inc(1);
                }
                continue;
            }
        };

        match event {
            SessionEvent::Busy(true) => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(progress_style.clone());
                bar.set_message("🤔 Thinking...");
                progress_bar = Some(bar);
            }
            SessionEvent::Busy(false) => {
                if let Some(progress_bar) = progress_bar.take() {
                    progress_bar.finish_and_clear();
                }
            }
            event => match &progress_bar {
                Some(progress_bar) => progress_bar.suspend(|| print_event(event)),
                None => print_event(event),
            },
        }
    }
}

fn print_event(event: SessionEvent) {
    match event {
        SessionEvent::Message(message) => print_message(&message),
        SessionEvent::Cleared => println!("{}", "── new conversation ──".dimmed()),
        SessionEvent::Busy(_) => {}
    }
}

fn print_message(message: &Message) {
    // The user already sees what they typed.
    if message.sender() == Sender::User {
        return;
    }
    if message.is_error() {
        println!("{}⚠️  {}", BAR_CHAR.bright_red(), message.text().bright_red());
    } else {
        println!("{}🤖 {}", BAR_CHAR.bright_cyan(), message.text().bright_white());
    }
}

fn print_suggestions(session: &Session) {
    let suggestions = session.client().suggestions();
    if suggestions.is_empty() {
        return;
    }
    println!("{}", "Try one of these (or type /help):".dimmed());
    for (idx, suggestion) in suggestions.iter().enumerate() {
        println!("  /{} {}", idx + 1, suggestion.bright_white());
    }
}

fn report(kind: ErrorKind, reason: &str) {
    match kind {
        ErrorKind::Validation | ErrorKind::Busy => {
            println!("{}", reason.yellow());
        }
        // Already shown in the transcript.
        ErrorKind::Transport | ErrorKind::Protocol => {}
    }
}

async fn read_line<R: AsyncBufRead + Unpin>(
    input: &mut Lines<R>,
) -> Option<String> {
    match input.next_line().await {
        Ok(line) => line,
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_line_keeps_pasted_lines() {
        let mut input = BufReader::new(&b"first\nsecond\nthird"[..]).lines();
        assert_eq!(read_line(&mut input).await.as_deref(), Some("first"));
        assert_eq!(read_line(&mut input).await.as_deref(), Some("second"));
        assert_eq!(read_line(&mut input).await.as_deref(), Some("third"));
        assert_eq!(read_line(&mut input).await, None);
    }
}
