//! Chat room walkthrough for eventline.
//!
//! A server task writes status and chat events onto an in-memory pipe; the
//! client reads them back and dispatches on the event type. Passing
//! `--resume-from <ID>` plays the part of a reconnecting client: the server
//! only replays events after that ID.

use clap::Parser;
use eventline_core::{MessageEvent, headers};
use eventline_stream::{EventReader, EventWriter, StreamConfig};
use serde::Deserialize;
use tokio::io::{DuplexStream, duplex};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line options.
#[derive(Parser, Debug)]
#[command(name = "eventline-demo", version, about = "Replay a chat room over an event stream")]
struct Args {
    /// Resume after this event ID, as a reconnecting client would
    #[arg(long, env = "EVENTLINE_RESUME_FROM")]
    resume_from: Option<String>,

    /// Maximum accepted line length in bytes
    #[arg(long, default_value_t = eventline_stream::DEFAULT_MAX_LINE_LENGTH)]
    max_line_length: usize,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    from: String,
    message: String,
}

fn history() -> anyhow::Result<Vec<MessageEvent>> {
    let events = vec![
        MessageEvent::builder()
            .id("1")
            .event_type("status")
            .data(
                r#"{
    "room": "Friday Night Movies",
    "participants": ["Alpha", "Beta", "Gamma"]
}"#,
            )
            .build()?,
        MessageEvent::builder()
            .id("2")
            .event_type("message")
            .data(r#"{"from": "a", "message": "Hello world"}"#)
            .build()?,
        MessageEvent::builder()
            .id("3")
            .event_type("message")
            .data(r#"{"from": "b", "message": "Hello Alpha, how are you?"}"#)
            .comment("sent from the mobile app")
            .build()?,
    ];
    Ok(events)
}

/// Events the server replays for a client presenting `last_event_id`.
fn replay_after<'a>(
    events: &'a [MessageEvent],
    last_event_id: Option<&str>,
) -> &'a [MessageEvent] {
    match last_event_id {
        None => events,
        Some(id) => events
            .iter()
            .position(|event| event.id() == Some(id))
            .map_or(&events[events.len()..], |index| &events[index + 1..]),
    }
}

async fn serve(
    pipe: DuplexStream,
    events: Vec<MessageEvent>,
    last_event_id: Option<String>,
    config: StreamConfig,
) -> anyhow::Result<()> {
    let mut writer = EventWriter::new(pipe, &config);
    writer.write_keepalive().await?;
    for event in replay_after(&events, last_event_id.as_deref()) {
        writer.write_event(event).await?;
    }
    info!(events = writer.events_written(), "server finished");
    Ok(())
}

fn dispatch(event: &MessageEvent) -> anyhow::Result<()> {
    match event.event_type() {
        Some("status") => info!(status = event.data(), "room status"),
        Some("message") => {
            let chat: ChatMessage = serde_json::from_str(event.data())?;
            info!(from = %chat.from, message = %chat.message, "chat message");
        }
        Some("error") => warn!(error = event.data(), "server reported an error"),
        // keepalives and comment-only groups
        None if event.data().is_empty() => {}
        other => warn!(event_type = other, "unknown event type"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = StreamConfig::new().with_max_line_length(Some(args.max_line_length));
    if let Some(id) = &args.resume_from {
        info!(
            accept = headers::ACCEPT_EVENT_STREAM,
            header = headers::LAST_EVENT_ID,
            value = %id,
            "reconnecting"
        );
        config = config.with_last_event_id(id.clone());
    }

    let (client, server) = duplex(4096);
    let server = tokio::spawn(serve(
        server,
        history()?,
        args.resume_from.clone(),
        config.clone(),
    ));

    let mut reader = EventReader::new(client, &config)?;
    while let Some(event) = reader.next_event().await {
        dispatch(&event?)?;
    }
    server.await??;

    info!(
        last_event_id = reader.last_event_id(),
        content_type = headers::CONTENT_TYPE_EVENT_STREAM,
        "stream closed"
    );
    Ok(())
}
