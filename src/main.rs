//! perfchat - terminal client for the frame-time analysis chat service
//!
//! Reads user messages from stdin and prints finished assistant turns.
//! `/reset` clears the conversation, `/quit` exits.

use perfchat::{
    ClientConfig, SessionHandle, SessionRuntime, SessionSnapshot, TracingDiagnostics, Turn,
    TurnId, WsConnector,
};
use std::collections::HashSet;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout belongs to the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "perfchat=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = ClientConfig::from_env()?;
    tracing::info!(
        server_url = %config.server_url,
        session_id = %config.session_id,
        "Starting perfchat"
    );

    let connector = WsConnector::new(config.server_url.clone());
    let (handle, task) = SessionRuntime::spawn(
        config.session_id.clone(),
        connector,
        TracingDiagnostics,
        config.session_options(),
    );

    let printer = tokio::spawn(print_updates(handle.subscribe()));

    read_input(&handle).await?;

    handle.shutdown();
    task.await?;
    printer.abort();

    tracing::info!("perfchat stopped");
    Ok(())
}

async fn read_input(handle: &SessionHandle) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/reset" => handle.reset().await?,
            "" => {}
            _ => {
                if !handle.snapshot().connected {
                    println!("[not connected, message not sent]");
                }
                handle.send(line).await?;
            }
        }
    }
    Ok(())
}

async fn print_updates(mut snapshots: watch::Receiver<SessionSnapshot>) {
    let mut printed: HashSet<TurnId> = HashSet::new();
    let mut connected = false;

    loop {
        {
            let snapshot = snapshots.borrow_and_update();
            if snapshot.connected != connected {
                connected = snapshot.connected;
                if connected {
                    println!("[connected to session {}]", snapshot.session_id);
                } else {
                    println!("[disconnected, retrying]");
                }
            }

            for turn in snapshot.transcript.iter() {
                if turn.is_assistant() && !turn.streaming && printed.insert(turn.id) {
                    print_turn(turn);
                }
            }
        }

        if snapshots.changed().await.is_err() {
            break;
        }
    }
}

fn print_turn(turn: &Turn) {
    if !turn.content.is_empty() {
        println!("{}", turn.content);
    }
    for chart in &turn.charts {
        println!("[chart] {}", chart.as_value());
    }
    if let Some(usage) = &turn.usage {
        println!(
            "[{} tokens: {} in, {} out, {}]",
            usage.total_tokens(),
            usage.input_tokens,
            usage.output_tokens,
            usage.model
        );
    }
    if let Some(error) = &turn.error {
        println!("[error] {error}");
    }
}
