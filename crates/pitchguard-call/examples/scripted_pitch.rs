//! Example: scripted pitch call
//!
//! Feeds a canned VC-pitch transcript through the session engine with
//! placeholder transport and detector backends, then prints the resulting
//! conversation ledger and every command the engine issued. No microphone,
//! no network.

use pitchguard_call::{
    CallConfig, PlaceholderTransport, SessionEngine, TranscriptEvent, TransportEvent,
    TransportMessage,
};
use pitchguard_verdict::{PlaceholderVerdict, RawVerdict};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const PITCH_LINES: [&str; 4] = [
    "Hi everyone, I'm Marvin, founder and CEO of DevFlow AI.",
    "We're already working with 12 Fortune 500 companies including Goldman Sachs and JP Morgan.",
    "Sequoia led our $8M seed round at a $45M valuation.",
    "ok",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🎯 PitchGuard scripted call");
    info!("===========================");

    let transport = Arc::new(PlaceholderTransport::new());
    let backend = PlaceholderVerdict {
        raw: RawVerdict {
            bullshit_score: Some(0.95),
            bullshit_type: Some("fake_customers".to_string()),
            voice_response: Some(
                "Bullshiiiit! Which specific Fortune 500 companies? Name them!".to_string(),
            ),
            ..Default::default()
        },
        ..Default::default()
    };

    let mut config = CallConfig::from_env();
    if config.assistant_id.is_none() {
        config = config.with_assistant_id("demo-assistant");
    }

    let (mut engine, mut events_rx) =
        SessionEngine::new(config, Some(transport.clone()), Arc::new(backend));

    engine.start()?;
    engine.handle_transport_event(TransportEvent::CallStarted);

    for (turn, line) in PITCH_LINES.iter().enumerate() {
        info!("🎤 Speaker: {}", line);
        engine.handle_transport_event(TransportEvent::Message(TransportMessage::Transcript(
            TranscriptEvent::user_final(*line, turn as u32),
        )));

        // Give the fact check a moment to settle, then feed any results back.
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(200), events_rx.recv()).await
        {
            engine.handle_session_event(event);
        }
    }

    info!("");
    info!("Conversation ledger:");
    for entry in engine.ledger().entries() {
        info!("  [{:?}] {}", entry.speaker, entry.text);
        if let Some(verdict) = &entry.verdict {
            info!(
                "        score {:.2}, {:?}: {}",
                verdict.score, verdict.severity, verdict.challenge
            );
        }
    }

    info!("");
    info!("Transport commands issued:");
    for command in transport.commands() {
        info!("  {:?}", command);
    }

    engine.stop();
    info!("👋 Done");
    Ok(())
}
