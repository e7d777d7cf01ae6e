use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{interval, Duration, Instant};
use tracing::{error, info};

use vehicle_fx::config::FxServerConfig;
use vehicle_fx::logging::init_tracing;
use vehicle_fx::net::start_websocket_server;
use vehicle_fx::state::{AudioState, FxState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = FxServerConfig::load()?;
    init_tracing(&config.log_level);

    info!("🚀 Starting vehicle effects server");
    info!(tick_hz = config.tick_hz, audio_hz = config.audio_hz, "cadences");

    let state = Arc::new(Mutex::new(FxState::new(Arc::new(config.vehicle.clone()))));
    let audio = Arc::new(Mutex::new(AudioState::new(config.engine.clone())));

    // Start WebSocket server
    let server = tokio::spawn(start_websocket_server(
        config.bind_addr,
        Arc::clone(&state),
        Arc::clone(&audio),
    ));

    // Audio pass on its own clock
    tokio::spawn(run_audio(Arc::clone(&audio), config.audio_hz));

    tokio::select! {
        _ = run_gameplay(state, config.tick_hz) => {}
        res = server => match res {
            Ok(Err(e)) => error!(error = %e, "websocket server stopped"),
            Err(e) => error!(error = %e, "websocket server task failed"),
            Ok(Ok(())) => {}
        },
        _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
    }

    Ok(())
}

/// Fixed-step gameplay tick: effect state machines + command flush.
async fn run_gameplay(state: Arc<Mutex<FxState>>, tick_hz: f32) {
    let dt = 1.0 / f64::from(tick_hz);
    let mut ticker = interval(Duration::from_secs_f64(dt));

    loop {
        ticker.tick().await;
        state.lock().await.step(dt);
    }
}

async fn run_audio(audio: Arc<Mutex<AudioState>>, audio_hz: f32) {
    let mut ticker = interval(Duration::from_secs_f64(1.0 / f64::from(audio_hz)));
    let start = Instant::now();

    loop {
        ticker.tick().await;
        let now = start.elapsed().as_secs_f64();
        audio.lock().await.mix(now);
    }
}
