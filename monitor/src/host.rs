use std::{io::ErrorKind, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use tokio::{
    net::TcpListener,
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tracing::{info, warn};

use roomsense_common::{
    DetectionMode, PresenceEngine, PresenceEvent, Regime, RuntimeConfig, TOPIC_CMD_LED,
    TOPIC_CMD_MODE, TOPIC_CMD_PRESENCE, TOPIC_MONITOR_STATE,
};

use crate::sensors::{SensorHub, SimulatedSensors};
use crate::telemetry::AmbientClient;

const MAX_MQTT_PAYLOAD_BYTES: usize = 512;

#[derive(Clone)]
struct AppState {
    engine: Arc<Mutex<PresenceEngine>>,
    mqtt: AsyncClient,
    telemetry: AmbientClient,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut runtime = load_runtime_config().await.unwrap_or_else(|err| {
        warn!("failed to load runtime config: {err:#}");
        RuntimeConfig::default()
    });
    runtime.sanitize();

    let engine = PresenceEngine::new(runtime.monitor.clone(), runtime.thermal.clone());
    let telemetry = AmbientClient::new(runtime.telemetry.clone())?;

    let mqtt_host = std::env::var("MQTT_HOST").unwrap_or(runtime.network.mqtt_host.clone());
    let mqtt_port = std::env::var("MQTT_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(runtime.network.mqtt_port);

    let mut mqtt_options = MqttOptions::new("roomsense-monitor", mqtt_host, mqtt_port);
    let mqtt_user = std::env::var("MQTT_USER").unwrap_or(runtime.network.mqtt_user.clone());
    let mqtt_pass = std::env::var("MQTT_PASS").unwrap_or(runtime.network.mqtt_pass.clone());
    if !mqtt_user.is_empty() {
        mqtt_options.set_credentials(mqtt_user, mqtt_pass);
    }

    let (mqtt, eventloop) = AsyncClient::new(mqtt_options, 64);

    let app_state = AppState {
        engine: Arc::new(Mutex::new(engine)),
        mqtt,
        telemetry,
    };

    subscribe_topics(&app_state.mqtt).await?;
    spawn_mqtt_loop(app_state.clone(), eventloop);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poll_loop = spawn_poll_loop(
        app_state.clone(),
        runtime.monitor.tick_interval_ms,
        shutdown_rx,
    );
    spawn_state_publish_loop(app_state.clone(), runtime.monitor.state_publish_interval_ms);

    let app = Router::new()
        .route("/api/status", get(handle_get_status))
        .route("/api/display", get(handle_get_display))
        .route("/api/presence/toggle", post(handle_toggle_presence))
        .route("/api/led/toggle", post(handle_toggle_led))
        .route("/api/mode/toggle", post(handle_toggle_mode))
        .with_state(app_state);

    let port = std::env::var("MONITOR_HTTP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("0.0.0.0:{port}").parse().unwrap();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind monitor server at {addr}"))?;

    info!("monitor listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // A tick already in progress runs to completion before we stop.
    let _ = shutdown_tx.send(true);
    let _ = poll_loop.await;
    info!("monitor stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("shutdown signal listener failed: {err}");
    }
}

async fn subscribe_topics(mqtt: &AsyncClient) -> anyhow::Result<()> {
    let topics = [TOPIC_CMD_PRESENCE, TOPIC_CMD_LED, TOPIC_CMD_MODE];

    for topic in topics {
        mqtt.subscribe(topic, QoS::AtMostOnce).await?;
    }
    Ok(())
}

fn spawn_mqtt_loop(app_state: AppState, mut eventloop: rumqttc::EventLoop) {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::Publish(message))) => {
                    handle_mqtt_message(&app_state, &message.topic, message.payload.len()).await;
                }
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("mqtt connected");
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("mqtt poll error: {err}");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });
}

/// Each command message is one discrete, edge-triggered input event; the
/// payload carries no information.
async fn handle_mqtt_message(app_state: &AppState, topic: &str, payload_len: usize) {
    if payload_len > MAX_MQTT_PAYLOAD_BYTES {
        warn!("dropping oversized MQTT payload on topic {topic} ({payload_len} bytes)");
        return;
    }

    let event = {
        let mut engine = app_state.engine.lock().await;
        match topic {
            TOPIC_CMD_PRESENCE => Some(engine.toggle_presence()),
            TOPIC_CMD_LED => Some(engine.toggle_led()),
            TOPIC_CMD_MODE => Some(engine.toggle_mode()),
            _ => None,
        }
    };

    if let Some(event) = event {
        log_event(event);
    }
}

/// The tick loop: acquire a sample, push it, and evaluate the remote window
/// when the regime's check interval has elapsed. Every failure along the way
/// is non-fatal; the engine keeps its previous state and the next due cycle
/// is the retry.
fn spawn_poll_loop(
    app_state: AppState,
    tick_interval_ms: u64,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut sensors = SimulatedSensors::new();
        let mut interval = tokio::time::interval(Duration::from_millis(tick_interval_ms));

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => break,
            }
            let now = Utc::now().timestamp();

            let sample = match sensors.acquire(now) {
                Ok(sample) => sample,
                Err(err) => {
                    warn!("{err}");
                    continue;
                }
            };

            {
                let mut engine = app_state.engine.lock().await;
                engine.update_sample(sample);
            }

            // Fire and forget; a slow store must not hold up the tick.
            let telemetry = app_state.telemetry.clone();
            tokio::spawn(async move {
                if let Err(err) = telemetry.push(&sample).await {
                    warn!("{err}");
                }
            });

            let evaluate = {
                let mut engine = app_state.engine.lock().await;
                if engine.remote_check_due(now) {
                    engine.begin_remote_check(now);
                    engine.detection_mode() == DetectionMode::Auto
                } else {
                    false
                }
            };
            if !evaluate {
                continue;
            }

            if let Some(event) = evaluate_remote(&app_state, now).await {
                log_event(event);
            }
        }
    })
}

async fn evaluate_remote(app_state: &AppState, now: i64) -> Option<PresenceEvent> {
    let (regime, window_span) = {
        let engine = app_state.engine.lock().await;
        (engine.regime(), engine.config.window_span_secs)
    };

    match regime {
        Regime::Demo => match app_state.telemetry.pull_latest().await {
            Ok(remote) => {
                let mut engine = app_state.engine.lock().await;
                engine.apply_demo_verdict(remote.as_ref())
            }
            Err(err) => {
                warn!("evaluation cycle skipped: {err}");
                None
            }
        },
        Regime::Prod => match app_state.telemetry.pull_window(now - window_span).await {
            Ok(window) => {
                let mut engine = app_state.engine.lock().await;
                engine.apply_window_verdict(&window, now)
            }
            Err(err) => {
                warn!("evaluation cycle skipped: {err}");
                None
            }
        },
    }
}

fn spawn_state_publish_loop(app_state: AppState, publish_interval_ms: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(publish_interval_ms));
        loop {
            interval.tick().await;

            let payload = {
                let engine = app_state.engine.lock().await;
                serde_json::to_vec(&engine.status())
            };

            match payload {
                Ok(body) => {
                    if let Err(err) = app_state
                        .mqtt
                        .publish(TOPIC_MONITOR_STATE, QoS::AtLeastOnce, true, body)
                        .await
                    {
                        warn!("monitor state publish failed: {err}");
                    }
                }
                Err(err) => warn!("monitor state serialization failed: {err}"),
            }
        }
    });
}

fn log_event(event: PresenceEvent) {
    match event {
        PresenceEvent::ManualPresence(occupancy) => {
            info!("manual presence now {}", occupancy.as_str());
        }
        PresenceEvent::AutoPresence(occupancy) => {
            info!("auto presence now {}", occupancy.as_str());
        }
        PresenceEvent::ModeChanged(mode) => {
            info!("detection mode switched to {}", mode.as_str());
        }
        PresenceEvent::LedToggled(on) => {
            info!("led turned {}", if on { "on" } else { "off" });
        }
    }
}

async fn handle_get_status(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.lock().await;
    Json(engine.status())
}

async fn handle_get_display(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.lock().await;
    Json(engine.display_frame())
}

async fn handle_toggle_presence(State(state): State<AppState>) -> impl IntoResponse {
    let event = {
        let mut engine = state.engine.lock().await;
        engine.toggle_presence()
    };
    log_event(event);
    handle_get_status(State(state)).await.into_response()
}

async fn handle_toggle_led(State(state): State<AppState>) -> impl IntoResponse {
    let event = {
        let mut engine = state.engine.lock().await;
        engine.toggle_led()
    };
    log_event(event);
    handle_get_status(State(state)).await.into_response()
}

async fn handle_toggle_mode(State(state): State<AppState>) -> impl IntoResponse {
    let event = {
        let mut engine = state.engine.lock().await;
        engine.toggle_mode()
    };
    log_event(event);
    handle_get_status(State(state)).await.into_response()
}

async fn load_runtime_config() -> anyhow::Result<RuntimeConfig> {
    let data_dir = std::env::var("ROOMSENSE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./.roomsense"));
    let path = data_dir.join("runtime.json");

    match tokio::fs::read(&path).await {
        Ok(raw) => Ok(serde_json::from_slice::<RuntimeConfig>(&raw)?),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(RuntimeConfig::default()),
        Err(err) => Err(err.into()),
    }
}
