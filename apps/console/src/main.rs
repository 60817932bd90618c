use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use shared::domain::OrientationSample;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::{wrappers::IntervalStream, StreamExt};
use tracing::{info, warn};
use wheel_core::clock::SystemClock;
use wheel_core::sensor::{SensorAccess, SensorGate, UnsupportedSensorGate};
use wheel_core::transport::WsTransport;
use wheel_core::{ControllerEvent, SocketConfig, WheelController};

mod config;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "console")]
struct Args {
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    channel: Option<String>,
    /// Total rotation span in degrees (bounds are ±span/2)
    #[arg(long)]
    span: Option<f64>,
    #[arg(long)]
    connect: bool,
    /// Answer sensor requests with a simulated orientation sweep
    #[arg(long)]
    simulate: bool,
    #[arg(long, default_value_t = 50.0)]
    sample_hz: f64,
}

// One-shot access outcome first, then samples for as long as the source runs.
enum SensorFeed {
    Access(SensorAccess),
    Sample(OrientationSample),
}

struct SimulatedSensorGate;

#[async_trait]
impl SensorGate for SimulatedSensorGate {
    async fn request_access(&self) -> SensorAccess {
        SensorAccess::Granted
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let mut settings = load_settings()?;
    if let Some(url) = args.url {
        settings.url = url;
    }
    if let Some(channel) = args.channel {
        settings.channel = channel;
    }
    if let Some(span) = args.span {
        settings.span_deg = span;
    }

    let (socket_tx, mut socket_rx) = mpsc::unbounded_channel();
    let mut controller = WheelController::new(
        SocketConfig::new(&settings.url, &settings.channel),
        settings.span_deg,
        Arc::new(WsTransport),
        Arc::new(SystemClock::new()),
        socket_tx,
    );
    let mut ui = controller.subscribe();

    let gate: Arc<dyn SensorGate> = if args.simulate {
        Arc::new(SimulatedSensorGate)
    } else {
        Arc::new(UnsupportedSensorGate)
    };
    let (feed_tx, mut feed_rx) = mpsc::unbounded_channel::<SensorFeed>();

    println!("wheel console; type 'help' for commands");
    controller.emit_snapshot();
    if args.connect {
        controller.connect();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut feeder_running = false;
    let mut last_readout = String::new();

    loop {
        tokio::select! {
            event = ui.recv() => match event {
                Ok(event) => render(&event, &mut last_readout),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "display stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            Some(event) = socket_rx.recv() => controller.handle_socket_event(event),
            Some(feed) = feed_rx.recv() => match feed {
                SensorFeed::Access(outcome) => {
                    controller.handle_sensor_access(outcome);
                    if outcome == SensorAccess::Granted && !feeder_running {
                        feeder_running = true;
                        spawn_feeder(args.sample_hz, feed_tx.clone());
                    }
                }
                SensorFeed::Sample(sample) => controller.handle_sample(sample),
            },
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !dispatch(line.trim(), &mut controller, &gate, &feed_tx) {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "stdin read failed");
                    break;
                }
            },
            _ = signal::ctrl_c() => {
                info!("interrupt; shutting down");
                break;
            },
        }
    }

    controller.shutdown();
    Ok(())
}

/// Returns false when the loop should exit.
fn dispatch(
    line: &str,
    controller: &mut WheelController,
    gate: &Arc<dyn SensorGate>,
    feed: &mpsc::UnboundedSender<SensorFeed>,
) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        None => {}
        Some("connect") => {
            let url = parts.next().map(str::to_string);
            let channel = parts.next().map(str::to_string);
            if url.is_some() || channel.is_some() {
                let current = controller.config().clone();
                controller.set_socket_config(
                    url.as_deref().unwrap_or(current.url()),
                    channel.as_deref().unwrap_or(current.channel().as_str()),
                );
            }
            controller.connect();
        }
        Some("disconnect") => controller.disconnect(),
        Some("pause") => controller.toggle_pause(),
        Some("recenter") => controller.recenter(),
        Some("span") => match parts.next().map(str::parse::<f64>) {
            Some(Ok(span)) => controller.set_span(span),
            _ => println!("usage: span <degrees>"),
        },
        Some("url") => match parts.next() {
            Some(url) => {
                let channel = controller.config().channel().as_str().to_string();
                controller.set_socket_config(url, &channel);
            }
            None => println!("usage: url <endpoint>"),
        },
        Some("channel") => match parts.next() {
            Some(channel) => {
                let url = controller.config().url().to_string();
                controller.set_socket_config(&url, channel);
            }
            None => println!("usage: channel <name>"),
        },
        Some("sensor") => {
            if controller.sensor_active() {
                println!("sensor already active");
            } else {
                let gate = Arc::clone(gate);
                let feed = feed.clone();
                tokio::spawn(async move {
                    let outcome = gate.request_access().await;
                    let _ = feed.send(SensorFeed::Access(outcome));
                });
            }
        }
        Some("status") => controller.emit_snapshot(),
        Some("help") => print_help(),
        Some("quit") | Some("exit") => return false,
        Some(other) => println!("unknown command '{other}'; type 'help'"),
    }
    true
}

fn render(event: &ControllerEvent, last_readout: &mut String) {
    match event {
        ControllerEvent::Rotation { readout, .. } => {
            // A live sweep repeats readouts; only print changes.
            if readout != last_readout {
                println!("rotation: {readout}");
                last_readout.clone_from(readout);
            }
        }
        ControllerEvent::Status { label, tone } => {
            println!("status: {label} [{}]", tone.as_str());
        }
        ControllerEvent::SocketNotice { text } => {
            if !text.is_empty() {
                println!("socket error: {text}");
            }
        }
        ControllerEvent::PauseControl { label, enabled } => {
            println!(
                "pause control: {label} ({})",
                if *enabled { "enabled" } else { "disabled" }
            );
        }
        ControllerEvent::SensorControl { label, enabled } => {
            println!(
                "sensor control: {label} ({})",
                if *enabled { "enabled" } else { "disabled" }
            );
        }
    }
}

fn spawn_feeder(sample_hz: f64, feed: mpsc::UnboundedSender<SensorFeed>) {
    let hz = if sample_hz.is_finite() {
        sample_hz.clamp(1.0, 200.0)
    } else {
        50.0
    };
    let period = Duration::from_secs_f64(1.0 / hz);
    tokio::spawn(async move {
        let mut ticks = IntervalStream::new(tokio::time::interval(period));
        let mut t = 0.0_f64;
        while ticks.next().await.is_some() {
            // Slow sinusoid around a fixed heading, wide enough to hit the clamp.
            let alpha = 180.0 + 120.0 * (t * std::f64::consts::TAU * 0.2).sin();
            t += period.as_secs_f64();
            let sample = OrientationSample {
                alpha: Some(alpha),
                absolute: true,
            };
            if feed.send(SensorFeed::Sample(sample)).is_err() {
                break;
            }
        }
    });
}

fn print_help() {
    println!("commands:");
    println!("  connect [url] [channel]  dial the endpoint, optionally updating it first");
    println!("  disconnect               close the live session");
    println!("  pause                    toggle publishing");
    println!("  recenter                 zero the rotation and re-anchor");
    println!("  span <degrees>           set the total rotation span");
    println!("  url <endpoint>           store a new endpoint without dialing");
    println!("  channel <name>           store a new channel tag");
    println!("  sensor                   request orientation sensor access");
    println!("  status                   reprint the full display state");
    println!("  quit                     close and exit");
}
