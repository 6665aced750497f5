use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use overlay_notify::config::Config;
use overlay_notify::error::{ConfigError, Error as OverlayError};
use overlay_notify::headless::HeadlessProvider;
use overlay_notify::telemetry::init_tracing;
use overlay_notify::{Dispatcher, Notice, NotificationRegistry, Result, SurfaceId, Target};
use tokio::signal;
use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{debug, info, warn};

use super::cli::Cli;

const DEFAULT_CONFIG: &str = "overlay.toml";
const WORKER_PACE: Duration = Duration::from_millis(400);

pub async fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.log_filter.as_deref(), cli.json_logs)?;

    let config_path = cli.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut config = Config::from_env_and_file(&config_path)?;
    if let Some(edge) = cli.edge {
        config.placement.default_edge = edge;
    }
    if cli.tick.is_zero() {
        return Err(OverlayError::from(ConfigError::InvalidField {
            field: "cli.tick",
            message: "tick period must be greater than zero".to_string(),
        }));
    }

    let provider = Rc::new(HeadlessProvider::new());
    let mut registry = NotificationRegistry::new(provider.clone(), &config);
    info!(edge = %registry.position(), config = %config_path.display(), "registry ready");

    let main_window = provider.open_window();
    let bare_window = provider.open_bare_window();
    provider.activate(main_window);

    registry.push_desktop("Saved")?;
    registry.push_active(Notice::warning("Low disk space"))?;
    match registry.push(bare_window, Notice::question("Reload settings?")) {
        Err(err) if err.is_recoverable() => {
            warn!(error = %err, "falling back to the desktop surface");
            registry.push_desktop(Notice::question("Reload settings?").centered(true))?;
        }
        other => {
            other?;
        }
    }

    let dispatcher = registry.dispatcher();
    let worker = tokio::task::spawn_blocking({
        let dispatcher = dispatcher.clone();
        move || simulate_worker(&dispatcher, main_window)
    });
    let ticker = tokio::spawn(drive_ticks(dispatcher.clone(), cli.tick));
    let stopper = tokio::spawn(stop_after(dispatcher, cli.duration));

    registry.run().await;

    for (name, task) in [("ticker", ticker), ("stopper", stopper)] {
        if let Err(err) = task.await {
            warn!(task = name, error = %err, "demo task terminated unexpectedly");
        }
    }
    match worker.await {
        Ok(sent) => debug!(sent, "worker finished"),
        Err(err) => warn!(error = %err, "worker terminated unexpectedly"),
    }

    report_state(&registry, main_window);
    Ok(())
}

/// Pushes progress messages from a background thread until the queue closes.
fn simulate_worker(dispatcher: &Dispatcher, surface: SurfaceId) -> usize {
    let mut sent = 0;
    for step in 1.. {
        let notice = if step % 5 == 0 {
            Notice::error(format!("Step {step} failed"))
        } else {
            Notice::info(format!("Step {step} done"))
        };
        if dispatcher.push(surface, notice).is_err() {
            break;
        }
        sent += 1;
        std::thread::sleep(WORKER_PACE);
    }
    sent
}

async fn drive_ticks(dispatcher: Dispatcher, period: Duration) {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        timer.tick().await;
        if dispatcher.tick().is_err() {
            break;
        }
    }
}

async fn stop_after(dispatcher: Dispatcher, duration: Duration) {
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("shutdown signal received, stopping demo");
        }
        () = sleep(duration) => {
            info!(?duration, "demo duration elapsed");
        }
    }
    dispatcher.close();
}

fn report_state(registry: &NotificationRegistry, main_window: SurfaceId) {
    for target in [Target::Desktop, Target::Surface(main_window)] {
        let Some(view) = registry.session(target).and_then(|s| s.view()) else {
            info!(scope = %target, "no view attached");
            continue;
        };
        let texts: Vec<&str> = view.entries().map(|e| e.text()).collect();
        info!(
            scope = %target,
            view = %view.id(),
            edge = %view.edge(),
            messages = ?texts,
            "final state"
        );
    }
}
