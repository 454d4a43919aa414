//! Entry point for the **hyprscroll** daemon.
//!
//! Spawns the command listener on a background thread and runs the switcher
//! on the main thread.  The main thread sleeps on the command channel until
//! either a command arrives or the earliest debounce/feedback deadline
//! passes.

use hyprscroll::command::{Action, Command};
use hyprscroll::config::Config;
use hyprscroll::hyprland::collection::HyprlandCollection;
use hyprscroll::ipc::listener::UnixSocketListener;
use hyprscroll::switcher::ScrollSwitcher;
use hyprscroll::trace::Traced;
use hyprscroll::traits::{CollectionProvider, CommandSource, FeedbackEvent};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Instant;

/// Default socket path for the command listener.
fn default_socket_path() -> String {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    format!("{}/hyprscroll.sock", runtime)
}

/// Resolve the config file (`$XDG_CONFIG_HOME/hyprscroll/config.json`).
fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("hyprscroll").join("config.json")
}

/// Load the config at startup, falling back to compiled-in defaults.
fn load_config(path: &Path) -> Config {
    match Config::load(path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let path = config_path();
    let config = load_config(&path);

    let provider = Traced::new(HyprlandCollection::new(), "hyprland");
    let mut switcher = ScrollSwitcher::new(provider, config);
    switcher.set_feedback(spawn_feedback_logger());
    for action in Action::ALL {
        if !switcher.is_bound(action) {
            info!("{}: disabled in config", action);
        }
    }

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    spawn_command_sources(cmd_tx);

    run_event_loop(switcher, cmd_rx, &path);
}

//  Event loop

fn run_event_loop<P: CollectionProvider>(
    mut switcher: ScrollSwitcher<P>,
    cmd_rx: mpsc::Receiver<Command>,
    config_path: &Path,
) {
    info!("hyprscroll running");
    loop {
        let received = match switcher.next_deadline() {
            Some(deadline) => {
                match cmd_rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(cmd) => Some(cmd),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match cmd_rx.recv() {
                Ok(cmd) => Some(cmd),
                Err(_) => break,
            },
        };

        match received {
            Some(Command::ReloadConfig) => match Config::load(config_path) {
                Ok(cfg) => {
                    info!("reloaded config from {}", config_path.display());
                    switcher.reload(cfg, Instant::now());
                }
                Err(e) => warn!("keeping current config: {}", e),
            },
            Some(cmd) => switcher.handle(cmd, Instant::now()),
            None => switcher.tick(Instant::now()),
        }
    }
    switcher.disable();
    info!("all command sources closed, exiting");
}

//  Helpers

fn spawn_command_sources(tx: mpsc::Sender<Command>) {
    let path = default_socket_path();
    std::thread::spawn(move || {
        let mut source = UnixSocketListener::new(&path);
        if let Err(e) = source.run(tx) {
            error!("socket listener error: {}", e);
        }
    });
}

/// No popup is drawn; feedback is only logged.
fn spawn_feedback_logger() -> mpsc::Sender<FeedbackEvent> {
    let (tx, rx) = mpsc::channel::<FeedbackEvent>();
    std::thread::spawn(move || {
        for event in rx {
            match event {
                FeedbackEvent::Show(p) => info!(
                    "{}: [{}/{}] (from {})",
                    p.action,
                    p.selected_index + 1,
                    p.size,
                    p.base_index + 1
                ),
                FeedbackEvent::Hide(action) => info!("{}: popup hidden", action),
            }
        }
    });
    tx
}
