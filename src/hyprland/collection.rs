//! [`CollectionProvider`] implementation backed by Hyprland IPC.
//!
//! Communicates directly with Hyprland through its Unix socket at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`,
//! avoiding any shell command invocation or third-party crate for socket
//! discovery.
//!
//! Indices handed out by [`snapshot`](CollectionProvider::snapshot) are
//! positions in these lists:
//!
//! * workspaces: regular workspaces (id ≥ 1) sorted by id;
//! * windows: mapped, visible clients on the active workspace, in the
//!   order Hyprland lists them.

use crate::arbiter::CollectionSnapshot;
use crate::command::Action;
use crate::traits::CollectionProvider;
use log::{debug, warn};
use serde::Deserialize;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

/// Hyprland-backed collection provider.
///
/// All communication happens over Hyprland's IPC socket.  No child
/// processes are spawned and nothing is cached between calls.
#[derive(Debug, Default)]
pub struct HyprlandCollection;

/// Errors that can occur when talking to Hyprland.
#[derive(Debug, thiserror::Error)]
#[error("hyprland IPC error: {0}")]
pub struct HyprlandError(String);

impl HyprlandCollection {
    /// Create a new handle.
    ///
    /// No connection is opened eagerly; each method call opens short-lived
    /// IPC requests.
    pub fn new() -> Self {
        Self
    }

    fn workspace_ids(&self) -> Result<Vec<i64>, HyprlandError> {
        parse_workspaces(&ipc_json("workspaces")?)
    }

    fn active_workspace(&self) -> Result<i64, HyprlandError> {
        parse_active_workspace(&ipc_json("activeworkspace")?)
    }

    fn window_addresses(&self) -> Result<Vec<String>, HyprlandError> {
        let workspace = self.active_workspace()?;
        parse_clients(&ipc_json("clients")?, workspace)
    }
}

//  Direct Hyprland IPC helpers

/// Resolve the Hyprland command socket path.
fn socket_path() -> Result<PathBuf, HyprlandError> {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .map_err(|_| HyprlandError("XDG_RUNTIME_DIR not set".into()))?;
    let his = std::env::var("HYPRLAND_INSTANCE_SIGNATURE")
        .map_err(|_| HyprlandError("HYPRLAND_INSTANCE_SIGNATURE not set".into()))?;
    Ok(PathBuf::from(format!("{}/hypr/{}/.socket.sock", runtime_dir, his)))
}

/// Send a raw request and return the whole response.
fn ipc_request(request: &str) -> Result<String, HyprlandError> {
    let path = socket_path()?;
    let mut stream = UnixStream::connect(&path)
        .map_err(|e| HyprlandError(format!("connect to {}: {}", path.display(), e)))?;

    stream
        .write_all(request.as_bytes())
        .map_err(|e| HyprlandError(format!("write: {}", e)))?;

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .map_err(|e| HyprlandError(format!("read: {}", e)))?;

    String::from_utf8(response).map_err(|e| HyprlandError(format!("utf-8: {}", e)))
}

/// Send a JSON data query (`j/<query>`) and return the raw JSON string.
fn ipc_json(query: &str) -> Result<String, HyprlandError> {
    ipc_request(&format!("j/{}", query))
}

/// Send a dispatch and check for `"ok"`.
fn ipc_dispatch(args: &str) -> Result<(), HyprlandError> {
    debug!("dispatch {}", args);
    let response = ipc_request(&format!("/dispatch {}", args))?;
    if response.trim() == "ok" {
        Ok(())
    } else {
        Err(HyprlandError(format!("dispatch error: {}", response)))
    }
}

//  Minimal serde structs for the JSON we care about

/// Subset of a workspace object (`j/workspaces`, `j/activeworkspace`).
#[derive(Deserialize)]
struct WorkspaceJson {
    id: i64,
}

/// Subset of a client object (`j/clients`, `j/activewindow`).
#[derive(Deserialize)]
struct ClientJson {
    address: String,
    #[serde(default = "mapped_default")]
    mapped: bool,
    #[serde(default)]
    hidden: bool,
    workspace: WorkspaceJson,
}

fn mapped_default() -> bool {
    true
}

fn parse_err(e: serde_json::Error) -> HyprlandError {
    HyprlandError(format!("parse: {}", e))
}

/// Regular workspace ids, ascending.  Special workspaces have ids ≤ 0.
fn parse_workspaces(json: &str) -> Result<Vec<i64>, HyprlandError> {
    let workspaces: Vec<WorkspaceJson> = serde_json::from_str(json).map_err(parse_err)?;
    let mut ids: Vec<i64> = workspaces.into_iter().map(|w| w.id).filter(|&id| id >= 1).collect();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

fn parse_active_workspace(json: &str) -> Result<i64, HyprlandError> {
    let workspace: WorkspaceJson = serde_json::from_str(json).map_err(parse_err)?;
    Ok(workspace.id)
}

/// Addresses of the switchable windows on `workspace`.
fn parse_clients(json: &str, workspace: i64) -> Result<Vec<String>, HyprlandError> {
    let clients: Vec<ClientJson> = serde_json::from_str(json).map_err(parse_err)?;
    Ok(clients
        .into_iter()
        .filter(|c| c.mapped && !c.hidden && c.workspace.id == workspace)
        .map(|c| c.address)
        .collect())
}

/// Address of the focused window, if any.
fn parse_active_window(json: &str) -> Result<Option<String>, HyprlandError> {
    // Hyprland returns an empty object `{}` when no window is focused.
    if json.trim() == "{}" {
        return Ok(None);
    }
    let client: ClientJson = serde_json::from_str(json).map_err(parse_err)?;
    Ok(Some(client.address))
}

/// Position of `current` in `items`, or `0` when it is not listed (a
/// special workspace or an unmanaged window has focus).
fn position_of<T: PartialEq>(items: &[T], current: &T) -> usize {
    items.iter().position(|item| item == current).unwrap_or(0)
}

//  CollectionProvider implementation

impl CollectionProvider for HyprlandCollection {
    type Error = HyprlandError;

    fn snapshot(&self, action: Action) -> Result<CollectionSnapshot, Self::Error> {
        match action {
            Action::Workspaces => {
                let ids = self.workspace_ids()?;
                let active = self.active_workspace()?;
                Ok(CollectionSnapshot::new(ids.len(), position_of(&ids, &active)))
            }
            Action::Windows => {
                let addresses = self.window_addresses()?;
                let current = match parse_active_window(&ipc_json("activewindow")?)? {
                    Some(address) => position_of(&addresses, &address),
                    None => 0,
                };
                Ok(CollectionSnapshot::new(addresses.len(), current))
            }
        }
    }

    fn activate(&self, action: Action, index: usize) -> Result<(), Self::Error> {
        match action {
            Action::Workspaces => match self.workspace_ids()?.get(index) {
                Some(id) => ipc_dispatch(&format!("workspace {}", id)),
                None => {
                    warn!("workspace #{} disappeared before activation", index);
                    Ok(())
                }
            },
            Action::Windows => match self.window_addresses()?.get(index) {
                Some(address) => ipc_dispatch(&format!("focuswindow address:{}", address)),
                None => {
                    warn!("window #{} disappeared before activation", index);
                    Ok(())
                }
            },
        }
    }
}
