//! Integration tests for the labrad-manager binary.
//!
//! These tests spawn the binary on auto-assigned ports and talk to it over
//! both surfaces: JSON-RPC over HTTP and the framed IPC transport.

use labrad_core::{Directory, DirectoryClient, ServerId};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;

/// Make an RPC call and return the full JSON-RPC payload.
async fn rpc_call_raw(port: u16, method: &str, params: Value) -> Result<Value, String> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://127.0.0.1:{}/rpc", port))
        .json(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    response.json::<Value>().await.map_err(|e| e.to_string())
}

/// Make an RPC call to the manager.
async fn rpc_call(port: u16, method: &str, params: Value) -> Result<Value, String> {
    let json = rpc_call_raw(port, method, params).await?;
    if let Some(error) = json.get("error") {
        return Err(error.to_string());
    }
    Ok(json.get("result").cloned().unwrap_or(Value::Null))
}

async fn check_health(port: u16) -> bool {
    let client = reqwest::Client::new();
    if let Ok(response) = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
    {
        if let Ok(json) = response.json::<Value>().await {
            return json.get("status").and_then(|v| v.as_str()) == Some("ok");
        }
    }
    false
}

async fn wait_for_server(port: u16, timeout_secs: u64) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_secs(timeout_secs) {
        if check_health(port).await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

struct ManagerHandle {
    child: tokio::process::Child,
    ipc_port: u16,
    http_port: u16,
    stdout_drain: Option<tokio::task::JoinHandle<()>>,
}

impl ManagerHandle {
    fn ipc_addr(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], self.ipc_port))
    }

    async fn stop(mut self) {
        if let Some(drain) = self.stdout_drain.take() {
            drain.abort();
        }
        let _ = self.child.kill().await;
        let _ = self.child.wait().await;
    }
}

impl Drop for ManagerHandle {
    fn drop(&mut self) {
        if let Some(drain) = self.stdout_drain.take() {
            drain.abort();
        }
        let _ = self.child.start_kill();
    }
}

fn parse_port(line: &str, prefix: &str) -> Result<Option<u16>, String> {
    match line.strip_prefix(prefix) {
        Some(value) => value
            .trim()
            .parse::<u16>()
            .map(Some)
            .map_err(|e| format!("invalid {prefix} value '{value}': {e}")),
        None => Ok(None),
    }
}

/// Start the manager binary and wait until `/health` is ready.
async fn start_manager() -> Result<ManagerHandle, String> {
    let binary = PathBuf::from(env!("CARGO_BIN_EXE_labrad-manager"));

    let mut child = tokio::process::Command::new(&binary)
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--ipc-port")
        .arg("0")
        .arg("--http-port")
        .arg("0")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("failed to spawn labrad-manager: {e}"))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| "failed to capture stdout".to_string())?;
    let mut lines = tokio::io::BufReader::new(stdout).lines();

    let mut ipc_port = None;
    let mut http_port = None;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
    while tokio::time::Instant::now() < deadline && (ipc_port.is_none() || http_port.is_none()) {
        match tokio::time::timeout(Duration::from_millis(250), lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                if let Some(port) = parse_port(&line, "IPC_PORT=")? {
                    ipc_port = Some(port);
                }
                if let Some(port) = parse_port(&line, "HTTP_PORT=")? {
                    http_port = Some(port);
                }
            }
            Ok(Ok(None)) => break,
            Ok(Err(err)) => return Err(format!("failed to read labrad-manager stdout: {err}")),
            Err(_) => continue,
        }
    }

    let ipc_port = ipc_port.ok_or_else(|| "IPC_PORT line not emitted".to_string())?;
    let http_port = http_port.ok_or_else(|| "HTTP_PORT line not emitted".to_string())?;
    if !wait_for_server(http_port, 15).await {
        return Err(format!("labrad-manager failed health check on port {http_port}"));
    }

    let stdout_drain =
        tokio::spawn(async move { while let Ok(Some(_)) = lines.next_line().await {} });

    Ok(ManagerHandle {
        child,
        ipc_port,
        http_port,
        stdout_drain: Some(stdout_drain),
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let manager = start_manager().await.unwrap();
    assert!(check_health(manager.http_port).await);
    manager.stop().await;
}

#[tokio::test]
async fn test_http_register_and_lookup() {
    let manager = start_manager().await.unwrap();
    let port = manager.http_port;

    let settings = json!([
        {"id": 10, "name": "read", "doc": "", "accepts": ["_"], "returns": ["v"], "notes": ""},
        {"id": 20, "name": "range", "doc": "", "accepts": ["v"], "returns": [], "notes": ""}
    ]);
    let id = rpc_call(port, "register_server", json!({"name": "Dmm", "settings": settings}))
        .await
        .unwrap();
    assert_eq!(id, json!(1));

    let ids = rpc_call(
        port,
        "lookup_settings",
        json!({"server": 1, "names": ["range", "read"]}),
    )
    .await
    .unwrap();
    assert_eq!(ids, json!([20, 10]));

    let info = rpc_call(port, "describe_server", json!({"server": 1}))
        .await
        .unwrap();
    assert_eq!(info["name"], "Dmm");
    assert_eq!(info["settings"][0]["accepts"], json!(["_"]));

    manager.stop().await;
}

#[tokio::test]
async fn test_http_errors_carry_codes() {
    let manager = start_manager().await.unwrap();

    let response = rpc_call_raw(manager.http_port, "lookup_server", json!({"name": "Nope"}))
        .await
        .unwrap();
    assert_eq!(response["error"]["code"], -32001);
    assert_eq!(response["id"], 1);

    let response = rpc_call_raw(manager.http_port, "no_such_method", json!({}))
        .await
        .unwrap();
    assert_eq!(response["error"]["code"], -32602);

    manager.stop().await;
}

#[tokio::test]
async fn test_ipc_and_http_share_one_registry() {
    let manager = start_manager().await.unwrap();

    rpc_call(manager.http_port, "register_server", json!({"name": "Shared"}))
        .await
        .unwrap();

    let client = DirectoryClient::connect(manager.ipc_addr()).await.unwrap();
    assert_eq!(client.lookup_server("Shared").await.unwrap(), ServerId(1));

    let listing = rpc_call(manager.http_port, "list_servers", json!({}))
        .await
        .unwrap();
    assert_eq!(listing, json!([{"id": 1, "name": "Shared"}]));

    manager.stop().await;
}
