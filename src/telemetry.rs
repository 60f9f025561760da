use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};
use tungstenite::{accept, Message};

pub type SharedReport = Arc<Mutex<Option<AxisReport>>>;

/// Latest aligned reading of both axes, sent to every client as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisReport {
    pub timestamp: String,
    pub x: i32,
    pub y: i32,
    pub calibrated: bool,
}

impl AxisReport {
    pub fn now(x: i32, y: i32, calibrated: bool) -> Self {
        AxisReport {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            x,
            y,
            calibrated,
        }
    }
}

pub fn publish(shared: &SharedReport, report: AxisReport) {
    let mut locked = shared.lock().unwrap();
    *locked = Some(report);
}

/// Accept WebSocket clients on `addr` and push the latest report to each of
/// them every `period`. Runs until the listener fails.
pub fn telemetry_thread(addr: &str, shared: SharedReport, period: Duration) {
    let server = match TcpListener::bind(addr) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to bind WebSocket server on {}: {}", addr, e);
            return;
        }
    };
    info!("WebSocket server listening on {}", addr);

    for stream in server.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                warn!("Connection error: {}", e);
                continue;
            }
        };

        let shared = Arc::clone(&shared);
        thread::spawn(move || serve_client(stream, shared, period));
    }
}

fn serve_client(stream: TcpStream, shared: SharedReport, period: Duration) {
    let mut websocket = match accept(stream) {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake error: {}", e);
            return;
        }
    };
    info!("New WebSocket client connected");

    loop {
        let report = shared.lock().unwrap().clone();

        if let Some(report) = report {
            match serde_json::to_string(&report) {
                Ok(json) => {
                    if websocket.send(Message::Text(json)).is_err() {
                        info!("WebSocket client disconnected");
                        break;
                    }
                }
                Err(e) => error!("JSON serialization error: {}", e),
            }
        }

        thread::sleep(period);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_flat() {
        let report = AxisReport {
            timestamp: String::from("2026-01-01T00:00:00.000Z"),
            x: 1500,
            y: 1000,
            calibrated: true,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(
            json,
            r#"{"timestamp":"2026-01-01T00:00:00.000Z","x":1500,"y":1000,"calibrated":true}"#
        );
    }

    #[test]
    fn publish_replaces_previous_report() {
        let shared: SharedReport = Arc::new(Mutex::new(None));
        publish(&shared, AxisReport::now(1, 2, false));
        publish(&shared, AxisReport::now(3, 4, true));

        let latest = shared.lock().unwrap().clone().unwrap();
        assert_eq!((latest.x, latest.y, latest.calibrated), (3, 4, true));
        assert!(latest.timestamp.ends_with('Z'));
    }

    #[test]
    fn client_receives_latest_report() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let shared: SharedReport = Arc::new(Mutex::new(None));
        publish(&shared, AxisReport::now(1234, 567, true));

        let server_shared = Arc::clone(&shared);
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            serve_client(stream, server_shared, Duration::from_millis(5));
        });

        let (mut socket, _) = tungstenite::connect(format!("ws://{}", addr)).unwrap();
        let message = socket.read().unwrap();
        let report: AxisReport = serde_json::from_str(message.to_text().unwrap()).unwrap();
        assert_eq!((report.x, report.y), (1234, 567));
    }
}
