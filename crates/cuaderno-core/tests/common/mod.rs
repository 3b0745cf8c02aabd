//! Shared fixtures for integration tests

use std::sync::Arc;

use cuaderno_core::{DataService, ManualClock, MemoryStore};
use serde_json::{json, Value};

/// A small document: "Comida" (c1, empty), "Música" (c2, two items),
/// "Cumpleaños" (c3, one item).
pub fn sample_document() -> Value {
    json!({
        "version": 1,
        "createdAt": "2024-01-01T00:00:00.000Z",
        "updatedAt": "2024-01-10T00:00:00.000Z",
        "categories": [
            { "id": "c1", "emoji": "🍜", "name": "Comida", "items": [] },
            { "id": "c2", "emoji": "🎵", "name": "Música", "items": [
                { "id": "i1", "key": "Banda", "value": "Soda Stereo", "note": "",
                  "createdAt": "2024-01-02T00:00:00.000Z", "updatedAt": "2024-01-02T00:00:00.000Z" },
                { "id": "i2", "key": "Canción", "value": "De música ligera", "note": "la de siempre",
                  "createdAt": "2024-01-03T00:00:00.000Z", "updatedAt": "2024-01-08T00:00:00.000Z" }
            ]},
            { "id": "c3", "emoji": "🎂", "name": "Cumpleaños", "items": [
                { "id": "i3", "key": "Mamá", "value": "12 de marzo", "note": "comprar torta",
                  "createdAt": "2024-01-04T00:00:00.000Z", "updatedAt": "2024-01-04T00:00:00.000Z" }
            ]}
        ]
    })
}

/// A service over an in-memory store, with a manual clock that starts
/// after every timestamp in [`sample_document`].
#[allow(dead_code)]
pub fn memory_service(document: Option<Value>) -> (DataService, Arc<MemoryStore>) {
    let store = Arc::new(match document {
        Some(doc) => MemoryStore::with_document(doc.to_string()),
        None => MemoryStore::new(),
    });
    let service = DataService::new(store.clone()).with_clock(Arc::new(ManualClock::default()));
    (service, store)
}

/// Serve the same canned HTTP response to every connection on a local
/// port. Returns the base url (`http://127.0.0.1:<port>`).
#[allow(dead_code)]
pub async fn serve_canned(status: &'static str, body: &'static str) -> String {
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{}", addr)
}

/// Read headers and the declared body so the client sees a clean close.
#[allow(dead_code)]
async fn read_request(socket: &mut tokio::net::TcpStream) {
    use tokio::io::AsyncReadExt;

    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        data.extend_from_slice(&buf[..n]);

        if let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&data[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= end + 4 + length {
                return;
            }
        }
    }
}
