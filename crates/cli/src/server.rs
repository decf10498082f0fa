//! HTTP front end on tiny_http
//!
//! Every request is read into a [`DispatchRequest`], dispatched, and the
//! [`DispatchResponse`] written back. The loop polls a shutdown flag between
//! requests.

use crate::dispatch::{DispatchRequest, DispatchResponse, Dispatcher};
use anyhow::{anyhow, Result};
use journal::Connector;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, info, warn};
use vault_core::Clock;

/// How long `recv` blocks before the shutdown flag is checked again, and
/// the pause after a failed `recv`
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Bind the listening socket
pub fn bind(addr: &str) -> Result<Server> {
    Server::http(addr).map_err(|e| anyhow!("bind http at {addr}: {e}"))
}

/// Serve requests until `shutdown` is set
pub fn run<C, K>(server: &Server, dispatcher: &Dispatcher<C, K>, shutdown: &AtomicBool) -> Result<()>
where
    C: Connector,
    K: Clock + Clone,
{
    info!(addr = ?server.server_addr(), "Listening");

    while !shutdown.load(Ordering::SeqCst) {
        let request = match server.recv_timeout(POLL_INTERVAL) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "http recv error");
                std::thread::sleep(POLL_INTERVAL);
                continue;
            }
        };
        handle(request, dispatcher);
    }

    info!("Server stopped");
    Ok(())
}

fn handle<C, K>(mut request: Request, dispatcher: &Dispatcher<C, K>)
where
    C: Connector,
    K: Clock + Clone,
{
    let dispatch_request = match read_request(&mut request) {
        Ok(dispatch_request) => dispatch_request,
        Err(e) => {
            warn!(error = %e, "Failed to read request body");
            if let Err(e) = request.respond(Response::empty(400)) {
                warn!(error = %e, "Failed to send response");
            }
            return;
        }
    };

    let response = dispatcher.dispatch(&dispatch_request);
    debug!(
        method = %dispatch_request.method,
        query = ?dispatch_request.query,
        status = response.status,
        "Handled request"
    );

    if let Err(e) = request.respond(into_response(response)) {
        warn!(error = %e, "Failed to send response");
    }
}

fn read_request(request: &mut Request) -> std::io::Result<DispatchRequest> {
    let method = request.method().as_str().to_string();
    let query = request
        .url()
        .split_once('?')
        .map(|(_, query)| query.to_string());
    let authorization = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Authorization"))
        .map(|h| h.value.as_str().to_string());

    let body = if *request.method() == Method::Put {
        let declared = request.body_length();
        let mut buf = Vec::new();
        request.as_reader().read_to_end(&mut buf)?;
        if declared.is_none() && buf.is_empty() {
            None
        } else {
            Some(buf)
        }
    } else {
        None
    };

    Ok(DispatchRequest {
        method,
        query,
        authorization,
        body,
    })
}

fn into_response(response: DispatchResponse) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut out = Response::from_data(response.body).with_status_code(response.status);
    for (name, value) in &response.headers {
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => out.add_header(header),
            Err(()) => warn!(header = %name, "Skipping invalid response header"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use journal::{Accounts, BackupPolicy, MemoryConnector};
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpStream;
    use std::sync::Arc;

    fn roundtrip(addr: &str, raw: &str) -> (u16, Vec<String>) {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(raw.as_bytes()).unwrap();
        let mut reader = BufReader::new(stream);

        let mut status_line = String::new();
        reader.read_line(&mut status_line).unwrap();
        let status = status_line.split_whitespace().nth(1).unwrap().parse().unwrap();

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end().to_string();
            if line.is_empty() {
                break;
            }
            headers.push(line);
        }
        (status, headers)
    }

    #[test]
    fn serves_dispatcher_over_http() {
        let server = bind("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap().to_string();
        let dispatcher = Dispatcher::new(
            MemoryConnector::new(Accounts::allow_any()),
            Arc::new(BackupPolicy::default()),
            "backup@example.org",
            "Test Realm",
        );
        let shutdown = Arc::new(AtomicBool::new(false));

        let (unauthorized, created, probed) = std::thread::scope(|scope| {
            let flag = Arc::clone(&shutdown);
            let server = &server;
            let dispatcher = &dispatcher;
            scope.spawn(move || run(server, dispatcher, &flag));

            let unauthorized = roundtrip(
                &addr,
                "GET /?/laptop HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n",
            );
            let created = roundtrip(
                &addr,
                "PUT /?/laptop HTTP/1.1\r\nHost: x\r\nAuthorization: Basic YTpi\r\nContent-Length: 4\r\nConnection: close\r\n\r\ndata",
            );
            let probed = roundtrip(
                &addr,
                "HEAD /?/laptop HTTP/1.1\r\nHost: x\r\nAuthorization: Basic YTpi\r\nConnection: close\r\n\r\n",
            );

            shutdown.store(true, Ordering::SeqCst);
            (unauthorized, created, probed)
        });

        assert_eq!(unauthorized.0, 401);
        assert!(unauthorized
            .1
            .iter()
            .any(|h| h.starts_with("WWW-Authenticate: Basic realm=\"Test Realm\"")));
        assert_eq!(created.0, 201);
        assert_eq!(probed.0, 200);
        assert!(probed.1.iter().any(|h| h.starts_with("Last-Modified:")));
        assert!(probed.1.iter().any(|h| h.starts_with("Cache-Control: no-cache")));
    }

    #[test]
    fn keeps_serving_after_truncated_upload() {
        let server = bind("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap().to_string();
        let dispatcher = Dispatcher::new(
            MemoryConnector::new(Accounts::allow_any()),
            Arc::new(BackupPolicy::default()),
            "backup@example.org",
            "Test Realm",
        );
        let shutdown = Arc::new(AtomicBool::new(false));

        let probed = std::thread::scope(|scope| {
            let flag = Arc::clone(&shutdown);
            let server = &server;
            let dispatcher = &dispatcher;
            scope.spawn(move || run(server, dispatcher, &flag));

            {
                let mut stream = TcpStream::connect(&addr).unwrap();
                stream
                    .write_all(b"PUT /?/other HTTP/1.1\r\nHost: x\r\nAuthorization: Basic YTpi\r\nContent-Length: 10\r\n\r\ndata")
                    .unwrap();
                stream.shutdown(std::net::Shutdown::Write).unwrap();
            }

            let probed = roundtrip(
                &addr,
                "HEAD /?/laptop HTTP/1.1\r\nHost: x\r\nAuthorization: Basic YTpi\r\nConnection: close\r\n\r\n",
            );

            shutdown.store(true, Ordering::SeqCst);
            probed
        });

        assert_eq!(probed.0, 404);
        assert!(probed.1.iter().any(|h| h.starts_with("Cache-Control: no-cache")));
    }
}
