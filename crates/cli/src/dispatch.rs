//! Request dispatch
//!
//! Maps a transport-independent [`DispatchRequest`] to a [`DispatchResponse`].
//! The query string names the folder (`?/laptop/home`), Basic credentials
//! open the backend and the method picks the operation:
//!
//! | Method | Result |
//! |--------|--------|
//! | `HEAD` | 200 with `Last-Modified`, 404 when the folder is empty |
//! | `GET`  | 200 with the newest snapshot, 404 when the folder is empty |
//! | `PUT`  | 201 after storing the body and applying retention |
//!
//! Validation runs in a fixed order: missing query (400), malformed folder
//! (404), missing credentials (401). Any backend failure is a 500.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use journal::{BackupPolicy, BackupService, Connector, Credentials, MailboxStore};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use vault_core::consts::status;
use vault_core::timestamp::http_date;
use vault_core::{Clock, FolderPath, SystemClock, VaultError};

/// Incoming request, stripped of transport details
#[derive(Debug, Clone, Default)]
pub struct DispatchRequest {
    pub method: String,
    /// Raw query string, without the leading `?`
    pub query: Option<String>,
    /// Value of the `Authorization` header
    pub authorization: Option<String>,
    /// Request body; `None` when the client sent none
    pub body: Option<Vec<u8>>,
}

impl DispatchRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Attach Basic credentials
    pub fn basic_auth(mut self, username: &str, password: &str) -> Self {
        let token = STANDARD.encode(format!("{username}:{password}"));
        self.authorization = Some(format!("Basic {token}"));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Outgoing response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl DispatchResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// First header with this name, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Decode `Basic <base64(user:password)>`
pub fn parse_basic_auth(header: &str) -> Option<Credentials> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(token.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(Credentials::new(username, password))
}

/// Routes requests to the backup service of the addressed folder
pub struct Dispatcher<C, K = SystemClock> {
    connector: C,
    policy: Arc<BackupPolicy>,
    address: String,
    realm: String,
    clock: K,
}

impl<C: Connector> Dispatcher<C, SystemClock> {
    pub fn new(connector: C, policy: Arc<BackupPolicy>, address: impl Into<String>, realm: impl Into<String>) -> Self {
        Self::with_clock(connector, policy, address, realm, SystemClock)
    }
}

impl<C: Connector, K: Clock + Clone> Dispatcher<C, K> {
    pub fn with_clock(
        connector: C,
        policy: Arc<BackupPolicy>,
        address: impl Into<String>,
        realm: impl Into<String>,
        clock: K,
    ) -> Self {
        Self {
            connector,
            policy,
            address: address.into(),
            realm: realm.into(),
            clock,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn dispatch(&self, request: &DispatchRequest) -> DispatchResponse {
        // 1. Folder comes from the query string
        let Some(query) = request.query.as_deref().filter(|q| !q.is_empty()) else {
            warn!(method = %request.method, "No query string present (it should contain the folder name)");
            return DispatchResponse::new(status::BAD_REQUEST);
        };

        // 2. Validate folder
        let folder = match FolderPath::parse(query) {
            Ok(folder) => folder,
            Err(e) => {
                warn!(error = %e, "Rejected folder");
                return DispatchResponse::new(status::RESOURCE_NOT_FOUND);
            }
        };

        // 3. Credentials
        let Some(credentials) = request.authorization.as_deref().and_then(parse_basic_auth) else {
            debug!(%folder, "No credentials, requesting authentication");
            return DispatchResponse::new(status::UNAUTHORIZED)
                .with_header("WWW-Authenticate", format!("Basic realm=\"{}\"", self.realm));
        };

        // 4. Perform the operation
        let response = match self.perform(&folder, &credentials, request) {
            Ok(response) => response,
            Err(e) => {
                error!(
                    %folder,
                    method = %request.method,
                    kind = e.kind(),
                    error = %e,
                    "Request failed"
                );
                DispatchResponse::new(status::INTERNAL_ERROR)
            }
        };

        response
            .with_header("Cache-Control", "no-cache, no-store, must-revalidate")
            .with_header("Expires", "0")
    }

    fn perform(
        &self,
        folder: &FolderPath,
        credentials: &Credentials,
        request: &DispatchRequest,
    ) -> Result<DispatchResponse, VaultError> {
        let mailbox = self.connector.connect(folder, credentials)?;
        let service = BackupService::new(
            MailboxStore::new(mailbox, self.address.clone()),
            Arc::clone(&self.policy),
            self.clock.clone(),
        );

        match request.method.as_str() {
            "HEAD" => Ok(match service.probe()? {
                Some(timestamp) => DispatchResponse::new(status::SUCCESS)
                    .with_header("Last-Modified", http_date(timestamp)),
                None => DispatchResponse::new(status::RESOURCE_NOT_FOUND),
            }),
            "GET" => Ok(match service.read()? {
                Some(snapshot) => {
                    let content = snapshot.content().cloned().unwrap_or_default();
                    let mut response = DispatchResponse::new(status::SUCCESS)
                        .with_header("Last-Modified", http_date(snapshot.timestamp()))
                        .with_header("Content-Length", content.len().to_string())
                        .with_header("Content-Transfer-Encoding", "binary");
                    response.body = content.to_vec();
                    response
                }
                None => DispatchResponse::new(status::RESOURCE_NOT_FOUND),
            }),
            "PUT" => match &request.body {
                Some(body) => {
                    let report = service.write(body.clone())?;
                    info!(
                        %folder,
                        id = ?report.snapshot.id(),
                        size = body.len(),
                        removed = report.removed,
                        "Stored backup"
                    );
                    Ok(DispatchResponse::new(status::RESOURCE_CREATED))
                }
                None => {
                    warn!(%folder, "No content for PUT");
                    Ok(DispatchResponse::new(status::BAD_REQUEST))
                }
            },
            other => {
                warn!(%folder, method = other, "Unknown method");
                Ok(DispatchResponse::new(status::BAD_REQUEST))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use journal::{Accounts, MemoryConnector};
    use rstest::rstest;
    use vault_core::FixedClock;

    fn dispatcher() -> (Dispatcher<MemoryConnector, Arc<FixedClock>>, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap()));
        let connector = MemoryConnector::new(Accounts::from_pairs([("alice", "secret")]));
        let dispatcher = Dispatcher::with_clock(
            connector,
            Arc::new(BackupPolicy::default()),
            "backup@example.org",
            "Test Realm",
            Arc::clone(&clock),
        );
        (dispatcher, clock)
    }

    fn request(method: &str) -> DispatchRequest {
        DispatchRequest::new(method).query("/laptop").basic_auth("alice", "secret")
    }

    #[test]
    fn missing_query_is_bad_request() {
        let (dispatcher, _) = dispatcher();
        let response = dispatcher.dispatch(&DispatchRequest::new("GET").basic_auth("alice", "secret"));
        assert_eq!(response.status, 400);
        assert_eq!(dispatcher.dispatch(&DispatchRequest::new("GET").query("")).status, 400);
    }

    #[rstest]
    #[case("laptop")]
    #[case("/lap top")]
    #[case("/../etc")]
    #[case("/a.b")]
    fn malformed_folder_is_not_found(#[case] folder: &str) {
        let (dispatcher, _) = dispatcher();
        let response = dispatcher.dispatch(&DispatchRequest::new("GET").query(folder));
        assert_eq!(response.status, 404);
        assert!(response.header("Cache-Control").is_none());
    }

    #[test]
    fn missing_credentials_requests_basic_auth() {
        let (dispatcher, _) = dispatcher();
        let response = dispatcher.dispatch(&DispatchRequest::new("GET").query("/laptop"));
        assert_eq!(response.status, 401);
        assert_eq!(response.header("WWW-Authenticate"), Some("Basic realm=\"Test Realm\""));
    }

    #[test]
    fn wrong_password_is_server_error() {
        let (dispatcher, _) = dispatcher();
        let response = dispatcher.dispatch(&DispatchRequest::new("HEAD").query("/laptop").basic_auth("alice", "nope"));
        assert_eq!(response.status, 500);
        assert_eq!(response.header("Cache-Control"), Some("no-cache, no-store, must-revalidate"));
    }

    #[test]
    fn empty_folder_is_not_found() {
        let (dispatcher, _) = dispatcher();
        assert_eq!(dispatcher.dispatch(&request("HEAD")).status, 404);
        let response = dispatcher.dispatch(&request("GET"));
        assert_eq!(response.status, 404);
        assert_eq!(response.header("Expires"), Some("0"));
    }

    #[test]
    fn put_then_get_and_head() {
        let (dispatcher, clock) = dispatcher();
        let put = dispatcher.dispatch(&request("PUT").body(b"backup data".to_vec()));
        assert_eq!(put.status, 201);

        clock.advance(Duration::minutes(5));

        let head = dispatcher.dispatch(&request("HEAD"));
        assert_eq!(head.status, 200);
        assert_eq!(head.header("Last-Modified"), Some("Sun, 06 Nov 1994 08:49:37 GMT"));
        assert!(head.body.is_empty());

        let get = dispatcher.dispatch(&request("GET"));
        assert_eq!(get.status, 200);
        assert_eq!(get.body, b"backup data");
        assert_eq!(get.header("Content-Length"), Some("11"));
        assert_eq!(get.header("Content-Transfer-Encoding"), Some("binary"));
    }

    #[test]
    fn put_without_body_is_bad_request() {
        let (dispatcher, _) = dispatcher();
        assert_eq!(dispatcher.dispatch(&request("PUT")).status, 400);
    }

    #[test]
    fn empty_body_is_still_stored() {
        let (dispatcher, _) = dispatcher();
        assert_eq!(dispatcher.dispatch(&request("PUT").body(Vec::new())).status, 201);
        let get = dispatcher.dispatch(&request("GET"));
        assert_eq!(get.status, 200);
        assert!(get.body.is_empty());
    }

    #[rstest]
    #[case("POST")]
    #[case("DELETE")]
    #[case("get")]
    fn other_methods_are_bad_request(#[case] method: &str) {
        let (dispatcher, _) = dispatcher();
        assert_eq!(dispatcher.dispatch(&request(method)).status, 400);
    }

    #[test]
    fn backend_failure_is_server_error() {
        let (dispatcher, _) = dispatcher();
        let folder = FolderPath::parse("/laptop").unwrap();
        dispatcher.connector().mailbox(&folder).fail_summaries(true);

        let response = dispatcher.dispatch(&request("GET"));
        assert_eq!(response.status, 500);
        assert!(response.body.is_empty());
    }

    #[test]
    fn folders_do_not_share_snapshots() {
        let (dispatcher, _) = dispatcher();
        dispatcher.dispatch(&request("PUT").body(b"x".to_vec()));

        let other = DispatchRequest::new("GET").query("/desktop").basic_auth("alice", "secret");
        assert_eq!(dispatcher.dispatch(&other).status, 404);
    }

    #[rstest]
    #[case("Basic YWxpY2U6c2VjcmV0", Some(("alice", "secret")))]
    #[case("basic YWxpY2U6c2VjcmV0", Some(("alice", "secret")))]
    #[case("Basic YWxpY2U6", Some(("alice", "")))]
    #[case("Bearer YWxpY2U6c2VjcmV0", None)]
    #[case("Basic !!!", None)]
    #[case("Basic YWxpY2U=", None)]
    fn parses_basic_auth(#[case] header: &str, #[case] expected: Option<(&str, &str)>) {
        let expected = expected.map(|(u, p)| Credentials::new(u, p));
        assert_eq!(parse_basic_auth(header), expected);
    }
}
