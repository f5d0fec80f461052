//! Download orchestration
//!
//! One engine-owned HTTP client, one spawned task per download. Launching is
//! non-blocking and failures are reported through the task's progress sink;
//! they never propagate back to the launcher, so batch callers keep
//! launching even when an earlier download fails.

use crate::error::FetchError;
use crate::progress::ProgressSink;
use crate::resolver::RedirectResolver;
use crate::stream::stream_to_file;
use modelfetch_types::{DownloadRequest, TransferOutcome, TransferProgress};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

/// Browser-like user agent the hosting API expects on download requests.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Build the shared HTTP client: automatic redirects disabled so the
/// resolver can read `Location` metadata, fixed user agent, bounded connect
/// and read timeouts.
pub(crate) fn build_client(
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Client, FetchError> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(connect_timeout)
        .read_timeout(read_timeout)
        .build()?)
}

/// Handle to one launched download.
///
/// Dropping the handle does not stop the task; `join` exists for callers
/// that want the outcome, such as tests and batch completion tracking.
#[derive(Debug)]
pub struct DownloadHandle {
    pub request_id: Uuid,
    pub url: String,
    join: JoinHandle<TransferOutcome>,
}

impl DownloadHandle {
    /// Wait for the download to finish and return its terminal outcome.
    pub async fn join(self) -> TransferOutcome {
        self.join.await.unwrap_or_else(|e| TransferOutcome::Failed {
            reason: format!("download task aborted: {e}"),
        })
    }
}

/// Runs downloads end to end: resolve, stream, report.
#[derive(Debug, Clone)]
pub struct DownloadEngine {
    client: Client,
}

impl DownloadEngine {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(connect_timeout, read_timeout)?,
        })
    }

    /// The engine's HTTP client, shared with collaborators that must use
    /// the same redirect and timeout policy.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// Launch one download on its own task and return immediately.
    ///
    /// The task owns the request, its progress state, and its file handle
    /// exclusively; concurrent launches share nothing but the client.
    pub fn launch(
        &self,
        request: DownloadRequest,
        sink: Box<dyn ProgressSink>,
    ) -> DownloadHandle {
        let request_id = request.id;
        let url = request.url.clone();
        let client = self.client.clone();

        let join = tokio::spawn(run_transfer(client, request, sink));

        DownloadHandle {
            request_id,
            url,
            join,
        }
    }
}

/// Drive one download to its terminal state, reporting through the sink.
async fn run_transfer(
    client: Client,
    request: DownloadRequest,
    mut sink: Box<dyn ProgressSink>,
) -> TransferOutcome {
    info!("Starting download {}: {}", request.id, request.url);

    match transfer(client, &request, sink.as_mut()).await {
        Ok((filename, elapsed)) => {
            sink.complete(&filename, elapsed);
            info!("Download {} completed: {}", request.id, filename);
            TransferOutcome::Completed { filename, elapsed }
        }
        Err(e) => {
            let reason = e.to_string();
            sink.fail(&reason);
            error!("Download {} failed: {}", request.id, reason);
            TransferOutcome::Failed { reason }
        }
    }
}

async fn transfer(
    client: Client,
    request: &DownloadRequest,
    sink: &mut dyn ProgressSink,
) -> Result<(String, Duration), FetchError> {
    let resolver = RedirectResolver::new(client);
    let (target, body) = resolver.resolve(&request.url, &request.token).await?;

    let total = target.total_size;
    let start = Instant::now();
    stream_to_file(body, &request.destination, &target.filename, |_, downloaded| {
        sink.update(&TransferProgress {
            downloaded,
            total,
            elapsed: start.elapsed(),
        });
    })
    .await?;

    Ok((target.filename, start.elapsed()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Clone, Default)]
    struct RecordingSink {
        updates: Arc<Mutex<Vec<TransferProgress>>>,
        completions: Arc<Mutex<Vec<String>>>,
        failures: Arc<Mutex<Vec<String>>>,
    }

    impl ProgressSink for RecordingSink {
        fn update(&mut self, progress: &TransferProgress) {
            self.updates.lock().unwrap().push(*progress);
        }

        fn complete(&mut self, filename: &str, _elapsed: Duration) {
            self.completions.lock().unwrap().push(filename.to_string());
        }

        fn fail(&mut self, reason: &str) {
            self.failures.lock().unwrap().push(reason.to_string());
        }
    }

    fn engine() -> DownloadEngine {
        DownloadEngine::new(Duration::from_secs(5), Duration::from_secs(5)).unwrap()
    }

    async fn mount_download(server: &MockServer, route: &str, filename: &str, body: Vec<u8>) {
        let final_location = format!("{}/cdn/{}", server.uri(), filename);
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", final_location.as_str()))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/cdn/{filename}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn successful_transfer_reports_and_completes() {
        let server = MockServer::start().await;
        let body: Vec<u8> = (0..4096u32).map(|i| (i % 256) as u8).collect();
        mount_download(&server, "/dl/1", "one.safetensors", body.clone()).await;

        let sink = RecordingSink::default();
        let dir = tempfile::tempdir().unwrap();
        let request = DownloadRequest::new(
            format!("{}/dl/1", server.uri()),
            dir.path().to_path_buf(),
            "token".to_string(),
        );

        let outcome = engine().launch(request, Box::new(sink.clone())).join().await;

        match outcome {
            TransferOutcome::Completed { ref filename, .. } => {
                assert_eq!(filename, "one.safetensors")
            }
            TransferOutcome::Failed { ref reason } => panic!("unexpected failure: {reason}"),
        }

        let updates = sink.updates.lock().unwrap();
        assert!(!updates.is_empty());
        assert!(updates.windows(2).all(|w| w[0].downloaded <= w[1].downloaded));
        let last = updates.last().unwrap();
        assert_eq!(last.downloaded, body.len() as u64);
        assert_eq!(last.total, Some(body.len() as u64));

        assert_eq!(sink.completions.lock().unwrap().len(), 1);
        assert!(sink.failures.lock().unwrap().is_empty());

        let on_disk = std::fs::read(dir.path().join("one.safetensors")).unwrap();
        assert_eq!(on_disk, body);
    }

    #[tokio::test]
    async fn failed_resolution_reports_fail_and_creates_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dl/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let sink = RecordingSink::default();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        let request = DownloadRequest::new(
            format!("{}/dl/missing", server.uri()),
            dest.clone(),
            "token".to_string(),
        );

        let outcome = engine().launch(request, Box::new(sink.clone())).join().await;

        assert!(!outcome.is_completed());
        assert_eq!(sink.failures.lock().unwrap().len(), 1);
        assert!(sink.completions.lock().unwrap().is_empty());
        // Resolution never succeeded, so nothing was created on disk.
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn concurrent_launches_do_not_interfere() {
        let server = MockServer::start().await;
        let body_a = vec![0xAAu8; 50_000];
        let body_b = vec![0xBBu8; 90_000];
        mount_download(&server, "/dl/a", "a.bin", body_a.clone()).await;
        mount_download(&server, "/dl/b", "b.bin", body_b.clone()).await;

        let dir = tempfile::tempdir().unwrap();
        let engine = engine();

        let handle_a = engine.launch(
            DownloadRequest::new(
                format!("{}/dl/a", server.uri()),
                dir.path().to_path_buf(),
                "token".to_string(),
            ),
            Box::new(RecordingSink::default()),
        );
        let handle_b = engine.launch(
            DownloadRequest::new(
                format!("{}/dl/b", server.uri()),
                dir.path().to_path_buf(),
                "token".to_string(),
            ),
            Box::new(RecordingSink::default()),
        );

        let (outcome_a, outcome_b) = tokio::join!(handle_a.join(), handle_b.join());
        assert!(outcome_a.is_completed());
        assert!(outcome_b.is_completed());

        assert_eq!(std::fs::read(dir.path().join("a.bin")).unwrap(), body_a);
        assert_eq!(std::fs::read(dir.path().join("b.bin")).unwrap(), body_b);
    }

    #[tokio::test]
    async fn sends_bearer_token_and_user_agent() {
        let server = MockServer::start().await;
        let final_location = format!("{}/cdn/auth.bin", server.uri());
        Mock::given(method("GET"))
            .and(path("/dl/auth"))
            .and(header("Authorization", "Bearer secret-token"))
            .and(header("User-Agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", final_location.as_str()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cdn/auth.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let request = DownloadRequest::new(
            format!("{}/dl/auth", server.uri()),
            dir.path().to_path_buf(),
            "secret-token".to_string(),
        );

        let outcome = engine()
            .launch(request, Box::new(RecordingSink::default()))
            .join()
            .await;
        assert!(outcome.is_completed());
    }
}
