use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;

use dashboard_logging::{dash_debug, dash_warn};
use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::CrawlApi;
use crate::{
    ApiError, BulkKind, EngineEvent, FailureKind, FetchPayload, FetchTarget, RequestId, UrlId,
};

enum EngineCommand {
    Fetch {
        request_id: RequestId,
        target: FetchTarget,
    },
    Cancel {
        request_id: RequestId,
    },
    Submit {
        correlation: u64,
        url: String,
    },
    Bulk {
        batch: u64,
        kind: BulkKind,
        ids: Vec<UrlId>,
    },
}

/// Runs API calls on a background tokio runtime and reports results as
/// [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(api: Arc<dyn CrawlApi>) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let mut in_flight: HashMap<RequestId, (CancellationToken, JoinHandle<()>)> =
                HashMap::new();
            while let Ok(command) = cmd_rx.recv() {
                in_flight.retain(|_, (_, handle)| !handle.is_finished());
                match command {
                    EngineCommand::Fetch { request_id, target } => {
                        let cancel = CancellationToken::new();
                        let handle = runtime.spawn(run_fetch(
                            api.clone(),
                            request_id,
                            target,
                            cancel.clone(),
                            event_tx.clone(),
                        ));
                        in_flight.insert(request_id, (cancel, handle));
                    }
                    EngineCommand::Cancel { request_id } => {
                        if let Some((cancel, _)) = in_flight.remove(&request_id) {
                            dash_debug!("cancelling request {}", request_id);
                            cancel.cancel();
                        }
                    }
                    EngineCommand::Submit { correlation, url } => {
                        let api = api.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let result = api.submit_url(&url).await;
                            if let Err(err) = &result {
                                dash_warn!("submit of {} failed: {}", url, err);
                            }
                            let _ = event_tx.send(EngineEvent::SubmitCompleted {
                                correlation,
                                result,
                            });
                        });
                    }
                    EngineCommand::Bulk { batch, kind, ids } => {
                        runtime.spawn(run_bulk(api.clone(), batch, kind, ids, event_tx.clone()));
                    }
                }
            }
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn fetch(&self, request_id: RequestId, target: FetchTarget) {
        let _ = self
            .cmd_tx
            .send(EngineCommand::Fetch { request_id, target });
    }

    /// Aborts a fetch; no event is reported for it.
    pub fn cancel(&self, request_id: RequestId) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { request_id });
    }

    pub fn submit(&self, correlation: u64, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Submit {
            correlation,
            url: url.into(),
        });
    }

    pub fn bulk(&self, batch: u64, kind: BulkKind, ids: Vec<UrlId>) {
        let _ = self.cmd_tx.send(EngineCommand::Bulk { batch, kind, ids });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks until the next event or until the engine thread is gone.
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn run_fetch(
    api: Arc<dyn CrawlApi>,
    request_id: RequestId,
    target: FetchTarget,
    cancel: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let call = async {
        match target {
            FetchTarget::Urls => api.list_urls().await.map(FetchPayload::Urls),
            FetchTarget::UrlDetail(id) => api.url_detail(id).await.map(FetchPayload::UrlDetail),
        }
    };
    let result = tokio::select! {
        _ = cancel.cancelled() => Err(ApiError::new(FailureKind::Cancelled, "request cancelled")),
        result = call => result,
    };
    if matches!(&result, Err(err) if err.kind == FailureKind::Cancelled) {
        return;
    }
    if let Err(err) = &result {
        dash_warn!("fetch {:?} failed: {}", target, err);
    }
    let _ = event_tx.send(EngineEvent::FetchCompleted {
        request_id,
        target,
        result,
    });
}

async fn run_bulk(
    api: Arc<dyn CrawlApi>,
    batch: u64,
    kind: BulkKind,
    ids: Vec<UrlId>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let calls = ids.iter().map(|&id| {
        let api = api.clone();
        async move {
            let result = match kind {
                BulkKind::Recrawl => api.recrawl(id).await.map(|_| ()),
                BulkKind::Delete => api.delete_url(id).await,
            };
            result.err().map(|err| (id, err))
        }
    });
    let failures: Vec<(UrlId, ApiError)> = join_all(calls).await.into_iter().flatten().collect();
    for (id, err) in &failures {
        dash_warn!("{:?} of url {} failed: {}", kind, id, err);
    }
    let _ = event_tx.send(EngineEvent::BulkCompleted {
        batch,
        kind,
        failures,
    });
}
