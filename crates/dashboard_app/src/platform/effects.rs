use std::sync::Arc;

use anyhow::Context;
use dashboard_client::{
    ApiError, BulkKind, CrawlApi, EngineEvent, EngineHandle, FetchPayload, FetchTarget,
    UrlDetailRecord, UrlRecord,
};
use dashboard_core::{
    BrokenLink, BulkAction, CorrelationId, CrawlStatus, Effect, Msg, QueryData, QueryKey,
    RequestFailure, RequestToken, RowId, UrlDetail, UrlEntry,
};
use dashboard_logging::{dash_debug, dash_info, dash_warn};

/// Bridges core effects to the request engine and engine events back to
/// messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(api: Arc<dyn CrawlApi>) -> anyhow::Result<Self> {
        let engine = EngineHandle::new(api).context("failed to start the request engine")?;
        Ok(Self { engine })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Fetch { token } => {
                    dash_debug!("Fetch {:?} generation={}", token.key, token.generation);
                    self.engine.fetch(token.generation, target_for(token.key));
                }
                Effect::CancelFetch { token } => {
                    dash_debug!("CancelFetch {:?} generation={}", token.key, token.generation);
                    self.engine.cancel(token.generation);
                }
                Effect::SubmitUrl { correlation, url } => {
                    dash_info!("SubmitUrl {} url={}", correlation, url);
                    self.engine.submit(correlation.0, url);
                }
                Effect::RunBulk { batch, action, ids } => {
                    dash_info!("RunBulk batch={} {:?} ids={:?}", batch, action, ids);
                    self.engine.bulk(batch, bulk_kind(action), ids);
                }
            }
        }
    }

    /// Collects every engine event that has arrived since the last call.
    pub fn drain(&self) -> Vec<Msg> {
        let mut inbox = Vec::new();
        while let Some(event) = self.engine.try_recv() {
            inbox.push(event_to_msg(event));
        }
        inbox
    }
}

fn target_for(key: QueryKey) -> FetchTarget {
    match key {
        QueryKey::Urls => FetchTarget::Urls,
        QueryKey::UrlDetail(id) => FetchTarget::UrlDetail(id),
    }
}

fn bulk_kind(action: BulkAction) -> BulkKind {
    match action {
        BulkAction::Recrawl => BulkKind::Recrawl,
        BulkAction::Delete => BulkKind::Delete,
    }
}

fn bulk_action(kind: BulkKind) -> BulkAction {
    match kind {
        BulkKind::Recrawl => BulkAction::Recrawl,
        BulkKind::Delete => BulkAction::Delete,
    }
}

pub(crate) fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::FetchCompleted {
            request_id,
            target,
            result,
        } => {
            let key = match target {
                FetchTarget::Urls => QueryKey::Urls,
                FetchTarget::UrlDetail(id) => QueryKey::UrlDetail(id),
            };
            Msg::FetchSettled {
                token: RequestToken {
                    key,
                    generation: request_id,
                },
                result: result.map(map_payload).map_err(map_failure),
            }
        }
        EngineEvent::SubmitCompleted {
            correlation,
            result,
        } => {
            if let Ok(accepted) = &result {
                dash_info!(
                    "Submission {} accepted: {}",
                    CorrelationId(correlation),
                    accepted.message.as_deref().unwrap_or("ok")
                );
            }
            Msg::SubmissionSettled {
                correlation: CorrelationId(correlation),
                result: result.map(|_| ()).map_err(map_failure),
            }
        }
        EngineEvent::BulkCompleted {
            batch,
            kind,
            failures,
        } => {
            if !failures.is_empty() {
                dash_warn!("Batch {} finished with {} failure(s)", batch, failures.len());
            }
            Msg::BulkSettled {
                batch,
                action: bulk_action(kind),
                failures: failures
                    .into_iter()
                    .map(|(id, err)| (id, map_failure(err)))
                    .collect(),
            }
        }
    }
}

fn map_payload(payload: FetchPayload) -> QueryData {
    match payload {
        FetchPayload::Urls(rows) => QueryData::Urls(rows.into_iter().map(map_entry).collect()),
        FetchPayload::UrlDetail(detail) => QueryData::UrlDetail(map_detail(detail)),
    }
}

fn map_entry(record: UrlRecord) -> UrlEntry {
    UrlEntry {
        id: RowId::Server(record.id),
        status: CrawlStatus::parse(&record.status),
        url: record.url,
        title: record.title,
        html_version: record.html_version,
        has_login: record.has_login,
        internal_links: record.internal_links,
        external_links: record.external_links,
        created_at: record.created_at,
        last_crawled: record.last_crawled,
    }
}

fn map_detail(record: UrlDetailRecord) -> UrlDetail {
    UrlDetail {
        title: record.title,
        html_version: record.html_version,
        internal_links: record.internal_links,
        external_links: record.external_links,
        headings: record.headings,
        broken_links: record
            .broken_links
            .into_iter()
            .map(|link| BrokenLink {
                url: link.url,
                status: link.status,
            })
            .collect(),
    }
}

fn map_failure(err: ApiError) -> RequestFailure {
    RequestFailure::new(err.status(), err.message)
}
