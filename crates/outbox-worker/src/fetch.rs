//! Fetch strategies: what the worker answers for each intercepted request.

use outbox_core::constants::SYNC_TAG;
use outbox_core::errors::{OutboxResult, WorkerError};
use outbox_core::models::{CapturedResponse, MutationSpec, OutboundRequest, WorkerMessage};
use outbox_observability::{events, fetch_span};

use crate::router::RequestRoute;
use crate::worker::{Worker, WORKER_CONTEXT};

impl Worker {
    /// Answer one intercepted request.
    ///
    /// Only an active generation intercepts. Network failures are absorbed
    /// into cached, deferred, or offline responses; a store failure while
    /// deferring a write is returned as an error since the write was lost.
    pub fn handle_fetch(&self, request: &OutboundRequest) -> OutboxResult<CapturedResponse> {
        if !self.is_active() {
            return Err(WorkerError::NoActiveWorker.into());
        }
        let _span = fetch_span!(request.method, request.url).entered();
        let route = self.router.route(request);
        tracing::trace!(route = route.name(), "routed");

        match route {
            RequestRoute::Mutation => self.fetch_mutation(request),
            RequestRoute::CacheableApi => Ok(self.fetch_network_first(request)),
            RequestRoute::ApiPassthrough => self.fetch_passthrough(request),
            RequestRoute::StaticAsset => Ok(self.fetch_cache_first(request)),
        }
    }

    /// The live network, unless the worker already knows it is offline.
    fn try_network(&self, request: &OutboundRequest) -> Option<CapturedResponse> {
        if !self.services.connectivity.is_online() {
            return None;
        }
        match self.services.transport.send(request) {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "network failed");
                None
            }
        }
    }

    fn fetch_mutation(&self, request: &OutboundRequest) -> OutboxResult<CapturedResponse> {
        if let Some(response) = self.try_network(request) {
            return Ok(response);
        }
        let id = self.services.queue.append(&MutationSpec::from_request(request))?;
        events::mutation_queued(id, &request.method, &request.url, WORKER_CONTEXT);
        self.services.background_sync.register(SYNC_TAG);
        self.services.clients.broadcast(&WorkerMessage::MutationQueued {
            id,
            url: request.url.clone(),
            method: request.method.clone(),
        });
        Ok(CapturedResponse::deferred(id))
    }

    fn fetch_network_first(&self, request: &OutboundRequest) -> CapturedResponse {
        let namespace = self.config.api_cache_name();
        let key = request.cache_key();
        match self.try_network(request) {
            Some(response) => {
                if response.is_success() {
                    self.services.cache.refresh(&namespace, &key, &response);
                }
                response
            }
            None => match self.services.cache.lookup(&namespace, &key) {
                Some(entry) => {
                    events::served_from_cache(&request.url);
                    entry.to_response()
                }
                None => CapturedResponse::no_cached_data(),
            },
        }
    }

    fn fetch_passthrough(&self, request: &OutboundRequest) -> OutboxResult<CapturedResponse> {
        Ok(self.services.transport.send(request)?)
    }

    fn fetch_cache_first(&self, request: &OutboundRequest) -> CapturedResponse {
        let namespace = self.config.static_cache_name();
        let key = request.cache_key();
        if let Some(entry) = self.services.cache.lookup(&namespace, &key) {
            return entry.to_response();
        }
        if let Some(response) = self.try_network(request) {
            if response.is_success() && request.is_same_origin(&self.config.origin) {
                self.services.cache.refresh(&namespace, &key, &response);
            }
            return response;
        }
        if request.is_navigation() {
            let origin = self.config.origin.trim_end_matches('/');
            let offline_key = format!("GET {origin}{}", self.config.offline_page);
            if let Some(entry) = self.services.cache.lookup(&namespace, &offline_key) {
                events::served_from_cache(&request.url);
                return entry.to_response();
            }
        }
        CapturedResponse::offline()
    }
}
