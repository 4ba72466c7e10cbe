//! Agent Card resolution with ordered path fallback

use tower::ServiceExt;
use tower_service::Service;
use tracing::{debug, info};

use crate::{
    protocol::{agent::AgentCard, error::A2AError, operation::A2AOperation},
    service::{A2ARequest, A2AResponse, RequestContext},
};

/// Resolves an agent's card by trying each well-known path in order
///
/// The first response that is a 200 with a parseable card wins. There are no
/// retries beyond the path list.
#[derive(Debug, Clone)]
pub struct CardResolver {
    paths: Vec<String>,
}

impl CardResolver {
    pub fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }

    /// Fetch the card of the agent at `context.agent_url`
    ///
    /// # Errors
    ///
    /// `A2AError::Discovery` carrying the last attempted URL and the reason
    /// that attempt failed.
    pub async fn resolve<S>(
        &self,
        service: &mut S,
        context: &RequestContext,
    ) -> Result<AgentCard, A2AError>
    where
        S: Service<A2ARequest, Response = A2AResponse, Error = A2AError>,
    {
        let mut last_failure = None;

        for path in &self.paths {
            let url = join_url(&context.agent_url, path);
            let operation = A2AOperation::DiscoverAgent { path: path.clone() };
            let request = A2ARequest::new(operation, context.clone());

            let outcome = match service.ready().await {
                Ok(ready) => ready.call(request).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(A2AResponse::AgentCard(card)) => {
                    info!(agent = %card.name, %url, "resolved agent card");
                    return Ok(*card);
                }
                Ok(other) => {
                    let err = A2AError::Protocol(format!("Expected agent card, got {:?}", other));
                    debug!(%url, error = %err, "discovery path failed");
                    last_failure = Some((url, err));
                }
                Err(err) => {
                    debug!(%url, error = %err, "discovery path failed");
                    last_failure = Some((url, err));
                }
            }
        }

        let (url, source) = last_failure.unwrap_or_else(|| {
            (
                context.agent_url.clone(),
                A2AError::Validation("No discovery paths configured".into()),
            )
        });

        Err(A2AError::Discovery {
            url,
            source: Box::new(source),
        })
    }
}

/// Join a base URL and an absolute path without doubling the slash
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use crate::{
        codec::JsonRpcCodec,
        protocol::agent::AgentCard,
        service::A2AProtocolService,
        transport::{mock::MockTransport, TransportResponse},
    };

    use super::*;

    fn default_resolver() -> CardResolver {
        CardResolver::new(vec![
            "/.well-known/agent-card.json".into(),
            "/.well-known/agent.json".into(),
        ])
    }

    #[tokio::test]
    async fn test_falls_back_to_legacy_path() {
        let transport = MockTransport::new(|req| {
            if req.endpoint == "/.well-known/agent.json" {
                let card = AgentCard::new("Legacy", "Old agent", "http://mock.agent", "0.1.0");
                TransportResponse::new(200).body(Bytes::from(serde_json::to_vec(&card).unwrap()))
            } else {
                TransportResponse::new(404)
            }
        });
        let mut service = A2AProtocolService::new(transport, Arc::new(JsonRpcCodec));

        let card = default_resolver()
            .resolve(&mut service, &RequestContext::new("http://mock.agent"))
            .await
            .unwrap();

        assert_eq!(card.name, "Legacy");
    }

    #[tokio::test]
    async fn test_reports_last_attempted_url() {
        let transport = MockTransport::new(|req| {
            if req.endpoint == "/.well-known/agent-card.json" {
                TransportResponse::new(500)
            } else {
                TransportResponse::new(200).body("{\"not\": \"a card\"}")
            }
        });
        let mut service = A2AProtocolService::new(transport, Arc::new(JsonRpcCodec));

        let err = default_resolver()
            .resolve(&mut service, &RequestContext::new("http://mock.agent/"))
            .await
            .unwrap_err();

        match err {
            A2AError::Discovery { url, source } => {
                assert_eq!(url, "http://mock.agent/.well-known/agent.json");
                assert!(matches!(*source, A2AError::Serialization(_)));
            }
            other => panic!("Expected Discovery error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_path_list() {
        let mut service = A2AProtocolService::new(MockTransport::ok(), Arc::new(JsonRpcCodec));

        let err = CardResolver::new(vec![])
            .resolve(&mut service, &RequestContext::new("http://mock.agent"))
            .await
            .unwrap_err();

        assert!(matches!(err, A2AError::Discovery { .. }));
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://a/", "/b"), "http://a/b");
        assert_eq!(join_url("http://a", "b"), "http://a/b");
    }
}
