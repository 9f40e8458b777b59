//! Server entrypoint discovery for the edge route
//!
//! Candidates are tried in order. A candidate that fails to load, panics while
//! loading, or exports nothing usable is logged and skipped. The first usable
//! function is kept for the lifetime of the process.

use std::{future::Future, panic::AssertUnwindSafe, sync::Arc};

use futures_util::{future::BoxFuture, FutureExt};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::edge::ServerStart;
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct LoadError(String);

impl LoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn missing(name: &str) -> Self {
        Self(format!("module `{name}` is not bundled in this build"))
    }
}

/// The exports a candidate module offers.
#[derive(Clone, Default)]
pub struct ModuleExports {
    pub start_mcp_server: Option<Arc<dyn ServerStart>>,
    pub default: Option<Arc<dyn ServerStart>>,
}

impl ModuleExports {
    pub fn start_mcp_server(start: Arc<dyn ServerStart>) -> Self {
        Self {
            start_mcp_server: Some(start),
            default: None,
        }
    }

    pub fn default_export(start: Arc<dyn ServerStart>) -> Self {
        Self {
            start_mcp_server: None,
            default: Some(start),
        }
    }

    fn entry(self) -> Option<(Arc<dyn ServerStart>, &'static str)> {
        self.start_mcp_server
            .map(|start| (start, "start_mcp_server"))
            .or_else(|| self.default.map(|start| (start, "default")))
    }
}

type Loader = Box<dyn Fn() -> BoxFuture<'static, Result<ModuleExports, LoadError>> + Send + Sync>;

struct Candidate {
    name: String,
    loader: Loader,
}

#[derive(Default)]
pub struct EntrypointResolver {
    candidates: Vec<Candidate>,
    resolved: OnceCell<Arc<dyn ServerStart>>,
}

impl EntrypointResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidate<F, Fut>(mut self, name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ModuleExports, LoadError>> + Send + 'static,
    {
        self.candidates.push(Candidate {
            name: name.into(),
            loader: Box::new(move || loader().boxed()),
        });
        self
    }

    /// Candidates shipped with this crate: `index` exports the stateless HTTP
    /// adapter, `server` is reserved for alternate builds.
    pub fn bundled(state: AppState) -> Self {
        Self::new()
            .candidate("index", move || {
                let state = state.clone();
                async move { Ok::<_, LoadError>(ModuleExports::start_mcp_server(Arc::new(state))) }
            })
            .candidate("server", || async { Err::<ModuleExports, _>(LoadError::missing("server")) })
    }

    pub async fn resolve(&self) -> Result<Arc<dyn ServerStart>, AppError> {
        self.resolved
            .get_or_try_init(|| self.discover())
            .await
            .map(Arc::clone)
    }

    async fn discover(&self) -> Result<Arc<dyn ServerStart>, AppError> {
        for candidate in &self.candidates {
            let loaded = AssertUnwindSafe(async { (candidate.loader)().await })
                .catch_unwind()
                .await;

            let exports = match loaded {
                Ok(Ok(exports)) => exports,
                Ok(Err(err)) => {
                    warn!(candidate = %candidate.name, error = %err, "entrypoint candidate failed to load");
                    continue;
                }
                Err(_) => {
                    warn!(candidate = %candidate.name, "entrypoint candidate panicked while loading");
                    continue;
                }
            };

            match exports.entry() {
                Some((start, export)) => {
                    info!(candidate = %candidate.name, export, "server entrypoint resolved");
                    return Ok(start);
                }
                None => {
                    warn!(candidate = %candidate.name, "entrypoint candidate exports no server start function")
                }
            }
        }

        let names = self
            .candidates
            .iter()
            .map(|candidate| candidate.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Err(AppError::configuration(format!(
            "no server entrypoint found among candidates [{names}]; \
             export `start_mcp_server` or a default handler implementing ServerStart"
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::{body::Body, extract::Request, http};
    use serde_json::{json, Value};

    use super::*;
    use crate::edge::StartOutcome;
    use crate::registry::ToolCatalog;

    struct Named(&'static str);

    #[async_trait]
    impl ServerStart for Named {
        async fn start(&self, _request: Request) -> Result<StartOutcome, AppError> {
            Ok(StartOutcome::Json(json!({ "entry": self.0 })))
        }
    }

    fn named(name: &'static str) -> Arc<dyn ServerStart> {
        Arc::new(Named(name))
    }

    fn empty_request() -> Request {
        http::Request::builder()
            .uri("/api/mcp")
            .method("GET")
            .body(Body::empty())
            .expect("request build")
    }

    async fn entry_of(start: Arc<dyn ServerStart>) -> Value {
        match start.start(empty_request()).await {
            Ok(StartOutcome::Json(value)) => value["entry"].clone(),
            _ => panic!("expected json outcome"),
        }
    }

    #[tokio::test]
    async fn prefers_named_export_of_first_candidate() {
        let resolver = EntrypointResolver::new()
            .candidate("index", || async {
                Ok::<_, LoadError>(ModuleExports {
                    start_mcp_server: Some(named("index-named")),
                    default: Some(named("index-default")),
                })
            })
            .candidate("server", || async {
                Ok::<_, LoadError>(ModuleExports::start_mcp_server(named("server")))
            });

        let start = resolver.resolve().await.expect("resolves");
        assert_eq!(entry_of(start).await, "index-named");
    }

    #[tokio::test]
    async fn falls_back_to_default_export() {
        let resolver = EntrypointResolver::new().candidate("index", || async {
            Ok::<_, LoadError>(ModuleExports::default_export(named("index-default")))
        });

        let start = resolver.resolve().await.expect("resolves");
        assert_eq!(entry_of(start).await, "index-default");
    }

    #[tokio::test]
    async fn skips_failed_and_empty_candidates() {
        let resolver = EntrypointResolver::new()
            .candidate("index", || async { Err::<ModuleExports, _>(LoadError::new("syntax error")) })
            .candidate("empty", || async { Ok::<_, LoadError>(ModuleExports::default()) })
            .candidate("server", || async {
                Ok::<_, LoadError>(ModuleExports::start_mcp_server(named("server")))
            });

        let start = resolver.resolve().await.expect("resolves");
        assert_eq!(entry_of(start).await, "server");
    }

    #[tokio::test]
    async fn isolates_panicking_candidate() {
        let resolver = EntrypointResolver::new()
            .candidate("index", || async {
                if true {
                    panic!("module evaluation blew up");
                }
                Ok::<_, LoadError>(ModuleExports::default())
            })
            .candidate("server", || async {
                Ok::<_, LoadError>(ModuleExports::default_export(named("server")))
            });

        let start = resolver.resolve().await.expect("resolves");
        assert_eq!(entry_of(start).await, "server");
    }

    #[tokio::test]
    async fn reports_configuration_error_when_nothing_matches() {
        let resolver = EntrypointResolver::new()
            .candidate("index", || async { Err::<ModuleExports, _>(LoadError::missing("index")) })
            .candidate("server", || async { Ok::<_, LoadError>(ModuleExports::default()) });

        let error = resolver.resolve().await.err().expect("must fail");
        assert!(matches!(error, AppError::Configuration(_)));
        assert!(error.to_string().contains("[index, server]"));
        assert!(error.to_string().contains("start_mcp_server"));
    }

    #[tokio::test]
    async fn memoizes_success_but_retries_failure() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let resolver = EntrypointResolver::new().candidate("index", move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err::<ModuleExports, _>(LoadError::new("cold storage not ready"))
                } else {
                    Ok::<_, LoadError>(ModuleExports::start_mcp_server(named("index")))
                }
            }
        });

        assert!(resolver.resolve().await.is_err());
        assert!(resolver.resolve().await.is_ok());
        assert!(resolver.resolve().await.is_ok());
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn bundled_resolves_stateless_adapter() {
        let state = AppState::new(Arc::new(ToolCatalog::new()));
        let resolver = EntrypointResolver::bundled(state);

        let start = resolver.resolve().await.expect("bundled index resolves");
        match start.start(empty_request()).await {
            Ok(StartOutcome::Response(response)) => {
                assert_eq!(response.status(), http::StatusCode::OK)
            }
            _ => panic!("stateless adapter returns a finished response"),
        }
    }
}
