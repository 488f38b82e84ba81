use std::collections::HashMap;
use std::sync::Arc;

use eg_core::{
    CancelToken, Classifier, EditableGraph, GraphDatabase, MatrixKind, SearchContext, SearchDriver,
    TieredSolver, check_stability, compute_spectrum, detect_topology, export_json,
    identify_family, materialize, parse_edge_list, try_canonical_hash,
};
use eg_store::{Config, Store};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::render;

const DEFAULT_RESULT_LIMIT: usize = 50;
const LAYOUT_RADIUS: f64 = 1.0;

#[derive(Clone)]
pub struct EgServer {
    state: Arc<Mutex<ServerState>>,
    tool_router: ToolRouter<Self>,
}

/// Database and durable store for one matrix kind.
struct KindSlot {
    db: GraphDatabase,
    store: Store,
}

impl KindSlot {
    fn open(store: Store, kind: MatrixKind) -> Self {
        let db = store.load_database(kind).unwrap_or_else(|e| {
            tracing::warn!(%kind, error = %e, "failed to load database, starting fresh");
            GraphDatabase::new(kind)
        });
        Self { db, store }
    }

    fn save(&self) {
        if let Err(e) = self.store.save_database(&self.db) {
            tracing::warn!(kind = %self.db.kind(), error = %e, "failed to persist database");
        }
    }
}

struct ServerState {
    skew: KindSlot,
    symmetric: KindSlot,
    classifier: Classifier<TieredSolver>,
    config: Config,
    /// Cancellation handles of searches still running.
    searches: HashMap<Uuid, CancelToken>,
}

impl ServerState {
    fn slot(&mut self, kind: MatrixKind) -> &mut KindSlot {
        match kind {
            MatrixKind::Skew => &mut self.skew,
            MatrixKind::Symmetric => &mut self.symmetric,
        }
    }
}

impl EgServer {
    pub fn new(skew: Store, symmetric: Store, config: Config) -> Self {
        let classifier = Classifier::new(TieredSolver::default(), config.classifier_config());
        Self {
            state: Arc::new(Mutex::new(ServerState {
                skew: KindSlot::open(skew, MatrixKind::Skew),
                symmetric: KindSlot::open(symmetric, MatrixKind::Symmetric),
                classifier,
                config,
                searches: HashMap::new(),
            })),
            tool_router: Self::tool_router(),
        }
    }
}

fn kind_param(kind: Option<&str>) -> Result<MatrixKind, McpError> {
    match kind {
        None => Ok(MatrixKind::Skew),
        Some(s) => MatrixKind::parse(s).ok_or_else(|| {
            McpError::invalid_params(format!("kind must be 'skew' or 'symmetric', got '{s}'"), None)
        }),
    }
}

fn json_result(value: &serde_json::Value) -> CallToolResult {
    CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(value).unwrap_or_default(),
    )])
}

// --- Tool parameter types ---

#[derive(Debug, Default, Deserialize, JsonSchema)]
struct SearchRequest {
    /// Number of vertices (at most 11)
    n: usize,
    /// "skew" (default) or "symmetric"
    kind: Option<String>,
    #[serde(default)]
    connected_only: bool,
    #[serde(default)]
    regular_only: bool,
    min_edges: Option<usize>,
    max_edges: Option<usize>,
    /// Stop after this many unique graphs
    max_unique_graphs: Option<usize>,
    /// Skip building smaller levels first
    #[serde(default)]
    no_incremental: bool,
    /// Graphs to include in the response (default 50)
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
struct CancelRequest {
    /// Search to cancel; every running search when omitted
    search_id: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ClassifyRequest {
    /// Number of vertices
    n: usize,
    /// Edge list such as "0-1,1-2,2-0"
    #[serde(default)]
    edges: String,
    /// "skew" (default) or "symmetric"
    kind: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct BoundsRequest {
    /// Number of vertices
    n: usize,
    /// Edge list such as "0-1,1-2,2-0"
    #[serde(default)]
    edges: String,
    /// Self-damping α (default 1)
    alpha: Option<f64>,
    /// Coupling β (default 1)
    beta: Option<f64>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
struct KindRequest {
    /// "skew" (default) or "symmetric"
    kind: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SeedRequest {
    /// Largest vertex count to seed
    max_n: usize,
    /// "skew" (default) or "symmetric"
    kind: Option<String>,
}

#[tool_router]
impl EgServer {
    #[tool(
        description = "Exhaustively enumerate graphs on n vertices (n <= 11) and return those whose skew-symmetric or symmetric adjacency spectrum has a closed form. Smaller levels are built first and every decision is stored, so repeated searches are fast. Runs in batches; eg_cancel stops it and partial results are returned."
    )]
    async fn eg_search(
        &self,
        Parameters(req): Parameters<SearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = kind_param(req.kind.as_deref())?;
        let search_id = Uuid::new_v4();
        let cancel = CancelToken::new();

        let (mut driver, batch) = {
            let mut state = self.state.lock().await;
            let mut options = state.config.search_options();
            options.connected_only = req.connected_only;
            options.regular_only = req.regular_only;
            options.min_edges = req.min_edges;
            options.max_edges = req.max_edges;
            if let Some(max) = req.max_unique_graphs {
                options.max_unique_graphs = max;
            }
            if req.no_incremental {
                options.build_incremental = false;
            }
            options.cancel = Some(cancel.clone());
            let driver = SearchDriver::new(req.n, options)
                .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
            state.searches.insert(search_id, cancel);
            (driver, state.config.search.batch_size.max(1))
        };
        tracing::info!(%search_id, n = req.n, %kind, "search started");

        loop {
            let more = {
                let mut state = self.state.lock().await;
                let ServerState {
                    skew,
                    symmetric,
                    classifier,
                    ..
                } = &mut *state;
                let slot = match kind {
                    MatrixKind::Skew => skew,
                    MatrixKind::Symmetric => symmetric,
                };
                let mut ctx = SearchContext::new(&mut slot.db, &*classifier, &mut slot.store);
                driver.step(&mut ctx, batch)
            };
            if !more {
                break;
            }
            // Lets eg_cancel and other tools in between batches.
            tokio::task::yield_now().await;
        }

        self.state.lock().await.searches.remove(&search_id);
        let result = driver.into_result(kind);
        let limit = req.limit.unwrap_or(DEFAULT_RESULT_LIMIT);
        let graphs: Vec<serde_json::Value> = result
            .graphs
            .iter()
            .take(limit)
            .map(|g| render::entry_json(g, result.polynomials.get(&g.hash)))
            .collect();

        Ok(json_result(&serde_json::json!({
            "search_id": search_id.to_string(),
            "n": result.n,
            "kind": result.kind,
            "cancelled": result.cancelled,
            "truncated": result.truncated,
            "total": result.graphs.len(),
            "graphs": graphs,
            "stats": result.stats,
        })))
    }

    #[tool(
        description = "Cancel a running eg_search by search_id, or every running search when no id is given. The search stops at its next batch boundary and returns partial results."
    )]
    async fn eg_cancel(
        &self,
        Parameters(req): Parameters<CancelRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let targets: Vec<(&Uuid, &CancelToken)> = match req.search_id.as_deref() {
            Some(id) => {
                let id = Uuid::parse_str(id).map_err(|e| {
                    McpError::invalid_params(format!("invalid search_id '{id}': {e}"), None)
                })?;
                state.searches.get_key_value(&id).into_iter().collect()
            }
            None => state.searches.iter().collect(),
        };
        for (_, token) in &targets {
            token.cancel();
        }
        let ids: Vec<String> = targets.iter().map(|(id, _)| id.to_string()).collect();
        Ok(json_result(&serde_json::json!({ "cancelled": ids })))
    }

    #[tool(
        description = "Classify one graph: canonical hash, family, whether its spectrum is analytic, and each eigenvalue's closed form. Stored graphs are answered from the database."
    )]
    async fn eg_classify(
        &self,
        Parameters(req): Parameters<ClassifyRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = kind_param(req.kind.as_deref())?;
        let graph = parse_edge_list(req.n, &req.edges)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        let hash = try_canonical_hash(&graph)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        let mut layout = EditableGraph::default();
        materialize(&mut layout, &graph, LAYOUT_RADIUS);

        let mut state = self.state.lock().await;
        let stored = state.slot(kind).db.entry(req.n, &hash).map(|e| e.classification());
        let (classification, source) = match stored {
            Some(c) => (c, "database"),
            None => (
                state
                    .classifier
                    .classify(&graph, kind)
                    .map_err(|e| McpError::internal_error(e.to_string(), None))?,
                "classifier",
            ),
        };

        Ok(json_result(&serde_json::json!({
            "hash": hash,
            "graph": graph.to_string(),
            "family": identify_family(&graph),
            "source": source,
            "analytic": classification.analytic,
            "method": classification.method,
            "reason": classification.reason,
            "spectrum": render::spectrum(&classification.eigenvalues),
            "eigenvalues": classification.eigenvalues,
            "layout": layout.positions,
        })))
    }

    #[tool(
        description = "Instant spectrum of the consensus dynamics x' = -alpha x + beta A x on a graph: exact eigenvalues for recognised topologies (path, cycle, star, complete, grid, ladder, hypercube, ...) and bounds otherwise, with a stability verdict. Does not touch the database."
    )]
    async fn eg_bounds(
        &self,
        Parameters(req): Parameters<BoundsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let alpha = req.alpha.unwrap_or(1.0);
        let beta = req.beta.unwrap_or(1.0);
        if !alpha.is_finite() || !beta.is_finite() {
            return Err(McpError::invalid_params(
                "alpha and beta must be finite".to_string(),
                None,
            ));
        }
        let graph = parse_edge_list(req.n, &req.edges)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        let topology = detect_topology(&graph);
        let spectrum = compute_spectrum(&topology, alpha, beta);
        let stability = check_stability(&spectrum);

        Ok(json_result(&serde_json::json!({
            "topology": topology.to_string(),
            "spectrum": spectrum,
            "stability": stability,
        })))
    }

    #[tool(description = "Database statistics per vertex count for one matrix kind.")]
    async fn eg_stats(
        &self,
        Parameters(req): Parameters<KindRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = kind_param(req.kind.as_deref())?;
        let mut state = self.state.lock().await;
        let running = state.searches.len();
        let slot = state.slot(kind);
        let mut stats = serde_json::json!(slot.db.stats());
        if let Ok(stored) = slot.store.stats() {
            stats["stored"] = serde_json::json!(stored);
        }
        stats["running_searches"] = serde_json::json!(running);
        Ok(json_result(&stats))
    }

    #[tool(
        description = "Classify and store the catalogued families (paths, cycles, stars, complete, wheels, grids, hypercubes, ...) up to max_n vertices."
    )]
    async fn eg_seed(
        &self,
        Parameters(req): Parameters<SeedRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = kind_param(req.kind.as_deref())?;
        if req.max_n > eg_core::MAX_SEARCH_N {
            return Err(McpError::invalid_params(
                format!("max_n must be at most {}", eg_core::MAX_SEARCH_N),
                None,
            ));
        }
        let mut state = self.state.lock().await;
        let ServerState {
            skew,
            symmetric,
            classifier,
            ..
        } = &mut *state;
        let slot = match kind {
            MatrixKind::Skew => skew,
            MatrixKind::Symmetric => symmetric,
        };
        let added = slot.db.seed_known_families(req.max_n, classifier);
        slot.save();

        Ok(json_result(&serde_json::json!({
            "kind": kind,
            "added": added,
            "seeded_up_to": slot.db.seeded_up_to(),
        })))
    }

    #[tool(description = "Export one matrix kind's database as versioned JSON.")]
    async fn eg_export(
        &self,
        Parameters(req): Parameters<KindRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind = kind_param(req.kind.as_deref())?;
        let mut state = self.state.lock().await;
        let json = export_json(&state.slot(kind).db)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_handler]
impl ServerHandler for EgServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Explorer for graphs whose adjacency spectra have closed forms.\n\n\
                 - eg_classify answers for one graph given as n and an edge list like \"0-1,1-2\".\n\
                 - eg_bounds gives the consensus-dynamics spectrum or its bounds instantly.\n\
                 - eg_search enumerates every graph on n vertices; large n can take minutes, \
                   use eg_cancel to stop it with partial results.\n\
                 - eg_seed, eg_stats and eg_export manage the stored database."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eg_core::{canonical_hash, families};

    fn make_server() -> EgServer {
        EgServer::new(
            Store::open_in_memory().unwrap(),
            Store::open_in_memory().unwrap(),
            Config::default(),
        )
    }

    fn text_from_result(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| match &c.raw {
                RawContent::Text(t) => Some(t.text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    fn parse_result(result: &CallToolResult) -> serde_json::Value {
        let text = text_from_result(result);
        serde_json::from_str(&text).expect("handler should return valid JSON")
    }

    #[tokio::test]
    async fn test_eg_search_small() {
        let server = make_server();
        let result = server
            .eg_search(Parameters(SearchRequest {
                n: 3,
                connected_only: true,
                ..Default::default()
            }))
            .await
            .unwrap();
        let json = parse_result(&result);
        assert_eq!(json["n"], 3);
        assert_eq!(json["kind"], "skew");
        assert_eq!(json["cancelled"], false);
        assert_eq!(json["total"], 2);
        assert_eq!(json["graphs"].as_array().unwrap().len(), 2);
        // P3 then K3 by edge count.
        assert_eq!(json["graphs"][0]["polynomial"], "x^3 + 2x");
        assert_eq!(json["graphs"][1]["polynomial"], "x^3 + 3x");
        assert_eq!(json["graphs"][0]["isomorphism_class_size"], 1);
        assert!(Uuid::parse_str(json["search_id"].as_str().unwrap()).is_ok());

        let state = server.state.lock().await;
        assert!(state.searches.is_empty());
        assert!(state.skew.store.stats().unwrap().entries > 0);
    }

    #[tokio::test]
    async fn test_eg_search_limit_and_kind() {
        let server = make_server();
        let json = parse_result(
            &server
                .eg_search(Parameters(SearchRequest {
                    n: 4,
                    kind: Some("symmetric".to_string()),
                    limit: Some(1),
                    ..Default::default()
                }))
                .await
                .unwrap(),
        );
        assert_eq!(json["kind"], "symmetric");
        assert_eq!(json["graphs"].as_array().unwrap().len(), 1);
        assert!(json["total"].as_u64().unwrap() > 1);
    }

    #[tokio::test]
    async fn test_eg_search_rejects_large_n() {
        let server = make_server();
        let result = server
            .eg_search(Parameters(SearchRequest {
                n: 12,
                ..Default::default()
            }))
            .await;
        assert!(result.is_err());
        assert!(server.state.lock().await.searches.is_empty());
    }

    #[tokio::test]
    async fn test_eg_cancel_without_searches() {
        let server = make_server();
        let json = parse_result(
            &server
                .eg_cancel(Parameters(CancelRequest::default()))
                .await
                .unwrap(),
        );
        assert_eq!(json["cancelled"].as_array().unwrap().len(), 0);

        let bad = server
            .eg_cancel(Parameters(CancelRequest {
                search_id: Some("not-a-uuid".to_string()),
            }))
            .await;
        assert!(bad.is_err());
    }

    #[tokio::test]
    async fn test_eg_cancel_running_search() {
        let server = make_server();
        let runner = server.clone();
        let handle = tokio::spawn(async move {
            runner
                .eg_search(Parameters(SearchRequest {
                    n: 7,
                    no_incremental: true,
                    ..Default::default()
                }))
                .await
        });

        // Wait until the search has registered itself.
        loop {
            if !server.state.lock().await.searches.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        let cancelled = parse_result(
            &server
                .eg_cancel(Parameters(CancelRequest::default()))
                .await
                .unwrap(),
        );
        assert_eq!(cancelled["cancelled"].as_array().unwrap().len(), 1);

        let json = parse_result(&handle.await.unwrap().unwrap());
        assert_eq!(json["cancelled"], true);
    }

    #[tokio::test]
    async fn test_eg_classify() {
        let server = make_server();
        let json = parse_result(
            &server
                .eg_classify(Parameters(ClassifyRequest {
                    n: 3,
                    edges: "0-1,1-2".to_string(),
                    kind: None,
                }))
                .await
                .unwrap(),
        );
        assert_eq!(json["analytic"], true);
        assert_eq!(json["source"], "classifier");
        assert_eq!(json["family"], "Path graph P_3");
        assert_eq!(json["hash"], canonical_hash(&families::path(3)).as_str());
        let layout = json["layout"].as_array().unwrap();
        assert_eq!(layout.len(), 3);
        assert_eq!(layout[0][0], 1.0);

        let bad = server
            .eg_classify(Parameters(ClassifyRequest {
                n: 2,
                edges: "0-5".to_string(),
                kind: None,
            }))
            .await;
        assert!(bad.is_err());
    }

    #[tokio::test]
    async fn test_eg_classify_rejects_oversized_graph() {
        let server = make_server();
        let result = server
            .eg_classify(Parameters(ClassifyRequest {
                n: 65,
                edges: "0-1".to_string(),
                kind: None,
            }))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_eg_classify_uses_database() {
        let server = make_server();
        server
            .eg_seed(Parameters(SeedRequest {
                max_n: 4,
                kind: None,
            }))
            .await
            .unwrap();
        let json = parse_result(
            &server
                .eg_classify(Parameters(ClassifyRequest {
                    n: 4,
                    edges: "0-1,0-2,0-3,1-2,1-3,2-3".to_string(),
                    kind: Some("skew".to_string()),
                }))
                .await
                .unwrap(),
        );
        assert_eq!(json["source"], "database");
        assert_eq!(json["method"], "algebraic");
    }

    #[tokio::test]
    async fn test_eg_bounds_cycle() {
        let server = make_server();
        let json = parse_result(
            &server
                .eg_bounds(Parameters(BoundsRequest {
                    n: 4,
                    edges: "0-1,1-2,2-3,3-0".to_string(),
                    alpha: Some(0.5),
                    beta: None,
                }))
                .await
                .unwrap(),
        );
        assert_eq!(json["topology"], "cycle on 4 vertices");
        assert_eq!(json["spectrum"]["exact_spectrum"], true);
        assert_eq!(json["stability"]["verdict"], "asymptotically_stable");
    }

    #[tokio::test]
    async fn test_eg_stats_and_export() {
        let server = make_server();
        server
            .eg_seed(Parameters(SeedRequest {
                max_n: 5,
                kind: Some("symmetric".to_string()),
            }))
            .await
            .unwrap();

        let stats = parse_result(
            &server
                .eg_stats(Parameters(KindRequest {
                    kind: Some("symmetric".to_string()),
                }))
                .await
                .unwrap(),
        );
        assert_eq!(stats["seeded_up_to"], 5);
        assert!(stats["total_entries"].as_u64().unwrap() > 0);
        assert_eq!(stats["stored"]["entries"], stats["total_entries"]);
        assert_eq!(stats["running_searches"], 0);

        let export = parse_result(
            &server
                .eg_export(Parameters(KindRequest {
                    kind: Some("symmetric".to_string()),
                }))
                .await
                .unwrap(),
        );
        assert_eq!(export["matrixKind"], "symmetric");
        assert_eq!(export["seededUpTo"], 5);
    }

    #[tokio::test]
    async fn test_invalid_kind() {
        let server = make_server();
        let result = server
            .eg_stats(Parameters(KindRequest {
                kind: Some("hermitian".to_string()),
            }))
            .await;
        assert!(result.is_err());
    }
}
