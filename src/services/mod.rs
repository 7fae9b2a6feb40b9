/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Participant play operations over the reconciliation protocol.
pub mod play_service;
/// The per-participant read-and-react poll tick.
pub mod poll_service;
/// The fetch-guard-compute-write reconciliation contract.
pub mod reconcile;
/// Session creation, joining, and listing.
pub mod session_service;
/// Storage backend supervision and degraded-mode handling.
pub mod storage_supervisor;
