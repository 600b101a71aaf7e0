/*
 * Responsibility
 * - Router-level middleware (CORS enforcement, request id / tracing / limits)
 */
pub mod cors;
pub mod http;
