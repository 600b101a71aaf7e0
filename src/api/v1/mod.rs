/*
 * Responsibility
 * - v1 public surface (routes() re-export)
 */
mod dto;
mod handlers;
mod routes;

pub use routes::routes;
