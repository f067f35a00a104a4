pub mod middleware;
pub mod models;
pub mod routes;
pub mod routes_ai;
pub mod routes_tts;
