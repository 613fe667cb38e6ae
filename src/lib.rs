mod routes;

pub mod app;
pub mod assets;
pub mod classification;
pub mod config;
pub mod controller;
pub mod inference;
pub mod preview;
pub mod server;
pub mod session;
pub mod telemetry;

pub use app::start_app;
