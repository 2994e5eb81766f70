mod app;
mod cli;
mod effects;
mod render;

pub use app::run_app;
