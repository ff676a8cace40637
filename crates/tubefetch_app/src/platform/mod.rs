mod app;
mod args;
mod console;
mod controls;
mod settings;

pub use app::run_app;
