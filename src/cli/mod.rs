pub mod app;
pub mod args;
