pub mod args;
pub mod render;
pub mod settings;
