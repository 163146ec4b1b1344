pub mod bodies;
pub mod grid;
pub mod plugin;
pub mod ui;
