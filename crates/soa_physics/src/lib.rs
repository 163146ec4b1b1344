pub mod bodies;
pub mod forces;
pub mod merge;
pub mod spatial;

pub use bodies::Bodies;
