pub mod collision;
pub mod pipeline;
pub mod pool;
pub mod torus;
pub mod wator;

pub use collision::CollisionSim;
pub use pool::AgentPool;
pub use torus::Torus;
pub use wator::WatorSim;
