pub mod replica;
pub mod vector_clock;

pub use replica::ReplicaId;
pub use vector_clock::VectorClock;
