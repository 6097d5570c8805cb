// Third-party 3D generation providers

mod meshy;

pub use meshy::{GeneratedModel, MeshyClient, POLL_BUDGET, POLL_INTERVAL};
