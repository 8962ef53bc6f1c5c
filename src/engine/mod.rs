// engine module — remote backend and the runtime that drives the core

mod bridge;
mod interface;
pub mod remote;
pub mod stub;

pub use bridge::{DeploymentsFetcher, ServicesFetcher, action_for};
pub use interface::{Backend, Engine, EngineHandle};
pub use remote::ApiEngine;
pub use stub::{StubBackend, StubEngine};
