//! Versioned packet dispatch.
//!
//! Every opcode may have several candidate handlers, each serving a range of
//! client versions. The [`StrategyRegistry`] keeps, per opcode, the most
//! specific candidate supporting the active version; the [`VersionGate`]
//! keeps the registries in line with the version and with operator toggles;
//! the [`PacketDispatcher`] routes packets to whatever is effective.

pub mod descriptor;
pub mod dispatcher;
pub mod group;
pub mod handler;
pub mod registry;
pub mod specificity;
pub mod version_gate;

pub use descriptor::{HandlerDescriptor, HandlerId};
pub use dispatcher::{DispatchOutcome, PacketDispatcher};
pub use group::GroupDispatcher;
pub use handler::{HandlerConstructor, HandlerFactory, HandlerPool, PacketHandler, RegisteredHandler};
pub use registry::{ReconcileReport, Registration, Removal, StrategyRegistry};
pub use specificity::more_specific;
pub use version_gate::{ClientVersionObserver, VersionGate};
