//! Application layer containing the economy's business logic.
//!
//! Each service owns one concern and talks to persistence only through the
//! domain ports. `EconomyEngine` wires them together and is the single entry
//! point used by the binary and the integration tests.

pub mod accounts;
pub mod accrual;
pub mod aggregator;
pub mod background;
pub mod counter;
pub mod engine;
pub mod equipment;
pub mod tap;
pub mod workers;
