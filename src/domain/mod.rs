//! Domain layer: economy entities, pure rules, and the persistence ports the
//! application layer is written against.

pub mod account;
pub mod catalog;
pub mod clothing;
pub mod ports;
pub mod principal;
pub mod worker;
