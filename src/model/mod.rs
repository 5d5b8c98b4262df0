//! Domain types and the ledger that owns them.

pub mod audit;
pub mod auth;
pub mod clock;
pub mod election;
pub mod factory;
pub mod gate;
pub mod identity;
pub mod ledger;
pub mod receipt;
