pub mod action;
pub mod amount;
pub mod asset;
pub mod eth;
pub mod lending;
pub mod registry;
pub mod revert;
pub mod status;
