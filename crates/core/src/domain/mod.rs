pub mod contract;
pub mod inventory;
pub mod recommendation;
