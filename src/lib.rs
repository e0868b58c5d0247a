pub mod contract;
mod error;
pub mod msg;
pub mod nft;
pub mod state;

pub use crate::error::ContractError;
