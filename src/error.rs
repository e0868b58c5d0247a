use cosmwasm_std::{DivideByZeroError, OverflowError, StdError, Uint128};
use cw_utils::PaymentError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Payment(#[from] PaymentError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("{0}")]
    DivideByZero(#[from] DivideByZeroError),

    #[error("Semver parsing error: {0}")]
    SemVer(String),

    #[error("Same asset can't be listed again")]
    DuplicateListing {},

    #[error("Only the owner of the asset can list it")]
    NotOwner {},

    #[error("The marketplace is not approved to transfer the asset")]
    NotApproved {},

    #[error("Only the seller can do this")]
    NotSeller {},

    #[error("Asset is not listed")]
    NotListed {},

    #[error("Asset is already sold")]
    AlreadySold {},

    #[error("Payment does not match the price {price}")]
    IncorrectPayment { price: Uint128 },

    #[error("New bid must be higher than the current highest bid {highest_bid}")]
    BidTooLow { highest_bid: Uint128 },

    #[error("Auction is still open")]
    AuctionOpen {},

    #[error("Auction has not started yet")]
    AuctionNotStarted {},

    #[error("Auction has already ended")]
    AuctionEnded {},

    #[error("Price must be greater than zero")]
    InvalidPrice {},

    #[error("Start price must be greater than end price")]
    InvalidPriceRange {},

    #[error("Start time must be before end time")]
    InvalidTimeWindow {},

    #[error("The reply ID is unrecognized")]
    UnrecognizedReply {},

    #[error("Cannot migrate from a different contract or a newer version")]
    CannotMigrate {},
}

impl From<semver::Error> for ContractError {
    fn from(err: semver::Error) -> Self {
        Self::SemVer(err.to_string())
    }
}
