use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Timestamp, Uint128};

use crate::state::Listing;

#[cw_serde]
pub struct InstantiateMsg {
    /// native denom all payments are made in
    pub denom: String,
}

#[cw_serde]
pub enum ExecuteMsg {
    AddItem {
        collection: String,
        token_id: String,
        price: Uint128,
    },
    Buy {
        collection: String,
        token_id: String,
    },
    DelListing {
        collection: String,
        token_id: String,
    },
    AddEngAuction {
        collection: String,
        token_id: String,
        base_price: Uint128,
        start_at: Timestamp,
        end_at: Timestamp,
    },
    BidFor {
        collection: String,
        token_id: String,
    },
    End {
        collection: String,
        token_id: String,
    },
    AddDutchAuction {
        collection: String,
        token_id: String,
        start_price: Uint128,
        end_price: Uint128,
        start_at: Timestamp,
        end_at: Timestamp,
    },
    BuyFromDutch {
        collection: String,
        token_id: String,
    },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(FixedListingResponse)]
    GetFixedListing { collection: String, token_id: String },
    #[returns(EngAuctionListingResponse)]
    GetEngAuctionListing { collection: String, token_id: String },
    #[returns(HighestBidResponse)]
    GetHighestBid { collection: String, token_id: String },
    #[returns(DutchAuctionListingResponse)]
    GetDutchAuctionListing { collection: String, token_id: String },
    /// Current Dutch price; evaluated at `at` when given, the chain clock
    /// otherwise. The only query that accepts a caller-chosen timestamp.
    #[returns(Uint128)]
    DutchPrice {
        collection: String,
        token_id: String,
        at: Option<Timestamp>,
    },
    #[returns(Uint128)]
    BalanceOf { address: String },
    #[returns(u64)]
    GetListingCount {},
    #[returns(Vec<ListingRecord>)]
    GetAllListings {
        from_index: Option<u64>,
        limit: Option<u64>,
    },
}

/// Missing listings read back as all-zero responses, never as errors.
#[cw_serde]
#[derive(Default)]
pub struct FixedListingResponse {
    pub seller: Option<Addr>,
    pub price: Uint128,
}

#[cw_serde]
pub struct EngAuctionListingResponse {
    pub seller: Option<Addr>,
    pub base_price: Uint128,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
}

impl Default for EngAuctionListingResponse {
    fn default() -> Self {
        Self {
            seller: None,
            base_price: Uint128::zero(),
            start_at: Timestamp::from_seconds(0),
            end_at: Timestamp::from_seconds(0),
        }
    }
}

#[cw_serde]
#[derive(Default)]
pub struct HighestBidResponse {
    pub highest_bidder: Option<Addr>,
    pub highest_bid: Uint128,
}

#[cw_serde]
pub struct DutchAuctionListingResponse {
    pub seller: Option<Addr>,
    pub start_price: Uint128,
    pub end_price: Uint128,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub discount_rate: Uint128,
    /// seconds between start and end
    pub duration: u64,
}

impl Default for DutchAuctionListingResponse {
    fn default() -> Self {
        Self {
            seller: None,
            start_price: Uint128::zero(),
            end_price: Uint128::zero(),
            start_at: Timestamp::from_seconds(0),
            end_at: Timestamp::from_seconds(0),
            discount_rate: Uint128::zero(),
            duration: 0,
        }
    }
}

#[cw_serde]
pub struct ListingRecord {
    pub collection: Addr,
    pub token_id: String,
    pub listing: Listing,
}

#[cw_serde]
pub struct MigrateMsg {}
