use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, StdResult, Storage, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};

#[cw_serde]
pub struct Config {
    pub denom: String,
}

/// One asset has at most one entry here, whatever the sale mechanism.
/// `Sold` is the terminal tombstone left behind by a settled sale so that
/// a late call against it reports "already sold" instead of "not listed";
/// reads and re-listing both treat it as deleted.
#[cw_serde]
pub enum Listing {
    FixedSale(FixedSale),
    EnglishAuction(EnglishAuction),
    DutchAuction(DutchAuction),
    Sold {},
}

#[cw_serde]
pub struct FixedSale {
    pub seller: Addr,
    pub price: Uint128,
}

#[cw_serde]
pub struct EnglishAuction {
    pub seller: Addr,
    pub base_price: Uint128,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub highest_bidder: Option<Addr>,
    pub highest_bid: Uint128,
}

#[cw_serde]
pub struct DutchAuction {
    pub seller: Addr,
    pub start_price: Uint128,
    pub end_price: Uint128,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    /// price units shed per second, fixed at creation
    pub discount_rate: Uint128,
}

pub const CONFIG: Item<Config> = Item::new("config");
pub const LISTINGS: Map<(Addr, String), Listing> = Map::new("listings"); // (collection, token_id)
pub const BALANCES: Map<&Addr, Uint128> = Map::new("balances");
pub const LISTING_COUNTER: Item<u64> = Item::new("listing_counter");

/// Credit an address's withdrawable escrow balance. This is the only way
/// funds ever move toward a seller or an outbid bidder inside the contract.
pub fn credit(storage: &mut dyn Storage, addr: &Addr, amount: Uint128) -> StdResult<()> {
    BALANCES.update(storage, addr, |bal| -> StdResult<Uint128> {
        Ok(bal.unwrap_or_default().checked_add(amount)?)
    })?;
    Ok(())
}
