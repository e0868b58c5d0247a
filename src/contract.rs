#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    to_json_binary, Addr, Binary, Deps, DepsMut, Env, MessageInfo, Order, Reply, Response,
    StdResult, Storage, Timestamp, Uint128,
};
use cw2::{get_contract_version, set_contract_version};
use cw_utils::{must_pay, nonpayable};
use semver::Version;

use crate::error::ContractError;
use crate::msg::{
    DutchAuctionListingResponse, EngAuctionListingResponse, ExecuteMsg, FixedListingResponse,
    HighestBidResponse, InstantiateMsg, ListingRecord, MigrateMsg, QueryMsg,
};
use crate::nft::{self, TRANSFER_REPLY};
use crate::state::{
    credit, Config, DutchAuction, EnglishAuction, FixedSale, Listing, BALANCES, CONFIG,
    LISTINGS, LISTING_COUNTER,
};

pub const CONTRACT_NAME: &str = "tri-listing-marketplace";
pub const CONTRACT_VERSION: &str = "0.1.0";

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let config = Config { denom: msg.denom };
    CONFIG.save(deps.storage, &config)?;
    LISTING_COUNTER.save(deps.storage, &0u64)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("denom", config.denom))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::AddItem {
            collection,
            token_id,
            price,
        } => execute_add_item(deps, env, info, collection, token_id, price),
        ExecuteMsg::Buy {
            collection,
            token_id,
        } => execute_buy(deps, info, collection, token_id),
        ExecuteMsg::DelListing {
            collection,
            token_id,
        } => execute_del_listing(deps, info, collection, token_id),
        ExecuteMsg::AddEngAuction {
            collection,
            token_id,
            base_price,
            start_at,
            end_at,
        } => execute_add_eng_auction(
            deps, env, info, collection, token_id, base_price, start_at, end_at,
        ),
        ExecuteMsg::BidFor {
            collection,
            token_id,
        } => execute_bid_for(deps, env, info, collection, token_id),
        ExecuteMsg::End {
            collection,
            token_id,
        } => execute_end(deps, env, info, collection, token_id),
        ExecuteMsg::AddDutchAuction {
            collection,
            token_id,
            start_price,
            end_price,
            start_at,
            end_at,
        } => execute_add_dutch_auction(
            deps, env, info, collection, token_id, start_price, end_price, start_at, end_at,
        ),
        ExecuteMsg::BuyFromDutch {
            collection,
            token_id,
        } => execute_buy_from_dutch(deps, env, info, collection, token_id),
    }
}

/// Registry duplicate check: a sold tombstone counts as deleted, any live
/// variant blocks relisting.
fn ensure_unlisted(storage: &dyn Storage, key: (Addr, String)) -> Result<(), ContractError> {
    match LISTINGS.may_load(storage, key)? {
        None | Some(Listing::Sold {}) => Ok(()),
        Some(_) => Err(ContractError::DuplicateListing {}),
    }
}

/// Load a listing that is still in play. Absence and settled tombstones are
/// reported apart so a late buyer learns the asset was sold, not unlisted.
fn load_active(storage: &dyn Storage, key: (Addr, String)) -> Result<Listing, ContractError> {
    match LISTINGS.may_load(storage, key)? {
        None => Err(ContractError::NotListed {}),
        Some(Listing::Sold {}) => Err(ContractError::AlreadySold {}),
        Some(listing) => Ok(listing),
    }
}

fn counter_add(storage: &mut dyn Storage) -> StdResult<()> {
    LISTING_COUNTER.update(storage, |count| -> StdResult<u64> {
        Ok(count.saturating_add(1))
    })?;
    Ok(())
}

fn counter_sub(storage: &mut dyn Storage) -> StdResult<()> {
    LISTING_COUNTER.update(storage, |count| -> StdResult<u64> {
        Ok(count.saturating_sub(1))
    })?;
    Ok(())
}

/// Quoted Dutch price at `at`: exact start_price/end_price at the window
/// bounds, linear decay in between, never below end_price.
fn dutch_price_at(auction: &DutchAuction, at: Timestamp) -> StdResult<Uint128> {
    if at <= auction.start_at {
        return Ok(auction.start_price);
    }
    if at >= auction.end_at {
        return Ok(auction.end_price);
    }

    let elapsed = Uint128::from(at.seconds() - auction.start_at.seconds());
    let discount = auction.discount_rate.checked_mul(elapsed)?;
    let price = auction
        .start_price
        .checked_sub(discount)
        .unwrap_or(auction.end_price);

    Ok(price.max(auction.end_price))
}

pub fn execute_add_item(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    collection: String,
    token_id: String,
    price: Uint128,
) -> Result<Response, ContractError> {
    nonpayable(&info)?;

    if price.is_zero() {
        return Err(ContractError::InvalidPrice {});
    }

    let collection = deps.api.addr_validate(&collection)?;
    ensure_unlisted(deps.storage, (collection.clone(), token_id.clone()))?;
    nft::ensure_listable(
        &deps.querier,
        &collection,
        &token_id,
        &env.contract.address,
        &info.sender,
    )?;

    let listing = Listing::FixedSale(FixedSale {
        seller: info.sender.clone(),
        price,
    });
    LISTINGS.save(deps.storage, (collection.clone(), token_id.clone()), &listing)?;
    counter_add(deps.storage)?;

    Ok(Response::new()
        .add_attribute("action", "add_item")
        .add_attribute("collection", collection)
        .add_attribute("token_id", token_id)
        .add_attribute("seller", info.sender)
        .add_attribute("price", price.to_string()))
}

pub fn execute_buy(
    deps: DepsMut,
    info: MessageInfo,
    collection: String,
    token_id: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let payment = must_pay(&info, &config.denom)?;

    let collection = deps.api.addr_validate(&collection)?;
    let key = (collection.clone(), token_id.clone());
    let sale = match load_active(deps.storage, key.clone())? {
        Listing::FixedSale(sale) => sale,
        _ => return Err(ContractError::NotListed {}),
    };

    if payment != sale.price {
        return Err(ContractError::IncorrectPayment { price: sale.price });
    }

    // the credit and the transfer submessage commit or revert together
    credit(deps.storage, &sale.seller, payment)?;
    let submsg = nft::transfer_nft_msg(&collection, &token_id, &info.sender)?;

    LISTINGS.save(deps.storage, key, &Listing::Sold {})?;
    counter_sub(deps.storage)?;

    Ok(Response::new()
        .add_attribute("action", "buy")
        .add_attribute("collection", collection)
        .add_attribute("token_id", token_id)
        .add_attribute("seller", sale.seller)
        .add_attribute("buyer", info.sender)
        .add_attribute("price", payment.to_string())
        .add_submessage(submsg))
}

pub fn execute_del_listing(
    deps: DepsMut,
    info: MessageInfo,
    collection: String,
    token_id: String,
) -> Result<Response, ContractError> {
    nonpayable(&info)?;

    let collection = deps.api.addr_validate(&collection)?;
    let key = (collection.clone(), token_id.clone());
    let listing = load_active(deps.storage, key.clone())?;

    let seller = match &listing {
        Listing::FixedSale(sale) => &sale.seller,
        Listing::EnglishAuction(auction) => &auction.seller,
        Listing::DutchAuction(auction) => &auction.seller,
        Listing::Sold {} => return Err(ContractError::AlreadySold {}),
    };
    if *seller != info.sender {
        return Err(ContractError::NotSeller {});
    }

    // a standing bid survives cancellation: credit it back exactly as if
    // the bidder had been outbid
    if let Listing::EnglishAuction(auction) = &listing {
        if let Some(bidder) = &auction.highest_bidder {
            credit(deps.storage, bidder, auction.highest_bid)?;
        }
    }

    LISTINGS.remove(deps.storage, key);
    counter_sub(deps.storage)?;

    Ok(Response::new()
        .add_attribute("action", "del_listing")
        .add_attribute("collection", collection)
        .add_attribute("token_id", token_id))
}

#[allow(clippy::too_many_arguments)]
pub fn execute_add_eng_auction(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    collection: String,
    token_id: String,
    base_price: Uint128,
    start_at: Timestamp,
    end_at: Timestamp,
) -> Result<Response, ContractError> {
    nonpayable(&info)?;

    if base_price.is_zero() {
        return Err(ContractError::InvalidPrice {});
    }
    if start_at >= end_at {
        return Err(ContractError::InvalidTimeWindow {});
    }

    let collection = deps.api.addr_validate(&collection)?;
    ensure_unlisted(deps.storage, (collection.clone(), token_id.clone()))?;
    nft::ensure_listable(
        &deps.querier,
        &collection,
        &token_id,
        &env.contract.address,
        &info.sender,
    )?;

    let listing = Listing::EnglishAuction(EnglishAuction {
        seller: info.sender.clone(),
        base_price,
        start_at,
        end_at,
        highest_bidder: None,
        highest_bid: Uint128::zero(),
    });
    LISTINGS.save(deps.storage, (collection.clone(), token_id.clone()), &listing)?;
    counter_add(deps.storage)?;

    Ok(Response::new()
        .add_attribute("action", "add_eng_auction")
        .add_attribute("collection", collection)
        .add_attribute("token_id", token_id)
        .add_attribute("seller", info.sender)
        .add_attribute("base_price", base_price.to_string()))
}

pub fn execute_bid_for(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    collection: String,
    token_id: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let payment = must_pay(&info, &config.denom)?;

    let collection = deps.api.addr_validate(&collection)?;
    let key = (collection.clone(), token_id.clone());
    let mut auction = match load_active(deps.storage, key.clone())? {
        Listing::EnglishAuction(auction) => auction,
        _ => return Err(ContractError::NotListed {}),
    };

    let now = env.block.time;
    if now < auction.start_at {
        return Err(ContractError::AuctionNotStarted {});
    }
    if now >= auction.end_at {
        return Err(ContractError::AuctionEnded {});
    }

    // strictly greater; the first bid races against the stored zero, the
    // base price is informational only
    if payment <= auction.highest_bid {
        return Err(ContractError::BidTooLow {
            highest_bid: auction.highest_bid,
        });
    }

    // refund by crediting the escrow balance, never by pushing funds, so an
    // unreachable previous bidder can never block the auction
    if let Some(prev_bidder) = &auction.highest_bidder {
        credit(deps.storage, prev_bidder, auction.highest_bid)?;
    }

    auction.highest_bidder = Some(info.sender.clone());
    auction.highest_bid = payment;
    LISTINGS.save(deps.storage, key, &Listing::EnglishAuction(auction))?;

    Ok(Response::new()
        .add_attribute("action", "bid_for")
        .add_attribute("collection", collection)
        .add_attribute("token_id", token_id)
        .add_attribute("bidder", info.sender)
        .add_attribute("bid", payment.to_string()))
}

pub fn execute_end(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    collection: String,
    token_id: String,
) -> Result<Response, ContractError> {
    nonpayable(&info)?;

    let collection = deps.api.addr_validate(&collection)?;
    let key = (collection.clone(), token_id.clone());
    let auction = match load_active(deps.storage, key.clone())? {
        Listing::EnglishAuction(auction) => auction,
        _ => return Err(ContractError::NotListed {}),
    };

    if auction.seller != info.sender {
        return Err(ContractError::NotSeller {});
    }
    if env.block.time < auction.end_at {
        return Err(ContractError::AuctionOpen {});
    }

    let mut res = Response::new()
        .add_attribute("action", "end")
        .add_attribute("collection", collection.clone())
        .add_attribute("token_id", token_id.clone())
        .add_attribute("seller", auction.seller.clone());

    match &auction.highest_bidder {
        Some(winner) => {
            credit(deps.storage, &auction.seller, auction.highest_bid)?;
            let submsg = nft::transfer_nft_msg(&collection, &token_id, winner)?;
            LISTINGS.save(deps.storage, key, &Listing::Sold {})?;
            res = res
                .add_attribute("winner", winner.clone())
                .add_attribute("price", auction.highest_bid.to_string())
                .add_submessage(submsg);
        }
        None => {
            // no bids: nothing to move, the asset stays with the seller
            LISTINGS.remove(deps.storage, key);
            res = res.add_attribute("winner", "none");
        }
    }
    counter_sub(deps.storage)?;

    Ok(res)
}

#[allow(clippy::too_many_arguments)]
pub fn execute_add_dutch_auction(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    collection: String,
    token_id: String,
    start_price: Uint128,
    end_price: Uint128,
    start_at: Timestamp,
    end_at: Timestamp,
) -> Result<Response, ContractError> {
    nonpayable(&info)?;

    if end_price.is_zero() {
        return Err(ContractError::InvalidPrice {});
    }
    if start_price <= end_price {
        return Err(ContractError::InvalidPriceRange {});
    }
    if start_at >= end_at {
        return Err(ContractError::InvalidTimeWindow {});
    }
    // the discount rate is quoted per whole second, so the window must span
    // at least one
    let duration = Uint128::from(end_at.seconds() - start_at.seconds());
    if duration.is_zero() {
        return Err(ContractError::InvalidTimeWindow {});
    }

    let collection = deps.api.addr_validate(&collection)?;
    ensure_unlisted(deps.storage, (collection.clone(), token_id.clone()))?;
    nft::ensure_listable(
        &deps.querier,
        &collection,
        &token_id,
        &env.contract.address,
        &info.sender,
    )?;

    let discount_rate = start_price.checked_sub(end_price)?.checked_div(duration)?;

    let listing = Listing::DutchAuction(DutchAuction {
        seller: info.sender.clone(),
        start_price,
        end_price,
        start_at,
        end_at,
        discount_rate,
    });
    LISTINGS.save(deps.storage, (collection.clone(), token_id.clone()), &listing)?;
    counter_add(deps.storage)?;

    Ok(Response::new()
        .add_attribute("action", "add_dutch_auction")
        .add_attribute("collection", collection)
        .add_attribute("token_id", token_id)
        .add_attribute("seller", info.sender)
        .add_attribute("start_price", start_price.to_string())
        .add_attribute("end_price", end_price.to_string())
        .add_attribute("discount_rate", discount_rate.to_string()))
}

pub fn execute_buy_from_dutch(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    collection: String,
    token_id: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let payment = must_pay(&info, &config.denom)?;

    let collection = deps.api.addr_validate(&collection)?;
    let key = (collection.clone(), token_id.clone());
    let auction = match load_active(deps.storage, key.clone())? {
        Listing::DutchAuction(auction) => auction,
        _ => return Err(ContractError::NotListed {}),
    };

    let now = env.block.time;
    if now < auction.start_at {
        return Err(ContractError::AuctionNotStarted {});
    }

    let price = dutch_price_at(&auction, now)?;
    if payment < price {
        return Err(ContractError::IncorrectPayment { price });
    }

    credit(deps.storage, &auction.seller, price)?;
    // any excess over the quoted price goes back to the buyer's balance
    let excess = payment.checked_sub(price)?;
    if !excess.is_zero() {
        credit(deps.storage, &info.sender, excess)?;
    }

    let submsg = nft::transfer_nft_msg(&collection, &token_id, &info.sender)?;
    LISTINGS.save(deps.storage, key, &Listing::Sold {})?;
    counter_sub(deps.storage)?;

    Ok(Response::new()
        .add_attribute("action", "buy_from_dutch")
        .add_attribute("collection", collection)
        .add_attribute("token_id", token_id)
        .add_attribute("seller", auction.seller)
        .add_attribute("buyer", info.sender)
        .add_attribute("price", price.to_string())
        .add_submessage(submsg))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn reply(_deps: DepsMut, _env: Env, reply: Reply) -> Result<Response, ContractError> {
    match reply.id {
        TRANSFER_REPLY => Ok(Response::new().add_attribute("operation", "nft_transfer")),
        _ => Err(ContractError::UnrecognizedReply {}),
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::CannotMigrate {});
    }

    let version: Version = CONTRACT_VERSION.parse()?;
    let stored_version: Version = stored.version.parse()?;
    if stored_version > version {
        return Err(ContractError::CannotMigrate {});
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    Ok(Response::default())
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::GetFixedListing {
            collection,
            token_id,
        } => to_json_binary(&get_fixed_listing(deps, collection, token_id)?),
        QueryMsg::GetEngAuctionListing {
            collection,
            token_id,
        } => to_json_binary(&get_eng_auction_listing(deps, collection, token_id)?),
        QueryMsg::GetHighestBid {
            collection,
            token_id,
        } => to_json_binary(&get_highest_bid(deps, collection, token_id)?),
        QueryMsg::GetDutchAuctionListing {
            collection,
            token_id,
        } => to_json_binary(&get_dutch_auction_listing(deps, collection, token_id)?),
        QueryMsg::DutchPrice {
            collection,
            token_id,
            at,
        } => to_json_binary(&get_dutch_price(deps, env, collection, token_id, at)?),
        QueryMsg::BalanceOf { address } => to_json_binary(&get_balance_of(deps, address)?),
        QueryMsg::GetListingCount {} => to_json_binary(&get_listing_count(deps)?),
        QueryMsg::GetAllListings { from_index, limit } => {
            to_json_binary(&get_all_listings(deps, from_index, limit)?)
        }
    }
}

pub fn get_fixed_listing(
    deps: Deps,
    collection: String,
    token_id: String,
) -> StdResult<FixedListingResponse> {
    let collection = deps.api.addr_validate(&collection)?;
    Ok(
        match LISTINGS.may_load(deps.storage, (collection, token_id))? {
            Some(Listing::FixedSale(sale)) => FixedListingResponse {
                seller: Some(sale.seller),
                price: sale.price,
            },
            _ => FixedListingResponse::default(),
        },
    )
}

pub fn get_eng_auction_listing(
    deps: Deps,
    collection: String,
    token_id: String,
) -> StdResult<EngAuctionListingResponse> {
    let collection = deps.api.addr_validate(&collection)?;
    Ok(
        match LISTINGS.may_load(deps.storage, (collection, token_id))? {
            Some(Listing::EnglishAuction(auction)) => EngAuctionListingResponse {
                seller: Some(auction.seller),
                base_price: auction.base_price,
                start_at: auction.start_at,
                end_at: auction.end_at,
            },
            _ => EngAuctionListingResponse::default(),
        },
    )
}

pub fn get_highest_bid(
    deps: Deps,
    collection: String,
    token_id: String,
) -> StdResult<HighestBidResponse> {
    let collection = deps.api.addr_validate(&collection)?;
    Ok(
        match LISTINGS.may_load(deps.storage, (collection, token_id))? {
            Some(Listing::EnglishAuction(auction)) => HighestBidResponse {
                highest_bidder: auction.highest_bidder,
                highest_bid: auction.highest_bid,
            },
            _ => HighestBidResponse::default(),
        },
    )
}

pub fn get_dutch_auction_listing(
    deps: Deps,
    collection: String,
    token_id: String,
) -> StdResult<DutchAuctionListingResponse> {
    let collection = deps.api.addr_validate(&collection)?;
    Ok(
        match LISTINGS.may_load(deps.storage, (collection, token_id))? {
            Some(Listing::DutchAuction(auction)) => DutchAuctionListingResponse {
                seller: Some(auction.seller),
                start_price: auction.start_price,
                end_price: auction.end_price,
                start_at: auction.start_at,
                end_at: auction.end_at,
                discount_rate: auction.discount_rate,
                duration: auction.end_at.seconds() - auction.start_at.seconds(),
            },
            _ => DutchAuctionListingResponse::default(),
        },
    )
}

pub fn get_dutch_price(
    deps: Deps,
    env: Env,
    collection: String,
    token_id: String,
    at: Option<Timestamp>,
) -> StdResult<Uint128> {
    let collection = deps.api.addr_validate(&collection)?;
    match LISTINGS.may_load(deps.storage, (collection, token_id))? {
        Some(Listing::DutchAuction(auction)) => {
            dutch_price_at(&auction, at.unwrap_or(env.block.time))
        }
        _ => Ok(Uint128::zero()),
    }
}

pub fn get_balance_of(deps: Deps, address: String) -> StdResult<Uint128> {
    let address = deps.api.addr_validate(&address)?;
    Ok(BALANCES
        .may_load(deps.storage, &address)?
        .unwrap_or_default())
}

pub fn get_listing_count(deps: Deps) -> StdResult<u64> {
    LISTING_COUNTER.load(deps.storage)
}

pub fn get_all_listings(
    deps: Deps,
    from_index: Option<u64>,
    limit: Option<u64>,
) -> StdResult<Vec<ListingRecord>> {
    let from_index = from_index.unwrap_or(0);
    let limit = limit.unwrap_or(10);

    LISTINGS
        .range(deps.storage, None, None, Order::Ascending)
        .filter(|item| !matches!(item, Ok((_, Listing::Sold {}))))
        .skip(from_index as usize)
        .take(limit as usize)
        .map(|item| {
            item.map(|((collection, token_id), listing)| ListingRecord {
                collection,
                token_id,
                listing,
            })
        })
        .collect()
}
