//! Thin adapter over the cw721 collection: ownership/approval checks at
//! listing time and the transfer submessage used at settlement.

use cosmwasm_std::{to_json_binary, Addr, QuerierWrapper, StdResult, SubMsg, WasmMsg};
use cw721::{Cw721ExecuteMsg, Cw721QueryMsg, OperatorResponse, OwnerOfResponse};

use crate::error::ContractError;

pub const TRANSFER_REPLY: u64 = 1;

pub fn query_owner_of(
    querier: &QuerierWrapper,
    collection: &Addr,
    token_id: &str,
) -> StdResult<OwnerOfResponse> {
    querier.query_wasm_smart(
        collection.to_string(),
        &Cw721QueryMsg::OwnerOf {
            token_id: token_id.to_string(),
            include_expired: Some(false),
        },
    )
}

/// Listing-time authorization: the caller must own the token and must have
/// approved the marketplace to move it, otherwise settlement could never
/// complete.
pub fn ensure_listable(
    querier: &QuerierWrapper,
    collection: &Addr,
    token_id: &str,
    marketplace: &Addr,
    caller: &Addr,
) -> Result<(), ContractError> {
    let resp = query_owner_of(querier, collection, token_id)?;

    if resp.owner != caller.as_str() {
        return Err(ContractError::NotOwner {});
    }

    if resp
        .approvals
        .iter()
        .any(|approval| approval.spender == marketplace.as_str())
    {
        return Ok(());
    }

    // no token-level approval: an operator grant covers the transfer too;
    // the collection answers this query with an error when none exists
    let operator: StdResult<OperatorResponse> = querier.query_wasm_smart(
        collection.to_string(),
        &Cw721QueryMsg::Operator {
            owner: resp.owner,
            operator: marketplace.to_string(),
            include_expired: Some(false),
        },
    );
    match operator {
        Ok(_) => Ok(()),
        Err(_) => Err(ContractError::NotApproved {}),
    }
}

/// Transfer executed as a reply-on-success submessage so that a failed
/// transfer reverts the whole settlement, ledger credit included.
pub fn transfer_nft_msg(
    collection: &Addr,
    token_id: &str,
    recipient: &Addr,
) -> StdResult<SubMsg> {
    Ok(SubMsg::reply_on_success(
        WasmMsg::Execute {
            contract_addr: collection.to_string(),
            msg: to_json_binary(&Cw721ExecuteMsg::TransferNft {
                recipient: recipient.to_string(),
                token_id: token_id.to_string(),
            })?,
            funds: vec![],
        },
        TRANSFER_REPLY,
    ))
}
