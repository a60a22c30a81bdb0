//! Router and request handlers.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use ledgergate_core::{Hash256, Height};
use ledgergate_cursor::{AccountRanking, CursorError, Direction, TransactionType, TransferFilter};

use crate::error::ApiError;
use crate::params::{
    parse_account_anchor, parse_block_anchor, parse_direction, parse_mosaic_anchor,
    parse_namespace_anchor, parse_transaction_anchor, resolve_count_limit, resolve_page_size,
    sanitize_height, LimitOutcome,
};
use crate::AppState;

/// Assemble the full route surface.
pub fn router(state: AppState, cors_enabled: bool) -> Router {
    let mut router = Router::new()
        .route("/chain/height", get(chain_height))
        .route("/chain/score", get(chain_score))
        .route("/diagnostic/storage", get(storage_info))
        .route("/account/:account", get(account_by_id))
        .route("/account/:account/transactions", get(account_transactions))
        .route(
            "/account/:account/transactions/incoming",
            get(account_incoming_transactions),
        )
        .route(
            "/account/:account/transactions/outgoing",
            get(account_outgoing_transactions),
        )
        .route(
            "/account/:account/transactions/unconfirmed",
            get(account_unconfirmed_transactions),
        )
        .route(
            "/account/:account/transactions/partial",
            get(account_partial_transactions),
        )
        .route("/block/:height", get(block_at))
        .route("/block/:height/transactions", get(block_transactions))
        .route("/blocks/:height/limit/:limit", get(blocks_range))
        .route("/blocks/from/:height/limit/:limit", get(blocks_cursor_from))
        .route("/blocks/since/:height/limit/:limit", get(blocks_cursor_since))
        .route("/transaction/:id", get(transaction_by_id))
        .route(
            "/transactions/:duration/:anchor/limit/:limit",
            get(transactions_cursor),
        )
        .route(
            "/transactions/:duration/:anchor/type/:type/limit/:limit",
            get(transactions_cursor_typed),
        )
        .route(
            "/transactions/:duration/:anchor/type/:type/filter/:filter/limit/:limit",
            get(transactions_cursor_filtered),
        )
        .route(
            "/transactions/unconfirmed/:duration/:anchor/limit/:limit",
            get(unconfirmed_transactions_cursor),
        )
        .route(
            "/transactions/partial/:duration/:anchor/limit/:limit",
            get(partial_transactions_cursor),
        )
        .route("/mosaic/:id", get(mosaic_by_id))
        .route("/mosaics/:duration/:anchor/limit/:limit", get(mosaics_cursor))
        .route("/namespace/:id", get(namespace_by_id))
        .route(
            "/namespaces/:duration/:anchor/limit/:limit",
            get(namespaces_cursor),
        )
        .route(
            "/accounts/importance/:duration/:account/limit/:limit",
            get(accounts_by_importance),
        )
        .route(
            "/accounts/harvested/blocks/:duration/:account/limit/:limit",
            get(accounts_by_harvested_blocks),
        )
        .route(
            "/accounts/harvested/fees/:duration/:account/limit/:limit",
            get(accounts_by_harvested_fees),
        )
        .route(
            "/accounts/balance/currency/:duration/:account/limit/:limit",
            get(accounts_by_currency_balance),
        )
        .route(
            "/accounts/balance/harvest/:duration/:account/limit/:limit",
            get(accounts_by_harvest_balance),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }
    router
}

/// 302 with a corrected location, the limit-redirect shape.
fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn page_json(page: Vec<Document>) -> Response {
    let body: Vec<Value> = page
        .into_iter()
        .map(|document| Bson::Document(document).into_relaxed_extjson())
        .collect();
    Json(Value::Array(body)).into_response()
}

fn document_json(document: Document) -> Response {
    Json(Bson::Document(document).into_relaxed_extjson()).into_response()
}

async fn chain_height(State(state): State<AppState>) -> Result<Response, ApiError> {
    let height = state.blocks.chain_height().await?;
    Ok(Json(json!({ "height": height })).into_response())
}

async fn chain_score(State(state): State<AppState>) -> Result<Response, ApiError> {
    let (high, low) = state.blocks.chain_score().await?;
    Ok(Json(json!({ "scoreHigh": high, "scoreLow": low })).into_response())
}

/// `pageId`/`pageSize` query parameters shared by the listing endpoints.
fn paging_params(params: &HashMap<String, String>) -> Result<(Option<ObjectId>, u32), ApiError> {
    let prev_page_id = match params.get("pageId") {
        Some(raw) => Some(
            ObjectId::parse_str(raw)
                .map_err(|_| ApiError::InvalidArgument("malformed page id".to_string()))?,
        ),
        None => None,
    };
    let page_size = params
        .get("pageSize")
        .and_then(|raw| raw.parse::<u32>().ok())
        .unwrap_or(25);
    Ok((prev_page_id, page_size))
}

async fn account_by_id(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Response, ApiError> {
    let anchor = parse_account_anchor(&account)?;
    let account = state.accounts.by_id(anchor).await?;
    Ok(document_json(account))
}

/// Which slice of an account's transactions a listing covers.
enum AccountTransactionView {
    All,
    Incoming,
    Outgoing,
    Unconfirmed,
    Partial,
}

async fn account_transactions_page(
    state: AppState,
    view: AccountTransactionView,
    account: String,
    params: HashMap<String, String>,
) -> Result<Response, ApiError> {
    let anchor = parse_account_anchor(&account)?;
    let (prev_page_id, page_size) = paging_params(&params)?;

    let page = match view {
        AccountTransactionView::All => {
            let address = state.accounts.resolve_address(anchor)?;
            state
                .confirmed
                .by_address(&address, prev_page_id, page_size)
                .await?
        }
        AccountTransactionView::Incoming => {
            let address = state.accounts.resolve_address(anchor)?;
            state
                .confirmed
                .incoming_to(&address, prev_page_id, page_size)
                .await?
        }
        AccountTransactionView::Outgoing => {
            let signer = state.accounts.signer_public_key(anchor).await?;
            state
                .confirmed
                .outgoing_from(signer, prev_page_id, page_size)
                .await?
        }
        AccountTransactionView::Unconfirmed => {
            let address = state.accounts.resolve_address(anchor)?;
            state
                .unconfirmed
                .by_address(&address, prev_page_id, page_size)
                .await?
        }
        AccountTransactionView::Partial => {
            let address = state.accounts.resolve_address(anchor)?;
            state
                .partial
                .by_address(&address, prev_page_id, page_size)
                .await?
        }
    };
    Ok(page_json(page))
}

async fn account_transactions(
    State(state): State<AppState>,
    Path(account): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    account_transactions_page(state, AccountTransactionView::All, account, params).await
}

async fn account_incoming_transactions(
    State(state): State<AppState>,
    Path(account): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    account_transactions_page(state, AccountTransactionView::Incoming, account, params).await
}

async fn account_outgoing_transactions(
    State(state): State<AppState>,
    Path(account): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    account_transactions_page(state, AccountTransactionView::Outgoing, account, params).await
}

async fn account_unconfirmed_transactions(
    State(state): State<AppState>,
    Path(account): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    account_transactions_page(state, AccountTransactionView::Unconfirmed, account, params).await
}

async fn account_partial_transactions(
    State(state): State<AppState>,
    Path(account): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    account_transactions_page(state, AccountTransactionView::Partial, account, params).await
}

async fn storage_info(State(state): State<AppState>) -> Result<Response, ApiError> {
    let num_blocks = state.store.count_documents("blocks").await.map_err(CursorError::from)?;
    let num_transactions = state
        .store
        .count_documents("transactions")
        .await
        .map_err(CursorError::from)?;
    let num_accounts = state.store.count_documents("accounts").await.map_err(CursorError::from)?;

    Ok(Json(json!({
        "numBlocks": num_blocks,
        "numTransactions": num_transactions,
        "numAccounts": num_accounts,
    }))
    .into_response())
}

async fn block_at(
    State(state): State<AppState>,
    Path(height): Path<String>,
) -> Result<Response, ApiError> {
    let height: Height = height.parse()?;
    let block = state.blocks.block_at(height).await?;
    Ok(document_json(block))
}

async fn block_transactions(
    State(state): State<AppState>,
    Path(height): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let height: Height = height.parse()?;
    let (prev_page_id, page_size) = paging_params(&params)?;

    let page = state
        .blocks
        .transactions_at(height, prev_page_id, page_size)
        .await?;
    Ok(page_json(page))
}

async fn blocks_range(
    State(state): State<AppState>,
    Path((height, limit)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let requested: Height = height.parse()?;
    let sane_height = sanitize_height(requested.0);

    let grouping = match resolve_page_size(&limit, &state.page_size) {
        LimitOutcome::Accept(n) if sane_height == requested.0 => n,
        LimitOutcome::Accept(n) => {
            return Ok(found(format!("/blocks/{sane_height}/limit/{n}")));
        }
        LimitOutcome::Redirect(n) => {
            return Ok(found(format!("/blocks/{sane_height}/limit/{n}")));
        }
    };

    let page = state.blocks.blocks_from(Height(sane_height), grouping).await?;
    Ok(page_json(page))
}

async fn blocks_cursor_from(
    State(state): State<AppState>,
    Path((anchor, limit)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    blocks_page(state, Direction::From, "from", anchor, limit).await
}

async fn blocks_cursor_since(
    State(state): State<AppState>,
    Path((anchor, limit)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    blocks_page(state, Direction::Since, "since", anchor, limit).await
}

async fn blocks_page(
    state: AppState,
    direction: Direction,
    duration: &str,
    anchor: String,
    limit: String,
) -> Result<Response, ApiError> {
    let limit = match resolve_count_limit(&limit, &state.count_range) {
        LimitOutcome::Accept(n) => n,
        LimitOutcome::Redirect(n) => {
            return Ok(found(format!("/blocks/{duration}/{anchor}/limit/{n}")));
        }
    };
    let anchor = parse_block_anchor(&anchor)?;

    let page = match direction {
        Direction::From => state.blocks.from(anchor, limit).await?,
        Direction::Since => state.blocks.since(anchor, limit).await?,
    };
    Ok(page_json(page))
}

async fn transaction_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let transaction = if id.len() == 24 {
        let id = ObjectId::parse_str(&id)
            .map_err(|_| ApiError::InvalidArgument("malformed document id".to_string()))?;
        state.confirmed.by_id(id).await?
    } else {
        let hash: Hash256 = id.parse()?;
        state.confirmed.by_hash(&hash).await?
    };
    Ok(document_json(transaction))
}

async fn transactions_cursor(
    State(state): State<AppState>,
    Path((duration, anchor, limit)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let direction = parse_direction(&duration)?;
    let limit = match resolve_count_limit(&limit, &state.count_range) {
        LimitOutcome::Accept(n) => n,
        LimitOutcome::Redirect(n) => {
            return Ok(found(format!("/transactions/{duration}/{anchor}/limit/{n}")));
        }
    };
    let anchor = parse_transaction_anchor(&anchor)?;

    let page = match direction {
        Direction::From => state.confirmed.from(anchor, limit).await?,
        Direction::Since => state.confirmed.since(anchor, limit).await?,
    };
    Ok(page_json(page))
}

fn parse_transaction_type(segment: &str) -> Result<TransactionType, ApiError> {
    TransactionType::from_name(segment)
        .ok_or_else(|| ApiError::InvalidArgument(format!("unknown transaction type '{segment}'")))
}

async fn transactions_cursor_typed(
    State(state): State<AppState>,
    Path((duration, anchor, kind, limit)): Path<(String, String, String, String)>,
) -> Result<Response, ApiError> {
    let direction = parse_direction(&duration)?;
    let limit = match resolve_count_limit(&limit, &state.count_range) {
        LimitOutcome::Accept(n) => n,
        LimitOutcome::Redirect(n) => {
            return Ok(found(format!(
                "/transactions/{duration}/{anchor}/type/{kind}/limit/{n}"
            )));
        }
    };
    let kind = parse_transaction_type(&kind)?;
    let anchor = parse_transaction_anchor(&anchor)?;

    let page = match direction {
        Direction::From => state.confirmed.from_typed(anchor, kind, None, limit).await?,
        Direction::Since => state.confirmed.since_typed(anchor, kind, None, limit).await?,
    };
    Ok(page_json(page))
}

async fn transactions_cursor_filtered(
    State(state): State<AppState>,
    Path((duration, anchor, kind, filter, limit)): Path<(String, String, String, String, String)>,
) -> Result<Response, ApiError> {
    let direction = parse_direction(&duration)?;
    let limit = match resolve_count_limit(&limit, &state.count_range) {
        LimitOutcome::Accept(n) => n,
        LimitOutcome::Redirect(n) => {
            return Ok(found(format!(
                "/transactions/{duration}/{anchor}/type/{kind}/filter/{filter}/limit/{n}"
            )));
        }
    };
    let kind = parse_transaction_type(&kind)?;
    let filter = TransferFilter::from_name(&filter)
        .ok_or_else(|| ApiError::InvalidArgument(format!("unknown filter '{filter}'")))?;
    let anchor = parse_transaction_anchor(&anchor)?;

    let page = match direction {
        Direction::From => {
            state
                .confirmed
                .from_typed(anchor, kind, Some(filter), limit)
                .await?
        }
        Direction::Since => {
            state
                .confirmed
                .since_typed(anchor, kind, Some(filter), limit)
                .await?
        }
    };
    Ok(page_json(page))
}

async fn unconfirmed_transactions_cursor(
    State(state): State<AppState>,
    Path((duration, anchor, limit)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let direction = parse_direction(&duration)?;
    let limit = match resolve_count_limit(&limit, &state.count_range) {
        LimitOutcome::Accept(n) => n,
        LimitOutcome::Redirect(n) => {
            return Ok(found(format!(
                "/transactions/unconfirmed/{duration}/{anchor}/limit/{n}"
            )));
        }
    };
    let anchor = parse_transaction_anchor(&anchor)?;

    let page = match direction {
        Direction::From => state.unconfirmed.from(anchor, limit).await?,
        Direction::Since => state.unconfirmed.since(anchor, limit).await?,
    };
    Ok(page_json(page))
}

async fn partial_transactions_cursor(
    State(state): State<AppState>,
    Path((duration, anchor, limit)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let direction = parse_direction(&duration)?;
    let limit = match resolve_count_limit(&limit, &state.count_range) {
        LimitOutcome::Accept(n) => n,
        LimitOutcome::Redirect(n) => {
            return Ok(found(format!(
                "/transactions/partial/{duration}/{anchor}/limit/{n}"
            )));
        }
    };
    let anchor = parse_transaction_anchor(&anchor)?;

    let page = match direction {
        Direction::From => state.partial.from(anchor, limit).await?,
        Direction::Since => state.partial.since(anchor, limit).await?,
    };
    Ok(page_json(page))
}

async fn mosaic_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let mosaic = state.mosaics.by_id(id.parse()?).await?;
    Ok(document_json(mosaic))
}

async fn mosaics_cursor(
    State(state): State<AppState>,
    Path((duration, anchor, limit)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let direction = parse_direction(&duration)?;
    let limit = match resolve_count_limit(&limit, &state.count_range) {
        LimitOutcome::Accept(n) => n,
        LimitOutcome::Redirect(n) => {
            return Ok(found(format!("/mosaics/{duration}/{anchor}/limit/{n}")));
        }
    };
    let anchor = parse_mosaic_anchor(&anchor)?;

    let page = match direction {
        Direction::From => state.mosaics.from(anchor, limit).await?,
        Direction::Since => state.mosaics.since(anchor, limit).await?,
    };
    Ok(page_json(page))
}

async fn namespace_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let namespace = state.namespaces.by_id(id.parse()?).await?;
    Ok(document_json(namespace))
}

async fn namespaces_cursor(
    State(state): State<AppState>,
    Path((duration, anchor, limit)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let direction = parse_direction(&duration)?;
    let limit = match resolve_count_limit(&limit, &state.count_range) {
        LimitOutcome::Accept(n) => n,
        LimitOutcome::Redirect(n) => {
            return Ok(found(format!("/namespaces/{duration}/{anchor}/limit/{n}")));
        }
    };
    let anchor = parse_namespace_anchor(&anchor)?;

    let page = match direction {
        Direction::From => state.namespaces.from(anchor, limit).await?,
        Direction::Since => state.namespaces.since(anchor, limit).await?,
    };
    Ok(page_json(page))
}

async fn accounts_page(
    state: AppState,
    ranking: AccountRanking,
    route_prefix: &str,
    duration: String,
    account: String,
    limit: String,
) -> Result<Response, ApiError> {
    let direction = parse_direction(&duration)?;
    let limit = match resolve_count_limit(&limit, &state.count_range) {
        LimitOutcome::Accept(n) => n,
        LimitOutcome::Redirect(n) => {
            return Ok(found(format!("{route_prefix}/{duration}/{account}/limit/{n}")));
        }
    };
    let anchor = parse_account_anchor(&account)?;

    let page = match direction {
        Direction::From => state.accounts.from(ranking, anchor, limit).await?,
        Direction::Since => state.accounts.since(ranking, anchor, limit).await?,
    };
    Ok(page_json(page))
}

async fn accounts_by_importance(
    State(state): State<AppState>,
    Path((duration, account, limit)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    accounts_page(
        state,
        AccountRanking::Importance,
        "/accounts/importance",
        duration,
        account,
        limit,
    )
    .await
}

async fn accounts_by_harvested_blocks(
    State(state): State<AppState>,
    Path((duration, account, limit)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    accounts_page(
        state,
        AccountRanking::HarvestedBlocks,
        "/accounts/harvested/blocks",
        duration,
        account,
        limit,
    )
    .await
}

async fn accounts_by_harvested_fees(
    State(state): State<AppState>,
    Path((duration, account, limit)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    accounts_page(
        state,
        AccountRanking::HarvestedFees,
        "/accounts/harvested/fees",
        duration,
        account,
        limit,
    )
    .await
}

async fn accounts_by_currency_balance(
    State(state): State<AppState>,
    Path((duration, account, limit)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    accounts_page(
        state,
        AccountRanking::CurrencyBalance,
        "/accounts/balance/currency",
        duration,
        account,
        limit,
    )
    .await
}

async fn accounts_by_harvest_balance(
    State(state): State<AppState>,
    Path((duration, account, limit)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    accounts_page(
        state,
        AccountRanking::HarvestBalance,
        "/accounts/balance/harvest",
        duration,
        account,
        limit,
    )
    .await
}
