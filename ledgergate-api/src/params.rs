//! Path parameter parsing.
//!
//! Anchor strings are parsed by trying each resolver the entity accepts
//! in a fixed order, stopping at the first that matches; whatever falls
//! through every resolver is a 409. Limits are never rejected: an
//! invalid limit resolves to a redirect target instead.

use mongodb::bson::oid::ObjectId;

use ledgergate_core::{Address, CountRangeConfig, Hash256, Height, PageSizeConfig};
use ledgergate_cursor::{
    AbsoluteAnchor, AccountAnchor, BlockAnchor, Direction, MosaicAnchor, NamespaceAnchor,
    TransactionAnchor,
};

use crate::error::ApiError;

/// Parse the `{from,since}` path segment.
pub fn parse_direction(segment: &str) -> Result<Direction, ApiError> {
    match segment {
        "from" => Ok(Direction::From),
        "since" => Ok(Direction::Since),
        other => Err(ApiError::InvalidArgument(format!(
            "duration must be 'from' or 'since', got '{other}'"
        ))),
    }
}

/// Keywords accepted by the time-ordered entities.
fn time_keyword(segment: &str) -> Option<AbsoluteAnchor> {
    AbsoluteAnchor::from_keyword(segment)
        .filter(|keyword| matches!(keyword, AbsoluteAnchor::Latest | AbsoluteAnchor::Earliest))
}

/// Keywords accepted by the quantity-ordered account views.
fn quantity_keyword(segment: &str) -> Option<AbsoluteAnchor> {
    AbsoluteAnchor::from_keyword(segment)
        .filter(|keyword| matches!(keyword, AbsoluteAnchor::Most | AbsoluteAnchor::Least))
}

pub fn parse_block_anchor(segment: &str) -> Result<BlockAnchor, ApiError> {
    if let Some(keyword) = time_keyword(segment) {
        return Ok(BlockAnchor::Absolute(keyword));
    }
    let height: Height = segment.parse()?;
    Ok(BlockAnchor::Height(height))
}

pub fn parse_transaction_anchor(segment: &str) -> Result<TransactionAnchor, ApiError> {
    if let Some(keyword) = time_keyword(segment) {
        return Ok(TransactionAnchor::Absolute(keyword));
    }
    if segment.len() == 24 {
        let id = ObjectId::parse_str(segment)
            .map_err(|_| ApiError::InvalidArgument("malformed document id".to_string()))?;
        return Ok(TransactionAnchor::Id(id));
    }
    let hash: Hash256 = segment.parse()?;
    Ok(TransactionAnchor::Hash(hash))
}

pub fn parse_mosaic_anchor(segment: &str) -> Result<MosaicAnchor, ApiError> {
    if let Some(keyword) = time_keyword(segment) {
        return Ok(MosaicAnchor::Absolute(keyword));
    }
    Ok(MosaicAnchor::Id(segment.parse()?))
}

pub fn parse_namespace_anchor(segment: &str) -> Result<NamespaceAnchor, ApiError> {
    if let Some(keyword) = time_keyword(segment) {
        return Ok(NamespaceAnchor::Absolute(keyword));
    }
    if segment.len() == 24 {
        let id = ObjectId::parse_str(segment)
            .map_err(|_| ApiError::InvalidArgument("malformed document id".to_string()))?;
        return Ok(NamespaceAnchor::DocumentId(id));
    }
    Ok(NamespaceAnchor::Id(segment.parse()?))
}

pub fn parse_account_anchor(segment: &str) -> Result<AccountAnchor, ApiError> {
    if let Some(keyword) = quantity_keyword(segment) {
        return Ok(AccountAnchor::Absolute(keyword));
    }
    // 64 hex chars are a public key; 40 base32 or 50 hex are an address
    if segment.len() == 64 {
        return Ok(AccountAnchor::PublicKey(segment.parse()?));
    }
    let address: Address = segment.parse()?;
    Ok(AccountAnchor::Address(address))
}

/// Outcome of limit validation: accept as supplied, or redirect to a
/// corrected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitOutcome {
    Accept(u32),
    Redirect(u32),
}

/// Cursor endpoints: limits inside `[min, max]` pass; everything else
/// (including unparseable input) redirects to the preset.
pub fn resolve_count_limit(raw: &str, range: &CountRangeConfig) -> LimitOutcome {
    match raw.parse::<u32>() {
        Ok(limit) if limit >= range.min && limit <= range.max => LimitOutcome::Accept(limit),
        _ => LimitOutcome::Redirect(range.preset),
    }
}

/// Block-range endpoints: clamp into `[min, max]`, then snap down onto
/// the step grid anchored at `min`.
pub fn resolve_page_size(raw: &str, policy: &PageSizeConfig) -> LimitOutcome {
    let Ok(limit) = raw.parse::<u32>() else {
        return LimitOutcome::Redirect(policy.min);
    };
    let clamped = limit.clamp(policy.min, policy.max);
    let snapped = policy.min + (clamped - policy.min) / policy.step * policy.step;
    if snapped == limit {
        LimitOutcome::Accept(limit)
    } else {
        LimitOutcome::Redirect(snapped)
    }
}

/// Block-range heights start at one.
pub fn sanitize_height(height: u64) -> u64 {
    height.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_policy() -> PageSizeConfig {
        PageSizeConfig {
            min: 30,
            max: 80,
            step: 25,
        }
    }

    fn count_policy() -> CountRangeConfig {
        CountRangeConfig {
            min: 10,
            max: 100,
            preset: 25,
        }
    }

    #[test]
    fn directions_parse() {
        assert_eq!(parse_direction("from").unwrap(), Direction::From);
        assert_eq!(parse_direction("since").unwrap(), Direction::Since);
        assert!(parse_direction("until").is_err());
    }

    #[test]
    fn block_anchor_takes_keywords_then_heights() {
        assert!(matches!(
            parse_block_anchor("latest").unwrap(),
            BlockAnchor::Absolute(AbsoluteAnchor::Latest)
        ));
        assert!(matches!(
            parse_block_anchor("3601").unwrap(),
            BlockAnchor::Height(Height(3601))
        ));
        assert!(parse_block_anchor("most").is_err());
        assert!(parse_block_anchor("3,601").is_err());
    }

    #[test]
    fn transaction_anchor_distinguishes_ids_by_length() {
        let hash = "F91E27B8209A9A74DA61BC0B716E2CAB7D6BC46A65A64323C57D4D8103538103";
        assert!(matches!(
            parse_transaction_anchor(hash).unwrap(),
            TransactionAnchor::Hash(_)
        ));
        assert!(matches!(
            parse_transaction_anchor("61a0b3c4d5e6f7a8b9c0d1e2").unwrap(),
            TransactionAnchor::Id(_)
        ));
        // 66 chars is neither a document id nor a hash
        assert!(parse_transaction_anchor(&format!("{hash}AB")).is_err());
    }

    #[test]
    fn account_anchor_accepts_quantity_keywords_only() {
        assert!(matches!(
            parse_account_anchor("most").unwrap(),
            AccountAnchor::Absolute(AbsoluteAnchor::Most)
        ));
        assert!(parse_account_anchor("latest").is_err());

        let key = "AB".repeat(32);
        assert!(matches!(
            parse_account_anchor(&key).unwrap(),
            AccountAnchor::PublicKey(_)
        ));
    }

    #[test]
    fn count_limits_redirect_to_the_preset() {
        let policy = count_policy();
        assert_eq!(resolve_count_limit("25", &policy), LimitOutcome::Accept(25));
        assert_eq!(resolve_count_limit("10", &policy), LimitOutcome::Accept(10));
        assert_eq!(resolve_count_limit("100", &policy), LimitOutcome::Accept(100));
        assert_eq!(resolve_count_limit("9", &policy), LimitOutcome::Redirect(25));
        assert_eq!(resolve_count_limit("101", &policy), LimitOutcome::Redirect(25));
        assert_eq!(resolve_count_limit("many", &policy), LimitOutcome::Redirect(25));
    }

    #[test]
    fn page_sizes_snap_onto_the_grid() {
        let policy = page_policy();
        assert_eq!(resolve_page_size("30", &policy), LimitOutcome::Accept(30));
        assert_eq!(resolve_page_size("55", &policy), LimitOutcome::Accept(55));
        assert_eq!(resolve_page_size("80", &policy), LimitOutcome::Accept(80));

        assert_eq!(resolve_page_size("29", &policy), LimitOutcome::Redirect(30));
        assert_eq!(resolve_page_size("100", &policy), LimitOutcome::Redirect(80));
        assert_eq!(resolve_page_size("0", &policy), LimitOutcome::Redirect(30));
        assert_eq!(resolve_page_size("60", &policy), LimitOutcome::Redirect(55));
        assert_eq!(resolve_page_size("x", &policy), LimitOutcome::Redirect(30));
    }

    #[test]
    fn heights_start_at_one() {
        assert_eq!(sanitize_height(0), 1);
        assert_eq!(sanitize_height(1), 1);
        assert_eq!(sanitize_height(3601), 3601);
    }
}
