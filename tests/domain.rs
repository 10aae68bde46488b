use assert_matches::assert_matches;

use kira_taxscan::domain::{LengthRange, SearchQuery, SearchSession, TaxId, MAX_FETCH};
use kira_taxscan::error::KiraError;

#[test]
fn query_term_combines_organism_and_length() {
    let tax_id: TaxId = "9606".parse().unwrap();
    let range = LengthRange::parse("100", "200").unwrap();
    let query = SearchQuery::new(tax_id, range);
    assert_eq!(query.term(), "txid9606[Organism] AND 100:200[SLEN]");
}

#[test]
fn length_range_is_inclusive_and_ordered() {
    let range = LengthRange::parse(" 150 ", "150").unwrap();
    assert_eq!(range.min(), 150);
    assert_eq!(range.max(), 150);

    assert_matches!(
        LengthRange::parse("200", "100"),
        Err(KiraError::InvalidLengthRange { min: 200, max: 100 })
    );
}

#[test]
fn length_must_be_numeric() {
    assert_matches!(
        LengthRange::parse("ten", "100"),
        Err(KiraError::InvalidLength(value)) if value == "ten"
    );
    assert_matches!(
        LengthRange::parse("10", "-5"),
        Err(KiraError::InvalidLength(_))
    );
}

#[test]
fn tax_id_accepts_plain_and_prefixed() {
    let plain: TaxId = "9606".parse().unwrap();
    let prefixed: TaxId = "txid9606".parse().unwrap();
    assert_eq!(plain, prefixed);
    assert_eq!(prefixed.to_string(), "9606");

    assert_matches!("96 06".parse::<TaxId>(), Err(KiraError::InvalidTaxId(_)));
    assert_matches!("".parse::<TaxId>(), Err(KiraError::InvalidTaxId(_)));
}

#[test]
fn fetch_limit_follows_count_up_to_cap() {
    let session = |count| SearchSession {
        web_env: "MCID".to_string(),
        query_key: "1".to_string(),
        count,
    };
    assert_eq!(session(5).fetch_limit(), 5);
    assert!(!session(5).is_truncated());
    assert_eq!(session(MAX_FETCH).fetch_limit(), MAX_FETCH);
    assert!(!session(MAX_FETCH).is_truncated());
    assert_eq!(session(101).fetch_limit(), 100);
    assert!(session(101).is_truncated());
}
