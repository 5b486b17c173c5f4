// src/core/scanner/posture.rs
//
// Pure text extraction of mail-security posture from TXT record data.
// Best-effort pattern matching, not a conformant policy-record parser:
// when a record carries conflicting duplicate tags, the first match wins.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::models::{DmarcReport, RawAnswer, SpfReport};

static RE_SPF_PERMISSIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+all\b").unwrap());
static RE_SPF_TERMINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(~all|-all)\b").unwrap());
static RE_DMARC_POLICY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i);?\s*p=(none|quarantine|reject)\s*;?").unwrap());
static RE_DMARC_RUA: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)rua=([^;]+)").unwrap());
static RE_DMARC_PCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)pct=([0-9]{1,3})").unwrap());
static RE_DMARC_ASPF: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)aspf=([rs])").unwrap());
static RE_DMARC_ADKIM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)adkim=([rs])").unwrap());

/// Strip one pair of surrounding quote characters, as TXT data is usually
/// delivered quoted by DoH providers.
pub fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

/// Normalized data strings for a set of TXT answers.
pub fn txt_values(answers: &[RawAnswer]) -> Vec<String> {
    answers
        .iter()
        .map(|a| strip_quotes(&a.data).to_string())
        .collect()
}

/// Find the effective SPF record among a domain's TXT values.
///
/// The first value containing the case-insensitive token `v=spf1` wins;
/// multiple SPF records are a misconfiguration in their own right, but
/// extraction stays deterministic by taking the first in list order.
pub fn extract_spf(values: &[String]) -> Option<SpfReport> {
    let record = values
        .iter()
        .find(|v| v.to_lowercase().contains("v=spf1"))?;
    Some(SpfReport {
        record: record.clone(),
        permissive_all: RE_SPF_PERMISSIVE.is_match(record),
        missing_terminal: !RE_SPF_TERMINAL.is_match(record),
    })
}

/// Extract DMARC fields from the TXT values answered at `_dmarc.<domain>`.
///
/// Multi-string TXT answers are joined before tag extraction. Returns `None`
/// when the answer set is empty (no record published).
pub fn extract_dmarc(values: &[String]) -> Option<DmarcReport> {
    if values.is_empty() {
        return None;
    }
    let record = values.concat();
    let policy = RE_DMARC_POLICY
        .captures(&record)
        .and_then(|c| c.get(1))
        .map_or_else(|| "none?".to_string(), |m| m.as_str().to_lowercase());
    let pct = RE_DMARC_PCT
        .captures(&record)
        .and_then(|c| c.get(1))
        .map_or_else(|| "100".to_string(), |m| m.as_str().to_string());
    let rua = RE_DMARC_RUA
        .captures(&record)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());
    let aspf = RE_DMARC_ASPF
        .captures(&record)
        .and_then(|c| c.get(1))
        .map_or_else(|| "?".to_string(), |m| m.as_str().to_lowercase());
    let adkim = RE_DMARC_ADKIM
        .captures(&record)
        .and_then(|c| c.get(1))
        .map_or_else(|| "?".to_string(), |m| m.as_str().to_lowercase());
    Some(DmarcReport {
        record,
        policy,
        pct,
        rua,
        aspf,
        adkim,
    })
}

/// Delegation-signing detection: a non-empty DS answer at the parent zone,
/// or the resolver vouching for the response with its authenticated-data
/// flag. The flag is an additional signal, never a replacement.
pub fn dnssec_detected(ds_answers: &[RawAnswer], authenticated: bool) -> bool {
    !ds_answers.is_empty() || authenticated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txt(data: &str) -> RawAnswer {
        RawAnswer {
            name: "example.com.".to_string(),
            rtype: 16,
            data: data.to_string(),
            ttl: 300,
        }
    }

    #[test]
    fn quotes_are_stripped_from_txt_data() {
        let values = txt_values(&[txt("\"v=spf1 -all\""), txt("plain")]);
        assert_eq!(values, vec!["v=spf1 -all", "plain"]);
    }

    #[test]
    fn spf_with_softfail_terminal_raises_no_warnings() {
        let values = vec!["v=spf1 include:_spf.example.com ~all".to_string()];
        let report = extract_spf(&values).unwrap();
        assert_eq!(report.record, "v=spf1 include:_spf.example.com ~all");
        assert!(!report.permissive_all);
        assert!(!report.missing_terminal);
    }

    #[test]
    fn spf_plus_all_is_flagged_permissive() {
        let values = vec!["v=spf1 +all".to_string()];
        let report = extract_spf(&values).unwrap();
        assert!(report.permissive_all);
    }

    #[test]
    fn spf_without_terminal_qualifier_is_flagged() {
        let values = vec!["v=spf1 include:_spf.example.com".to_string()];
        let report = extract_spf(&values).unwrap();
        assert!(report.missing_terminal);
    }

    #[test]
    fn spf_match_is_case_insensitive_and_first_wins() {
        let values = vec![
            "google-site-verification=abc".to_string(),
            "V=SPF1 -all".to_string(),
            "v=spf1 +all".to_string(),
        ];
        let report = extract_spf(&values).unwrap();
        assert_eq!(report.record, "V=SPF1 -all");
    }

    #[test]
    fn empty_txt_set_yields_no_spf_and_no_dmarc() {
        assert!(extract_spf(&[]).is_none());
        assert!(extract_dmarc(&[]).is_none());
    }

    #[test]
    fn dmarc_tags_are_extracted_with_defaults_for_missing_ones() {
        let values = vec!["v=DMARC1; p=none; pct=50; rua=mailto:d@example.com".to_string()];
        let report = extract_dmarc(&values).unwrap();
        assert_eq!(report.policy, "none");
        assert_eq!(report.pct, "50");
        assert_eq!(report.rua.as_deref(), Some("mailto:d@example.com"));
        assert_eq!(report.aspf, "?");
        assert_eq!(report.adkim, "?");
    }

    #[test]
    fn malformed_dmarc_policy_defaults_to_none_question() {
        let values = vec!["v=DMARC1; p=banana".to_string()];
        let report = extract_dmarc(&values).unwrap();
        assert_eq!(report.policy, "none?");
        assert_eq!(report.pct, "100");
        assert_eq!(report.rua, None);
    }

    #[test]
    fn multi_string_dmarc_answers_are_joined_before_extraction() {
        let values = vec!["v=DMARC1; p=quar".to_string(), "antine; adkim=s".to_string()];
        let report = extract_dmarc(&values).unwrap();
        assert_eq!(report.policy, "quarantine");
        assert_eq!(report.adkim, "s");
    }

    #[test]
    fn dnssec_requires_ds_answers_or_ad_flag() {
        let ds = vec![txt("12345 13 2 ABCDEF")];
        assert!(dnssec_detected(&ds, false));
        assert!(!dnssec_detected(&[], false));
        assert!(dnssec_detected(&[], true));
    }
}
