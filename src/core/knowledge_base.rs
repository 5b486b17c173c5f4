//! Static, read-only database of every finding the analysis can produce,
//! with human-readable explanations, remediation steps, and a reference
//! link for further reading. Keeping this data-driven means the analysis
//! code only deals in codes.

use crate::core::models::Severity;
use std::fmt;

/// High-level grouping used to organize findings in the user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingCategory {
    /// Domain integrity: DNSSEC, CAA, delegation.
    Dns,
    /// Email authentication: SPF and DMARC.
    Mail,
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingCategory::Dns => write!(f, "DNS Integrity"),
            FindingCategory::Mail => write!(f, "Email Authentication"),
        }
    }
}

/// Everything needed to present one finding to a user.
pub struct FindingDetail {
    /// Unique machine-readable identifier (e.g., "MAIL_DMARC_MISSING").
    pub code: &'static str,
    /// Short human-readable title.
    pub title: &'static str,
    pub category: FindingCategory,
    pub severity: Severity,
    /// What the finding means and why it matters.
    pub description: &'static str,
    /// Actionable steps to fix the issue.
    pub remediation: &'static str,
    /// Authoritative document or tool for further reading.
    pub reference: &'static str,
}

static FINDINGS: &[FindingDetail] = &[
    // --- DNS integrity ---
    FindingDetail {
        code: "DNS_DNSSEC_MISSING",
        title: "DNSSEC Not Detected",
        category: FindingCategory::Dns,
        severity: Severity::Warning,
        description: "No DS record was found and no resolver validated the zone's signatures. Without DNSSEC, responses for your domain can be forged in transit (cache poisoning), silently redirecting visitors and mail.",
        remediation: "Enable DNSSEC signing at your DNS host, then publish the DS record at your registrar. Verify the chain with a tool such as DNSViz before and after.",
        reference: "https://www.rfc-editor.org/rfc/rfc9364",
    },
    FindingDetail {
        code: "DNS_CAA_MISSING",
        title: "CAA Record Missing",
        category: FindingCategory::Dns,
        severity: Severity::Info,
        description: "A Certificate Authority Authorization (CAA) record restricts which CAs may issue certificates for your domain. Without one, any publicly trusted CA can be tricked or compelled into issuing for it.",
        remediation: "Publish a CAA record naming your chosen provider(s), for example: '0 issue \"letsencrypt.org\"'.",
        reference: "https://www.rfc-editor.org/rfc/rfc8659",
    },
    // --- Email authentication ---
    FindingDetail {
        code: "MAIL_SPF_MISSING",
        title: "SPF Record Missing",
        category: FindingCategory::Mail,
        severity: Severity::Warning,
        description: "Sender Policy Framework (SPF) lists the servers authorized to send mail for your domain. Without it, attackers can spoof mail from your domain far more easily, and DMARC has one less signal to work with.",
        remediation: "Publish a TXT record defining your mail sources, e.g. 'v=spf1 include:_spf.google.com -all', and keep it under the 10-lookup limit.",
        reference: "https://www.rfc-editor.org/rfc/rfc7208",
    },
    FindingDetail {
        code: "MAIL_SPF_ALL_PERMISSIVE",
        title: "SPF Allows Any Sender (+all)",
        category: FindingCategory::Mail,
        severity: Severity::Warning,
        description: "Your SPF record ends in '+all', which explicitly authorizes every host on the internet to send mail as your domain. This is worse than having no record at all, since it actively vouches for forgeries.",
        remediation: "Replace '+all' with '-all' (reject) or '~all' (softfail) after confirming every legitimate sender is listed.",
        reference: "https://www.rfc-editor.org/rfc/rfc7208#section-5.1",
    },
    FindingDetail {
        code: "MAIL_SPF_NO_TERMINAL",
        title: "SPF Has No Terminal Qualifier",
        category: FindingCategory::Mail,
        severity: Severity::Warning,
        description: "Your SPF record does not end in '~all' or '-all', so receivers get no instruction about mail from unlisted hosts. The default 'neutral' result provides no protection.",
        remediation: "Append '-all' (or '~all' while testing) so receivers have an explicit policy for unauthorized senders.",
        reference: "https://www.rfc-editor.org/rfc/rfc7208#section-4.7",
    },
    FindingDetail {
        code: "MAIL_DMARC_MISSING",
        title: "DMARC Record Missing",
        category: FindingCategory::Mail,
        severity: Severity::Critical,
        description: "DMARC ties SPF and DKIM to the visible From: address and tells receivers what to do with mail that fails both. Without it, your domain can be used for phishing with no policy standing in the way and no reports coming back to you.",
        remediation: "Publish '_dmarc.yourdomain' as a TXT record. Start with 'v=DMARC1; p=none; rua=mailto:reports@yourdomain' to collect data, then move to 'p=quarantine' and 'p=reject'.",
        reference: "https://www.rfc-editor.org/rfc/rfc7489",
    },
    FindingDetail {
        code: "MAIL_DMARC_POLICY_NONE",
        title: "DMARC Policy is 'none'",
        category: FindingCategory::Mail,
        severity: Severity::Warning,
        description: "Your DMARC record is in monitoring-only mode. Failing mail is reported but still delivered, so the policy offers no active protection against spoofing.",
        remediation: "Once aggregate reports show your legitimate mail passing, raise the policy to 'p=quarantine' and eventually 'p=reject'.",
        reference: "https://www.rfc-editor.org/rfc/rfc7489#section-6.3",
    },
];

/// Look up the full detail for a finding code, or `None` for codes the
/// knowledge base does not know about.
pub fn get_finding_detail(code: &str) -> Option<&'static FindingDetail> {
    FINDINGS.iter().find(|f| f.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{DomainSnapshot, RecordType};
    use crate::core::scanner::dns_scanner::analyze_snapshot;

    #[test]
    fn every_analysis_code_has_an_entry() {
        // An empty snapshot with failed derivations produces nothing; build
        // one that trips every rule instead.
        let mut snapshot = DomainSnapshot::new("example.com");
        snapshot.records.insert(RecordType::CAA, Vec::new());
        snapshot.dnssec = Some(false);
        snapshot.spf = Ok(None);
        snapshot.dmarc = Ok(None);
        for finding in analyze_snapshot(&snapshot) {
            assert!(
                get_finding_detail(&finding.code).is_some(),
                "no knowledge base entry for {}",
                finding.code
            );
        }
    }

    #[test]
    fn unknown_codes_return_none() {
        assert!(get_finding_detail("SSL_EXPIRED").is_none());
    }
}
