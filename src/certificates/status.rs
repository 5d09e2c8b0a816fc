// Certificate status - expiry classification against an explicit timestamp

use crate::certificates::metadata::CertificateMetadata;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed boundary for the stored status field. The notification query below
/// takes its own threshold; this one is part of the external contract.
pub const EXPIRING_SOON_DAYS: i64 = 30;

const SECONDS_PER_DAY: i64 = 86_400;

/// Certificate expiry status category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    Valid,
    ExpiringSoon,
    Expired,
}

impl CertificateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::ExpiringSoon => "expiring_soon",
            Self::Expired => "expired",
        }
    }

    /// Badge color used by record-layer UIs
    pub fn color(&self) -> &'static str {
        match self {
            Self::Valid => "success",
            Self::ExpiringSoon => "warning",
            Self::Expired => "danger",
        }
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expiry classification computed from one evaluation timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub is_expired: bool,
    pub days_until_expiry: i64,
    pub status: CertificateStatus,
}

/// Classify a validity window against an evaluation timestamp.
///
/// `days_until_expiry` is the floor of the remaining duration in whole days:
/// a certificate expiring in 30 days and 23 hours reports 30, one expired an
/// hour ago reports -1. The status boundary compares the exact remaining
/// duration, so `valid_until = now + 30 days` is expiring-soon while one
/// second more is valid.
pub fn classify(valid_until: DateTime<Utc>, now: DateTime<Utc>) -> Classification {
    let remaining = valid_until - now;
    let is_expired = now > valid_until;
    let days_until_expiry = remaining.num_seconds().div_euclid(SECONDS_PER_DAY);

    let status = if is_expired {
        CertificateStatus::Expired
    } else if remaining <= Duration::days(EXPIRING_SOON_DAYS) {
        CertificateStatus::ExpiringSoon
    } else {
        CertificateStatus::Valid
    };

    Classification {
        is_expired,
        days_until_expiry,
        status,
    }
}

/// Certificates expiring within `threshold_days`, soonest first.
///
/// The threshold is the externally configurable notification boundary and is
/// independent of the fixed 30-day status boundary. Expired certificates are
/// excluded; use [`expired`] for those.
pub fn expiring_within<'a, I>(certificates: I, threshold_days: i64) -> Vec<&'a CertificateMetadata>
where
    I: IntoIterator<Item = &'a CertificateMetadata>,
{
    let mut matching: Vec<&CertificateMetadata> = certificates
        .into_iter()
        .filter(|m| !m.is_expired && (0..=threshold_days).contains(&m.days_until_expiry))
        .collect();
    matching.sort_by_key(|m| m.valid_until);
    matching
}

/// Expired certificates, most recently expired first.
pub fn expired<'a, I>(certificates: I) -> Vec<&'a CertificateMetadata>
where
    I: IntoIterator<Item = &'a CertificateMetadata>,
{
    let mut matching: Vec<&CertificateMetadata> = certificates
        .into_iter()
        .filter(|m| m.is_expired)
        .collect();
    matching.sort_by_key(|m| std::cmp::Reverse(m.valid_until));
    matching
}
