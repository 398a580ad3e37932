//! Certificate expiry evaluation
//!
//! Parses PEM or DER certificate bytes and classifies the remaining lifetime
//! against a warning threshold. Parsing is repeated on every evaluation;
//! certificates are small and infrequently checked, and a cache could serve
//! a stale verdict across a rotation.
//!
//! Parse failures never raise out of the evaluator. They come back as
//! [`CertVerdict::Unreadable`], which callers report distinctly from
//! "expired".

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};

/// Default warning threshold in days
pub const DEFAULT_WARNING_DAYS: i64 = 30;

/// Identity and validity window extracted from one certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    /// Subject distinguished name
    pub subject: String,
    /// Start of the validity window
    pub not_before: DateTime<Utc>,
    /// End of the validity window
    pub not_after: DateTime<Utc>,
}

/// Classification of one certificate at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertVerdict {
    /// Valid and outside the warning window
    Ok {
        info: CertificateInfo,
        days_remaining: i64,
    },
    /// Valid but expires within the warning window
    ExpiringSoon {
        info: CertificateInfo,
        days_remaining: i64,
    },
    /// The validity window has closed
    Expired { info: CertificateInfo },
    /// The bytes could not be decoded as a certificate
    Unreadable { reason: String },
}

/// Decode PEM or DER certificate bytes into a [`CertificateInfo`]
pub fn parse_certificate(bytes: &[u8]) -> Result<CertificateInfo> {
    if bytes.starts_with(b"-----BEGIN") {
        let (_, pem) = x509_parser::pem::parse_x509_pem(bytes)
            .map_err(|e| Error::CertificateParse(format!("invalid PEM: {e}")))?;
        let cert = pem
            .parse_x509()
            .map_err(|e| Error::CertificateParse(format!("invalid X.509 in PEM: {e}")))?;
        return info_from(&cert);
    }

    let (_, cert) = x509_parser::parse_x509_certificate(bytes)
        .map_err(|e| Error::CertificateParse(format!("invalid DER: {e}")))?;
    info_from(&cert)
}

fn info_from(cert: &x509_parser::certificate::X509Certificate<'_>) -> Result<CertificateInfo> {
    let validity = cert.validity();
    let not_before = DateTime::from_timestamp(validity.not_before.timestamp(), 0)
        .ok_or_else(|| Error::CertificateParse("notBefore out of range".to_string()))?;
    let not_after = DateTime::from_timestamp(validity.not_after.timestamp(), 0)
        .ok_or_else(|| Error::CertificateParse("notAfter out of range".to_string()))?;
    Ok(CertificateInfo {
        subject: cert.subject().to_string(),
        not_before,
        not_after,
    })
}

/// Classifies certificate lifetimes against a warning threshold
#[derive(Debug, Clone)]
pub struct CertificateExpiryEvaluator {
    warning_days: i64,
}

impl CertificateExpiryEvaluator {
    /// Build an evaluator with the given warning threshold in days
    pub fn new(warning_days: i64) -> Self {
        Self { warning_days }
    }

    /// Evaluate raw certificate bytes against the current time
    pub fn evaluate(&self, bytes: &[u8]) -> CertVerdict {
        self.evaluate_at(bytes, Utc::now())
    }

    /// Evaluate raw certificate bytes at a given instant
    ///
    /// Days remaining are whole-day truncated (floor), not rounded: a
    /// certificate 5 days and 23 hours from expiry reports 5 days.
    pub fn evaluate_at(&self, bytes: &[u8], now: DateTime<Utc>) -> CertVerdict {
        let info = match parse_certificate(bytes) {
            Ok(info) => info,
            Err(err) => {
                return CertVerdict::Unreadable {
                    reason: err.to_string(),
                };
            }
        };

        if now >= info.not_after {
            return CertVerdict::Expired { info };
        }

        let days_remaining = (info.not_after - now).num_days();
        // A threshold too large to represent as an instant covers every
        // certificate lifetime.
        let within_warning = match Duration::try_days(self.warning_days)
            .and_then(|window| now.checked_add_signed(window))
        {
            Some(threshold) => info.not_after <= threshold,
            None => self.warning_days > 0,
        };
        if within_warning {
            CertVerdict::ExpiringSoon {
                info,
                days_remaining,
            }
        } else {
            CertVerdict::Ok {
                info,
                days_remaining,
            }
        }
    }
}

impl Default for CertificateExpiryEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_WARNING_DAYS)
    }
}
