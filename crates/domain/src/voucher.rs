//! Discount vouchers.
//!
//! Vouchers are only consulted here. Redeeming one (bumping its usage counter
//! and recording the account) belongs to a separate workflow.

use chrono::{DateTime, Utc};
use common::DocumentId;
use document_store::{Document, DocumentStore};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::pricing::DiscountInput;
use crate::value_objects::{AccountId, Money};

/// Collection holding voucher documents, keyed by code.
pub const VOUCHERS: &str = "vouchers";

/// A percentage discount voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    #[serde(default = "DocumentId::new")]
    pub id: DocumentId,

    pub code: String,
    pub percent: u32,

    #[serde(default)]
    pub max_uses: Option<u32>,

    #[serde(default)]
    pub used_count: u32,

    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,

    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,

    /// Accounts that already redeemed the voucher.
    #[serde(default)]
    pub redeemed_by: Vec<AccountId>,
}

/// Why a voucher cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoucherRejection {
    NotYetValid,
    Expired,
    UsageLimitReached,
    AlreadyRedeemed,
}

impl std::fmt::Display for VoucherRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoucherRejection::NotYetValid => write!(f, "not valid yet"),
            VoucherRejection::Expired => write!(f, "expired"),
            VoucherRejection::UsageLimitReached => write!(f, "usage limit reached"),
            VoucherRejection::AlreadyRedeemed => write!(f, "already redeemed by this account"),
        }
    }
}

impl Voucher {
    pub fn new(code: impl Into<String>, percent: u32) -> Self {
        Self {
            id: DocumentId::new(),
            code: code.into(),
            percent,
            max_uses: None,
            used_count: 0,
            valid_from: None,
            valid_until: None,
            redeemed_by: Vec::new(),
        }
    }

    /// Checks whether the voucher may be used at `now` by `account`.
    pub fn validate(
        &self,
        now: DateTime<Utc>,
        account: Option<AccountId>,
    ) -> Result<(), VoucherRejection> {
        if self.valid_from.is_some_and(|from| now < from) {
            return Err(VoucherRejection::NotYetValid);
        }
        if self.valid_until.is_some_and(|until| now > until) {
            return Err(VoucherRejection::Expired);
        }
        if self.max_uses.is_some_and(|max| self.used_count >= max) {
            return Err(VoucherRejection::UsageLimitReached);
        }
        if account.is_some_and(|account| self.redeemed_by.contains(&account)) {
            return Err(VoucherRejection::AlreadyRedeemed);
        }
        Ok(())
    }

    /// Returns the discount this voucher grants at checkout.
    pub fn discount(&self) -> DiscountInput {
        DiscountInput {
            code: Some(self.code.clone()),
            percent: self.percent,
            amount: Money::zero(),
        }
    }
}

/// Reads and writes vouchers.
#[derive(Clone)]
pub struct VoucherRepository<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> VoucherRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn insert(&self, voucher: &Voucher) -> Result<(), DomainError> {
        let doc = Document::encode(VOUCHERS, normalize_code(&voucher.code), voucher)?
            .with_id(voucher.id);
        self.store.insert(doc).await?;
        Ok(())
    }

    /// Loads a voucher by code, ignoring case and surrounding whitespace.
    pub async fn get(&self, code: &str) -> Result<Option<Voucher>, DomainError> {
        match self.store.find_by_key(VOUCHERS, &normalize_code(code)).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Loads a voucher and checks that it can be used now.
    #[tracing::instrument(skip(self))]
    pub async fn check(
        &self,
        code: &str,
        account: Option<AccountId>,
    ) -> Result<Voucher, DomainError> {
        let voucher = self
            .get(code)
            .await?
            .ok_or_else(|| DomainError::VoucherNotFound(code.to_string()))?;

        voucher
            .validate(Utc::now(), account)
            .map_err(|reason| DomainError::VoucherRejected {
                code: voucher.code.clone(),
                reason,
            })?;
        Ok(voucher)
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
