//! Read-only queries: object lookup, wallet statistics and listing.

use std::collections::HashSet;

use pinledger_store::LedgerTx;
use pinledger_types::{
    CallContext, Identity, IdentityId, LedgerError, Object, ObjectId, ObjectKind, OpenMethod,
    Pin, Result, ServiceId, Wallet, WalletId, constants,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Look an object up by id or by pin. A 16-digit numeric string is taken
/// as a pin and must pass its checksum.
pub fn get_object<T: LedgerTx>(tx: &T, id_or_pin: &str) -> Result<Object> {
    let key = id_or_pin.trim();
    if key.is_empty() {
        return Err(LedgerError::MissingParameter { field: "id" });
    }
    let found = if key.len() == constants::PIN_LEN && key.bytes().all(|b| b.is_ascii_digit()) {
        let pin = Pin::parse(key)?;
        tx.object_by_pin(pin.as_str())?
    } else {
        tx.object(ObjectId::parse_str(key)?)?
    };
    found.ok_or_else(|| LedgerError::ObjectNotFound(key.to_string()))
}

pub fn get_identity<T: LedgerTx>(tx: &T, id: IdentityId) -> Result<Identity> {
    tx.identity(id)?
        .ok_or_else(|| LedgerError::IdentityNotFound(id.to_string()))
}

pub fn get_wallet<T: LedgerTx>(tx: &T, id: WalletId) -> Result<Wallet> {
    tx.wallet(id)?
        .ok_or_else(|| LedgerError::WalletNotFound(id.to_string()))
}

/// Aggregate statistics over a wallet's objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletNumbers {
    pub objects: usize,
    /// Distinct issuing identities.
    pub issuers: usize,
    pub value_objects: usize,
    pub valueless_objects: usize,
    pub total_balance: Decimal,
    /// Open by any method.
    pub open: usize,
    pub open_timed: usize,
    pub open_pin: usize,
}

pub fn wallet_numbers<T: LedgerTx>(tx: &T, ctx: &CallContext, wallet: WalletId) -> Result<WalletNumbers> {
    let objects = authorized_wallet_objects(tx, ctx, wallet)?;

    let services: HashSet<ServiceId> = objects.iter().map(|o| o.service_id).collect();
    let mut issuers = HashSet::new();
    for service in services {
        let svc = tx
            .service(service)?
            .ok_or_else(|| LedgerError::ServiceNotFound(service.to_string()))?;
        issuers.insert(svc.identity_id);
    }

    let mut numbers = WalletNumbers {
        objects: objects.len(),
        issuers: issuers.len(),
        ..WalletNumbers::default()
    };
    for obj in &objects {
        match obj.kind {
            ObjectKind::Value => {
                numbers.value_objects += 1;
                numbers.total_balance = numbers
                    .total_balance
                    .checked_add(obj.balance)
                    .ok_or_else(|| LedgerError::Internal("wallet balance overflows".into()))?;
            }
            ObjectKind::Valueless => numbers.valueless_objects += 1,
        }
        if let Some(method) = obj.access.method() {
            numbers.open += 1;
            match method {
                OpenMethod::Timed => numbers.open_timed += 1,
                OpenMethod::Pin => numbers.open_pin += 1,
                OpenMethod::Default => {}
            }
        }
    }
    Ok(numbers)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    BalanceDesc,
    BalanceAsc,
}

/// Filters for [`list_wallet_objects`]. Every `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectFilter {
    #[serde(rename = "type")]
    pub kind: Option<ObjectKind>,
    pub service: Option<ServiceId>,
    pub open: Option<bool>,
    pub open_method: Option<OpenMethod>,
    pub sort: SortOrder,
}

impl ObjectFilter {
    fn matches(&self, obj: &Object) -> bool {
        self.kind.is_none_or(|k| obj.kind == k)
            && self.service.is_none_or(|s| obj.service_id == s)
            && self.open.is_none_or(|open| obj.access.is_open() == open)
            && self
                .open_method
                .is_none_or(|m| obj.access.method() == Some(m))
    }
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: usize,
    pub per_page: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: constants::DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    /// Page 0 reads as page 1; a zero size takes the default and sizes
    /// above the cap are clamped.
    #[must_use]
    pub fn normalized(self) -> Self {
        let per_page = match self.per_page {
            0 => constants::DEFAULT_PAGE_SIZE,
            n => n.min(constants::MAX_PAGE_SIZE),
        };
        Self {
            page: self.page.max(1),
            per_page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectPage {
    pub objects: Vec<Object>,
    /// Matches across all pages.
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

pub fn list_wallet_objects<T: LedgerTx>(
    tx: &T,
    ctx: &CallContext,
    wallet: WalletId,
    filter: &ObjectFilter,
    page: Page,
) -> Result<ObjectPage> {
    let page = page.normalized();
    let mut matching: Vec<Object> = authorized_wallet_objects(tx, ctx, wallet)?
        .into_iter()
        .filter(|o| filter.matches(o))
        .collect();

    match filter.sort {
        SortOrder::Oldest => {}
        SortOrder::Newest => matching.reverse(),
        SortOrder::BalanceDesc => matching.sort_by(|a, b| b.balance.cmp(&a.balance)),
        SortOrder::BalanceAsc => matching.sort_by(|a, b| a.balance.cmp(&b.balance)),
    }

    let total = matching.len();
    let objects = matching
        .into_iter()
        .skip((page.page - 1).saturating_mul(page.per_page))
        .take(page.per_page)
        .collect();
    Ok(ObjectPage {
        objects,
        total,
        page: page.page,
        per_page: page.per_page,
    })
}

fn authorized_wallet_objects<T: LedgerTx>(
    tx: &T,
    ctx: &CallContext,
    wallet: WalletId,
) -> Result<Vec<Object>> {
    if ctx.authorizing_wallet()? != wallet {
        return Err(LedgerError::ForeignWallet(wallet));
    }
    get_wallet(tx, wallet)?;
    tx.wallet_objects(wallet)
}
