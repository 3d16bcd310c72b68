//! Domain Value Objects
//!
//! Immutable value types for the unlock-code ledger domain.

use crate::error::{UnlockError, UnlockResult};
use kernel::id::{CourseId, UserId};
use std::fmt;

/// Maximum buyer name length
const BUYER_NAME_MAX_LENGTH: usize = 120;

/// Payment amount in currency minor units
///
/// Stored as an integer; fractional currency never enters the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(i64);

impl Amount {
    /// Create a new amount, rejecting zero and negative values
    pub fn new(minor_units: i64) -> UnlockResult<Self> {
        if minor_units <= 0 {
            return Err(UnlockError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }
        Ok(Self(minor_units))
    }

    /// Create from database value (constraint-checked at write time)
    pub fn from_db(minor_units: i64) -> Self {
        Self(minor_units)
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Buyer name as recorded on the offline receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyerName(String);

impl BuyerName {
    pub fn new(name: impl Into<String>) -> UnlockResult<Self> {
        let name = name.into().trim().to_string();

        if name.is_empty() {
            return Err(UnlockError::Validation(
                "buyer name cannot be empty".to_string(),
            ));
        }
        if name.len() > BUYER_NAME_MAX_LENGTH {
            return Err(UnlockError::Validation(format!(
                "buyer name must be at most {} characters",
                BUYER_NAME_MAX_LENGTH
            )));
        }

        Ok(Self(name))
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuyerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the offline payment was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i16)]
pub enum PaymentMethod {
    #[default]
    Cash = 0,
    BankTransfer = 1,
    MobileWallet = 2,
    Cheque = 3,
    Other = 4,
}

impl PaymentMethod {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use PaymentMethod::*;
        match self {
            Cash => "cash",
            BankTransfer => "bank_transfer",
            MobileWallet => "mobile_wallet",
            Cheque => "cheque",
            Other => "other",
        }
    }

    /// Parse an external code, e.g. from a request body
    #[inline]
    pub fn parse(code: &str) -> Option<Self> {
        use PaymentMethod::*;
        match code {
            "cash" => Some(Cash),
            "bank_transfer" => Some(BankTransfer),
            "mobile_wallet" => Some(MobileWallet),
            "cheque" => Some(Cheque),
            "other" => Some(Other),
            _ => None,
        }
    }

    #[inline]
    pub fn from_id(id: i16) -> Self {
        use PaymentMethod::*;
        match id {
            0 => Cash,
            1 => BankTransfer,
            2 => MobileWallet,
            3 => Cheque,
            4 => Other,
            _ => {
                tracing::error!("Invalid PaymentMethod id: {}", id);
                unreachable!("Invalid PaymentMethod id: {}", id)
            }
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Lifecycle state of an offline transaction
///
/// `PendingRedemption` is also the recoverable marker left behind when
/// code minting fails after the record was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i16)]
pub enum TransactionStatus {
    #[default]
    PendingRedemption = 0,
    Completed = 1,
    Cancelled = 2,
}

impl TransactionStatus {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use TransactionStatus::*;
        match self {
            PendingRedemption => "pending_redemption",
            Completed => "completed",
            Cancelled => "cancelled",
        }
    }

    #[inline]
    pub const fn is_completed(&self) -> bool {
        matches!(self, TransactionStatus::Completed)
    }

    #[inline]
    pub fn from_id(id: i16) -> Self {
        use TransactionStatus::*;
        match id {
            0 => PendingRedemption,
            1 => Completed,
            2 => Cancelled,
            _ => {
                tracing::error!("Invalid TransactionStatus id: {}", id);
                unreachable!("Invalid TransactionStatus id: {}", id)
            }
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// SHA-256 digest of a normalized unlock code
///
/// The authoritative lookup key. The plaintext is retained for display
/// and audit only and is never used for security-sensitive matching.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodeDigest([u8; 32]);

impl CodeDigest {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Rebuild from a stored column value
    pub fn from_bytes(bytes: &[u8]) -> UnlockResult<Self> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| UnlockError::Internal(format!("bad digest length: {}", bytes.len())))?;
        Ok(Self(arr))
    }
}

impl From<[u8; 32]> for CodeDigest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for CodeDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodeDigest({})", self)
    }
}

impl fmt::Display for CodeDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Course existence/title lookup result from the catalog
#[derive(Debug, Clone)]
pub struct CourseSummary {
    pub course_id: CourseId,
    pub title: String,
}

/// Role of the authenticated caller, as asserted by the identity layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    Student,
    Teacher,
    Admin,
}

impl ActorRole {
    #[inline]
    pub const fn code(&self) -> &'static str {
        use ActorRole::*;
        match self {
            Student => "student",
            Teacher => "teacher",
            Admin => "admin",
        }
    }

    #[inline]
    pub fn parse(code: &str) -> Option<Self> {
        use ActorRole::*;
        match code {
            "student" => Some(Student),
            "teacher" => Some(Teacher),
            "admin" => Some(Admin),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, ActorRole::Admin)
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Authenticated caller identity, trusted as already verified upstream
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: UserId,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(user_id: UserId, role: ActorRole) -> Self {
        Self { user_id, role }
    }
}
