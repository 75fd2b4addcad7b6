//! # Domain Types
//!
//! Shared enums and persistence-facing types used throughout the café core.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Shared Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │  OrderStatus    │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Created        │   │  Cash           │       │
//! │  │  1000 = 10%     │   │  Paid           │   │  CreditCard     │       │
//! │  └─────────────────┘   │  InPreparation  │   │  LoyaltyPoints  │       │
//! │                        │  Ready          │   │  ...            │       │
//! │  ┌─────────────────┐   │  Completed      │   └─────────────────┘       │
//! │  │  AuditInfo      │   │  Cancelled      │                             │
//! │  │  Entity (trait) │   │  Refunded       │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity Pattern
//! Every aggregate has:
//! - `id`: `Option<i64>` - None until the store assigns one on first save
//! - `version`: optimistic-lock counter checked by the store on every save

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1000 bps = 10% (the flat order tax, see [`crate::ORDER_TAX_RATE`])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// ## Lifecycle
/// ```text
/// Created ──► Paid ──► InPreparation ──► Ready ──► Completed
///    │          │            │             │           │
///    └──────────┴────────────┴─────────────┴──► Cancelled
///               │            │             │           │
///               └────────────┴─────────────┴───────────┴──► Refunded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order has been created but not yet paid for.
    #[default]
    Created,
    /// Payment received, preparation not started.
    Paid,
    /// Kitchen staff are preparing the order.
    InPreparation,
    /// Ready for pickup or delivery.
    Ready,
    /// Delivered to the customer.
    Completed,
    /// Cancelled before completion.
    Cancelled,
    /// Money returned to the customer.
    Refunded,
}

impl OrderStatus {
    /// Human-readable description of the status.
    pub fn description(&self) -> &'static str {
        match self {
            OrderStatus::Created => "Order has been created but not yet paid for",
            OrderStatus::Paid => "Payment has been received but preparation has not started",
            OrderStatus::InPreparation => "Order is being prepared by the kitchen staff",
            OrderStatus::Ready => "Order is ready for pickup or delivery",
            OrderStatus::Completed => "Order has been delivered to the customer",
            OrderStatus::Cancelled => "Order has been cancelled",
            OrderStatus::Refunded => "Order has been refunded",
        }
    }

    /// Anything not already cancelled, completed or refunded can be cancelled.
    pub fn can_cancel(&self) -> bool {
        !matches!(
            self,
            OrderStatus::Cancelled | OrderStatus::Completed | OrderStatus::Refunded
        )
    }

    /// Refunds need a payment to have happened and not already be refunded.
    pub fn can_refund(&self) -> bool {
        !matches!(self, OrderStatus::Created | OrderStatus::Refunded)
    }

    /// True while the order is still in flight.
    pub fn is_active(&self) -> bool {
        !matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }

    /// True if the order can still move along the linear chain.
    pub fn can_progress(&self) -> bool {
        self.is_active()
    }

    /// Next status in the normal flow, `None` at the end of the chain.
    pub fn next_status(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Created => Some(OrderStatus::Paid),
            OrderStatus::Paid => Some(OrderStatus::InPreparation),
            OrderStatus::InPreparation => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Refunded => None,
        }
    }

    /// Returns the status name as stored and logged.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Paid => "PAID",
            OrderStatus::InPreparation => "IN_PREPARATION",
            OrderStatus::Ready => "READY",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// Payment methods accepted at the café.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    /// Apple Pay, Google Pay, etc.
    MobilePayment,
    /// Paying with the loyalty balance itself.
    LoyaltyPoints,
    GiftCard,
    BankTransfer,
    /// Business accounts billed later.
    Invoice,
}

impl PaymentMethod {
    pub fn description(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash payment",
            PaymentMethod::CreditCard => "Credit card payment",
            PaymentMethod::DebitCard => "Debit card payment",
            PaymentMethod::MobilePayment => "Mobile payment (Apple Pay, Google Pay, etc.)",
            PaymentMethod::LoyaltyPoints => "Payment using loyalty program points",
            PaymentMethod::GiftCard => "Gift card payment",
            PaymentMethod::BankTransfer => "Direct bank transfer",
            PaymentMethod::Invoice => "Payment via invoice (for business accounts)",
        }
    }

    /// Whether an electronic authorization step is needed.
    pub fn requires_validation(&self) -> bool {
        !matches!(self, PaymentMethod::Cash | PaymentMethod::Invoice)
    }

    /// Whether the method works while the payment network is down.
    pub fn can_process_offline(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }

    pub fn is_electronic(&self) -> bool {
        !matches!(self, PaymentMethod::Cash)
    }

    /// Paying with points does not earn points.
    pub fn is_eligible_for_loyalty_points(&self) -> bool {
        !matches!(self, PaymentMethod::LoyaltyPoints)
    }
}

// =============================================================================
// Audit / Persistence Contract
// =============================================================================

/// Who touched an aggregate and when.
///
/// Populated by the persistence collaborator around core operations; the
/// core itself never writes these fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AuditInfo {
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl AuditInfo {
    /// Stamps a write. The first stamp also fills the creation fields.
    pub fn touch(&mut self, actor: &str, now: DateTime<Utc>) {
        if self.created_at.is_none() {
            self.created_at = Some(now);
            self.created_by = Some(actor.to_string());
        }
        self.updated_at = Some(now);
        self.updated_by = Some(actor.to_string());
    }
}

/// What the persistence collaborator needs from every aggregate.
///
/// ## Contract
/// - `id` is `None` until the first save assigns one
/// - `version` starts at 0 and is bumped by the store on each save; a save
///   whose version lags the stored one is rejected
pub trait Entity {
    /// Entity name used in logs and errors ("order", "product", ...).
    const KIND: &'static str;

    fn id(&self) -> Option<i64>;
    fn set_id(&mut self, id: i64);
    fn version(&self) -> i64;
    fn set_version(&mut self, version: i64);
    fn audit_mut(&mut self) -> &mut AuditInfo;
}

/// Implements [`Entity`] for a struct with `id`, `version` and `audit` fields.
macro_rules! impl_entity {
    ($ty:ty, $kind:literal) => {
        impl $crate::types::Entity for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> Option<i64> {
                self.id
            }

            fn set_id(&mut self, id: i64) {
                self.id = Some(id);
            }

            fn version(&self) -> i64 {
                self.version
            }

            fn set_version(&mut self, version: i64) {
                self.version = version;
            }

            fn audit_mut(&mut self) -> &mut $crate::types::AuditInfo {
                &mut self.audit
            }
        }
    };
}

pub(crate) use impl_entity;

// =============================================================================
// Unit Tests
// =============================================================================
