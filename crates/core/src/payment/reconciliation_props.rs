//! Property-based tests for the reconciliation rules.
//!
//! An in-memory ledger drives the engine through random operation
//! sequences against a single document, applying every plan the engine
//! returns and discarding every call it rejects.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use chrono::Utc;
use settla_shared::types::{PaymentId, UserId};

use crate::payment::cancellation::plan_cancellation;
use crate::payment::cascade::CascadePropagator;
use crate::payment::document::{
    DocumentSnapshot, OrderSnapshot, ParentChain, PartnerKind, PartnerSnapshot, PaymentSnapshot,
};
use crate::payment::error::PaymentError;
use crate::payment::fields::BankFieldsInput;
use crate::payment::service::{PaymentInput, ReconciliationService, ReservationMode};
use crate::payment::types::{
    Actor, DocumentKey, DocumentStatus, PaymentMethod, PaymentStatus, RefType, UserRole,
};

/// Strategy for generating random positive Decimal amounts.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..2_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for document totals.
fn arb_total() -> impl Strategy<Value = Decimal> {
    (100i64..5_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_ref_type() -> impl Strategy<Value = RefType> {
    prop_oneof![
        Just(RefType::PurchaseInvoice),
        Just(RefType::SalesInvoice),
        Just(RefType::PurchaseReturn),
        Just(RefType::SalesReturn),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Create(Decimal),
    Update(usize, Decimal),
    Approve(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        arb_amount().prop_map(Op::Create),
        (any::<usize>(), arb_amount()).prop_map(|(i, a)| Op::Update(i, a)),
        any::<usize>().prop_map(Op::Approve),
    ]
}

/// A document, its parents and its payments, held in memory.
struct Ledger {
    document: DocumentSnapshot,
    parents: ParentChain,
    payments: Vec<PaymentSnapshot>,
}

impl Ledger {
    fn new(ref_type: RefType, total: Decimal) -> Self {
        let partner_kind = match ref_type {
            RefType::PurchaseInvoice | RefType::SalesReturn => PartnerKind::Supplier,
            RefType::SalesInvoice | RefType::PurchaseReturn => PartnerKind::Customer,
        };
        Self {
            document: DocumentSnapshot {
                key: DocumentKey::new(ref_type, Uuid::new_v4()),
                status: DocumentStatus::New,
                total,
                total_paid: Decimal::ZERO,
                total_revenued: Decimal::ZERO,
                is_deleted: false,
            },
            parents: ParentChain {
                order: OrderSnapshot {
                    id: Uuid::new_v4(),
                    total_charge: total,
                    total_paid: Decimal::ZERO,
                    invoice_status: DocumentStatus::New,
                    fulfillment_status: DocumentStatus::Finished,
                    document_status: DocumentStatus::New,
                },
                partner: PartnerSnapshot {
                    kind: partner_kind,
                    id: Uuid::new_v4(),
                    balance: total,
                },
            },
            payments: Vec::new(),
        }
    }

    fn actor() -> Actor {
        Actor::new(UserId::new(), UserRole::Finance)
    }

    fn input(&self, amount: Decimal) -> PaymentInput {
        PaymentInput {
            ref_type: self.document.key.ref_type,
            ref_id: self.document.key.ref_id,
            recognition_date: Utc::now(),
            method: PaymentMethod::Cash,
            fields: BankFieldsInput::default(),
            amount,
            note: None,
        }
    }

    fn sum_payments(&self, exclude: Option<PaymentId>) -> Decimal {
        self.payments
            .iter()
            .filter(|p| !p.is_deleted && Some(p.id) != exclude)
            .map(|p| p.amount)
            .sum()
    }

    fn sum_cleared_payments(&self) -> Decimal {
        self.payments
            .iter()
            .filter(|p| !p.is_deleted && p.status == PaymentStatus::Cleared)
            .map(|p| p.amount)
            .sum()
    }

    fn create(&mut self, amount: Decimal) -> Result<(), PaymentError> {
        let kind = self.document.key.ref_type.payment_kind();
        let payment = ReconciliationService::validate(kind, &self.input(amount))?;
        let reservation = ReconciliationService::reserve(
            &payment,
            Some(&self.document),
            self.sum_payments(None),
            &Self::actor(),
            ReservationMode::Create,
        )?;
        self.document.status = reservation.document_status;
        self.payments.push(PaymentSnapshot {
            id: PaymentId::new(),
            kind,
            key: payment.key,
            amount: payment.amount,
            status: PaymentStatus::Uncleared,
            is_deleted: false,
        });
        Ok(())
    }

    fn update(&mut self, index: usize, amount: Decimal) -> Result<(), PaymentError> {
        let existing = self.payments[index].clone();
        ReconciliationService::ensure_mutable(&existing)?;
        let payment = ReconciliationService::validate(existing.kind, &self.input(amount))?;
        let reservation = ReconciliationService::reserve(
            &payment,
            Some(&self.document),
            self.sum_payments(Some(existing.id)),
            &Self::actor(),
            ReservationMode::Update,
        )?;
        self.document.status = reservation.document_status;
        self.payments[index].amount = amount;
        Ok(())
    }

    fn approve(&mut self, index: usize) -> Result<(), PaymentError> {
        let payment = self.payments[index].clone();
        let plan = CascadePropagator::plan_approval(
            &payment,
            Some(&self.document),
            self.sum_cleared_payments(),
            Some(&self.parents),
        )?;
        self.payments[index].status = plan.payment_status;
        self.document.status = plan.document_status;
        self.document.total_paid = plan.document_total_paid;
        if let Some(order) = plan.order {
            self.parents.order.total_paid = order.total_paid;
            self.parents.order.invoice_status = order.invoice_status;
            self.parents.order.document_status = order.document_status;
        }
        if let Some(partner) = plan.partner {
            self.parents.partner.balance = partner.balance;
        }
        Ok(())
    }

    fn apply(&mut self, op: &Op) -> Result<(), PaymentError> {
        match *op {
            Op::Create(amount) => self.create(amount),
            Op::Update(i, amount) if !self.payments.is_empty() => {
                self.update(i % self.payments.len(), amount)
            }
            Op::Approve(i) if !self.payments.is_empty() => self.approve(i % self.payments.len()),
            Op::Update(..) | Op::Approve(_) => Ok(()),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Neither reserved nor cleared payments ever exceed the document total,
    /// and accepted amounts are stored exactly as requested.
    #[test]
    fn prop_sum_invariant(
        ref_type in arb_ref_type(),
        total in arb_total(),
        ops in prop::collection::vec(arb_op(), 1..40),
    ) {
        let mut ledger = Ledger::new(ref_type, total);

        for op in &ops {
            let before: Vec<_> = ledger.payments.iter().map(|p| p.amount).collect();
            let result = ledger.apply(op);

            if let (Op::Create(amount), Ok(())) = (op, &result) {
                prop_assert_eq!(ledger.payments.last().map(|p| p.amount), Some(*amount));
            }
            if result.is_err() {
                let after: Vec<_> = ledger.payments.iter().map(|p| p.amount).collect();
                prop_assert_eq!(before, after);
            }

            prop_assert!(ledger.sum_payments(None) <= total);
            prop_assert!(ledger.sum_cleared_payments() <= total);
            prop_assert_eq!(ledger.document.total_paid, ledger.sum_cleared_payments());
        }
    }

    /// Updating a payment checks the other payments' sum, not its own old amount.
    #[test]
    fn prop_update_excludes_own_amount(
        total in arb_total(),
        first_pct in 1u32..100u32,
        new_pct in 1u32..100u32,
    ) {
        let mut ledger = Ledger::new(RefType::PurchaseInvoice, total);
        let first = (total * Decimal::from(first_pct) / Decimal::ONE_HUNDRED).round_dp(2);
        prop_assume!(first > Decimal::ZERO);
        ledger.create(first).unwrap();

        let new_amount = (total * Decimal::from(new_pct) / Decimal::ONE_HUNDRED).round_dp(2);
        prop_assume!(new_amount > Decimal::ZERO);

        // A single payment may always be resized anywhere up to the total.
        prop_assert!(ledger.update(0, new_amount).is_ok());
        prop_assert_eq!(ledger.sum_payments(None), new_amount);
    }

    /// Document status only moves forward, and partial approval never finishes it.
    #[test]
    fn prop_status_monotonic(
        ref_type in arb_ref_type(),
        total in arb_total(),
        ops in prop::collection::vec(arb_op(), 1..40),
    ) {
        let mut ledger = Ledger::new(ref_type, total);
        let mut previous = ledger.document.status;

        for op in &ops {
            let _ = ledger.apply(op);
            let status = ledger.document.status;
            prop_assert!(status >= previous);

            let cleared = ledger.sum_cleared_payments();
            if cleared > Decimal::ZERO {
                prop_assert_eq!(status == DocumentStatus::Finished, cleared == total);
            }
            previous = status;
        }
    }

    /// Approving against an invoice moves invoice, order and partner by exactly the amount.
    #[test]
    fn prop_cascade_consistency(
        ref_type in prop_oneof![Just(RefType::PurchaseInvoice), Just(RefType::SalesInvoice)],
        total in arb_total(),
        pct in 1u32..=100u32,
    ) {
        let mut ledger = Ledger::new(ref_type, total);
        let amount = (total * Decimal::from(pct) / Decimal::ONE_HUNDRED).round_dp(2);
        prop_assume!(amount > Decimal::ZERO);
        ledger.create(amount).unwrap();

        let invoice_before = ledger.document.total_paid;
        let order_before = ledger.parents.order.total_paid;
        let partner_before = ledger.parents.partner.balance;

        ledger.approve(0).unwrap();

        prop_assert_eq!(ledger.document.total_paid - invoice_before, amount);
        prop_assert_eq!(ledger.parents.order.total_paid - order_before, amount);
        prop_assert_eq!(partner_before - ledger.parents.partner.balance, amount);

        let settled = amount == total;
        prop_assert_eq!(
            ledger.parents.order.invoice_status == DocumentStatus::Finished,
            settled
        );
        prop_assert_eq!(
            ledger.parents.order.document_status == DocumentStatus::Finished,
            settled
        );
    }

    /// After cancelling a return, its payments no longer count toward any sum.
    #[test]
    fn prop_cancellation_removes_from_sums(
        ref_type in prop_oneof![Just(RefType::PurchaseReturn), Just(RefType::SalesReturn)],
        amounts in prop::collection::vec(1i64..10_000i64, 0..6),
    ) {
        let total = Decimal::new(100_000, 0);
        let mut ledger = Ledger::new(ref_type, total);
        for amount in &amounts {
            ledger.create(Decimal::new(*amount, 0)).unwrap();
        }

        let plan = plan_cancellation(ledger.document.key, Some(&ledger.document), &ledger.payments)
            .unwrap();
        prop_assert_eq!(plan.deleted_payments.len(), amounts.len());

        for payment in &mut ledger.payments {
            if plan.deleted_payments.contains(&payment.id) {
                payment.is_deleted = true;
            }
        }
        ledger.document.status = plan.document_status;

        prop_assert_eq!(ledger.sum_payments(None), Decimal::ZERO);
        let rejected = ledger.create(Decimal::ONE);
        let is_terminal = matches!(rejected, Err(PaymentError::AlreadyTerminal { .. }));
        prop_assert!(is_terminal);
    }
}

#[test]
fn test_scenario_partial_and_final_approval() {
    let total = Decimal::new(50_000, 0);
    let mut ledger = Ledger::new(RefType::PurchaseInvoice, total);
    ledger.create(Decimal::new(40_000, 0)).unwrap();
    ledger.approve(0).unwrap();

    ledger.create(Decimal::new(5_000, 0)).unwrap();
    ledger.approve(1).unwrap();
    assert_eq!(ledger.document.status, DocumentStatus::Active);
    assert_eq!(ledger.document.total_paid, Decimal::new(45_000, 0));

    ledger.create(Decimal::new(5_000, 0)).unwrap();
    ledger.approve(2).unwrap();
    assert_eq!(ledger.document.status, DocumentStatus::Finished);
    assert_eq!(ledger.document.total_paid, total);

    let err = ledger.approve(2).unwrap_err();
    assert!(matches!(err, PaymentError::AlreadyCleared(_)));
}
