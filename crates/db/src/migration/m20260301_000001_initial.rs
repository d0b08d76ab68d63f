//! Initial database migration.
//!
//! Creates the partner, order, invoice, return and payment tables together
//! with their enum types.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: PARTNERS
        // ============================================================
        db.execute_unprepared(PARTNERS_SQL).await?;

        // ============================================================
        // PART 3: ORDERS
        // ============================================================
        db.execute_unprepared(ORDERS_SQL).await?;

        // ============================================================
        // PART 4: INVOICES & RETURNS
        // ============================================================
        db.execute_unprepared(INVOICES_SQL).await?;
        db.execute_unprepared(RETURNS_SQL).await?;

        // ============================================================
        // PART 5: PAYMENTS
        // ============================================================
        db.execute_unprepared(PAYMENTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Payment direction
CREATE TYPE payment_kind AS ENUM ('expense', 'revenue');

-- Documents a payment can settle
CREATE TYPE ref_type AS ENUM (
    'purchase_invoice',
    'sales_invoice',
    'purchase_return',
    'sales_return'
);

-- How the money moved
CREATE TYPE payment_method AS ENUM ('cash', 'debit_card', 'credit_card', 'giro');

-- Payment settlement state
CREATE TYPE payment_status AS ENUM ('uncleared', 'cleared');

-- Document lifecycle (cancelled applies to returns only)
CREATE TYPE document_status AS ENUM ('new', 'active', 'finished', 'cancelled');
";

const PARTNERS_SQL: &str = r"
CREATE TABLE suppliers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    total_credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    is_deleted BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE customers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    total_debt NUMERIC(19, 4) NOT NULL DEFAULT 0,
    is_deleted BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const ORDERS_SQL: &str = r"
CREATE TABLE purchase_orders (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    supplier_id UUID NOT NULL REFERENCES suppliers(id),
    code VARCHAR(50) NOT NULL,
    total_charge NUMERIC(19, 4) NOT NULL,
    total_paid NUMERIC(19, 4) NOT NULL DEFAULT 0,
    invoice_status document_status NOT NULL DEFAULT 'new',
    receiving_status document_status NOT NULL DEFAULT 'new',
    document_status document_status NOT NULL DEFAULT 'new',
    is_deleted BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_purchase_order_total CHECK (total_charge >= 0)
);

CREATE INDEX idx_purchase_orders_supplier ON purchase_orders(supplier_id);

CREATE TABLE sales_orders (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    customer_id UUID NOT NULL REFERENCES customers(id),
    code VARCHAR(50) NOT NULL,
    total_charge NUMERIC(19, 4) NOT NULL,
    total_paid NUMERIC(19, 4) NOT NULL DEFAULT 0,
    invoice_status document_status NOT NULL DEFAULT 'new',
    delivery_status document_status NOT NULL DEFAULT 'new',
    document_status document_status NOT NULL DEFAULT 'new',
    is_deleted BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_sales_order_total CHECK (total_charge >= 0)
);

CREATE INDEX idx_sales_orders_customer ON sales_orders(customer_id);
";

const INVOICES_SQL: &str = r"
CREATE TABLE purchase_invoices (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    purchase_order_id UUID NOT NULL REFERENCES purchase_orders(id),
    code VARCHAR(50) NOT NULL,
    total_amount NUMERIC(19, 4) NOT NULL,
    total_paid NUMERIC(19, 4) NOT NULL DEFAULT 0,
    document_status document_status NOT NULL DEFAULT 'new',
    is_deleted BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_purchase_invoice_total CHECK (total_amount >= 0),
    CONSTRAINT chk_purchase_invoice_status CHECK (document_status <> 'cancelled')
);

CREATE INDEX idx_purchase_invoices_order ON purchase_invoices(purchase_order_id);

-- total_revenued is maintained by the receipt subsystem
CREATE TABLE sales_invoices (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    sales_order_id UUID NOT NULL REFERENCES sales_orders(id),
    code VARCHAR(50) NOT NULL,
    total_amount NUMERIC(19, 4) NOT NULL,
    total_paid NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total_revenued NUMERIC(19, 4) NOT NULL DEFAULT 0,
    document_status document_status NOT NULL DEFAULT 'new',
    is_deleted BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_sales_invoice_total CHECK (total_amount >= 0),
    CONSTRAINT chk_sales_invoice_status CHECK (document_status <> 'cancelled')
);

CREATE INDEX idx_sales_invoices_order ON sales_invoices(sales_order_id);
";

const RETURNS_SQL: &str = r"
CREATE TABLE purchase_returns (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    supplier_id UUID NOT NULL REFERENCES suppliers(id),
    code VARCHAR(50) NOT NULL,
    total_amount NUMERIC(19, 4) NOT NULL,
    total_paid NUMERIC(19, 4) NOT NULL DEFAULT 0,
    document_status document_status NOT NULL DEFAULT 'new',
    is_deleted BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_purchase_return_total CHECK (total_amount >= 0)
);

CREATE INDEX idx_purchase_returns_supplier ON purchase_returns(supplier_id);

CREATE TABLE sales_returns (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    customer_id UUID NOT NULL REFERENCES customers(id),
    code VARCHAR(50) NOT NULL,
    total_amount NUMERIC(19, 4) NOT NULL,
    total_paid NUMERIC(19, 4) NOT NULL DEFAULT 0,
    document_status document_status NOT NULL DEFAULT 'new',
    is_deleted BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_sales_return_total CHECK (total_amount >= 0)
);

CREATE INDEX idx_sales_returns_customer ON sales_returns(customer_id);
";

const PAYMENTS_SQL: &str = r"
-- Expense and revenue payments; ref_id points into one of the four document tables
CREATE TABLE payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    kind payment_kind NOT NULL,
    ref_type ref_type NOT NULL,
    ref_id UUID NOT NULL,
    recognition_date TIMESTAMPTZ NOT NULL,
    payment_method payment_method NOT NULL,
    bank_number VARCHAR(100),
    bank_name VARCHAR(100),
    bank_holder VARCHAR(255),
    bank_account_id UUID,
    amount NUMERIC(19, 4) NOT NULL,
    note TEXT,
    document_status payment_status NOT NULL DEFAULT 'uncleared',
    is_deleted BOOLEAN NOT NULL DEFAULT false,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_by UUID NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_payment_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_payment_kind_ref_type CHECK (
        (kind = 'expense' AND ref_type IN ('purchase_invoice', 'sales_return'))
        OR (kind = 'revenue' AND ref_type IN ('sales_invoice', 'purchase_return'))
    )
);

-- Sum queries per document
CREATE INDEX idx_payments_ref ON payments(ref_type, ref_id, document_status) WHERE is_deleted = false;

-- Listing per kind, newest first
CREATE INDEX idx_payments_kind_date ON payments(kind, recognition_date DESC) WHERE is_deleted = false;
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS sales_returns CASCADE;
DROP TABLE IF EXISTS purchase_returns CASCADE;
DROP TABLE IF EXISTS sales_invoices CASCADE;
DROP TABLE IF EXISTS purchase_invoices CASCADE;
DROP TABLE IF EXISTS sales_orders CASCADE;
DROP TABLE IF EXISTS purchase_orders CASCADE;
DROP TABLE IF EXISTS customers CASCADE;
DROP TABLE IF EXISTS suppliers CASCADE;

DROP TYPE IF EXISTS document_status;
DROP TYPE IF EXISTS payment_status;
DROP TYPE IF EXISTS payment_method;
DROP TYPE IF EXISTS ref_type;
DROP TYPE IF EXISTS payment_kind;
";
