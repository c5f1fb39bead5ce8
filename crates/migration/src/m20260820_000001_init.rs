//! Initial schema migration - creates all tables from scratch.
//!
//! Complete schema for Contabile:
//!
//! - `users`: authentication, role, hourly rate
//! - `projects`: reference data plus the two ledger accumulators
//! - `project_members`: team membership, feeds the access scope
//! - `sequences`: per-document-type number counters
//! - `sales_orders`, `purchase_orders`, `customer_invoices`,
//!   `vendor_bills`: the four billing document tables
//! - `line_items`: priced rows, shared across document types
//! - `expenses`: submitted/approved/rejected employee expenses
//! - `timesheets`: logged hours with the cost applied at log time

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
    Role,
    HourlyRateMinor,
}

#[derive(Iden)]
enum Projects {
    Table,
    Id,
    Name,
    Client,
    ManagerId,
    BudgetMinor,
    RevenueMinor,
    CostMinor,
}

#[derive(Iden)]
enum ProjectMembers {
    Table,
    ProjectId,
    Username,
}

#[derive(Iden)]
enum Sequences {
    Table,
    DocType,
    NextValue,
}

#[derive(Iden)]
enum SalesOrders {
    Table,
    Id,
    Number,
    Customer,
    ProjectId,
    AmountMinor,
    Status,
    ConvertedInvoiceId,
    Description,
    IssuedOn,
    CreatedBy,
    IdempotencyKey,
}

#[derive(Iden)]
enum PurchaseOrders {
    Table,
    Id,
    Number,
    Vendor,
    ProjectId,
    AmountMinor,
    Status,
    Description,
    IssuedOn,
    CreatedBy,
    IdempotencyKey,
}

#[derive(Iden)]
enum CustomerInvoices {
    Table,
    Id,
    Number,
    Customer,
    ProjectId,
    AmountMinor,
    Status,
    SalesOrderId,
    IssuedOn,
    CreatedBy,
    IdempotencyKey,
}

#[derive(Iden)]
enum VendorBills {
    Table,
    Id,
    Number,
    Vendor,
    ProjectId,
    AmountMinor,
    Status,
    PurchaseOrderId,
    AttachmentUrl,
    IssuedOn,
    CreatedBy,
    IdempotencyKey,
}

#[derive(Iden)]
enum LineItems {
    Table,
    Id,
    DocumentKind,
    DocumentId,
    Position,
    Description,
    Product,
    Quantity,
    UnitPriceMinor,
    TaxRate,
    TotalMinor,
    ProjectId,
    SalesOrderId,
    ExpenseId,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    ProjectId,
    Description,
    AmountMinor,
    Billable,
    SubmittedBy,
    ReceiptUrl,
    Status,
    Reimbursed,
    ReimbursedAt,
    Billed,
    BilledAt,
    InvoiceId,
    SubmittedOn,
}

#[derive(Iden)]
enum Timesheets {
    Table,
    Id,
    ProjectId,
    Username,
    Hours,
    Billable,
    Notes,
    CostMinor,
    WorkedOn,
    LoggedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(
                        ColumnDef::new(Users::HourlyRateMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Projects
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Projects::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Projects::Name).string().not_null())
                    .col(ColumnDef::new(Projects::Client).string())
                    .col(ColumnDef::new(Projects::ManagerId).string().not_null())
                    .col(
                        ColumnDef::new(Projects::BudgetMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Projects::RevenueMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Projects::CostMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-projects-manager_id")
                            .from(Projects::Table, Projects::ManagerId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Project members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ProjectMembers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ProjectMembers::ProjectId).string().not_null())
                    .col(ColumnDef::new(ProjectMembers::Username).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(ProjectMembers::ProjectId)
                            .col(ProjectMembers::Username),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-project_members-project_id")
                            .from(ProjectMembers::Table, ProjectMembers::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-project_members-username")
                            .from(ProjectMembers::Table, ProjectMembers::Username)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-project_members-username")
                    .table(ProjectMembers::Table)
                    .col(ProjectMembers::Username)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Sequences (seeded, one row per document kind)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Sequences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sequences::DocType)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sequences::NextValue).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        let seed = Query::insert()
            .into_table(Sequences::Table)
            .columns([Sequences::DocType, Sequences::NextValue])
            .values_panic(["sales_order".into(), 1001.into()])
            .values_panic(["purchase_order".into(), 2001.into()])
            .values_panic(["invoice".into(), 3001.into()])
            .values_panic(["vendor_bill".into(), 4001.into()])
            .to_owned();
        manager.exec_stmt(seed).await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Sales orders
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SalesOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SalesOrders::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SalesOrders::Number).string().not_null())
                    .col(ColumnDef::new(SalesOrders::Customer).string().not_null())
                    .col(ColumnDef::new(SalesOrders::ProjectId).string().not_null())
                    .col(
                        ColumnDef::new(SalesOrders::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SalesOrders::Status).string().not_null())
                    .col(ColumnDef::new(SalesOrders::ConvertedInvoiceId).string())
                    .col(ColumnDef::new(SalesOrders::Description).string())
                    .col(ColumnDef::new(SalesOrders::IssuedOn).timestamp().not_null())
                    .col(ColumnDef::new(SalesOrders::CreatedBy).string().not_null())
                    .col(ColumnDef::new(SalesOrders::IdempotencyKey).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sales_orders-project_id")
                            .from(SalesOrders::Table, SalesOrders::ProjectId)
                            .to(Projects::Table, Projects::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sales_orders-number-unique")
                    .table(SalesOrders::Table)
                    .col(SalesOrders::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sales_orders-idempotency_key")
                    .table(SalesOrders::Table)
                    .col(SalesOrders::CreatedBy)
                    .col(SalesOrders::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sales_orders-project_id")
                    .table(SalesOrders::Table)
                    .col(SalesOrders::ProjectId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Purchase orders
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PurchaseOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseOrders::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::Number).string().not_null())
                    .col(ColumnDef::new(PurchaseOrders::Vendor).string().not_null())
                    .col(ColumnDef::new(PurchaseOrders::ProjectId).string().not_null())
                    .col(
                        ColumnDef::new(PurchaseOrders::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::Status).string().not_null())
                    .col(ColumnDef::new(PurchaseOrders::Description).string())
                    .col(
                        ColumnDef::new(PurchaseOrders::IssuedOn)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::CreatedBy).string().not_null())
                    .col(ColumnDef::new(PurchaseOrders::IdempotencyKey).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchase_orders-project_id")
                            .from(PurchaseOrders::Table, PurchaseOrders::ProjectId)
                            .to(Projects::Table, Projects::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchase_orders-number-unique")
                    .table(PurchaseOrders::Table)
                    .col(PurchaseOrders::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchase_orders-idempotency_key")
                    .table(PurchaseOrders::Table)
                    .col(PurchaseOrders::CreatedBy)
                    .col(PurchaseOrders::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchase_orders-project_id")
                    .table(PurchaseOrders::Table)
                    .col(PurchaseOrders::ProjectId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Customer invoices
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CustomerInvoices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomerInvoices::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CustomerInvoices::Number).string().not_null())
                    .col(
                        ColumnDef::new(CustomerInvoices::Customer)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerInvoices::ProjectId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerInvoices::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CustomerInvoices::Status).string().not_null())
                    .col(ColumnDef::new(CustomerInvoices::SalesOrderId).string())
                    .col(
                        ColumnDef::new(CustomerInvoices::IssuedOn)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerInvoices::CreatedBy)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CustomerInvoices::IdempotencyKey).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-customer_invoices-project_id")
                            .from(CustomerInvoices::Table, CustomerInvoices::ProjectId)
                            .to(Projects::Table, Projects::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-customer_invoices-sales_order_id")
                            .from(CustomerInvoices::Table, CustomerInvoices::SalesOrderId)
                            .to(SalesOrders::Table, SalesOrders::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-customer_invoices-number-unique")
                    .table(CustomerInvoices::Table)
                    .col(CustomerInvoices::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-customer_invoices-idempotency_key")
                    .table(CustomerInvoices::Table)
                    .col(CustomerInvoices::CreatedBy)
                    .col(CustomerInvoices::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-customer_invoices-project_id-status")
                    .table(CustomerInvoices::Table)
                    .col(CustomerInvoices::ProjectId)
                    .col(CustomerInvoices::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Vendor bills
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(VendorBills::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VendorBills::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VendorBills::Number).string().not_null())
                    .col(ColumnDef::new(VendorBills::Vendor).string().not_null())
                    .col(ColumnDef::new(VendorBills::ProjectId).string().not_null())
                    .col(
                        ColumnDef::new(VendorBills::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VendorBills::Status).string().not_null())
                    .col(ColumnDef::new(VendorBills::PurchaseOrderId).string())
                    .col(ColumnDef::new(VendorBills::AttachmentUrl).string())
                    .col(ColumnDef::new(VendorBills::IssuedOn).timestamp().not_null())
                    .col(ColumnDef::new(VendorBills::CreatedBy).string().not_null())
                    .col(ColumnDef::new(VendorBills::IdempotencyKey).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-vendor_bills-project_id")
                            .from(VendorBills::Table, VendorBills::ProjectId)
                            .to(Projects::Table, Projects::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-vendor_bills-purchase_order_id")
                            .from(VendorBills::Table, VendorBills::PurchaseOrderId)
                            .to(PurchaseOrders::Table, PurchaseOrders::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-vendor_bills-number-unique")
                    .table(VendorBills::Table)
                    .col(VendorBills::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-vendor_bills-idempotency_key")
                    .table(VendorBills::Table)
                    .col(VendorBills::CreatedBy)
                    .col(VendorBills::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-vendor_bills-project_id")
                    .table(VendorBills::Table)
                    .col(VendorBills::ProjectId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Line items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LineItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LineItems::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LineItems::DocumentKind).string().not_null())
                    .col(ColumnDef::new(LineItems::DocumentId).string().not_null())
                    .col(ColumnDef::new(LineItems::Position).integer().not_null())
                    .col(ColumnDef::new(LineItems::Description).string())
                    .col(ColumnDef::new(LineItems::Product).string())
                    .col(ColumnDef::new(LineItems::Quantity).double().not_null())
                    .col(
                        ColumnDef::new(LineItems::UnitPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LineItems::TaxRate).double().not_null())
                    .col(
                        ColumnDef::new(LineItems::TotalMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LineItems::ProjectId).string())
                    .col(ColumnDef::new(LineItems::SalesOrderId).string())
                    .col(ColumnDef::new(LineItems::ExpenseId).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-line_items-document")
                    .table(LineItems::Table)
                    .col(LineItems::DocumentKind)
                    .col(LineItems::DocumentId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 10. Expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::ProjectId).string().not_null())
                    .col(ColumnDef::new(Expenses::Description).string().not_null())
                    .col(ColumnDef::new(Expenses::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::Billable).boolean().not_null())
                    .col(ColumnDef::new(Expenses::SubmittedBy).string().not_null())
                    .col(ColumnDef::new(Expenses::ReceiptUrl).string())
                    .col(ColumnDef::new(Expenses::Status).string().not_null())
                    .col(ColumnDef::new(Expenses::Reimbursed).boolean().not_null())
                    .col(ColumnDef::new(Expenses::ReimbursedAt).timestamp())
                    .col(ColumnDef::new(Expenses::Billed).boolean().not_null())
                    .col(ColumnDef::new(Expenses::BilledAt).timestamp())
                    .col(ColumnDef::new(Expenses::InvoiceId).string())
                    .col(ColumnDef::new(Expenses::SubmittedOn).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-project_id")
                            .from(Expenses::Table, Expenses::ProjectId)
                            .to(Projects::Table, Projects::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-submitted_by")
                            .from(Expenses::Table, Expenses::SubmittedBy)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-project_id-status")
                    .table(Expenses::Table)
                    .col(Expenses::ProjectId)
                    .col(Expenses::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-submitted_by")
                    .table(Expenses::Table)
                    .col(Expenses::SubmittedBy)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 11. Timesheets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Timesheets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Timesheets::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Timesheets::ProjectId).string().not_null())
                    .col(ColumnDef::new(Timesheets::Username).string().not_null())
                    .col(ColumnDef::new(Timesheets::Hours).double().not_null())
                    .col(ColumnDef::new(Timesheets::Billable).boolean().not_null())
                    .col(ColumnDef::new(Timesheets::Notes).string())
                    .col(ColumnDef::new(Timesheets::CostMinor).big_integer().not_null())
                    .col(ColumnDef::new(Timesheets::WorkedOn).date().not_null())
                    .col(ColumnDef::new(Timesheets::LoggedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-timesheets-project_id")
                            .from(Timesheets::Table, Timesheets::ProjectId)
                            .to(Projects::Table, Projects::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-timesheets-username")
                            .from(Timesheets::Table, Timesheets::Username)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-timesheets-username-worked_on")
                    .table(Timesheets::Table)
                    .col(Timesheets::Username)
                    .col(Timesheets::WorkedOn)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Timesheets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LineItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VendorBills::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CustomerInvoices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SalesOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sequences::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
