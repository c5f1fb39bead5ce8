use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    AttachReport, Engine, EngineError, ExpenseListFilter, MoneyCents, NewExpense, NewInvoice,
    NewTimesheet, NewVendorBill, TimesheetListFilter,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (username, role, rate) in [
        ("dana", "finance", 0i64),
        ("paula", "project_manager", 0),
        ("tom", "team_member", 5000),
        ("bob", "team_member", 0),
    ] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password, role, hourly_rate_minor) VALUES (?, ?, ?, ?)",
            vec![username.into(), "password".into(), role.into(), rate.into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// Project managed by paula with tom and bob as members.
async fn staffed_project(engine: &Engine) -> String {
    let project_id = engine
        .create_project("dana", "Website", Some("Acme Corp"), "paula", MoneyCents::new(1_000_000))
        .await
        .unwrap();
    engine
        .add_project_member("paula", &project_id, "tom")
        .await
        .unwrap();
    engine
        .add_project_member("paula", &project_id, "bob")
        .await
        .unwrap();
    project_id
}

fn expense(project_id: &str, amount: i64, billable: bool) -> NewExpense {
    NewExpense {
        project_id: project_id.to_string(),
        description: "Client travel".to_string(),
        amount: MoneyCents::new(amount),
        billable,
        ..Default::default()
    }
}

#[tokio::test]
async fn approved_billable_expenses_accumulate_on_one_invoice() {
    let (engine, _db) = engine_with_db().await;
    let project_id = staffed_project(&engine).await;

    let first = engine
        .submit_expense("tom", expense(&project_id, 85_000, true))
        .await
        .unwrap();
    let outcome = engine.approve_expense("paula", first).await.unwrap();
    let invoice_id = match outcome.attachment {
        AttachReport::Attached {
            invoice_id,
            invoice_created,
        } => {
            assert!(invoice_created);
            invoice_id
        }
        other => panic!("expected attachment, got {other:?}"),
    };

    let second = engine
        .submit_expense("tom", expense(&project_id, 120_000, true))
        .await
        .unwrap();
    let outcome = engine.approve_expense("paula", second).await.unwrap();
    match outcome.attachment {
        AttachReport::Attached {
            invoice_id: id,
            invoice_created,
        } => {
            assert_eq!(id, invoice_id);
            assert!(!invoice_created);
        }
        other => panic!("expected attachment, got {other:?}"),
    }

    let invoice = engine.invoice("dana", invoice_id).await.unwrap();
    assert_eq!(invoice.amount, MoneyCents::new(205_000));
    assert_eq!(invoice.status.as_str(), "draft");
    assert_eq!(invoice.customer, "Acme Corp");
    assert_eq!(invoice.line_items.len(), 2);
    assert_eq!(invoice.line_items[0].expense_id, Some(first));
    assert_eq!(invoice.line_items[1].expense_id, Some(second));

    // Approval already rolled both amounts into cost.
    let project = engine.project("dana", &project_id).await.unwrap();
    assert_eq!(project.cost, MoneyCents::new(205_000));
}

#[tokio::test]
async fn non_billable_approval_adds_cost_without_invoice() {
    let (engine, _db) = engine_with_db().await;
    let project_id = staffed_project(&engine).await;

    let id = engine
        .submit_expense("tom", expense(&project_id, 10_000, false))
        .await
        .unwrap();
    let outcome = engine.approve_expense("dana", id).await.unwrap();
    assert_eq!(outcome.attachment, AttachReport::NotBillable);

    let project = engine.project("dana", &project_id).await.unwrap();
    assert_eq!(project.cost, MoneyCents::new(10_000));

    // Re-approving is a no-op for the ledger.
    engine.approve_expense("dana", id).await.unwrap();
    let project = engine.project("dana", &project_id).await.unwrap();
    assert_eq!(project.cost, MoneyCents::new(10_000));
}

#[tokio::test]
async fn rejection_never_touches_the_ledger() {
    let (engine, _db) = engine_with_db().await;
    let project_id = staffed_project(&engine).await;

    let id = engine
        .submit_expense("tom", expense(&project_id, 30_000, true))
        .await
        .unwrap();
    let rejected = engine.reject_expense("paula", id).await.unwrap();
    assert_eq!(rejected.status.as_str(), "rejected");

    // Rejection is terminal.
    let err = engine.approve_expense("paula", id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    let project = engine.project("dana", &project_id).await.unwrap();
    assert_eq!(project.cost, MoneyCents::ZERO);
}

#[tokio::test]
async fn reimbursement_requires_an_approved_expense() {
    let (engine, _db) = engine_with_db().await;
    let project_id = staffed_project(&engine).await;

    let id = engine
        .submit_expense("tom", expense(&project_id, 5_000, false))
        .await
        .unwrap();

    let err = engine.reimburse_expense("paula", id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    engine.approve_expense("paula", id).await.unwrap();
    let reimbursed = engine.reimburse_expense("paula", id).await.unwrap();
    assert!(reimbursed.reimbursed);
    assert!(reimbursed.reimbursed_at.is_some());

    // Team members cannot decide on expenses.
    let err = engine.reimburse_expense("bob", id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn team_members_list_only_their_own_expenses() {
    let (engine, _db) = engine_with_db().await;
    let project_id = staffed_project(&engine).await;

    engine
        .submit_expense("tom", expense(&project_id, 1_000, false))
        .await
        .unwrap();
    engine
        .submit_expense("bob", expense(&project_id, 2_000, false))
        .await
        .unwrap();

    let mine = engine
        .list_expenses("tom", ExpenseListFilter::default())
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].submitted_by, "tom");

    let all = engine
        .list_expenses("dana", ExpenseListFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn timesheet_cost_is_applied_and_reversed_on_delete() {
    let (engine, _db) = engine_with_db().await;
    let project_id = staffed_project(&engine).await;

    // tom's rate is 50.00/h, so 6.5 hours cost 325.00.
    let entry_id = engine
        .log_timesheet(
            "tom",
            NewTimesheet {
                project_id: project_id.clone(),
                hours: 6.5,
                billable: true,
                notes: Some("sprint work".to_string()),
                worked_on: NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(),
            },
        )
        .await
        .unwrap();

    let project = engine.project("dana", &project_id).await.unwrap();
    assert_eq!(project.cost, MoneyCents::new(32_500));

    let entries = engine
        .list_my_timesheets("tom", TimesheetListFilter::default())
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].cost, MoneyCents::new(32_500));

    let err = engine.delete_my_timesheet("bob", entry_id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    engine.delete_my_timesheet("tom", entry_id).await.unwrap();
    let project = engine.project("dana", &project_id).await.unwrap();
    assert_eq!(project.cost, MoneyCents::ZERO);
}

#[tokio::test]
async fn unrated_users_log_hours_without_cost() {
    let (engine, _db) = engine_with_db().await;
    let project_id = staffed_project(&engine).await;

    engine
        .log_timesheet(
            "bob",
            NewTimesheet {
                project_id: project_id.clone(),
                hours: 8.0,
                billable: false,
                notes: None,
                worked_on: NaiveDate::from_ymd_opt(2026, 8, 21).unwrap(),
            },
        )
        .await
        .unwrap();

    let project = engine.project("dana", &project_id).await.unwrap();
    assert_eq!(project.cost, MoneyCents::ZERO);
}

#[tokio::test]
async fn rebuild_repairs_a_skewed_accumulator() {
    let (engine, db) = engine_with_db().await;
    let project_id = staffed_project(&engine).await;

    let invoice_id = engine
        .create_invoice(
            "dana",
            NewInvoice {
                customer: "Acme Corp".to_string(),
                project_id: project_id.clone(),
                amount: MoneyCents::new(50_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    engine.mark_invoice_paid("dana", invoice_id).await.unwrap();

    // Corrupt the denormalized revenue directly in the DB.
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE projects SET revenue_minor = ? WHERE id = ?",
        vec![999i64.into(), project_id.clone().into()],
    ))
    .await
    .unwrap();

    let err = engine
        .rebuild_project_ledger("paula", &project_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let report = engine
        .rebuild_project_ledger("dana", &project_id)
        .await
        .unwrap();
    assert!(report.has_drift());
    assert_eq!(report.stored_revenue, MoneyCents::new(999));
    assert_eq!(report.computed_revenue, MoneyCents::new(50_000));

    let project = engine.project("dana", &project_id).await.unwrap();
    assert_eq!(project.revenue, MoneyCents::new(50_000));

    // A second rebuild reports no drift.
    let report = engine
        .rebuild_project_ledger("dana", &project_id)
        .await
        .unwrap();
    assert!(!report.has_drift());
}

#[tokio::test]
async fn dashboard_aggregates_from_the_document_tables() {
    let (engine, _db) = engine_with_db().await;
    let project_id = staffed_project(&engine).await;

    let paid_invoice = engine
        .create_invoice(
            "dana",
            NewInvoice {
                customer: "Acme Corp".to_string(),
                project_id: project_id.clone(),
                amount: MoneyCents::new(100_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    engine.mark_invoice_paid("dana", paid_invoice).await.unwrap();

    // An open invoice counts as outstanding, not revenue.
    engine
        .create_invoice(
            "dana",
            NewInvoice {
                customer: "Acme Corp".to_string(),
                project_id: project_id.clone(),
                amount: MoneyCents::new(20_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let bill = engine
        .create_vendor_bill(
            "dana",
            NewVendorBill {
                vendor: "Print Shop".to_string(),
                project_id: project_id.clone(),
                amount: MoneyCents::new(40_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    engine.mark_vendor_bill_paid("dana", bill).await.unwrap();

    let spent = engine
        .submit_expense("tom", expense(&project_id, 10_000, false))
        .await
        .unwrap();
    engine.approve_expense("dana", spent).await.unwrap();

    let report = engine.finance_dashboard("dana").await.unwrap();
    assert_eq!(report.revenue, MoneyCents::new(100_000));
    assert_eq!(report.cost, MoneyCents::new(50_000));
    assert_eq!(report.gross_profit, MoneyCents::new(50_000));
    assert_eq!(report.outstanding, MoneyCents::new(20_000));

    assert_eq!(report.projects.len(), 1);
    assert_eq!(report.projects[0].revenue, MoneyCents::new(100_000));
    assert_eq!(report.projects[0].cost, MoneyCents::new(50_000));

    assert_eq!(report.vendor_spend.len(), 1);
    assert_eq!(report.vendor_spend[0].vendor, "Print Shop");
    assert_eq!(report.vendor_spend[0].total, MoneyCents::new(40_000));

    let err = engine.finance_dashboard("paula").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}
