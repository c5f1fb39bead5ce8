use chrono::{TimeZone, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    DocumentGroupBy, DocumentListFilter, DocumentListing, Engine, EngineError, LineItemInput,
    MoneyCents, NewInvoice, NewPurchaseOrder, NewSalesOrder, NewVendorBill,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    engine_on(db).await
}

async fn engine_on(db: DatabaseConnection) -> (Engine, DatabaseConnection) {
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (username, role, rate) in [
        ("dana", "finance", 0i64),
        ("paula", "project_manager", 0),
        ("tom", "team_member", 5000),
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

async fn new_project(engine: &Engine, name: &str) -> String {
    engine
        .create_project("dana", name, Some("Acme Corp"), "paula", MoneyCents::new(1_000_000))
        .await
        .unwrap()
}

fn so(customer: &str, project_id: &str, amount: i64) -> NewSalesOrder {
    NewSalesOrder {
        customer: customer.to_string(),
        project_id: project_id.to_string(),
        amount: MoneyCents::new(amount),
        ..Default::default()
    }
}

#[tokio::test]
async fn document_numbers_start_at_their_seed_and_increment() {
    let (engine, _db) = engine_with_db().await;
    let project_id = new_project(&engine, "Website").await;

    let first = engine
        .create_sales_order("dana", so("Acme Corp", &project_id, 10_000))
        .await
        .unwrap();
    let second = engine
        .create_sales_order("dana", so("Acme Corp", &project_id, 20_000))
        .await
        .unwrap();

    let first = engine.sales_order("dana", first).await.unwrap();
    let second = engine.sales_order("dana", second).await.unwrap();
    assert_eq!(first.number, "SO-1001");
    assert_eq!(second.number, "SO-1002");

    let po_id = engine
        .create_purchase_order(
            "dana",
            NewPurchaseOrder {
                vendor: "Print Shop".to_string(),
                project_id: project_id.clone(),
                amount: MoneyCents::new(5_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let po = engine.purchase_order("dana", po_id).await.unwrap();
    assert_eq!(po.number, "PO-2001");

    let bill_id = engine
        .create_vendor_bill(
            "dana",
            NewVendorBill {
                vendor: "Print Shop".to_string(),
                project_id: project_id.clone(),
                amount: MoneyCents::new(5_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let bill = engine.vendor_bill("dana", bill_id).await.unwrap();
    assert_eq!(bill.number, "BILL-4001");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creators_never_share_a_number() {
    // A pooled in-memory sqlite hands each connection a separate database,
    // so pin the pool to one connection for this test.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let (engine, _db) = engine_on(Database::connect(options).await.unwrap()).await;
    let project_id = new_project(&engine, "Website").await;

    let engine = std::sync::Arc::new(engine);
    let mut tasks = tokio::task::JoinSet::new();
    for n in 0..8 {
        let engine = engine.clone();
        let project_id = project_id.clone();
        tasks.spawn(async move {
            engine
                .create_sales_order("dana", so(&format!("Customer {n}"), &project_id, 10_000))
                .await
                .unwrap()
        });
    }

    let mut numbers = std::collections::HashSet::new();
    while let Some(id) = tasks.join_next().await {
        let order = engine.sales_order("dana", id.unwrap()).await.unwrap();
        numbers.insert(order.number);
    }
    assert_eq!(numbers.len(), 8);
    for n in 1001..1009 {
        assert!(numbers.contains(&format!("SO-{n}")), "missing SO-{n}");
    }
}

#[tokio::test]
async fn line_items_drive_the_document_amount() {
    let (engine, _db) = engine_with_db().await;
    let project_id = new_project(&engine, "Website").await;

    // 10 × 150.00 at 18% = 1770.00, 8 × 150.00 at 18% = 1416.00
    let id = engine
        .create_sales_order(
            "dana",
            NewSalesOrder {
                customer: "Acme Corp".to_string(),
                project_id: project_id.clone(),
                items: vec![
                    LineItemInput {
                        description: Some("Design".to_string()),
                        quantity: 10.0,
                        unit_price: MoneyCents::new(15_000),
                        tax_rate: 0.18,
                        ..Default::default()
                    },
                    LineItemInput {
                        description: Some("Development".to_string()),
                        quantity: 8.0,
                        unit_price: MoneyCents::new(15_000),
                        tax_rate: 0.18,
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let order = engine.sales_order("dana", id).await.unwrap();
    assert_eq!(order.amount, MoneyCents::new(318_600));
}

#[tokio::test]
async fn create_is_idempotent_per_creator_and_key() {
    let (engine, _db) = engine_with_db().await;
    let project_id = new_project(&engine, "Website").await;

    let mut cmd = so("Acme Corp", &project_id, 10_000);
    cmd.idempotency_key = Some("retry-1".to_string());

    let first = engine.create_sales_order("dana", cmd.clone()).await.unwrap();
    let second = engine.create_sales_order("dana", cmd).await.unwrap();
    assert_eq!(first, second);

    let listing = engine
        .list_sales_orders("dana", DocumentListFilter::default())
        .await
        .unwrap();
    match listing {
        DocumentListing::Rows(rows) => assert_eq!(rows.len(), 1),
        DocumentListing::Groups(_) => panic!("expected rows"),
    }
}

#[tokio::test]
async fn create_rejects_blank_party_and_negative_amount() {
    let (engine, _db) = engine_with_db().await;
    let project_id = new_project(&engine, "Website").await;

    let err = engine
        .create_sales_order("dana", so("   ", &project_id, 10_000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .create_sales_order("dana", so("Acme Corp", &project_id, -1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn sales_order_cannot_skip_confirmation() {
    let (engine, _db) = engine_with_db().await;
    let project_id = new_project(&engine, "Website").await;

    let id = engine
        .create_sales_order("dana", so("Acme Corp", &project_id, 10_000))
        .await
        .unwrap();

    let err = engine.mark_sales_order_paid("dana", id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    engine.confirm_sales_order("dana", id).await.unwrap();
    let order = engine.mark_sales_order_paid("dana", id).await.unwrap();
    assert_eq!(order.status.as_str(), "paid");

    // Repeating a reached transition is a no-op success.
    let order = engine.mark_sales_order_paid("dana", id).await.unwrap();
    assert_eq!(order.status.as_str(), "paid");
}

#[tokio::test]
async fn conversion_copies_items_and_is_single_shot() {
    let (engine, _db) = engine_with_db().await;
    let project_id = new_project(&engine, "Website").await;

    let so_id = engine
        .create_sales_order(
            "dana",
            NewSalesOrder {
                customer: "Acme Corp".to_string(),
                project_id: project_id.clone(),
                items: vec![
                    LineItemInput {
                        quantity: 10.0,
                        unit_price: MoneyCents::new(15_000),
                        tax_rate: 0.18,
                        ..Default::default()
                    },
                    LineItemInput {
                        quantity: 8.0,
                        unit_price: MoneyCents::new(15_000),
                        tax_rate: 0.18,
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    engine.confirm_sales_order("dana", so_id).await.unwrap();

    let converted = engine
        .convert_sales_order_to_invoice("dana", so_id)
        .await
        .unwrap();
    assert_eq!(converted.number, "INV-3001");
    assert_eq!(converted.amount, MoneyCents::new(318_600));

    let invoice = engine.invoice("dana", converted.invoice_id).await.unwrap();
    assert_eq!(invoice.sales_order_id, Some(so_id));
    assert_eq!(invoice.line_items.len(), 2);
    assert!(invoice
        .line_items
        .iter()
        .all(|item| item.sales_order_id == Some(so_id)));

    let order = engine.sales_order("dana", so_id).await.unwrap();
    assert_eq!(order.converted_invoice_id, Some(converted.invoice_id));

    let err = engine
        .convert_sales_order_to_invoice("dana", so_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn invoice_paid_rolls_revenue_exactly_once() {
    let (engine, _db) = engine_with_db().await;
    let project_id = new_project(&engine, "Website").await;

    let id = engine
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

    engine.mark_invoice_paid("dana", id).await.unwrap();
    let project = engine.project("dana", &project_id).await.unwrap();
    assert_eq!(project.revenue, MoneyCents::new(50_000));

    // Paying a paid invoice must not double-count.
    engine.mark_invoice_paid("dana", id).await.unwrap();
    let project = engine.project("dana", &project_id).await.unwrap();
    assert_eq!(project.revenue, MoneyCents::new(50_000));
}

#[tokio::test]
async fn vendor_bill_paid_adds_cost_and_checks_linked_po() {
    let (engine, _db) = engine_with_db().await;
    let project_id = new_project(&engine, "Website").await;
    let other_project = new_project(&engine, "Mobile App").await;

    let po_id = engine
        .create_purchase_order(
            "dana",
            NewPurchaseOrder {
                vendor: "Print Shop".to_string(),
                project_id: project_id.clone(),
                amount: MoneyCents::new(40_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // A bill cannot settle a purchase order of another project.
    let err = engine
        .create_vendor_bill(
            "dana",
            NewVendorBill {
                vendor: "Print Shop".to_string(),
                project_id: other_project.clone(),
                amount: MoneyCents::new(40_000),
                purchase_order_id: Some(po_id),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    let bill_id = engine
        .create_vendor_bill(
            "dana",
            NewVendorBill {
                vendor: "Print Shop".to_string(),
                project_id: project_id.clone(),
                amount: MoneyCents::new(40_000),
                purchase_order_id: Some(po_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    engine.mark_vendor_bill_paid("dana", bill_id).await.unwrap();
    engine.mark_vendor_bill_paid("dana", bill_id).await.unwrap();

    let project = engine.project("dana", &project_id).await.unwrap();
    assert_eq!(project.cost, MoneyCents::new(40_000));
}

#[tokio::test]
async fn listing_filters_by_status_date_and_search() {
    let (engine, _db) = engine_with_db().await;
    let project_id = new_project(&engine, "Website").await;

    let mut early = so("Acme Corp", &project_id, 10_000);
    early.issued_on = Some(Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap());
    let early_id = engine.create_sales_order("dana", early).await.unwrap();

    let mut late = so("Beta GmbH", &project_id, 20_000);
    late.issued_on = Some(Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap());
    engine.create_sales_order("dana", late).await.unwrap();
    engine.confirm_sales_order("dana", early_id).await.unwrap();

    let filter = DocumentListFilter {
        statuses: Some(vec!["confirmed".to_string()]),
        ..Default::default()
    };
    match engine.list_sales_orders("dana", filter).await.unwrap() {
        DocumentListing::Rows(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].customer, "Acme Corp");
        }
        DocumentListing::Groups(_) => panic!("expected rows"),
    }

    let filter = DocumentListFilter {
        from: Some(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()),
        to: Some(Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()),
        ..Default::default()
    };
    match engine.list_sales_orders("dana", filter).await.unwrap() {
        DocumentListing::Rows(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].customer, "Beta GmbH");
        }
        DocumentListing::Groups(_) => panic!("expected rows"),
    }

    let filter = DocumentListFilter {
        search: Some("acme".to_string()),
        ..Default::default()
    };
    match engine.list_sales_orders("dana", filter).await.unwrap() {
        DocumentListing::Rows(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].customer, "Acme Corp");
        }
        DocumentListing::Groups(_) => panic!("expected rows"),
    }

    let filter = DocumentListFilter {
        statuses: Some(vec!["bogus".to_string()]),
        ..Default::default()
    };
    let err = engine.list_sales_orders("dana", filter).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn grouped_listing_returns_buckets_sorted_by_total() {
    let (engine, _db) = engine_with_db().await;
    let website = new_project(&engine, "Website").await;
    let mobile = new_project(&engine, "Mobile App").await;

    engine
        .create_sales_order("dana", so("Acme Corp", &website, 100_000))
        .await
        .unwrap();
    engine
        .create_sales_order("dana", so("Acme Corp", &website, 200_000))
        .await
        .unwrap();
    engine
        .create_sales_order("dana", so("Beta GmbH", &mobile, 50_000))
        .await
        .unwrap();

    let filter = DocumentListFilter {
        group_by: Some(DocumentGroupBy::Project),
        ..Default::default()
    };
    match engine.list_sales_orders("dana", filter).await.unwrap() {
        DocumentListing::Groups(buckets) => {
            assert_eq!(buckets.len(), 2);
            assert_eq!(buckets[0].key, website);
            assert_eq!(buckets[0].count, 2);
            assert_eq!(buckets[0].total, MoneyCents::new(300_000));
            assert_eq!(buckets[1].key, mobile);
            assert_eq!(buckets[1].total, MoneyCents::new(50_000));
        }
        DocumentListing::Rows(_) => panic!("expected groups"),
    }
}

#[tokio::test]
async fn document_visibility_follows_the_caller_scope() {
    let (engine, db) = engine_with_db().await;
    let website = new_project(&engine, "Website").await;

    // A second project managed by someone else.
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password, role, hourly_rate_minor) VALUES (?, ?, ?, ?)",
        vec!["mark".into(), "password".into(), "project_manager".into(), 0i64.into()],
    ))
    .await
    .unwrap();
    let mobile = engine
        .create_project("dana", "Mobile App", None, "mark", MoneyCents::ZERO)
        .await
        .unwrap();

    engine
        .create_sales_order("dana", so("Acme Corp", &website, 100_000))
        .await
        .unwrap();
    engine
        .create_sales_order("dana", so("Beta GmbH", &mobile, 50_000))
        .await
        .unwrap();

    match engine
        .list_sales_orders("paula", DocumentListFilter::default())
        .await
        .unwrap()
    {
        DocumentListing::Rows(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].project_id, website);
        }
        DocumentListing::Groups(_) => panic!("expected rows"),
    }

    let err = engine
        .list_sales_orders("tom", DocumentListFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // A manager cannot create documents on a project they do not manage.
    let err = engine
        .create_sales_order("paula", so("Beta GmbH", &mobile, 10_000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}
