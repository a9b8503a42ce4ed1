use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};

use frosty_core::{
    audit::{LoginEvent, QueryEvent},
    controls::Controls,
    query::{build_query, AuditSchema},
    report::{Mode, ReportKind},
    result::ResultSet,
    warehouse::Warehouse,
    window::TimeWindow,
};
use frosty_duckdb::DuckDbWarehouse;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 3, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn login(user: &str, at: DateTime<Utc>) -> LoginEvent {
    LoginEvent {
        user_name: user.to_string(),
        event_timestamp: at,
        reported_client_type: Some("SNOWFLAKE_UI".to_string()),
    }
}

fn query(user: &str, query_type: &str, database: &str, at: DateTime<Utc>) -> QueryEvent {
    QueryEvent {
        query_id: format!("{user}-{query_type}-{}", at.timestamp_micros()),
        user_name: user.to_string(),
        database_name: Some(database.to_string()),
        schema_name: Some("PUBLIC".to_string()),
        warehouse_name: Some("COMPUTE_WH".to_string()),
        role_name: Some("SYSADMIN".to_string()),
        query_type: query_type.to_string(),
        start_time: at,
    }
}

async fn seeded() -> Arc<DuckDbWarehouse> {
    let db = DuckDbWarehouse::open_in_memory().expect("in-memory DuckDB");
    let now = now();
    let window = TimeWindow::ending_at(now, 7);

    let mut logins = vec![
        login("alice", now - Duration::hours(1)),
        login("alice", now - Duration::hours(2)),
        login("alice", now - Duration::days(1)),
        login("alice", now - Duration::days(2)),
        login("bob", now - Duration::hours(3)),
        login("bob", now - Duration::days(3)),
        // Boundaries: start is inside the window, end is not.
        login("carol", window.start),
        login("dave", window.end),
        login("dave", now - Duration::days(8)),
    ];
    for minutes in 1..=5 {
        logins.push(login("admin", now - Duration::minutes(minutes * 10)));
    }
    db.insert_login_events(&logins).await.expect("seed logins");

    let day1 = now - Duration::days(1);
    let day2 = now - Duration::days(2);
    let day3 = now - Duration::days(3);
    let mut queries = Vec::new();
    for m in 0..3 {
        queries.push(query("alice", "SELECT", "ANALYTICS", day1 + Duration::minutes(m)));
    }
    for m in 0..2 {
        queries.push(query("alice", "CREATE_TABLE", "ANALYTICS", day2 + Duration::minutes(m)));
    }
    queries.push(query("alice", "DESCRIBE", "ANALYTICS", day2 + Duration::minutes(5)));
    queries.push(query("bob", "alter_table", "ANALYTICS", day1 + Duration::minutes(7)));
    queries.push(query("bob", "DROP", "ANALYTICS", day1 + Duration::minutes(8)));
    for m in 0..2 {
        queries.push(query("bob", "INSERT", "ANALYTICS", day3 + Duration::minutes(m)));
    }
    for m in 0..4 {
        queries.push(query("admin", "CREATE_TABLE", "RAW", day1 + Duration::minutes(20 + m)));
    }
    queries.push(query("alice", "SELECT", "ANALYTICS", now - Duration::days(10)));
    db.insert_query_events(&queries).await.expect("seed queries");

    Arc::new(db)
}

async fn run(db: &DuckDbWarehouse, kind: ReportKind, exclude: &str, top_n: i64) -> ResultSet {
    let controls = Controls::new(kind.mode(), Some(7), Some(exclude), Some(top_n));
    let window = TimeWindow::ending_at(now(), controls.window_days);
    let spec = build_query(kind, &controls, &window, &AuditSchema::default());
    db.execute(&spec).await.expect("execute report")
}

fn column(rs: &ResultSet, name: &str) -> Vec<Value> {
    rs.column(name)
        .expect("column present")
        .into_iter()
        .cloned()
        .collect()
}

#[tokio::test]
async fn test_top_users_by_logins_counts_half_open_window() {
    let db = seeded().await;
    let rs = run(&db, ReportKind::TopUsersByLogins, "", 10).await;

    assert_eq!(rs.columns, vec!["USER", "LOGIN_COUNT"]);
    assert_eq!(
        column(&rs, "USER"),
        vec![json!("admin"), json!("alice"), json!("bob"), json!("carol")]
    );
    assert_eq!(
        column(&rs, "LOGIN_COUNT"),
        vec![json!(5), json!(4), json!(2), json!(1)]
    );
}

#[tokio::test]
async fn test_exclusion_removes_exactly_named_users() {
    let db = seeded().await;
    let rs = run(&db, ReportKind::TopUsersByLogins, "'admin','carol'", 10).await;
    assert_eq!(column(&rs, "USER"), vec![json!("alice"), json!("bob")]);
}

#[tokio::test]
async fn test_exclusion_value_is_not_sql() {
    let db = seeded().await;
    let rs = run(
        &db,
        ReportKind::TopUsersByLogins,
        "'x') OR USER_NAME IN ('alice'",
        10,
    )
    .await;
    assert_eq!(rs.len(), 4, "filter text must be treated as literal names");
}

#[tokio::test]
async fn test_top_n_caps_rows() {
    let db = seeded().await;
    for top_n in 1..=3 {
        let rs = run(&db, ReportKind::TopUsersByLogins, "", top_n).await;
        assert_eq!(rs.len(), top_n as usize);
    }
    let rs = run(&db, ReportKind::TopQueryPatterns, "", 2).await;
    assert_eq!(rs.len(), 2);
    assert_eq!(rs.rows[0][0], json!("alice"));
    assert_eq!(rs.rows[0][5], json!(6));
    // 4-4 tie between admin and bob resolves on USER_NAME.
    assert_eq!(rs.rows[1][0], json!("admin"));
}

#[tokio::test]
async fn test_average_logins_divide_by_window() {
    let db = seeded().await;
    let rs = run(&db, ReportKind::TopUsersByAvgLogins, "'admin'", 10).await;
    assert_eq!(rs.columns, vec!["USER", "AVG_LOGIN_COUNT"]);
    assert_eq!(rs.rows[0][0], json!("alice"));
    let avg = rs.rows[0][1].as_f64().expect("float average");
    assert!((avg - 4.0 / 7.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_recent_logins_newest_first() {
    let db = seeded().await;
    let rs = run(&db, ReportKind::RecentLogins, "'admin'", 3).await;
    assert_eq!(rs.columns, vec!["USER", "LOGIN_TIME", "CLIENT_TYPE"]);
    assert_eq!(
        column(&rs, "USER"),
        vec![json!("alice"), json!("alice"), json!("bob")]
    );
    let times: Vec<String> = column(&rs, "LOGIN_TIME")
        .into_iter()
        .map(|v| v.as_str().expect("text").to_string())
        .collect();
    assert!(times[0].starts_with("2026-03-03 11:00:00"));
    assert!(times.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(rs.rows[0][2], json!("SNOWFLAKE_UI"));
}

#[tokio::test]
async fn test_query_trend_ascends_by_day() {
    let db = seeded().await;
    let rs = run(&db, ReportKind::QueryExecutionTrend, "", 1).await;
    assert_eq!(
        column(&rs, "DAY"),
        vec![json!("2026-02-28"), json!("2026-03-01"), json!("2026-03-02")]
    );
    assert_eq!(column(&rs, "QUERY_COUNT"), vec![json!(2), json!(3), json!(9)]);

    let rs = run(&db, ReportKind::QueryExecutionTrend, "'admin'", 1).await;
    assert_eq!(column(&rs, "QUERY_COUNT"), vec![json!(2), json!(3), json!(5)]);
}

#[tokio::test]
async fn test_top_users_by_queries() {
    let db = seeded().await;
    let rs = run(&db, ReportKind::TopUsersByQueries, "'admin'", 10).await;
    assert_eq!(column(&rs, "USER"), vec![json!("alice"), json!("bob")]);
    assert_eq!(column(&rs, "QUERY_COUNT"), vec![json!(6), json!(4)]);
}

#[tokio::test]
async fn test_ddl_reports_match_prefixes_case_insensitively() {
    let db = seeded().await;

    let rs = run(&db, ReportKind::TopDdlOperations, "", 10).await;
    let types = column(&rs, "QUERY_TYPE");
    assert_eq!(rs.len(), 5);
    assert!(types.contains(&json!("alter_table")));
    assert!(types.contains(&json!("DESCRIBE")));
    assert!(!types.contains(&json!("SELECT")));
    assert!(!types.contains(&json!("INSERT")));
    assert_eq!(rs.rows[0], vec![json!("RAW"), json!("PUBLIC"), json!("CREATE_TABLE"), json!(4)]);
    assert_eq!(
        rs.rows[1],
        vec![json!("ANALYTICS"), json!("PUBLIC"), json!("CREATE_TABLE"), json!(2)]
    );
}

#[tokio::test]
async fn test_ddl_by_user_skips_describe() {
    let db = seeded().await;
    let rs = run(&db, ReportKind::DdlOperationsByUser, "", 10).await;
    assert_eq!(rs.columns, vec!["USER_NAME", "QUERY_TYPE", "OPERATION_COUNT"]);
    assert_eq!(rs.len(), 4);
    assert!(!column(&rs, "QUERY_TYPE").contains(&json!("DESCRIBE")));
    assert_eq!(rs.rows[0], vec![json!("admin"), json!("CREATE_TABLE"), json!(4)]);
    assert_eq!(rs.rows[1], vec![json!("alice"), json!("CREATE_TABLE"), json!(2)]);
}

#[tokio::test]
async fn test_ddl_trend_ascends_by_day_per_type() {
    let db = seeded().await;
    let rs = run(&db, ReportKind::DdlOperationTrend, "", 1).await;
    let days: Vec<String> = column(&rs, "DAY")
        .into_iter()
        .map(|v| v.as_str().expect("text").to_string())
        .collect();
    assert_eq!(rs.len(), 5);
    assert!(days.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(days[0], "2026-03-01");
    assert!(column(&rs, "QUERY_TYPE").contains(&json!("DESCRIBE")));
}

#[tokio::test]
async fn test_warehouse_dyn_dispatch_runs_whole_mode() {
    let db = seeded().await;
    let warehouse: Arc<dyn Warehouse> = db.clone();
    warehouse.ping().await.expect("ping");

    let controls = Controls::new(Mode::Ddl, Some(7), None, Some(10));
    let window = TimeWindow::ending_at(now(), controls.window_days);
    for kind in controls.mode.reports() {
        let spec = build_query(kind, &controls, &window, &db.audit_schema());
        let rs = warehouse.execute(&spec).await.expect("execute");
        assert_eq!(rs.columns, spec.column_names());
    }
}

#[tokio::test]
async fn test_empty_mirror_returns_no_rows() {
    let db = DuckDbWarehouse::open_in_memory().expect("in-memory DuckDB");
    for kind in ReportKind::ALL {
        let rs = run(&db, kind, "", 10).await;
        assert!(rs.is_empty(), "{kind:?}");
    }
}

#[tokio::test]
async fn test_every_ranking_report_honours_top_n() {
    let db = seeded().await;
    for kind in ReportKind::ALL.into_iter().filter(|k| !k.is_trend()) {
        let full = run(&db, kind, "", 100).await;
        assert!(full.len() > 2, "{kind:?} needs more than two seeded rows");
        let capped = run(&db, kind, "", 2).await;
        assert_eq!(capped.len(), 2, "{kind:?}");
        assert_eq!(capped.rows[..], full.rows[..2], "{kind:?}");
    }
}

fn write_fixture(name: &str, body: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("frosty-{}-{name}", std::process::id()));
    std::fs::write(&path, body).expect("write fixture");
    path
}

#[tokio::test]
async fn test_csv_exports_replace_the_mirror() {
    let db = seeded().await;
    let logins = write_fixture(
        "logins.csv",
        "EVENT_TIMESTAMP,USER_NAME,REPORTED_CLIENT_TYPE,IS_SUCCESS\n\
         2026-03-03 10:00:00,erin,SNOWFLAKE_UI,YES\n\
         2026-03-02 09:30:00,erin,JDBC_DRIVER,YES\n\
         2026-03-01 08:00:00,frank,SNOWFLAKE_UI,NO\n",
    );
    let queries = write_fixture(
        "queries.csv",
        "QUERY_ID,QUERY_TYPE,USER_NAME,ROLE_NAME,WAREHOUSE_NAME,DATABASE_NAME,SCHEMA_NAME,START_TIME\n\
         q1,CREATE_TABLE,erin,SYSADMIN,COMPUTE_WH,RAW,PUBLIC,2026-03-02 10:00:00\n\
         q2,SELECT,frank,ANALYST,COMPUTE_WH,RAW,PUBLIC,2026-03-02 11:00:00\n",
    );

    assert_eq!(db.load_login_csv(&logins).await.expect("load logins"), 3);
    assert_eq!(db.load_query_csv(&queries).await.expect("load queries"), 2);
    // Loading twice must not duplicate rows.
    assert_eq!(db.load_login_csv(&logins).await.expect("reload logins"), 3);

    {
        let conn = db.conn_for_test().await;
        let stored: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM account_usage.LOGIN_HISTORY",
                [],
                |row| row.get(0),
            )
            .expect("count logins");
        assert_eq!(stored, 3, "seeded rows are replaced, not appended");
    }

    let rs = run(&db, ReportKind::TopUsersByLogins, "", 10).await;
    assert_eq!(column(&rs, "USER"), vec![json!("erin"), json!("frank")]);
    assert_eq!(column(&rs, "LOGIN_COUNT"), vec![json!(2), json!(1)]);

    let rs = run(&db, ReportKind::DdlOperationsByUser, "", 10).await;
    assert_eq!(rs.rows, vec![vec![json!("erin"), json!("CREATE_TABLE"), json!(1)]]);

    std::fs::remove_file(&logins).ok();
    std::fs::remove_file(&queries).ok();
}

#[tokio::test]
async fn test_bad_csv_keeps_previous_mirror() {
    let db = seeded().await;
    let broken = write_fixture("broken.csv", "USER_NAME\nerin\n");
    assert!(db.load_login_csv(&broken).await.is_err());

    let rs = run(&db, ReportKind::TopUsersByLogins, "", 10).await;
    assert_eq!(rs.len(), 4);
    std::fs::remove_file(&broken).ok();
}
