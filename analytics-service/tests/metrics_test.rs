//! Metric calculation scenarios against a seeded customer base.

mod common;

use common::TestApp;
use serde_json::{json, Value};

fn approx(value: &Value, expected: f64) -> bool {
    value
        .as_f64()
        .map(|v| (v - expected).abs() < 1e-9)
        .unwrap_or(false)
}

#[tokio::test]
async fn mrr_for_single_monthly_customer() {
    let app = TestApp::spawn().await;

    let plan_id = app.seed_plan("Pro", 100.0, "monthly").await;
    // Subscribed on the 1st of the reference month
    app.seed_plan_customer(&plan_id, "2024-03-01T00:00:00Z").await;

    let mrr = app.get_json("/analytics/mrr?date=2024-03-15").await;
    assert_eq!(mrr["current"], 100.0);
    assert_eq!(mrr["previous"], 0.0);
    assert_eq!(mrr["growth"], 0.0);

    let arr = app.get_json("/analytics/arr?date=2024-03-15").await;
    assert_eq!(arr["current"], 1200.0);
    assert_eq!(arr["growth"], 0.0);

    app.cleanup().await;
}

#[tokio::test]
async fn mrr_is_zero_without_active_customers() {
    let app = TestApp::spawn().await;

    let id = app
        .seed_customer(json!({
            "name": "Former customer",
            "email": "former@example.com",
            "monthly_amount": 100.0,
            "subscribed_at": "2024-01-01T00:00:00Z"
        }))
        .await;
    app.churn_customer(&id, "2024-02-10T00:00:00Z").await;

    let mrr = app.get_json("/analytics/mrr?date=2024-03-15").await;
    assert_eq!(mrr["current"], 0.0);

    let arr = app.get_json("/analytics/arr?date=2024-03-15").await;
    assert_eq!(arr["current"], 0.0);

    app.cleanup().await;
}

#[tokio::test]
async fn mrr_normalizes_billing_cycles() {
    let app = TestApp::spawn().await;

    let monthly = app.seed_plan("Monthly", 100.0, "monthly").await;
    let quarterly = app.seed_plan("Quarterly", 300.0, "quarterly").await;
    let yearly = app.seed_plan("Yearly", 1200.0, "yearly").await;
    for plan_id in [&monthly, &quarterly, &yearly] {
        app.seed_plan_customer(plan_id, "2024-02-10T00:00:00Z").await;
    }

    let mrr = app.get_json("/analytics/mrr?date=2024-03-15").await;
    assert_eq!(mrr["current"], 300.0);

    let arr = app.get_json("/analytics/arr?date=2024-03-15").await;
    assert_eq!(arr["current"], 3600.0);

    app.cleanup().await;
}

#[tokio::test]
async fn mrr_falls_back_to_customer_amount_without_plan() {
    let app = TestApp::spawn().await;

    app.seed_customer(json!({
        "name": "Legacy",
        "email": "legacy@example.com",
        "monthly_amount": 25.0,
        "subscribed_at": "2024-02-10T00:00:00Z"
    }))
    .await;

    let mrr = app.get_json("/analytics/mrr?date=2024-03-15").await;
    assert_eq!(mrr["current"], 25.0);

    app.cleanup().await;
}

#[tokio::test]
async fn mrr_growth_compares_to_prior_month() {
    let app = TestApp::spawn().await;

    let plan_id = app.seed_plan("Pro", 100.0, "monthly").await;
    app.seed_plan_customer(&plan_id, "2024-02-10T00:00:00Z").await;
    app.seed_plan_customer(&plan_id, "2024-03-10T00:00:00Z").await;

    let mrr = app.get_json("/analytics/mrr?date=2024-03-15").await;
    assert_eq!(mrr["current"], 200.0);
    assert_eq!(mrr["previous"], 100.0);
    assert_eq!(mrr["growth"], 100.0);

    app.cleanup().await;
}

#[tokio::test]
async fn churn_rate_for_two_of_ten_customers() {
    let app = TestApp::spawn().await;

    let plan_id = app.seed_plan("Pro", 100.0, "monthly").await;
    // 10 customers active at the start of March
    for _ in 0..10 {
        app.seed_plan_customer(&plan_id, "2024-01-10T00:00:00Z").await;
    }
    // 2 more who started before March and churn within it
    for _ in 0..2 {
        let id = app.seed_plan_customer(&plan_id, "2024-01-10T00:00:00Z").await;
        app.churn_customer(&id, "2024-03-05T00:00:00Z").await;
    }

    let churn = app.get_json("/analytics/churn?date=2024-03-15").await;
    assert_eq!(churn["current"], 20.0);
    assert_eq!(churn["previous"], 0.0);
    // growth is the delta in percentage points
    assert_eq!(churn["growth"], 20.0);

    app.cleanup().await;
}

#[tokio::test]
async fn churn_rate_is_zero_without_customers() {
    let app = TestApp::spawn().await;

    let churn = app.get_json("/analytics/churn?date=2024-03-15").await;
    assert_eq!(churn["current"], 0.0);
    assert_eq!(churn["previous"], 0.0);
    assert_eq!(churn["growth"], 0.0);

    app.cleanup().await;
}

#[tokio::test]
async fn ltv_divides_arpu_by_churn_fraction() {
    let app = TestApp::spawn().await;

    let plan_id = app.seed_plan("Standard", 50.0, "monthly").await;
    // 10 active customers at $50/month -> ARPU = 50
    for _ in 0..10 {
        app.seed_plan_customer(&plan_id, "2024-01-05T00:00:00Z").await;
    }
    // 1 of 10 at month start churns -> churn rate 10%
    let id = app.seed_plan_customer(&plan_id, "2024-01-05T00:00:00Z").await;
    app.churn_customer(&id, "2024-03-10T00:00:00Z").await;

    let ltv = app.get_json("/analytics/ltv?date=2024-03-15").await;
    assert!(approx(&ltv["current"], 500.0), "ltv was {}", ltv["current"]);
    assert_eq!(ltv["previous"], 0.0);
    assert_eq!(ltv["growth"], 0.0);

    app.cleanup().await;
}

#[tokio::test]
async fn ltv_is_zero_without_churn() {
    let app = TestApp::spawn().await;

    let plan_id = app.seed_plan("Standard", 50.0, "monthly").await;
    app.seed_plan_customer(&plan_id, "2024-01-05T00:00:00Z").await;

    let ltv = app.get_json("/analytics/ltv?date=2024-03-15").await;
    assert_eq!(ltv["current"], 0.0);

    app.cleanup().await;
}

#[tokio::test]
async fn cac_averages_acquisition_cost_over_new_customers() {
    let app = TestApp::spawn().await;

    app.seed_customer(json!({
        "name": "March A",
        "email": "a@example.com",
        "acquisition_cost": 200.0,
        "subscribed_at": "2024-03-05T00:00:00Z"
    }))
    .await;
    app.seed_customer(json!({
        "name": "March B",
        "email": "b@example.com",
        "acquisition_cost": 400.0,
        "subscribed_at": "2024-03-20T00:00:00Z"
    }))
    .await;
    // Outside the reference month, must not count
    app.seed_customer(json!({
        "name": "February",
        "email": "feb@example.com",
        "acquisition_cost": 1000.0,
        "subscribed_at": "2024-02-05T00:00:00Z"
    }))
    .await;

    let cac = app.get_json("/analytics/cac?date=2024-03-15").await;
    assert_eq!(cac["current"], 300.0);
    assert_eq!(cac["previous"], 0.0);
    assert_eq!(cac["growth"], 0.0);

    app.cleanup().await;
}

#[tokio::test]
async fn cac_is_zero_without_new_customers() {
    let app = TestApp::spawn().await;

    app.seed_customer(json!({
        "name": "Old",
        "email": "old@example.com",
        "acquisition_cost": 500.0,
        "subscribed_at": "2024-01-05T00:00:00Z"
    }))
    .await;

    let cac = app.get_json("/analytics/cac?date=2024-06-15").await;
    assert_eq!(cac["current"], 0.0);

    app.cleanup().await;
}

#[tokio::test]
async fn summary_returns_all_metrics_with_arr_at_12x_mrr() {
    let app = TestApp::spawn().await;

    let plan_id = app.seed_plan("Pro", 79.0, "monthly").await;
    app.seed_plan_customer(&plan_id, "2024-02-10T00:00:00Z").await;
    app.seed_plan_customer(&plan_id, "2024-03-10T00:00:00Z").await;

    let summary = app.get_json("/analytics/summary?date=2024-03-15").await;
    for metric in ["mrr", "arr", "churn_rate", "ltv", "cac"] {
        assert!(
            summary[metric]["current"].is_number(),
            "missing metric {}",
            metric
        );
    }

    let mrr = summary["mrr"]["current"].as_f64().unwrap();
    let arr = summary["arr"]["current"].as_f64().unwrap();
    assert_eq!(arr, mrr * 12.0);

    app.cleanup().await;
}

#[tokio::test]
async fn history_is_ordered_oldest_first() {
    let app = TestApp::spawn().await;

    let plan_id = app.seed_plan("Pro", 100.0, "monthly").await;
    app.seed_plan_customer(&plan_id, "2024-02-10T00:00:00Z").await;

    let history = app
        .get_json("/analytics/history?date=2024-03-15&months=3")
        .await;
    let entries = history.as_array().expect("history should be an array");
    assert_eq!(entries.len(), 3);

    let months: Vec<&str> = entries
        .iter()
        .map(|e| e["month"].as_str().unwrap())
        .collect();
    assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);

    assert_eq!(entries[0]["metrics"]["mrr"]["current"], 0.0);
    assert_eq!(entries[1]["metrics"]["mrr"]["current"], 100.0);
    assert_eq!(entries[2]["metrics"]["mrr"]["current"], 100.0);

    app.cleanup().await;
}

#[tokio::test]
async fn customer_growth_counts_as_of_month_end() {
    let app = TestApp::spawn().await;

    app.seed_customer(json!({
        "name": "Jan A",
        "email": "jan-a@example.com",
        "subscribed_at": "2024-01-05T00:00:00Z"
    }))
    .await;
    let churner = app
        .seed_customer(json!({
            "name": "Jan B",
            "email": "jan-b@example.com",
            "subscribed_at": "2024-01-20T00:00:00Z"
        }))
        .await;
    app.seed_customer(json!({
        "name": "Feb",
        "email": "feb@example.com",
        "subscribed_at": "2024-02-10T00:00:00Z"
    }))
    .await;
    app.churn_customer(&churner, "2024-02-15T00:00:00Z").await;

    let growth = app
        .get_json("/analytics/customer-growth?date=2024-03-15&months=3")
        .await;
    let points = growth.as_array().expect("growth should be an array");
    assert_eq!(points.len(), 3);

    assert_eq!(points[0]["month"], "2024-01");
    assert_eq!(points[0]["total"], 2);
    assert_eq!(points[0]["active"], 2);
    assert_eq!(points[0]["churned"], 0);

    assert_eq!(points[1]["month"], "2024-02");
    assert_eq!(points[1]["total"], 3);
    assert_eq!(points[1]["active"], 2);
    assert_eq!(points[1]["churned"], 1);

    assert_eq!(points[2]["month"], "2024-03");
    assert_eq!(points[2]["total"], 3);
    assert_eq!(points[2]["active"], 2);
    assert_eq!(points[2]["churned"], 1);

    app.cleanup().await;
}

#[tokio::test]
async fn metrics_are_isolated_per_tenant() {
    let app = TestApp::spawn().await;

    let plan_id = app.seed_plan("Pro", 100.0, "monthly").await;
    app.seed_plan_customer(&plan_id, "2024-03-01T00:00:00Z").await;

    let response = app
        .get_as("other-org", "/analytics/mrr?date=2024-03-15")
        .await;
    let mrr: Value = response.json().await.expect("invalid JSON");
    assert_eq!(mrr["current"], 0.0);

    app.cleanup().await;
}

#[tokio::test]
async fn reference_date_is_required() {
    let app = TestApp::spawn().await;

    let response = app.get("/analytics/mrr").await;
    assert_eq!(response.status().as_u16(), 400);

    app.cleanup().await;
}
