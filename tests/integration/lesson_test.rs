//! Lesson queries return what each module teaches, on SQLite.

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use sql_exercise_runner::db::{QueryResult, Value};
use sql_exercise_runner::error::ExerciseError;
use sql_exercise_runner::runner::{ExerciseRunner, RunnerOptions};

use super::{outcome, rows, sqlite_session};

async fn prepared(module: &str) -> ExerciseRunner {
    let (runner, _client) = sqlite_session(RunnerOptions::default()).await;
    runner.setup(module).await.unwrap();
    runner.seed(module).await.unwrap();
    runner
}

fn text_column(result: &QueryResult, column: &str) -> Vec<String> {
    result
        .column_values(column)
        .into_iter()
        .map(|v| v.as_str().unwrap_or_default().to_string())
        .collect()
}

fn decimal_column(result: &QueryResult, column: &str) -> Vec<Decimal> {
    result
        .column_values(column)
        .into_iter()
        .map(|v| {
            v.as_decimal()
                .unwrap_or_else(|| panic!("{column} is not numeric: {v:?}"))
        })
        .collect()
}

fn dec(units: i64, scale: u32) -> Decimal {
    Decimal::new(units, scale)
}

#[tokio::test]
async fn test_products_in_category() {
    let runner = prepared("module_1_sqlite").await;
    let outcome = runner
        .run("module_1_sqlite", "products_in_category")
        .await
        .unwrap();
    let result = rows(&outcome);

    assert_eq!(text_column(result, "ProductName"), vec!["Laptop", "Smartphone"]);
    assert_eq!(
        decimal_column(result, "Price"),
        vec![dec(99999, 2), dec(59999, 2)]
    );
}

#[tokio::test]
async fn test_module_2_lesson_in_order() {
    let runner = prepared("module_2_sqlite").await;
    let results = runner.run_all("module_2_sqlite").await.unwrap();
    assert_eq!(results.len(), 10);

    assert_eq!(outcome(&results, "hire_employee").affected(), Some(1));
    assert_eq!(outcome(&results, "engineering_raise").affected(), Some(2));
    assert_eq!(outcome(&results, "delete_low_earners").affected(), Some(2));

    let top = rows(outcome(&results, "top_earners"));
    assert_eq!(text_column(top, "Name"), vec!["Alice", "Bob", "Frank"]);
    assert_eq!(
        decimal_column(top, "Salary"),
        vec![dec(90000, 0), dec(77000, 0), dec(71000, 0)]
    );

    let everyone = rows(&runner.run("module_2_sqlite", "all_employees").await.unwrap()).clone();
    assert!(decimal_column(&everyone, "Salary")
        .iter()
        .all(|salary| *salary >= dec(60000, 0)));

    let plan = rows(outcome(&results, "explain_top_earners"));
    assert!(!plan.is_empty());
}

#[tokio::test]
async fn test_module_3_joins_and_aggregates() {
    let runner = prepared("module_3_sqlite").await;

    let lines = runner.run("module_3_sqlite", "order_lines").await.unwrap();
    assert_eq!(rows(&lines).row_count(), 2);

    let left = runner
        .run("module_3_sqlite", "customers_and_orders")
        .await
        .unwrap();
    let left = rows(&left);
    assert_eq!(left.row_count(), 3);
    assert!(left.column_values("OrderID").iter().any(|v| v.is_null()));

    let lonely = runner
        .run("module_3_sqlite", "customers_without_orders")
        .await
        .unwrap();
    assert_eq!(text_column(rows(&lonely), "Name"), vec!["Sam Lee"]);

    let pricey = runner
        .run("module_3_sqlite", "products_above_average_price")
        .await
        .unwrap();
    assert_eq!(text_column(rows(&pricey), "ProductName"), vec!["Laptop"]);

    let units = runner.run("module_3_sqlite", "units_by_store").await.unwrap();
    let units = rows(&units);
    assert_eq!(text_column(units, "StoreName"), vec!["Downtown", "Mall"]);
    assert_eq!(
        units
            .column_values("UnitsSold")
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect::<Vec<_>>(),
        vec![15, 13]
    );

    let revenue = runner
        .run("module_3_sqlite", "revenue_by_product")
        .await
        .unwrap();
    assert_eq!(text_column(rows(&revenue), "ProductName"), vec!["Smartphone"]);
}

#[tokio::test]
async fn test_explain_plans() {
    let runner = prepared("module_3_sqlite").await;

    // Plain query: the plan prefix is added
    let plan = runner
        .explain("module_3_sqlite", "orders_by_customer")
        .await
        .unwrap();
    assert!(!plan.is_empty());
    assert!(plan.column_index("detail").is_some());

    // Already an EXPLAIN: runs as written
    let plan = runner
        .explain("module_3_sqlite", "explain_orders_by_customer")
        .await
        .unwrap();
    assert!(!plan.is_empty());
}

#[tokio::test]
async fn test_explain_rejects_definitions() {
    let runner = prepared("module_4_sqlite").await;
    let err = runner
        .explain("module_4_sqlite", "load_sales_summary")
        .await
        .unwrap_err();
    assert!(matches!(err, ExerciseError::Catalog(_)), "{err:?}");
}

#[tokio::test]
async fn test_module_4_extract_transform_load() {
    let runner = prepared("module_4_sqlite").await;
    let results = runner.run_all("module_4_sqlite").await.unwrap();

    assert_eq!(outcome(&results, "record_mouse_sale").affected(), Some(1));
    assert_eq!(outcome(&results, "reprice_laptops").affected(), Some(2));
    assert_eq!(outcome(&results, "delete_small_sales").affected(), Some(1));
    assert_eq!(rows(outcome(&results, "employee_sales")).row_count(), 3);

    let updated = rows(outcome(&results, "employees_updated"));
    assert_eq!(
        decimal_column(updated, "Salary"),
        vec![dec(93500, 0), dec(68200, 0), dec(93500, 0)]
    );

    let summary = rows(outcome(&results, "sales_summary"));
    assert_eq!(text_column(summary, "Product"), vec!["Laptop", "Server"]);
    assert_eq!(
        decimal_column(summary, "Amount"),
        vec![dec(219998, 2), dec(4800, 0)]
    );

    let bonus = rows(outcome(&results, "employees_with_bonus"));
    assert_eq!(text_column(bonus, "Name"), vec!["Alice", "Bob"]);
    assert_eq!(
        decimal_column(bonus, "Bonus"),
        vec![dec(4250, 0), dec(3100, 0)]
    );

    let cleaned = rows(outcome(&results, "inventory_cleaned"));
    assert_eq!(
        cleaned
            .column_values("Quantity")
            .iter()
            .map(|v| v.as_i64())
            .collect::<Vec<_>>(),
        vec![Some(10), Some(0)]
    );

    let inventory = rows(outcome(&results, "inventory"));
    assert_eq!(inventory.column_values("Quantity"), vec![&Value::Int(15), &Value::Null]);

    let sales = rows(outcome(&results, "sales_cleaned"));
    assert_eq!(
        sales
            .column_values("SaleID")
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert!(text_column(sales, "Category")
        .iter()
        .all(|c| c == "Electronics"));
}

#[tokio::test]
async fn test_etl_steps_can_be_rerun() {
    let runner = prepared("module_4_sqlite").await;
    runner.run_all("module_4_sqlite").await.unwrap();

    // The reset steps make a second pass start from a clean slate
    runner
        .run("module_4_sqlite", "reset_sales_summary")
        .await
        .unwrap();
    runner
        .run("module_4_sqlite", "load_sales_summary")
        .await
        .unwrap();
    let summary = runner.run("module_4_sqlite", "sales_summary").await.unwrap();
    assert_eq!(rows(&summary).row_count(), 2);
}
