use chrono::NaiveDate;
use player_progress_lib::analytics::calendar::Period;
use player_progress_lib::analytics::chart::{Warning, MOVING_AVERAGE_PANEL, RAW_RATIO_PANEL};
use player_progress_lib::analytics::query::{ChartQuery, MetricFamily, WindowMonths};
use player_progress_lib::analytics::{
    bucket_records, compute_chart, query_chart, window_records, WindowPlan,
};
use player_progress_lib::analytics::aggregate::aggregate;
use player_progress_lib::error::ErrorKind;
use player_progress_lib::sessions::{
    normalize_rows, GroupKey, GroupKeyField, RawSessionRow, SessionRecord,
};

const LIMIT: usize = 10_000;

fn raw(date: &str, power_level: i64, accuracy_level: i64, power_kicks: u32, accurate_kicks: u32) -> RawSessionRow {
    RawSessionRow {
        date: date.to_string(),
        start: "18:00".to_string(),
        end: "19:00".to_string(),
        power_level: GroupKey::Level(power_level),
        accuracy_level: GroupKey::Level(accuracy_level),
        total_kicks: 100,
        power_kicks,
        accurate_kicks,
        goals: 0,
        sleep_kicks: 0,
        skipped_kicks: 0,
    }
}

fn records(rows: &[RawSessionRow]) -> Vec<SessionRecord> {
    normalize_rows(rows).unwrap()
}

fn query(metric: MetricFamily, period: Period, months: u32) -> ChartQuery {
    ChartQuery::new(metric, period, WindowMonths::new(months).unwrap())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_month_buckets_split_a_shared_window() {
    let sessions = records(&[
        raw("2024-02-10", 5, 5, 40, 50),
        raw("2024-03-05", 5, 5, 60, 70),
    ]);
    let chart = compute_chart(sessions, query(MetricFamily::Power, Period::Month, 1), &WindowPlan::default());

    assert_eq!(chart.rows.len(), 2);
    assert_eq!(chart.rows[0].period_start, date(2024, 2, 1));
    assert_eq!(chart.rows[1].period_start, date(2024, 3, 1));
    assert_eq!(chart.rows[0].group_key, "5");
    // Mar-05 reaches back to Feb-05, so Feb-10 is inside its window
    assert_eq!(chart.rows[0].avg_power, 40.0);
    assert_eq!(chart.rows[1].avg_power, 50.0);
    assert_eq!(chart.rows[1].power_pct, 60.0);
    assert!(chart.warnings.is_empty());
}

#[test]
fn test_aggregate_means_every_column() {
    let sessions = records(&[
        raw("2024-01-08", 2, 1, 20, 40),
        raw("2024-01-09", 2, 1, 40, 60),
        raw("2024-01-10", 3, 1, 90, 90),
    ]);
    let windowed = window_records(sessions, WindowMonths::new(1).unwrap(), &WindowPlan::default());
    let bucketed = bucket_records(windowed);
    let rows = aggregate(&bucketed, Period::Week, GroupKeyField::PowerLevel);

    assert_eq!(rows.len(), 2);
    let level_two = &rows[0];
    assert_eq!(level_two.period_start, date(2024, 1, 8));
    assert_eq!(level_two.group_key, "2");
    assert_eq!(level_two.sessions, 2);
    assert_eq!(level_two.power_pct, 30.0);
    assert_eq!(level_two.accuracy_pct, 50.0);
    // moving averages 20 and 30
    assert_eq!(level_two.avg_power, 25.0);
    assert_eq!(rows[1].group_key, "3");
    assert_eq!(rows[1].avg_power, 90.0);
}

#[test]
fn test_rows_sorted_by_period() {
    let sessions = records(&[
        raw("2024-11-20", 1, 1, 10, 10),
        raw("2023-05-02", 2, 2, 20, 20),
        raw("2024-02-14", 1, 1, 30, 30),
        raw("2023-12-31", 1, 1, 40, 40),
    ]);
    let chart = compute_chart(sessions, query(MetricFamily::Power, Period::Quarter, 3), &WindowPlan::default());
    let starts: Vec<NaiveDate> = chart.rows.iter().map(|r| r.period_start).collect();
    assert_eq!(
        starts,
        vec![date(2023, 4, 1), date(2023, 10, 1), date(2024, 1, 1), date(2024, 10, 1)]
    );
}

#[test]
fn test_empty_input_is_warning_not_error() {
    let chart = compute_chart(Vec::new(), query(MetricFamily::Power, Period::Year, 12), &WindowPlan::default());
    assert!(chart.is_empty());
    assert_eq!(chart.warnings, vec![Warning::EmptyInput]);
    assert_eq!(chart.panels.len(), 2);
}

#[test]
fn test_accuracy_query_flags_grouping_mismatch() {
    let sessions = records(&[raw("2024-01-10", 1, 4, 10, 80)]);
    let chart = compute_chart(sessions.clone(), query(MetricFamily::Accuracy, Period::Month, 3), &WindowPlan::default());
    assert_eq!(
        chart.warnings,
        vec![Warning::GroupingMismatch {
            metric: MetricFamily::Accuracy,
            display_factor: GroupKeyField::AccuracyLevel,
            grouped_by: GroupKeyField::PowerLevel,
        }]
    );
    // Rows are keyed by the accuracy level
    assert_eq!(chart.rows[0].group_key, "4");
    assert_eq!(chart.color_field, "DLA");

    let plan = WindowPlan {
        accuracy_group: GroupKeyField::AccuracyLevel,
        ..WindowPlan::default()
    };
    let chart = compute_chart(sessions, query(MetricFamily::Accuracy, Period::Month, 3), &plan);
    assert!(chart.warnings.is_empty());
}

#[test]
fn test_accuracy_average_follows_configured_group() {
    // Two sessions share accuracy level 4 but have different power levels
    let rows = [raw("2024-01-10", 1, 4, 10, 80), raw("2024-01-20", 2, 4, 10, 40)];

    let default_chart = compute_chart(records(&rows), query(MetricFamily::Accuracy, Period::Month, 3), &WindowPlan::default());
    let plan = WindowPlan {
        accuracy_group: GroupKeyField::AccuracyLevel,
        ..WindowPlan::default()
    };
    let own_key_chart = compute_chart(records(&rows), query(MetricFamily::Accuracy, Period::Month, 3), &plan);

    // Partitioned by power level each session only sees itself: (80 + 40) / 2
    assert_eq!(default_chart.rows[0].avg_accuracy, 60.0);
    // Partitioned by accuracy level the second sees both: (80 + 60) / 2
    assert_eq!(own_key_chart.rows[0].avg_accuracy, 70.0);
}

#[test]
fn test_panels_carry_selected_family() {
    let sessions = records(&[raw("2024-01-10", 1, 4, 10, 80)]);
    let chart = compute_chart(sessions, query(MetricFamily::Accuracy, Period::Month, 3), &WindowPlan::default());
    let avg = chart.panel(MOVING_AVERAGE_PANEL).unwrap();
    let raw_panel = chart.panel(RAW_RATIO_PANEL).unwrap();
    assert_eq!(avg.y_field, "Average_Accuracy");
    assert_eq!(raw_panel.y_field, "Accuracy %");
    assert_eq!(avg.series[0].points[0].value, 80.0);
    assert_eq!(raw_panel.series[0].points[0].value, 80.0);
}

#[test]
fn test_query_chart_rejects_parameters_before_records() {
    // This row would fail normalization; the parameter error must win
    let mut broken = raw("2024-01-10", 1, 1, 0, 0);
    broken.total_kicks = 0;
    let rows = [broken];

    let err = query_chart(&rows, "rate_3", "month", 3, &WindowPlan::default(), LIMIT).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidParameter);
    let err = query_chart(&rows, "rate_1", "fortnight", 3, &WindowPlan::default(), LIMIT).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidParameter);
    let err = query_chart(&rows, "rate_1", "month", 13, &WindowPlan::default(), LIMIT).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidParameter);

    // With valid parameters the broken row surfaces
    let err = query_chart(&rows, "rate_1", "month", 3, &WindowPlan::default(), LIMIT).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DataIntegrity);
}

#[test]
fn test_query_chart_happy_path() {
    let rows = [raw("2024-05-01", 3, 3, 55, 65), raw("2024-05-20", 3, 3, 65, 75)];
    let chart = query_chart(&rows, "Power analysis", "Month", 3, &WindowPlan::default(), LIMIT).unwrap();
    assert_eq!(chart.rows.len(), 1);
    assert_eq!(chart.rows[0].power_pct, 60.0);
    // moving averages 55 and 60
    assert_eq!(chart.rows[0].avg_power, 57.5);
    assert!(chart.rows.iter().all(|r| r.avg_power.is_finite() && r.power_pct.is_finite()));
}

#[test]
fn test_query_chart_applies_row_limit() {
    let rows: Vec<RawSessionRow> = (0..20)
        .map(|day| raw(&format!("2024-03-{:02}", day + 1), 1, 1, 50, 50))
        .collect();

    let err = query_chart(&rows, "rate_1", "week", 1, &WindowPlan::default(), 19).unwrap_err();
    assert_eq!(err.kind, ErrorKind::LimitExceeded);
    // Parameters are still checked first
    let err = query_chart(&rows, "rate_9", "week", 1, &WindowPlan::default(), 19).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidParameter);

    assert!(query_chart(&rows, "rate_1", "week", 1, &WindowPlan::default(), 20).is_ok());
}
