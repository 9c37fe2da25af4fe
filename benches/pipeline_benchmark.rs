use airquality_processor::analyzers::{aggregate_mean, correlation_matrix, describe};
use airquality_processor::models::{BucketScheme, Column, Table};
use airquality_processor::processors::{bucketize, filter_by_date, DateRange};
use chrono::{Datelike, Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// Hourly observations starting 2013-03-01, roughly shaped like a PRSA station
fn create_hourly_table(hours: usize) -> Table {
    let start = NaiveDate::from_ymd_opt(2013, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let mut datetimes = Vec::with_capacity(hours);
    let mut years = Vec::with_capacity(hours);
    let mut pm25 = Vec::with_capacity(hours);
    let mut pm10 = Vec::with_capacity(hours);
    let mut temp = Vec::with_capacity(hours);
    let mut rain = Vec::with_capacity(hours);

    for hour in 0..hours {
        let at = start + Duration::hours(hour as i64);
        let phase = hour as f64 / 24.0;
        datetimes.push(at);
        years.push(Some(at.year() as f64));
        // every 97th reading is missing, like the NA cells in the source
        pm25.push((hour % 97 != 0).then(|| 80.0 + 60.0 * phase.sin()));
        pm10.push(Some(110.0 + 70.0 * phase.sin() + (hour % 13) as f64));
        temp.push(Some(12.0 + 15.0 * (phase / 365.0).cos()));
        rain.push(Some(if hour % 50 == 0 { 2.5 } else { 0.0 }));
    }

    Table::from_columns(vec![
        Column::datetime("datetime", datetimes),
        Column::numeric("year", years),
        Column::numeric("PM2.5", pm25),
        Column::numeric("PM10", pm10),
        Column::numeric("TEMP", temp),
        Column::numeric("RAIN", rain),
    ])
    .unwrap()
}

fn benchmark_filter_by_date(c: &mut Criterion) {
    let table = create_hourly_table(35_064);
    let range = DateRange::parse("2014-01-01", "2015-12-31").unwrap();

    c.bench_function("filter_by_date_two_years", |b| {
        b.iter(|| filter_by_date(black_box(&table), black_box(&range)))
    });
}

fn benchmark_aggregate_mean(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_mean");

    for hours in [8_760, 35_064].iter() {
        let table = create_hourly_table(*hours);
        group.bench_with_input(BenchmarkId::new("yearly_pm25", hours), hours, |b, _| {
            b.iter(|| aggregate_mean(black_box(&table), "year", "PM2.5"))
        });
    }

    group.finish();
}

fn benchmark_describe(c: &mut Criterion) {
    let table = create_hourly_table(35_064);

    c.bench_function("describe_all_measures", |b| {
        b.iter(|| describe(black_box(&table)))
    });
}

fn benchmark_correlation(c: &mut Criterion) {
    let table = create_hourly_table(35_064);
    let columns = ["PM2.5", "PM10", "TEMP", "RAIN"];

    c.bench_function("correlation_matrix_4x4", |b| {
        b.iter(|| correlation_matrix(black_box(&table), black_box(&columns)))
    });
}

fn benchmark_bucketize(c: &mut Criterion) {
    let table = create_hourly_table(35_064);
    let scheme = BucketScheme::pm25();

    c.bench_function("bucketize_pm25", |b| {
        b.iter(|| bucketize(black_box(&table), "PM2.5", black_box(&scheme)))
    });
}

criterion_group!(
    benches,
    benchmark_filter_by_date,
    benchmark_aggregate_mean,
    benchmark_describe,
    benchmark_correlation,
    benchmark_bucketize
);
criterion_main!(benches);
