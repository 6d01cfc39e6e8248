use std::cell::RefCell;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use era5_site::{
    Client, ClientOptions, DateRange, Error, GridVariable, GriddedDataset, OutputFormat, RequestParameters,
    Reshaper, Result, Site, Transport, Variable, reshape,
};

/// Serves a canned dataset and records the requests it was given.
struct FakeTransport {
    dataset: GriddedDataset,
    seen: RefCell<Vec<RequestParameters>>,
}

impl FakeTransport {
    fn new(dataset: GriddedDataset) -> Self {
        Self {
            dataset,
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl Transport for FakeTransport {
    fn fetch(&self, request: &RequestParameters) -> Result<GriddedDataset> {
        self.seen.borrow_mut().push(request.clone());
        Ok(self.dataset.clone())
    }
}

struct FailingTransport;

impl Transport for FailingTransport {
    fn fetch(&self, _request: &RequestParameters) -> Result<GriddedDataset> {
        Err(Error::InvalidRequest("archive unavailable".into()))
    }
}

fn hourly(start: DateTime<Utc>, n: usize) -> Vec<DateTime<Utc>> {
    (0..n).map(|h| start + Duration::hours(h as i64)).collect()
}

fn variable(variable: Variable, times: &[DateTime<Utc>], f: impl Fn(usize, usize, usize) -> f64) -> GridVariable {
    let latitudes = vec![10.0, 11.0];
    let longitudes = vec![20.0, 21.0];
    let mut values = Vec::new();
    for i in 0..latitudes.len() {
        for j in 0..longitudes.len() {
            for t in 0..times.len() {
                values.push(f(i, j, t));
            }
        }
    }
    GridVariable {
        variable,
        latitudes,
        longitudes,
        times: times.to_vec(),
        values,
        fill_value: Some(-32767.0),
        preliminary_values: None,
    }
}

#[test]
fn two_variables_three_timestamps() {
    let t0 = Utc.with_ymd_and_hms(2020, 6, 1, 10, 0, 0).unwrap();
    let times = hourly(t0, 3);
    let ds = GriddedDataset::new(vec![
        variable(Variable::Temperature2m, &times, |i, j, t| 280.0 + (i * 100 + j * 10 + t) as f64),
        variable(Variable::SurfaceNetSolarRadiation, &times, |i, j, t| (i * 100 + j * 10 + t) as f64),
    ]);

    let table = reshape(ds, &Site::new(10.0, 20.4).unwrap()).unwrap();
    assert_eq!(table.len(), 3);
    for (t, record) in table.records().iter().enumerate() {
        assert_eq!(record.timestamp, times[t]);
        assert_eq!(record.get(Variable::Temperature2m), Some(280.0 + t as f64));
        assert_eq!(record.get(Variable::SurfaceNetSolarRadiation), Some(t as f64));
    }
}

#[test]
fn reshape_is_idempotent() {
    let times = hourly(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(), 24);
    let ds = GriddedDataset::new(vec![variable(Variable::Temperature2m, &times, |i, j, t| {
        if t == 5 { -32767.0 } else { (i + j + t) as f64 }
    })]);
    let site = Site::new(10.6, 20.9).unwrap();

    let a = reshape(ds.clone(), &site).unwrap();
    let b = reshape(ds, &site).unwrap();
    assert_eq!(a, b);

    let (mut csv_a, mut csv_b) = (Vec::new(), Vec::new());
    a.write_csv(&mut csv_a).unwrap();
    b.write_csv(&mut csv_b).unwrap();
    assert_eq!(csv_a, csv_b);
    assert_eq!(a.column(Variable::Temperature2m)[5], None);
    // Nearest cell is (11, 21): lat index 1, lon index 1.
    assert_eq!(a.column(Variable::Temperature2m)[0], Some(2.0));
}

#[test]
fn zero_length_time_axis_is_empty() {
    let ds = GriddedDataset::new(vec![variable(Variable::Temperature2m, &[], |_, _, _| 0.0)]);
    let err = reshape(ds, &Site::new(10.0, 20.0).unwrap()).unwrap_err();
    assert!(matches!(err, Error::EmptyDataset(_)));
}

#[test]
fn mismatched_grids_fail_before_output() {
    let times = hourly(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(), 3);
    let mut wind = variable(Variable::WindU10, &times, |_, _, _| 1.0);
    wind.longitudes.push(22.0);
    let ds = GriddedDataset::new(vec![variable(Variable::Temperature2m, &times, |_, _, _| 1.0), wind]);
    let err = Reshaper::default().reshape(ds, &Site::new(10.0, 20.0).unwrap()).unwrap_err();
    assert!(matches!(err, Error::InconsistentGrid { .. }));
}

#[test]
fn client_runs_full_pipeline() {
    let day = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
    // The archive hands back the hour before the range as well.
    let times = hourly(Utc.with_ymd_and_hms(2020, 5, 31, 23, 0, 0).unwrap(), 25);
    let ds = GriddedDataset::new(vec![
        variable(Variable::Temperature2m, &times, |_, _, _| 293.15),
        // ERA5-Land running total: 3600 J/m^2 more every hour, reset at 01 UTC.
        variable(Variable::SurfaceNetSolarRadiation, &times, |_, _, t| match t {
            0 => 500_000.0,
            1 => 510_000.0,
            _ => 3600.0 * (t - 1) as f64,
        }),
    ]);
    let transport = FakeTransport::new(ds);
    let client = Client::new(ClientOptions::default(), &transport);

    let site = Site::new(10.2, 20.1).unwrap();
    let range = DateRange::new(day, day).unwrap();
    let table = client
        .retrieve_table(&site, ["t2m", "ssr"], &range)
        .unwrap();

    let seen = transport.seen.borrow();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].area.contains(10.2, 20.1));
    assert_eq!(seen[0].dates.day, vec!["01"]);
    assert!((seen[0].area.north - 10.3).abs() < 1e-9);

    assert_eq!(table.len(), 24);
    assert!(table.has_output_units());
    assert_eq!(table.records()[0].timestamp, Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap());
    let temps = table.column(Variable::Temperature2m);
    assert!(temps.iter().all(|t| (t.unwrap() - 20.0).abs() < 1e-9));
    let ghi = table.column(Variable::SurfaceNetSolarRadiation);
    assert!((ghi[0].unwrap() - 10_000.0 / 3600.0).abs() < 1e-9);
    assert_eq!(ghi[1], Some(1.0));
    assert!(ghi[2..].iter().all(|v| *v == Some(1.0)));

    let mut buf = Vec::new();
    table.write_csv(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.starts_with("Time,Air temperature (deg C),Global irradiance (W/m2)\n"));
}

#[test]
fn client_surfaces_errors_without_retry() {
    let client = Client::new(ClientOptions::default(), FailingTransport);
    let range = DateRange::year(2020).unwrap();
    let site = Site::new(0.0, 0.0).unwrap();

    assert!(matches!(
        client.retrieve_table(&site, ["t2m"], &range),
        Err(Error::InvalidRequest(_))
    ));
    assert!(matches!(
        client.retrieve_table(&site, ["precipitation"], &range),
        Err(Error::UnsupportedVariable(_))
    ));
}

#[test]
fn wrong_location_is_rejected() {
    let times = hourly(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(), 2);
    let ds = GriddedDataset::new(vec![variable(Variable::Temperature2m, &times, |_, _, _| 1.0)]);
    let client = Client::new(ClientOptions::default(), FakeTransport::new(ds));
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
    )
    .unwrap();

    let err = client
        .retrieve_table(&Site::new(-10.0, -160.0).unwrap(), ["t2m"], &range)
        .unwrap_err();
    assert!(matches!(err, Error::SiteOutsideGrid { .. }));
}

fn june_first() -> DateRange {
    let day = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
    DateRange::new(day, day).unwrap()
}

#[test]
fn unrequested_variables_are_dropped() {
    let times = hourly(Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap(), 24);
    let ds = GriddedDataset::new(vec![
        variable(Variable::WindU10, &times, |_, _, _| 3.0),
        variable(Variable::Temperature2m, &times, |_, _, _| 283.15),
    ]);
    let client = Client::new(ClientOptions::default(), FakeTransport::new(ds));
    let site = Site::new(10.0, 20.0).unwrap();

    let table = client.retrieve_table(&site, ["t2m"], &june_first()).unwrap();
    assert_eq!(table.columns(), &[Variable::Temperature2m]);
    assert!(table.records().iter().all(|r| r.get(Variable::WindU10).is_none()));

    let mut buf = Vec::new();
    table.write_csv(&mut buf).unwrap();
    assert!(String::from_utf8(buf).unwrap().starts_with("Time,Air temperature (deg C)\n"));

    let err = client.retrieve_table(&site, ["t2m", "ssr"], &june_first()).unwrap_err();
    assert!(matches!(err, Error::InconsistentGrid { ref variable, .. } if variable == "surface_net_solar_radiation"));
}

#[test]
fn client_requests_chosen_format() {
    let times = hourly(Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap(), 24);
    let ds = GriddedDataset::new(vec![variable(Variable::Temperature2m, &times, |_, _, _| 283.15)]);
    let transport = FakeTransport::new(ds);
    let opts = ClientOptions {
        format: OutputFormat::Grib,
        ..ClientOptions::default()
    };
    let client = Client::new(opts, &transport);

    client
        .retrieve_table(&Site::new(10.0, 20.0).unwrap(), ["t2m"], &june_first())
        .unwrap();
    let seen = transport.seen.borrow();
    assert_eq!(seen[0].format, OutputFormat::Grib);
    assert_eq!(seen[0].to_json().unwrap()["format"], "grib");
}

#[test]
fn preliminary_data_fills_recent_hours() {
    let times = hourly(Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap(), 24);
    // Final data stops after 12 UTC; ERA5T covers the rest.
    let mut t2m = variable(Variable::Temperature2m, &times, |_, _, t| {
        if t < 12 { 283.15 } else { -32767.0 }
    });
    let preliminary = variable(Variable::Temperature2m, &times, |_, _, t| {
        if t < 12 { 999.0 } else { 293.15 }
    });
    t2m.preliminary_values = Some(preliminary.values);
    let client = Client::new(ClientOptions::default(), FakeTransport::new(GriddedDataset::new(vec![t2m])));

    let table = client
        .retrieve_table(&Site::new(10.0, 20.0).unwrap(), ["t2m"], &june_first())
        .unwrap();
    let temps = table.column(Variable::Temperature2m);
    assert_eq!(temps.len(), 24);
    assert!(temps[..12].iter().all(|t| (t.unwrap() - 10.0).abs() < 1e-9));
    assert!(temps[12..].iter().all(|t| (t.unwrap() - 20.0).abs() < 1e-9));
}
