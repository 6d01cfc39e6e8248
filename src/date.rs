use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Hours the archive publishes per day.
pub const HOURS: std::ops::Range<u32> = 0..24;

/// Parse "YYYYMMDD" or "YYYY-MM-DD".
pub fn parse_date_like(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.len() == 8 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(trimmed, "%Y%m%d")
            .map_err(|_| Error::InvalidRequest(format!("invalid YYYYMMDD date: {trimmed}")));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| Error::InvalidRequest(format!("unsupported date format: {trimmed}")))
}

/// Inclusive range of whole UTC days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

/// The `year`/`month`/`day`/`time` lists an archive request is made of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveDates {
    pub year: Vec<String>,
    pub month: Vec<String>,
    pub day: Vec<String>,
    pub time: Vec<String>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidRequest(format!(
                "date range end {end} < start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// January 1st to December 31st of `year`.
    pub fn year(year: i32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| Error::InvalidRequest(format!("invalid year: {year}")))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| Error::InvalidRequest(format!("invalid year: {year}")))?;
        Self::new(start, end)
    }

    /// Accepts a single date or `START/to/END`.
    pub fn parse(s: &str) -> Result<Self> {
        let tokens: Vec<&str> = s.split('/').map(str::trim).filter(|t| !t.is_empty()).collect();
        match tokens.as_slice() {
            [single] => {
                let d = parse_date_like(single)?;
                Self::new(d, d)
            }
            [start, to, end] if to.eq_ignore_ascii_case("to") => {
                Self::new(parse_date_like(start)?, parse_date_like(end)?)
            }
            _ => Err(Error::InvalidRequest(format!("invalid date range: {s}"))),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }

    /// Every hourly timestamp in the range, ascending.
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.days()
            .flat_map(|d| {
                let midnight = Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN));
                HOURS.map(move |h| midnight + Duration::hours(i64::from(h)))
            })
            .collect()
    }

    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        let d = ts.date_naive();
        self.start <= d && d <= self.end
    }

    /// Resolve into the archive's field lists. The archive expands these as a
    /// cartesian product, so ranges straddling months fetch extra days.
    pub fn archive_fields(&self) -> ArchiveDates {
        let mut years = BTreeSet::new();
        let mut months = BTreeSet::new();
        let mut days = BTreeSet::new();
        for d in self.days() {
            years.insert(d.year());
            months.insert(d.month());
            days.insert(d.day());
        }

        ArchiveDates {
            year: years.into_iter().map(|y| format!("{y:04}")).collect(),
            month: months.into_iter().map(|m| format!("{m:02}")).collect(),
            day: days.into_iter().map(|d| format!("{d:02}")).collect(),
            time: HOURS.map(|h| format!("{h:02}:00")).collect(),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/to/{}", self.start.format("%Y%m%d"), self.end.format("%Y%m%d"))
    }
}

impl FromStr for DateRange {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_date_forms() {
        assert_eq!(parse_date_like("20200102").unwrap(), ymd(2020, 1, 2));
        assert_eq!(parse_date_like(" 2020-01-02 ").unwrap(), ymd(2020, 1, 2));
        assert!(parse_date_like("20201340").is_err());
        assert!(parse_date_like("yesterday").is_err());
    }

    #[test]
    fn relative_day_offsets_are_rejected() {
        for s in ["0", "-5", "-1", "3"] {
            assert!(matches!(parse_date_like(s), Err(Error::InvalidRequest(_))), "{s}");
        }
        assert!("-1".parse::<DateRange>().is_err());
        assert!("0/to/20200101".parse::<DateRange>().is_err());
    }

    #[test]
    fn from_str_is_deterministic() {
        let a: DateRange = "20200101/to/20200103".parse().unwrap();
        let b: DateRange = "2020-01-01/TO/2020-01-03".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parses_ranges() {
        let r = DateRange::parse("20200101/to/2020-01-03").unwrap();
        assert_eq!(r.start(), ymd(2020, 1, 1));
        assert_eq!(r.end(), ymd(2020, 1, 3));
        assert_eq!(r.to_string(), "20200101/to/20200103");

        let single = DateRange::parse("20200229").unwrap();
        assert_eq!(single.start(), single.end());

        assert!(DateRange::parse("20200103/to/20200101").is_err());
        assert!(DateRange::parse("20200101/until/20200103").is_err());
    }

    #[test]
    fn rejects_reversed_range() {
        let err = DateRange::new(ymd(2020, 2, 1), ymd(2020, 1, 1)).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn timestamps_are_hourly_and_never_empty() {
        let r = DateRange::new(ymd(2020, 3, 1), ymd(2020, 3, 1)).unwrap();
        let ts = r.timestamps();
        assert_eq!(ts.len(), 24);
        assert_eq!(ts[0], Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(ts[23], Utc.with_ymd_and_hms(2020, 3, 1, 23, 0, 0).unwrap());
        assert!(ts.windows(2).all(|w| w[0] < w[1]));

        assert_eq!(DateRange::year(2020).unwrap().timestamps().len(), 366 * 24);
    }

    #[test]
    fn archive_fields_are_sorted_and_unique() {
        let r = DateRange::new(ymd(2019, 12, 30), ymd(2020, 1, 2)).unwrap();
        let f = r.archive_fields();
        assert_eq!(f.year, vec!["2019", "2020"]);
        assert_eq!(f.month, vec!["01", "12"]);
        assert_eq!(f.day, vec!["01", "02", "30", "31"]);
        assert_eq!(f.time.len(), 24);
        assert_eq!(f.time[0], "00:00");
        assert_eq!(f.time[23], "23:00");
    }

    #[test]
    fn contains_checks_calendar_day() {
        let r = DateRange::new(ymd(2020, 1, 1), ymd(2020, 1, 2)).unwrap();
        assert!(r.contains(&Utc.with_ymd_and_hms(2020, 1, 2, 23, 0, 0).unwrap()));
        assert!(!r.contains(&Utc.with_ymd_and_hms(2020, 1, 3, 0, 0, 0).unwrap()));
        assert!(!r.contains(&Utc.with_ymd_and_hms(2019, 12, 31, 23, 0, 0).unwrap()));
    }
}
