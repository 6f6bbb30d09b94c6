use crate::data::bar::{Bar, PriceSeries};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use std::path::Path;

//year-first only, NN-NN-YYYY is ambiguous between day-first and month-first
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

//column positions resolved from the header row
struct Columns {
    date: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(name))
        };

        //yahoo downloads keep dates in the "price" column
        let date = find("date")
            .or_else(|| find("price"))
            .context("CSV has neither a Date nor a Price column")?;
        let close = find("close").context("CSV has no Close column")?;

        Ok(Columns {
            date,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            close,
            volume: find("volume"),
        })
    }
}

//loads a daily price series from a csv file
//rows whose date or close cannot be parsed are dropped, the rest are sorted by date
//and validated as a PriceSeries (duplicate dates are rejected there)
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<PriceSeries> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(format!("Failed to open CSV file: {:?}", path))?;

    let headers = reader
        .headers()
        .context(format!("Failed to read CSV header from {:?}", path))?
        .clone();
    let columns = Columns::resolve(&headers).context(format!("Unsupported layout in {:?}", path))?;

    let mut bars = Vec::new();
    let mut dropped = 0usize;

    for (index, result) in reader.records().enumerate() {
        let record = result.context(format!("Failed to read CSV record at line {}", index + 2))?;

        match parse_row(&record, &columns) {
            Some(bar) => bars.push(bar),
            None => {
                debug!("dropping line {}: {:?}", index + 2, record);
                dropped += 1;
            }
        }
    }

    bars.sort_by_key(|bar| bar.date);

    info!(
        "loaded {} rows from {:?} ({} dropped)",
        bars.len(),
        path,
        dropped
    );

    PriceSeries::new(bars).context(format!("Invalid price series in {:?}", path))
}

fn parse_row(record: &StringRecord, columns: &Columns) -> Option<Bar> {
    let date = parse_date(record.get(columns.date)?)?;
    let close = parse_number(record.get(columns.close)?)?;

    let field = |column: Option<usize>| {
        column
            .and_then(|index| record.get(index))
            .and_then(parse_number)
    };

    Some(Bar::new(
        date,
        field(columns.open).unwrap_or(close),
        field(columns.high).unwrap_or(close),
        field(columns.low).unwrap_or(close),
        close,
        field(columns.volume).unwrap_or(0.0),
    ))
}

//parses the date formats commonly found in index downloads
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime.date());
        }
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }

    DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z")
        .ok()
        .map(|datetime| datetime.date_naive())
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}
