use chrono::{Days, NaiveDate, NaiveDateTime};
use log::info;
use std::io;
use std::path::{Path, PathBuf};

const CACHE_DIR_NAME: &str = "climata_rs_cache";

pub fn get_cache_dir() -> io::Result<PathBuf> {
    dirs::cache_dir()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine system cache directory",
            )
        })
        .map(|p| p.join(CACHE_DIR_NAME))
}

pub async fn ensure_cache_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!(
                        "Cache path exists but is not a directory: {}",
                        path.display()
                    ),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating cache directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}

/// Parses `value` with `format`, accepting formats with or without a time component.
/// Any time of day is dropped.
pub fn parse_date(value: &str, format: &str) -> Result<NaiveDate, chrono::ParseError> {
    match NaiveDateTime::parse_from_str(value, format) {
        Ok(datetime) => Ok(datetime.date()),
        Err(_) => NaiveDate::parse_from_str(value, format),
    }
}

/// Every day from `start` to `end`, both inclusive. Empty when `end` precedes `start`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        match current.checked_add_days(Days::new(1)) {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}

/// Parses two date strings and fills in every day between them.
///
/// Used for responses that only report the first and last date of an evenly spaced
/// daily series.
pub fn fill_date_range(
    start: &str,
    end: &str,
    format: &str,
) -> Result<Vec<NaiveDate>, chrono::ParseError> {
    Ok(date_range(parse_date(start, format)?, parse_date(end, format)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_date_range_inclusive() {
        let dates = date_range(ymd(2014, 2, 27), ymd(2014, 3, 2));
        assert_eq!(
            dates,
            vec![ymd(2014, 2, 27), ymd(2014, 2, 28), ymd(2014, 3, 1), ymd(2014, 3, 2)]
        );
    }

    #[test]
    fn test_date_range_single_and_reversed() {
        assert_eq!(date_range(ymd(2014, 7, 1), ymd(2014, 7, 1)), vec![ymd(2014, 7, 1)]);
        assert!(date_range(ymd(2014, 7, 2), ymd(2014, 7, 1)).is_empty());
    }

    #[test]
    fn test_fill_date_range_with_time_format() {
        let dates = fill_date_range(
            "2014-07-01 00:00:00",
            "2014-07-03 00:00:00",
            "%Y-%m-%d %H:%M:%S",
        )
        .unwrap();
        assert_eq!(dates.len(), 3);
        assert_eq!(dates[2], ymd(2014, 7, 3));
    }

    #[test]
    fn test_parse_date_errors() {
        assert!(parse_date("07/01/2014", "%Y-%m-%d").is_err());
        assert_eq!(parse_date("07/01/2014", "%m/%d/%Y").unwrap(), ymd(2014, 7, 1));
    }

    #[tokio::test]
    async fn test_ensure_cache_dir_creates() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("nested").join("cache");
        ensure_cache_dir_exists(&path).await.unwrap();
        assert!(path.is_dir());
        ensure_cache_dir_exists(&path).await.unwrap();
    }
}
