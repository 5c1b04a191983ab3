//! Date/age filters and index selectors as typed on the command line.
//!
//! Date filter: `YYYY-MM-DD` matches shots created on that local calendar
//! date; `<N[hdwmy]` matches shots newer than now minus the duration and
//! `>N[hdwmy]` shots older than it. A month counts as 30 days and a year as
//! 365 days.
//!
//! Index selector: comma-separated indices and inclusive `lo-hi` ranges,
//! e.g. `4,8,15-16`.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use std::cmp::Ordering;
use std::ops::RangeInclusive;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeUnit {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl AgeUnit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "h" => Some(AgeUnit::Hour),
            "d" => Some(AgeUnit::Day),
            "w" => Some(AgeUnit::Week),
            "m" => Some(AgeUnit::Month),
            "y" => Some(AgeUnit::Year),
            _ => None,
        }
    }

    /// Fixed-length approximation, not calendar aware
    fn span(self, magnitude: u32) -> Option<Duration> {
        let n = i64::from(magnitude);
        match self {
            AgeUnit::Hour => Duration::try_hours(n),
            AgeUnit::Day => Duration::try_days(n),
            AgeUnit::Week => Duration::try_weeks(n),
            AgeUnit::Month => Duration::try_days(n.checked_mul(30)?),
            AgeUnit::Year => Duration::try_days(n.checked_mul(365)?),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeDirection {
    /// `<`: created within the window
    Newer,
    /// `>`: created before the window
    Older,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    /// Created on this local calendar date
    On(NaiveDate),
    /// Created relative to `now - span`
    Age {
        direction: AgeDirection,
        span: Duration,
    },
}

impl DateFilter {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::syntax(text, "empty date filter"));
        }

        let direction = match text.as_bytes()[0] {
            b'<' => AgeDirection::Newer,
            b'>' => AgeDirection::Older,
            _ => return parse_calendar_date(text).map(DateFilter::On),
        };

        let rest = text[1..].trim_start();
        let digits_len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (digits, suffix) = rest.split_at(digits_len);
        if digits.is_empty() {
            return Err(Error::syntax(rest, "expected a number after '<' or '>'"));
        }
        let suffix = suffix.trim();
        let unit = AgeUnit::from_suffix(suffix)
            .ok_or_else(|| Error::syntax(suffix, "expected a unit of h, d, w, m or y"))?;
        let span = digits
            .parse::<u32>()
            .ok()
            .and_then(|magnitude| unit.span(magnitude))
            .ok_or_else(|| Error::syntax(digits, "duration is too large"))?;

        Ok(DateFilter::Age { direction, span })
    }

    pub fn matches(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match *self {
            DateFilter::On(date) => created_at.with_timezone(&Local).date_naive() == date,
            DateFilter::Age { direction, span } => {
                // A cutoff before the representable range is older than everything
                let cutoff = now.checked_sub_signed(span);
                match (direction, cutoff) {
                    (AgeDirection::Newer, Some(cutoff)) => created_at > cutoff,
                    (AgeDirection::Newer, None) => true,
                    (AgeDirection::Older, Some(cutoff)) => created_at < cutoff,
                    (AgeDirection::Older, None) => false,
                }
            }
        }
    }
}

impl FromStr for DateFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_calendar_date(text: &str) -> Result<NaiveDate> {
    let shaped = text.len() == 10
        && text.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(Error::syntax(
            text,
            "expected YYYY-MM-DD, <N[hdwmy] or >N[hdwmy]",
        ));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| Error::syntax(text, "not a valid calendar date"))
}

/// Set of shot indices, kept as sorted, disjoint, non-adjacent inclusive ranges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSelector {
    ranges: Vec<RangeInclusive<u32>>,
}

impl IndexSelector {
    pub fn parse(text: &str) -> Result<Self> {
        let mut ranges = Vec::new();

        for token in text.split(',') {
            let token = token.trim();
            if token.is_empty() {
                return Err(Error::syntax(token, "empty index entry"));
            }

            let range = match token.split_once('-') {
                Some((lo, hi)) => {
                    let lo = parse_index(lo.trim(), token)?;
                    let hi = parse_index(hi.trim(), token)?;
                    if lo > hi {
                        return Err(Error::syntax(token, "range start is greater than its end"));
                    }
                    lo..=hi
                }
                None => {
                    let index = parse_index(token, token)?;
                    index..=index
                }
            };
            ranges.push(range);
        }

        Ok(Self::from_ranges(ranges))
    }

    /// Normalize arbitrary, possibly overlapping ranges
    pub fn from_ranges(mut ranges: Vec<RangeInclusive<u32>>) -> Self {
        ranges.retain(|r| r.start() <= r.end());
        ranges.sort_by_key(|r| *r.start());

        let mut merged: Vec<RangeInclusive<u32>> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if *range.start() <= last.end().saturating_add(1) => {
                    if range.end() > last.end() {
                        *last = *last.start()..=*range.end();
                    }
                }
                _ => merged.push(range),
            }
        }

        Self { ranges: merged }
    }

    pub fn contains(&self, index: u32) -> bool {
        self.ranges
            .binary_search_by(|range| {
                if *range.end() < index {
                    Ordering::Less
                } else if *range.start() > index {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            })
            .is_ok()
    }

    pub fn ranges(&self) -> &[RangeInclusive<u32>] {
        &self.ranges
    }
}

impl FromStr for IndexSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Errors name the whole comma-separated `entry` the number came from
fn parse_index(number: &str, entry: &str) -> Result<u32> {
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::syntax(entry, "expected a non-negative integer"));
    }
    number
        .parse()
        .map_err(|_| Error::syntax(entry, "index is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn selected(text: &str, upto: u32) -> Vec<u32> {
        let selector = IndexSelector::parse(text).unwrap();
        (0..=upto).filter(|i| selector.contains(*i)).collect()
    }

    fn syntax_token(err: Error) -> String {
        match err {
            Error::Syntax { token, .. } => token,
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_index_range() {
        assert_eq!(selected("5-8", 100), vec![5, 6, 7, 8]);
    }

    #[test]
    fn test_index_singletons() {
        assert_eq!(selected("4,8,15,16", 100), vec![4, 8, 15, 16]);
    }

    #[test]
    fn test_index_whitespace_and_overlap() {
        let selector = IndexSelector::parse(" 10 - 12 , 3, 11-20,2-4 ,21").unwrap();
        assert_eq!(selector.ranges().to_vec(), vec![2..=4, 10..=21]);
    }

    #[test]
    fn test_index_agrees_with_naive_union() {
        let cases: [(&str, &[(u32, u32)]); 5] = [
            ("0", &[(0, 0)]),
            ("9000-10000,1-1", &[(9000, 10000), (1, 1)]),
            ("50-60,55-70,71,200-199", &[]),
            ("300-310,5,6,7,8,301", &[(300, 310), (5, 8), (301, 301)]),
            ("1-5000,4000-4100,9999", &[(1, 5000), (4000, 4100), (9999, 9999)]),
        ];

        for (text, ranges) in cases {
            let Ok(selector) = IndexSelector::parse(text) else {
                assert!(ranges.is_empty(), "{text} should parse");
                continue;
            };
            for i in 0..=10_000 {
                let naive = ranges.iter().any(|(lo, hi)| (*lo..=*hi).contains(&i));
                assert_eq!(selector.contains(i), naive, "{text} at {i}");
            }
        }
    }

    #[test]
    fn test_index_reversed_range_is_error() {
        let err = IndexSelector::parse("8-5").unwrap_err();
        assert_eq!(syntax_token(err), "8-5");
    }

    #[test]
    fn test_index_malformed_tokens() {
        assert_eq!(syntax_token(IndexSelector::parse("1,,2").unwrap_err()), "");
        assert_eq!(syntax_token(IndexSelector::parse("1,x").unwrap_err()), "x");
        assert_eq!(syntax_token(IndexSelector::parse("-3").unwrap_err()), "-3");
        assert_eq!(syntax_token(IndexSelector::parse("1-2-3").unwrap_err()), "1-2-3");
        assert_eq!(syntax_token(IndexSelector::parse("4, 7-x ,9").unwrap_err()), "7-x");
        assert!(IndexSelector::parse("").is_err());
        assert!(IndexSelector::parse("99999999999").is_err());
    }

    #[test]
    fn test_relative_age_within_window() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let filter = DateFilter::parse("<1d").unwrap();

        assert!(filter.matches(now - Duration::hours(2), now));
        assert!(!filter.matches(now - Duration::days(2), now));
    }

    #[test]
    fn test_relative_age_older_than() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let filter = DateFilter::parse(">2w").unwrap();

        assert!(filter.matches(now - Duration::days(15), now));
        assert!(!filter.matches(now - Duration::days(13), now));
    }

    #[test]
    fn test_month_and_year_are_fixed_lengths() {
        assert_eq!(
            DateFilter::parse("<3m").unwrap(),
            DateFilter::Age {
                direction: AgeDirection::Newer,
                span: Duration::days(90)
            }
        );
        assert_eq!(
            DateFilter::parse("> 1 y").unwrap(),
            DateFilter::Age {
                direction: AgeDirection::Older,
                span: Duration::days(365)
            }
        );
    }

    #[test]
    fn test_huge_magnitude_is_error_not_panic() {
        assert!(DateFilter::parse("<4294967295y").is_err());
        assert!(DateFilter::parse("<99999999999d").is_err());
    }

    #[test]
    fn test_calendar_date_uses_local_day() {
        let filter = DateFilter::parse("2023-08-28").unwrap();
        let now = Utc::now();

        let morning = Local.with_ymd_and_hms(2023, 8, 28, 0, 30, 0).unwrap();
        let night = Local.with_ymd_and_hms(2023, 8, 28, 23, 30, 0).unwrap();
        let next_day = Local.with_ymd_and_hms(2023, 8, 29, 0, 30, 0).unwrap();

        assert!(filter.matches(morning.with_timezone(&Utc), now));
        assert!(filter.matches(night.with_timezone(&Utc), now));
        assert!(!filter.matches(next_day.with_timezone(&Utc), now));
    }

    #[test]
    fn test_date_filter_errors_name_token() {
        assert_eq!(syntax_token(DateFilter::parse("<5q").unwrap_err()), "q");
        assert_eq!(syntax_token(DateFilter::parse(">d").unwrap_err()), "d");
        assert_eq!(
            syntax_token(DateFilter::parse("2023-02-30").unwrap_err()),
            "2023-02-30"
        );
        assert_eq!(
            syntax_token(DateFilter::parse("yesterday").unwrap_err()),
            "yesterday"
        );
        assert!(DateFilter::parse("").is_err());
    }
}
