//! Filters for the entry list of a book.

use chrono::{Datelike, Days, NaiveDate};
use uuid::Uuid;

use crate::{EngineError, EntryKind, ResultEngine, util::search_key};

/// Named date ranges accepted by the entry list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DateRange {
    Today,
    Yesterday,
    ThisMonth,
    LastMonth,
    /// Both bounds are raw `YYYY-MM-DD` input, validated on resolve.
    Custom {
        start: Option<String>,
        end: Option<String>,
    },
}

impl DateRange {
    /// Build a range from its query-string name (`today`, `yesterday`,
    /// `this_month`, `last_month`, `custom`).
    pub fn from_name(
        name: &str,
        start: Option<String>,
        end: Option<String>,
    ) -> ResultEngine<Self> {
        match name.trim() {
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            "this_month" => Ok(Self::ThisMonth),
            "last_month" => Ok(Self::LastMonth),
            "custom" => Ok(Self::Custom { start, end }),
            other => Err(EngineError::Validation(format!(
                "unknown date range: {other}"
            ))),
        }
    }

    /// Inclusive `(start, end)` bounds relative to `today`.
    pub fn resolve(&self, today: NaiveDate) -> ResultEngine<(NaiveDate, NaiveDate)> {
        match self {
            Self::Today => Ok((today, today)),
            Self::Yesterday => {
                let day = today
                    .checked_sub_days(Days::new(1))
                    .ok_or_else(|| EngineError::Validation("date out of range".to_string()))?;
                Ok((day, day))
            }
            Self::ThisMonth => Ok((first_of_month(today)?, today)),
            Self::LastMonth => {
                let last = first_of_month(today)?
                    .pred_opt()
                    .ok_or_else(|| EngineError::Validation("date out of range".to_string()))?;
                Ok((first_of_month(last)?, last))
            }
            Self::Custom { start, end } => {
                let (Some(start), Some(end)) = (start.as_deref(), end.as_deref()) else {
                    return Err(EngineError::Validation(
                        "custom range requires both start and end dates".to_string(),
                    ));
                };
                let start = parse_date(start, "start")?;
                let end = parse_date(end, "end")?;
                if start > end {
                    return Err(EngineError::Validation(
                        "start date must not be after end date".to_string(),
                    ));
                }
                Ok((start, end))
            }
        }
    }
}

fn first_of_month(day: NaiveDate) -> ResultEngine<NaiveDate> {
    day.with_day(1)
        .ok_or_else(|| EngineError::Validation("date out of range".to_string()))
}

fn parse_date(value: &str, label: &str) -> ResultEngine<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| EngineError::Validation(format!("invalid {label} date: {value}")))
}

/// Filters for [`Engine::query_entries`](crate::Engine::query_entries).
///
/// All filters are AND-combined. `page` is 1-based; out of range values are
/// clamped.
#[derive(Clone, Debug, Default)]
pub struct EntryFilter {
    /// Exact date.
    pub date: Option<NaiveDate>,
    pub range: Option<DateRange>,
    pub category_id: Option<Uuid>,
    pub kind: Option<EntryKind>,
    /// Case-insensitive substring of the remarks or of the amount rendered
    /// with two decimals.
    pub search: Option<String>,
    pub page: Option<u64>,
}

impl EntryFilter {
    /// Resolve the named range against `today`.
    ///
    /// An invalid range does not fail the query: the range is dropped and the
    /// error message is returned to be shown next to the results.
    pub(crate) fn date_bounds(
        &self,
        today: NaiveDate,
    ) -> (Option<(NaiveDate, NaiveDate)>, Option<String>) {
        match &self.range {
            None => (None, None),
            Some(range) => match range.resolve(today) {
                Ok(bounds) => (Some(bounds), None),
                Err(err) => (None, Some(err.to_string())),
            },
        }
    }

    /// `LIKE` pattern for the search term in search-key form, with `%`, `_`
    /// and the escape character escaped by `\`.
    pub(crate) fn search_pattern(&self) -> Option<String> {
        let term = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let mut pattern = String::with_capacity(term.len() + 2);
        pattern.push('%');
        for ch in search_key(term).chars() {
            if matches!(ch, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(ch);
        }
        pattern.push('%');
        Some(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn named_ranges() {
        let today = date(2024, 3, 15);
        assert_eq!(DateRange::Today.resolve(today).unwrap(), (today, today));
        assert_eq!(
            DateRange::Yesterday.resolve(today).unwrap(),
            (date(2024, 3, 14), date(2024, 3, 14))
        );
        assert_eq!(
            DateRange::ThisMonth.resolve(today).unwrap(),
            (date(2024, 3, 1), today)
        );
        assert_eq!(
            DateRange::LastMonth.resolve(today).unwrap(),
            (date(2024, 2, 1), date(2024, 2, 29))
        );
    }

    #[test]
    fn last_month_across_year_boundary() {
        assert_eq!(
            DateRange::LastMonth.resolve(date(2024, 1, 10)).unwrap(),
            (date(2023, 12, 1), date(2023, 12, 31))
        );
    }

    #[test]
    fn custom_range_validation() {
        let today = date(2024, 3, 15);
        let custom = |s: Option<&str>, e: Option<&str>| DateRange::Custom {
            start: s.map(str::to_string),
            end: e.map(str::to_string),
        };

        assert_eq!(
            custom(Some("2024-01-01"), Some("2024-01-31")).resolve(today).unwrap(),
            (date(2024, 1, 1), date(2024, 1, 31))
        );
        assert!(custom(Some("2024-02-01"), Some("2024-01-01")).resolve(today).is_err());
        assert!(custom(Some("2024-02-30"), Some("2024-03-01")).resolve(today).is_err());
        assert!(custom(None, Some("2024-03-01")).resolve(today).is_err());
    }

    #[test]
    fn invalid_range_is_surfaced_not_applied() {
        let filter = EntryFilter {
            range: Some(DateRange::Custom {
                start: Some("2024-05-01".to_string()),
                end: Some("2024-04-01".to_string()),
            }),
            ..Default::default()
        };
        let (bounds, error) = filter.date_bounds(date(2024, 6, 1));
        assert!(bounds.is_none());
        assert!(error.is_some());
    }

    #[test]
    fn unknown_range_name() {
        assert!(DateRange::from_name("next_week", None, None).is_err());
        assert_eq!(
            DateRange::from_name("this_month", None, None).unwrap(),
            DateRange::ThisMonth
        );
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        let filter = EntryFilter {
            search: Some(" 50%_Off ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_pattern().unwrap(), "%50\\%\\_off%");
        assert!(EntryFilter::default().search_pattern().is_none());
    }
}
