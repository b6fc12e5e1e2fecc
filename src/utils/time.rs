use chrono::{Local, NaiveDate};

/// This is the standard way of converting a date to a string in habitline.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Current calendar day in the local timezone. Analytics take the day as a
/// parameter, so this only gets called at the cli boundary.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Returns an iterator of dates between start (inclusive) and end (inclusive).
pub fn date_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(start), move |current| {
        current.succ_opt().filter(|next| *next <= end)
    })
    .filter(move |current| *current <= end)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{date_range, format_date};

    #[test]
    fn date_range_is_inclusive_on_both_ends() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let days: Vec<_> = date_range(start, end).collect();
        assert_eq!(days.len(), 5);
        assert_eq!(days[0], start);
        assert_eq!(days[2], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(*days.last().unwrap(), end);
    }

    #[test]
    fn date_range_single_day() {
        let day = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap();
        assert_eq!(date_range(day, day).count(), 1);
    }

    #[test]
    fn date_range_empty_when_start_after_end() {
        let start = NaiveDate::from_ymd_opt(2024, 4, 6).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap();
        assert_eq!(date_range(start, end).count(), 0);
    }

    #[test]
    fn format_date_pads_components() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(format_date(day), "2024-01-07");
    }
}
