use chrono::{Datelike, NaiveDate};

/// Age assumed for profiles without a date of birth
pub const DEFAULT_AGE: u32 = 30;

/// Age in whole years on `today`
///
/// A birthday later in the year than `today` has not been reached yet and
/// does not count. Birth dates in the future yield 0.
#[inline]
pub fn calculate_age(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut age = today.year() - date_of_birth.year();

    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }

    age.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_birthday_reached() {
        assert_eq!(calculate_age(date(1990, 3, 1), date(2024, 3, 1)), 34);
        assert_eq!(calculate_age(date(1990, 3, 1), date(2024, 12, 31)), 34);
    }

    #[test]
    fn test_birthday_not_yet_reached() {
        assert_eq!(calculate_age(date(1990, 3, 2), date(2024, 3, 1)), 33);
    }

    #[test]
    fn test_future_birth_date() {
        assert_eq!(calculate_age(date(2030, 1, 1), date(2024, 1, 1)), 0);
    }
}
