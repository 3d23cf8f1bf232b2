use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use serde::Serialize;

const WEEKDAYS: [&str; 7] = ["Dom", "Lun", "Mar", "Mié", "Jue", "Vie", "Sáb"];
const MONTHS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockReading {
    pub time: String,
    pub date: String,
}

pub fn read_clock() -> ClockReading {
    read_clock_at(&Local::now())
}

pub fn read_clock_at<Tz: TimeZone>(now: &DateTime<Tz>) -> ClockReading {
    let weekday = WEEKDAYS[now.weekday().num_days_from_sunday() as usize];
    let month = MONTHS[now.month0() as usize];

    ClockReading {
        time: format!("{:02}:{:02}:{:02}", now.hour(), now.minute(), now.second()),
        date: format!("{weekday}, {} {month}", now.day()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn pads_time_and_names_day_and_month() {
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 7, 3, 9).unwrap();
        let reading = read_clock_at(&at);
        assert_eq!(reading.time, "07:03:09");
        assert_eq!(reading.date, "Lun, 5 Ene");
    }

    #[test]
    fn sunday_is_first_weekday() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 23, 59, 59).unwrap();
        let reading = read_clock_at(&at);
        assert_eq!(reading.time, "23:59:59");
        assert_eq!(reading.date, "Dom, 18 Oct");
    }
}
