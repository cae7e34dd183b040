//! Relative date resolver - anchors fuzzy date expressions to Asia/Tokyo

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use regex::{Captures, Regex};

/// Fixed zone all expressions resolve in
pub const JST: Tz = chrono_tz::Asia::Tokyo;

/// Current instant in the resolver's zone
pub fn now_jst() -> DateTime<Tz> {
    Utc::now().with_timezone(&JST)
}

/// How a matched time expression maps to a clock time
enum TimeRule {
    /// `HH:MM` or `HH時MM分`, hour and minute captured
    HourMinute,
    /// `HH時半`
    HalfHour,
    /// `HH時`
    HourOnly,
    /// Named period (morning/noon/evening/night/late-night)
    Fixed(u32, u32),
}

impl TimeRule {
    fn to_time(&self, cap: &Captures) -> Option<NaiveTime> {
        match self {
            TimeRule::HourMinute => {
                let hour = cap.get(1)?.as_str().parse().ok()?;
                let minute = cap.get(2)?.as_str().parse().ok()?;
                NaiveTime::from_hms_opt(hour, minute, 0)
            }
            TimeRule::HalfHour => {
                let hour = cap.get(1)?.as_str().parse().ok()?;
                NaiveTime::from_hms_opt(hour, 30, 0)
            }
            TimeRule::HourOnly => {
                let hour = cap.get(1)?.as_str().parse().ok()?;
                NaiveTime::from_hms_opt(hour, 0, 0)
            }
            TimeRule::Fixed(hour, minute) => NaiveTime::from_hms_opt(*hour, *minute, 0),
        }
    }
}

/// How a matched date expression maps onto the calendar
enum DateRule {
    /// Fixed day offset; `night` forces a 20:00 default time
    DayOffset { days: i64, night: bool },
    WeekOffset(i64),
    /// Month offsets are 30-day blocks, deliberately not calendar-aware
    MonthOffset(i64),
    /// Next strictly-future occurrence of the weekday
    NextWeekday(Weekday),
}

/// Converts relative/fuzzy date-time text into an absolute JST instant
///
/// Pattern tables are compiled once; the reference instant is an argument
/// to every call so a long-lived resolver never serves a stale clock.
pub struct DateResolver {
    time_patterns: Vec<(Regex, TimeRule)>,
    date_rules: Vec<(Regex, DateRule)>,
    month_day: Regex,
    days_ahead: Vec<Regex>,
    hour_hint: Regex,
    night_hint: Regex,
    morning_hint: Regex,
    noon_hint: Regex,
}

impl DateResolver {
    pub fn new() -> Self {
        let time = |p: &str, rule: TimeRule| {
            (Regex::new(p).expect("Invalid time pattern"), rule)
        };
        // Order matters: first match wins, so longer forms come first
        let time_patterns = vec![
            time(r"(\d{1,2}):(\d{2})", TimeRule::HourMinute),
            time(r"(\d{1,2})時(\d{1,2})分", TimeRule::HourMinute),
            time(r"(\d{1,2})時半", TimeRule::HalfHour),
            time(r"(\d{1,2})時", TimeRule::HourOnly),
            time(r"朝|あさ|morning", TimeRule::Fixed(9, 0)),
            time(r"昼|ひる|noon", TimeRule::Fixed(12, 0)),
            time(r"夕方|ゆうがた|evening", TimeRule::Fixed(17, 0)),
            time(r"深夜|しんや|late\s*night", TimeRule::Fixed(23, 0)),
            time(r"夜|よる|night", TimeRule::Fixed(20, 0)),
        ];

        let date = |p: &str, rule: DateRule| {
            (Regex::new(p).expect("Invalid date pattern"), rule)
        };
        let day = |days, night| DateRule::DayOffset { days, night };
        let date_rules = vec![
            date(r"今日|きょう|today", day(0, false)),
            date(r"明後日|あさって|day\s+after\s+tomorrow", day(2, false)),
            date(r"明日|あした|あす|tomorrow", day(1, false)),
            date(r"今夜|こんや|tonight", day(0, true)),
            date(r"明晩|あすばん", day(1, true)),
            date(r"再来週|さらいしゅう|week\s+after\s+next", DateRule::WeekOffset(2)),
            date(r"来週|らいしゅう|next\s+week", DateRule::WeekOffset(1)),
            date(r"今週|こんしゅう|this\s+week", DateRule::WeekOffset(0)),
            date(r"再来月|さらいげつ|month\s+after\s+next", DateRule::MonthOffset(2)),
            date(r"来月|らいげつ|next\s+month", DateRule::MonthOffset(1)),
            date(r"今月|こんげつ|this\s+month", DateRule::MonthOffset(0)),
            date(r"月曜日|月曜|げつよう|monday", DateRule::NextWeekday(Weekday::Mon)),
            date(r"火曜日|火曜|かよう|tuesday", DateRule::NextWeekday(Weekday::Tue)),
            date(r"水曜日|水曜|すいよう|wednesday", DateRule::NextWeekday(Weekday::Wed)),
            date(r"木曜日|木曜|もくよう|thursday", DateRule::NextWeekday(Weekday::Thu)),
            date(r"金曜日|金曜|きんよう|friday", DateRule::NextWeekday(Weekday::Fri)),
            date(r"土曜日|土曜|どよう|saturday", DateRule::NextWeekday(Weekday::Sat)),
            date(r"日曜日|日曜|にちよう|sunday", DateRule::NextWeekday(Weekday::Sun)),
        ];

        Self {
            time_patterns,
            date_rules,
            month_day: Regex::new(r"(\d{1,2})/(\d{1,2})").expect("Invalid date pattern"),
            days_ahead: vec![
                Regex::new(r"(\d+)日後").expect("Invalid date pattern"),
                Regex::new(r"in\s+(\d+)\s+days?").expect("Invalid date pattern"),
            ],
            hour_hint: Regex::new(r"(\d{1,2})(?:時|:\d{2})").expect("Invalid time pattern"),
            night_hint: Regex::new(r"夜|晩|night|evening|tonight").expect("Invalid time pattern"),
            morning_hint: Regex::new(r"朝|morning").expect("Invalid time pattern"),
            noon_hint: Regex::new(r"昼|noon").expect("Invalid time pattern"),
        }
    }

    /// Resolve a relative expression to an absolute instant, or None when
    /// the text is ambiguous or carries no usable expression
    pub fn resolve(&self, text: &str, now: DateTime<Tz>) -> Option<DateTime<Tz>> {
        let text = text.to_lowercase();
        let text = text.trim();

        // Step 1: explicit time of day, first pattern that yields a valid
        // clock time wins
        let mut target_time: Option<NaiveTime> = None;
        for (pattern, rule) in &self.time_patterns {
            if let Some(cap) = pattern.captures(text) {
                if let Some(t) = rule.to_time(&cap) {
                    target_time = Some(t);
                    break;
                }
            }
        }

        // Step 2: date, named relative forms first, then literals
        let today = now.date_naive();
        let mut target_date = today;
        let mut date_found = false;
        for (pattern, rule) in &self.date_rules {
            if pattern.is_match(text) {
                match rule {
                    DateRule::DayOffset { days, night } => {
                        target_date = today + Duration::days(*days);
                        if *night && target_time.is_none() {
                            target_time = NaiveTime::from_hms_opt(20, 0, 0);
                        }
                    }
                    DateRule::WeekOffset(weeks) => {
                        target_date = today + Duration::weeks(*weeks);
                    }
                    DateRule::MonthOffset(months) => {
                        target_date = today + Duration::days(months * 30);
                    }
                    DateRule::NextWeekday(weekday) => {
                        let mut ahead = weekday.num_days_from_monday() as i64
                            - now.weekday().num_days_from_monday() as i64;
                        if ahead <= 0 {
                            ahead += 7;
                        }
                        target_date = today + Duration::days(ahead);
                    }
                }
                date_found = true;
                break;
            }
        }

        if !date_found {
            if let Some(cap) = self.month_day.captures(text) {
                let month: u32 = cap.get(1)?.as_str().parse().ok()?;
                let day: u32 = cap.get(2)?.as_str().parse().ok()?;
                let mut date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
                if date < today {
                    date = NaiveDate::from_ymd_opt(today.year() + 1, month, day)?;
                }
                target_date = date;
                date_found = true;
            }
        }

        if !date_found {
            for pattern in &self.days_ahead {
                if let Some(cap) = pattern.captures(text) {
                    let days: i64 = cap.get(1)?.as_str().parse().ok()?;
                    target_date = today + Duration::days(days);
                    date_found = true;
                    break;
                }
            }
        }

        // Step 3: default time of day from loose keywords
        let target_time = match target_time {
            Some(t) => t,
            None => {
                let hour = if self.night_hint.is_match(text) {
                    20
                } else if self.morning_hint.is_match(text) {
                    9
                } else if self.noon_hint.is_match(text) {
                    12
                } else {
                    18
                };
                NaiveTime::from_hms_opt(hour, 0, 0)?
            }
        };

        // Step 4: combine; a bare time at or before "now" means the next
        // such occurrence
        let naive = target_date.and_time(target_time);
        let mut result = JST.from_local_datetime(&naive).single()?;
        if !date_found && result <= now {
            result += Duration::days(1);
        }

        Some(result)
    }

    /// Up to 5 human-readable candidate strings for ambiguous input
    pub fn suggest(&self, text: &str, now: DateTime<Tz>) -> Vec<String> {
        let today = now.date_naive();
        let mut suggestions = vec![
            format!("今日 {} 18:00", today.format("%m/%d")),
            format!("明日 {} 18:00", (today + Duration::days(1)).format("%m/%d")),
            format!("明後日 {} 18:00", (today + Duration::days(2)).format("%m/%d")),
            "来週金曜 18:00".to_string(),
            "来月1日 09:00".to_string(),
        ];

        if let Some(cap) = self.hour_hint.captures(text) {
            if let Some(hour) = cap.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
                if hour < 24 {
                    suggestions.insert(0, format!("今日 {hour}:00"));
                    suggestions.insert(1, format!("明日 {hour}:00"));
                }
            }
        }

        suggestions.truncate(5);
        suggestions
    }
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new()
    }
}
