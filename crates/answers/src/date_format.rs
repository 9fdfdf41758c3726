//! Unicode (TR35) date patterns such as `yyyy-MM-dd'T'HH:mm:ss.SSSZZZZZ`, compiled to
//! chrono strftime strings.

use crate::{AnswerError, AnswersResult};
use chrono::format::{Item, Parsed, StrftimeItems};
use chrono::{DateTime, FixedOffset, Locale, NaiveDate, TimeZone as _, Utc};
use datatrack_types::RecordedTimeZone;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Fields {
    year: bool,
    month: bool,
    day: bool,
    hour: bool,
    twelve_hour: bool,
    am_pm: bool,
    minute: bool,
    zone: bool,
}

/// A compiled date pattern.
///
/// Patterns may cover only part of a date. Missing fields default when parsing: the year
/// to 2000, month and day to 1, hour and minute to 0. Without a zone field, parsed values
/// are wall-clock times in the caller's zone.
///
/// Month names, weekday names and the am/pm marker follow the format's locale, `POSIX`
/// (English) unless set with [`DateFormat::with_locale`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
    strftime: String,
    fields: Fields,
    locale: Locale,
}

impl DateFormat {
    /// # Errors
    ///
    /// Returns [`AnswerError::InvalidAnswerType`] if the pattern uses an unsupported field or
    /// leaves a quoted literal unterminated.
    pub fn compile(pattern: &str) -> AnswersResult<Self> {
        let unsupported =
            |what: String| AnswerError::InvalidAnswerType(format!("date format '{pattern}': {what}"));

        let chars: Vec<char> = pattern.chars().collect();
        let mut strftime = String::new();
        let mut fields = Fields::default();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c == '\'' {
                if chars.get(i + 1) == Some(&'\'') {
                    strftime.push('\'');
                    i += 2;
                    continue;
                }
                let mut j = i + 1;
                loop {
                    match chars.get(j) {
                        None => return Err(unsupported("unterminated quoted literal".into())),
                        Some('\'') if chars.get(j + 1) == Some(&'\'') => {
                            strftime.push('\'');
                            j += 2;
                        }
                        Some('\'') => break,
                        Some(&literal) => {
                            push_literal(&mut strftime, literal);
                            j += 1;
                        }
                    }
                }
                i = j + 1;
                continue;
            }

            if !c.is_ascii_alphabetic() {
                push_literal(&mut strftime, c);
                i += 1;
                continue;
            }

            let run = chars[i..].iter().take_while(|&&next| next == c).count();
            let spec = match (c, run) {
                ('y', 2) => {
                    fields.year = true;
                    "%y"
                }
                ('y', _) => {
                    fields.year = true;
                    "%Y"
                }
                ('M' | 'L', n) => {
                    fields.month = true;
                    match n {
                        1 => "%-m",
                        2 => "%m",
                        3 => "%b",
                        _ => "%B",
                    }
                }
                ('d', 1) => {
                    fields.day = true;
                    "%-d"
                }
                ('d', 2) => {
                    fields.day = true;
                    "%d"
                }
                ('H', 1) => {
                    fields.hour = true;
                    "%-H"
                }
                ('H', 2) => {
                    fields.hour = true;
                    "%H"
                }
                ('h', 1) => {
                    fields.hour = true;
                    fields.twelve_hour = true;
                    "%-I"
                }
                ('h', 2) => {
                    fields.hour = true;
                    fields.twelve_hour = true;
                    "%I"
                }
                ('m', 1) => {
                    fields.minute = true;
                    "%-M"
                }
                ('m', 2) => {
                    fields.minute = true;
                    "%M"
                }
                ('s', 1) => "%-S",
                ('s', 2) => "%S",
                ('S', 3) => "%3f",
                ('S', 6) => "%6f",
                ('S', 9) => "%9f",
                ('a', _) => {
                    fields.am_pm = true;
                    "%p"
                }
                ('E', 1..=3) => "%a",
                ('E', _) => "%A",
                ('Z', 1..=3) | ('X' | 'x', 1 | 2) => {
                    fields.zone = true;
                    "%z"
                }
                ('Z', 5) | ('X' | 'x', 3) => {
                    fields.zone = true;
                    "%:z"
                }
                _ => return Err(unsupported(format!("unsupported field '{}'", c.to_string().repeat(run)))),
            };
            strftime.push_str(spec);
            i += run;
        }

        if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
            return Err(unsupported("cannot be represented".into()));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            strftime,
            fields,
            locale: Locale::POSIX,
        })
    }

    /// Sets the locale from an identifier such as `fr_FR`, `de-DE` or `en_US_POSIX`.
    ///
    /// # Errors
    ///
    /// Returns [`AnswerError::InvalidAnswerType`] if the locale is unknown.
    pub fn with_locale(mut self, identifier: &str) -> AnswersResult<Self> {
        self.locale = resolve_locale(identifier).ok_or_else(|| {
            AnswerError::InvalidAnswerType(format!("unknown date locale '{identifier}'"))
        })?;
        Ok(self)
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn strftime(&self) -> &str {
        &self.strftime
    }

    /// Formats `date` in `zone`'s wall-clock time.
    pub fn format(&self, date: &DateTime<FixedOffset>, zone: &RecordedTimeZone) -> String {
        let local = zone.to_local(date.with_timezone(&Utc)).unwrap_or(*date);
        local.format_localized(&self.strftime, self.locale).to_string()
    }

    /// Parses `text`, returning `None` if it does not match the pattern.
    pub fn parse(&self, text: &str, zone: &RecordedTimeZone) -> Option<DateTime<FixedOffset>> {
        let text = match self.locale {
            Locale::POSIX => text.trim().to_string(),
            locale => to_english_names(text.trim(), locale)?,
        };
        let mut parsed = Parsed::new();
        chrono::format::parse(&mut parsed, &text, StrftimeItems::new(&self.strftime)).ok()?;

        if !self.fields.year {
            parsed.set_year(2000).ok()?;
        }
        if !self.fields.month {
            parsed.set_month(1).ok()?;
        }
        if !self.fields.day {
            parsed.set_day(1).ok()?;
        }
        if !self.fields.hour {
            parsed.set_hour(0).ok()?;
        } else if self.fields.twelve_hour && !self.fields.am_pm {
            parsed.set_ampm(false).ok()?;
        }
        if !self.fields.minute {
            parsed.set_minute(0).ok()?;
        }

        let local = parsed
            .to_naive_date()
            .ok()?
            .and_time(parsed.to_naive_time().ok()?);
        if self.fields.zone {
            parsed.to_fixed_offset().ok()?.from_local_datetime(&local).single()
        } else {
            zone.localize(local).ok()
        }
    }
}

fn resolve_locale(identifier: &str) -> Option<Locale> {
    let identifier = identifier.trim().replace('-', "_");
    match identifier.as_str() {
        "en_US_POSIX" | "POSIX" | "C" => Some(Locale::POSIX),
        other => Locale::try_from(other).ok(),
    }
}

/// Rewrites `locale`'s month names, weekday names and am/pm markers in `text` as the English
/// names chrono's parser reads. Longer names win at each position.
fn to_english_names(text: &str, locale: Locale) -> Option<String> {
    let mut names: Vec<(String, String)> = Vec::new();
    let mut add = |date: DateTime<Utc>, specs: &[&str], english: &str| {
        for spec in specs {
            let localized = date.format_localized(spec, locale).to_string();
            if !localized.is_empty() {
                names.push((localized, date.format(english).to_string()));
            }
        }
    };
    for month in 1..=12 {
        let date = NaiveDate::from_ymd_opt(2001, month, 1)?.and_hms_opt(0, 0, 0)?.and_utc();
        add(date, &["%B", "%b"], "%B");
    }
    // 2001-01-01 was a Monday.
    for day in 1..=7 {
        let date = NaiveDate::from_ymd_opt(2001, 1, day)?.and_hms_opt(0, 0, 0)?.and_utc();
        add(date, &["%A", "%a"], "%A");
    }
    for hour in [9, 21] {
        let date = NaiveDate::from_ymd_opt(2001, 1, 1)?.and_hms_opt(hour, 0, 0)?.and_utc();
        add(date, &["%p"], "%p");
    }
    names.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        match names.iter().find(|(localized, _)| rest.starts_with(localized.as_str())) {
            Some((localized, english)) => {
                out.push_str(english);
                rest = &rest[localized.len()..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    Some(out)
}

fn push_literal(strftime: &mut String, c: char) {
    if c == '%' {
        strftime.push_str("%%");
    } else {
        strftime.push(c);
    }
}
