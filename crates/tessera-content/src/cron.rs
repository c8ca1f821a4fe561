//! Five-field cron expressions: validation and plain-English rendering.
//!
//! Fields are minute, hour, day of month, month and day of week. Each
//! field is a comma-separated list of `*`, a value, a range `a-b`, or any
//! of those followed by a step `/n`. Months accept `JAN`-`DEC`, weekdays
//! accept `SUN`-`SAT`, and weekday `7` is Sunday.

use std::str::FromStr;

use crate::error::CronError;

const MONTH_ABBREVIATIONS: &[&str] = &[
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const MONTH_NAMES: &[&str] = &[
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
const DAY_ABBREVIATIONS: &[&str] = &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];
const DAY_NAMES: &[&str] = &[
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
    first_named: u32,
}

const MINUTE: FieldSpec = FieldSpec {
    name: "minute",
    min: 0,
    max: 59,
    names: &[],
    first_named: 0,
};
const HOUR: FieldSpec = FieldSpec {
    name: "hour",
    min: 0,
    max: 23,
    names: &[],
    first_named: 0,
};
const DAY_OF_MONTH: FieldSpec = FieldSpec {
    name: "day-of-month",
    min: 1,
    max: 31,
    names: &[],
    first_named: 0,
};
const MONTH: FieldSpec = FieldSpec {
    name: "month",
    min: 1,
    max: 12,
    names: MONTH_ABBREVIATIONS,
    first_named: 1,
};
const DAY_OF_WEEK: FieldSpec = FieldSpec {
    name: "day-of-week",
    min: 0,
    max: 7,
    names: DAY_ABBREVIATIONS,
    first_named: 0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Any { step: Option<u32> },
    Value(u32),
    Range { start: u32, end: u32, step: Option<u32> },
}

/// A parsed cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    minute: Vec<Part>,
    hour: Vec<Part>,
    day_of_month: Vec<Part>,
    month: Vec<Part>,
    day_of_week: Vec<Part>,
}

impl FromStr for CronSchedule {
    type Err = CronError;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        let [minute, hour, day_of_month, month, day_of_week] = fields.as_slice() else {
            return Err(CronError::FieldCount(fields.len()));
        };

        Ok(Self {
            minute: parse_field(minute, &MINUTE)?,
            hour: parse_field(hour, &HOUR)?,
            day_of_month: parse_field(day_of_month, &DAY_OF_MONTH)?,
            month: parse_field(month, &MONTH)?,
            day_of_week: parse_field(day_of_week, &DAY_OF_WEEK)?,
        })
    }
}

fn parse_field(token: &str, spec: &FieldSpec) -> Result<Vec<Part>, CronError> {
    token.split(',').map(|part| parse_part(part, spec)).collect()
}

fn parse_part(token: &str, spec: &FieldSpec) -> Result<Part, CronError> {
    let (base, step) = match token.split_once('/') {
        Some((base, step)) => (base, Some(parse_step(step, spec)?)),
        None => (token, None),
    };

    if base == "*" {
        return Ok(Part::Any { step });
    }

    if let Some((start, end)) = base.split_once('-') {
        let start = parse_value(start, spec)?;
        let end = parse_value(end, spec)?;
        if start > end {
            return Err(CronError::ReversedRange {
                field: spec.name,
                start,
                end,
            });
        }
        return Ok(Part::Range { start, end, step });
    }

    let value = parse_value(base, spec)?;
    Ok(match step {
        // `a/n` runs from `a` to the end of the field.
        Some(_) => Part::Range {
            start: value,
            end: spec.max,
            step,
        },
        None => Part::Value(value),
    })
}

fn parse_step(token: &str, spec: &FieldSpec) -> Result<u32, CronError> {
    match token.parse::<u32>() {
        Ok(step) if step > 0 => Ok(step),
        _ => Err(CronError::InvalidStep {
            field: spec.name,
            value: token.to_string(),
        }),
    }
}

fn parse_value(token: &str, spec: &FieldSpec) -> Result<u32, CronError> {
    let value = match token.parse::<u32>() {
        Ok(value) => value,
        Err(_) => spec
            .names
            .iter()
            .position(|name| name.eq_ignore_ascii_case(token))
            .map(|index| index as u32 + spec.first_named)
            .ok_or_else(|| CronError::InvalidValue {
                field: spec.name,
                value: token.to_string(),
            })?,
    };

    if value < spec.min || value > spec.max {
        return Err(CronError::OutOfRange {
            field: spec.name,
            value,
            min: spec.min,
            max: spec.max,
        });
    }
    Ok(value)
}

/// Check that `expression` is a well-formed cron expression.
pub fn validate(expression: &str) -> Result<(), CronError> {
    expression.parse::<CronSchedule>().map(|_| ())
}

/// Plain-English rendering of `expression`, or `None` if it does not
/// parse.
pub fn describe(expression: &str) -> Option<String> {
    expression
        .parse::<CronSchedule>()
        .ok()
        .map(|schedule| schedule.describe())
}

impl CronSchedule {
    /// Verbose plain-English rendering, e.g. `At 09:00, only on Monday`.
    pub fn describe(&self) -> String {
        let mut out = match (single_value(&self.minute), single_value(&self.hour)) {
            (Some(minute), Some(hour)) => format!("At {hour:02}:{minute:02}"),
            _ => {
                let mut time = match self.minute.as_slice() {
                    [Part::Value(minute)] => format!("At minute {minute}"),
                    [part @ (Part::Any { .. } | Part::Range { step: Some(_), .. })] => {
                        capitalize(&describe_parts(&[*part], "minute", |m| m.to_string()))
                    }
                    parts => format!(
                        "At minutes {}",
                        describe_parts(parts, "minute", |m| m.to_string())
                    ),
                };
                if !is_every(&self.hour) {
                    let label = if single_value(&self.hour).is_some() {
                        "hour"
                    } else {
                        "hours"
                    };
                    time.push_str(&format!(
                        ", during {label} {}",
                        describe_parts(&self.hour, "hour", |h| format!("{h:02}:00"))
                    ));
                }
                time
            }
        };

        if is_every(&self.day_of_month) && is_every(&self.day_of_week) {
            out.push_str(", every day");
        }
        if !is_every(&self.day_of_month) {
            out.push_str(&format!(
                ", on day {} of the month",
                describe_parts(&self.day_of_month, "day", |d| d.to_string())
            ));
        }
        if !is_every(&self.month) {
            out.push_str(&format!(
                ", only in {}",
                describe_parts(&self.month, "month", month_name)
            ));
        }
        if !is_every(&self.day_of_week) {
            out.push_str(&format!(
                ", only on {}",
                describe_parts(&self.day_of_week, "day", day_name)
            ));
        }
        out
    }
}

fn is_every(parts: &[Part]) -> bool {
    matches!(parts, [Part::Any { step: None }])
}

fn single_value(parts: &[Part]) -> Option<u32> {
    match parts {
        [Part::Value(value)] => Some(*value),
        _ => None,
    }
}

fn month_name(month: u32) -> String {
    MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .map_or_else(|| month.to_string(), |name| (*name).to_string())
}

fn day_name(day: u32) -> String {
    DAY_NAMES
        .get((day % 7) as usize)
        .map_or_else(|| day.to_string(), |name| (*name).to_string())
}

fn describe_parts(parts: &[Part], unit: &str, label: impl Fn(u32) -> String) -> String {
    let items: Vec<String> = parts
        .iter()
        .map(|part| match *part {
            Part::Any { step: None } => format!("every {unit}"),
            Part::Any { step: Some(step) } => format!("every {step} {unit}s"),
            Part::Value(value) => label(value),
            Part::Range {
                start,
                end,
                step: None,
            } => format!("{} through {}", label(start), label(end)),
            Part::Range {
                start,
                end,
                step: Some(step),
            } => format!(
                "every {step} {unit}s from {} through {}",
                label(start),
                label(end)
            ),
        })
        .collect();
    join_words(&items)
}

fn join_words(items: &[String]) -> String {
    match items.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {last}", rest.join(", ")),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
