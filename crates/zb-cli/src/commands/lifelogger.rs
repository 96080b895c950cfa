//! Lifelogger command for uploading sheets exported from the Lifelogger spreadsheet.
//!
//! Each sheet is a CSV export with dates in the first column:
//! - main: row 0 holds categories, row 1 labels; `Streaks` cells are `TRUE`/`FALSE`
//! - daily: row 0 holds supplement labels; cells are doses in mg
//! - timestamped: column pairs of time and free-text doses such as
//!   `~08:00 12:30` and `100mg caffeine + ~200mcg l-theanine subl`
//!
//! A leading `~` marks a time or a dose as approximate; a `?` amount is unknown.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::Args;
use regex::Regex;

use zb_core::{Event, EventError, Field, NormalizeOptions, TimestampInput};

use crate::Config;
use crate::commands::{
    ParsedEvents, Target, log_parsed, print_events, upload, with_client, write_summary,
};

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]{1,2}:[0-9]{2}").unwrap());
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+\.?[0-9]*").unwrap());
static UNIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"mcg|ug|mg|g|ml|cl|dl|l").unwrap());
static ROA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"oral|insuff|subl|intranasal|subcut|buccal").unwrap());
static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+\.?[0-9]*%").unwrap());

/// Spreadsheet error marker left in cells whose formula failed.
const INVALID_CELL: &str = "#VALUE!";
const STREAKS_CATEGORY: &str = "Streaks";
const DEFAULT_ROA: &str = "oral";
const TIME_FORMAT: &str = "%H:%M";
const APPROXIMATE: char = '~';
const UNKNOWN_AMOUNT: char = '?';

const STREAKS_DESCRIPTION: &str = "Streaks from the Lifelogger spreadsheet";
const SUPPLEMENTS_DESCRIPTION: &str = "Supplements from the Lifelogger spreadsheet";

#[derive(Debug, Args)]
pub struct LifeloggerArgs {
    /// CSV export of the main sheet (streaks).
    #[arg(long)]
    pub main: Option<PathBuf>,

    /// CSV export of the daily supplements sheet.
    #[arg(long)]
    pub daily: Option<PathBuf>,

    /// CSV export of the timestamped supplements sheet.
    #[arg(long)]
    pub timestamped: Option<PathBuf>,

    /// Label of the bucket streaks are uploaded into.
    #[arg(long, default_value = "Streaks")]
    pub streaks_bucket: String,

    /// Label of the bucket supplements are uploaded into.
    #[arg(long, default_value = "Supplements")]
    pub supplements_bucket: String,

    /// Submit events one request at a time instead of as a batch.
    #[arg(long)]
    pub one_by_one: bool,

    /// Print the events as JSON lines instead of uploading them.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sheet {
    Main,
    Daily,
    Timestamped,
}

impl Sheet {
    fn parse(self, table: &Table, options: &NormalizeOptions) -> Result<ParsedEvents> {
        match self {
            Self::Main => parse_streaks(table, options),
            Self::Daily => parse_daily(table, options),
            Self::Timestamped => Ok(parse_timestamped(table, options)),
        }
    }
}

pub fn run<W: Write>(writer: &mut W, args: &LifeloggerArgs, config: &Config) -> Result<()> {
    let sheets = [
        (args.main.as_deref(), Sheet::Main),
        (args.daily.as_deref(), Sheet::Daily),
        (args.timestamped.as_deref(), Sheet::Timestamped),
    ];
    if sheets.iter().all(|(path, _)| path.is_none()) {
        anyhow::bail!("nothing to import: pass --main, --daily or --timestamped");
    }
    let options = config.normalize_options()?;

    let mut streaks = Vec::new();
    let mut supplements = Vec::new();
    for (path, sheet) in sheets {
        let Some(path) = path else { continue };
        let parsed = load_sheet(path, sheet, &options)?;
        if !args.dry_run {
            write_summary(writer, &path.display().to_string(), &parsed)?;
        }
        match sheet {
            Sheet::Main => streaks.extend(parsed.events),
            Sheet::Daily | Sheet::Timestamped => supplements.extend(parsed.events),
        }
    }

    if args.dry_run {
        print_events(writer, &streaks)?;
        return print_events(writer, &supplements);
    }

    with_client(config, |client| {
        if args.main.is_some() {
            let target = Target {
                label: &args.streaks_bucket,
                description: STREAKS_DESCRIPTION,
                one_by_one: args.one_by_one,
            };
            upload(writer, client, target, &streaks)?;
        }
        if args.daily.is_some() || args.timestamped.is_some() {
            let target = Target {
                label: &args.supplements_bucket,
                description: SUPPLEMENTS_DESCRIPTION,
                one_by_one: args.one_by_one,
            };
            upload(writer, client, target, &supplements)?;
        }
        Ok(())
    })
}

fn load_sheet(path: &Path, sheet: Sheet, options: &NormalizeOptions) -> Result<ParsedEvents> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let table = read_table(file).with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = sheet
        .parse(&table, options)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    log_parsed(&path.display().to_string(), &parsed);
    Ok(parsed)
}

/// A worksheet as rows of cells.
pub type Table = Vec<Vec<String>>;

/// Reads a headerless CSV export; rows may differ in length.
pub fn read_table<R: Read>(reader: R) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut table = Vec::new();
    for record in reader.records() {
        let record = record.context("failed to read CSV record")?;
        table.push(record.iter().map(str::to_string).collect());
    }
    Ok(table)
}

fn cell(table: &Table, row: usize, col: usize) -> &str {
    table
        .get(row)
        .and_then(|cells| cells.get(col))
        .map_or("", |cell| cell.trim())
}

/// A sheet row together with the date in its first column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatedRow {
    pub row: usize,
    pub date: NaiveDate,
}

/// Finds the first contiguous run of dates in the first column.
///
/// Accepts `m/d/Y` and `Y-m-d`. Non-date cells are passed over; the first
/// blank cell after a date ends the run.
pub fn dated_rows(table: &Table) -> Vec<DatedRow> {
    let mut rows: Vec<DatedRow> = Vec::new();
    for row in 0..table.len() {
        let text = cell(table, row, 0);
        if text.is_empty() {
            if let Some(last) = rows.last() {
                tracing::debug!(last = %last.date, "end of date column");
                break;
            }
            continue;
        }
        match parse_date(text) {
            Some(date) => {
                if rows.is_empty() {
                    tracing::debug!(%date, row, "found first date");
                }
                rows.push(DatedRow { row, date });
            }
            None => tracing::debug!(row, cell = text, "not a date"),
        }
    }
    rows
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let format = if text.split('/').count() == 3 {
        "%m/%d/%Y"
    } else if text.split('-').count() == 3 {
        "%Y-%m-%d"
    } else {
        return None;
    };
    NaiveDate::parse_from_str(text, format).ok()
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn push_event(parsed: &mut ParsedEvents, event: Result<Event, EventError>) {
    match event {
        Ok(event) => parsed.events.push(event),
        Err(err) => {
            tracing::warn!(error = %err, "skipping invalid event");
            parsed.skip();
        }
    }
}

/// Streak cells of the main sheet: `TRUE` counts 1, `FALSE` counts -1.
pub fn parse_streaks(table: &Table, options: &NormalizeOptions) -> Result<ParsedEvents> {
    let categories = table.first().context("main sheet is empty")?;
    let labels = table.get(1).context("main sheet has no label row")?;
    let start = categories
        .iter()
        .position(|category| category.trim() == STREAKS_CATEGORY)
        .with_context(|| format!("main sheet has no {STREAKS_CATEGORY:?} category"))?;
    let end = categories
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, category)| !category.trim().is_empty())
        .map_or(labels.len(), |(col, _)| col);

    let dates = dated_rows(table);
    let mut parsed = ParsedEvents::default();
    for col in start..end {
        let label = cell(table, 1, col);
        if label.is_empty() {
            continue;
        }
        for dated in &dates {
            let value = cell(table, dated.row, col);
            if value.is_empty() || value == INVALID_CELL {
                continue;
            }
            let count = match value {
                "TRUE" => 1,
                "FALSE" => -1,
                other => {
                    tracing::warn!(label, cell = other, "could not detect streak state");
                    parsed.skip();
                    continue;
                }
            };
            let event = Event::builder()
                .timestamp(midnight(dated.date))
                .tags([label, value])
                .field(Field::Count, count)
                .build(options);
            push_event(&mut parsed, event);
        }
    }
    Ok(parsed)
}

/// Daily supplement cells: numeric doses in mg.
pub fn parse_daily(table: &Table, options: &NormalizeOptions) -> Result<ParsedEvents> {
    let labels = table.first().context("daily sheet is empty")?;
    let dates = dated_rows(table);
    let mut parsed = ParsedEvents::default();
    for (col, label) in labels.iter().enumerate().skip(1) {
        let label = label.trim();
        if label.is_empty() {
            continue;
        }
        for dated in &dates {
            let value = cell(table, dated.row, col);
            if value.is_empty() || value == INVALID_CELL {
                continue;
            }
            let Ok(weight) = value.parse::<f64>() else {
                tracing::warn!(label, row = dated.row, col, cell = value, "dose is not a number");
                parsed.skip();
                continue;
            };
            let event = Event::builder()
                .timestamp(midnight(dated.date))
                .tags([label, "daily"])
                .weight(weight, "mg")
                .build(options);
            push_event(&mut parsed, event);
        }
    }
    Ok(parsed)
}

/// Timestamped supplements: `(time, doses)` column pairs from column 1.
///
/// A time cell that holds no readable time still yields events, at midnight
/// and tagged `unknown_time`.
pub fn parse_timestamped(table: &Table, options: &NormalizeOptions) -> ParsedEvents {
    let width = table.first().map_or(0, Vec::len);
    let dates = dated_rows(table);
    let mut parsed = ParsedEvents::default();
    for col in (1..width).step_by(2) {
        for dated in &dates {
            let time_cell = cell(table, dated.row, col);
            if time_cell.is_empty() {
                continue;
            }
            let doses_cell = cell(table, dated.row, col + 1);
            let times = parse_times(time_cell);
            if times.certainty == Certainty::Unknown {
                tracing::warn!(
                    row = dated.row,
                    col,
                    cell = time_cell,
                    doses = doses_cell,
                    "could not parse time, tagging with unknown_time"
                );
            }
            let at = times.on(dated.date);

            for dose in parse_doses(doses_cell) {
                let dose = match dose {
                    Ok(dose) => dose,
                    Err(err) => {
                        tracing::warn!(row = dated.row, col, error = %err, "skipping dose");
                        parsed.skip();
                        continue;
                    }
                };
                push_event(&mut parsed, dose.to_event(&at, times.certainty, options));
            }
        }
    }
    parsed
}

/// How precisely a time or an amount was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Certainty {
    Exact,
    /// Prefixed with `~`.
    Approximate,
    /// Missing or unreadable.
    Unknown,
}

impl Certainty {
    const fn time_tag(self) -> Option<&'static str> {
        match self {
            Self::Exact => None,
            Self::Approximate => Some("approximate_time"),
            Self::Unknown => Some("unknown_time"),
        }
    }

    const fn dose_tag(self) -> Option<&'static str> {
        match self {
            Self::Exact => None,
            Self::Approximate => Some("approximate_dose"),
            Self::Unknown => Some("unknown_dose"),
        }
    }
}

/// The times of day read from one time cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoseTimes {
    pub times: Vec<NaiveTime>,
    pub certainty: Certainty,
}

impl DoseTimes {
    /// One time gives a single timestamp, several give a list.
    fn on(&self, date: NaiveDate) -> TimestampInput {
        match self.times.as_slice() {
            [time] => date.and_time(*time).into(),
            times => times
                .iter()
                .map(|time| date.and_time(*time))
                .collect::<Vec<_>>()
                .into(),
        }
    }
}

/// Reads every `H:MM` in a time cell.
///
/// Trailing seconds are ignored. A cell without a valid time falls back to
/// midnight with [`Certainty::Unknown`].
pub fn parse_times(text: &str) -> DoseTimes {
    let times: Option<Vec<NaiveTime>> = TIME_RE
        .find_iter(text)
        .map(|found| NaiveTime::parse_from_str(found.as_str(), TIME_FORMAT).ok())
        .collect();
    match times {
        Some(times) if !times.is_empty() => DoseTimes {
            times,
            certainty: if text.starts_with(APPROXIMATE) {
                Certainty::Approximate
            } else {
                Certainty::Exact
            },
        },
        _ => DoseTimes {
            times: vec![NaiveTime::MIN],
            certainty: Certainty::Unknown,
        },
    }
}

/// One substance taken at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Dose<'a> {
    pub amount: f64,
    pub unit: &'a str,
    pub substance: &'a str,
    /// Route of administration.
    pub roa: &'a str,
    pub percentage: Option<f64>,
    pub certainty: Certainty,
}

impl Dose<'_> {
    /// Units containing `l` are volumes, everything else is a weight.
    pub fn is_volume(&self) -> bool {
        self.unit.contains('l')
    }

    fn to_event(
        &self,
        at: &TimestampInput,
        time: Certainty,
        options: &NormalizeOptions,
    ) -> Result<Event, EventError> {
        let mut tags = vec![self.substance, self.roa, "timestamped"];
        if self.percentage.is_some() {
            tags.push("alcohol");
        }
        tags.extend(self.certainty.dose_tag());
        tags.extend(time.time_tag());

        let builder = Event::builder().timestamp(at.clone()).tags(tags);
        let builder = if self.is_volume() {
            builder.volume(self.amount, self.unit)
        } else {
            builder.weight(self.amount, self.unit)
        };
        let builder = match self.percentage {
            Some(percentage) => builder.field(Field::Percentage, percentage),
            None => builder,
        };
        builder.build(options)
    }
}

/// Splits a doses cell on `+`.
///
/// The route of administration is read from the last word of the whole cell
/// and applies to every dose in it.
pub fn parse_doses(text: &str) -> Vec<Result<Dose<'_>>> {
    let roa = text
        .split(' ')
        .next_back()
        .and_then(|last| ROA_RE.find(last))
        .map_or(DEFAULT_ROA, |found| found.as_str());
    text.split('+')
        .map(str::trim)
        .map(|part| parse_dose(part, roa))
        .collect()
}

fn parse_dose<'a>(part: &'a str, roa: &'a str) -> Result<Dose<'a>> {
    let (part, certainty) = if let Some(rest) = part.strip_prefix(APPROXIMATE) {
        (rest, Certainty::Approximate)
    } else if let Some(rest) = part.strip_prefix(UNKNOWN_AMOUNT) {
        (rest, Certainty::Unknown)
    } else {
        (part, Certainty::Exact)
    };
    let amount = if certainty == Certainty::Unknown {
        0.0
    } else {
        AMOUNT_RE
            .find(part)
            .with_context(|| format!("no amount in {part:?}"))?
            .as_str()
            .parse::<f64>()
            .with_context(|| format!("invalid amount in {part:?}"))?
    };
    let unit = UNIT_RE
        .find(part)
        .with_context(|| format!("no unit in {part:?}"))?
        .as_str();
    let percentage = if part.contains('%') {
        let found = PERCENT_RE
            .find(part)
            .with_context(|| format!("invalid percentage in {part:?}"))?;
        let percentage = found
            .as_str()
            .trim_end_matches('%')
            .parse::<f64>()
            .with_context(|| format!("invalid percentage in {part:?}"))?;
        Some(percentage)
    } else {
        None
    };
    let substance = part
        .split(' ')
        .nth(1)
        .filter(|substance| !substance.is_empty())
        .with_context(|| format!("no substance in {part:?}"))?;

    Ok(Dose {
        amount,
        unit,
        substance,
        roa,
        percentage,
        certainty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use zb_core::parse_utc_offset;

    fn cest() -> NormalizeOptions {
        NormalizeOptions::new(parse_utc_offset("+02:00").unwrap())
    }

    fn table(csv: &str) -> Table {
        read_table(csv.as_bytes()).unwrap()
    }

    fn render(events: &[Event]) -> String {
        let mut output = Vec::new();
        print_events(&mut output, events).unwrap();
        String::from_utf8(output).unwrap()
    }

    const MAIN: &str = "\
,Streaks,,Mood
Date,Meditation,Exercise,Happy
2015-06-01,TRUE,FALSE,7
2015-06-02,#VALUE!,maybe,8
6/3/2015,FALSE,,6
,,,
2015-06-10,TRUE,TRUE,5
";

    #[test]
    fn dated_rows_take_first_run() {
        let rows = dated_rows(&table(MAIN));
        let dates: Vec<(usize, String)> = rows
            .iter()
            .map(|dated| (dated.row, dated.date.to_string()))
            .collect();
        assert_eq!(
            dates,
            vec![
                (2, "2015-06-01".to_string()),
                (3, "2015-06-02".to_string()),
                (4, "2015-06-03".to_string()),
            ]
        );
    }

    #[test]
    fn dated_rows_pass_over_non_dates() {
        let rows = dated_rows(&table("Week 1\n2015-06-01\nnotes\n06/02/2015\n\n"));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].row, 3);
        assert!(dated_rows(&table("a,b\nc,d\n")).is_empty());
    }

    #[test]
    fn streaks_map_true_and_false() {
        let parsed = parse_streaks(&table(MAIN), &cest()).unwrap();
        assert_eq!(parsed.skipped, 1);
        assert_snapshot!(render(&parsed.events), @r#"
        {"timestamp":"2015-06-01T00:00:00.000+0200","tag":["Meditation","TRUE"],"count":1}
        {"timestamp":"2015-06-03T00:00:00.000+0200","tag":["Meditation","FALSE"],"count":-1}
        {"timestamp":"2015-06-01T00:00:00.000+0200","tag":["Exercise","FALSE"],"count":-1}
        "#);
    }

    #[test]
    fn streaks_category_is_required() {
        let err = parse_streaks(&table(",Mood\nDate,Happy\n2015-06-01,7\n"), &cest()).unwrap_err();
        assert!(err.to_string().contains("Streaks"));
    }

    #[test]
    fn daily_doses_are_milligrams() {
        let csv = "\
Date,Vitamin D,Fish oil
,,
2015-06-01,0.025,1000
2015-06-02,,lots
";
        let parsed = parse_daily(&table(csv), &cest()).unwrap();
        assert_eq!(parsed.skipped, 1);
        assert_snapshot!(render(&parsed.events), @r#"
        {"timestamp":"2015-06-01T00:00:00.000+0200","tag":["Vitamin D","daily"],"weight":{"@value":0.025,"unit":"mg"}}
        {"timestamp":"2015-06-01T00:00:00.000+0200","tag":["Fish oil","daily"],"weight":{"@value":1000.0,"unit":"mg"}}
        "#);
    }

    #[test]
    fn timestamped_doses_become_events() {
        let csv = "\
Date,Time,Dose,Time,Dose
2015-06-01,08:00:00,100mg caffeine + 200mcg l-theanine subl,21:30:00,330ml beer 5%
2015-06-02,morning,50mg caffeine,,
2015-06-03,09:15:00,caffeine,,
";
        let parsed = parse_timestamped(&table(csv), &cest());
        assert_eq!(parsed.skipped, 1);
        assert_snapshot!(render(&parsed.events), @r#"
        {"timestamp":"2015-06-01T08:00:00.000+0200","tag":["caffeine","subl","timestamped"],"weight":{"@value":100.0,"unit":"mg"}}
        {"timestamp":"2015-06-01T08:00:00.000+0200","tag":["l-theanine","subl","timestamped"],"weight":{"@value":200.0,"unit":"ug"}}
        {"timestamp":"2015-06-02T00:00:00.000+0200","tag":["caffeine","oral","timestamped","unknown_time"],"weight":{"@value":50.0,"unit":"mg"}}
        {"timestamp":"2015-06-01T21:30:00.000+0200","tag":["beer","oral","timestamped","alcohol"],"volume":{"@value":330.0,"unit":"mL"},"percentage":5.0}
        "#);
    }

    #[test]
    fn several_times_give_a_timestamp_list() {
        let csv = "\
Date,Time,Dose
2015-06-01,~08:00 12:30,5mg melatonin
2015-06-02,9:05,5mg melatonin
";
        let parsed = parse_timestamped(&table(csv), &cest());
        assert_eq!(parsed.skipped, 0);
        assert_snapshot!(render(&parsed.events), @r#"
        {"timestamp":["2015-06-01T08:00:00.000+0200","2015-06-01T12:30:00.000+0200"],"tag":["melatonin","oral","timestamped","approximate_time"],"weight":{"@value":5.0,"unit":"mg"}}
        {"timestamp":"2015-06-02T09:05:00.000+0200","tag":["melatonin","oral","timestamped"],"weight":{"@value":5.0,"unit":"mg"}}
        "#);
    }

    #[test]
    fn dose_markers_become_tags() {
        let csv = "\
Date,Time,Dose
2015-06-01,20:00,~100mg caffeine + ?mg l-theanine + 4cl whisky 40%
";
        let parsed = parse_timestamped(&table(csv), &cest());
        assert_eq!(parsed.skipped, 0);
        assert_snapshot!(render(&parsed.events), @r#"
        {"timestamp":"2015-06-01T20:00:00.000+0200","tag":["caffeine","oral","timestamped","approximate_dose"],"weight":{"@value":100.0,"unit":"mg"}}
        {"timestamp":"2015-06-01T20:00:00.000+0200","tag":["l-theanine","oral","timestamped","unknown_dose"],"weight":{"@value":0.0,"unit":"mg"}}
        {"timestamp":"2015-06-01T20:00:00.000+0200","tag":["whisky","oral","timestamped","alcohol"],"volume":{"@value":4.0,"unit":"cL"},"percentage":40.0}
        "#);
    }

    #[test]
    fn time_cells_read_every_time() {
        let times = parse_times("08:00 12:30");
        assert_eq!(times.certainty, Certainty::Exact);
        assert_eq!(
            times.times,
            vec![
                NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(12, 30, 0).unwrap(),
            ]
        );

        let times = parse_times("21:30:00");
        assert_eq!(times.times, vec![NaiveTime::from_hms_opt(21, 30, 0).unwrap()]);
        assert_eq!(parse_times("~9:30").certainty, Certainty::Approximate);
    }

    #[test]
    fn unreadable_time_cells_fall_back_to_midnight() {
        for text in ["morning", "25:00", "~lunch"] {
            let times = parse_times(text);
            assert_eq!(times.certainty, Certainty::Unknown, "{text}");
            assert_eq!(times.times, vec![NaiveTime::MIN]);
        }
    }

    #[test]
    fn doses_share_route_of_administration() {
        let doses = parse_doses("1g piracetam + 5mg nicotine buccal");
        let doses: Vec<Dose<'_>> = doses.into_iter().map(Result::unwrap).collect();
        assert_eq!(doses.len(), 2);
        assert!(doses.iter().all(|dose| dose.roa == "buccal"));
        assert_eq!(doses[0].unit, "g");
        assert_eq!(doses[1].substance, "nicotine");
    }

    #[test]
    fn dose_defaults_to_oral() {
        let dose = parse_doses("2.5mg melatonin").remove(0).unwrap();
        assert_eq!(dose.amount, 2.5);
        assert_eq!(dose.roa, "oral");
        assert!(!dose.is_volume());
        assert_eq!(dose.percentage, None);
    }

    #[test]
    fn volume_units_contain_l() {
        for unit in ["ml", "cl", "dl", "l"] {
            let text = format!("4{unit} wine 12%");
            let dose = parse_doses(&text).remove(0).unwrap();
            assert!(dose.is_volume(), "{unit} should be a volume");
            assert_eq!(dose.percentage, Some(12.0));
        }
    }

    #[test]
    fn unknown_amount_is_zero() {
        let dose = parse_doses("?mg caffeine").remove(0).unwrap();
        assert_eq!(dose.amount, 0.0);
        assert_eq!(dose.unit, "mg");
        assert_eq!(dose.substance, "caffeine");
        assert_eq!(dose.certainty, Certainty::Unknown);

        let dose = parse_doses("~2.5mg melatonin").remove(0).unwrap();
        assert_eq!(dose.amount, 2.5);
        assert_eq!(dose.certainty, Certainty::Approximate);
    }

    #[test]
    fn malformed_doses_are_errors() {
        assert!(parse_doses("caffeine").remove(0).is_err());
        assert!(parse_doses("100 caffeine").remove(0).is_err());
        assert!(parse_doses("100mg").remove(0).is_err());
        assert!(parse_doses("40cl vodka %").remove(0).is_err());
    }

    #[test]
    fn run_requires_a_sheet() {
        let args = LifeloggerArgs {
            main: None,
            daily: None,
            timestamped: None,
            streaks_bucket: "Streaks".to_string(),
            supplements_bucket: "Supplements".to_string(),
            one_by_one: false,
            dry_run: true,
        };
        let err = run(&mut Vec::new(), &args, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("nothing to import"));
    }

    #[test]
    fn run_dry_run_reads_every_sheet() {
        let temp = tempfile::tempdir().unwrap();
        let main = temp.path().join("main.csv");
        let daily = temp.path().join("daily.csv");
        std::fs::write(&main, MAIN).unwrap();
        std::fs::write(&daily, "Date,Zinc\n2015-06-01,15\n").unwrap();
        let args = LifeloggerArgs {
            main: Some(main),
            daily: Some(daily),
            timestamped: None,
            streaks_bucket: "Streaks".to_string(),
            supplements_bucket: "Supplements".to_string(),
            one_by_one: false,
            dry_run: true,
        };

        let mut output = Vec::new();
        run(&mut output, &args, &Config::default()).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.lines().count(), 4);
        assert!(output.lines().last().unwrap().contains("Zinc"));
    }
}
