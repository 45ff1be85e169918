use anyhow::{Context, Result};
use log::{debug, info};
use std::path::Path;

use crate::domain::Round;
use crate::error::StandingsError;
use crate::processing::{RawRow, RawUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    AthleteId,
    Name,
    Gender,
    Club,
    Category,
    Position,
    Time,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        let key: String = header
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "raceno" | "racenumber" | "bib" | "number" | "no" => Some(Column::AthleteId),
            "name" | "runner" | "athlete" => Some(Column::Name),
            "gender" | "sex" => Some(Column::Gender),
            "club" | "team" => Some(Column::Club),
            "category" | "cat" => Some(Column::Category),
            "pos" | "position" | "place" => Some(Column::Position),
            "time" => Some(Column::Time),
            _ => None,
        }
    }
}

/// Header positions of the columns present in one file
#[derive(Debug, Default)]
struct Layout {
    athlete_id: Option<usize>,
    name: Option<usize>,
    gender: Option<usize>,
    club: Option<usize>,
    category: Option<usize>,
    position: Option<usize>,
    time: Option<usize>,
}

impl Layout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, StandingsError> {
        let mut layout = Layout::default();
        for (idx, header) in headers.iter().enumerate() {
            let slot = match Column::from_header(header) {
                Some(Column::AthleteId) => &mut layout.athlete_id,
                Some(Column::Name) => &mut layout.name,
                Some(Column::Gender) => &mut layout.gender,
                Some(Column::Club) => &mut layout.club,
                Some(Column::Category) => &mut layout.category,
                Some(Column::Position) => &mut layout.position,
                Some(Column::Time) => &mut layout.time,
                None => continue,
            };
            slot.get_or_insert(idx);
        }

        let missing: Vec<&str> = [
            (layout.athlete_id, "Race No"),
            (layout.name, "Name"),
            (layout.position, "Pos"),
        ]
        .iter()
        .filter(|(idx, _)| idx.is_none())
        .map(|(_, name)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(StandingsError::Unreadable {
                reason: format!("missing column(s): {}", missing.join(", ")),
            });
        }
        Ok(layout)
    }
}

fn field(record: &csv::StringRecord, idx: Option<usize>) -> String {
    idx.and_then(|i| record.get(i)).unwrap_or("").to_string()
}

/// Parse one race file's CSV text into raw rows.
///
/// Without a category column every row is labelled with the race name.
/// Blank lines are skipped.
pub fn parse_rows(text: &str, race: &str) -> Result<Vec<RawRow>, StandingsError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| StandingsError::Unreadable {
            reason: format!("bad header row: {}", e),
        })?
        .clone();
    let layout = Layout::from_headers(&headers)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            let line = e.position().map(|p| p.line() as usize).unwrap_or(i + 2);
            StandingsError::malformed(line, e.to_string())
        })?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }

        let category_label = match layout.category {
            Some(_) => field(&record, layout.category),
            None => race.to_string(),
        };

        rows.push(RawRow {
            athlete_id: field(&record, layout.athlete_id),
            name: field(&record, layout.name),
            gender: field(&record, layout.gender),
            club: field(&record, layout.club),
            category_label,
            placement_or_status: field(&record, layout.position),
            time: field(&record, layout.time),
        });
    }

    Ok(rows)
}

/// Read one race file. Any failure is carried inside the unit so the run
/// can report it alongside the other units.
pub fn read_unit(path: &Path, round: &str) -> RawUnit {
    let race = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let rows = std::fs::read(path)
        .map_err(|e| StandingsError::Unreadable {
            reason: format!("{}: {}", path.display(), e),
        })
        .and_then(|bytes| {
            String::from_utf8(bytes).map_err(|_| StandingsError::Unreadable {
                reason: format!("{}: not valid UTF-8", path.display()),
            })
        })
        .and_then(|text| parse_rows(&text, &race));

    RawUnit {
        round: round.to_string(),
        race,
        rows,
    }
}

/// Load every race file of one round from `<input_dir>/<round>/*.csv`.
///
/// A missing round directory yields no units.
pub fn load_round(input_dir: &Path, round: &str) -> Result<Vec<RawUnit>> {
    let round_dir = input_dir.join(round);
    if !round_dir.is_dir() {
        debug!("No results directory for {} at {}", round, round_dir.display());
        return Ok(Vec::new());
    }

    let pattern = round_dir.join("*.csv");
    let pattern = pattern.to_string_lossy();
    let mut paths: Vec<_> = glob::glob(&pattern)
        .with_context(|| format!("Invalid results path {}", pattern))?
        .filter_map(|entry| entry.ok())
        .collect();
    paths.sort();

    let units: Vec<RawUnit> = paths.iter().map(|p| read_unit(p, round)).collect();
    info!("Loaded {} race file(s) for {}", units.len(), round);
    Ok(units)
}

/// Load every requested round in order.
pub fn load_rounds(input_dir: &Path, rounds: &[Round]) -> Result<Vec<RawUnit>> {
    let mut units = Vec::new();
    for round in rounds {
        units.extend(load_round(input_dir, &round.id)?);
    }
    Ok(units)
}
