use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::domain::{RoundPoints, Score, TeamRoundPoints, TeamScore};
use crate::pipeline::{CategoryStandings, RunManifest, UnitStatus};
use crate::scoring::Ranked;

const ROUND_WIDTH: usize = 4;
const TOTAL_WIDTH: usize = 5;
const CLUB_WIDTH: usize = 20;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate to fit available width, counting chars rather than bytes
fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// One round's cell: points, DNF/DQ, or "-" when absent
pub fn format_round_cell(points: &RoundPoints) -> String {
    match points {
        RoundPoints::Absent => "-".to_string(),
        RoundPoints::Scored { points } => points.to_string(),
        RoundPoints::Unplaced { status } => status.to_string(),
    }
}

pub(crate) fn format_team_cell(points: &TeamRoundPoints) -> String {
    match points {
        TeamRoundPoints::Absent => "-".to_string(),
        TeamRoundPoints::Scored { points } => points.to_string(),
        TeamRoundPoints::Insufficient { .. } => "x".to_string(),
    }
}

/// League position, marking shared places with "="
fn format_position<T>(ranked: &[Ranked<T>], idx: usize) -> String {
    let position = ranked[idx].position;
    let shared = ranked
        .iter()
        .enumerate()
        .any(|(i, r)| i != idx && r.position == position);
    if shared {
        format!("={}", position)
    } else {
        format!("{}.", position)
    }
}

fn format_total(total: u32, counted: u32) -> String {
    if total == counted {
        total.to_string()
    } else {
        format!("{}({})", counted, total)
    }
}

fn name_width(rounds: usize) -> Option<usize> {
    let fixed = 4 + 2 + CLUB_WIDTH + 2 + rounds * (ROUND_WIDTH + 1) + 2 + TOTAL_WIDTH + 4;
    get_terminal_width().map(|width| {
        if width > fixed + 10 {
            width - fixed
        } else {
            20
        }
    })
}

fn header_cells(rounds: &[String]) -> String {
    rounds
        .iter()
        .map(|r| format!("{:>width$}", truncate(r, ROUND_WIDTH), width = ROUND_WIDTH))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format a category's individual standings as an aligned table.
pub fn format_individual_table(
    standings: &CategoryStandings,
    rounds: &[String],
    use_colors: bool,
) -> String {
    let title = format!("{} ({})", standings.name, standings.code);
    let title = if use_colors {
        title.bold().to_string()
    } else {
        title
    };

    if standings.individual.is_empty() {
        return format!("{}\n  No individual results.", title);
    }

    let max_name = name_width(rounds.len());
    let name_col = standings
        .individual
        .iter()
        .map(|r| r.entry.athlete.name.chars().count())
        .max()
        .unwrap_or(0)
        .min(max_name.unwrap_or(usize::MAX));

    let mut lines = vec![title];
    lines.push(format!(
        "{:>4}  {:<name_col$}  {:<CLUB_WIDTH$}  {}  {:>TOTAL_WIDTH$}",
        "",
        "Name",
        "Club",
        header_cells(rounds),
        "Total",
    ));

    for (idx, ranked) in standings.individual.iter().enumerate() {
        lines.push(format_score_line(
            &ranked.entry,
            &format_position(&standings.individual, idx),
            name_col,
            use_colors,
        ));
    }
    lines.join("\n")
}

fn format_score_line(score: &Score, position: &str, name_col: usize, use_colors: bool) -> String {
    let cells = score
        .rounds
        .iter()
        .map(|r| {
            format!(
                "{:>width$}",
                format_round_cell(&r.outcome),
                width = ROUND_WIDTH
            )
        })
        .collect::<Vec<_>>()
        .join(" ");
    let name = format!(
        "{:<name_col$}",
        truncate(&score.athlete.name, name_col)
    );
    let club = format!(
        "{:<CLUB_WIDTH$}",
        truncate(&score.athlete.club, CLUB_WIDTH)
    );
    let total = format!(
        "{:>TOTAL_WIDTH$}",
        format_total(score.total, score.counted_total)
    );

    if use_colors {
        format!(
            "{:>4}  {}  {}  {}  {}",
            position.dimmed(),
            name,
            club.cyan(),
            cells,
            total.bold()
        )
    } else {
        format!("{:>4}  {}  {}  {}  {}", position, name, club, cells, total)
    }
}

/// Format a category's team standings, one block per division.
pub fn format_team_table(
    standings: &CategoryStandings,
    rounds: &[String],
    use_colors: bool,
) -> String {
    if standings.teams.is_empty() {
        return String::new();
    }

    let title = format!("{} ({}) teams", standings.name, standings.code);
    let mut lines = vec![if use_colors {
        title.bold().to_string()
    } else {
        title
    }];

    let name_col = standings
        .teams
        .iter()
        .map(|t| t.entry.name.chars().count())
        .max()
        .unwrap_or(0)
        .min(name_width(rounds.len()).map_or(usize::MAX, |w| w + CLUB_WIDTH));

    let mut current_division: Option<&Option<String>> = None;
    for (idx, ranked) in standings.teams.iter().enumerate() {
        let division = &ranked.entry.division;
        if current_division != Some(division) {
            if let Some(name) = division {
                let heading = format!("Division {}", name);
                lines.push(if use_colors {
                    heading.underline().to_string()
                } else {
                    heading
                });
            }
            lines.push(format!(
                "{:>4}  {:<name_col$}  {}  {:>TOTAL_WIDTH$}",
                "",
                "Team",
                header_cells(rounds),
                "Total",
            ));
            current_division = Some(division);
        }

        lines.push(format_team_line(
            &ranked.entry,
            &format_position(&standings.teams, idx),
            name_col,
            use_colors,
        ));
    }
    lines.join("\n")
}

fn format_team_line(team: &TeamScore, position: &str, name_col: usize, use_colors: bool) -> String {
    let cells = team
        .rounds
        .iter()
        .map(|r| format!("{:>width$}", format_team_cell(&r.outcome), width = ROUND_WIDTH))
        .collect::<Vec<_>>()
        .join(" ");
    let name = format!("{:<name_col$}", truncate(&team.name, name_col));
    let total = format!(
        "{:>TOTAL_WIDTH$}",
        format_total(team.total, team.counted_total)
    );

    if use_colors {
        format!(
            "{:>4}  {}  {}  {}",
            position.dimmed(),
            name.cyan(),
            cells,
            total.bold()
        )
    } else {
        format!("{:>4}  {}  {}  {}", position, name, cells, total)
    }
}

/// Format standings as tab-separated values for scripting
/// Columns: category, kind, position, id, name, club/division, round points..., total, counted
/// (no headers, no colors)
pub fn format_tsv(standings: &CategoryStandings) -> String {
    let individual = standings.individual.iter().map(|ranked| {
        let score = &ranked.entry;
        let mut fields = vec![
            standings.code.clone(),
            "individual".to_string(),
            ranked.position.to_string(),
            score.athlete.id.clone(),
            score.athlete.name.clone(),
            score.athlete.club.clone(),
        ];
        fields.extend(score.rounds.iter().map(|r| format_round_cell(&r.outcome)));
        fields.push(score.total.to_string());
        fields.push(score.counted_total.to_string());
        fields.join("\t")
    });

    let teams = standings.teams.iter().map(|ranked| {
        let team = &ranked.entry;
        let mut fields = vec![
            standings.code.clone(),
            "team".to_string(),
            ranked.position.to_string(),
            team.name.clone(),
            team.name.clone(),
            team.division.clone().unwrap_or_default(),
        ];
        fields.extend(team.rounds.iter().map(|r| format_team_cell(&r.outcome)));
        fields.push(team.total.to_string());
        fields.push(team.counted_total.to_string());
        fields.join("\t")
    });

    individual.chain(teams).collect::<Vec<_>>().join("\n")
}

/// Summarize what a run processed and what it had to leave out.
pub fn format_manifest_summary(manifest: &RunManifest, use_colors: bool) -> String {
    let total = manifest.units.len();
    let failed: Vec<_> = manifest.failed_units().collect();
    let headline = format!(
        "Processed {} race file(s): {} ok, {} failed",
        total,
        total - failed.len(),
        failed.len()
    );

    let mut lines = vec![if use_colors && !failed.is_empty() {
        headline.red().to_string()
    } else if use_colors {
        headline.green().to_string()
    } else {
        headline
    }];

    for unit in failed {
        if let UnitStatus::Failed { kind, message } = &unit.status {
            lines.push(format!(
                "  {} {}: {} ({})",
                unit.round, unit.race, message, kind
            ));
        }
    }

    if !manifest.withheld.is_empty() {
        let codes: Vec<&str> = manifest
            .withheld
            .iter()
            .map(|w| w.category.as_str())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        let line = format!("Withheld categories: {}", codes.join(", "));
        lines.push(if use_colors {
            line.yellow().to_string()
        } else {
            line
        });
    }

    for failure in &manifest.team_failures {
        lines.push(format!("  {}", failure.message));
    }

    lines.join("\n")
}
