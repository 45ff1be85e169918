use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use super::formatter::{format_round_cell, format_team_cell};
use crate::domain::{RoundPoints, TeamRoundPoints};
use crate::pipeline::{CategoryStandings, RunManifest, Standings};

#[derive(Debug, Serialize)]
struct ManifestFile<'a> {
    generated_at: DateTime<Utc>,
    rounds: &'a [String],
    #[serde(flatten)]
    manifest: &'a RunManifest,
}

/// Write `contents` to `path` atomically, creating parent directories.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to save {}", path.display()))?;
    Ok(())
}

fn csv_bytes(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.into_inner().context("Failed to flush CSV output")
}

fn round_header(standings: &Standings, leading: &[&str]) -> Vec<String> {
    leading
        .iter()
        .map(|s| s.to_string())
        .chain(standings.rounds.iter().cloned())
        .chain(["Total".to_string(), "Counted".to_string()])
        .collect()
}

/// Individual standings of one category as CSV
pub fn individual_csv(standings: &Standings, category: &CategoryStandings) -> Result<Vec<u8>> {
    let header = round_header(standings, &["Pos", "Race No", "Name", "Club"]);
    let rows = category
        .individual
        .iter()
        .map(|ranked| {
            let score = &ranked.entry;
            let mut row = vec![
                ranked.position.to_string(),
                score.athlete.id.clone(),
                score.athlete.name.clone(),
                score.athlete.club.clone(),
            ];
            row.extend(score.rounds.iter().map(|r| match r.outcome {
                RoundPoints::Absent => String::new(),
                other => format_round_cell(&other),
            }));
            row.push(score.total.to_string());
            row.push(score.counted_total.to_string());
            row
        })
        .collect();
    csv_bytes(header, rows)
}

/// Team standings of one category as CSV
pub fn team_csv(standings: &Standings, category: &CategoryStandings) -> Result<Vec<u8>> {
    let header = round_header(standings, &["Division", "Pos", "Team"]);
    let rows = category
        .teams
        .iter()
        .map(|ranked| {
            let team = &ranked.entry;
            let mut row = vec![
                team.division.clone().unwrap_or_default(),
                ranked.position.to_string(),
                team.name.clone(),
            ];
            row.extend(team.rounds.iter().map(|r| match r.outcome {
                TeamRoundPoints::Absent => String::new(),
                other => format_team_cell(&other),
            }));
            row.push(team.total.to_string());
            row.push(team.counted_total.to_string());
            row
        })
        .collect();
    csv_bytes(header, rows)
}

/// Write every output file for a run under `output_dir`:
/// `standings.json`, `individual/<code>.csv`, `teams/<code>.csv` and
/// `manifest.json`.
///
/// Only `manifest.json` carries a timestamp, so re-running on the same
/// inputs rewrites identical standings files.
pub fn write_report(
    output_dir: &Path,
    standings: &Standings,
    manifest: &RunManifest,
    generated_at: DateTime<Utc>,
) -> Result<()> {
    let json =
        serde_json::to_vec_pretty(standings).context("Failed to serialize standings")?;
    write_atomic(&output_dir.join("standings.json"), &json)?;

    for (code, category) in &standings.categories {
        let path = output_dir.join("individual").join(format!("{}.csv", code));
        write_atomic(&path, &individual_csv(standings, category)?)?;

        if !category.teams.is_empty() {
            let path = output_dir.join("teams").join(format!("{}.csv", code));
            write_atomic(&path, &team_csv(standings, category)?)?;
        }
    }

    let manifest_file = ManifestFile {
        generated_at,
        rounds: &standings.rounds,
        manifest,
    };
    let json =
        serde_json::to_vec_pretty(&manifest_file).context("Failed to serialize manifest")?;
    write_atomic(&output_dir.join("manifest.json"), &json)?;

    info!(
        "Wrote standings for {} categories to {}",
        standings.categories.len(),
        output_dir.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LeagueConfig;
    use crate::processing::RawUnit;
    use crate::processing::race::tests::row;
    use std::env;
    use std::fs;

    async fn sample_run() -> crate::pipeline::RunReport {
        let rows = vec![
            row("1", "Oxford City AC", "U13 Boys", "1"),
            row("2", "Oxford City AC", "U13 Boys", "2"),
            row("3", "Witney", "U13 Boys", "3"),
            row("4", "Oxford City AC", "U13 Boys", "4"),
        ];
        let units = vec![RawUnit {
            round: "r1".to_string(),
            race: "U13".to_string(),
            rows: Ok(rows),
        }];
        crate::pipeline::run(&LeagueConfig::default(), units, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_write_report_files() {
        let report = sample_run().await;
        let dir = env::temp_dir().join("league_standings_test_report");
        let _ = fs::remove_dir_all(&dir);

        write_report(&dir, &report.standings, &report.manifest, Utc::now()).unwrap();

        assert!(dir.join("standings.json").exists());
        assert!(dir.join("manifest.json").exists());
        let individual = fs::read_to_string(dir.join("individual").join("U13B.csv")).unwrap();
        let mut lines = individual.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Pos,Race No,Name,Club,r1,r2,r3,r4,r5,Total,Counted"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1,1,Runner 1,Oxford City AC,10,,,,,10,10"
        );
        assert!(dir.join("teams").join("U13B.csv").exists());
        assert!(!dir.join("teams").join("SM.csv").exists());

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("manifest.json")).unwrap())
                .unwrap();
        assert!(manifest["generated_at"].is_string());
        assert_eq!(manifest["units"][0]["status"], "succeeded");

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_standings_json_is_stable() {
        let report = sample_run().await;
        let dir_a = env::temp_dir().join("league_standings_test_stable_a");
        let dir_b = env::temp_dir().join("league_standings_test_stable_b");

        write_report(&dir_a, &report.standings, &report.manifest, Utc::now()).unwrap();
        let again = sample_run().await;
        write_report(&dir_b, &again.standings, &again.manifest, Utc::now()).unwrap();

        assert_eq!(
            fs::read(dir_a.join("standings.json")).unwrap(),
            fs::read(dir_b.join("standings.json")).unwrap()
        );

        let _ = fs::remove_dir_all(&dir_a);
        let _ = fs::remove_dir_all(&dir_b);
    }

    #[tokio::test]
    async fn test_team_csv_includes_division() {
        let report = sample_run().await;
        let category = &report.standings.categories["U13B"];
        let csv = String::from_utf8(team_csv(&report.standings, category).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Division,Pos,Team,r1,r2,r3,r4,r5,Total,Counted");
        assert!(lines[1].starts_with("1,1,Oxford City AC A,"));
    }

    #[tokio::test]
    async fn test_team_csv_marks_absent_and_insufficient_rounds() {
        let rows = vec![
            row("11", "Oxford City AC", "U13 Girls", "1"),
            row("12", "Witney", "U13 Girls", "2"),
            row("13", "Witney", "U13 Girls", "3"),
        ];
        let units = vec![RawUnit {
            round: "r1".to_string(),
            race: "U13".to_string(),
            rows: Ok(rows),
        }];
        let report = crate::pipeline::run(&LeagueConfig::default(), units, None)
            .await
            .unwrap();
        let category = &report.standings.categories["U13G"];
        let csv = String::from_utf8(team_csv(&report.standings, category).unwrap()).unwrap();

        let oxford = csv.lines().find(|l| l.contains("Oxford City AC")).unwrap();
        assert!(oxford.ends_with(",x,,,,,0,0"));
        let witney = csv.lines().find(|l| l.contains("Witney")).unwrap();
        assert!(witney.ends_with(",14,,,,,14,14"));
    }
}
