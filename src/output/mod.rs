pub mod formatter;
pub mod report;

pub use formatter::{
    format_individual_table, format_manifest_summary, format_round_cell, format_team_table,
    format_tsv, should_use_colors,
};
pub use report::{individual_csv, team_csv, write_report};
