use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use clap::Parser;
use order_core::preview::{Payload, parse_data_url};
use order_core::{EditableField, LocalPricing, OrderSession, Part, PartId};
use pollster::block_on;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Price an analyzed drawing, apply merges and edits, and emit the order sheet.
#[derive(Parser, Debug)]
#[command(name = "order-sheet", version)]
struct Args {
    /// Analyzer output: a JSON list of parts.
    analysis: PathBuf,
    /// Order sheet destination (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Customer or shop name printed on the sheet.
    #[arg(long, env = "ORDER_CUSTOMER", value_parser = non_blank)]
    customer: String,
    /// Part numbers (1-based, analyzer order) to merge into one part.
    #[arg(long = "merge", value_name = "N,N,..")]
    merges: Vec<MergeGroup>,
    /// Set a field on a row of the final sheet.
    #[arg(long = "set", value_name = "ROW:FIELD=VALUE")]
    edits: Vec<FieldEdit>,
    /// Directory for merged preview PNGs.
    #[arg(long)]
    preview_dir: Option<PathBuf>,
}

fn non_blank(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("must not be blank".into());
    }
    Ok(s.to_string())
}

#[derive(Clone, Debug)]
struct MergeGroup(Vec<usize>);

impl FromStr for MergeGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows = s
            .split(',')
            .map(|t| {
                t.trim()
                    .parse::<usize>()
                    .map_err(|_| format!("not a part number: {t:?}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if rows.len() < 2 {
            return Err("a merge needs at least two part numbers".into());
        }
        Ok(MergeGroup(rows))
    }
}

#[derive(Clone, Debug)]
struct FieldEdit {
    row: usize,
    field: EditableField,
    value: String,
}

impl FromStr for FieldEdit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, rest) = s.split_once(':').ok_or("expected ROW:FIELD=VALUE")?;
        let (field, value) = rest.split_once('=').ok_or("expected ROW:FIELD=VALUE")?;
        let row = row
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("not a row number: {row:?}"))?;
        Ok(FieldEdit {
            row,
            field: field.parse()?,
            value: value.to_string(),
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let body = fs::read_to_string(&args.analysis)
        .with_context(|| format!("failed to read {}", args.analysis.display()))?;

    let mut session = OrderSession::new(LocalPricing);
    block_on(session.ingest_analysis(&body))
        .with_context(|| format!("failed to price {}", args.analysis.display()))?;
    let analyzed: Vec<PartId> = session.parts().map(|p| p.id).collect();

    if let Some(dir) = &args.preview_dir {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }

    for group in &args.merges {
        for &n in &group.0 {
            let id = n
                .checked_sub(1)
                .and_then(|i| analyzed.get(i))
                .copied()
                .with_context(|| format!("part {n} does not exist"))?;
            if session.part(id).is_none() {
                bail!("part {n} is already part of an earlier merge");
            }
            if !session.is_selected(id) {
                session.toggle_select(id)?;
            }
        }
        if let Some(merged) = block_on(session.merge_selected())? {
            if let (Some(dir), Some(part)) = (&args.preview_dir, session.part(merged)) {
                write_preview(dir, part)?;
            }
        }
    }

    for edit in &args.edits {
        let id = edit
            .row
            .checked_sub(1)
            .and_then(|i| session.id_at(i))
            .with_context(|| format!("row {} does not exist", edit.row))?;
        session.update_field(id, edit.field, &edit.value)?;
    }

    for (i, p) in session.parts().enumerate() {
        if !p.color.trim().is_empty() && quote_core::finish_hex(&p.color).is_none() {
            warn!(row = i + 1, color = %p.color, "color is not a catalog finish");
        }
    }

    let sheet = session
        .order_sheet(&args.customer)
        .context("order is not ready")?;
    let json = serde_json::to_string_pretty(&sheet)?;
    match &args.out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?
        }
        None => println!("{json}"),
    }
    info!(rows = sheet.rows.len(), total = sheet.total, "order sheet written");
    Ok(())
}

fn write_preview(dir: &Path, part: &Part) -> Result<()> {
    let Payload::Png(bytes) = parse_data_url(part.preview.as_str())? else {
        bail!("merged preview of {} is not a PNG", part.id);
    };
    let path = dir.join(format!("{}.png", part.id));
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "merged preview written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_merge_groups() {
        assert_eq!("1, 3,4".parse::<MergeGroup>().unwrap().0, vec![1, 3, 4]);
        assert!("2".parse::<MergeGroup>().is_err());
        assert!("1,x".parse::<MergeGroup>().is_err());
    }

    #[test]
    fn parses_field_edits() {
        let e: FieldEdit = "2:color=Gold Patina".parse().unwrap();
        assert_eq!((e.row, e.field, e.value.as_str()), (2, EditableField::Color, "Gold Patina"));
        let e: FieldEdit = "1:description=a=b".parse().unwrap();
        assert_eq!(e.value, "a=b");
        assert!("1:price=3".parse::<FieldEdit>().is_err());
        assert!("color=Red".parse::<FieldEdit>().is_err());
    }

    #[test]
    fn cli_accepts_repeated_flags() {
        let args = Args::try_parse_from([
            "order-sheet",
            "zoo.json",
            "--merge",
            "1,2",
            "--merge",
            "3,4",
            "--set",
            "1:name=Fox",
            "--customer",
            "Atelier",
        ])
        .unwrap();
        assert_eq!(args.merges.len(), 2);
        assert_eq!(args.edits[0].field, EditableField::Name);
        assert_eq!(args.customer, "Atelier");
    }

    #[test]
    fn blank_customer_is_refused() {
        let parsed = Args::try_parse_from(["order-sheet", "zoo.json", "--customer", "   "]);
        assert!(parsed.is_err());
        let args =
            Args::try_parse_from(["order-sheet", "zoo.json", "--customer", " Atelier "]).unwrap();
        assert_eq!(args.customer, "Atelier");
    }
}
