//! Whitespace-delimited data file: one header line, then one row per trial
//! across all completed tasks, in task order then trial order.

use anyhow::{Context, Result, anyhow, ensure};
use pscale_core::Response;
use rand::Rng;
use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::task::CompletedTask;

pub const HEADER: &str = "expId s r c lambda beta maxVal";

/// One line of the data file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataRow {
    pub task_index: usize,
    pub stimulus: f64,
    pub response: Response,
    pub criterion: f64,
    pub lambda_px: f64,
    pub beta: f64,
    pub max_val: f64,
}

pub fn rows(tasks: &[CompletedTask]) -> impl Iterator<Item = DataRow> + '_ {
    tasks.iter().enumerate().flat_map(|(task_index, task)| {
        let params = *task.params();
        task.trials().iter().map(move |trial| DataRow {
            task_index,
            stimulus: trial.stimulus,
            response: trial.response,
            criterion: trial.criterion,
            lambda_px: params.lambda_px,
            beta: params.beta,
            max_val: params.max_val,
        })
    })
}

pub fn to_string(tasks: &[CompletedTask]) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    for row in rows(tasks) {
        let _ = writeln!(
            out,
            "{} {} {} {} {} {} {}",
            row.task_index,
            row.stimulus,
            row.response.as_u8(),
            row.criterion,
            row.lambda_px,
            row.beta,
            row.max_val
        );
    }
    out
}

pub fn write_data<W: Write>(mut writer: W, tasks: &[CompletedTask]) -> Result<()> {
    writer.write_all(to_string(tasks).as_bytes())?;
    writer.flush()?;
    Ok(())
}

pub fn parse_data(text: &str) -> Result<Vec<DataRow>> {
    let mut lines = text.lines();
    let header = lines.next().ok_or_else(|| anyhow!("empty data file"))?;
    ensure!(header.trim() == HEADER, "unexpected header {header:?}");

    lines
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_row(line).with_context(|| format!("line {}", i + 2)))
        .collect()
}

fn parse_row(line: &str) -> Result<DataRow> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    ensure!(fields.len() == 7, "expected 7 fields, found {}", fields.len());
    let float = |i: usize| -> Result<f64> {
        fields[i]
            .parse::<f64>()
            .with_context(|| format!("field {} ({:?})", i + 1, fields[i]))
    };
    let response = fields[2]
        .parse::<u8>()
        .ok()
        .and_then(Response::from_u8)
        .ok_or_else(|| anyhow!("response must be 0 or 1, got {:?}", fields[2]))?;

    Ok(DataRow {
        task_index: fields[0]
            .parse()
            .with_context(|| format!("task index {:?}", fields[0]))?,
        stimulus: float(1)?,
        response,
        criterion: float(3)?,
        lambda_px: float(4)?,
        beta: float(5)?,
        max_val: float(6)?,
    })
}

/// A random identifier in the exactly representable integer range of an
/// `f64`.
pub fn random_id<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    rng.random_range(0..(1u64 << 53))
}

pub fn data_file_name(id: u64) -> String {
    format!("expData{id}.txt")
}

pub fn save(dir: &Path, file_name: &str, tasks: &[CompletedTask]) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(file_name);
    let file = fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    write_data(std::io::BufWriter::new(file), tasks)?;
    tracing::info!(path = %path.display(), tasks = tasks.len(), "data written");
    Ok(path)
}
