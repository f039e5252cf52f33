use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use elective_dashboard::{
    AggregateResult, ColumnSelection, DashboardConfig, FilterCriteria, Session, ViewTable,
    load_cached,
};

/// One interaction's worth of input, as a rendering layer would send it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Request {
    config: DashboardConfig,
    criteria: FilterCriteria,
    columns: ColumnSelection,
}

#[derive(Serialize)]
struct Response<'a> {
    rows: usize,
    view: ViewTable,
    summaries: &'a AggregateResult,
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args_os().skip(1);
    let data_path = args
        .next()
        .map(PathBuf::from)
        .context("usage: elective-dashboard <data-file> [request.json]")?;

    let request: Request = match args.next() {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading request {}", PathBuf::from(&path).display()))?;
            serde_json::from_str(&text).context("parsing request")?
        }
        None => Request::default(),
    };

    let dataset = load_cached(&data_path, &request.config.load)?;
    let session =
        Session::with_selection(dataset, request.config, request.criteria, request.columns);

    let view = session.view();
    log::info!("{} of {} records match", view.len(), session.dataset().len());

    let response = Response {
        rows: view.len(),
        view: view.to_table(),
        summaries: session.aggregates(),
    };
    serde_json::to_writer_pretty(std::io::stdout().lock(), &response)
        .context("writing response")?;
    println!();
    Ok(())
}
