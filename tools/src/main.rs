//! leads-runner: headless runner for the lead analytics pipeline.
//!
//! Usage:
//!   leads-runner --data Ventas.csv
//!   leads-runner --data Ventas.csv --from 2019-01-01 --to 2019-12-31 --channel Web
//!   leads-runner --data Ventas.csv --config pipeline.json --ipc-mode

use anyhow::{Context, Result};
use chrono::NaiveDate;
use leads_core::{
    aggregate::AggregationRow,
    config::PipelineConfig,
    filter::FilterSelection,
    session::{AnalyticsSession, SessionState},
};
use std::env;
use std::fmt::Display;
use std::io::{self, BufRead, Write};

const TOP_PRODUCTS: usize = 10;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Filter {
        selection: FilterSelection,
    },
    ResetFilter,
    Refresh,
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data = find_arg(&args, "--data").unwrap_or("Ventas.csv");
    let config = match find_arg(&args, "--config") {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    let mut session = AnalyticsSession::new(data, config);

    if ipc_mode {
        let stdin = io::stdin();
        return run_ipc_loop(&mut session, stdin.lock(), &mut io::stdout());
    }

    println!("leads-runner: lead analytics");
    println!("  data:  {data}");
    println!();

    let state = session
        .report()
        .with_context(|| format!("Cannot build dataset from {data}"))?;

    if let Some(selection) = selection_from_args(&args, state.dataset.period)? {
        session.set_filter(selection);
        print_summary(&session.report()?);
    } else {
        print_summary(&state);
    }
    Ok(())
}

fn run_ipc_loop(
    session: &mut AnalyticsSession,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match handle_command(session, &line) {
            Some(reply) => {
                writeln!(out, "{reply}")?;
                out.flush()?;
            }
            None => break,
        }
    }
    Ok(())
}

/// Apply one JSON command and render the reply line. None means quit.
fn handle_command(session: &mut AnalyticsSession, line: &str) -> Option<String> {
    let cmd: IpcCommand = match serde_json::from_str(line) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Rejected IPC command: {e}");
            return Some(error_reply(&e.to_string()));
        }
    };

    match cmd {
        IpcCommand::Quit => return None,
        IpcCommand::GetState => {}
        IpcCommand::Filter { selection } => session.set_filter(selection),
        IpcCommand::ResetFilter => session.reset_filter(),
        IpcCommand::Refresh => session.refresh(),
    }

    let reply = match session.report() {
        Ok(state) => serde_json::to_string(&state).map_err(anyhow::Error::from),
        Err(e) => Err(e.into()),
    };
    Some(match reply {
        Ok(json) => json,
        Err(e) => {
            log::error!("Pipeline run failed: {e}");
            error_reply(&e.to_string())
        }
    })
}

fn error_reply(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

/// Build a selection from CLI flags, or None when no filter flag was given.
/// Unset bounds default to the dataset period.
fn selection_from_args(
    args: &[String],
    period: Option<(NaiveDate, NaiveDate)>,
) -> Result<Option<FilterSelection>> {
    let channels = all_args(args, "--channel");
    let products = all_args(args, "--product");
    let from = find_arg(args, "--from").map(parse_date).transpose()?;
    let to = find_arg(args, "--to").map(parse_date).transpose()?;

    if channels.is_empty() && products.is_empty() && from.is_none() && to.is_none() {
        return Ok(None);
    }

    let Some((period_start, period_end)) = period else {
        return Ok(None);
    };
    let selection = FilterSelection::new(from.unwrap_or(period_start), to.unwrap_or(period_end))
        .with_channels(channels)
        .with_products(products);
    Ok(Some(selection))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))
}

fn print_summary(state: &SessionState) {
    let info = &state.dataset;
    let h = &state.report.headline;

    println!("=== DATASET ===");
    println!("  total records:    {}", info.total_records);
    println!("  filtered records: {}", state.filtered_records);
    match info.period {
        Some((start, end)) => println!("  period:           {start} to {end}"),
        None => println!("  period:           N/A"),
    }
    println!();

    println!("=== HEADLINE ===");
    println!("  records:          {}", h.total_records);
    println!("  sales:            {}", h.total_converted);
    println!("  conversion rate:  {}", fmt_rate(h.conversion_rate));
    println!(
        "  avg days to conv: {}",
        h.mean_days_to_conversion
            .map(|d| format!("{d:.1} days"))
            .unwrap_or_else(|| "N/A".into())
    );

    print_table("MONTHLY", &state.report.monthly);
    print_table("YEARLY", &state.report.yearly);
    print_table("BY CONTACT CHANNEL", &state.report.by_channel);
    let top = state.report.by_product.len().min(TOP_PRODUCTS);
    print_table("TOP PRODUCTS", &state.report.by_product[..top]);
    print_table("BY WEEKDAY", &state.report.by_weekday);

    if !state.report.conversion_days.is_empty() {
        println!();
        println!("=== DAYS TO CONVERSION ===");
        for bin in &state.report.conversion_days {
            println!("  {:>7.1} .. {:>7.1}  {}", bin.lower, bin.upper, bin.count);
        }
    }
}

fn print_table<K: Display>(title: &str, rows: &[AggregationRow<K>]) {
    println!();
    println!("=== {title} ===");
    if rows.is_empty() {
        println!("  (no data)");
        return;
    }
    for row in rows {
        println!(
            "  {:<24} | records: {:>6} | sales: {:>6} | rate: {}",
            row.key.to_string(),
            row.count,
            row.converted_count,
            fmt_rate(row.conversion_rate)
        );
    }
}

fn fmt_rate(rate: Option<f64>) -> String {
    rate.map(|r| format!("{r:.2}%")).unwrap_or_else(|| "N/A".into())
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn all_args(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const SOURCE: &str = "Toma de contacto,Fecha de Creación,Fecha de Conversión,Producto\n\
        Web,01/01/2019 10:00,,A\n\
        Web,15/01/2019 09:00,,\n\
        Email,20/03/2019 10:00,,B\n";

    fn session_over(dir: &Path) -> AnalyticsSession {
        let _ = env_logger::builder().is_test(true).try_init();
        let path = dir.join("Ventas.csv");
        std::fs::write(&path, SOURCE).unwrap();
        AnalyticsSession::new(path, PipelineConfig::default())
    }

    fn reply_json(session: &mut AnalyticsSession, line: &str) -> serde_json::Value {
        let reply = handle_command(session, line).expect("reply expected");
        serde_json::from_str(&reply).unwrap()
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn malformed_command_gets_error_reply() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_over(dir.path());

        let reply = reply_json(&mut session, r#"{"type":"bogus"}"#);
        let message = reply["error"].as_str().unwrap();
        assert!(message.contains("bogus"), "got {message}");

        let reply = reply_json(&mut session, "not json");
        assert!(reply["error"].is_string());
    }

    #[test]
    fn missing_source_gets_error_reply() {
        let dir = tempfile::tempdir().unwrap();
        let mut session =
            AnalyticsSession::new(dir.path().join("absent.csv"), PipelineConfig::default());

        let reply = reply_json(&mut session, r#"{"type":"get_state"}"#);
        let message = reply["error"].as_str().unwrap();
        assert!(message.contains("not found"), "got {message}");
    }

    #[test]
    fn filter_then_reset_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_over(dir.path());

        let full = reply_json(&mut session, r#"{"type":"get_state"}"#);
        assert_eq!(full["filtered_records"], 3);

        let filtered = reply_json(
            &mut session,
            r#"{"type":"filter","selection":{"start":"2019-01-01","end":"2019-12-31","channels":["Web"]}}"#,
        );
        assert_eq!(filtered["filtered_records"], 2);
        assert_eq!(filtered["report"]["headline"]["conversion_rate"], 50.0);

        let reset = reply_json(&mut session, r#"{"type":"reset_filter"}"#);
        assert_eq!(reset["filtered_records"], 3);
        assert!(session.selection().is_none());
    }

    #[test]
    fn quit_stops_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_over(dir.path());
        let input = "{\"type\":\"get_state\"}\n\n{\"type\":\"quit\"}\n{\"type\":\"get_state\"}\n";

        let mut out = Vec::new();
        run_ipc_loop(&mut session, input.as_bytes(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1, "only the first command is answered");
    }

    #[test]
    fn unset_bounds_default_to_dataset_period() {
        let period = Some((date(2019, 1, 1), date(2019, 3, 20)));

        let sel = selection_from_args(&args(&["leads-runner", "--from", "2019-02-01"]), period)
            .unwrap()
            .unwrap();
        assert_eq!(sel.start, date(2019, 2, 1));
        assert_eq!(sel.end, date(2019, 3, 20));

        let sel = selection_from_args(&args(&["leads-runner", "--channel", "Web"]), period)
            .unwrap()
            .unwrap();
        assert_eq!((sel.start, sel.end), (date(2019, 1, 1), date(2019, 3, 20)));
        assert!(sel.channels.contains("Web"));
    }

    #[test]
    fn no_filter_flags_means_no_selection() {
        let period = Some((date(2019, 1, 1), date(2019, 3, 20)));
        let sel = selection_from_args(&args(&["leads-runner", "--data", "x.csv"]), period).unwrap();
        assert!(sel.is_none());

        let bad = selection_from_args(&args(&["leads-runner", "--to", "20/03/2019"]), period);
        assert!(bad.is_err());
    }
}
