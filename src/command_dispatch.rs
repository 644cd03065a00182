//! Purpose: Run one parsed CLI command against the loaded export table.
//! Role: Keeps `main.rs` focused on argument parsing and error rendering.
//! Invariants: The table is loaded exactly once per process, before any output.
use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr};

use serde_json::json;

use exportboard::api::{ChartRequest, Dashboard, Error, ErrorKind, LookupRequest, RegionSource};

use super::{Command, RunOutcome, emit_json, serve};

pub(super) fn dispatch_command(
    command: Command,
    sources: &[RegionSource],
) -> Result<RunOutcome, Error> {
    match command {
        Command::Serve { host, port } => {
            let bind = bind_address(&host, port)?;
            let dashboard = Dashboard::load(sources)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to start runtime")
                        .with_source(err)
                })?;
            runtime.block_on(serve::serve(serve::ServeConfig { bind }, dashboard))?;
            Ok(RunOutcome::ok())
        }
        Command::Summary => {
            let dashboard = Dashboard::load(sources)?;
            let table = dashboard.table();
            emit_json(json!({
                "rows": table.len(),
                "regions": table.regions(),
                "sectors": table.sectors(),
                "years": table.years(),
            }));
            Ok(RunOutcome::ok())
        }
        Command::Table => {
            let dashboard = Dashboard::load(sources)?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for record in dashboard.table().records() {
                let line = serde_json::to_string(record).map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to encode record")
                        .with_source(err)
                })?;
                writeln!(out, "{line}").map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write stdout")
                        .with_source(err)
                })?;
            }
            Ok(RunOutcome::ok())
        }
        Command::Chart { regions, sectors } => {
            let dashboard = Dashboard::load(sources)?;
            let figure = dashboard.chart(&ChartRequest { regions, sectors });
            emit_json(json!({ "figure": figure }));
            Ok(RunOutcome::ok())
        }
        Command::Lookup {
            region,
            year,
            sector,
        } => {
            let dashboard = Dashboard::load(sources)?;
            let answer = dashboard.lookup(&LookupRequest {
                region: Some(region),
                year: Some(year),
                sector: Some(sector),
            });
            emit_json(json!({ "lookup": answer }));
            Ok(RunOutcome::ok())
        }
    }
}

fn bind_address(host: &str, port: u16) -> Result<SocketAddr, Error> {
    let ip: IpAddr = host.parse().map_err(|_| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("invalid host {host:?}"))
            .with_hint("Use an IP address like 0.0.0.0 or 127.0.0.1.")
    })?;
    Ok(SocketAddr::new(ip, port))
}
