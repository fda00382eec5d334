// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use chrono::{DateTime, Utc};
use clap::Parser;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use log::{error, info, warn};
use payment_ledger_rs::{
    Currency, EventId, EventKind, InstrumentId, Ledger, LedgerError, Money, PaymentEvent,
    PaymentStatus,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use thiserror::Error;

/// Payment Ledger - Reconcile payment event CSV files
///
/// Reads payment events from a CSV file and outputs the reconciled totals of
/// every order payment instrument to stdout.
#[derive(Parser, Debug)]
#[command(name = "payment-ledger")]
#[command(about = "Reconciles payment events per order payment instrument", long_about = None)]
struct Args {
    /// Path to CSV file with payment events
    ///
    /// Expected format: id,parent,instrument,type,status,amount,currency,date
    /// Example: cargo run -- events.csv > totals.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Path to CSV file with instrument limits (instrument,limit,currency)
    #[arg(long, value_name = "FILE")]
    limits: Option<PathBuf>,

    /// Abort on the first malformed row or rejected event
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("event {id}: {source}")]
    Rejected { id: EventId, source: LedgerError },
    #[error("limit of instrument {instrument}: {source}")]
    Limit {
        instrument: InstrumentId,
        source: LedgerError,
    },
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        error!("{e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let ledger = process_events(BufReader::new(open(&args.input)?), args.strict)?;
    if let Some(path) = &args.limits {
        load_limits(&ledger, BufReader::new(open(path)?))?;
    }
    info!(
        "recorded {} events for {} instruments",
        ledger.event_count(),
        ledger.instruments().len()
    );
    write_summaries(&ledger, std::io::stdout())?;
    Ok(())
}

fn open(path: &Path) -> Result<File, CliError> {
    File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(true)
        .from_reader(reader)
}

/// Raw CSV record matching the input format.
///
/// Fields: `id, parent, instrument, type, status, amount, currency, date`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    id: u32,
    parent: Option<u32>,
    instrument: u16,
    #[serde(rename = "type")]
    kind: EventKind,
    status: PaymentStatus,
    amount: Decimal,
    currency: Currency,
    date: DateTime<Utc>,
}

impl CsvRecord {
    fn into_event(self) -> PaymentEvent {
        PaymentEvent {
            id: EventId(self.id),
            parent: self.parent.map(EventId),
            instrument: InstrumentId(self.instrument),
            kind: self.kind,
            status: self.status,
            amount: Money::new(self.amount, self.currency),
            date: self.date,
        }
    }
}

/// Limit record: `instrument, limit, currency`.
#[derive(Debug, Deserialize)]
struct LimitRecord {
    instrument: u16,
    limit: Decimal,
    currency: Currency,
}

/// Records payment events from a CSV reader.
///
/// Rows are streamed. Unless `strict` is set, malformed rows and events the
/// ledger rejects are logged and skipped.
///
/// # Example
///
/// ```csv
/// id,parent,instrument,type,status,amount,currency,date
/// 1,,1,reserve,approved,100.00,CAD,2024-01-01T09:00:00Z
/// 2,1,1,charge,approved,60.00,CAD,2024-01-01T09:05:00Z
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails, or in strict mode the first
/// malformed row or rejected event.
fn process_events<R: Read>(reader: R, strict: bool) -> Result<Ledger, CliError> {
    let ledger = Ledger::new();

    for result in csv_reader(reader).deserialize::<CsvRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) if strict => return Err(e.into()),
            Err(e) => {
                warn!("skipping malformed row: {e}");
                continue;
            }
        };

        let id = EventId(record.id);
        if let Err(source) = ledger.record(record.into_event()) {
            if strict {
                return Err(CliError::Rejected { id, source });
            }
            warn!("skipping event {id}: {source}");
        }
    }

    Ok(ledger)
}

/// Applies instrument limits from a CSV reader. Any bad row is an error.
fn load_limits<R: Read>(ledger: &Ledger, reader: R) -> Result<(), CliError> {
    for result in csv_reader(reader).deserialize::<LimitRecord>() {
        let record = result?;
        let instrument = InstrumentId(record.instrument);
        ledger
            .set_limit(instrument, Money::new(record.limit, record.currency))
            .map_err(|source| CliError::Limit { instrument, source })?;
    }
    Ok(())
}

/// Columns of the summary output.
const SUMMARY_HEADER: [&str; 7] = [
    "instrument",
    "currency",
    "available",
    "charged",
    "refunded",
    "reverse_charged",
    "reservable",
];

/// Writes instrument totals to a CSV writer, ordered by instrument ID.
///
/// The header row is always written. Instruments that fail to reconcile are
/// logged and left out.
///
/// # CSV Format
///
/// Columns: `instrument, currency, available, charged, refunded, reverse_charged, reservable`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
fn write_summaries<W: Write>(ledger: &Ledger, writer: W) -> Result<(), csv::Error> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(SUMMARY_HEADER)?;

    for id in ledger.instruments() {
        match ledger.summary(id) {
            Some(Ok(summary)) => wtr.serialize(&summary)?,
            Some(Err(e)) => error!("instrument {id} failed to reconcile: {e}"),
            None => {}
        }
    }

    wtr.flush()?;
    Ok(())
}
