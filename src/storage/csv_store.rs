//! CSV checkpoint store
//!
//! Persists a [`CrawlState`] as six human-inspectable tables inside the output
//! directory. Each table is written to a temporary file and renamed over the
//! previous one, so a crash mid-save leaves at most the table being written
//! stale.

use super::schema::{self, Table};
use super::traits::{CheckpointStore, StorageResult};
use crate::state::{CrawlState, Node, Tally};
use csv::{QuoteStyle, StringRecord};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Checkpoint store backed by CSV files in one directory
#[derive(Debug, Clone)]
pub struct CsvCheckpointStore {
    dir: PathBuf,
}

impl CsvCheckpointStore {
    /// Creates a store rooted at `dir`
    ///
    /// The directory is created on the first save if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn table_path(&self, table: &Table) -> PathBuf {
        self.dir.join(table.file_name)
    }

    /// Writes one table atomically
    fn write_table<R, I>(&self, table: &Table, count: u64, rows: R) -> StorageResult<()>
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let final_path = self.table_path(table);
        let tmp_path = self.dir.join(format!("{}.tmp", table.file_name));

        let file = File::create(&tmp_path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quote_style(QuoteStyle::Always)
            .from_writer(file);

        writer.write_record(schema::encode_count_line(table, count))?;
        writer.write_record(table.header)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }

    /// Reads one table, returning its count and data records with line numbers
    ///
    /// A missing table reads as empty. A malformed count line is logged and
    /// the count defaults to zero; the rows are still parsed.
    fn read_table(&self, table: &Table) -> StorageResult<Option<(u64, Vec<(u64, StringRecord)>)>> {
        let path = self.table_path(table);
        if !path.exists() {
            return Ok(None);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;

        let mut count = None;
        let mut rows = Vec::new();

        for (index, result) in reader.records().enumerate() {
            let record = result?;
            let line = index as u64 + 1;

            if index == 0 {
                count = schema::parse_count_line(table, &record);
                if count.is_none() {
                    tracing::warn!(
                        "Malformed count line in {}, defaulting {} to 0",
                        path.display(),
                        table.count_name
                    );
                }
                continue;
            }

            if index == 1 && table.is_header(&record) {
                continue;
            }

            if record.iter().all(str::is_empty) {
                continue;
            }

            rows.push((line, record));
        }

        Ok(Some((count.unwrap_or(0), rows)))
    }

    fn read_tally(&self, table: &Table) -> StorageResult<Tally> {
        let Some((count, rows)) = self.read_table(table)? else {
            tracing::debug!("No {} table, starting empty", table.file_name);
            return Ok(Tally::new());
        };

        let mut urls = BTreeMap::new();
        for (line, record) in rows {
            let (url, occurrences) = schema::decode_url_count(table, &record, line)?;
            urls.insert(url, occurrences);
        }

        Ok(Tally::from_parts(count, urls))
    }

    fn write_tally(&self, table: &Table, tally: &Tally) -> StorageResult<()> {
        self.write_table(
            table,
            tally.count(),
            tally
                .iter()
                .map(|(url, count)| schema::encode_url_count(url, count)),
        )
    }
}

impl CheckpointStore for CsvCheckpointStore {
    fn save(&mut self, state: &CrawlState) -> StorageResult<()> {
        fs::create_dir_all(&self.dir)?;

        self.write_table(
            &schema::ITEMS,
            state.processed_count,
            state.frontier.iter().map(schema::encode_node),
        )?;

        self.write_table(
            &schema::DUPS,
            state.ledger.duplicate_count(),
            state
                .ledger
                .iter()
                .map(|(url, trigger, entry)| schema::encode_ledger_entry(url, trigger, entry)),
        )?;

        self.write_tally(&schema::INVALIDS, &state.counters.invalid)?;
        self.write_tally(&schema::OUT_OF_SCOPE, &state.counters.out_of_scope)?;
        self.write_tally(&schema::TIMEOUTS, &state.counters.timeout)?;
        self.write_tally(&schema::ERRORS, &state.counters.error)?;

        tracing::debug!(
            "Checkpoint saved to {} ({} nodes, {} ledger entries)",
            self.dir.display(),
            state.frontier.len(),
            state.ledger.len()
        );
        Ok(())
    }

    fn load(&self) -> StorageResult<Option<CrawlState>> {
        let Some((processed_count, item_rows)) = self.read_table(&schema::ITEMS)? else {
            return Ok(None);
        };

        let mut state = CrawlState {
            processed_count,
            ..CrawlState::default()
        };

        for (line, record) in item_rows {
            let node: Node = schema::decode_node(&record, line)?;
            state.frontier.push(node);
        }

        if let Some((duplicate_count, dup_rows)) = self.read_table(&schema::DUPS)? {
            state.ledger.set_duplicate_count(duplicate_count);
            for (line, record) in dup_rows {
                let (url, trigger_id, entry) = schema::decode_ledger_entry(&record, line)?;
                state.ledger.restore(url, trigger_id, entry);
            }
        }

        // Every persisted node was admitted once, even if the dups table is stale
        let nodes: Vec<(String, Option<String>)> = state
            .frontier
            .iter()
            .map(|node| (node.url.clone(), node.trigger_id.clone()))
            .collect();
        for (url, trigger_id) in nodes {
            state.ledger.record(&url, trigger_id.as_deref());
        }

        state.counters.invalid = self.read_tally(&schema::INVALIDS)?;
        state.counters.out_of_scope = self.read_tally(&schema::OUT_OF_SCOPE)?;
        state.counters.timeout = self.read_tally(&schema::TIMEOUTS)?;
        state.counters.error = self.read_tally(&schema::ERRORS)?;
        state.counters.reconcile();

        tracing::info!(
            "Loaded checkpoint from {}: {} nodes, {} processed",
            self.dir.display(),
            state.frontier.len(),
            state.processed_count
        );
        Ok(Some(state))
    }
}
