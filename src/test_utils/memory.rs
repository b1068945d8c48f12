use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::SqlConduitError;
use crate::provider::{Command, DriverConnection, DriverTransaction, ProviderFactory, RowCursor};
use crate::types::{ConnectionState, IsolationLevel, SqlValue};

#[derive(Default)]
struct MemoryState {
    committed: Vec<String>,
    pending: Option<Vec<String>>,
    canned: HashMap<String, (Vec<String>, Vec<Vec<SqlValue>>)>,
    out_values: HashMap<String, Vec<(String, SqlValue)>>,
    rows_affected: HashMap<String, u64>,
    fail_marker: Option<String>,
    fail_rollback: bool,
    fail_commit: bool,
    prepared: Vec<String>,
    data_sources: Vec<String>,
    connection_strings: Vec<String>,
    open_count: u32,
    close_count: u32,
}

/// Scripted provider: tests queue result sets, output values, and failure
/// markers up front, then inspect the statement journal afterwards.
///
/// All connections created by one factory share the same state, so a
/// transaction begun on one connection is observable through the factory.
#[derive(Clone, Default)]
pub struct MemoryFactory {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Queue a result set for a query text.
    pub fn script_rows(&self, query: &str, columns: Vec<&str>, rows: Vec<Vec<SqlValue>>) {
        self.lock().canned.insert(
            query.to_owned(),
            (columns.into_iter().map(str::to_owned).collect(), rows),
        );
    }

    /// Queue output-parameter values written back when `query` executes.
    pub fn script_output(&self, query: &str, outputs: Vec<(&str, SqlValue)>) {
        self.lock().out_values.insert(
            query.to_owned(),
            outputs
                .into_iter()
                .map(|(name, value)| (name.to_owned(), value))
                .collect(),
        );
    }

    /// Affected-row count reported for a statement (default 1).
    pub fn script_rows_affected(&self, query: &str, affected: u64) {
        self.lock()
            .rows_affected
            .insert(query.to_owned(), affected);
    }

    /// Any statement containing `marker` fails with an execution error.
    pub fn fail_when_contains(&self, marker: &str) {
        self.lock().fail_marker = Some(marker.to_owned());
    }

    pub fn fail_rollback(&self, fail: bool) {
        self.lock().fail_rollback = fail;
    }

    pub fn fail_commit(&self, fail: bool) {
        self.lock().fail_commit = fail;
    }

    pub fn set_data_sources(&self, sources: Vec<&str>) {
        self.lock().data_sources = sources.into_iter().map(str::to_owned).collect();
    }

    /// Statements applied outside, or committed by, a transaction.
    #[must_use]
    pub fn committed(&self) -> Vec<String> {
        self.lock().committed.clone()
    }

    /// Whether a transaction is open with uncommitted statements.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.lock().pending.is_some()
    }

    #[must_use]
    pub fn prepared(&self) -> Vec<String> {
        self.lock().prepared.clone()
    }

    #[must_use]
    pub fn connection_strings(&self) -> Vec<String> {
        self.lock().connection_strings.clone()
    }

    #[must_use]
    pub fn open_count(&self) -> u32 {
        self.lock().open_count
    }

    #[must_use]
    pub fn close_count(&self) -> u32 {
        self.lock().close_count
    }
}

impl ProviderFactory for MemoryFactory {
    fn provider_name(&self) -> &str {
        "memory"
    }

    fn create_connection(
        &self,
        connection_string: &str,
    ) -> Result<Box<dyn DriverConnection>, SqlConduitError> {
        if connection_string.trim().is_empty() {
            return Err(SqlConduitError::Config(
                "memory connection string must not be empty".into(),
            ));
        }
        self.lock()
            .connection_strings
            .push(connection_string.to_owned());
        Ok(Box::new(MemoryConnection {
            state: ConnectionState::Closed,
            shared: self.state.clone(),
        }))
    }

    fn supports_data_source_enumeration(&self) -> bool {
        true
    }

    fn enumerate_data_sources(&self) -> Result<Vec<String>, SqlConduitError> {
        Ok(self.lock().data_sources.clone())
    }
}

/// A connection sharing its factory's scripted state.
pub struct MemoryConnection {
    state: ConnectionState,
    shared: Arc<Mutex<MemoryState>>,
}

impl MemoryConnection {
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        match self.shared.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_open(&self) -> Result<(), SqlConduitError> {
        if self.state != ConnectionState::Open {
            return Err(SqlConduitError::Execution(
                "memory connection is not open".into(),
            ));
        }
        Ok(())
    }

    fn apply_outputs(state: &MemoryState, command: &mut Command) {
        if let Some(outputs) = state.out_values.get(command.text()) {
            for (name, value) in outputs.clone() {
                command.write_output(&name, value);
            }
        }
    }

    fn check_failure(state: &MemoryState, text: &str) -> Result<(), SqlConduitError> {
        if let Some(marker) = &state.fail_marker
            && text.contains(marker.as_str())
        {
            return Err(SqlConduitError::Execution(format!(
                "scripted failure for statement: {text}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DriverConnection for MemoryConnection {
    fn state(&self) -> ConnectionState {
        self.state
    }

    fn open(&mut self) -> Result<(), SqlConduitError> {
        self.lock().open_count += 1;
        self.state = ConnectionState::Open;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SqlConduitError> {
        if self.state == ConnectionState::Open {
            self.lock().close_count += 1;
        }
        self.state = ConnectionState::Closed;
        Ok(())
    }

    fn execute(&mut self, command: &mut Command) -> Result<u64, SqlConduitError> {
        self.check_open()?;
        let mut state = match self.shared.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Self::check_failure(&state, command.text())?;
        let text = command.text().to_owned();
        let affected = state.rows_affected.get(&text).copied().unwrap_or(1);
        match &mut state.pending {
            Some(buffer) => buffer.push(text),
            None => state.committed.push(text),
        }
        Self::apply_outputs(&state, command);
        Ok(affected)
    }

    fn query(&mut self, command: &mut Command) -> Result<Box<dyn RowCursor>, SqlConduitError> {
        self.check_open()?;
        let state = self.lock();
        Self::check_failure(&state, command.text())?;
        let (columns, rows) = state
            .canned
            .get(command.text())
            .cloned()
            .unwrap_or((Vec::new(), Vec::new()));
        Self::apply_outputs(&state, command);
        Ok(Box::new(MemoryCursor {
            columns: Arc::new(columns),
            rows: rows.into(),
            closed: false,
        }))
    }

    fn scalar(&mut self, command: &mut Command) -> Result<SqlValue, SqlConduitError> {
        self.check_open()?;
        let state = self.lock();
        Self::check_failure(&state, command.text())?;
        let value = state
            .canned
            .get(command.text())
            .and_then(|(_, rows)| rows.first())
            .and_then(|row| row.first())
            .cloned()
            .unwrap_or(SqlValue::Null);
        Self::apply_outputs(&state, command);
        Ok(value)
    }

    fn prepare(&mut self, sql: &str) -> Result<(), SqlConduitError> {
        self.lock().prepared.push(sql.to_owned());
        Ok(())
    }

    fn begin(
        &mut self,
        _isolation: IsolationLevel,
    ) -> Result<Box<dyn DriverTransaction>, SqlConduitError> {
        self.check_open()?;
        let mut state = self.lock();
        if state.pending.is_some() {
            return Err(SqlConduitError::Transaction(
                "transaction already active".into(),
            ));
        }
        state.pending = Some(Vec::new());
        Ok(Box::new(MemoryTransaction {
            shared: self.shared.clone(),
            completed: false,
        }))
    }
}

struct MemoryTransaction {
    shared: Arc<Mutex<MemoryState>>,
    completed: bool,
}

impl MemoryTransaction {
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        match self.shared.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl DriverTransaction for MemoryTransaction {
    fn commit(&mut self) -> Result<(), SqlConduitError> {
        if self.completed {
            return Err(SqlConduitError::Transaction(
                "transaction already completed".into(),
            ));
        }
        self.completed = true;
        let mut state = self.lock();
        if state.fail_commit {
            return Err(SqlConduitError::Transaction(
                "scripted commit failure".into(),
            ));
        }
        match state.pending.take() {
            Some(mut buffer) => {
                state.committed.append(&mut buffer);
                Ok(())
            }
            None => Err(SqlConduitError::Transaction(
                "no active transaction to commit".into(),
            )),
        }
    }

    fn rollback(&mut self) -> Result<(), SqlConduitError> {
        if self.completed {
            return Err(SqlConduitError::Transaction(
                "transaction already completed".into(),
            ));
        }
        self.completed = true;
        let mut state = self.lock();
        if state.fail_rollback {
            return Err(SqlConduitError::Transaction(
                "scripted rollback failure".into(),
            ));
        }
        state.pending = None;
        Ok(())
    }
}

struct MemoryCursor {
    columns: Arc<Vec<String>>,
    rows: VecDeque<Vec<SqlValue>>,
    closed: bool,
}

#[async_trait]
impl RowCursor for MemoryCursor {
    fn columns(&self) -> Arc<Vec<String>> {
        self.columns.clone()
    }

    fn next_row(&mut self) -> Result<Option<Vec<SqlValue>>, SqlConduitError> {
        if self.closed {
            return Err(SqlConduitError::Execution("cursor already closed".into()));
        }
        Ok(self.rows.pop_front())
    }

    fn close(&mut self) -> Result<(), SqlConduitError> {
        self.closed = true;
        self.rows.clear();
        Ok(())
    }
}
