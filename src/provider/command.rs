use std::time::Duration;

use crate::params::SqlParameter;
use crate::types::{CommandKind, SqlValue};

/// Driver-agnostic command descriptor.
///
/// Built by [`crate::provider::ObjectFactory::create_command`]; the driver
/// interprets it and writes output parameter values back into `params`.
#[derive(Debug)]
pub struct Command {
    kind: CommandKind,
    text: String,
    /// Parameters in store order. Drivers update output/return entries.
    pub params: Vec<SqlParameter>,
    timeout: Option<Duration>,
    transactional: bool,
}

impl Command {
    pub(crate) fn new(
        kind: CommandKind,
        text: String,
        params: Vec<SqlParameter>,
        timeout: Option<Duration>,
        transactional: bool,
    ) -> Self {
        Self {
            kind,
            text,
            params,
            timeout,
            transactional,
        }
    }

    #[must_use]
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether this command runs inside an open transaction.
    #[must_use]
    pub fn transactional(&self) -> bool {
        self.transactional
    }

    /// Driver-side helper: write an output value into the named parameter.
    /// Unknown names are ignored, matching backends that report extra
    /// output columns.
    pub fn write_output(&mut self, name: &str, value: SqlValue) {
        if let Some(param) = self
            .params
            .iter_mut()
            .find(|p| p.name().eq_ignore_ascii_case(name))
        {
            param.set_value(value);
        }
    }
}

impl Drop for Command {
    fn drop(&mut self) {
        // Stale-parameter hygiene: a disposed command never leaks its
        // parameter list into a later reuse.
        self.params.clear();
    }
}
