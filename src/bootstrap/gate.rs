use crate::bootstrap::probe::ProbeSnapshot;
use serde::Serialize;
use thiserror::Error;

/// What the initializer should do with a probed store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GateDecision {
    /// Marker already matches; touch nothing.
    Continue { version: String },
    /// Rewrite the namespaced marker, leave the data alone.
    Migrate { from: Option<String>, to: String },
    /// Empty, unmarked store. Populate defaults, then write the marker.
    Seed { to: String },
}

impl GateDecision {
    pub fn seeds(&self) -> bool {
        matches!(self, GateDecision::Seed { .. })
    }

    pub fn writes_version(&self) -> bool {
        !matches!(self, GateDecision::Continue { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error(
        "store already holds {dbsize} keys but carries no recognizable version marker; \
         override the database check only if it belongs to this service"
    )]
    ForeignDatabase { dbsize: u64 },
}

/// Pure decision table over a [`ProbeSnapshot`].
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    expected_version: String,
    allow_foreign: bool,
}

impl Gatekeeper {
    pub fn new(expected_version: impl Into<String>, allow_foreign: bool) -> Self {
        Self {
            expected_version: expected_version.into(),
            allow_foreign,
        }
    }

    pub fn expected_version(&self) -> &str {
        &self.expected_version
    }

    pub fn evaluate(&self, probe: &ProbeSnapshot) -> Result<GateDecision, GateError> {
        let legacy = probe.legacy();
        let current = probe.current();

        if legacy.is_none() && current.is_none() && probe.dbsize > 0 && !self.allow_foreign {
            return Err(GateError::ForeignDatabase {
                dbsize: probe.dbsize,
            });
        }

        let effective = probe.effective_version();
        let to = self.expected_version.clone();

        // The marker write a fresh store would otherwise get up front is
        // deferred until seeding succeeds.
        if effective.is_none() && probe.dbsize == 0 {
            return Ok(GateDecision::Seed { to });
        }

        let legacy_only = legacy.is_some() && current.is_none();
        if legacy_only || effective != Some(self.expected_version.as_str()) {
            return Ok(GateDecision::Migrate {
                from: effective.map(str::to_string),
                to,
            });
        }

        Ok(GateDecision::Continue { version: to })
    }
}
