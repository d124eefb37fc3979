//! Named loan scenarios, kept in memory and written through to a JSON file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::core::{Loan, PaymentConfig, PayoffResult, Scenario};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access scenario file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("scenario file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("scenario \"{name}\" has non-finite amounts and cannot be stored")]
    NonFinite { name: String },
}

/// Partial update; `None` fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct ScenarioUpdate {
    pub name: Option<String>,
    pub loan: Option<Loan>,
    pub payments: Option<PaymentConfig>,
    pub result: Option<PayoffResult>,
}

#[derive(Debug, Default)]
pub struct ScenarioStore {
    path: Option<PathBuf>,
    scenarios: Vec<Scenario>,
}

impl ScenarioStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads scenarios from `path`. A missing file opens an empty store that
    /// will be created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let scenarios = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => Vec::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Json {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        tracing::debug!(path = %path.display(), count = scenarios.len(), "loaded scenarios");

        Ok(Self {
            path: Some(path),
            scenarios,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn list(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn get(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    pub fn save(
        &mut self,
        name: impl Into<String>,
        loan: Loan,
        payments: PaymentConfig,
        result: PayoffResult,
    ) -> Result<Scenario, StoreError> {
        let scenario = Scenario {
            id: generate_id(),
            name: name.into(),
            loan,
            payments,
            result: Some(result),
            created_at: Utc::now().timestamp_millis(),
        };
        ensure_finite(&scenario)?;

        let mut next = self.scenarios.clone();
        next.push(scenario.clone());
        self.commit(next)?;
        Ok(scenario)
    }

    pub fn update(
        &mut self,
        id: &str,
        update: ScenarioUpdate,
    ) -> Result<Option<Scenario>, StoreError> {
        let Some(index) = self.scenarios.iter().position(|s| s.id == id) else {
            return Ok(None);
        };
        let mut scenario = self.scenarios[index].clone();

        if let Some(name) = update.name {
            scenario.name = name;
        }
        if let Some(loan) = update.loan {
            scenario.loan = loan;
        }
        if let Some(payments) = update.payments {
            scenario.payments = payments;
        }
        if let Some(result) = update.result {
            scenario.result = Some(result);
        }

        ensure_finite(&scenario)?;

        let mut next = self.scenarios.clone();
        next[index] = scenario.clone();
        self.commit(next)?;
        Ok(Some(scenario))
    }

    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let next: Vec<Scenario> = self
            .scenarios
            .iter()
            .filter(|s| s.id != id)
            .cloned()
            .collect();
        if next.len() == self.scenarios.len() {
            return Ok(false);
        }
        self.commit(next)?;
        Ok(true)
    }

    pub fn duplicate(&mut self, id: &str) -> Result<Option<Scenario>, StoreError> {
        let Some(original) = self.get(id) else {
            return Ok(None);
        };

        let copy = Scenario {
            id: generate_id(),
            name: format!("{} (copy)", original.name),
            created_at: Utc::now().timestamp_millis(),
            ..original.clone()
        };
        let mut next = self.scenarios.clone();
        next.push(copy.clone());
        self.commit(next)?;
        Ok(Some(copy))
    }

    /// Writes `next` to disk and only then makes it visible, so a failed
    /// write leaves the store as it was.
    fn commit(&mut self, next: Vec<Scenario>) -> Result<(), StoreError> {
        self.persist(&next)?;
        self.scenarios = next;
        Ok(())
    }

    fn persist(&self, scenarios: &[Scenario]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(scenarios).map_err(|source| {
            StoreError::Json {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })
    }
}

// serde_json writes non-finite floats as `null`, which `open` cannot read back.
fn ensure_finite(scenario: &Scenario) -> Result<(), StoreError> {
    let loan = &scenario.loan;
    let payments = &scenario.payments;
    let mut amounts = vec![
        loan.principal,
        loan.apr,
        payments.monthly_payment,
        payments.annual_lump_sum,
    ];
    if let Some(result) = &scenario.result {
        amounts.extend([result.total_interest, result.total_paid]);
        amounts.extend(result.schedule.iter().flat_map(|e| {
            [e.balance, e.principal, e.interest, e.payment, e.lump_sum]
        }));
    }

    if amounts.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(StoreError::NonFinite {
            name: scenario.name.clone(),
        })
    }
}

fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
