//! The bootstrap seeder.
//!
//! [`Seeder::ensure_seeded`] guarantees that exactly one document with the
//! plan's identifier exists in the target collection. It is a check followed
//! by an insert; when two seeders race, the store's uniqueness constraint
//! rejects the second insert and that rejection is reported as
//! [`SeedOutcome::AlreadyExists`].
//!
//! Presence is decided by identifier alone. Once seeded, the document belongs
//! to whoever edits it next, so its body is never read back.

use std::io::{self, Write};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};
use crate::record::BootstrapRecord;
use crate::store::DocumentStore;

/// Printed once seeding has finished without error, unless the plan says otherwise.
pub const DEFAULT_COMPLETION_MARKER: &str = "MongoDB initialization complete";

/// What to seed, and where.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedPlan {
    /// Target collection.
    pub collection: String,
    /// Label used in status lines, e.g. `Test application`.
    pub label: String,
    /// The record that must exist.
    pub record: BootstrapRecord,
    /// Final line of the report, which init harnesses wait for.
    pub completion_marker: String,
}

impl SeedPlan {
    /// Create a plan.
    #[must_use]
    pub fn new(
        collection: impl Into<String>,
        label: impl Into<String>,
        record: BootstrapRecord,
    ) -> Self {
        Self {
            collection: collection.into(),
            label: label.into(),
            record,
            completion_marker: DEFAULT_COMPLETION_MARKER.to_string(),
        }
    }

    /// Replace the completion marker.
    #[must_use]
    pub fn with_completion_marker(mut self, marker: impl Into<String>) -> Self {
        self.completion_marker = marker.into();
        self
    }
}

impl Default for SeedPlan {
    /// The built-in test application in the `applications` collection.
    fn default() -> Self {
        Self::new(
            "applications",
            "Test application",
            BootstrapRecord::test_application(),
        )
    }
}

/// Result of a successful [`Seeder::ensure_seeded`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedOutcome {
    /// The record was inserted by this call.
    Created,
    /// The record was already present; nothing was written.
    AlreadyExists,
}

impl SeedOutcome {
    /// Human-readable status line for the given label.
    #[must_use]
    pub fn status_line(self, label: &str) -> String {
        match self {
            Self::Created => format!("{label} created successfully"),
            Self::AlreadyExists => format!("{label} already exists, skipping insert"),
        }
    }

    /// Write the status line followed by the plan's completion marker, one
    /// per line.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_report(self, plan: &SeedPlan, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "{}", self.status_line(&plan.label))?;
        writeln!(out, "{}", plan.completion_marker)
    }
}

/// Whether the target collection holds the seed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedState {
    /// No document with the plan's identifier exists.
    Unseeded,
    /// A document with the plan's identifier exists.
    Seeded,
}

impl std::fmt::Display for SeedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unseeded => write!(f, "unseeded"),
            Self::Seeded => write!(f, "seeded"),
        }
    }
}

/// Ensures a bootstrap record exists in a document store.
///
/// The store is owned by the caller; the seeder neither opens nor closes it.
#[derive(Debug)]
pub struct Seeder<S> {
    store: S,
    plan: SeedPlan,
}

impl<S: DocumentStore> Seeder<S> {
    /// Create a seeder for `plan` against `store`.
    #[must_use]
    pub fn new(store: S, plan: SeedPlan) -> Self {
        Self { store, plan }
    }

    /// The plan this seeder enforces.
    #[must_use]
    pub fn plan(&self) -> &SeedPlan {
        &self.plan
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Release the store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Insert the plan's record unless a document with its identifier exists.
    ///
    /// At most one insert is attempted. Nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecord`] before touching the store if the record
    /// fails validation, [`Error::StoreUnavailable`] if the store cannot be
    /// reached, and [`Error::WriteFailure`] if the insert is rejected for a
    /// reason other than a duplicate identifier.
    #[instrument(skip(self), fields(store = self.store.name(), collection = %self.plan.collection, id = %self.plan.record.id))]
    pub async fn ensure_seeded(&self) -> Result<SeedOutcome> {
        let SeedPlan { collection, record, .. } = &self.plan;
        record.validate()?;

        if self.store.count_by_id(collection, &record.id).await? > 0 {
            info!(outcome = ?SeedOutcome::AlreadyExists, "seed finished");
            return Ok(SeedOutcome::AlreadyExists);
        }

        debug!("Record not found, inserting");
        let outcome = match self.store.insert(collection, record).await {
            Ok(()) => SeedOutcome::Created,
            Err(Error::DuplicateKeyConflict { .. }) => {
                debug!("Insert lost a race with another seeder");
                SeedOutcome::AlreadyExists
            }
            Err(err) => return Err(err),
        };

        info!(outcome = ?outcome, "seed finished");
        Ok(outcome)
    }

    /// Report whether the record is present without writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the store cannot be reached.
    pub async fn check(&self) -> Result<SeedState> {
        let count = self
            .store
            .count_by_id(&self.plan.collection, &self.plan.record.id)
            .await?;
        Ok(if count > 0 {
            SeedState::Seeded
        } else {
            SeedState::Unseeded
        })
    }
}
