use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use error_common::truncate_chars;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::a1::A1Range;
use crate::backend::TabularBackend;
use crate::error::{DatabaseError, DatabaseResult, TabularError};
use crate::models::{Animal, AnimalFilter, Appointment, Record};
use crate::rows::{self, ANIMAL_COLUMNS, FIRST_DATA_ROW, RECORD_COLUMNS};

/// What happens to an in-memory insert when its remote mirror write fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WritePolicy {
    /// Undo the insert and report the failure
    #[default]
    Strict,
    /// Keep the insert and log; the replica diverges until the next reload
    Lenient,
}

#[derive(Debug, Clone)]
pub struct RepositorySettings {
    pub animals_tab: String,
    pub records_tab: String,
    pub write_policy: WritePolicy,
    /// Skip the remote mirror entirely
    pub local_only: bool,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            animals_tab: "animals".to_string(),
            records_tab: "records".to_string(),
            write_policy: WritePolicy::Strict,
            local_only: false,
        }
    }
}

impl RepositorySettings {
    /// Reads `SHEETS_TAB_ANIMALS`, `SHEETS_TAB_RECORDS`, `SHEETS_STRICT_WRITES` and `LOCAL_DEV`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let strict = std::env::var("SHEETS_STRICT_WRITES")
            .ok()
            .and_then(|v| parse_flag(&v))
            .unwrap_or(true);
        Self {
            animals_tab: std::env::var("SHEETS_TAB_ANIMALS").unwrap_or(defaults.animals_tab),
            records_tab: std::env::var("SHEETS_TAB_RECORDS").unwrap_or(defaults.records_tab),
            write_policy: if strict {
                WritePolicy::Strict
            } else {
                WritePolicy::Lenient
            },
            local_only: std::env::var("LOCAL_DEV")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }
}

/// `1/true/yes/on` and `0/false/no/off`, case-insensitive
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Where a record lives in the index
#[derive(Debug, Clone, PartialEq)]
pub struct RecordLocation {
    pub animal_id: String,
    pub index: usize,
    pub record: Record,
}

/// Outcome of a full reload from the remote store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub animals: usize,
    pub records: usize,
    pub skipped_rows: usize,
}

/// In-memory animal/record index mirrored to a remote tabular store.
///
/// Reads only take the index lock. Every mutation and every reload holds
/// `write_lock` for its whole duration, remote round-trips included, so
/// remote row order always matches in-memory append order.
pub struct ChartRepository {
    animals: RwLock<BTreeMap<String, Animal>>,
    write_lock: Mutex<()>,
    backend: Arc<dyn TabularBackend>,
    settings: RepositorySettings,
}

impl ChartRepository {
    pub fn new(backend: Arc<dyn TabularBackend>, settings: RepositorySettings) -> Self {
        info!(
            backend = backend.name(),
            write_policy = ?settings.write_policy,
            local_only = settings.local_only,
            "Chart repository initialized"
        );
        Self {
            animals: RwLock::new(BTreeMap::new()),
            write_lock: Mutex::new(()),
            backend,
            settings,
        }
    }

    pub fn settings(&self) -> &RepositorySettings {
        &self.settings
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn animal_count(&self) -> usize {
        self.animals.read().len()
    }

    /// Insert a new animal and mirror it as one row
    pub async fn add_animal(&self, animal: Animal) -> DatabaseResult<Animal> {
        let _guard = self.write_lock.lock().await;
        {
            let mut animals = self.animals.write();
            if animals.contains_key(&animal.id) {
                return Err(DatabaseError::DuplicateAnimal(animal.id));
            }
            animals.insert(animal.id.clone(), animal.clone());
        }
        info!(animal_id = %animal.id, name = %animal.name, "Animal added");

        if self.settings.local_only {
            return Ok(animal);
        }

        let range = A1Range::cell(&self.settings.animals_tab, 0, 1).to_string();
        match self.backend.append_row(&range, rows::animal_to_row(&animal)).await {
            Ok(()) => {
                info!(animal_id = %animal.id, "Animal mirrored to remote store");
                Ok(animal)
            }
            Err(error) => {
                self.resolve_mirror_failure("add_animal", error, || {
                    self.animals.write().remove(&animal.id);
                })?;
                Ok(animal)
            }
        }
    }

    /// Append a record to its animal and mirror it as one row
    pub async fn add_record(&self, record: Record) -> DatabaseResult<Record> {
        let _guard = self.write_lock.lock().await;
        {
            let mut animals = self.animals.write();
            if locate(&animals, &record.id).is_some() {
                return Err(DatabaseError::DuplicateRecord(record.id));
            }
            let animal = animals
                .get_mut(&record.animal_id)
                .ok_or_else(|| DatabaseError::AnimalNotFound(record.animal_id.clone()))?;
            animal.records.push(record.clone());
        }
        info!(record_id = %record.id, animal_id = %record.animal_id, "Record added");

        if self.settings.local_only {
            return Ok(record);
        }

        let range = A1Range::cell(&self.settings.records_tab, 0, 1).to_string();
        match self.backend.append_row(&range, rows::record_to_row(&record)).await {
            Ok(()) => {
                info!(record_id = %record.id, "Record mirrored to remote store");
                Ok(record)
            }
            Err(error) => {
                self.resolve_mirror_failure("add_record", error, || {
                    let mut animals = self.animals.write();
                    if let Some(animal) = animals.get_mut(&record.animal_id) {
                        if animal.records.last().is_some_and(|last| last.id == record.id) {
                            animal.records.pop();
                        }
                    }
                })?;
                Ok(record)
            }
        }
    }

    fn resolve_mirror_failure(
        &self,
        operation: &str,
        error: TabularError,
        rollback: impl FnOnce(),
    ) -> DatabaseResult<()> {
        match self.settings.write_policy {
            WritePolicy::Strict => {
                rollback();
                warn!(operation, error = %error, code = error.code(), "Remote write failed; in-memory change rolled back");
                Err(error.into())
            }
            WritePolicy::Lenient => {
                warn!(operation, error = %error, code = error.code(), "Remote write failed; keeping in-memory change until next reload");
                Ok(())
            }
        }
    }

    pub fn find_record(&self, record_id: &str) -> Option<RecordLocation> {
        locate(&self.animals.read(), record_id)
    }

    pub fn get_record(&self, record_id: &str) -> Option<Record> {
        self.find_record(record_id).map(|location| location.record)
    }

    /// Replace a record in place. The id and owning animal are kept.
    pub async fn update_record(&self, record_id: &str, mut record: Record) -> DatabaseResult<Record> {
        let _guard = self.write_lock.lock().await;
        let location = self
            .find_record(record_id)
            .ok_or_else(|| DatabaseError::RecordNotFound(record_id.to_string()))?;
        record.id = location.record.id.clone();
        record.animal_id = location.animal_id.clone();
        record.created_at = location.record.created_at;

        if !self.settings.local_only {
            let row = self.remote_row_of(record_id).await?;
            let range = A1Range::row_span(&self.settings.records_tab, row, 0, RECORD_COLUMNS - 1);
            self.backend
                .update_row(&range.to_string(), rows::record_to_row(&record))
                .await?;
        }

        let mut animals = self.animals.write();
        if let Some(slot) = animals
            .get_mut(&location.animal_id)
            .and_then(|animal| animal.records.get_mut(location.index))
        {
            *slot = record.clone();
        }
        info!(record_id = %record.id, "Record updated");
        Ok(record)
    }

    /// Blank the record's remote row, then drop it from the index
    pub async fn delete_record(&self, record_id: &str) -> DatabaseResult<Record> {
        let _guard = self.write_lock.lock().await;
        let location = self
            .find_record(record_id)
            .ok_or_else(|| DatabaseError::RecordNotFound(record_id.to_string()))?;

        if !self.settings.local_only {
            let row = self.remote_row_of(record_id).await?;
            let range = A1Range::row_span(&self.settings.records_tab, row, 0, RECORD_COLUMNS - 1);
            self.backend.clear_range(&range.to_string()).await?;
        }

        let mut animals = self.animals.write();
        if let Some(animal) = animals.get_mut(&location.animal_id) {
            if location.index < animal.records.len() {
                animal.records.remove(location.index);
            }
        }
        info!(record_id = %record_id, animal_id = %location.animal_id, "Record deleted");
        Ok(location.record)
    }

    /// One-based sheet row holding `record_id`, found by scanning the id column
    async fn remote_row_of(&self, record_id: &str) -> DatabaseResult<u32> {
        let range = A1Range::rows_from(&self.settings.records_tab, 1, 1, FIRST_DATA_ROW);
        let ids = self.backend.read_range(&range.to_string()).await?;
        ids.iter()
            .position(|row| row.first().is_some_and(|id| id.trim() == record_id))
            .and_then(|offset| u32::try_from(offset).ok())
            .map(|offset| offset + FIRST_DATA_ROW)
            .ok_or_else(|| DatabaseError::RowNotFound(record_id.to_string()))
    }

    /// Rebuild the whole index from the remote store.
    ///
    /// Malformed rows and orphan records are skipped with a warning. The
    /// current index is only replaced when both tabs were read successfully.
    pub async fn load_from_remote(&self) -> DatabaseResult<LoadSummary> {
        if self.settings.local_only {
            return Err(DatabaseError::Configuration(
                "local-only mode has no remote store to load from".to_string(),
            ));
        }
        let _guard = self.write_lock.lock().await;

        let animal_range =
            A1Range::rows_from(&self.settings.animals_tab, 0, ANIMAL_COLUMNS - 1, FIRST_DATA_ROW);
        let record_range =
            A1Range::rows_from(&self.settings.records_tab, 0, RECORD_COLUMNS - 1, FIRST_DATA_ROW);
        let animal_rows = self.backend.read_range(&animal_range.to_string()).await?;
        let record_rows = self.backend.read_range(&record_range.to_string()).await?;

        let (fresh, summary) = build_index(&animal_rows, &record_rows);
        *self.animals.write() = fresh;

        info!(
            animals = summary.animals,
            records = summary.records,
            skipped_rows = summary.skipped_rows,
            "Loaded chart data from remote store"
        );
        Ok(summary)
    }

    pub fn get_animal(&self, animal_id: &str) -> Option<Animal> {
        self.animals.read().get(animal_id).cloned()
    }

    pub fn list_animals(&self) -> Vec<Animal> {
        self.animals.read().values().cloned().collect()
    }

    /// Case-insensitive substring match on name or farm id
    pub fn search_animals(&self, query: &str) -> Vec<Animal> {
        let needle = query.trim().to_lowercase();
        self.animals
            .read()
            .values()
            .filter(|animal| {
                animal.name.to_lowercase().contains(&needle)
                    || animal
                        .farm_id
                        .as_deref()
                        .is_some_and(|farm| farm.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    /// Free-text query narrowed by attribute filters
    pub fn filter_animals(&self, filter: &AnimalFilter) -> Vec<Animal> {
        let base = match filter.query.as_deref().filter(|q| !q.trim().is_empty()) {
            Some(query) => self.search_animals(query),
            None => self.list_animals(),
        };
        base.into_iter().filter(|animal| filter.matches(animal)).collect()
    }

    pub fn records_for_animal(&self, animal_id: &str) -> Option<Vec<Record>> {
        self.animals
            .read()
            .get(animal_id)
            .map(|animal| animal.records.clone())
    }

    /// Plain-text digest of an animal's visit history
    pub fn summary(&self, animal_id: &str) -> DatabaseResult<String> {
        let records = self
            .records_for_animal(animal_id)
            .ok_or_else(|| DatabaseError::AnimalNotFound(animal_id.to_string()))?;
        Ok(visit_summary(&records))
    }

    /// Follow-ups derived from records carrying a next-visit date,
    /// optionally restricted to one day, ordered by date then time
    pub fn appointments(&self, date: Option<&str>) -> Vec<Appointment> {
        let animals = self.animals.read();
        let mut appointments: Vec<Appointment> = animals
            .values()
            .flat_map(|animal| {
                animal
                    .records
                    .iter()
                    .filter_map(move |record| appointment_for(animal, record))
            })
            .filter(|appointment| date.map_or(true, |day| appointment.date == day))
            .collect();
        appointments.sort_by(|a, b| (&a.date, &a.time).cmp(&(&b.date, &b.time)));
        appointments
    }
}

fn locate(animals: &BTreeMap<String, Animal>, record_id: &str) -> Option<RecordLocation> {
    animals.values().find_map(|animal| {
        animal
            .records
            .iter()
            .position(|record| record.id == record_id)
            .and_then(|index| {
                animal.records.get(index).map(|record| RecordLocation {
                    animal_id: animal.id.clone(),
                    index,
                    record: record.clone(),
                })
            })
    })
}

fn build_index(
    animal_rows: &[Vec<String>],
    record_rows: &[Vec<String>],
) -> (BTreeMap<String, Animal>, LoadSummary) {
    let mut animals = BTreeMap::new();
    let mut summary = LoadSummary::default();

    for (offset, row) in animal_rows.iter().enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let sheet_row = offset + FIRST_DATA_ROW as usize;
        match rows::animal_from_row(row) {
            Ok(animal) => {
                if animals.contains_key(&animal.id) {
                    warn!(row = sheet_row, animal_id = %animal.id, "Duplicate animal row; later row wins");
                }
                animals.insert(animal.id.clone(), animal);
            }
            Err(reason) => {
                warn!(row = sheet_row, %reason, "Skipping animal row");
                summary.skipped_rows += 1;
            }
        }
    }

    let mut seen_records = HashSet::new();
    for (offset, row) in record_rows.iter().enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let sheet_row = offset + FIRST_DATA_ROW as usize;
        let record = match rows::record_from_row(row) {
            Ok(record) => record,
            Err(reason) => {
                warn!(row = sheet_row, %reason, "Skipping record row");
                summary.skipped_rows += 1;
                continue;
            }
        };
        if !seen_records.insert(record.id.clone()) {
            warn!(row = sheet_row, record_id = %record.id, "Skipping duplicate record row");
            summary.skipped_rows += 1;
            continue;
        }
        match animals.get_mut(&record.animal_id) {
            Some(animal) => animal.records.push(record),
            None => {
                warn!(row = sheet_row, animal_id = %record.animal_id, "Skipping record for unknown animal");
                summary.skipped_rows += 1;
            }
        }
    }

    summary.animals = animals.len();
    summary.records = animals.values().map(|animal| animal.records.len()).sum();
    (animals, summary)
}

fn appointment_for(animal: &Animal, record: &Record) -> Option<Appointment> {
    let next_visit = record
        .next_visit_date
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())?;

    // Dates may carry a time part as `YYYY-MM-DDTHH:MM`
    let (date, embedded_time) = match next_visit.split_once('T') {
        Some((date, time)) => (date.to_string(), Some(truncate_chars(time, 5).to_string())),
        None => (truncate_chars(next_visit, 10).to_string(), None),
    };
    let time = record
        .next_visit_time
        .clone()
        .filter(|value| !value.trim().is_empty())
        .or(embedded_time)
        .unwrap_or_default();

    Some(Appointment {
        id: format!("{}-{}", animal.id, record.id),
        microchip_number: animal.microchip_number.clone(),
        animal_name: animal.name.clone(),
        farm_id: animal.farm_id.clone(),
        date,
        time,
        description: None,
        summary: non_empty(&record.soap.assessment),
        status: "scheduled".to_string(),
        doctor: record.doctor.clone(),
    })
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn visit_summary(records: &[Record]) -> String {
    if records.is_empty() {
        return "No past visit records for this animal.".to_string();
    }
    let mut lines = vec!["Past visit records:".to_string()];
    for record in records {
        lines.push(format!(
            "{}: S({}), O({}), A({}), P({})",
            record.visit_date,
            or_dash(&record.soap.subjective),
            or_dash(&record.soap.objective),
            or_dash(&record.soap.assessment),
            or_dash(&record.soap.plan),
        ));
    }
    lines.join("\n")
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockTabularBackend;
    use crate::memory::InMemoryTabularBackend;
    use crate::models::SoapNote;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    fn memory_repository() -> (Arc<InMemoryTabularBackend>, ChartRepository) {
        let backend = Arc::new(
            InMemoryTabularBackend::new()
                .with_rows("animals", vec![row(&["microchip", "farm", "name"])])
                .with_rows("records", vec![row(&["animal", "id", "date"])]),
        );
        let repository = ChartRepository::new(backend.clone(), RepositorySettings::default());
        (backend, repository)
    }

    fn failing_backend() -> MockTabularBackend {
        let mut backend = MockTabularBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_append_row()
            .returning(|_, _| Err(TabularError::Unreachable("connection refused".to_string())));
        backend
    }

    fn lenient() -> RepositorySettings {
        RepositorySettings {
            write_policy: WritePolicy::Lenient,
            ..RepositorySettings::default()
        }
    }

    #[tokio::test]
    async fn test_add_animal_and_search() {
        let (backend, repository) = memory_repository();
        repository
            .add_animal(Animal::new("392000000001", "Hanako").with_farm_id("FARM-7"))
            .await
            .unwrap();
        repository.add_animal(Animal::new("392000000002", "Taro")).await.unwrap();

        assert_eq!(repository.get_animal("392000000001").unwrap().name, "Hanako");
        assert_eq!(repository.search_animals("hana").len(), 1);
        assert_eq!(repository.search_animals("farm-7").len(), 1);
        assert_eq!(repository.search_animals("").len(), 2);
        assert_eq!(backend.rows("animals").len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_animal_is_rejected() {
        let (_, repository) = memory_repository();
        repository.add_animal(Animal::new("1", "Hanako")).await.unwrap();
        let error = repository.add_animal(Animal::new("1", "Other")).await.unwrap_err();
        assert_eq!(error, DatabaseError::DuplicateAnimal("1".to_string()));
        assert_eq!(repository.get_animal("1").unwrap().name, "Hanako");
    }

    #[tokio::test]
    async fn test_add_record_for_unknown_animal_never_touches_remote() {
        let mut backend = MockTabularBackend::new();
        backend.expect_name().return_const("mock");
        backend.expect_append_row().times(0);
        let repository = ChartRepository::new(Arc::new(backend), RepositorySettings::default());

        let error = repository
            .add_record(Record::new("missing", SoapNote::default()))
            .await
            .unwrap_err();
        assert_eq!(error.code(), "animal_not_found");
        assert_eq!(repository.animal_count(), 0);
    }

    #[tokio::test]
    async fn test_add_record_appends_once() {
        let (backend, repository) = memory_repository();
        repository.add_animal(Animal::new("1", "Hanako")).await.unwrap();
        let record = repository
            .add_record(Record::new("1", SoapNote::new("cough", "", "", "")))
            .await
            .unwrap();

        let location = repository.find_record(&record.id).unwrap();
        assert_eq!(location.animal_id, "1");
        assert_eq!(location.index, 0);
        assert_eq!(repository.records_for_animal("1").unwrap().len(), 1);
        assert_eq!(backend.rows("records").len(), 2);

        let error = repository.add_record(record).await.unwrap_err();
        assert_eq!(error.code(), "duplicate_record");
    }

    #[tokio::test]
    async fn test_strict_policy_rolls_back_animal() {
        let repository = ChartRepository::new(Arc::new(failing_backend()), RepositorySettings::default());
        let error = repository.add_animal(Animal::new("1", "Hanako")).await.unwrap_err();
        assert_eq!(error.code(), "remote_unreachable");
        assert!(repository.get_animal("1").is_none());
    }

    #[tokio::test]
    async fn test_lenient_policy_keeps_animal() {
        let repository = ChartRepository::new(Arc::new(failing_backend()), lenient());
        repository.add_animal(Animal::new("1", "Hanako")).await.unwrap();
        assert!(repository.get_animal("1").is_some());
    }

    /// Accepts the first append, rejects every later one
    fn second_append_fails() -> MockTabularBackend {
        let mut backend = MockTabularBackend::new();
        backend.expect_name().return_const("mock");
        let mut calls = 0;
        backend.expect_append_row().times(2).returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Ok(())
            } else {
                Err(TabularError::Api {
                    status: 500,
                    message: "backend error".to_string(),
                })
            }
        });
        backend
    }

    #[tokio::test]
    async fn test_strict_policy_rolls_back_record() {
        let repository =
            ChartRepository::new(Arc::new(second_append_fails()), RepositorySettings::default());
        repository.add_animal(Animal::new("1", "Hanako")).await.unwrap();

        let error = repository
            .add_record(Record::new("1", SoapNote::default()))
            .await
            .unwrap_err();
        assert_eq!(error.code(), "remote_api");
        assert!(repository.records_for_animal("1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lenient_policy_keeps_record() {
        let repository = ChartRepository::new(Arc::new(second_append_fails()), lenient());
        repository.add_animal(Animal::new("1", "Hanako")).await.unwrap();

        let record = repository
            .add_record(Record::new("1", SoapNote::new("cough", "", "", "")))
            .await
            .unwrap();
        assert_eq!(repository.records_for_animal("1").unwrap().len(), 1);
        let location = repository.find_record(&record.id).unwrap();
        assert_eq!(location.index, 0);
        assert_eq!(location.record, record);
    }

    #[tokio::test]
    async fn test_local_only_never_calls_backend() {
        let mut backend = MockTabularBackend::new();
        backend.expect_name().return_const("mock");
        let settings = RepositorySettings {
            local_only: true,
            ..RepositorySettings::default()
        };
        let repository = ChartRepository::new(Arc::new(backend), settings);

        repository.add_animal(Animal::new("1", "Hanako")).await.unwrap();
        let record = repository.add_record(Record::new("1", SoapNote::default())).await.unwrap();
        repository
            .update_record(&record.id, Record::new("1", SoapNote::new("s", "o", "a", "p")))
            .await
            .unwrap();
        repository.delete_record(&record.id).await.unwrap();
        assert!(repository.records_for_animal("1").unwrap().is_empty());

        let error = repository.load_from_remote().await.unwrap_err();
        assert_eq!(error.code(), "configuration");
        assert_eq!(repository.animal_count(), 1);
    }

    #[tokio::test]
    async fn test_update_record_rewrites_row_and_keeps_identity() {
        let (backend, repository) = memory_repository();
        repository.add_animal(Animal::new("1", "Hanako")).await.unwrap();
        repository.add_animal(Animal::new("2", "Taro")).await.unwrap();
        let first = repository.add_record(Record::new("1", SoapNote::default())).await.unwrap();
        let second = repository.add_record(Record::new("1", SoapNote::default())).await.unwrap();

        let replacement = Record::new("2", SoapNote::new("better", "", "recovering", ""));
        let updated = repository.update_record(&second.id, replacement).await.unwrap();
        assert_eq!(updated.id, second.id);
        assert_eq!(updated.animal_id, "1");

        let rows = backend.rows("records");
        assert_eq!(rows[1][1], first.id);
        assert_eq!(rows[2][1], second.id);
        assert_eq!(rows[2][3], "better");
        assert_eq!(repository.get_record(&second.id).unwrap().soap.assessment, "recovering");
    }

    #[tokio::test]
    async fn test_update_record_missing_remote_row() {
        let mut backend = MockTabularBackend::new();
        backend.expect_name().return_const("mock");
        backend.expect_append_row().returning(|_, _| Ok(()));
        backend.expect_read_range().returning(|_| Ok(Vec::new()));
        backend.expect_update_row().times(0);
        let repository = ChartRepository::new(Arc::new(backend), RepositorySettings::default());
        repository.add_animal(Animal::new("1", "Hanako")).await.unwrap();
        let record = repository
            .add_record(Record::new("1", SoapNote::new("old", "", "", "")))
            .await
            .unwrap();

        let error = repository
            .update_record(&record.id, Record::new("1", SoapNote::new("new", "", "", "")))
            .await
            .unwrap_err();
        assert_eq!(error, DatabaseError::RowNotFound(record.id.clone()));
        assert_eq!(repository.get_record(&record.id).unwrap().soap.subjective, "old");
    }

    #[tokio::test]
    async fn test_delete_record_clears_remote_row() {
        let (backend, repository) = memory_repository();
        repository.add_animal(Animal::new("1", "Hanako")).await.unwrap();
        let record = repository.add_record(Record::new("1", SoapNote::default())).await.unwrap();

        repository.delete_record(&record.id).await.unwrap();
        assert!(repository.find_record(&record.id).is_none());
        assert!(backend.rows("records")[1].iter().all(String::is_empty));
        assert_eq!(
            repository.delete_record(&record.id).await.unwrap_err().code(),
            "record_not_found"
        );
    }

    #[tokio::test]
    async fn test_reload_reproduces_written_state() {
        let (backend, repository) = memory_repository();
        let mut animal = Animal::new("392000000001", "Hanako").with_farm_id("FARM-7").with_age(3);
        animal.thumbnail_url = Some("/uploads/hanako.jpg".to_string());
        repository.add_animal(animal).await.unwrap();
        let mut record = Record::new("392000000001", SoapNote::new("cough", "fever", "pneumonia", "rest"));
        record.images = vec!["/uploads/x.jpg".to_string()];
        record.doctor = Some("Dr. Sato".to_string());
        repository.add_record(record).await.unwrap();

        let reloaded = ChartRepository::new(backend, RepositorySettings::default());
        let summary = reloaded.load_from_remote().await.unwrap();
        assert_eq!(summary, LoadSummary { animals: 1, records: 1, skipped_rows: 0 });

        let original = repository.get_animal("392000000001").unwrap();
        let restored = reloaded.get_animal("392000000001").unwrap();
        assert_eq!(restored.name, original.name);
        assert_eq!(restored.thumbnail_url, original.thumbnail_url);
        assert_eq!(restored.records[0].id, original.records[0].id);
        assert_eq!(restored.records[0].soap, original.records[0].soap);
        assert_eq!(restored.records[0].images, original.records[0].images);
    }

    #[tokio::test]
    async fn test_reload_skips_malformed_and_orphan_rows() {
        let backend = InMemoryTabularBackend::new()
            .with_rows(
                "animals",
                vec![
                    row(&["microchip", "farm", "name"]),
                    row(&["1", "F", "Hanako"]),
                    row(&["", "F", "Nameless chip"]),
                    row(&["3", "F", ""]),
                ],
            )
            .with_rows(
                "records",
                vec![
                    row(&["animal", "id"]),
                    row(&["1", "r1", "2024-05-01"]),
                    row(&["1", "", "2024-05-02"]),
                    row(&["999", "r3", "2024-05-03"]),
                    row(&[]),
                ],
            );
        let repository = ChartRepository::new(Arc::new(backend), RepositorySettings::default());
        let summary = repository.load_from_remote().await.unwrap();
        assert_eq!(summary.animals, 1);
        assert_eq!(summary.records, 1);
        assert_eq!(summary.skipped_rows, 4);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_state() {
        let mut backend = MockTabularBackend::new();
        backend.expect_name().return_const("mock");
        let mut reads = 0;
        backend.expect_read_range().returning(move |_| {
            reads += 1;
            match reads {
                1 => Ok(vec![row(&["1", "", "Hanako"])]),
                2 => Ok(Vec::new()),
                _ => Err(TabularError::Unreachable("timeout".to_string())),
            }
        });
        let repository = ChartRepository::new(Arc::new(backend), RepositorySettings::default());
        repository.load_from_remote().await.unwrap();
        assert_eq!(repository.animal_count(), 1);

        assert!(repository.load_from_remote().await.is_err());
        assert_eq!(repository.animal_count(), 1);
    }

    #[tokio::test]
    async fn test_appointments_and_summary() {
        let (_, repository) = memory_repository();
        repository.add_animal(Animal::new("1", "Hanako").with_farm_id("F1")).await.unwrap();
        assert_eq!(repository.summary("1").unwrap(), "No past visit records for this animal.");

        let mut later = Record::new("1", SoapNote::new("", "", "mastitis", "recheck udder"));
        later.next_visit_date = Some("2024-06-02T09:30".to_string());
        let mut earlier = Record::new("1", SoapNote::default());
        earlier.next_visit_date = Some("2024-06-01".to_string());
        earlier.next_visit_time = Some("14:00".to_string());
        let plain = Record::new("1", SoapNote::default());
        let later = repository.add_record(later).await.unwrap();
        repository.add_record(earlier).await.unwrap();
        repository.add_record(plain).await.unwrap();

        let all = repository.appointments(None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].date, "2024-06-01");
        assert_eq!(all[1].time, "09:30");
        assert_eq!(all[1].id, format!("1-{}", later.id));
        assert_eq!(all[1].summary.as_deref(), Some("mastitis"));
        assert_eq!(all[1].status, "scheduled");

        assert_eq!(repository.appointments(Some("2024-06-02")).len(), 1);
        assert!(repository.summary("1").unwrap().contains("A(mastitis)"));
        assert_eq!(repository.summary("nope").unwrap_err().code(), "animal_not_found");
    }

    #[tokio::test]
    async fn test_filter_animals() {
        let (_, repository) = memory_repository();
        repository
            .add_animal(Animal::new("1", "Hanako").with_breed("Holstein").with_sex("F"))
            .await
            .unwrap();
        repository
            .add_animal(Animal::new("2", "Hanabi").with_breed("Jersey"))
            .await
            .unwrap();

        let filter = AnimalFilter {
            query: Some("hana".to_string()),
            breed: Some("Jersey".to_string()),
            ..AnimalFilter::default()
        };
        let found = repository.filter_animals(&filter);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "2");
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
