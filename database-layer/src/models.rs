use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Route prefix under which stored uploads are served
pub const UPLOAD_LOCATOR_PREFIX: &str = "/uploads/";

/// Subjective / Objective / Assessment / Plan clinical note.
///
/// The wire format uses the one-letter keys `s`, `o`, `a`, `p`; the long names
/// are accepted on input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoapNote {
    #[serde(rename = "s", alias = "subjective", default)]
    pub subjective: String,
    #[serde(rename = "o", alias = "objective", default)]
    pub objective: String,
    #[serde(rename = "a", alias = "assessment", default)]
    pub assessment: String,
    #[serde(rename = "p", alias = "plan", default)]
    pub plan: String,
}

impl SoapNote {
    pub fn new(
        subjective: impl Into<String>,
        objective: impl Into<String>,
        assessment: impl Into<String>,
        plan: impl Into<String>,
    ) -> Self {
        Self {
            subjective: subjective.into(),
            objective: objective.into(),
            assessment: assessment.into(),
            plan: plan.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subjective.is_empty()
            && self.objective.is_empty()
            && self.assessment.is_empty()
            && self.plan.is_empty()
    }
}

/// Structured medication entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub name: String,
    #[serde(default)]
    pub dose: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
}

/// A single visit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(rename = "animalId")]
    pub animal_id: String,
    #[serde(default)]
    pub soap: SoapNote,
    #[serde(default = "today")]
    pub visit_date: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(rename = "audioUrl", default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub medications: Vec<MedicationEntry>,
    #[serde(default)]
    pub medication_history: Vec<String>,
    #[serde(default)]
    pub next_visit_date: Option<String>,
    #[serde(default)]
    pub next_visit_time: Option<String>,
    #[serde(default)]
    pub doctor: Option<String>,
    /// Insurance billing points
    #[serde(rename = "nosai_points", default)]
    pub billing_points: Option<i64>,
    #[serde(default)]
    pub external_case_id: Option<String>,
    #[serde(default)]
    pub external_ref_url: Option<String>,
    #[serde(rename = "createdAt", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

impl Record {
    /// New record with a fresh opaque id, visit date defaulting to today
    pub fn new(animal_id: impl Into<String>, soap: SoapNote) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            animal_id: animal_id.into(),
            soap,
            visit_date: today(),
            images: Vec::new(),
            audio_url: None,
            medications: Vec::new(),
            medication_history: Vec::new(),
            next_visit_date: None,
            next_visit_time: None,
            doctor: None,
            billing_points: None,
            external_case_id: None,
            external_ref_url: None,
            created_at: Utc::now(),
        }
    }
}

/// A registered animal, keyed by microchip number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    pub id: String,
    pub microchip_number: String,
    pub name: String,
    #[serde(default)]
    pub farm_id: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(rename = "thumbnailUrl", default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub records: Vec<Record>,
}

impl Animal {
    /// The microchip number doubles as the primary key
    pub fn new(microchip_number: impl Into<String>, name: impl Into<String>) -> Self {
        let microchip_number = microchip_number.into();
        Self {
            id: microchip_number.clone(),
            microchip_number,
            name: name.into(),
            farm_id: None,
            age: None,
            sex: None,
            breed: None,
            thumbnail_url: None,
            records: Vec::new(),
        }
    }

    pub fn with_farm_id(mut self, farm_id: impl Into<String>) -> Self {
        self.farm_id = Some(farm_id.into());
        self
    }

    pub fn with_breed(mut self, breed: impl Into<String>) -> Self {
        self.breed = Some(breed.into());
        self
    }

    pub fn with_sex(mut self, sex: impl Into<String>) -> Self {
        self.sex = Some(sex.into());
        self
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }
}

/// Scheduled follow-up derived from a record's next-visit fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub microchip_number: String,
    pub animal_name: String,
    pub farm_id: Option<String>,
    pub date: String,
    pub time: String,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub status: String,
    pub doctor: Option<String>,
}

/// Optional attribute filters for animal listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnimalFilter {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub microchip_number: Option<String>,
    #[serde(default)]
    pub farm_id: Option<String>,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
}

impl AnimalFilter {
    /// Attribute filters only exclude animals that carry the attribute and differ
    pub fn matches(&self, animal: &Animal) -> bool {
        if let Some(chip) = non_empty(&self.microchip_number) {
            if animal.microchip_number != chip {
                return false;
            }
        }
        if let (Some(wanted), Some(actual)) = (non_empty(&self.farm_id), animal.farm_id.as_deref()) {
            if !actual.contains(wanted) {
                return false;
            }
        }
        if let (Some(wanted), Some(actual)) = (non_empty(&self.breed), animal.breed.as_deref()) {
            if actual != wanted {
                return false;
            }
        }
        if let (Some(wanted), Some(actual)) = (non_empty(&self.sex), animal.sex.as_deref()) {
            if actual != wanted {
                return false;
            }
        }
        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
