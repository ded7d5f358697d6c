//! Row codec between the in-memory models and spreadsheet rows.
//!
//! Animals tab, columns A..G:
//! `microchip | farm_id | name | age | sex | breed | thumbnail`
//!
//! Records tab, columns A..M:
//! `animal_id | record_id | visit_date | s | o | a | p | medication_history |
//!  next_visit_date | next_visit_time | images | audio | doctor`
//!
//! Multi-valued cells are comma-joined. Empty optional cells decode to `None`.
//! Only key columns and list items are trimmed; free text is kept as stored.

use std::fmt;

use crate::models::{Animal, Record, SoapNote, UPLOAD_LOCATOR_PREFIX};

pub const ANIMAL_COLUMNS: u32 = 7;
pub const RECORD_COLUMNS: u32 = 13;

/// First data row on both tabs; row 1 is the header
pub const FIRST_DATA_ROW: u32 = 2;

const LIST_SEPARATOR: char = ',';

/// Why a stored row could not be turned into a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRejection {
    MissingMicrochip,
    MissingName { microchip: String },
    MissingAnimalId,
    MissingRecordId { animal_id: String },
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowRejection::MissingMicrochip => write!(f, "missing microchip number"),
            RowRejection::MissingName { microchip } => {
                write!(f, "animal {} has no name", microchip)
            }
            RowRejection::MissingAnimalId => write!(f, "missing animal id"),
            RowRejection::MissingRecordId { animal_id } => {
                write!(f, "record for animal {} has no record id", animal_id)
            }
        }
    }
}

pub fn animal_to_row(animal: &Animal) -> Vec<String> {
    vec![
        animal.microchip_number.clone(),
        optional_cell(animal.farm_id.as_deref()),
        animal.name.clone(),
        animal.age.map(|age| age.to_string()).unwrap_or_default(),
        optional_cell(animal.sex.as_deref()),
        optional_cell(animal.breed.as_deref()),
        thumbnail_to_cell(animal.thumbnail_url.as_deref()),
    ]
}

pub fn animal_from_row(row: &[String]) -> Result<Animal, RowRejection> {
    let microchip = key_cell(row, 0);
    if microchip.is_empty() {
        return Err(RowRejection::MissingMicrochip);
    }
    let name = cell(row, 2);
    if name.trim().is_empty() {
        return Err(RowRejection::MissingName {
            microchip: microchip.to_string(),
        });
    }

    let mut animal = Animal::new(microchip, name);
    animal.farm_id = optional_value(cell(row, 1));
    animal.age = key_cell(row, 3).parse().ok();
    animal.sex = optional_value(cell(row, 4));
    animal.breed = optional_value(cell(row, 5));
    animal.thumbnail_url = thumbnail_from_cell(key_cell(row, 6));
    Ok(animal)
}

pub fn record_to_row(record: &Record) -> Vec<String> {
    vec![
        record.animal_id.clone(),
        record.id.clone(),
        record.visit_date.clone(),
        record.soap.subjective.clone(),
        record.soap.objective.clone(),
        record.soap.assessment.clone(),
        record.soap.plan.clone(),
        join_list(&record.medication_history),
        optional_cell(record.next_visit_date.as_deref()),
        optional_cell(record.next_visit_time.as_deref()),
        join_list(&record.images),
        optional_cell(record.audio_url.as_deref()),
        optional_cell(record.doctor.as_deref()),
    ]
}

pub fn record_from_row(row: &[String]) -> Result<Record, RowRejection> {
    let animal_id = key_cell(row, 0);
    if animal_id.is_empty() {
        return Err(RowRejection::MissingAnimalId);
    }
    let record_id = key_cell(row, 1);
    if record_id.is_empty() {
        return Err(RowRejection::MissingRecordId {
            animal_id: animal_id.to_string(),
        });
    }

    let soap = SoapNote::new(cell(row, 3), cell(row, 4), cell(row, 5), cell(row, 6));
    let mut record = Record::new(animal_id, soap);
    record.id = record_id.to_string();
    if !key_cell(row, 2).is_empty() {
        record.visit_date = cell(row, 2).to_string();
    }
    record.medication_history = split_list(cell(row, 7));
    record.next_visit_date = optional_value(cell(row, 8));
    record.next_visit_time = optional_value(cell(row, 9));
    record.images = split_list(cell(row, 10));
    record.audio_url = optional_value(cell(row, 11));
    record.doctor = optional_value(cell(row, 12));
    Ok(record)
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map_or("", String::as_str)
}

fn key_cell(row: &[String], index: usize) -> &str {
    cell(row, index).trim()
}

fn optional_cell(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn optional_value(cell: &str) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

fn join_list(items: &[String]) -> String {
    items.join(&LIST_SEPARATOR.to_string())
}

fn split_list(cell: &str) -> Vec<String> {
    cell.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Locally stored thumbnails keep only their file name in the sheet
fn thumbnail_to_cell(locator: Option<&str>) -> String {
    match locator {
        Some(locator) => locator
            .strip_prefix(UPLOAD_LOCATOR_PREFIX)
            .unwrap_or(locator)
            .to_string(),
        None => String::new(),
    }
}

fn thumbnail_from_cell(cell: &str) -> Option<String> {
    if cell.is_empty() {
        None
    } else if cell.contains('/') {
        Some(cell.to_string())
    } else {
        Some(format!("{}{}", UPLOAD_LOCATOR_PREFIX, cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    #[test]
    fn test_animal_row_layout() {
        let mut animal = Animal::new("392000000001", "Hanako")
            .with_farm_id("FARM-7")
            .with_age(4)
            .with_breed("Holstein");
        animal.thumbnail_url = Some("/uploads/abc123.jpg".to_string());

        let row = animal_to_row(&animal);
        assert_eq!(
            row,
            strings(&["392000000001", "FARM-7", "Hanako", "4", "", "Holstein", "abc123.jpg"])
        );
        assert_eq!(animal_from_row(&row).unwrap(), animal);
    }

    #[test]
    fn test_external_thumbnail_is_kept_verbatim() {
        let mut animal = Animal::new("1", "Taro");
        animal.thumbnail_url = Some("https://cdn.example.org/taro.png".to_string());
        let row = animal_to_row(&animal);
        assert_eq!(row[6], "https://cdn.example.org/taro.png");
        assert_eq!(animal_from_row(&row).unwrap().thumbnail_url, animal.thumbnail_url);
    }

    #[test]
    fn test_short_rows_decode_with_defaults() {
        let animal = animal_from_row(&strings(&["42", "", "Pochi"])).unwrap();
        assert_eq!(animal.name, "Pochi");
        assert_eq!(animal.farm_id, None);
        assert_eq!(animal.age, None);

        let record = record_from_row(&strings(&["42", "r1", "2024-05-01", "cough"])).unwrap();
        assert_eq!(record.soap.subjective, "cough");
        assert_eq!(record.soap.plan, "");
        assert!(record.images.is_empty());
        assert_eq!(record.doctor, None);
    }

    #[test]
    fn test_rejections() {
        assert_eq!(
            animal_from_row(&strings(&["", "F", "Name"])),
            Err(RowRejection::MissingMicrochip)
        );
        assert!(matches!(
            animal_from_row(&strings(&["9", "F", " "])),
            Err(RowRejection::MissingName { .. })
        ));
        assert_eq!(record_from_row(&strings(&["", "r1"])), Err(RowRejection::MissingAnimalId));
        assert!(matches!(
            record_from_row(&strings(&["9"])),
            Err(RowRejection::MissingRecordId { .. })
        ));
    }

    #[test]
    fn test_record_lists_are_comma_joined() {
        let mut record = Record::new("9", SoapNote::default());
        record.images = strings(&["/uploads/a.jpg", "/uploads/b.jpg"]);
        record.medication_history = strings(&["penicillin", "meloxicam"]);
        let row = record_to_row(&record);
        assert_eq!(row.len(), RECORD_COLUMNS as usize);
        assert_eq!(row[7], "penicillin,meloxicam");
        assert_eq!(row[10], "/uploads/a.jpg,/uploads/b.jpg");
    }

    fn cell_text() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9][a-zA-Z0-9 .:-]{0,20}[a-zA-Z0-9]"
    }

    /// Free text with surrounding blanks and embedded line breaks
    fn free_text() -> impl Strategy<Value = String> {
        "[ \n]{0,2}[a-zA-Z0-9][a-zA-Z0-9 .:\n-]{0,20}[ \n]{0,2}"
    }

    #[test]
    fn test_free_text_keeps_surrounding_whitespace() {
        let mut record = Record::new(
            "9",
            SoapNote::new("  indented history\n", "T 39.5\n", "", "- rest\n- recheck\n"),
        );
        record.doctor = Some(" Dr. Sato ".to_string());
        record.audio_url = Some("/uploads/visit.webm\n".to_string());

        let decoded = record_from_row(&record_to_row(&record)).unwrap();
        assert_eq!(decoded.soap, record.soap);
        assert_eq!(decoded.doctor, record.doctor);
        assert_eq!(decoded.audio_url, record.audio_url);

        let padded = record_from_row(&strings(&[" 9 ", " r1\n", "2024-05-01"])).unwrap();
        assert_eq!(padded.animal_id, "9");
        assert_eq!(padded.id, "r1");

        let mut animal = Animal::new("1", " Hanako ");
        animal.sex = Some("F\n".to_string());
        assert_eq!(animal_from_row(&animal_to_row(&animal)).unwrap(), animal);
    }

    proptest! {
        #[test]
        fn prop_record_row_round_trip(
            animal_id in cell_text(),
            id in "[a-f0-9]{32}",
            visit_date in "20[0-9]{2}-[01][0-9]-[0-3][0-9]",
            soap in proptest::array::uniform4(proptest::option::of(free_text())),
            meds in proptest::collection::vec(cell_text(), 0..4),
            images in proptest::collection::vec(cell_text(), 0..4),
            doctor in proptest::option::of(free_text()),
            audio in proptest::option::of(free_text()),
            next_visit in proptest::option::of(("20[0-9]{2}-[01][0-9]-[0-3][0-9]", "[0-2][0-9]:[0-5][0-9]")),
        ) {
            let [s, o, a, p] = soap;
            let mut record = Record::new(animal_id, SoapNote::new(
                s.unwrap_or_default(), o.unwrap_or_default(), a.unwrap_or_default(), p.unwrap_or_default(),
            ));
            record.id = id;
            record.visit_date = visit_date;
            record.medication_history = meds;
            record.images = images;
            record.doctor = doctor;
            record.audio_url = audio;
            if let Some((date, time)) = next_visit {
                record.next_visit_date = Some(date);
                record.next_visit_time = Some(time);
            }

            let decoded = record_from_row(&record_to_row(&record)).unwrap();
            prop_assert_eq!(&decoded.id, &record.id);
            prop_assert_eq!(&decoded.animal_id, &record.animal_id);
            prop_assert_eq!(&decoded.soap, &record.soap);
            prop_assert_eq!(&decoded.visit_date, &record.visit_date);
            prop_assert_eq!(&decoded.medication_history, &record.medication_history);
            prop_assert_eq!(&decoded.images, &record.images);
            prop_assert_eq!(&decoded.doctor, &record.doctor);
            prop_assert_eq!(&decoded.audio_url, &record.audio_url);
            prop_assert_eq!(&decoded.next_visit_date, &record.next_visit_date);
            prop_assert_eq!(&decoded.next_visit_time, &record.next_visit_time);
        }
    }
}
