//! Instruction templates sent to the generation model

/// Asks for exactly one JSON object with the keys `s`, `o`, `a`, `p`
pub fn soap_prompt(clinical_text: &str) -> String {
    format!(
        r#"You are an experienced large-animal veterinarian.
Write a clinical note in SOAP format based on the visit information below.

S (Subjective): the owner's complaint and history taken at the visit.
O (Objective): findings from inspection, palpation, auscultation and tests.
A (Assessment): the diagnosis or problems derived from S and O.
P (Plan): treatment, prescriptions and instructions for the next visit.

Write the note in the same language as the visit information.

--- Visit information ---
{clinical_text}
---

Respond with a single JSON object with exactly these keys and nothing else:
{{
    "s": "subjective information",
    "o": "objective information",
    "a": "assessment",
    "p": "plan"
}}
"#
    )
}

pub fn translation_prompt(text: &str, target_lang: &str) -> String {
    format!(
        "Translate the following text into the language with code '{target_lang}'. \
Keep veterinary terminology precise and return only the translated text, \
without quotes or commentary.\n\n{text}"
    )
}
