//! Prescription lines and the set they accumulate in.
//!
//! A [`PrescriptionLine`] is built from a [`LineDraft`] (the raw text a user typed) and is
//! immutable from then on. Its bottle count is derived once, at construction:
//!
//! ```text
//! bottles = ceil(dose_ml * times_per_day * duration_days / presentation_ml)
//! duration_days = magnitude * (months ? 30 : 1)
//! ```
//!
//! # Numeric input policy
//!
//! Dose, frequency and duration are typed as free text and coerced by
//! [`parse_positive_count`]: surrounding whitespace and a leading `+` are ignored, the
//! leading run of ASCII digits is kept and everything after it is dropped. So `"2.9"`
//! reads as 2 and `"3 ml"` as 3. Text without leading digits, zero, negatives and values
//! beyond `u32::MAX` count as missing and reject the line.

use crate::constants::{DAYS_PER_MONTH, DEFAULT_PRESENTATION_ML};
use crate::error::{PrescriptionError, PrescriptionResult};
use receta_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Bottle sizes a product can be dispensed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PresentationVolume {
    #[default]
    Ml120,
    Ml240,
}

impl PresentationVolume {
    pub const ALL: [PresentationVolume; 2] = [PresentationVolume::Ml120, PresentationVolume::Ml240];

    /// Millilitres per bottle.
    pub fn ml(self) -> u32 {
        match self {
            PresentationVolume::Ml120 => DEFAULT_PRESENTATION_ML,
            PresentationVolume::Ml240 => 240,
        }
    }
}

impl TryFrom<u32> for PresentationVolume {
    type Error = PrescriptionError;

    fn try_from(ml: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|p| p.ml() == ml)
            .ok_or_else(|| {
                PrescriptionError::InvalidInput(format!(
                    "presentation must be 120 or 240 ml, got {}",
                    ml
                ))
            })
    }
}

impl From<PresentationVolume> for u32 {
    fn from(value: PresentationVolume) -> Self {
        value.ml()
    }
}

impl FromStr for PresentationVolume {
    type Err = PrescriptionError;

    /// Accepts `"240"`, `"240ml"` and `"240 ml"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let number = trimmed
            .strip_suffix("ml")
            .or_else(|| trimmed.strip_suffix("ML"))
            .unwrap_or(trimmed)
            .trim();
        let ml = number.parse::<u32>().map_err(|_| {
            PrescriptionError::InvalidInput(format!("invalid presentation: {:?}", s))
        })?;
        Self::try_from(ml)
    }
}

impl std::fmt::Display for PresentationVolume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ml", self.ml())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    #[default]
    Days,
    Months,
}

impl DurationUnit {
    pub fn days_per_unit(self) -> u64 {
        match self {
            DurationUnit::Days => 1,
            DurationUnit::Months => DAYS_PER_MONTH,
        }
    }
}

impl FromStr for DurationUnit {
    type Err = PrescriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "d" | "day" | "days" | "dia" | "dias" | "día" | "días" => Ok(DurationUnit::Days),
            "m" | "month" | "months" | "mes" | "meses" => Ok(DurationUnit::Months),
            other => Err(PrescriptionError::InvalidInput(format!(
                "unknown duration unit: {:?}",
                other
            ))),
        }
    }
}

/// Treatment length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Duration {
    magnitude: u32,
    unit: DurationUnit,
}

impl Duration {
    /// Returns `None` for a zero magnitude.
    pub fn new(magnitude: u32, unit: DurationUnit) -> Option<Self> {
        (magnitude > 0).then_some(Self { magnitude, unit })
    }

    pub fn magnitude(&self) -> u32 {
        self.magnitude
    }

    pub fn unit(&self) -> DurationUnit {
        self.unit
    }

    pub fn in_days(&self) -> u64 {
        u64::from(self.magnitude) * self.unit.days_per_unit()
    }
}

/// Why a draft could not become a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LineRejection {
    #[error("no product selected")]
    MissingProduct,
    #[error("dose is missing or not a positive whole number")]
    MissingDose,
    #[error("times per day is missing or not a positive whole number")]
    MissingFrequency,
    #[error("duration is missing or not a positive whole number")]
    MissingDuration,
    #[error("prescribed volume is too large to compute")]
    QuantityOverflow,
}

/// Staging area for the next line, holding inputs as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineDraft {
    pub product: Option<NonEmptyText>,
    pub presentation: PresentationVolume,
    pub dose: String,
    pub times_per_day: String,
    pub duration: String,
    pub duration_unit: DurationUnit,
    pub notes: String,
}

/// Draft inputs that can be set from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Presentation,
    Dose,
    TimesPerDay,
    Duration,
    DurationUnit,
    Notes,
}

impl FromStr for DraftField {
    type Err = PrescriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "presentation" => DraftField::Presentation,
            "dose" => DraftField::Dose,
            "times" | "timesperday" => DraftField::TimesPerDay,
            "duration" => DraftField::Duration,
            "unit" | "durationunit" | "durationtype" => DraftField::DurationUnit,
            "notes" | "observations" => DraftField::Notes,
            _ => {
                return Err(PrescriptionError::InvalidInput(format!(
                    "unknown draft field: {:?}",
                    s
                )))
            }
        };
        Ok(field)
    }
}

impl LineDraft {
    /// Puts every field back to the state of a fresh form.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Stores raw text for one field.
    ///
    /// Counts are kept verbatim and only interpreted when the line is built. The two
    /// enumerated fields are checked here, since a form would only offer valid choices.
    ///
    /// # Errors
    ///
    /// Returns `PrescriptionError::InvalidInput` for a presentation outside {120, 240} or
    /// an unknown duration unit; the draft is unchanged.
    pub fn set_field(&mut self, field: DraftField, value: &str) -> PrescriptionResult<()> {
        match field {
            DraftField::Presentation => self.presentation = value.parse()?,
            DraftField::Dose => self.dose = value.to_string(),
            DraftField::TimesPerDay => self.times_per_day = value.to_string(),
            DraftField::Duration => self.duration = value.to_string(),
            DraftField::DurationUnit => self.duration_unit = value.parse()?,
            DraftField::Notes => self.notes = value.to_string(),
        }
        Ok(())
    }
}

/// One confirmed product-dosage entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrescriptionLine {
    product: NonEmptyText,
    presentation: PresentationVolume,
    dose_ml: u32,
    times_per_day: u32,
    duration: Duration,
    bottles_required: u64,
    notes: Option<NonEmptyText>,
}

impl PrescriptionLine {
    /// Builds a line from typed values, deriving the bottle count.
    ///
    /// # Errors
    ///
    /// Returns a [`LineRejection`] when a count is zero or the total volume overflows.
    pub fn new(
        product: NonEmptyText,
        presentation: PresentationVolume,
        dose_ml: u32,
        times_per_day: u32,
        duration: Duration,
        notes: Option<NonEmptyText>,
    ) -> Result<Self, LineRejection> {
        if dose_ml == 0 {
            return Err(LineRejection::MissingDose);
        }
        if times_per_day == 0 {
            return Err(LineRejection::MissingFrequency);
        }

        let bottles_required = bottles_required(presentation, dose_ml, times_per_day, duration)
            .ok_or(LineRejection::QuantityOverflow)?;

        Ok(Self {
            product,
            presentation,
            dose_ml,
            times_per_day,
            duration,
            bottles_required,
            notes,
        })
    }

    /// Validates and converts a draft. Checks run product, dose, frequency, duration.
    pub fn from_draft(draft: &LineDraft) -> Result<Self, LineRejection> {
        let product = draft.product.clone().ok_or(LineRejection::MissingProduct)?;
        let dose_ml = parse_positive_count(&draft.dose).ok_or(LineRejection::MissingDose)?;
        let times_per_day =
            parse_positive_count(&draft.times_per_day).ok_or(LineRejection::MissingFrequency)?;
        let duration = parse_positive_count(&draft.duration)
            .and_then(|magnitude| Duration::new(magnitude, draft.duration_unit))
            .ok_or(LineRejection::MissingDuration)?;

        Self::new(
            product,
            draft.presentation,
            dose_ml,
            times_per_day,
            duration,
            NonEmptyText::optional(&draft.notes),
        )
    }

    pub fn product(&self) -> &NonEmptyText {
        &self.product
    }

    pub fn presentation(&self) -> PresentationVolume {
        self.presentation
    }

    pub fn dose_ml(&self) -> u32 {
        self.dose_ml
    }

    pub fn times_per_day(&self) -> u32 {
        self.times_per_day
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn bottles_required(&self) -> u64 {
        self.bottles_required
    }

    pub fn notes(&self) -> Option<&NonEmptyText> {
        self.notes.as_ref()
    }

    /// Total millilitres over the whole treatment.
    pub fn total_ml(&self) -> u64 {
        // Cannot overflow: construction already computed it with checked arithmetic.
        u64::from(self.dose_ml) * u64::from(self.times_per_day) * self.duration.in_days()
    }
}

/// Number of bottles covering the whole treatment, or `None` on overflow.
pub fn bottles_required(
    presentation: PresentationVolume,
    dose_ml: u32,
    times_per_day: u32,
    duration: Duration,
) -> Option<u64> {
    let total_ml = u64::from(dose_ml)
        .checked_mul(u64::from(times_per_day))?
        .checked_mul(duration.in_days())?;
    Some(total_ml.div_ceil(u64::from(presentation.ml())))
}

/// Reads a positive whole number from form text. See the module docs for the policy.
pub fn parse_positive_count(input: &str) -> Option<u32> {
    let trimmed = input.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let digits = &unsigned[..digits_end];

    if digits.is_empty() {
        return None;
    }

    digits.parse::<u32>().ok().filter(|n| *n > 0)
}

/// Ordered lines of one prescription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PrescriptionSet {
    lines: Vec<PrescriptionLine>,
}

impl PrescriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `line` and returns it in place.
    pub fn push(&mut self, line: PrescriptionLine) -> &PrescriptionLine {
        let index = self.lines.len();
        self.lines.push(line);
        &self.lines[index]
    }

    /// Removes the line at zero-based `index`, shifting later lines down by one.
    ///
    /// # Errors
    ///
    /// Returns `PrescriptionError::IndexOutOfRange` and leaves the set unchanged when
    /// `index >= len`.
    pub fn remove(&mut self, index: usize) -> PrescriptionResult<PrescriptionLine> {
        if index >= self.lines.len() {
            return Err(PrescriptionError::IndexOutOfRange {
                index,
                len: self.lines.len(),
            });
        }
        Ok(self.lines.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&PrescriptionLine> {
        self.lines.get(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PrescriptionLine> {
        self.lines.iter()
    }

    pub fn as_slice(&self) -> &[PrescriptionLine] {
        &self.lines
    }
}

impl<'a> IntoIterator for &'a PrescriptionSet {
    type Item = &'a PrescriptionLine;
    type IntoIter = std::slice::Iter<'a, PrescriptionLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
