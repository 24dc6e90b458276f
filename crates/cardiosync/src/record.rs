//! Core record types for cardiosync.
//!
//! A [`Record`] is one patient observation as collected by the form. It is
//! created once at submission time and never changed afterwards.

use serde::{Deserialize, Serialize};

/// Patient gender as offered by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    /// Male.
    Masculino,
    /// Female.
    Femenino,
    /// Any other answer.
    Otro,
}

impl Gender {
    /// The value written to the dataset.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Masculino => "Masculino",
            Self::Femenino => "Femenino",
            Self::Otro => "Otro",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One acute cardiac-failure observation.
///
/// Fields are listed in dataset column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Patient name.
    pub nombre: String,
    /// Age in years.
    pub edad: u32,
    /// Gender.
    pub genero: Gender,
    /// Blood pressure as entered, e.g. `120/80`.
    pub presion_arterial: String,
    /// Heart rate (beats per minute).
    pub frecuencia_cardiaca: u32,
    /// Respiratory rate (breaths per minute).
    pub frecuencia_respiratoria: u32,
    /// Oxygen saturation (percent).
    pub saturacion_oxigeno: u32,
    /// NT-proBNP level.
    pub nt_pro_bnp: u32,
    /// Creatinine (mg/dL).
    pub creatinina: f64,
    /// Free-form comments.
    pub comentarios: String,
}

impl Record {
    /// Create a record with the given patient name, age and gender.
    ///
    /// Measurements start at zero and comments empty; set the public fields
    /// to fill them in.
    #[must_use]
    pub fn new(nombre: impl Into<String>, edad: u32, genero: Gender) -> Self {
        Self {
            nombre: nombre.into(),
            edad,
            genero,
            presion_arterial: String::new(),
            frecuencia_cardiaca: 0,
            frecuencia_respiratoria: 0,
            saturacion_oxigeno: 0,
            nt_pro_bnp: 0,
            creatinina: 0.0,
            comentarios: String::new(),
        }
    }
}
