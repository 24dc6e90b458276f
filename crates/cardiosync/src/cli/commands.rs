//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::record::{Gender, Record};

/// Submit one observation.
#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// Operator name for verification (defaults to `auth.operator`)
    #[arg(long)]
    pub operator: Option<String>,

    /// Output the report as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Patient name
    #[arg(long)]
    pub nombre: String,

    /// Age in years
    #[arg(long)]
    pub edad: u32,

    /// Gender
    #[arg(long, value_enum)]
    pub genero: GenderArg,

    /// Blood pressure, e.g. 120/80
    #[arg(long, default_value = "")]
    pub presion_arterial: String,

    /// Heart rate (bpm)
    #[arg(long, default_value_t = 0)]
    pub frecuencia_cardiaca: u32,

    /// Respiratory rate (rpm)
    #[arg(long, default_value_t = 0)]
    pub frecuencia_respiratoria: u32,

    /// Oxygen saturation (%)
    #[arg(long, default_value_t = 0)]
    pub saturacion_oxigeno: u32,

    /// NT-proBNP
    #[arg(long = "nt-pro-bnp", default_value_t = 0)]
    pub nt_pro_bnp: u32,

    /// Creatinine (mg/dL)
    #[arg(long, default_value_t = 0.0)]
    pub creatinina: f64,

    /// Additional comments
    #[arg(long, default_value = "")]
    pub comentarios: String,
}

impl SubmitCommand {
    /// The record described by the arguments.
    #[must_use]
    pub fn to_record(&self) -> Record {
        Record {
            nombre: self.nombre.clone(),
            edad: self.edad,
            genero: self.genero.into(),
            presion_arterial: self.presion_arterial.clone(),
            frecuencia_cardiaca: self.frecuencia_cardiaca,
            frecuencia_respiratoria: self.frecuencia_respiratoria,
            saturacion_oxigeno: self.saturacion_oxigeno,
            nt_pro_bnp: self.nt_pro_bnp,
            creatinina: self.creatinina,
            comentarios: self.comentarios.clone(),
        }
    }
}

/// Gender argument for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GenderArg {
    /// Male
    Masculino,
    /// Female
    Femenino,
    /// Other
    Otro,
}

impl From<GenderArg> for Gender {
    fn from(arg: GenderArg) -> Self {
        match arg {
            GenderArg::Masculino => Gender::Masculino,
            GenderArg::Femenino => Gender::Femenino,
            GenderArg::Otro => Gender::Otro,
        }
    }
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Print the raw CSV instead of a table
    #[arg(long)]
    pub csv: bool,
}

/// Remote command arguments.
#[derive(Debug, Args)]
pub struct RemoteCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration file
    Validate {
        /// Path to config file to validate
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}
