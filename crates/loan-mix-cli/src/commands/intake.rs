use clap::{Args, ValueEnum};
use serde_json::Value;

use loan_mix_core::intake::extraction::{self, ExtractionDocument};
use loan_mix_core::intake::form::{self, FormSubmission};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum IntakeSource {
    /// `{ target, loans: [...], errors: [...] }` from the text extractor
    Extraction,
    /// `{ target, rows: [...] }` with every field as typed
    Form,
}

/// Arguments for input coercion
#[derive(Args)]
pub struct IntakeArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Shape of the input document
    #[arg(long, value_enum, default_value = "extraction")]
    pub source: IntakeSource,
}

pub fn run_intake(args: IntakeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data: Value = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file> or stdin required for intake".into());
    };

    let result = match args.source {
        IntakeSource::Extraction => {
            let doc: ExtractionDocument = serde_json::from_value(data)?;
            serde_json::to_value(extraction::intake_extraction(&doc)?)?
        }
        IntakeSource::Form => {
            let submission: FormSubmission = serde_json::from_value(data)?;
            serde_json::to_value(form::intake_form(&submission)?)?
        }
    };
    Ok(result)
}
