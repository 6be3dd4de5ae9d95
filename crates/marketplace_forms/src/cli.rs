// src/cli.rs
use std::path::PathBuf;

use clap::Parser;

use crate::forms::FormKind;

#[derive(Parser, Debug)]
#[command(
    name = "marketplace-forms",
    version,
    about = "Drive a marketplace form wizard from a JSON answers file"
)]
pub struct Cli {
    /// Which form to fill in
    #[arg(long, value_enum, default_value_t = FormKind::Vendor)]
    pub form: FormKind,

    /// JSON object of field answers; the built-in sample answers when omitted
    #[arg(long, value_name = "PATH")]
    pub answers: Option<PathBuf>,

    /// Override the simulated backend latency
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Make the simulated backend reject the submission with this message
    #[arg(long, value_name = "MESSAGE")]
    pub fail: Option<String>,

    /// Print the steps and fields of the form and exit
    #[arg(long)]
    pub list_fields: bool,
}
