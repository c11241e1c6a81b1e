//! `stratus validate` command

use anyhow::Result;

use crate::cli::ValidateArgs;
use stratus::ops::{format_validation, validate, ValidateOptions};

pub fn execute(args: ValidateArgs) -> Result<()> {
    let output = validate(ValidateOptions {
        manifest_path: args.manifest,
        environment: args.environment,
        full: args.full,
    })?;

    print!("{}", format_validation(&output));

    if !output.response.success {
        std::process::exit(1);
    }

    Ok(())
}
