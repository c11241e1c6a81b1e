//! `stratus matrix` command

use anyhow::Result;

use crate::cli::MatrixArgs;
use stratus::ops::matrix_report;

pub fn execute(args: MatrixArgs) -> Result<()> {
    let report = matrix_report(args.source.as_deref());

    if args.json {
        println!("{}", report.format_json()?);
    } else {
        print!("{}", report.format_text());
    }

    Ok(())
}
