//! `stratus plan` command

use anyhow::Result;

use crate::cli::PlanArgs;
use stratus::ops::{format_plan, plan, PlanOptions};

pub fn execute(args: PlanArgs) -> Result<()> {
    let output = plan(PlanOptions {
        manifest_path: args.manifest,
        environment: args.environment,
        config_service: args.config_service,
        keep_going: args.keep_going,
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output.result)?);
    } else {
        print!("{}", format_plan(&output));
    }

    Ok(())
}
