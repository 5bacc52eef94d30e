//! `macbundle verify` command

use std::time::Duration;

use anyhow::Result;

use crate::cli::VerifyArgs;
use macbundle::harness::{StderrPolicy, DEFAULT_TIMEOUT};
use macbundle::ops::verify::{format_result, format_result_json, verify_app, VerifyOptions};
use macbundle::util::GlobalContext;

pub fn execute(args: VerifyArgs, verbose: bool) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let config = ctx.load_config();

    // CLI > config > default
    let timeout = args
        .timeout
        .or(config.harness.timeout_secs)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TIMEOUT);

    let stderr = match args.stderr.as_ref().or(config.harness.stderr.as_ref()) {
        Some(policy) => policy
            .parse::<StderrPolicy>()
            .map_err(|e| anyhow::anyhow!("{}", e))?,
        None => StderrPolicy::Discard,
    };

    let options = VerifyOptions {
        app: ctx.resolve(&args.app),
        present: args.present,
        missing: args.missing,
        timeout,
        stderr,
    };

    let result = verify_app(&options)?;

    if args.json {
        println!("{}", format_result_json(&result));
    } else {
        print!("{}", format_result(&result, verbose));
    }

    // Exit with error code if verification failed
    if !result.passed {
        std::process::exit(1);
    }

    Ok(())
}
