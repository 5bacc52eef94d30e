//! `macbundle convert` command

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::ConvertArgs;
use macbundle::builder::converters::{ConverterRegistry, ToolPaths};
use macbundle::ops::convert::{convert_resources, plan_conversions};
use macbundle::util::{GlobalContext, SystemRunner};

pub fn execute(args: ConvertArgs, verbose: bool) -> Result<()> {
    let start = Instant::now();
    let ctx = GlobalContext::new()?;
    let config = ctx.load_config();

    let tools = ToolPaths::from_settings(&config.tools);
    let registry = ConverterRegistry::with_defaults(&tools, Arc::new(SystemRunner));

    let dest = ctx.resolve(&args.dest);
    let plan = plan_conversions(&registry, &args.inputs, ctx.cwd(), &dest)?;

    // Progress bar only for multi-file runs, and never in dry-run or verbose mode
    let total = plan.len();
    let pb = if !verbose && !args.dry_run && total > 1 {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let converted = convert_resources(&registry, &plan, args.dry_run, |resource| {
        if let Some(pb) = &pb {
            pb.set_message(resource.output.display().to_string());
            pb.inc(1);
        }
    })?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if args.dry_run {
        for resource in &converted {
            println!("{} -> {}", resource.source.display(), resource.output.display());
        }
        eprintln!("Would convert {} resource(s)", converted.len());
    } else {
        eprintln!(
            "    Finished converting {} resource(s) in {:.2}s",
            converted.len(),
            start.elapsed().as_secs_f64()
        );
    }

    Ok(())
}
