//! `macbundle stub` command

use anyhow::Result;

use crate::cli::StubArgs;
use macbundle::ops::stub::{ensure_stub, StubOptions};
use macbundle::util::GlobalContext;

pub fn execute(args: StubArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;

    let opts = StubOptions {
        all: args.all,
        variant: args.variant,
    };
    let report = ensure_stub(&ctx, &opts)?;

    for name in &report.rebuilt {
        eprintln!("   Compiling stub {}", name);
    }
    if report.rebuilt.is_empty() {
        eprintln!("       Fresh {} stub(s)", report.fresh.len());
    }

    println!("{}", report.path.display());
    Ok(())
}
