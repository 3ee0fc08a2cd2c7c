use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

#[derive(Args, Debug)]
pub struct ManArgs {
    /// Output directory, relative to the workspace root
    #[arg(long = "out-dir", default_value = "dist/share/man/man1")]
    pub out_dir: PathBuf,
}

/// Render one page and write it as `<out_dir>/<page>.1`.
fn write_page(cmd: clap::Command, out_dir: &Path, page: &str) -> Result<(), String> {
    let mut roff = Vec::new();
    clap_mangen::Man::new(cmd)
        .render(&mut roff)
        .map_err(|e| format!("render {page}.1: {e}"))?;
    let path = out_dir.join(format!("{page}.1"));
    fs::write(&path, roff).map_err(|e| format!("{}: {e}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}

pub fn cmd_man(args: ManArgs) -> Result<(), String> {
    let out_dir = crate::workspace_root().join(&args.out_dir);
    fs::create_dir_all(&out_dir).map_err(|e| format!("{}: {e}", out_dir.display()))?;

    let cli = stackctl::command();
    let bin_name = cli.get_name().to_string();
    write_page(cli.clone(), &out_dir, &bin_name)?;

    // stackctl-compose.1, stackctl-run.1, ...
    for sub in cli.get_subcommands() {
        write_page(sub.clone(), &out_dir, &format!("{bin_name}-{}", sub.get_name()))?;
    }
    Ok(())
}
