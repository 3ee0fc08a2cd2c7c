use std::fs;
use std::path::PathBuf;

use clap::Args;
use clap_complete::{Shell, generate_to};

/// Shells generated when `--shell` is not given.
const DEFAULT_SHELLS: [Shell; 5] = [
    Shell::Bash,
    Shell::Zsh,
    Shell::Fish,
    Shell::PowerShell,
    Shell::Elvish,
];

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Output directory, relative to the workspace root
    #[arg(long = "out-dir", default_value = "dist/share/completions")]
    pub out_dir: PathBuf,

    /// Generate for one shell only
    #[arg(long, value_enum)]
    pub shell: Option<Shell>,
}

pub fn cmd_completions(args: CompletionsArgs) -> Result<(), String> {
    let out_dir = crate::workspace_root().join(&args.out_dir);
    fs::create_dir_all(&out_dir).map_err(|e| format!("{}: {e}", out_dir.display()))?;

    let mut cli = stackctl::command();
    let bin_name = cli.get_name().to_string();
    let shells = args.shell.map_or_else(|| DEFAULT_SHELLS.to_vec(), |shell| vec![shell]);

    for shell in shells {
        let written = generate_to(shell, &mut cli, &bin_name, &out_dir)
            .map_err(|e| format!("{shell} completions for {bin_name}: {e}"))?;
        println!("wrote {}", written.display());
    }
    Ok(())
}
