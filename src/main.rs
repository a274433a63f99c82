use anyhow::Result;
use clap::{ArgGroup, Parser};
use mspzap::{actions, config, Action, WindowsInstallerQuery};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Zap redundant .msp files in the Windows Installer directory",
    long_about = None,
    group(ArgGroup::new("action").required(true).multiple(false))
)]
struct Args {
    /// Count the redundant files and their total size
    #[arg(long, group = "action")]
    check: bool,

    /// List the redundant files and their sizes
    #[arg(long, group = "action")]
    list: bool,

    /// Zap the files
    #[arg(long, group = "action")]
    zap: bool,

    /// Move the files to the specified directory
    #[arg(long = "move", value_name = "PATH", group = "action")]
    move_to: Option<PathBuf>,
}

impl Args {
    fn action(&self) -> Action {
        if self.check {
            Action::Check { list_files: false }
        } else if self.list {
            Action::Check { list_files: true }
        } else if self.zap {
            Action::Zap
        } else if let Some(path) = &self.move_to {
            Action::MoveTo(path.clone())
        } else {
            unreachable!("the argument group requires exactly one action")
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let action = args.action();

    // An invalid --move destination must terminate before the cache
    // directory is resolved or the installer query runs.
    action.validate()?;

    let cache_dir = config::installer_cache_dir()?;
    actions::run(&action, &cache_dir, &WindowsInstallerQuery)?;
    Ok(())
}
