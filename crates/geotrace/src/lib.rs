#![forbid(unsafe_code)]

use crate::config::GeotraceAction;
use clap::Parser;
use config::Args;

mod app;
mod config;
mod print;
mod report;

/// Run the geotrace application.
pub fn geotrace() -> anyhow::Result<()> {
    let args = Args::parse();
    match GeotraceAction::from(args)? {
        GeotraceAction::Run(cfg) => app::run_geotrace(&cfg)?,
        GeotraceAction::PrintConfigTemplate => print::print_config_template(),
        GeotraceAction::PrintManPage => print::print_man_page()?,
        GeotraceAction::PrintShellCompletions(shell) => print::print_shell_completions(shell)?,
    }
    Ok(())
}
