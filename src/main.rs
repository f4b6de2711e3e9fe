use std::process::ExitCode;

use colored::Colorize;
use mqtt_modelgen::cli::CommandLineInterface;

fn main() -> ExitCode {
    let command_line_interface = CommandLineInterface::load();
    match command_line_interface.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
