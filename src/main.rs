//! image-relocator command line entry point

use image_relocator::cli::{Args, Runner};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse_args();
    let runner = Runner::new(args);
    runner.logger().install();

    match runner.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            runner.logger().error(&e.to_string());
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}
