use std::process::ExitCode;

fn main() -> ExitCode {
    chatter_cli::run()
}
