use std::process::ExitCode;

fn main() -> ExitCode {
    loja_cli::run()
}
