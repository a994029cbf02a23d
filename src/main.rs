use std::process::ExitCode;

fn main() -> ExitCode {
    match scicat_ingest::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
