use std::process::ExitCode;

fn main() -> ExitCode {
    match labsheet_lib::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Application error");
            ExitCode::FAILURE
        }
    }
}
