use pathparity_cli::{cli, logging};
use pathparity_report::AnalysisInputError;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli::command().get_matches();

    let (verbosity, format) = cli::log_options(&matches);
    if let Err(e) = logging::init(verbosity, format) {
        eprintln!("warning: {e:#}");
    }

    match cli::execute(&matches).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            if let Some(hint) = e
                .downcast_ref::<AnalysisInputError>()
                .and_then(AnalysisInputError::hint)
            {
                eprintln!("hint: run `{hint}` first");
            }
            ExitCode::FAILURE
        }
    }
}
