fn main() {
    match tm_provider::run() {
        Ok(produced) => {
            tracing::info!(produced, "Done");
        }
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            eprintln!("{}: {e}", tm_provider::config::APP_NAME);
            std::process::exit(1);
        }
    }
}
