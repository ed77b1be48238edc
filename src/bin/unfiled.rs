use std::process;

#[tokio::main]
async fn main() {
    env_logger::init();

    #[cfg(feature = "cli")]
    {
        let config = match unfiled_dl::AppConfig::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                process::exit(1);
            }
        };

        if let Err(e) = unfiled_dl::cli::run(config).await {
            match &e {
                unfiled_dl::Error::PermissionDenied { .. } => eprintln!("{e}"),
                _ => eprintln!("Error: {e}"),
            }
            process::exit(1);
        }
    }

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("CLI support not compiled in");
        process::exit(1);
    }
}
