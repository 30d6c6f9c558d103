//! Main application entry point (native).

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
fn main() {
    use olamboard_app::cli::{self, Command, USAGE};
    use olamboard_app::ShortcutRegistry;
    use olamboard_core::storage::FileStorage;

    env_logger::init();

    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}\n\n{USAGE}");
            std::process::exit(2);
        }
    };
    log::debug!("running {command:?}");

    let result = match command {
        Command::Inspect { code, legacy } => read_context(legacy.as_deref())
            .and_then(|ctx| cli::inspect(&code, &ctx))
            .map(Some),
        Command::Reencode { code, legacy } => read_context(legacy.as_deref())
            .and_then(|ctx| cli::reencode(&code, &ctx))
            .map(Some),
        Command::Stored { query } => FileStorage::default_location()
            .map_err(Into::into)
            .and_then(|store| cli::stored(&store, &query)),
        Command::Keys => Ok(Some(ShortcutRegistry::render())),
        Command::Help => Ok(Some(USAGE.to_string())),
    };

    match result {
        Ok(Some(output)) => println!("{output}"),
        Ok(None) => {
            eprintln!("nothing stored");
            std::process::exit(1);
        }
        Err(err) => {
            log::error!("{err}");
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
fn read_context(
    path: Option<&str>,
) -> Result<olamboard_core::DecodeContext, olamboard_app::session::SessionError> {
    let json = match path {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .map_err(|e| olamboard_core::StorageError::Io(format!("{path}: {e}")))?,
        ),
        None => None,
    };
    olamboard_app::cli::context_for(json.as_deref())
}

#[cfg(not(all(feature = "native", not(target_arch = "wasm32"))))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
