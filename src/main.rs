use mxsift::cli::run;
use mxsift::pipeline::PipelineError;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    // Windows consoles need ANSI processing switched on; elsewhere this is a no-op
    let _ = enable_ansi_support::enable_ansi_support();

    if let Err(e) = run() {
        let user_facing = e
            .downcast_ref::<PipelineError>()
            .map(PipelineError::is_user_error)
            .unwrap_or(false);

        if user_facing {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }

        eprintln!("Internal error: {}", e);
        // Show error chain if available
        let mut source = e.source();
        if source.is_some() {
            eprintln!("\nCaused by:");
            let mut indent = 1;
            while let Some(err) = source {
                eprintln!("{:indent$}  {}", "", err);
                source = err.source();
                indent += 1;
            }
        }
        std::process::exit(2);
    }
}
