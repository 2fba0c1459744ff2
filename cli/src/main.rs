use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use lspcap_cli::app;
use lspcap_cli::commands::cli;
use lspcap_core::api::ChildCommand;

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("lspcap: {e:#}");
            // 1: setup failed before the child ran (log dir, log files, logging)
            1
        }
    };

    // Parent stdin is read on a blocking thread that cannot be cancelled, so
    // leave without waiting for the runtime to shut down.
    std::process::exit(exit);
}

async fn real_main() -> anyhow::Result<i32> {
    let args = match cli::Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            return Ok(1);
        }
    };

    let Some((program, rest)) = args.child() else {
        eprintln!("{}", cli::USAGE);
        return Ok(1);
    };
    let cmd = ChildCommand::new(program, rest.to_vec());
    let cfg = app::build_config(&args);

    app::run_app(cfg, cmd)
        .await
        .context("capture setup failed")
}
