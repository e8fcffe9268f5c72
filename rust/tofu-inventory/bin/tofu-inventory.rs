/// Ansible dynamic inventory script for the homelab environment. Copy or symlink the build
/// output to `ansible/inventory/tofu-inventory` so that the tofu environment resolves to
/// `tofu/environments/homelab` in the same repository, then point Ansible at it with
/// `ansible-playbook -i ansible/inventory/tofu-inventory ...`. The repository is found from the
/// path the program was invoked by, so a symlink is not followed back to the build output.
///
/// This is the only place that writes to the standard streams or picks an exit code.
use anyhow::Context;
use dotenv::dotenv;
use std::io::Write;
use std::process::ExitCode;
use tofu_inventory::{run, Cli, Outcome, StateLocation, TofuCli, USAGE};

fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();

    let cli = match Cli::parse_protocol(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => {
            // --help and --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprint!("{}", e);
            return ExitCode::from(1);
        }
    };

    match run(&cli, &TofuCli::default(), StateLocation::from_invocation) {
        Ok(Outcome::Emit(json)) => match emit(&json) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                ExitCode::from(1)
            }
        },
        Ok(Outcome::Usage) => {
            eprintln!("{}", USAGE);
            ExitCode::from(1)
        }
        Err(e) => {
            log::debug!("inventory failed: {:?}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn emit(json: &str) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", json).context("failed to write inventory to stdout")?;
    stdout.flush().context("failed to flush stdout")?;
    Ok(())
}
