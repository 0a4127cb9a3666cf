use anyhow::Result;
use hipchat_notify::cli::CliApp;

fn main() -> Result<()> {
    CliApp::run()
}
