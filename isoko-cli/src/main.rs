use anyhow::Result;

fn main() -> Result<()> {
    isoko_cli::run_app()
}
