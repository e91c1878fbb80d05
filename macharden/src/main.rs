fn main() -> anyhow::Result<()> {
    macharden::run_cli()
}
