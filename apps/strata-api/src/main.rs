use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = strata_api::Args::parse();

	strata_api::run(args).await
}
