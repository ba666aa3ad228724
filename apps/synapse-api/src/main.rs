use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = synapse_api::Args::parse();

	synapse_api::run(args).await
}
