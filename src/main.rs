use clap::Parser;
use imembed::Opts;
use imembed::cli::SubCommandExtend;
use imembed::config::SubCommand;
use tikv_jemallocator::Jemalloc;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let opts = Opts::parse();
    match &opts.subcmd {
        SubCommand::Server(cmd) => cmd.run(&opts).await,
        SubCommand::Embed(cmd) => cmd.run(&opts).await,
        SubCommand::Clean(cmd) => cmd.run(&opts).await,
    }
}
