use std::env;
extern crate netcache;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    netcache::client::main::run(env::args().collect()).await
}
