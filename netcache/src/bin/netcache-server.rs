use std::env;
extern crate netcache;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    netcache::backend::main::run(env::args().collect()).await
}
