use std::env;
extern crate netcache;

fn main() -> anyhow::Result<()> {
    netcache::server::main::run(env::args().collect())
}
