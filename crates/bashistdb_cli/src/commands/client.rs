//! Client commands.

use crate::context::Context;
use bashistdb_client::Intent;
use bashistdb_protocol::{escape_like, OutputFormat, QueryOrder, QueryParams};
use std::error::Error;
use std::io::{self, Read};

fn print_reply(text: &str) {
    if !text.is_empty() {
        println!("{text}");
    }
}

/// Uploads history text read from stdin.
pub fn import(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let mut payload = Vec::new();
    io::stdin().read_to_end(&mut payload)?;
    print_reply(&ctx.run(Intent::Import(payload))?);
    Ok(())
}

/// Prints the stats report.
pub fn stats(ctx: &Context) -> Result<(), Box<dyn Error>> {
    print_reply(&ctx.run(Intent::Stats)?);
    Ok(())
}

/// Runs a query.
pub fn query(ctx: &Context, params: QueryParams) -> Result<(), Box<dyn Error>> {
    print_reply(&ctx.run(Intent::Query(params))?);
    Ok(())
}

/// Query for every command of `user` on `host`, oldest first, in restore
/// format.
pub fn restore_params(user: &str, host: &str) -> QueryParams {
    QueryParams::new()
        .with_user(escape_like(user))
        .with_host(escape_like(host))
        .with_limit(0)
        .with_format(OutputFormat::Restore)
        .with_order(QueryOrder::Oldest)
}

/// Prints this user@host's history so it can be appended to
/// `~/.bash_history`.
pub fn restore(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let params = restore_params(&ctx.user()?, &ctx.hostname()?);
    query(ctx, params)
}
