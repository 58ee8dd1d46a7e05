use crate::commands::{contact_views, print_contacts, print_json, Context, ContactView};
use anyhow::{Context as _, Result};
use clap::{ArgAction, Args};
use quickdial_core::{EvictionWorker, SearchOutcome, SearchResultCache, SearchSession, SystemClock};
use serde::Serialize;
use std::io::{self, BufRead};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub query: String,
    /// Include the match weight of every result.
    #[arg(long, action = ArgAction::SetTrue)]
    pub ranked: bool,
}

#[derive(Debug, Args)]
pub struct ShellArgs {}

#[derive(Debug, Serialize)]
struct ShellResponse {
    request_id: u64,
    query: String,
    results: Vec<ContactView>,
}

pub fn search(ctx: &Context<'_>, args: SearchArgs) -> Result<()> {
    let engine = ctx.engine();
    let views: Vec<ContactView> = if args.ranked {
        engine
            .search_ranked(&args.query)
            .into_iter()
            .map(|ranked| ContactView::ranked(ranked, ctx.config))
            .collect()
    } else {
        contact_views(engine.search(&args.query), ctx.config)
    };
    print_contacts(ctx, &views, "no matches")
}

/// Reads one query per line from stdin and prints the published results,
/// reusing one cache for the whole session.
pub fn shell(ctx: &Context<'_>, _args: ShellArgs) -> Result<()> {
    let settings = ctx.config.cache;
    let cache = Arc::new(SearchResultCache::new(SystemClock, settings));
    let worker = EvictionWorker::spawn(Arc::clone(&cache), settings.eviction_interval)
        .with_context(|| "start cache eviction")?;
    let session = SearchSession::new(ctx.engine(), Arc::clone(&cache));

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let query = line.with_context(|| "read query")?;
        let ticket = session.submit(&query);
        match session.execute(&ticket) {
            SearchOutcome::Published(count) => {
                debug!(request_id = ticket.request_id, count, "results published");
                let views = contact_views(session.results(), ctx.config);
                if ctx.json {
                    print_json(&ShellResponse {
                        request_id: ticket.request_id,
                        query,
                        results: views,
                    })?;
                } else {
                    println!("> {query}");
                    print_contacts(ctx, &views, "no matches")?;
                }
            }
            outcome => debug!(request_id = ticket.request_id, ?outcome, "results withheld"),
        }
    }

    worker.stop();
    debug!(cached = cache.len(), "search shell finished");
    Ok(())
}
