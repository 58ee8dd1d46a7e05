use crate::commands::{contact_views, print_contacts, print_json, Context};
use crate::error::invalid_input;
use crate::util::{parse_call_type, parse_local_timestamp_millis};
use anyhow::{Context as _, Result};
use clap::{ArgAction, Args};
use quickdial_config::MAX_RECENTS_LIMIT;
use quickdial_core::time::now_millis;
use quickdial_core::{phone, Contact, ContactId};
use quickdial_store::repo::CallNew;

#[derive(Debug, Args)]
pub struct LogCallArgs {
    pub number: String,
    /// missed, rejected, incoming or outgoing.
    #[arg(long = "type", value_name = "TYPE", default_value = "outgoing")]
    pub call_type: String,
    /// Local time, `YYYY-MM-DD` or `YYYY-MM-DD HH:MM`. Defaults to now.
    #[arg(long)]
    pub at: Option<String>,
    /// Name cached by the call log for unknown callers.
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct RecentsArgs {
    /// Numbers to leave out. Repeatable.
    #[arg(long, value_name = "NUMBER")]
    pub exclude: Vec<String>,
    /// Keep favorites in the list instead of leaving them out.
    #[arg(long, action = ArgAction::SetTrue)]
    pub include_favorites: bool,
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn log_call(ctx: &Context<'_>, args: LogCallArgs) -> Result<()> {
    let number = args.number.trim();
    if !phone::is_valid(number) {
        return Err(invalid_input(format!("invalid phone number: {number}")));
    }
    let call_type = parse_call_type(&args.call_type)?;
    let occurred_at_millis = match args.at.as_deref() {
        Some(raw) => parse_local_timestamp_millis(raw)?,
        None => now_millis(),
    };

    let id = ctx
        .store
        .calls()
        .record(CallNew {
            number: number.to_string(),
            cached_name: args.name,
            occurred_at_millis,
            call_type,
        })
        .with_context(|| "record call")?;

    if ctx.json {
        print_json(&serde_json::json!({
            "id": id,
            "number": number,
            "call_type": call_type.as_str(),
            "timestamp_millis": occurred_at_millis,
        }))?;
    } else {
        println!("logged {} call {}", call_type.as_str(), phone::format(number));
    }
    Ok(())
}

pub fn recents(ctx: &Context<'_>, args: RecentsArgs) -> Result<()> {
    let limit = args.limit.unwrap_or(ctx.config.recents_limit);
    if limit == 0 || limit > MAX_RECENTS_LIMIT {
        return Err(invalid_input(format!(
            "--limit must be between 1 and {MAX_RECENTS_LIMIT}"
        )));
    }

    let engine = ctx.engine();
    let mut excluded: Vec<Contact> = if args.include_favorites {
        Vec::new()
    } else {
        engine.favorites()
    };
    for raw in &args.exclude {
        let number = raw.trim();
        if !phone::is_valid(number) {
            return Err(invalid_input(format!("invalid --exclude number: {number}")));
        }
        excluded.push(Contact::new(ContactId::call_history(number), number, number));
    }

    let views = contact_views(engine.recent_calls(&excluded, limit), ctx.config);
    print_contacts(ctx, &views, "no recent calls")
}
