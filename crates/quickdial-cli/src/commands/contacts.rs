use crate::commands::{contact_views, print_contacts, print_json, Context};
use crate::error::{invalid_input, not_found};
use anyhow::{Context as _, Result};
use clap::{ArgAction, Args};
use quickdial_store::error::StoreErrorKind;
use quickdial_store::repo::ContactNew;

#[derive(Debug, Args)]
pub struct AddContactArgs {
    #[arg(long)]
    pub name: String,
    /// Repeat for several numbers; the first is the primary.
    #[arg(long = "number", value_name = "NUMBER", required = true)]
    pub numbers: Vec<String>,
    #[arg(long)]
    pub id: Option<String>,
    #[arg(long, value_name = "URI")]
    pub photo: Option<String>,
    #[arg(long, action = ArgAction::SetTrue)]
    pub starred: bool,
}

#[derive(Debug, Args)]
pub struct StarArgs {
    pub id: String,
    /// Remove the star instead.
    #[arg(long, action = ArgAction::SetTrue)]
    pub off: bool,
}

#[derive(Debug, Args)]
pub struct FavoritesArgs {}

#[derive(Debug, Args)]
pub struct RosterArgs {}

pub fn add_contact(ctx: &Context<'_>, args: AddContactArgs) -> Result<()> {
    if args.numbers.iter().all(|number| number.trim().is_empty()) {
        return Err(invalid_input("at least one --number is required"));
    }
    let contact = ctx
        .store
        .contacts()
        .create(ContactNew {
            id: args.id,
            display_name: args.name,
            numbers: args.numbers,
            photo_uri: args.photo,
            starred: args.starred,
        })
        .with_context(|| "add contact")?;

    if ctx.json {
        print_json(&serde_json::json!({
            "id": contact.id,
            "display_name": contact.display_name,
            "numbers": contact.numbers,
            "photo_uri": contact.photo_uri,
            "starred": contact.starred,
        }))?;
    } else {
        println!(
            "created {} {}",
            contact.id,
            contact.display_name.unwrap_or_default()
        );
    }
    Ok(())
}

pub fn star(ctx: &Context<'_>, args: StarArgs) -> Result<()> {
    let id = args.id.trim();
    if id.is_empty() {
        return Err(invalid_input("contact id cannot be empty"));
    }
    let starred = !args.off;
    match ctx.store.contacts().set_starred(id, starred) {
        Err(err) if err.kind() == StoreErrorKind::NotFound => {
            return Err(not_found(format!("contact {id}")));
        }
        result => result.with_context(|| format!("update contact {id}"))?,
    }

    if ctx.json {
        print_json(&serde_json::json!({ "id": id, "starred": starred }))?;
    } else if starred {
        println!("starred {id}");
    } else {
        println!("unstarred {id}");
    }
    Ok(())
}

pub fn favorites(ctx: &Context<'_>, _args: FavoritesArgs) -> Result<()> {
    let views = contact_views(ctx.engine().favorites(), ctx.config);
    print_contacts(ctx, &views, "no favorites")
}

pub fn roster(ctx: &Context<'_>, _args: RosterArgs) -> Result<()> {
    let views = contact_views(ctx.engine().roster(), ctx.config);
    print_contacts(ctx, &views, "no contacts")
}
