use crate::commands::{print_json, Context};
use anyhow::{anyhow, Context as _, Result};
use clap::{ArgAction, Args, Subcommand};
use quickdial_core::{phone, ContactId};
use quickdial_store::error::{StoreError, StoreErrorKind};
use quickdial_store::repo::{ContactNew, StoredContact};
use quickdial_sync::source::{VcfFile, VcfSource};
use quickdial_sync::vcf::{self, ImportReport, VcfContact};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Subcommand)]
pub enum ImportCommand {
    /// Seed contacts from a `.vcf` file (`-` reads stdin).
    Vcf(ImportVcfArgs),
}

#[derive(Debug, Args)]
pub struct ImportVcfArgs {
    pub file: PathBuf,
    #[arg(long, action = ArgAction::SetTrue)]
    pub dry_run: bool,
}

#[derive(Debug, Subcommand)]
pub enum ExportCommand {
    Vcf(ExportVcfArgs),
}

#[derive(Debug, Args)]
pub struct ExportVcfArgs {
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ExportReport {
    format: String,
    count: usize,
    output: Option<String>,
}

pub fn import_vcf(ctx: &Context<'_>, args: ImportVcfArgs) -> Result<()> {
    let source = VcfFile::new(&args.file);
    let data = source
        .fetch_vcf()
        .with_context(|| format!("read vcf {} {}", source.source_name(), args.file.display()))?;
    let parsed = vcf::parse_vcf(&data)?;
    let mut report = ImportReport {
        skipped: parsed.skipped,
        warnings: parsed.warnings,
        dry_run: args.dry_run,
        ..ImportReport::default()
    };

    for contact in parsed.contacts {
        match apply_vcf_contact(ctx, contact, args.dry_run) {
            Ok(ImportOutcome::Created) => report.created += 1,
            Ok(ImportOutcome::Updated) => report.updated += 1,
            Ok(ImportOutcome::Unchanged) => report.unchanged += 1,
            Ok(ImportOutcome::Skipped(warning)) => {
                report.skipped += 1;
                report.warnings.push(warning);
            }
            Err(err) => {
                if let Some(store_err) = err.downcast_ref::<StoreError>() {
                    if matches!(
                        store_err.kind(),
                        StoreErrorKind::Core | StoreErrorKind::InvalidInput
                    ) {
                        report.skipped += 1;
                        report
                            .warnings
                            .push(format!("skipping contact: {store_err}"));
                        continue;
                    }
                }
                return Err(err);
            }
        }
    }

    if ctx.json {
        return print_json(&report);
    }

    let prefix = if report.dry_run {
        "Dry run: vCard contacts"
    } else {
        "Imported vCard contacts"
    };
    println!(
        "{prefix}: created {}, updated {}, unchanged {}, skipped {}",
        report.created, report.updated, report.unchanged, report.skipped
    );
    if !report.warnings.is_empty() {
        println!("Warnings:");
        for warning in report.warnings {
            println!("- {}", warning);
        }
    }
    Ok(())
}

pub fn export_vcf(ctx: &Context<'_>, args: ExportVcfArgs) -> Result<()> {
    let engine = ctx.engine();
    let contacts = engine.roster();
    let starred: HashSet<ContactId> = engine
        .favorites()
        .into_iter()
        .map(|contact| contact.id)
        .collect();
    let data = vcf::export_vcf(&contacts, &starred);
    write_export(
        ctx,
        ExportReport {
            format: "vcf".to_string(),
            count: contacts.len(),
            output: args.out.as_ref().map(|path| path.display().to_string()),
        },
        args.out.as_deref(),
        &data,
    )
}

fn write_export(
    ctx: &Context<'_>,
    report: ExportReport,
    out: Option<&Path>,
    data: &str,
) -> Result<()> {
    if ctx.json && out.is_none() {
        return Err(anyhow!("--json requires --out for export commands"));
    }

    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("create export directory {}", parent.display()))?;
                }
            }
            fs::write(path, data)
                .with_context(|| format!("write export file {}", path.display()))?;
            if ctx.json {
                print_json(&report)?;
            } else {
                println!("Exported {} contacts to {}", report.count, path.display());
            }
            Ok(())
        }
        None => {
            print!("{}", data);
            Ok(())
        }
    }
}

#[derive(Debug)]
enum ImportOutcome {
    Created,
    Updated,
    Unchanged,
    Skipped(String),
}

/// What importing a card would change on an existing contact.
#[derive(Debug, Default)]
struct ContactChanges {
    numbers: Vec<String>,
    photo_uri: Option<String>,
    star: bool,
}

impl ContactChanges {
    fn between(existing: &StoredContact, incoming: &VcfContact) -> Self {
        let mut known: Vec<String> = existing.numbers.clone();
        let mut numbers = Vec::new();
        for number in &incoming.numbers {
            if !known.iter().any(|kept| phone::same_number(kept, number)) {
                known.push(number.clone());
                numbers.push(number.clone());
            }
        }
        Self {
            numbers,
            photo_uri: incoming
                .photo_uri
                .clone()
                .filter(|_| existing.photo_uri.is_none()),
            star: incoming.starred && !existing.starred,
        }
    }

    fn is_empty(&self) -> bool {
        self.numbers.is_empty() && self.photo_uri.is_none() && !self.star
    }
}

fn apply_vcf_contact(
    ctx: &Context<'_>,
    contact: VcfContact,
    dry_run: bool,
) -> Result<ImportOutcome> {
    let matches = ctx
        .store
        .contacts()
        .list_by_display_name(&contact.display_name)?;
    if matches.len() > 1 {
        return Ok(ImportOutcome::Skipped(format!(
            "multiple contacts named {}; skipping",
            contact.display_name
        )));
    }

    if let Some(existing) = matches.first() {
        let changes = ContactChanges::between(existing, &contact);
        if changes.is_empty() {
            return Ok(ImportOutcome::Unchanged);
        }
        debug!(id = %existing.id, ?changes, dry_run, "updating contact from vcard");
        if !dry_run {
            let repo = ctx.store.contacts();
            for number in &changes.numbers {
                repo.add_number(&existing.id, number)?;
            }
            if let Some(uri) = changes.photo_uri.as_deref() {
                repo.set_photo_uri(&existing.id, Some(uri))?;
            }
            if changes.star {
                repo.set_starred(&existing.id, true)?;
            }
        }
        return Ok(ImportOutcome::Updated);
    }

    if !dry_run {
        ctx.store.contacts().create(ContactNew {
            id: None,
            display_name: contact.display_name,
            numbers: contact.numbers,
            photo_uri: contact.photo_uri,
            starred: contact.starred,
        })?;
    }
    Ok(ImportOutcome::Created)
}
