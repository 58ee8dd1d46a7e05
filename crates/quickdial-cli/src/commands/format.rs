use crate::commands::{print_json, Context};
use crate::error::invalid_input;
use anyhow::Result;
use clap::Args;
use quickdial_core::phone;
use serde::Serialize;

#[derive(Debug, Args)]
pub struct FormatArgs {
    pub number: String,
}

#[derive(Debug, Serialize)]
struct FormatReport {
    input: String,
    formatted: String,
    normalized: String,
    valid: bool,
    country: Option<&'static str>,
    international: bool,
}

pub fn format_number(ctx: &Context<'_>, args: FormatArgs) -> Result<()> {
    let input = args.number.trim().to_string();
    if input.is_empty() {
        return Err(invalid_input("number cannot be empty"));
    }
    let report = FormatReport {
        formatted: phone::format(&input),
        normalized: phone::normalize(&input),
        valid: phone::is_valid(&input),
        country: phone::country_code_of(&input),
        international: phone::is_international(
            &ctx.config.home_country,
            &input,
            ctx.config.international_detection,
        ),
        input,
    };

    if ctx.json {
        return print_json(&report);
    }
    let mut line = report.formatted.clone();
    if let Some(country) = report.country {
        line.push_str(&format!("  {country}"));
    }
    if report.international {
        line.push_str(" [intl]");
    }
    if !report.valid {
        line.push_str(" [invalid]");
    }
    println!("{line}");
    Ok(())
}
