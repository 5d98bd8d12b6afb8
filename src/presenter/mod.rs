//! Rendering of a finished itinerary for the terminal or a file.
//!
//! Rendering never fails on missing data: absent values print as
//! [`UNKNOWN`], and an empty activity or accommodation list prints a single
//! `unknown` line.

use std::{fmt, fs, path::Path};

use tracing::info;

use crate::{
    error::{PlannerError, Result},
    types::itinerary::{Accommodation, Activity, DayPlan, ItineraryResult},
};

pub const UNKNOWN: &str = "unknown";
const RULE: &str = "============================================================";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

/// Render an itinerary in the requested format.
pub fn render(itinerary: &ItineraryResult, format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    let written = match format {
        OutputFormat::Text => write_text(&mut out, itinerary),
        OutputFormat::Markdown => write_markdown(&mut out, itinerary),
        OutputFormat::Json => return Ok(serde_json::to_string_pretty(itinerary)?),
    };
    written.map_err(|_| PlannerError::Unknown("failed to format itinerary".to_string()))?;
    Ok(out)
}

/// Write rendered text to `path` byte-for-byte.
pub fn save(path: &Path, rendered: &str) -> Result<()> {
    fs::write(path, rendered)?;
    info!(target: "itinerary::presenter", "saved itinerary to {}", path.display());
    Ok(())
}

fn or_unknown(value: Option<&str>) -> &str {
    value.unwrap_or(UNKNOWN)
}

fn money(amount: Option<f64>, currency: Option<&str>) -> String {
    match (amount, currency) {
        (Some(amount), Some(currency)) => format!("{:.2} {}", amount, currency),
        (Some(amount), None) => format!("{:.2}", amount),
        (None, _) => UNKNOWN.to_string(),
    }
}

fn days(itinerary: &ItineraryResult) -> String {
    match itinerary.duration_days {
        Some(1) => "1 day".to_string(),
        Some(n) => format!("{} days", n),
        None => UNKNOWN.to_string(),
    }
}

fn travelers(itinerary: &ItineraryResult) -> String {
    itinerary
        .travelers
        .map(|t| t.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn generation_time(itinerary: &ItineraryResult) -> String {
    itinerary
        .generation_seconds
        .map(|secs| format!("{:.1}s", secs))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// "Belem Tower (historical, 1-2 hours)"
fn activity_heading(activity: &Activity) -> String {
    let details: Vec<&str> = [&activity.category, &activity.estimated_duration]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .collect();
    let name = or_unknown(activity.name.as_deref());
    if details.is_empty() {
        name.to_string()
    } else {
        format!("{} ({})", name, details.join(", "))
    }
}

fn day_heading(index: usize, plan: &DayPlan) -> String {
    let day = plan.day.map(|d| d as usize).unwrap_or(index + 1);
    match &plan.title {
        Some(title) => format!("Day {}: {}", day, title),
        None => format!("Day {}", day),
    }
}

fn accommodation_details(stay: &Accommodation, currency: Option<&str>) -> Vec<String> {
    let mut details = Vec::new();
    if let Some(location) = &stay.location {
        details.push(format!("Location: {}", location));
    }
    if stay.price_per_night.is_some() {
        details.push(format!(
            "Price per night: {}",
            money(stay.price_per_night, currency)
        ));
    }
    if let Some(rating) = &stay.rating {
        details.push(format!("Rating: {}", rating));
    }
    if let Some(proximity) = &stay.proximity_score {
        details.push(format!("Proximity: {}", proximity));
    }
    details
}

fn write_text<W: fmt::Write>(out: &mut W, itinerary: &ItineraryResult) -> fmt::Result {
    let currency = itinerary.currency.as_deref();

    writeln!(out, "{}", RULE)?;
    writeln!(out, "TRAVEL ITINERARY")?;
    writeln!(out, "{}", RULE)?;

    writeln!(out, "\nDESTINATION")?;
    writeln!(out, "  {}", or_unknown(itinerary.destination.as_deref()))?;
    if let Some(overview) = &itinerary.destination_overview {
        writeln!(out, "  {}", overview)?;
    }

    writeln!(out, "\nDURATION")?;
    writeln!(out, "  {}", days(itinerary))?;
    writeln!(out, "  Travelers: {}", travelers(itinerary))?;

    writeln!(out, "\nACTIVITIES & ATTRACTIONS")?;
    if itinerary.activities.is_empty() {
        writeln!(out, "  {}", UNKNOWN)?;
    }
    for (idx, activity) in itinerary.activities.iter().enumerate() {
        writeln!(out, "  {}. {}", idx + 1, activity_heading(activity))?;
        if let Some(significance) = &activity.significance {
            writeln!(out, "     {}", significance)?;
        }
    }

    if !itinerary.daily_plan.is_empty() {
        writeln!(out, "\nDAILY PLAN")?;
        for (idx, plan) in itinerary.daily_plan.iter().enumerate() {
            writeln!(out, "  {}", day_heading(idx, plan))?;
            for item in &plan.activities {
                writeln!(out, "    - {}", item)?;
            }
            if plan.estimated_cost.is_some() {
                writeln!(
                    out,
                    "    Estimated cost: {}",
                    money(plan.estimated_cost, currency)
                )?;
            }
        }
    }

    writeln!(out, "\nACCOMMODATIONS")?;
    if itinerary.accommodations.is_empty() {
        writeln!(out, "  {}", UNKNOWN)?;
    }
    for (idx, stay) in itinerary.accommodations.iter().enumerate() {
        writeln!(out, "  {}. {}", idx + 1, or_unknown(stay.name.as_deref()))?;
        for detail in accommodation_details(stay, currency) {
            writeln!(out, "     {}", detail)?;
        }
    }

    writeln!(out, "\nCOSTS")?;
    let costs = itinerary.costs.clone().unwrap_or_default();
    for (label, amount) in costs.categories() {
        if amount.is_some() {
            writeln!(out, "  {}: {}", label, money(amount, currency))?;
        }
    }
    writeln!(out, "  Total: {}", money(costs.effective_total(), currency))?;

    if let Some(recommendations) = &itinerary.recommendations {
        writeln!(out, "\nRECOMMENDATIONS")?;
        for line in recommendations.lines() {
            writeln!(out, "  {}", line)?;
        }
    }

    writeln!(out, "\nMETRICS")?;
    writeln!(out, "  Generation time: {}", generation_time(itinerary))?;
    writeln!(out, "{}", RULE)
}

fn write_markdown<W: fmt::Write>(out: &mut W, itinerary: &ItineraryResult) -> fmt::Result {
    let currency = itinerary.currency.as_deref();

    writeln!(
        out,
        "# Travel Itinerary: {}\n",
        or_unknown(itinerary.destination.as_deref())
    )?;
    if let Some(overview) = &itinerary.destination_overview {
        writeln!(out, "{}\n", overview)?;
    }

    writeln!(out, "- **Duration:** {}", days(itinerary))?;
    writeln!(out, "- **Travelers:** {}", travelers(itinerary))?;
    writeln!(out, "- **Currency:** {}\n", or_unknown(currency))?;

    writeln!(out, "## Activities & Attractions\n")?;
    if itinerary.activities.is_empty() {
        writeln!(out, "- {}", UNKNOWN)?;
    }
    for activity in &itinerary.activities {
        match &activity.significance {
            Some(significance) => {
                writeln!(out, "- **{}**: {}", activity_heading(activity), significance)?
            }
            None => writeln!(out, "- **{}**", activity_heading(activity))?,
        }
    }

    if !itinerary.daily_plan.is_empty() {
        writeln!(out, "\n## Daily Plan")?;
        for (idx, plan) in itinerary.daily_plan.iter().enumerate() {
            writeln!(out, "\n### {}\n", day_heading(idx, plan))?;
            for item in &plan.activities {
                writeln!(out, "- {}", item)?;
            }
            if plan.estimated_cost.is_some() {
                writeln!(
                    out,
                    "\n_Estimated cost: {}_",
                    money(plan.estimated_cost, currency)
                )?;
            }
        }
    }

    writeln!(out, "\n## Accommodations\n")?;
    if itinerary.accommodations.is_empty() {
        writeln!(out, "- {}", UNKNOWN)?;
    }
    for stay in &itinerary.accommodations {
        let name = or_unknown(stay.name.as_deref());
        let details = accommodation_details(stay, currency);
        if details.is_empty() {
            writeln!(out, "- **{}**", name)?;
        } else {
            writeln!(out, "- **{}**: {}", name, details.join("; "))?;
        }
    }

    writeln!(out, "\n## Costs\n")?;
    writeln!(out, "| Category | Amount |")?;
    writeln!(out, "|---|---|")?;
    let costs = itinerary.costs.clone().unwrap_or_default();
    for (label, amount) in costs.categories() {
        if amount.is_some() {
            writeln!(out, "| {} | {} |", label, money(amount, currency))?;
        }
    }
    writeln!(
        out,
        "| **Total** | **{}** |",
        money(costs.effective_total(), currency)
    )?;

    if let Some(recommendations) = &itinerary.recommendations {
        writeln!(out, "\n## Recommendations\n\n{}", recommendations)?;
    }

    writeln!(out, "\n---\n_Generation time: {}_", generation_time(itinerary))
}
