//! Schedule 13D / 13G parser for rendered HTML/XHTML filings.
//!
//! Two rendering conventions coexist in the corpus. Modern XHTML filings put
//! each reporting person in a `<table>` whose id contains
//! `reportingPersonDetails`, with values in styled text divs. Legacy filings
//! spread each person across three consecutive tables anchored by the
//! `NAMES OF REPORTING PERSONS` heading. Both reconstruct the same
//! [`Schedule13Filing`] record as the strict XML path.
//!
//! The DOM is walked read-only; regions are located by id attributes, by
//! landmark substrings, and by paragraph-level `Item N.` headings. Inputs are
//! expected to be pre-normalized (entities expanded, nbsp flattened) by the
//! dispatcher.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

use crate::error::Result;
use crate::parsing::normalize::clean_extracted_text;
use crate::parsing::schedule13::{
    amendment_number_from_text, parse_schedule13d, parse_schedule13g, ReportingPerson13,
    Schedule13DItems, Schedule13Filing, Schedule13GItems,
};
use crate::parsing::utils::{parse_float64, parse_int64};

static TABLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static P_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static B_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("b").unwrap());
static TEXT_DIV_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div.text").unwrap());

static TRAILING_ROW_NO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+\d+\s*$").unwrap());
static TRAILING_ROW_DOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+\d+\.\s*$").unwrap());
static WS_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static CUSIP_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*†‡§]+$").unwrap());
static PERCENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.?\d*%").unwrap());
static ITEM_HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Item\s+(\d+)\s*\.").unwrap());

/// Detects the on-wire format (strict XML vs rendered HTML) and parses.
pub fn parse_schedule13_auto(data: &[u8]) -> Result<Schedule13Filing> {
    let text = String::from_utf8_lossy(data);

    if text.trim_start().starts_with("<?xml")
        && text.contains("<edgarSubmission")
        && !text.contains("<!DOCTYPE html")
    {
        if text.contains("schedule13D") {
            return parse_schedule13d(data);
        } else if text.contains("schedule13g") {
            return parse_schedule13g(data);
        }
    }

    parse_schedule13_html(data)
}

/// Parses a rendered HTML/XHTML Schedule 13D or 13G filing.
pub fn parse_schedule13_html(data: &[u8]) -> Result<Schedule13Filing> {
    let text = String::from_utf8_lossy(data);
    let doc = Html::parse_document(&text);

    let mut filing = Schedule13Filing::default();
    let page_text = extract_text(doc.root_element());

    if page_text.contains("SCHEDULE 13D") {
        filing.form_type = "SC 13D".to_string();
    } else if page_text.contains("SCHEDULE 13G") {
        filing.form_type = "SC 13G".to_string();
    }

    if page_text.contains("Amendment No.") || page_text.contains("(Amendment No.") {
        filing.is_amendment = true;
        filing.form_type.push_str("/A");
        filing.amendment_number = amendment_number_from_text(&page_text);
    }

    // Issuer extraction, most reliable strategy first: the Item 1(a)
    // narrative names the issuer explicitly; cover-page bold text is the
    // fallback.
    filing.issuer_name = extract_from_item1a(&page_text);
    if filing.issuer_name.is_empty() {
        filing.issuer_name = extract_bold_before_marker(&doc, "(Name of Issuer)");
    }

    filing.security_title = extract_bold_before_marker(&doc, "(Title of Class of Securities)");
    if filing.security_title.is_empty() {
        filing.security_title =
            extract_bold_before_marker(&doc, "(Title of Class\u{00a0}of Securities)");
    }

    filing.issuer_cusip = extract_bold_before_marker(&doc, "(CUSIP Number)");
    if filing.issuer_cusip.is_empty() {
        filing.issuer_cusip = extract_bold_before_marker(&doc, "(CUSIP number)");
    }

    filing.issuer_name = filing.issuer_name.trim().to_string();
    filing.security_title = filing.security_title.trim().to_string();
    // Footnote markers trail the CUSIP on some cover pages ("088786108**")
    filing.issuer_cusip = CUSIP_MARKER_RE
        .replace(filing.issuer_cusip.trim(), "")
        .into_owned();

    let mut event_date = extract_between(
        &page_text,
        "(Date of Event Which Requires Filing of this Statement)",
        "Check the appropriate box",
    );
    if event_date.is_empty() {
        event_date = extract_between(
            &page_text,
            "(Date of Event Which Requires Filing of This Statement)",
            "Check the appropriate box",
        );
    }
    filing.event_date = event_date.trim().to_string();

    filing.reporting_persons = extract_reporting_persons(&doc);

    if filing.form_type.contains("13G") {
        for rule in ["Rule 13d-1(b)", "Rule 13d-1(c)", "Rule 13d-1(d)"] {
            if page_text.contains(rule) {
                filing.rule_designations.push(rule.to_string());
            }
        }
    }

    if filing.form_type.contains("13D") {
        filing.items_13d = Some(extract_13d_items(&doc));
    } else if filing.form_type.contains("13G") {
        filing.items_13g = Some(extract_13g_items(&page_text));
    }

    Ok(filing)
}

/// Extracts reporting persons, preferring the modern XHTML layout.
fn extract_reporting_persons(doc: &Html) -> Vec<ReportingPerson13> {
    let modern_tables: Vec<ElementRef> = doc
        .select(&TABLE_SEL)
        .filter(|t| {
            t.value()
                .attr("id")
                .map(|id| id.contains("reportingPersonDetails"))
                .unwrap_or(false)
        })
        .collect();

    if !modern_tables.is_empty() {
        return extract_modern_persons(&modern_tables);
    }

    extract_legacy_persons(doc)
}

/// Modern XHTML layout: one table per person, values in text divs.
///
/// The first text div is the person's name. Numeric divs fill the power slots
/// positionally (sole voting, shared voting, sole dispositive, shared
/// dispositive, aggregate), each slot taking the first distinct positive
/// integer not equal to its predecessor. Percent-bearing divs set
/// percent-of-class, a short comma-separated token is the type code, and a
/// short Delaware/United-States/two-letter string is the citizenship.
fn extract_modern_persons(tables: &[ElementRef]) -> Vec<ReportingPerson13> {
    let mut persons = Vec::new();

    for table in tables {
        let mut person = ReportingPerson13::default();

        let divs: Vec<String> = table
            .select(&TEXT_DIV_SEL)
            .map(|div| extract_text(div).trim().to_string())
            .collect();

        for (i, text) in divs.iter().enumerate() {
            let text = text.as_str();

            if i == 0 && person.name.is_empty() {
                person.name = text.to_string();
            }

            let is_percent = text.contains('%');

            if !is_percent {
                let val = parse_int64(text);
                if val > 0 {
                    if person.sole_voting_power == 0 {
                        person.sole_voting_power = val;
                    } else if person.shared_voting_power == 0 && val != person.sole_voting_power {
                        person.shared_voting_power = val;
                    } else if person.sole_dispositive_power == 0
                        && val != person.shared_voting_power
                    {
                        person.sole_dispositive_power = val;
                    } else if person.shared_dispositive_power == 0
                        && val != person.sole_dispositive_power
                    {
                        person.shared_dispositive_power = val;
                    } else if person.aggregate_amount_owned == 0
                        && val != person.shared_dispositive_power
                    {
                        person.aggregate_amount_owned = val;
                    }
                }
            }

            if is_percent && person.percent_of_class == 0.0 {
                person.percent_of_class = parse_float64(&text.replace('%', ""));
            }

            if text.len() <= 10 && text.contains(',') {
                person.type_of_reporting_person = text.to_string();
            }

            let upper = text.to_uppercase();
            if text.len() < 30
                && (upper.contains("DELAWARE") || upper.contains("UNITED STATES") || text.len() == 2)
                && person.citizenship.is_empty()
            {
                person.citizenship = text.to_string();
            }
        }

        if !person.name.is_empty() {
            person.name = clean_person_name(&person.name);
        }

        if person.name.len() > 3 {
            persons.push(person);
        }
    }

    persons
}

/// Legacy layout: each `NAMES OF REPORTING PERSONS` table plus the next two
/// tables in document order form one person triplet.
fn extract_legacy_persons(doc: &Html) -> Vec<ReportingPerson13> {
    let mut persons = Vec::new();

    let all_tables: Vec<ElementRef> = doc.select(&TABLE_SEL).collect();

    let name_indices: Vec<usize> = all_tables
        .iter()
        .enumerate()
        .filter(|(_, t)| extract_text(**t).contains("NAMES OF REPORTING PERSONS"))
        .map(|(i, _)| i)
        .collect();

    for idx in name_indices {
        let mut person = ReportingPerson13::default();

        // Table 1: name and citizenship
        let name_text = extract_text(all_tables[idx]);

        let name = extract_between(
            &name_text,
            "NAMES OF REPORTING PERSONS",
            "CHECK THE APPROPRIATE BOX",
        );
        if !name.is_empty() {
            let name = TRAILING_ROW_NO_RE.replace(name.trim(), "").into_owned();
            person.name = name.trim().to_string();
        }

        let citizenship = extract_between(&name_text, "CITIZENSHIP OR PLACE OF ORGANIZATION", "");
        if !citizenship.is_empty() {
            let citizenship = TRAILING_ROW_NO_RE
                .replace(citizenship.trim(), "")
                .trim()
                .to_string();
            if !citizenship.is_empty() && citizenship.len() < 50 {
                person.citizenship = citizenship;
            }
        }

        // Table 2: voting and dispositive powers
        if idx + 1 < all_tables.len() {
            let powers_text = extract_text(all_tables[idx + 1]);

            let sole = extract_between(&powers_text, "SOLE VOTING POWER", "SHARED VOTING POWER");
            if !sole.is_empty() {
                person.sole_voting_power = parse_int64(&sole);
            }

            let shared =
                extract_between(&powers_text, "SHARED VOTING POWER", "SOLE DISPOSITIVE POWER");
            if !shared.is_empty() {
                person.shared_voting_power = parse_int64(&shared);
            }

            let sole_disp = extract_between(
                &powers_text,
                "SOLE DISPOSITIVE POWER",
                "SHARED DISPOSITIVE POWER",
            );
            if !sole_disp.is_empty() {
                person.sole_dispositive_power = parse_int64(&sole_disp);
            }

            let shared_disp = extract_between(&powers_text, "SHARED DISPOSITIVE POWER", "");
            if !shared_disp.is_empty() {
                person.shared_dispositive_power = parse_int64(&shared_disp);
            }
        }

        // Table 3: aggregate amount, percent of class, type code
        if idx + 2 < all_tables.len() {
            let agg_text = extract_text(all_tables[idx + 2]);

            let agg = extract_between(
                &agg_text,
                "AGGREGATE AMOUNT BENEFICIALLY OWNED",
                "CHECK BOX IF",
            );
            if !agg.is_empty() {
                person.aggregate_amount_owned = parse_int64(&agg);
            }

            let pct = extract_between(&agg_text, "PERCENT OF CLASS", "TYPE OF REPORTING PERSON");
            if !pct.is_empty() {
                if let Some(m) = PERCENT_RE.find(&pct) {
                    person.percent_of_class =
                        parse_float64(m.as_str().trim_end_matches('%'));
                }
            }

            let type_str = extract_after_marker(&agg_text, "TYPE OF REPORTING PERSON");
            if !type_str.is_empty() {
                let type_str = type_str.replace("(See Instructions)", "");
                for line in type_str.split('\n') {
                    let line = line.trim();
                    if !line.is_empty()
                        && line.len() < 30
                        && !line.contains("Page")
                        && !line.contains("CUSIP")
                    {
                        person.type_of_reporting_person = line.to_string();
                        break;
                    }
                }
            }
        }

        if !person.name.is_empty() {
            person.name = clean_person_name(&person.name);
        }

        if person.name.len() > 3 {
            persons.push(person);
        }
    }

    persons
}

/// Narrative Items 1-7 for 13D, mapped from paragraph-level headings.
fn extract_13d_items(doc: &Html) -> Schedule13DItems {
    let paras: Vec<ElementRef> = doc.select(&P_SEL).collect();
    let item_paras = find_item_paragraphs(&paras);

    let mut items = Schedule13DItems {
        item1_security_title: extract_item_content(&paras, &item_paras, 1),
        item2_filing_persons: extract_item_content(&paras, &item_paras, 2),
        item3_source_of_funds: extract_item_content(&paras, &item_paras, 3),
        item4_purpose_of_transaction: extract_item_content(&paras, &item_paras, 4),
        item5_percentage_of_class: extract_item_content(&paras, &item_paras, 5),
        item6_contracts: extract_item_content(&paras, &item_paras, 6),
        item7_exhibits: extract_item_content(&paras, &item_paras, 7),
        ..Default::default()
    };

    items.item1_security_title = clean_extracted_text(&items.item1_security_title);
    items.item2_filing_persons = clean_extracted_text(&items.item2_filing_persons);
    items.item3_source_of_funds = clean_extracted_text(&items.item3_source_of_funds);
    items.item4_purpose_of_transaction = clean_extracted_text(&items.item4_purpose_of_transaction);
    items.item5_percentage_of_class = clean_extracted_text(&items.item5_percentage_of_class);
    items.item6_contracts = clean_extracted_text(&items.item6_contracts);
    items.item7_exhibits = clean_extracted_text(&items.item7_exhibits);

    items
}

/// Narrative Items 1-10 for 13G, extracted from the flattened page text.
fn extract_13g_items(page_text: &str) -> Schedule13GItems {
    let mut items = Schedule13GItems {
        item1_issuer_name: extract_item_text(page_text, "Item 1", "Item 2"),
        item2_filer_names: extract_item_text(page_text, "Item 2", "Item 3"),
        ..Default::default()
    };

    items.item3_not_applicable =
        extract_item_text(page_text, "Item 3", "Item 4").contains("Not Applicable");

    let item4 = extract_item_text(page_text, "Item 4", "Item 5");
    items.item4_amount_beneficially_owned = clean_extracted_text(&item4);

    let item5 = extract_item_text(page_text, "Item 5", "Item 6");
    items.item5_not_applicable = item5.contains("Not Applicable");
    items.item5_ownership_5pct_or_less = clean_extracted_text(&item5);

    items.item6_not_applicable =
        extract_item_text(page_text, "Item 6", "Item 7").contains("Not Applicable");
    items.item7_not_applicable =
        extract_item_text(page_text, "Item 7", "Item 8").contains("Not Applicable");
    items.item8_not_applicable =
        extract_item_text(page_text, "Item 8", "Item 9").contains("Not Applicable");
    items.item9_not_applicable =
        extract_item_text(page_text, "Item 9", "Item 10").contains("Not Applicable");

    let item10 = extract_item_text(page_text, "Item 10", "SIGNATURE");
    items.item10_certification = clean_extracted_text(&item10);

    items
}

/// All text content under a node, text nodes separated by single spaces.
fn extract_text(el: ElementRef) -> String {
    let mut buf = String::new();
    for t in el.text() {
        buf.push_str(t);
        buf.push(' ');
    }
    buf
}

/// Text between two markers, whitespace-collapsed. An empty end marker takes
/// up to 200 characters.
fn extract_between(text: &str, start: &str, end: &str) -> String {
    let start_idx = match text.find(start) {
        Some(i) => i + start.len(),
        None => return String::new(),
    };

    let rest = &text[start_idx..];
    let chunk = if end.is_empty() {
        rest.chars().take(200).collect::<String>()
    } else {
        match rest.find(end) {
            Some(i) => rest[..i].to_string(),
            None => return String::new(),
        }
    };

    WS_RUN_RE.replace_all(chunk.trim(), " ").into_owned()
}

/// Raw (not whitespace-collapsed) text after a marker, up to 200 characters.
fn extract_after_marker(text: &str, marker: &str) -> String {
    let idx = match text.find(marker) {
        Some(i) => i + marker.len(),
        None => return String::new(),
    };

    text[idx..].chars().take(200).collect::<String>().trim().to_string()
}

/// Pulls the issuer name out of the Item 1(a) narrative section.
fn extract_from_item1a(page_text: &str) -> String {
    if !page_text.contains("Item 1(a)") && !page_text.contains("Item 1a") {
        return String::new();
    }

    let start = match page_text.find("Name of Issuer:") {
        Some(i) => i + "Name of Issuer:".len(),
        None => return String::new(),
    };

    let mut chunk: String = page_text[start..].chars().take(500).collect();

    if let Some(idx) = chunk.find("Item 1(b)") {
        chunk.truncate(idx);
    } else if let Some(idx) = chunk.find("Item 1b") {
        chunk.truncate(idx);
    }

    for line in chunk.split('\n') {
        let line = line.trim();
        if line.is_empty() || line == "&nbsp;" || line.len() < 3 {
            continue;
        }
        if line.starts_with('(') || line.starts_with("Item") {
            continue;
        }
        return line.to_string();
    }

    String::new()
}

/// Cover-page extraction: the value sits in bold text shortly before its
/// parenthesized label. Searches backward at most five paragraphs; inside
/// each, prefers the first `<b>` text, else the paragraph text.
fn extract_bold_before_marker(doc: &Html, marker: &str) -> String {
    let paras: Vec<ElementRef> = doc.select(&P_SEL).collect();

    let nbsp_marker = marker.replace(' ', "\u{00a0}");
    let entity_marker = marker.replace(' ', "&nbsp;");

    let marker_idx = paras.iter().position(|p| {
        let text = extract_text(*p);
        text.contains(marker) || text.contains(&nbsp_marker) || text.contains(&entity_marker)
    });

    let marker_idx = match marker_idx {
        Some(i) => i,
        None => return String::new(),
    };

    let lower_bound = marker_idx.saturating_sub(5);
    for i in (lower_bound..marker_idx).rev() {
        let bold = first_bold_text(paras[i]);
        if bold.len() > 2 {
            return bold;
        }

        // Value may live in a <font> or bare text instead of <b>
        let para_text = extract_text(paras[i]);
        let para_text = WS_RUN_RE.replace_all(para_text.trim(), " ").into_owned();

        if para_text.is_empty()
            || para_text == " "
            || para_text.replace('\u{00a0}', "").trim().is_empty()
        {
            continue;
        }
        if para_text.starts_with('(') {
            continue;
        }
        if para_text.len() > 2 {
            return para_text;
        }
    }

    String::new()
}

/// First `<b>` text within a node, whitespace-collapsed.
fn first_bold_text(el: ElementRef) -> String {
    for b in el.select(&B_SEL) {
        let text = extract_text(b);
        let text = WS_RUN_RE.replace_all(text.trim(), " ").into_owned();
        if !text.is_empty() {
            return text;
        }
    }
    String::new()
}

/// Strips trailing cover-page row numbers ("Baker Bros. Advisors LP    2." →
/// "Baker Bros. Advisors LP") and collapses whitespace.
fn clean_person_name(name: &str) -> String {
    let name = TRAILING_ROW_DOT_RE.replace(name, "");
    WS_RUN_RE.replace_all(name.trim(), " ").into_owned()
}

/// Maps item number → paragraph index for paragraphs whose trimmed text
/// starts with `Item` and matches `Item N.` within the first 300 characters.
fn find_item_paragraphs(paras: &[ElementRef]) -> HashMap<u32, usize> {
    let mut item_paras = HashMap::new();

    for (i, para) in paras.iter().enumerate() {
        let para_text = extract_text(*para);
        let trimmed = para_text.trim();

        if !trimmed.starts_with("Item") {
            continue;
        }

        let search_text: String = trimmed.chars().take(300).collect();
        let search_text = search_text.replace('\u{00a0}', " ");

        if let Some(caps) = ITEM_HEADING_RE.captures(&search_text) {
            if let Ok(num) = caps[1].parse::<u32>() {
                if (1..=10).contains(&num) {
                    // Later occurrences win so a table-of-contents entry does
                    // not shadow the real heading
                    item_paras.insert(num, i);
                }
            }
        }
    }

    item_paras
}

/// Concatenates the paragraphs between an item heading and the next
/// higher-numbered item heading (or the SIGNATURE sentinel, bounded at 500
/// paragraphs).
fn extract_item_content(
    paras: &[ElementRef],
    item_paras: &HashMap<u32, usize>,
    item_num: u32,
) -> String {
    let start = match item_paras.get(&item_num) {
        Some(&i) => i,
        None => return String::new(),
    };

    let mut end = None;
    for next_num in (item_num + 1)..=11 {
        if let Some(&i) = item_paras.get(&next_num) {
            end = Some(i);
            break;
        }
    }

    let mut parts = Vec::new();
    let range_end = end.unwrap_or(paras.len());

    for para in paras.iter().take(range_end).skip(start + 1) {
        let text = extract_text(*para);
        let text = text.trim();

        if end.is_none() {
            if text.contains("SIGNATURE") {
                break;
            }
            if parts.len() >= 500 {
                break;
            }
        }

        if !text.is_empty() {
            parts.push(text.to_string());
        }
    }

    parts.join(" ")
}

/// Text between two item markers in the flattened page text, skipping the
/// heading/title lines at the start of the extracted block.
fn extract_item_text(text: &str, start_marker: &str, end_marker: &str) -> String {
    let mut start_pattern = start_marker.to_string();
    if !start_pattern.ends_with('.') {
        start_pattern.push('.');
    }

    let start_idx = match text.find(&start_pattern) {
        Some(i) => i,
        None => {
            // Rendered headings sometimes carry a space before the period
            let alt = format!("{} .", start_marker.trim_end_matches('.'));
            match text.find(&alt) {
                Some(i) => i,
                None => return String::new(),
            }
        }
    };

    // Skip past the heading line to the first real paragraph
    let search_area: String = text[start_idx..].chars().take(500).collect();
    let title_end = search_area
        .find("\n\n")
        .or_else(|| search_area.find('\n').map(|i| i + 1))
        .unwrap_or(start_pattern.len() + 50)
        .min(search_area.len());

    let mut content_start = start_idx + title_end;
    while content_start < text.len() && !text.is_char_boundary(content_start) {
        content_start += 1;
    }
    if content_start >= text.len() {
        return String::new();
    }

    let rest = &text[content_start..];
    let mut end_idx = rest.find(end_marker).unwrap_or_else(|| rest.len().min(50_000));
    while end_idx < rest.len() && !rest.is_char_boundary(end_idx) {
        end_idx += 1;
    }

    let extracted = &rest[..end_idx];

    let mut content_lines = Vec::new();
    for (i, line) in extracted.split('\n').enumerate() {
        let trimmed = line.trim();
        if i < 3
            && (trimmed.is_empty()
                || trimmed.contains("Purpose")
                || trimmed.contains("Transaction")
                || trimmed.contains("Identity")
                || trimmed.contains("Background")
                || trimmed.len() < 10)
        {
            continue;
        }
        content_lines.push(line);
    }

    content_lines.join("\n")
}
