//! Heuristic field extraction over extracted resume text.
//!
//! Produces a [`ParsedResume`] whose every candidate value carries a
//! confidence score: direct pattern hits (email, profile links) score high,
//! structural guesses (name, loosely split entries) score low. The scores
//! drive review badges only — selection stays with the user.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::reconcile::models::{
    ParsedCertification, ParsedEducation, ParsedExperience, ParsedField, ParsedPersonalInfo,
    ParsedProject, ParsedResume,
};

const CONF_EMAIL: f64 = 0.95;
const CONF_LINK: f64 = 0.9;
const CONF_PHONE: f64 = 0.8;
const CONF_ENTRY: f64 = 0.75;
const CONF_SKILL: f64 = 0.75;
const CONF_SUMMARY: f64 = 0.65;
const CONF_NAME: f64 = 0.6;
const CONF_CERT: f64 = 0.6;
const CONF_LOOSE: f64 = 0.5;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?\d[\d\s().\-]{6,14}\d").unwrap());

static LINKEDIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:https?://)?(?:www\.)?linkedin\.com/in/[A-Za-z0-9\-]+").unwrap());

static GITHUB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:https?://)?(?:www\.)?github\.com/[A-Za-z0-9\-]{1,39}").unwrap());

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());

static BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[•\-*–▪]\s+(.+)$").unwrap());

static DATE_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b((?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{4}|\d{1,2}/\d{4}|\d{4})\s*(?:-|–|—|to)\s*((?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{4}|\d{1,2}/\d{4}|\d{4}|present|current)",
    )
    .unwrap()
});

static ROLE_AT_COMPANY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.{2,}?)\s+(?:at|@)\s+(.{2,})$").unwrap());

static INSTITUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)university|college|institute|school|academy").unwrap());

static DEGREE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)bachelor|master|ph\.?d|b\.?sc?|m\.?sc?|b\.?a\b|m\.?a\b|diploma|associate")
        .unwrap()
});

static TRAILING_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",?\s*\b((?:18|19|20)\d{2})\s*$").unwrap());

/// Runs every extractor over the text and assembles the parsed resume.
pub fn parse_resume_text(text: &str) -> ParsedResume {
    let layout = split_into_sections(text);

    let mut parsed = ParsedResume {
        personal_info: extract_personal_info(text, &layout),
        ..Default::default()
    };

    if let Some(lines) = layout.section("experience") {
        for (idx, block) in blocks(lines).into_iter().enumerate() {
            parsed.experience.push(parse_experience(&block, idx));
        }
    }
    if let Some(lines) = layout.section("education") {
        for (idx, block) in blocks(lines).into_iter().enumerate() {
            parsed.education.push(parse_education(&block, idx));
        }
    }
    if let Some(lines) = layout.section("skills") {
        parsed.skills = parse_skills(lines);
    }
    if let Some(lines) = layout.section("projects") {
        for (idx, block) in blocks(lines).into_iter().enumerate() {
            parsed.projects.push(parse_project(&block, idx));
        }
    }
    if let Some(lines) = layout.section("certifications") {
        parsed.certifications = parse_certifications(lines);
    }

    parsed
}

/// Section keys recognized in headers. `certificates` and friends all fold
/// into the canonical `certifications` key.
fn classify_header(line: &str) -> Option<&'static str> {
    let normalized = line.trim().trim_end_matches(':').to_lowercase();
    if normalized.len() > 40 {
        return None;
    }
    match normalized.as_str() {
        "experience" | "work experience" | "employment" | "employment history"
        | "professional experience" => Some("experience"),
        "education" | "academic background" => Some("education"),
        "skills" | "technical skills" | "core skills" => Some("skills"),
        "projects" | "personal projects" | "selected projects" => Some("projects"),
        "certifications" | "certificates" | "licenses and certifications"
        | "licenses & certifications" => Some("certifications"),
        "summary" | "professional summary" | "objective" | "profile" | "about" | "about me" => {
            Some("summary")
        }
        _ => None,
    }
}

struct SectionLayout<'a> {
    /// Lines before the first recognized header: name, contact row, links.
    header_region: Vec<&'a str>,
    sections: Vec<(&'static str, Vec<&'a str>)>,
}

impl<'a> SectionLayout<'a> {
    fn section(&self, key: &str) -> Option<&[&'a str]> {
        self.sections
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, lines)| lines.as_slice())
    }
}

fn split_into_sections(text: &str) -> SectionLayout<'_> {
    let mut header_region = Vec::new();
    let mut sections: Vec<(&'static str, Vec<&str>)> = Vec::new();
    let mut current: Option<usize> = None;

    for line in text.lines() {
        if let Some(key) = classify_header(line) {
            if let Some(pos) = sections.iter().position(|(k, _)| *k == key) {
                current = Some(pos);
            } else {
                sections.push((key, Vec::new()));
                current = Some(sections.len() - 1);
            }
            continue;
        }
        match current {
            Some(pos) => sections[pos].1.push(line),
            None => header_region.push(line),
        }
    }

    SectionLayout {
        header_region,
        sections,
    }
}

fn extract_personal_info(text: &str, layout: &SectionLayout<'_>) -> ParsedPersonalInfo {
    let mut info = ParsedPersonalInfo::default();

    if let Some(m) = EMAIL_RE.find(text) {
        info.email = Some(ParsedField::new(m.as_str().to_lowercase(), CONF_EMAIL));
    }
    if let Some(m) = LINKEDIN_RE.find(text) {
        info.linkedin = Some(ParsedField::new(m.as_str().to_string(), CONF_LINK));
    }
    if let Some(m) = GITHUB_RE.find(text) {
        info.github = Some(ParsedField::new(m.as_str().to_string(), CONF_LINK));
    }
    if let Some(phone) = extract_phone(&layout.header_region) {
        info.phone = Some(ParsedField::new(phone, CONF_PHONE));
    }
    if let Some(name) = guess_name(&layout.header_region) {
        info.full_name = Some(ParsedField::new(name, CONF_NAME));
    }
    if let Some(lines) = layout.section("summary") {
        let summary = lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !summary.is_empty() {
            info.summary = Some(ParsedField::new(summary, CONF_SUMMARY));
        }
    }

    info
}

fn extract_phone(header_region: &[&str]) -> Option<String> {
    for line in header_region {
        for m in PHONE_RE.find_iter(line) {
            let candidate = m.as_str();
            let digits = candidate.chars().filter(|c| c.is_ascii_digit()).count();
            // Year ranges ("2019 - 2023") also match the shape; a real phone
            // number has at least 7 digits.
            if digits >= 7 {
                return Some(candidate.trim().to_string());
            }
        }
    }
    None
}

/// The candidate's name is usually the first short, link-free, digit-free
/// line of the header region.
fn guess_name(header_region: &[&str]) -> Option<String> {
    for line in header_region.iter().take(5) {
        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.len() > 60
            || trimmed.contains('@')
            || trimmed.to_lowercase().contains("http")
            || trimmed.chars().any(|c| c.is_ascii_digit())
        {
            continue;
        }
        let words = trimmed.split_whitespace().count();
        if (2..=5).contains(&words) {
            return Some(trimmed.to_string());
        }
    }
    None
}

/// Splits a section body into blocks on blank lines.
fn blocks<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut out: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn take_date_range(line: &str) -> (String, Option<String>, Option<String>) {
    match DATE_RANGE_RE.captures(line) {
        Some(caps) => {
            let full = caps.get(0).unwrap();
            let mut rest = String::new();
            rest.push_str(&line[..full.start()]);
            rest.push_str(&line[full.end()..]);
            let rest = rest
                .trim()
                .trim_matches(|c: char| matches!(c, '|' | ',' | '(' | ')' | '·'))
                .trim()
                .to_string();
            (
                rest,
                Some(caps[1].trim().to_string()),
                Some(caps[2].trim().to_string()),
            )
        }
        None => (line.trim().to_string(), None, None),
    }
}

fn split_bullets<'a>(block: &[&'a str]) -> (Vec<&'a str>, Vec<String>) {
    let mut plain = Vec::new();
    let mut bullets = Vec::new();
    for line in block {
        match BULLET_RE.captures(line) {
            Some(caps) => bullets.push(caps[1].trim().to_string()),
            None => plain.push(*line),
        }
    }
    (plain, bullets)
}

fn parse_experience(block: &[&str], idx: usize) -> ParsedField<ParsedExperience> {
    let (plain, bullets) = split_bullets(block);

    let mut start_date = None;
    let mut end_date = None;
    let mut headline = String::new();
    for (i, line) in plain.iter().enumerate() {
        let (rest, start, end) = take_date_range(line);
        if i == 0 {
            headline = rest;
            start_date = start;
            end_date = end;
        } else if start_date.is_none() && start.is_some() {
            start_date = start;
            end_date = end;
        }
    }

    let (role, company, confidence) = match ROLE_AT_COMPANY_RE.captures(&headline) {
        Some(caps) => (
            caps[1].trim().to_string(),
            caps[2].trim().to_string(),
            CONF_ENTRY,
        ),
        None => match headline
            .split_once(" — ")
            .or_else(|| headline.split_once(" - "))
            .or_else(|| headline.split_once(" | "))
            .or_else(|| headline.split_once(", "))
        {
            Some((role, company)) => (
                role.trim().to_string(),
                company.trim().to_string(),
                CONF_ENTRY,
            ),
            None => (headline.trim().to_string(), String::new(), CONF_LOOSE),
        },
    };

    ParsedField::new(
        ParsedExperience {
            provisional_id: Some(format!("exp-{idx}")),
            role,
            company,
            start_date,
            end_date,
            bullets,
        },
        confidence,
    )
}

fn parse_education(block: &[&str], idx: usize) -> ParsedField<ParsedEducation> {
    let (plain, _) = split_bullets(block);

    let mut institution = None;
    let mut degree = None;
    let mut start_date = None;
    let mut end_date = None;

    for line in &plain {
        let (rest, start, end) = take_date_range(line);
        if start_date.is_none() && start.is_some() {
            start_date = start;
            end_date = end;
        }
        if institution.is_none() && INSTITUTION_RE.is_match(&rest) {
            institution = Some(rest.clone());
        } else if degree.is_none() && DEGREE_RE.is_match(&rest) {
            degree = Some(rest.clone());
        }
    }

    let structured = institution.is_some() && degree.is_some();
    let institution = institution
        .or_else(|| plain.first().map(|l| take_date_range(l).0))
        .unwrap_or_default();
    let degree = degree.unwrap_or_default();

    ParsedField::new(
        ParsedEducation {
            provisional_id: Some(format!("edu-{idx}")),
            institution,
            degree,
            start_date,
            end_date,
        },
        if structured { CONF_ENTRY } else { CONF_LOOSE },
    )
}

fn parse_skills(lines: &[&str]) -> Vec<ParsedField<String>> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for line in lines {
        for raw in line.split(['•', ',', '|', ';']) {
            let skill = raw.trim().trim_matches(':');
            if skill.len() > 1 && skill.len() <= 60 && seen.insert(skill.to_lowercase()) {
                out.push(ParsedField::new(skill.to_string(), CONF_SKILL));
            }
        }
    }
    out
}

fn parse_project(block: &[&str], idx: usize) -> ParsedField<ParsedProject> {
    let (plain, bullets) = split_bullets(block);

    let first = plain.first().copied().unwrap_or_default();
    let url = URL_RE.find(first).map(|m| {
        m.as_str()
            .trim_end_matches(|c: char| matches!(c, '.' | ',' | ')'))
            .to_string()
    });
    let name = match &url {
        Some(u) => first.replace(u.as_str(), ""),
        None => first.to_string(),
    };
    let name = name
        .trim()
        .trim_matches(|c: char| matches!(c, '-' | '|' | '(' | ')' | '·'))
        .trim()
        .to_string();
    let description = if plain.len() > 1 {
        Some(plain[1..].join(" ").trim().to_string()).filter(|d| !d.is_empty())
    } else {
        None
    };

    ParsedField::new(
        ParsedProject {
            provisional_id: Some(format!("proj-{idx}")),
            name,
            url,
            description,
            bullets,
        },
        CONF_ENTRY,
    )
}

fn parse_certifications(lines: &[&str]) -> Vec<ParsedField<ParsedCertification>> {
    let mut out = Vec::new();
    for (idx, line) in lines.iter().filter(|l| !l.trim().is_empty()).enumerate() {
        let text = match BULLET_RE.captures(line) {
            Some(caps) => caps[1].trim().to_string(),
            None => line.trim().to_string(),
        };
        let (mut rest, mut date, _) = take_date_range(&text);
        if date.is_none() {
            if let Some(caps) = TRAILING_YEAR_RE.captures(&rest) {
                date = Some(caps[1].to_string());
                let start = caps.get(0).unwrap().start();
                rest.truncate(start);
            }
        }
        let (name, issuer) = match rest
            .split_once(" — ")
            .or_else(|| rest.split_once(" - "))
            .or_else(|| rest.split_once(", "))
        {
            Some((name, issuer)) => (name.trim().to_string(), Some(issuer.trim().to_string())),
            None => (rest.trim().to_string(), None),
        };
        if name.is_empty() {
            continue;
        }
        out.push(ParsedField::new(
            ParsedCertification {
                provisional_id: Some(format!("cert-{idx}")),
                name,
                issuer,
                date,
            },
            CONF_CERT,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "\
Ada Lovelace
London | +44 20 7946 0958
ada.lovelace@example.com
linkedin.com/in/ada-lovelace
github.com/adalovelace

SUMMARY
Mathematician and pioneer of computing.

EXPERIENCE
Analyst at Analytical Engines Ltd
Jan 1842 - Dec 1843
• Translated and annotated the Menabrea memoir
• Designed the first published machine algorithm

Tutor — Private Practice
1840 - 1841

EDUCATION
University of London
B.Sc Mathematics
1833 - 1837

SKILLS
Mathematics, Analytical thinking • Punch cards | Lacework

CERTIFICATES
Bernoulli Numbers — Royal Society, 1843
";

    #[test]
    fn test_personal_info_extraction() {
        let parsed = parse_resume_text(FIXTURE);
        let info = &parsed.personal_info;

        assert_eq!(
            info.email.as_ref().unwrap().value,
            "ada.lovelace@example.com"
        );
        assert_eq!(info.email.as_ref().unwrap().confidence, CONF_EMAIL);
        assert_eq!(
            info.linkedin.as_ref().unwrap().value,
            "linkedin.com/in/ada-lovelace"
        );
        assert_eq!(info.github.as_ref().unwrap().value, "github.com/adalovelace");
        assert_eq!(info.full_name.as_ref().unwrap().value, "Ada Lovelace");
        assert!(info.phone.as_ref().unwrap().value.contains("7946"));
        assert!(info
            .summary
            .as_ref()
            .unwrap()
            .value
            .starts_with("Mathematician"));
    }

    #[test]
    fn test_experience_blocks_with_dates_and_bullets() {
        let parsed = parse_resume_text(FIXTURE);
        assert_eq!(parsed.experience.len(), 2);

        let first = &parsed.experience[0];
        assert_eq!(first.confidence, CONF_ENTRY);
        assert_eq!(first.value.role, "Analyst");
        assert_eq!(first.value.company, "Analytical Engines Ltd");
        assert_eq!(first.value.start_date.as_deref(), Some("Jan 1842"));
        assert_eq!(first.value.end_date.as_deref(), Some("Dec 1843"));
        assert_eq!(first.value.bullets.len(), 2);

        let second = &parsed.experience[1];
        assert_eq!(second.value.role, "Tutor");
        assert_eq!(second.value.company, "Private Practice");
        assert_eq!(second.value.start_date.as_deref(), Some("1840"));
    }

    #[test]
    fn test_education_extraction() {
        let parsed = parse_resume_text(FIXTURE);
        assert_eq!(parsed.education.len(), 1);
        let edu = &parsed.education[0];
        assert_eq!(edu.value.institution, "University of London");
        assert_eq!(edu.value.degree, "B.Sc Mathematics");
        assert_eq!(edu.value.start_date.as_deref(), Some("1833"));
        assert_eq!(edu.confidence, CONF_ENTRY);
    }

    #[test]
    fn test_skills_split_and_dedupe() {
        let parsed = parse_resume_text(FIXTURE);
        let names: Vec<&str> = parsed.skills.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(
            names,
            vec!["Mathematics", "Analytical thinking", "Punch cards", "Lacework"]
        );
    }

    #[test]
    fn test_certificates_header_folds_into_certifications() {
        let parsed = parse_resume_text(FIXTURE);
        assert_eq!(parsed.certifications.len(), 1);
        let cert = &parsed.certifications[0];
        assert_eq!(cert.value.name, "Bernoulli Numbers");
        assert_eq!(cert.value.issuer.as_deref(), Some("Royal Society"));
        assert_eq!(cert.value.date.as_deref(), Some("1843"));
    }

    #[test]
    fn test_extracted_fields_start_selected() {
        let parsed = parse_resume_text(FIXTURE);
        assert!(parsed.personal_info.email.as_ref().unwrap().selected);
        assert!(parsed.experience.iter().all(|f| f.selected));
        assert!(parsed.skills.iter().all(|f| f.selected));
    }

    #[test]
    fn test_loose_headline_gets_low_confidence() {
        let text = "EXPERIENCE\nSomething vague\n";
        let parsed = parse_resume_text(text);
        assert_eq!(parsed.experience.len(), 1);
        assert_eq!(parsed.experience[0].confidence, CONF_LOOSE);
        assert_eq!(parsed.experience[0].value.role, "Something vague");
        assert!(parsed.experience[0].value.company.is_empty());
    }

    #[test]
    fn test_empty_text_yields_empty_parse() {
        let parsed = parse_resume_text("");
        assert!(parsed.experience.is_empty());
        assert!(parsed.skills.is_empty());
        assert!(parsed.personal_info.email.is_none());
    }
}
