//! Prompt assembly for summaries, reports, and capacity summaries.
//!
//! Every builder returns a [`Prompt`]: a fixed system message describing the
//! output format, and a user message assembled from case data. The summary
//! format uses headings that `casewise_core::summary::Summary::parse`
//! understands.

use std::fmt::Write;

use casewise_core::entities::{Case, Interaction, Participant, Task};
use casewise_core::enums::{ParticipantRole, ReportType};

/// Longest excerpt of a single interaction included in report context.
pub const MAX_INTERACTION_CHARS: usize = 1_500;

/// Most interactions included in report and capacity context.
pub const MAX_INTERACTIONS: usize = 40;

/// Longest notes or transcript sent for a single interaction summary.
pub const MAX_SOURCE_CHARS: usize = 60_000;

/// Headings an interaction summary is asked to produce, with their shape.
pub const SUMMARY_SECTIONS: [(&str, SectionShape); 4] = [
    ("Key Points", SectionShape::List),
    ("Capacity and Restrictions", SectionShape::Text),
    ("Actions", SectionShape::List),
    ("Follow-up", SectionShape::List),
];

/// Whether a summary section is bulleted or prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionShape {
    List,
    Text,
}

/// A system + user message pair for the chat-completion API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// One required section of a report, with guidance for the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSection {
    pub heading: &'static str,
    pub guidance: &'static str,
}

const fn section(heading: &'static str, guidance: &'static str) -> ReportSection {
    ReportSection { heading, guidance }
}

const INITIAL_ASSESSMENT: &[ReportSection] = &[
    section("Background", "Worker, employer, claim, and how the injury happened."),
    section("Injury and Medical Status", "Diagnosis, treating practitioners, current treatment."),
    section("Functional Capacity", "What the worker can and cannot do, with restrictions."),
    section("Barriers to Return to Work", "Medical, workplace, and personal barriers identified."),
    section("Goals", "The agreed return-to-work goal and timeframe."),
    section("Recommendations", "Services and interventions recommended next."),
];

const PROGRESS_REPORT: &[ReportSection] = &[
    section("Summary of Progress", "Key developments since the last report."),
    section("Medical Update", "Changes in diagnosis, treatment, or certification."),
    section("Current Capacity", "Present capacity and any change in restrictions."),
    section("Return to Work Status", "Hours, duties, and progress against the plan."),
    section("Barriers and Interventions", "Open barriers and what is being done about them."),
    section("Next Steps", "Planned actions with owners and dates."),
];

const RTW_PLAN: &[ReportSection] = &[
    section("Return to Work Goal", "The agreed goal, stated as duties and hours."),
    section("Current Capacity and Restrictions", "Certified capacity and restrictions to observe."),
    section("Graduated Schedule", "Week-by-week hours and duties."),
    section("Suitable Duties", "Specific duties the worker will perform."),
    section("Supports and Responsibilities", "Who does what: worker, employer, treating team, consultant."),
    section("Review Date", "When and how the plan will be reviewed."),
];

const CLOSURE_REPORT: &[ReportSection] = &[
    section("Case Summary", "Brief history of the case from referral to closure."),
    section("Outcome", "Return-to-work outcome achieved."),
    section("Services Provided", "Interventions delivered during the case."),
    section("Closure Rationale", "Why the case is being closed now."),
    section("Recommendations", "Any ongoing supports or follow-up advised."),
];

const CASE_CONFERENCE_SUMMARY: &[ReportSection] = &[
    section("Attendees", "Who attended and in what capacity."),
    section("Discussion", "Main points discussed."),
    section("Agreed Actions", "Actions agreed, each with an owner and due date."),
    section("Next Conference", "Date or trigger for the next conference."),
];

/// Required sections for a report type, in output order.
#[must_use]
pub const fn report_sections(report_type: ReportType) -> &'static [ReportSection] {
    match report_type {
        ReportType::InitialAssessment => INITIAL_ASSESSMENT,
        ReportType::ProgressReport => PROGRESS_REPORT,
        ReportType::RtwPlan => RTW_PLAN,
        ReportType::ClosureReport => CLOSURE_REPORT,
        ReportType::CaseConferenceSummary => CASE_CONFERENCE_SUMMARY,
    }
}

/// Everything known about a case that a report may draw on.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub case: &'a Case,
    pub participants: &'a [Participant],
    pub interactions: &'a [Interaction],
    pub tasks: &'a [Task],
}

/// Cut `text` to at most `max` characters, never splitting a character.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// At most `max` chars of `text`, ending in `…` when anything was cut.
fn excerpt(text: &str, max: usize) -> String {
    let text = text.trim();
    if truncate_chars(text, max).len() == text.len() {
        return text.to_string();
    }
    let cut = truncate_chars(text, max.saturating_sub(1));
    format!("{}…", cut.trim_end())
}

/// The `limit` most recent interactions, oldest first.
fn chronological(interactions: &[Interaction], limit: usize) -> Vec<&Interaction> {
    let mut sorted: Vec<&Interaction> = interactions.iter().collect();
    sorted.sort_by_key(|i| i.occurred_at);
    let skip = sorted.len().saturating_sub(limit);
    sorted.split_off(skip)
}

fn describe_participant(p: &Participant) -> String {
    match p.organisation.as_deref() {
        Some(org) => format!("{} ({}, {org})", p.name, p.role.label()),
        None => format!("{} ({})", p.name, p.role.label()),
    }
}

fn write_case_block(out: &mut String, case: &Case) {
    let _ = writeln!(out, "## Case");
    let _ = writeln!(out, "Worker: {}", case.worker_name);
    let _ = writeln!(out, "Claim number: {}", case.claim_number);
    let _ = writeln!(out, "Status: {}", case.status);
    let optional = [
        ("Insurer", case.insurer.as_deref()),
        ("Employer", case.employer.as_deref()),
        ("Injury description", case.injury_description.as_deref()),
        ("Current capacity", case.capacity_summary.as_deref()),
        ("Return-to-work goal", case.rtw_goal.as_deref()),
    ];
    if let Some(date) = case.injury_date {
        let _ = writeln!(out, "Date of injury: {}", date.format("%Y-%m-%d"));
    }
    for (label, value) in optional {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            let _ = writeln!(out, "{label}: {}", value.trim());
        }
    }
}

fn write_participants(out: &mut String, participants: &[Participant]) {
    let _ = writeln!(out, "\n## Participants");
    if participants.is_empty() {
        let _ = writeln!(out, "None recorded.");
        return;
    }
    for role in ParticipantRole::ALL {
        let in_role: Vec<&Participant> = participants.iter().filter(|p| p.role == role).collect();
        if in_role.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{}:", role.label());
        for p in in_role {
            let _ = writeln!(out, "- {}", describe_participant(p));
        }
    }
}

fn write_interactions(out: &mut String, interactions: &[Interaction], names: &[Participant]) {
    let _ = writeln!(out, "\n## Interactions (oldest first)");
    let selected = chronological(interactions, MAX_INTERACTIONS);
    if selected.is_empty() {
        let _ = writeln!(out, "None recorded.");
        return;
    }
    for interaction in selected {
        let _ = writeln!(
            out,
            "\n### {} | {} | {}",
            interaction.occurred_at.format("%Y-%m-%d"),
            interaction.interaction_type.label(),
            interaction.subject
        );
        let present: Vec<&str> = interaction
            .participant_ids
            .iter()
            .filter_map(|id| names.iter().find(|p| &p.id == id))
            .map(|p| p.name.as_str())
            .collect();
        if !present.is_empty() {
            let _ = writeln!(out, "With: {}", present.join(", "));
        }
        match interaction.best_text() {
            Some(text) => {
                let _ = writeln!(out, "{}", excerpt(text, MAX_INTERACTION_CHARS));
            }
            None => {
                let _ = writeln!(out, "(no notes)");
            }
        }
    }
}

fn write_tasks(out: &mut String, tasks: &[Task]) {
    let _ = writeln!(out, "\n## Outstanding tasks");
    let outstanding: Vec<&Task> = tasks.iter().filter(|t| t.status.is_outstanding()).collect();
    if outstanding.is_empty() {
        let _ = writeln!(out, "None.");
        return;
    }
    for task in outstanding {
        match task.due_date {
            Some(due) => {
                let _ = writeln!(out, "- {} (due {})", task.description, due.format("%Y-%m-%d"));
            }
            None => {
                let _ = writeln!(out, "- {} (no due date)", task.description);
            }
        }
    }
}

/// Prompt for summarizing one interaction into the fixed summary sections.
#[must_use]
pub fn interaction_summary_prompt(
    interaction: &Interaction,
    participants: &[Participant],
) -> Prompt {
    let mut system = String::from(
        "You are an assistant to a workers' compensation rehabilitation consultant. \
         Summarize the interaction below for the case file. Use Australian English, \
         be factual, and do not invent details that are not in the source.\n\n\
         Respond in markdown with exactly these sections, in this order:\n",
    );
    for (heading, shape) in SUMMARY_SECTIONS {
        let shape = match shape {
            SectionShape::List => "bullet list, one point per line starting with \"- \"",
            SectionShape::Text => "one short paragraph",
        };
        let _ = writeln!(system, "## {heading} ({shape})");
    }
    system.push_str(
        "\nIf a section has nothing to report, write \"- None\" for lists or \
         \"Not discussed.\" for paragraphs. Do not add other sections.",
    );

    let mut user = String::new();
    let _ = writeln!(user, "Type: {}", interaction.interaction_type.label());
    let _ = writeln!(user, "Subject: {}", interaction.subject);
    let _ = writeln!(
        user,
        "Date: {}",
        interaction.occurred_at.format("%Y-%m-%d %H:%M UTC")
    );
    if let Some(minutes) = interaction.duration_minutes {
        let _ = writeln!(user, "Duration: {minutes} minutes");
    }
    let present: Vec<String> = participants
        .iter()
        .filter(|p| interaction.participant_ids.contains(&p.id))
        .map(describe_participant)
        .collect();
    if !present.is_empty() {
        let _ = writeln!(user, "Participants: {}", present.join("; "));
    }
    if let Some(notes) = interaction.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        let _ = writeln!(user, "\nNotes:\n{}", excerpt(notes, MAX_SOURCE_CHARS));
    }
    if let Some(transcript) = interaction
        .transcript
        .as_deref()
        .filter(|t| !t.trim().is_empty())
    {
        let _ = writeln!(
            user,
            "\nTranscript:\n{}",
            excerpt(transcript, MAX_SOURCE_CHARS)
        );
    }

    Prompt { system, user }
}

/// Prompt for drafting a report of `report_type` from the case context.
#[must_use]
pub fn report_prompt(
    report_type: ReportType,
    ctx: &ReportContext<'_>,
    instructions: Option<&str>,
) -> Prompt {
    let mut system = format!(
        "You are an experienced workers' compensation rehabilitation consultant \
         drafting a \"{}\" for the case file. Write in a professional, objective \
         tone using Australian English. Base every statement on the case data \
         provided; where information is missing, say so rather than guessing.\n\n\
         Structure the report in markdown using exactly these section headings, \
         in this order:\n",
        report_type.title()
    );
    for s in report_sections(report_type) {
        let _ = writeln!(system, "## {}\n{}", s.heading, s.guidance);
    }
    system.push_str("\nDo not include a title line; start with the first heading.");

    let mut user = String::new();
    write_case_block(&mut user, ctx.case);
    write_participants(&mut user, ctx.participants);
    write_interactions(&mut user, ctx.interactions, ctx.participants);
    write_tasks(&mut user, ctx.tasks);
    if let Some(extra) = instructions.map(str::trim).filter(|s| !s.is_empty()) {
        let _ = writeln!(user, "\n## Additional instructions from the consultant\n{extra}");
    }

    Prompt { system, user }
}

/// Prompt for a short plain-text summary of the worker's current capacity.
#[must_use]
pub fn capacity_summary_prompt(case: &Case, interactions: &[Interaction]) -> Prompt {
    let system = String::from(
        "You are an assistant to a workers' compensation rehabilitation consultant. \
         From the case data below, write a concise summary (at most 150 words) of the \
         worker's current functional capacity: certified hours, restrictions, and \
         any recent change. Plain text only, no headings or bullet points. If the \
         data does not establish current capacity, say so.",
    );

    let mut user = String::new();
    write_case_block(&mut user, case);
    write_interactions(&mut user, interactions, &[]);

    Prompt { system, user }
}
