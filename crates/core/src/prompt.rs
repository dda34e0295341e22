//! Prompt text sent to the text-generation service.

use crate::generation::file_type_for_filename;

/// Instruction used when a project has no competition, or its competition
/// carries no custom prompt. Describes the four standard documents.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an expert business consultant helping entrepreneurs prepare competition materials.

Generate comprehensive, professional documents for an entrepreneurship competition. These are the ESSENTIAL files needed for most startup competitions. Based on the project idea provided, create the following files:

1. **Pitch Deck** (pitch_deck.md) - A complete pitch deck outline (10-12 slides) including:
   - Problem Statement (What problem are you solving?)
   - Solution (Your product/service)
   - Market Opportunity (Market size, TAM/SAM/SOM)
   - Business Model (How you make money)
   - Traction/Milestones (What you've achieved)
   - Team (Key team members and their expertise)
   - Financials (Revenue projections, key metrics)
   - Ask/Next Steps (What you need, funding ask)

2. **Business Plan** (business_plan.md) - A comprehensive business plan including:
   - Executive Summary
   - Company Description & Vision
   - Market Analysis (Industry, competitors, target market)
   - Organization & Management (Team structure, advisors)
   - Product/Service Line (Detailed description)
   - Marketing & Sales Strategy
   - Financial Projections (3-5 years)
   - Funding Request & Use of Funds

3. **Executive Summary** (executive_summary.txt) - A concise 1-2 page summary that can be used for:
   - Quick overview for judges
   - Email introductions
   - Application forms
   - Investor outreach

4. **Financial Plan** (financial_plan.md) - Detailed financial projections including:
   - Revenue Model (How you generate revenue)
   - Cost Structure (Fixed and variable costs)
   - 3-Year Financial Projections (Income statement, cash flow)
   - Break-even Analysis
   - Funding Requirements & Use of Funds
   - Key Financial Assumptions

These 4 files cover the core requirements for most entrepreneurship competitions. Make all documents professional, well-structured, data-driven, and tailored to the specific project idea provided. Use realistic numbers and clear explanations.";

/// Filenames the default prompt asks for, in prompt order.
pub const DEFAULT_DOCUMENTS: &[&str] = &[
    "pitch_deck.md",
    "business_plan.md",
    "executive_summary.txt",
    "financial_plan.md",
];

/// The project fields that feed the user prompt.
#[derive(Debug, Clone, Copy)]
pub struct ProjectBrief<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub idea_description: &'a str,
}

/// Pick the competition's custom prompt when it has a non-blank one.
pub fn resolve_system_prompt(custom: Option<&str>) -> &str {
    match custom {
        Some(prompt) if !prompt.trim().is_empty() => prompt,
        _ => DEFAULT_SYSTEM_PROMPT,
    }
}

/// User prompt for a full document-set run.
pub fn build_user_prompt(brief: &ProjectBrief<'_>) -> String {
    format!(
        "{header}\n\
         Please generate the required files for this competition. \
         Return a JSON object with the following structure:\n\
         {{\n    \"files\": [\n        {{\n            \"filename\": \"filename.ext\",\n            \
         \"content\": \"file content here\",\n            \"file_type\": \"txt\"\n        }}\n    ]\n}}\n",
        header = brief_header(brief),
    )
}

/// User prompt asking for exactly one file.
pub fn build_single_file_prompt(brief: &ProjectBrief<'_>, filename: &str) -> String {
    let file_type = file_type_for_filename(filename);
    let schema = serde_json::json!({
        "files": [{
            "filename": filename,
            "content": "file content here",
            "file_type": file_type,
        }]
    });
    let schema = serde_json::to_string_pretty(&schema).unwrap_or_default();
    format!(
        "{header}\n\
         Please generate ONLY the file: {filename}\n\n\
         Return a JSON object with the following structure:\n{schema}\n",
        header = brief_header(brief),
    )
}

fn brief_header(brief: &ProjectBrief<'_>) -> String {
    let description = brief
        .description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or("N/A");
    format!(
        "Project Name: {}\nProject Description: {}\nIdea Description: {}\n",
        brief.name, description, brief.idea_description
    )
}
