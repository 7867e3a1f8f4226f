//! Output formatting for search results (table, JSON, markdown, CSV).

use crate::config::OutputFormat;
use crate::justwatch::MediaEntry;

/// Formats media entries for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a list of search results.
    pub fn format_entries(&self, entries: &[MediaEntry]) -> String {
        if entries.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => self.csv_header(),
                _ => "No titles found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json_entries(entries),
            OutputFormat::Table => self.table_entries(entries),
            OutputFormat::Markdown => self.markdown_entries(entries),
            OutputFormat::Csv => self.csv_entries(entries),
        }
    }

    fn heading(entry: &MediaEntry) -> String {
        if entry.year.is_empty() {
            entry.title.clone()
        } else {
            format!("{} ({})", entry.title, entry.year)
        }
    }

    // JSON formatting

    fn json_entries(&self, entries: &[MediaEntry]) -> String {
        serde_json::to_string_pretty(entries).unwrap_or_else(|_| "[]".to_string())
    }

    // Table formatting

    fn table_entries(&self, entries: &[MediaEntry]) -> String {
        let provider_width = 20;
        let label_width = 14;

        let mut lines = Vec::new();

        for entry in entries {
            lines.push(Self::heading(entry));

            if !entry.has_offers() {
                lines.push("  No offers".to_string());
            }

            for (category, offers) in &entry.offers_by_category {
                lines.push(format!("  {}", category));
                for offer in offers {
                    lines.push(format!(
                        "    {:<provider_width$}  {:<label_width$}  {}",
                        truncate(&offer.provider_name, provider_width),
                        truncate(&offer.label, label_width),
                        offer.deep_link
                    ));
                }
            }

            lines.push(String::new());
        }

        lines.push(format!("Total: {} titles", entries.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_entries(&self, entries: &[MediaEntry]) -> String {
        let mut lines = Vec::new();

        for entry in entries {
            lines.push(format!("## {}", Self::heading(entry)));
            lines.push(String::new());

            if !entry.has_offers() {
                lines.push("*No offers*".to_string());
                lines.push(String::new());
                continue;
            }

            for (category, offers) in &entry.offers_by_category {
                lines.push(format!("### {}", category));
                lines.push(String::new());
                lines.push("| Provider | Price | Link |".to_string());
                lines.push("|----------|-------|------|".to_string());
                for offer in offers {
                    lines.push(format!(
                        "| {} | {} | [Watch]({}) |",
                        offer.provider_name, offer.label, offer.deep_link
                    ));
                }
                lines.push(String::new());
            }
        }

        lines.push(format!("*{} titles found*", entries.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_header(&self) -> String {
        "title,year,category,provider,label,url".to_string()
    }

    fn csv_entries(&self, entries: &[MediaEntry]) -> String {
        let mut lines = Vec::new();
        lines.push(self.csv_header());

        for entry in entries {
            let title = Self::csv_escape(&entry.title);

            if !entry.has_offers() {
                lines.push(format!("{},{},,,,", title, entry.year));
                continue;
            }

            for (category, offers) in &entry.offers_by_category {
                for offer in offers {
                    lines.push(format!(
                        "{},{},{},{},{},{}",
                        title,
                        entry.year,
                        Self::csv_escape(category),
                        Self::csv_escape(&offer.provider_name),
                        Self::csv_escape(&offer.label),
                        Self::csv_escape(&offer.deep_link)
                    ));
                }
            }
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}
