use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AnalysisResult, MeetingInfo, Responsible, StructuredRecord};

/// Status written for every exported action
const PENDING_STATUS: &str = "Pendente";

const NO_ITEMS: &str = "Nenhum item identificado";

/// Serializable record of one analysis, ready for a document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub analysis_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Name of the transcript file the analysis came from
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_info: Option<MeetingInfo>,
    pub narrative: String,
    pub structured: StructuredRecord,
    pub retrieval_count: usize,
    /// Executive summary, when one was requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl AnalysisReport {
    pub fn new(
        source: impl Into<String>,
        meeting_info: Option<MeetingInfo>,
        result: AnalysisResult,
    ) -> Self {
        Self {
            analysis_id: Uuid::new_v4(),
            created_at: Utc::now(),
            source: source.into(),
            meeting_info: meeting_info.filter(|info| !info.is_empty()),
            narrative: result.narrative,
            structured: result.structured,
            retrieval_count: result.retrieval_count,
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }

    /// Write the markdown rendering of the report
    pub fn write_markdown(&self, path: &Path) -> Result<()> {
        write_text(path, &render_markdown(self))
    }

    /// Write the action list as CSV
    pub fn write_actions_csv(&self, path: &Path) -> Result<()> {
        write_text(path, &render_actions_csv(&self.structured))
    }
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    write!(file, "{}", text).with_context(|| format!("Failed to write file: {:?}", path))?;
    Ok(())
}

/// Render tasks, agreements and deliverables as a CSV action list
///
/// Header is `Ação,Responsável,Prazo,Status`; tasks come first.
pub fn render_actions_csv(record: &StructuredRecord) -> String {
    let mut csv = String::from("Ação,Responsável,Prazo,Status\n");

    let rows = record
        .tasks
        .iter()
        .map(|t| (&t.description, &t.responsible, &t.deadline))
        .chain(
            record
                .agreements
                .iter()
                .map(|a| (&a.description, &a.responsible, &a.deadline)),
        )
        .chain(
            record
                .deliverables
                .iter()
                .map(|d| (&d.description, &d.responsible, &d.deadline)),
        );

    for (description, responsible, deadline) in rows {
        let fields = [
            csv_field(description),
            csv_field(&responsible.name),
            csv_field(deadline),
            csv_field(PENDING_STATUS),
        ];
        csv.push_str(&fields.join(","));
        csv.push('\n');
    }

    csv
}

/// Quote a field when it holds a separator, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn format_responsible(responsible: &Responsible) -> String {
    if responsible.role == crate::models::NOT_INFORMED {
        responsible.name.clone()
    } else {
        format!("{} ({})", responsible.name, responsible.role)
    }
}

/// Render the report as a markdown document
pub fn render_markdown(report: &AnalysisReport) -> String {
    let record = &report.structured;
    let mut out = String::new();

    out.push_str(&format!("# Análise: {}\n\n", report.source));
    out.push_str(&format!(
        "_Gerado em {} · {} documentos de referência_\n\n",
        report.created_at.format("%d/%m/%Y %H:%M UTC"),
        report.retrieval_count
    ));

    if let Some(summary) = &report.summary {
        out.push_str("## Resumo executivo\n\n");
        out.push_str(summary.trim());
        out.push_str("\n\n");
    }

    out.push_str(report.narrative.trim());
    out.push_str("\n\n## Dados estruturados\n\n");

    out.push_str("### Acordos\n\n");
    if record.agreements.is_empty() {
        out.push_str(&format!("{}\n\n", NO_ITEMS));
    } else {
        for a in &record.agreements {
            out.push_str(&format!(
                "- {} ({}, prazo: {})\n",
                a.description,
                format_responsible(&a.responsible),
                a.deadline
            ));
        }
        out.push('\n');
    }

    out.push_str("### Tarefas\n\n");
    if record.tasks.is_empty() {
        out.push_str(&format!("{}\n\n", NO_ITEMS));
    } else {
        for t in &record.tasks {
            out.push_str(&format!(
                "- {} ({}, prazo: {}, prioridade: {})\n",
                t.description,
                format_responsible(&t.responsible),
                t.deadline,
                t.priority
            ));
        }
        out.push('\n');
    }

    out.push_str("### Entregáveis\n\n");
    if record.deliverables.is_empty() {
        out.push_str(&format!("{}\n\n", NO_ITEMS));
    } else {
        for d in &record.deliverables {
            out.push_str(&format!(
                "- {} ({}, prazo: {})\n",
                d.description,
                format_responsible(&d.responsible),
                d.deadline
            ));
        }
        out.push('\n');
    }

    let next = &record.next_steps;
    out.push_str("### Próximos passos\n\n");
    out.push_str(&format!("- Próxima reunião: {}\n", next.next_meeting));
    out.push_str(&format!("- Follow-up: {}\n", next.follow_up));
    out.push_str(&format!("- Responsável: {}\n", format_responsible(&next.owner)));

    for (name, value) in &record.extra {
        out.push_str(&format!("\n### {}\n\n```json\n", name));
        out.push_str(&serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()));
        out.push_str("\n```\n");
    }

    if let Some(diagnostic) = &record.diagnostic {
        out.push_str("\n### Resposta não estruturada\n\n");
        out.push_str(&format!("Erro: {}\n\n```\n{}\n```\n", diagnostic.error, diagnostic.raw_text));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Agreement, NOT_INFORMED, Task};

    fn sample_result() -> AnalysisResult {
        let mut structured = StructuredRecord::default();
        structured.tasks.push(Task {
            description: "Enviar proposta, revisada".to_string(),
            responsible: Responsible::named("Maria"),
            deadline: "até sexta-feira".to_string(),
            priority: "alta".to_string(),
            evidence: None,
        });
        structured.agreements.push(Agreement {
            description: "Manter o escopo \"fase 1\"".to_string(),
            responsible: Responsible::default(),
            deadline: NOT_INFORMED.to_string(),
            evidence: None,
        });
        AnalysisResult {
            narrative: "# RELATÓRIO DE ANÁLISE DE REUNIÃO\n".to_string(),
            structured,
            retrieval_count: 2,
        }
    }

    #[test]
    fn test_actions_csv_quoting() {
        let result = sample_result();
        let csv = render_actions_csv(&result.structured);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Ação,Responsável,Prazo,Status");
        assert_eq!(lines[1], "\"Enviar proposta, revisada\",Maria,até sexta-feira,Pendente");
        assert_eq!(
            lines[2],
            "\"Manter o escopo \"\"fase 1\"\"\",Não informado,Não informado,Pendente"
        );
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_actions_csv_empty_record() {
        let csv = render_actions_csv(&StructuredRecord::default());
        assert_eq!(csv, "Ação,Responsável,Prazo,Status\n");
    }

    #[test]
    fn test_markdown_sections() {
        let report = AnalysisReport::new("reuniao.txt", None, sample_result());
        let md = render_markdown(&report);
        assert!(md.starts_with("# Análise: reuniao.txt"));
        assert!(md.contains("- Enviar proposta, revisada (Maria, prazo: até sexta-feira, prioridade: alta)"));
        assert!(md.contains("### Entregáveis\n\nNenhum item identificado"));
        assert!(!md.contains("Resumo executivo"));
        assert!(!md.contains("Resposta não estruturada"));
    }

    #[test]
    fn test_markdown_shows_diagnostic() {
        let result = AnalysisResult {
            narrative: "ok".to_string(),
            structured: StructuredRecord::fallback("isto não é json", "no JSON object found"),
            retrieval_count: 0,
        };
        let report = AnalysisReport::new("x.txt", None, result).with_summary("Resumo.");
        let md = render_markdown(&report);
        assert!(md.contains("## Resumo executivo\n\nResumo."));
        assert!(md.contains("### Tarefas\n\nNenhum item identificado"));
        assert!(md.contains("isto não é json"));
    }

    #[test]
    fn test_empty_meeting_info_dropped() {
        let report = AnalysisReport::new("x.txt", Some(MeetingInfo::default()), sample_result());
        assert!(report.meeting_info.is_none());
    }

    #[test]
    fn test_write_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = AnalysisReport::new("reuniao.txt", None, sample_result());
        report.write_json(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: AnalysisReport = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded, report);
        assert!(!content.contains("\"summary\""));
    }
}
